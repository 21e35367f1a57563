//! Mapping from a month to its remote URL and cache file name
//!
//! Pure and deterministic: no I/O happens here.

use url::Url;

use crate::app::models::{YearMonth, FIRE_CCI_PRODUCT};
use crate::constants::product;
use crate::errors::{ConfigError, ConfigResult, DateError};

/// Remote location and canonical file name of one monthly grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub url: String,
    pub filename: String,
}

/// Canonical cache file name, `YYYYMM01-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc`
pub fn canonical_filename(key: &YearMonth) -> String {
    format!("{}{}", key.date_stamp(), product::FILENAME_SUFFIX)
}

/// Months with data for `year` (empty outside the product coverage)
pub fn available_months(year: i32) -> Vec<u32> {
    if FIRE_CCI_PRODUCT.covers_year(year) {
        (1..=12).collect()
    } else {
        Vec::new()
    }
}

/// Builds archive URLs from a fixed base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolver {
    base_url: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            base_url: product::BASE_URL.to_string(),
        }
    }
}

impl Resolver {
    /// Create a resolver for a custom archive base
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `base_url` is not an absolute URL
    pub fn new(base_url: &str) -> ConfigResult<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            field: "base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a raw (year, month) pair
    pub fn resolve(&self, year: i32, month: u32) -> Result<ResolvedSource, DateError> {
        let key = YearMonth::new(year, month)?;
        Ok(self.resolve_key(&key))
    }

    /// Resolve an already validated key
    pub fn resolve_key(&self, key: &YearMonth) -> ResolvedSource {
        let filename = canonical_filename(key);
        let url = format!("{}/{}/{}", self.base_url, key.year(), filename);
        ResolvedSource { url, filename }
    }
}
