//! Core data types shared across the pipeline
//!
//! [`YearMonth`] is the key that ties a remote grid file, its cache entry
//! and the loaded dataset timestamp together. [`ProductInfo`] describes the
//! Fire_cci product and replaces a loosely typed info dictionary.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::product;
use crate::errors::DateError;

/// A validated (year, month) pair identifying one monthly grid
///
/// Also used as the cache key: every `YearMonth` maps to exactly one
/// cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

/// Cache entries are identified by the month they hold
pub type CacheKey = YearMonth;

/// Largest year that fits the four-digit date stamp of a file name
const MAX_YEAR: i32 = 9999;

impl YearMonth {
    /// Validate and build a key
    ///
    /// # Errors
    ///
    /// Returns `DateError` if `month` is outside 1..=12 or `year` is outside 1..=9999
    pub fn new(year: i32, month: u32) -> Result<Self, DateError> {
        if !(1..=MAX_YEAR).contains(&year) {
            return Err(DateError::InvalidYear { year });
        }
        if !(1..=12).contains(&month) {
            return Err(DateError::InvalidMonth { month });
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month, the timestamp every Fire_cci grid carries
    pub fn first_day(&self) -> NaiveDate {
        // Validated in `new`, so the date always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Compact `YYYYMM01` date stamp used in file names
    pub fn date_stamp(&self) -> String {
        format!("{:04}{:02}01", self.year, self.month)
    }

    /// Parse a canonical grid file name back into its key
    ///
    /// Returns `None` for anything that is not `YYYYMM01-<suffix>`.
    pub fn from_filename(name: &str) -> Option<Self> {
        let stamp = name.strip_suffix(product::FILENAME_SUFFIX)?;
        if stamp.len() < 8 || !stamp.ends_with("01") || !stamp.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let (ym, _day) = stamp.split_at(stamp.len() - 2);
        let (year, month) = ym.split_at(ym.len() - 2);
        let year = year.parse().ok()?;
        let month = month.parse().ok()?;
        Self::new(year, month).ok()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Static description of the Fire_cci grid product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductInfo {
    pub product: &'static str,
    pub version: &'static str,
    pub spatial_resolution: &'static str,
    pub temporal_resolution: &'static str,
    pub first_year: i32,
    pub last_year: i32,
    pub license: &'static str,
    pub doi: &'static str,
}

/// The MODIS Fire_cci v5.1 grid product
pub const FIRE_CCI_PRODUCT: ProductInfo = ProductInfo {
    product: product::NAME,
    version: product::VERSION,
    spatial_resolution: product::SPATIAL_RESOLUTION,
    temporal_resolution: product::TEMPORAL_RESOLUTION,
    first_year: product::FIRST_YEAR,
    last_year: product::LAST_YEAR,
    license: product::LICENSE,
    doi: product::DOI,
};

impl ProductInfo {
    /// Whether the product has data for `year`
    pub fn covers_year(&self, year: i32) -> bool {
        (self.first_year..=self.last_year).contains(&year)
    }

    /// Human readable coverage range
    pub fn time_range(&self) -> String {
        format!("{}-01-01 to {}-12-31", self.first_year, self.last_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_month_validation() {
        assert!(YearMonth::new(2022, 1).is_ok());
        assert!(YearMonth::new(2022, 12).is_ok());
        assert_eq!(
            YearMonth::new(2022, 0),
            Err(DateError::InvalidMonth { month: 0 })
        );
        assert_eq!(
            YearMonth::new(2022, 13),
            Err(DateError::InvalidMonth { month: 13 })
        );
        assert_eq!(YearMonth::new(0, 5), Err(DateError::InvalidYear { year: 0 }));
    }

    #[test]
    fn test_year_upper_bound() {
        let last = YearMonth::new(9999, 12).unwrap();
        assert_eq!(last.first_day(), NaiveDate::from_ymd_opt(9999, 12, 1).unwrap());
        assert_eq!(last.date_stamp(), "99991201");

        for year in [10_000, 262_143, i32::MAX] {
            assert_eq!(YearMonth::new(year, 1), Err(DateError::InvalidYear { year }));
        }
    }

    #[test]
    fn test_first_day_and_display() {
        let key = YearMonth::new(2022, 7).unwrap();
        assert_eq!(key.first_day(), NaiveDate::from_ymd_opt(2022, 7, 1).unwrap());
        assert_eq!(key.to_string(), "2022-07");
        assert_eq!(key.date_stamp(), "20220701");
    }

    #[test]
    fn test_from_filename() {
        let key = YearMonth::from_filename("20190301-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc").unwrap();
        assert_eq!(key, YearMonth::new(2019, 3).unwrap());

        assert!(YearMonth::from_filename("20191301-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc").is_none());
        assert!(YearMonth::from_filename("20190315-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc").is_none());
        assert!(YearMonth::from_filename("20190301-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc.tmp").is_none());
        assert!(YearMonth::from_filename("notes.txt").is_none());
    }

    #[test]
    fn test_product_coverage() {
        assert!(FIRE_CCI_PRODUCT.covers_year(2001));
        assert!(FIRE_CCI_PRODUCT.covers_year(2022));
        assert!(!FIRE_CCI_PRODUCT.covers_year(2000));
        assert!(!FIRE_CCI_PRODUCT.covers_year(2023));
        assert_eq!(FIRE_CCI_PRODUCT.time_range(), "2001-01-01 to 2022-12-31");
    }
}
