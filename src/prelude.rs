//! Prelude module for the Fire_cci fetcher library
//!
//! Re-exports the most commonly used items so typical usage needs a single
//! `use fire_cci_fetcher::prelude::*;`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fire_cci_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let cache = Arc::new(CacheStore::new(CacheConfig::default()).await?);
//!     let client = FireCciClient::new(cache)?;
//!     let dataset = load(&client.fetch(2022, 6, false).await?)?;
//!     println!("{:?}", aggregate(&subset(&dataset, "Europe")?).to_map());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Pipeline components
pub use crate::app::{
    aggregate, available_months, load, subset, subset_region, synthesize, CacheConfig,
    CacheStore, ClientConfig, FireCciClient, GridDataset, Region, Resolver, StatisticsReport,
    YearMonth,
};

pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{DEFAULT_CONCURRENCY, HTTP_TIMEOUT, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _cache_config = CacheConfig::default();
        let _client_config = ClientConfig::default();
        let _app_config = AppConfig::default();
        assert_eq!(DEFAULT_CONCURRENCY, 4);
        assert!(Region::by_name("Asia").is_ok());
    }

    #[tokio::test]
    async fn test_prelude_integration_pattern() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let cache_config = CacheConfig::with_cache_root(temp_dir.path().to_path_buf());

        let cache = Arc::new(CacheStore::new(cache_config).await.unwrap());
        let client = FireCciClient::new(Arc::clone(&cache)).unwrap();
        assert_eq!(client.config().concurrency, DEFAULT_CONCURRENCY);
        assert!(cache.entries().await.is_empty());
    }
}
