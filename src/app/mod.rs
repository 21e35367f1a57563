//! Core application logic for the Fire_cci fetcher
//!
//! The pipeline runs resolve → fetch (into the cache) → load → subset →
//! aggregate. Each stage lives in its own module and can be used alone.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fire_cci_fetcher::app::{aggregate, load, subset, CacheConfig, CacheStore, FireCciClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = Arc::new(CacheStore::new(CacheConfig::default()).await?);
//! let client = FireCciClient::new(cache)?;
//!
//! let path = client.fetch(2022, 6, false).await?;
//! let dataset = load(&path)?;
//! let africa = subset(&dataset, "Africa")?;
//! let report = aggregate(&africa);
//! println!("burned area: {:?}", report.total_burned_area);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod grid;
pub mod hash;
pub mod models;
pub mod region;
pub mod resolver;
pub mod statistics;

// Re-export main public API
pub use cache::{CacheConfig, CacheStats, CacheStore, VerificationReport, VerificationStatus};
pub use client::{BatchResult, ClientConfig, FireCciClient};
pub use grid::{
    load, load_from, synthesize, synthesize_on, DatasetMetadata, Field, FieldKind, GridDataset,
    GridSource,
};
pub use hash::Md5Hash;
pub use models::{CacheKey, ProductInfo, YearMonth, FIRE_CCI_PRODUCT};
pub use region::{subset, subset_region, Region};
pub use resolver::{available_months, canonical_filename, ResolvedSource, Resolver};
pub use statistics::{aggregate, StatisticsReport};
