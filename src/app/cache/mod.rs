//! Local cache of monthly burned-area grids
//!
//! The cache is a flat directory holding one NetCDF file per (year, month),
//! named by the product's canonical filename. Downloads stream into a
//! `.tmp` file and are renamed into place once complete, so the presence of
//! a canonical name always means a complete file.
//!
//! # Module Organization
//!
//! - [`config`] - Configuration types and defaults
//! - [`reservation`] - Per-key locks that serialize fetches of the same month
//! - [`verification`] - MD5 sidecar checks
//! - [`stats`] - Directory scanning and disk usage
//! - [`store`] - The store itself
//!
//! # Examples
//!
//! ```rust,no_run
//! use fire_cci_fetcher::app::cache::{CacheConfig, CacheStore};
//! use fire_cci_fetcher::app::models::YearMonth;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = CacheStore::new(CacheConfig::default()).await?;
//! let key = YearMonth::new(2022, 6)?;
//!
//! if cache.exists(&key) {
//!     println!("cached at {}", cache.path_for(&key).display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod reservation;
pub mod stats;
pub mod store;
pub mod verification;

pub use config::CacheConfig;
pub use reservation::{KeyGuard, ReservationInfo, ReservationState};
pub use stats::{format_bytes, CacheStats, DirectoryScanner};
pub use store::CacheStore;
pub use verification::{HashVerifier, VerificationFailure, VerificationReport, VerificationStatus};
