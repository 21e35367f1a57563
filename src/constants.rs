//! Application constants for the Fire_cci fetcher
//!
//! This module centralizes the constants used throughout the application,
//! organized by functional domain. Everything here is immutable product or
//! runtime configuration; nothing is mutated after start-up.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the cache root directory
    pub const CACHE_DIR: &str = "FIRE_CCI_CACHE_DIR";

    /// Overrides the archive base URL
    pub const BASE_URL: &str = "FIRE_CCI_BASE_URL";
}

/// Fire_cci product description
pub mod product {
    /// CEDA archive directory holding the MODIS Fire_cci v5.1 grid product
    pub const BASE_URL: &str =
        "https://data.ceda.ac.uk/neodc/esacci/fire/data/burned_area/MODIS/grid/v5.1";

    /// Suffix shared by every monthly grid file
    pub const FILENAME_SUFFIX: &str = "-ESACCI-L4_FIRE-BA-MODIS-fv5.1.nc";

    /// Product name
    pub const NAME: &str = "MODIS Fire_cci Burned Area Grid product v5.1";

    /// Product version string
    pub const VERSION: &str = "fv5.1";

    /// Grid spacing in degrees
    pub const GRID_STEP_DEGREES: f64 = 0.25;

    /// Human readable spatial resolution
    pub const SPATIAL_RESOLUTION: &str = "0.25 x 0.25 degrees";

    /// Human readable temporal resolution
    pub const TEMPORAL_RESOLUTION: &str = "Monthly";

    /// First year covered by the product
    pub const FIRST_YEAR: i32 = 2001;

    /// Last year covered by the product
    pub const LAST_YEAR: i32 = 2022;

    /// Data licence
    pub const LICENSE: &str = "Open Access";

    /// Dataset DOI
    pub const DOI: &str = "10.5285/3628cb2fdba443588155e15dee8e5352";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Fire-CCI-Fetcher/0.1.0 (Climate Research Tool)";

    /// Longest wait for a response or the next body chunk
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Suffix of the MD5 sidecar written next to each published grid
    pub const HASH_SIDECAR_SUFFIX: &str = ".md5";
}

/// Batch fetching
pub mod workers {
    /// Default number of concurrent month downloads
    pub const DEFAULT_CONCURRENCY: usize = 4;

    /// Maximum recommended concurrent downloads
    pub const MAX_CONCURRENCY: usize = 12;
}

/// Synthetic grid generation
pub mod synthetic {
    /// Scale of the exponential distribution used for burned area
    pub const BURNED_AREA_SCALE: f64 = 0.1;

    /// Burned area values above this are reset to zero
    pub const BURNED_AREA_CLIP: f64 = 1.0;

    /// Lower bound of the simulated confidence
    pub const CONFIDENCE_MIN: f64 = 0.5;

    /// Upper bound (exclusive) of the simulated confidence
    pub const CONFIDENCE_MAX: f64 = 1.0;

    /// Number of land cover classes (values 1..=18)
    pub const LAND_COVER_CLASSES: i32 = 18;

    /// Seed used when the caller does not pick one
    pub const DEFAULT_SEED: u64 = 42;
}

/// Statistics thresholds
pub mod stats {
    /// Confidence strictly above this counts as high confidence
    pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;
}

/// Logging
pub mod logging {
    /// Default log level
    pub const DEFAULT_LOG_LEVEL: &str = "info";
}

pub use files::TEMP_FILE_SUFFIX;
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use workers::DEFAULT_CONCURRENCY;
