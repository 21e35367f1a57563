//! Fire_cci Fetcher Library
//!
//! Downloads, caches and summarizes the ESA Fire_cci MODIS burned-area grid
//! product (v5.1, 0.25 degree, monthly) from the CEDA archive.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(DEFAULT_CONCURRENCY, 4);
        assert_eq!(HTTP_TIMEOUT.as_secs(), 30);
        assert_eq!(env::CACHE_DIR, "FIRE_CCI_CACHE_DIR");
        assert!(USER_AGENT.contains("Fire-CCI-Fetcher"));
    }

    #[test]
    fn test_error_types() {
        let error = errors::RegionError::UnknownRegion {
            name: "Atlantis".to_string(),
        };
        let app_error = AppError::Region(error);
        assert_eq!(app_error.category(), "region");
    }
}
