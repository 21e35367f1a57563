//! Cache configuration types and defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the grid cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for cache storage (OS-specific if None)
    pub cache_root: Option<PathBuf>,
    /// Write an MD5 sidecar next to every published grid
    pub write_checksums: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: None, // Will use OS-specific cache directory
            write_checksums: true,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom cache root
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Default::default()
        }
    }

    /// Enable or disable MD5 sidecars
    pub fn with_checksums(mut self, enabled: bool) -> Self {
        self.write_checksums = enabled;
        self
    }
}
