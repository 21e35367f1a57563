//! Cache statistics and directory scanning

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::app::models::YearMonth;
use crate::constants::files;

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Cache root directory
    pub cache_root: PathBuf,
    /// Number of fetches currently holding a key lock
    pub active_reservations: usize,
    /// Number of those currently streaming a response body
    pub downloading_files: usize,
    /// Number of published grid files
    pub cached_files_count: usize,
    /// Total size of published grid files in bytes
    pub total_cache_size: u64,
    /// Leftover temporary files from interrupted downloads
    pub partial_files_count: usize,
}

impl CacheStats {
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            active_reservations: 0,
            downloading_files: 0,
            cached_files_count: 0,
            total_cache_size: 0,
            partial_files_count: 0,
        }
    }

    /// Format cache size in human-readable format
    pub fn format_cache_size(&self) -> String {
        format_bytes(self.total_cache_size)
    }
}

/// Result of scanning the cache root
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryScan {
    pub entries: Vec<YearMonth>,
    pub total_size: u64,
    pub partial_files: usize,
}

/// Directory scanner for cache statistics
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Scan the cache root for published grids and partial downloads
    pub async fn scan_cache_directory(cache_root: &Path) -> DirectoryScan {
        let cache_root = cache_root.to_path_buf();

        tokio::task::spawn_blocking(move || Self::scan_directory(&cache_root))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to scan cache directory: {}", e);
                DirectoryScan::default()
            })
    }

    /// Blocking scan; the cache is flat so no recursion is needed
    pub fn scan_directory(dir: &Path) -> DirectoryScan {
        let mut scan = DirectoryScan::default();

        let Ok(entries) = std::fs::read_dir(dir) else {
            return scan;
        };

        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();

            if let Some(key) = YearMonth::from_filename(&name) {
                scan.entries.push(key);
                if let Ok(metadata) = entry.metadata() {
                    scan.total_size += metadata.len();
                }
            } else if name.ends_with(files::TEMP_FILE_SUFFIX) {
                scan.partial_files += 1;
            }
        }

        scan.entries.sort();
        scan
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
