//! Core cache store with atomic publishing
//!
//! The store owns every file under the cache root. A grid becomes visible
//! to [`CacheStore::exists`] only through [`CacheStore::publish`], which
//! renames a completely written temporary file into place, so a cache hit
//! never observes a half-written download.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::app::hash::Md5Hash;
use crate::app::models::{CacheKey, YearMonth};
use crate::app::resolver::canonical_filename;
use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

use super::config::CacheConfig;
use super::reservation::{KeyGuard, KeyLocks, ReservationInfo, ReservationState};
use super::stats::{CacheStats, DirectoryScanner};
use super::verification::{HashVerifier, VerificationReport, VerificationStatus};

/// On-disk store of monthly grid files keyed by (year, month)
#[derive(Debug)]
pub struct CacheStore {
    config: CacheConfig,
    cache_root: PathBuf,
    locks: KeyLocks,
}

impl CacheStore {
    /// Create a cache store, creating the root directory if needed
    ///
    /// # Errors
    ///
    /// Returns `CacheError::DirectoryNotAccessible` if the cache directory
    /// cannot be created
    pub async fn new(config: CacheConfig) -> CacheResult<Self> {
        let cache_root = match &config.cache_root {
            Some(path) => path.clone(),
            None => Self::default_cache_dir()?,
        };

        Self::ensure_directory_exists(&cache_root).await?;

        info!("Initialized cache store with root: {}", cache_root.display());

        Ok(Self {
            config,
            cache_root,
            locks: KeyLocks::default(),
        })
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// OS cache directory for this application
    ///
    /// - macOS: ~/Library/Caches/fire-cci-fetcher/cache
    /// - Linux: ~/.cache/fire-cci-fetcher/cache
    /// - Windows: %LOCALAPPDATA%/fire-cci-fetcher/cache
    pub fn default_cache_dir() -> CacheResult<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from("system cache directory"),
            })?
            .join("fire-cci-fetcher")
            .join("cache");

        Ok(cache_dir)
    }

    async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
        if !path.is_dir() {
            fs::create_dir_all(path).await.map_err(|e| {
                error!("Failed to create cache directory: {}", e);
                CacheError::DirectoryNotAccessible {
                    path: path.to_path_buf(),
                }
            })?;
            debug!("Created cache directory: {}", path.display());
        }
        Ok(())
    }

    /// Final location of the grid for `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_root.join(canonical_filename(key))
    }

    /// Where an in-progress download for `key` is written
    pub fn temp_path_for(&self, key: &CacheKey) -> PathBuf {
        Self::with_suffix(&self.path_for(key), files::TEMP_FILE_SUFFIX)
    }

    /// MD5 sidecar location for `key`
    pub fn sidecar_path_for(&self, key: &CacheKey) -> PathBuf {
        Self::with_suffix(&self.path_for(key), files::HASH_SIDECAR_SUFFIX)
    }

    fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Whether a published grid exists for `key`
    pub fn exists(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &CacheKey) -> KeyGuard {
        self.locks.acquire(*key).await
    }

    /// Move a complete temporary download into place
    ///
    /// The caller must hold the key's [`KeyGuard`]. Any sidecar of an earlier
    /// download is removed before the rename, so a sidecar never describes
    /// a different file. The new sidecar is written after the rename; a
    /// missing sidecar only weakens later verification.
    ///
    /// # Errors
    ///
    /// - `CacheError::Io` if an old sidecar cannot be removed; the existing
    ///   entry is left untouched
    /// - `CacheError::AtomicOperationFailed` if the rename fails
    pub async fn publish(&self, guard: &KeyGuard, digest: Md5Hash) -> CacheResult<PathBuf> {
        let key = guard.key();
        let temp_path = self.temp_path_for(&key);
        let final_path = self.path_for(&key);
        let sidecar = self.sidecar_path_for(&key);
        guard.set_state(ReservationState::Publishing);

        match fs::remove_file(&sidecar).await {
            Ok(()) => debug!("Removed previous checksum {}", sidecar.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                error!(
                    "Failed to remove previous checksum {}: {}",
                    sidecar.display(),
                    e
                );
                return Err(CacheError::Io(e));
            }
        }

        fs::rename(&temp_path, &final_path).await.map_err(|e| {
            error!("Failed to rename temporary file: {}", e);
            CacheError::AtomicOperationFailed {
                temp_path: temp_path.clone(),
                final_path: final_path.clone(),
            }
        })?;

        if self.config.write_checksums {
            if let Err(e) = fs::write(&sidecar, format!("{}\n", digest)).await {
                warn!("Failed to write checksum sidecar {}: {}", sidecar.display(), e);
            }
        }

        info!("Published {} to {}", key, final_path.display());
        Ok(final_path)
    }

    /// Remove the temporary file of an abandoned download
    pub async fn discard_temp(&self, key: &CacheKey) {
        let temp_path = self.temp_path_for(key);
        match fs::remove_file(&temp_path).await {
            Ok(()) => warn!("Discarded partial download: {}", temp_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!(
                "Failed to remove partial download {}: {}",
                temp_path.display(),
                e
            ),
        }
    }

    /// Delete a cache entry and its sidecar
    ///
    /// Returns whether a grid file was removed.
    pub async fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        let _guard = self.lock(key).await;

        let removed = match fs::remove_file(self.path_for(key)).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(CacheError::Io(e)),
        };

        match fs::remove_file(self.sidecar_path_for(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::Io(e)),
        }

        if removed {
            info!("Removed cache entry {}", key);
        }
        Ok(removed)
    }

    /// Delete temporary files left behind by interrupted downloads
    ///
    /// Keys with a fetch in flight are skipped. Returns the number of files
    /// removed.
    pub async fn remove_partial_files(&self) -> CacheResult<usize> {
        let in_flight: Vec<CacheKey> = self.locks.active().iter().map(|r| r.key).collect();
        let mut removed = 0;

        let mut entries = fs::read_dir(&self.cache_root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(final_name) = name.strip_suffix(files::TEMP_FILE_SUFFIX) else {
                continue;
            };
            if YearMonth::from_filename(final_name).is_some_and(|key| in_flight.contains(&key)) {
                continue;
            }

            fs::remove_file(entry.path()).await?;
            debug!("Removed partial download {}", name);
            removed += 1;
        }

        if removed > 0 {
            info!("Removed {} partial downloads", removed);
        }
        Ok(removed)
    }

    /// Published entries, oldest first
    pub async fn entries(&self) -> Vec<CacheKey> {
        DirectoryScanner::scan_cache_directory(&self.cache_root)
            .await
            .entries
    }

    /// Verify one entry against its sidecar
    pub async fn verify(&self, key: &CacheKey) -> CacheResult<VerificationStatus> {
        HashVerifier::verify(&self.path_for(key), &self.sidecar_path_for(key)).await
    }

    /// Verify every published entry
    pub async fn verify_all(&self) -> CacheResult<VerificationReport> {
        let start_time = std::time::Instant::now();
        let mut report = VerificationReport::new();

        for key in self.entries().await {
            let status = self.verify(&key).await?;
            if let VerificationStatus::Mismatch { .. } = status {
                warn!("Checksum mismatch for cached {}", key);
            }
            report.record(key, &status);
        }

        report.set_verification_time(start_time.elapsed());
        info!(
            "Cache verification completed: {}/{} files verified in {:.2}s",
            report.files_verified,
            report.files_checked,
            report.verification_time.as_secs_f64()
        );
        Ok(report)
    }

    /// Active reservations
    pub fn reservations(&self) -> Vec<ReservationInfo> {
        self.locks.active()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let reservations = self.locks.active();
        let scan = DirectoryScanner::scan_cache_directory(&self.cache_root).await;

        let mut stats = CacheStats::new(self.cache_root.clone());
        stats.active_reservations = reservations.len();
        stats.downloading_files = reservations
            .iter()
            .filter(|r| r.status == ReservationState::Downloading)
            .count();
        stats.cached_files_count = scan.entries.len();
        stats.total_cache_size = scan.total_size;
        stats.partial_files_count = scan.partial_files;
        stats
    }
}
