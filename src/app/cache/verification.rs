//! Sidecar checksum verification
//!
//! Every published grid may carry a `<file>.md5` sidecar written at publish
//! time. Verification recomputes the digest and compares, which detects
//! files truncated or modified after they entered the cache.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::app::hash::Md5Hash;
use crate::app::models::CacheKey;
use crate::errors::{CacheError, CacheResult};

/// Outcome of verifying one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VerificationStatus {
    /// Digest matches the sidecar
    Verified,
    /// No cached file for this key
    Missing,
    /// File present but no sidecar was written for it
    NoSidecar,
    /// Digest differs from the sidecar
    Mismatch { expected: Md5Hash, actual: Md5Hash },
}

/// Details about a verification failure
#[derive(Debug, Clone, Serialize)]
pub struct VerificationFailure {
    pub key: CacheKey,
    pub reason: String,
}

/// Cache verification report
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    pub files_checked: usize,
    pub files_verified: usize,
    pub files_without_sidecar: usize,
    pub files_failed: usize,
    pub verification_time: Duration,
    pub failed_files: Vec<VerificationFailure>,
}

impl VerificationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one entry's status into the report
    pub fn record(&mut self, key: CacheKey, status: &VerificationStatus) {
        self.files_checked += 1;
        match status {
            VerificationStatus::Verified => self.files_verified += 1,
            VerificationStatus::NoSidecar => self.files_without_sidecar += 1,
            VerificationStatus::Missing => {
                self.files_failed += 1;
                self.failed_files.push(VerificationFailure {
                    key,
                    reason: "File not found".to_string(),
                });
            }
            VerificationStatus::Mismatch { expected, actual } => {
                self.files_failed += 1;
                self.failed_files.push(VerificationFailure {
                    key,
                    reason: format!("Hash mismatch: expected {}, got {}", expected, actual),
                });
            }
        }
    }

    /// Check if verification passed (no failures)
    pub fn is_successful(&self) -> bool {
        self.files_failed == 0
    }

    pub fn set_verification_time(&mut self, duration: Duration) {
        self.verification_time = duration;
    }
}

/// Hash calculation helpers
pub struct HashVerifier;

impl HashVerifier {
    /// Stream a file through MD5 without loading it whole
    pub async fn calculate_file_hash(file_path: &Path) -> CacheResult<Md5Hash> {
        let mut file = File::open(file_path).await?;
        let mut context = md5::Context::new();
        let mut buffer = vec![0u8; 64 * 1024];

        loop {
            let read = file.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            context.consume(&buffer[..read]);
        }

        Ok(context.compute().into())
    }

    /// Read a sidecar digest
    pub async fn read_sidecar(sidecar_path: &Path) -> CacheResult<Option<Md5Hash>> {
        match tokio::fs::read_to_string(sidecar_path).await {
            Ok(content) => content.parse().map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Compare a file against its sidecar
    pub async fn verify(file_path: &Path, sidecar_path: &Path) -> CacheResult<VerificationStatus> {
        if !file_path.is_file() {
            return Ok(VerificationStatus::Missing);
        }

        let Some(expected) = Self::read_sidecar(sidecar_path).await? else {
            return Ok(VerificationStatus::NoSidecar);
        };

        let actual = Self::calculate_file_hash(file_path).await?;
        if actual == expected {
            Ok(VerificationStatus::Verified)
        } else {
            Ok(VerificationStatus::Mismatch { expected, actual })
        }
    }
}
