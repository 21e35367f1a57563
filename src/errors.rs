//! Error types for the Fire_cci fetcher
//!
//! Each pipeline stage has its own error enum so callers can react to the
//! failure they care about; [`AppError`] unifies them for the command line.
//! No error in this crate is retried automatically.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid (year, month) requests
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Month outside 1..=12
    #[error("Invalid month {month}: expected a value between 1 and 12")]
    InvalidMonth { month: u32 },

    /// Year outside 1..=9999
    #[error("Invalid year {year}: expected a value between 1 and 9999")]
    InvalidYear { year: i32 },
}

/// Download errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// The requested month cannot be resolved
    #[error(transparent)]
    InvalidDate(#[from] DateError),

    /// Transport level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server sent nothing for longer than the read timeout
    #[error("Download of {url} timed out: no data for {seconds} seconds")]
    Timeout { url: String, seconds: u64 },

    /// Server answered with a non-2xx status
    #[error("Server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Invalid URL
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// I/O error while writing the temporary file
    #[error("File I/O error during download: {0}")]
    Io(#[from] std::io::Error),

    /// Cache could not publish the download
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Grid file parsing errors
#[derive(Error, Debug)]
pub enum LoadError {
    /// Grid file does not exist
    #[error("Grid file not found: {path}")]
    NotFound { path: PathBuf },

    /// This build cannot read the grid format
    #[error("Cannot read {path}: NetCDF support not compiled in (enable the `netcdf` feature)")]
    BackendUnavailable { path: PathBuf },

    /// A coordinate axis is absent
    #[error("Missing coordinate axis: {axis}")]
    MissingAxis { axis: String },

    /// A coordinate axis is empty, multi-dimensional or not monotonic
    #[error("Invalid coordinate axis {axis}: {reason}")]
    InvalidAxis { axis: String, reason: String },

    /// A field does not span the dataset axes
    #[error("Field {field} has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        field: String,
        expected: (usize, usize),
        actual: Vec<usize>,
    },

    /// No timestamp could be derived from the file
    #[error("Cannot determine the timestamp of {path}")]
    MissingTimestamp { path: PathBuf },

    /// Unreadable or malformed content
    #[error("Malformed grid data: {reason}")]
    Malformed { reason: String },

    /// I/O error
    #[error("I/O error reading grid file: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by libnetcdf
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),
}

/// Region lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// Name is not one of the predefined regions
    #[error("Unknown region: {name}. Expected one of Africa, Asia, Europe, North America, South America")]
    UnknownRegion { name: String },
}

/// Cache management errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache directory not found or inaccessible
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Invalid cache state
    #[error("Invalid cache state: {reason}")]
    InvalidState { reason: String },

    /// I/O error on a cache file
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading or writing the config file
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid date
    #[error(transparent)]
    Date(#[from] DateError),

    /// Download error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Grid loading error
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Region error
    #[error(transparent)]
    Region(#[from] RegionError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Date(_) => "date",
            AppError::Fetch(_) => "fetch",
            AppError::Load(_) => "load",
            AppError::Region(_) => "region",
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Json(_) => "json",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Load result type alias
pub type LoadResult<T> = std::result::Result<T, LoadError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
