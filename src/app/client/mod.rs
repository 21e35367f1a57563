//! HTTP client for the Fire_cci archive
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `download`: Streaming of a response body into a temporary file
//!
//! [`FireCciClient`] ties the resolver, the HTTP client and the cache
//! together. A fetch either returns the cached path without touching the
//! network, or downloads into the cache's temporary path and publishes the
//! file atomically. Failed downloads never leave a cache entry behind and
//! are not retried.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, error, info};

use crate::app::cache::{CacheStore, ReservationState};
use crate::app::models::YearMonth;
use crate::app::resolver::{available_months, Resolver};
use crate::errors::{FetchError, FetchResult};

pub mod config;
pub mod download;

pub use config::ClientConfig;

use download::DownloadHandler;

/// Outcome of one month in a batch fetch
pub type BatchResult = (YearMonth, FetchResult<PathBuf>);

/// Downloads monthly grids into a [`CacheStore`]
#[derive(Debug)]
pub struct FireCciClient {
    http: Client,
    resolver: Resolver,
    cache: Arc<CacheStore>,
    config: ClientConfig,
}

impl FireCciClient {
    /// Creates a client against the public archive with default settings
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be built
    pub fn new(cache: Arc<CacheStore>) -> FetchResult<Self> {
        Self::with_config(cache, Resolver::default(), ClientConfig::default())
    }

    /// Creates a client with a custom resolver and configuration
    pub fn with_config(
        cache: Arc<CacheStore>,
        resolver: Resolver,
        config: ClientConfig,
    ) -> FetchResult<Self> {
        let http = config.build_http_client()?;

        debug!(
            "Created archive client for {} (read timeout {:?}, concurrency {})",
            resolver.base_url(),
            config.read_timeout,
            config.concurrency
        );

        Ok(Self {
            http,
            resolver,
            cache,
            config,
        })
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ensure the grid for (`year`, `month`) is cached and return its path
    ///
    /// With `force == false` an existing cache entry is returned without any
    /// network access. With `force == true` the file is downloaded again and
    /// replaces the entry only once the new download is complete.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidDate` for an invalid month, otherwise any
    /// download or publish failure
    pub async fn fetch(&self, year: i32, month: u32, force: bool) -> FetchResult<PathBuf> {
        let key = YearMonth::new(year, month)?;
        self.fetch_key(key, force).await
    }

    /// [`fetch`](Self::fetch) for an already validated key
    pub async fn fetch_key(&self, key: YearMonth, force: bool) -> FetchResult<PathBuf> {
        if !force && self.cache.exists(&key) {
            debug!("Cache hit for {}", key);
            return Ok(self.cache.path_for(&key));
        }

        let guard = self.cache.lock(&key).await;

        // Another fetch may have published while we waited for the lock
        if !force && self.cache.exists(&key) {
            debug!("Cache hit for {} after waiting on concurrent fetch", key);
            return Ok(self.cache.path_for(&key));
        }

        let source = self.resolver.resolve_key(&key);
        let temp_path = self.cache.temp_path_for(&key);
        info!("Downloading {} from {}", key, source.url);
        guard.set_state(ReservationState::Downloading);

        let handler = DownloadHandler::new(&self.http, self.config.read_timeout);
        let digest = match handler.download_to_file(&source.url, &temp_path).await {
            Ok(digest) => digest,
            Err(e) => {
                error!("Download of {} failed: {}", key, e);
                self.cache.discard_temp(&key).await;
                return Err(e);
            }
        };

        match self.cache.publish(&guard, digest).await {
            Ok(path) => Ok(path),
            Err(e) => {
                self.cache.discard_temp(&key).await;
                Err(FetchError::Cache(e))
            }
        }
    }

    /// Fetch several months with bounded concurrency
    ///
    /// Results come back in input order, one per key. Failures of one month
    /// do not affect the others.
    pub async fn fetch_many(&self, keys: &[YearMonth], force: bool) -> Vec<BatchResult> {
        let concurrency = self.config.concurrency.max(1);
        info!(
            "Fetching {} months with concurrency {}",
            keys.len(),
            concurrency
        );

        stream::iter(keys.iter().copied())
            .map(|key| async move { (key, self.fetch_key(key, force).await) })
            .buffered(concurrency)
            .collect()
            .await
    }

    /// Fetch every month the product provides for `year`
    ///
    /// Years outside the product coverage yield an empty batch.
    pub async fn fetch_year(&self, year: i32, force: bool) -> Vec<BatchResult> {
        let keys: Vec<YearMonth> = available_months(year)
            .into_iter()
            .filter_map(|month| YearMonth::new(year, month).ok())
            .collect();

        self.fetch_many(&keys, force).await
    }
}

#[cfg(test)]
mod tests;
