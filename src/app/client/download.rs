//! Streaming download of one grid into a temporary file

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::app::hash::Md5Hash;
use crate::errors::{FetchError, FetchResult};

/// Streams response bodies to disk
///
/// `read_timeout` bounds each wait on the network: the response headers
/// and every body chunk. Steady transfers may take any total time.
pub struct DownloadHandler<'a> {
    client: &'a Client,
    read_timeout: Duration,
}

impl<'a> DownloadHandler<'a> {
    pub fn new(client: &'a Client, read_timeout: Duration) -> Self {
        Self {
            client,
            read_timeout,
        }
    }

    /// Download `url` into `temp_path`, returning the MD5 of the body
    ///
    /// The body is written chunk by chunk and hashed on the way. On error
    /// the caller owns cleanup of `temp_path`.
    ///
    /// # Errors
    ///
    /// - `FetchError::InvalidUrl` if `url` does not parse
    /// - `FetchError::Status` for a non-2xx response
    /// - `FetchError::Timeout` when the server is silent for longer than
    ///   the read timeout
    /// - `FetchError::Http` for other transport failures
    /// - `FetchError::Io` if the temporary file cannot be written
    pub async fn download_to_file(&self, url: &str, temp_path: &Path) -> FetchResult<Md5Hash> {
        let parsed_url = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            error: e.to_string(),
        })?;

        let mut response = self
            .bounded(url, self.client.get(parsed_url).send())
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = File::create(temp_path).await?;
        let mut context = md5::Context::new();
        let mut written: u64 = 0;

        while let Some(chunk) = self.bounded(url, response.chunk()).await? {
            context.consume(&chunk);
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        debug!("Wrote {} bytes from {} to {}", written, url, temp_path.display());
        Ok(context.compute().into())
    }

    /// Await one network step, failing if it stalls past the read timeout
    async fn bounded<T>(
        &self,
        url: &str,
        step: impl Future<Output = reqwest::Result<T>>,
    ) -> FetchResult<T> {
        match tokio::time::timeout(self.read_timeout, step).await {
            Ok(result) => result.map_err(|e| self.transport_error(url, e)),
            Err(_) => Err(self.timeout_error(url)),
        }
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            self.timeout_error(url)
        } else {
            FetchError::Http(error)
        }
    }

    fn timeout_error(&self, url: &str) -> FetchError {
        FetchError::Timeout {
            url: url.to_string(),
            seconds: self.read_timeout.as_secs(),
        }
    }
}
