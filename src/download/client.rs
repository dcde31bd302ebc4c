//! HTTP client wrapper for fetching catalogs, icons and bundles.
//!
//! This module provides the `HttpClient` struct which handles streaming
//! downloads with proper timeout configuration, cooperative cancellation and
//! cleanup of partial files.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::cancel::CancelToken;
use super::constants::{CONNECT_TIMEOUT_SECS, DOWNLOAD_TIMEOUT_SECS};
use super::error::DownloadError;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("bundleshop/", env!("CARGO_PKG_VERSION"));

/// Byte counters reported after every chunk written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes written so far.
    pub bytes_written: u64,
    /// Total size announced by the server, when known.
    pub content_length: Option<u64>,
}

impl TransferProgress {
    /// Fraction of the transfer completed, or `None` when the total is unknown.
    ///
    /// Always within `[0.0, 1.0]`, even if the server sends more bytes than announced.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        match self.content_length {
            Some(total) if total > 0 => {
                Some((self.bytes_written as f64 / total as f64).clamp(0.0, 1.0))
            }
            _ => None,
        }
    }
}

/// HTTP client shared by the catalog store and every download worker.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, DOWNLOAD_TIMEOUT_SECS)
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        request_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(request_timeout_secs))
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches a whole response body into memory (catalog payloads).
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the request fails,
    /// or the server answers with a non-success status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self.send_get(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| DownloadError::network(url, e))?;
        debug!(bytes = body.len(), "fetched response body");
        Ok(body.to_vec())
    }

    /// Streams `url` into the file at `destination`, which is created or truncated.
    ///
    /// `on_progress` is invoked after every chunk. The cancel token is checked
    /// before each chunk; once it is set the transfer stops with
    /// [`DownloadError::Canceled`]. On any error the partially written file is
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` for invalid URLs, network failures, timeouts,
    /// error statuses, disk failures and cancellation.
    #[instrument(skip(self, cancel, on_progress), fields(url = %url, dest = %destination.display()))]
    pub async fn download_to_path<F>(
        &self,
        url: &str,
        destination: &Path,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<u64, DownloadError>
    where
        F: FnMut(TransferProgress) + Send,
    {
        if cancel.is_canceled() {
            return Err(DownloadError::canceled(url, 0));
        }

        let response = self.send_get(url).await?;
        let content_length = response.content_length();

        let mut file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        let result = stream_to_file(
            &mut file,
            response,
            url,
            destination,
            content_length,
            cancel,
            &mut on_progress,
        )
        .await;
        drop(file);

        match result {
            Ok(bytes) => {
                info!(bytes, "download complete");
                Ok(bytes)
            }
            Err(error) => {
                debug!(path = %destination.display(), error = %error, "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(destination).await;
                Err(error)
            }
        }
    }

    async fn send_get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file<F>(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    content_length: Option<u64>,
    cancel: &CancelToken,
    on_progress: &mut F,
) -> Result<u64, DownloadError>
where
    F: FnMut(TransferProgress) + Send,
{
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    loop {
        if cancel.is_canceled() {
            return Err(DownloadError::canceled(url, bytes_written));
        }

        let Some(chunk_result) = stream.next().await else {
            break;
        };
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
        on_progress(TransferProgress {
            bytes_written,
            content_length,
        });
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    writer
        .get_mut()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
