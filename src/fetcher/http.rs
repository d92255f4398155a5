//! Registry HTTP client
//!
//! Provides the unified HTTP client for all registry interactions with:
//! - Generic JSON GET requests
//! - Streaming archive downloads with atomic rename
//! - Retry logic with exponential backoff
//!
//! Retries on network errors, 5xx server errors, and 429 rate limit
//! responses. Does not retry on other 4xx client errors or on parse
//! failures of a successful response.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::fetcher::config::{
    calculate_backoff, DOWNLOAD_TIMEOUT, MAX_ATTEMPTS, METADATA_TIMEOUT, USER_AGENT,
    WRITE_BUFFER_SIZE,
};
use crate::fetcher::{FetcherError, FetcherResult};
use crate::metrics;

/// HTTP client for registry API calls and archive downloads.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    max_attempts: u32,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    /// Create a client with the default attempt budget.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Override the total attempt budget per request.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Total attempt budget per request.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// GET a URL and parse the response body as JSON.
    ///
    /// # Errors
    /// Returns [`FetcherError::Network`] after the attempt budget is
    /// exhausted, [`FetcherError::Http`] on a non-retryable client error,
    /// or [`FetcherError::Parse`] if a successful response is not JSON.
    pub async fn fetch_json(&self, url: &str) -> FetcherResult<serde_json::Value> {
        let response = self.get_with_retry(url, METADATA_TIMEOUT).await?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetcherError::Parse(format!("invalid JSON from {url}: {e}")))
    }

    /// Stream a URL's body to `dest`.
    ///
    /// The body is written to a `.part` sibling of `dest` and renamed into
    /// place only after the full body has been flushed, so `dest` either does
    /// not exist or is complete. A partial `.part` file left by a failed
    /// attempt is deleted before the next attempt.
    ///
    /// # Errors
    /// Returns [`FetcherError::Network`] after the attempt budget is
    /// exhausted, or [`FetcherError::Io`] if the destination directory
    /// cannot be created.
    pub async fn download_to_path(&self, url: &str, dest: &Path) -> FetcherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = part_path(dest);
        let mut last_error: Option<FetcherError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                metrics::record_http_retry();
                let backoff = calculate_backoff(attempt - 1);
                debug!(backoff_ms = backoff.as_millis() as u64, "retrying after backoff");
                tokio::time::sleep(backoff).await;
            }

            match self.try_stream_once(url, &tmp_path, dest).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        url,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "download attempt failed"
                    );
                    // A half-written temp file must not survive into the next
                    // attempt or a later run.
                    let _ = tokio::fs::remove_file(&tmp_path).await;
                    if let FetcherError::Http(_) = e {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::Network("all attempts exhausted".to_string())))
    }

    /// One streaming attempt: GET, write chunks to `tmp_path`, rename to `dest`.
    async fn try_stream_once(
        &self,
        url: &str,
        tmp_path: &Path,
        dest: &Path,
    ) -> FetcherResult<()> {
        let response = self.send_checked(url, DOWNLOAD_TIMEOUT).await?;

        let file = tokio::fs::File::create(tmp_path).await?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| FetcherError::Network(format!("stream interrupted: {e}")))?;
            writer.write_all(&chunk).await?;
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        tokio::fs::rename(tmp_path, dest).await?;
        debug!(dest = %dest.display(), "download complete");
        Ok(())
    }

    /// GET with the retry loop applied, returning the successful response.
    async fn get_with_retry(&self, url: &str, timeout: Duration) -> FetcherResult<Response> {
        let mut last_error: Option<FetcherError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                metrics::record_http_retry();
                let backoff = calculate_backoff(attempt - 1);
                debug!(backoff_ms = backoff.as_millis() as u64, "retrying after backoff");
                tokio::time::sleep(backoff).await;
            }

            match self.send_checked(url, timeout).await {
                Ok(response) => {
                    debug!(url, attempt = attempt + 1, "request succeeded");
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        url,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "request failed"
                    );
                    if let FetcherError::Http(_) = e {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetcherError::Network("all attempts exhausted".to_string())))
    }

    /// Send one GET and classify the response status.
    async fn send_checked(&self, url: &str, timeout: Duration) -> FetcherResult<Response> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetcherError::Network(e.to_string()))?;

        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            // Retryable: the registry sheds load with 429/5xx under bursts.
            return Err(FetcherError::Network(format!("HTTP {status} from {url}")));
        }

        Err(FetcherError::Http(format!("HTTP {status} from {url}")))
    }
}

/// Temporary sibling path used while a download is in flight.
///
/// `downloads/slug.zip` -> `downloads/slug.zip.part`
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
