//! HTTP transport for registry API calls and archive downloads
//!
//! All network access in the crate goes through [`RegistryClient`], which
//! provides two operations:
//!
//! - [`RegistryClient::fetch_json`] - GET a JSON document with bounded
//!   retries and exponential backoff
//! - [`RegistryClient::download_to_path`] - stream a byte response to disk,
//!   writing to a `.part` sibling and renaming atomically on success
//!
//! Retry policy is fixed at construction and applies per request. Failures
//! inside a worker task are converted to outcome records by the caller;
//! nothing here aborts a batch.

pub mod config;
pub mod http;

pub use http::RegistryClient;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Transient network failure, surfaced after the retry budget is exhausted
    #[error("network error: {0}")]
    Network(String),

    /// Non-retryable HTTP client error (4xx other than 429)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// Filesystem failure while writing a download
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;
