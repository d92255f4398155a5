//! Fetcher configuration constants

use std::time::Duration;

/// Total request attempts per operation (initial attempt plus retries).
/// 4 attempts with exponential backoff recovers from transient network issues
/// while keeping the worst-case wait per item bounded (~7s of backoff).
pub const MAX_ATTEMPTS: u32 = 4;

/// Initial backoff delay in milliseconds.
/// 1 second is long enough for transient registry hiccups to clear but short
/// enough to not overly delay a large batch.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// 30 seconds caps exponential growth so a raised attempt budget cannot stall
/// a worker slot indefinitely.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Request timeout for metadata and listing calls.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(25);

/// Request timeout for streaming archive downloads, covering the full body.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Write buffer capacity for streamed downloads (256 KiB).
pub const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Identifying header sent with every request, as the registry asks of
/// bulk consumers.
pub const USER_AGENT: &str = concat!("plugin-harvester/", env!("CARGO_PKG_VERSION"));

/// Calculate exponential backoff delay for a zero-based attempt index
pub fn calculate_backoff(attempt: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}
