//! Download orchestration
//!
//! The orchestrator runs a bounded worker pool over the ranked candidate
//! list. Each worker resolves its plugin's download locator, skips work the
//! filesystem shows as already done, and otherwise streams the archive to
//! disk. Every worker produces an [`crate::Outcome`]; one item's failure
//! never aborts its siblings.
//!
//! Only setup failures (the output directory cannot be created) are fatal to
//! the phase.

pub mod executor;

pub use executor::DownloadOrchestrator;

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Setup-time filesystem failure; per-item failures become outcomes instead
    #[error("IO error: {0}")]
    IoError(String),
}
