//! # Plugin Harvester Library
//!
//! A library for bulk-downloading popular plugins from the WordPress.org
//! plugin registry. Designed for plugin ecosystem research and offline
//! analysis of widely-deployed plugin code.
//!
//! ## Features
//!
//! - **Popularity Listing**: Concurrent paginated queries against the registry
//!   with install-count filtering, deduplication, and ranking
//! - **Bulk Download**: Bounded-concurrency archive downloads with retry,
//!   exponential backoff, and atomic on-disk writes
//! - **Idempotent Resume**: Re-runs skip archives and extractions that are
//!   already present on disk; no state files are kept
//! - **Extraction**: Bounded-concurrency ZIP extraction with per-archive
//!   failure isolation
//! - **Reporting**: CSV report of every listed plugin and its final status
//!
//! ## Quick Start
//!
//! ```no_run
//! use plugin_harvester::downloader::DownloadOrchestrator;
//! use plugin_harvester::fetcher::RegistryClient;
//! use plugin_harvester::registry::PopularLister;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RegistryClient::new();
//!
//! // Phase 1: list popular plugins (>= 10k installs, 50 pages of 100)
//! let lister = PopularLister::new(client.clone());
//! let plugins = lister.list_popular(10_000, 50, 100, 10).await;
//!
//! // Phase 2: download archives with 5 workers
//! let orchestrator = DownloadOrchestrator::new(client).with_concurrency(5);
//! let outcomes = orchestrator
//!     .download_all(&plugins, std::path::Path::new("downloads"))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - HTTP transport with retry/backoff and streaming downloads
//! - [`registry`] - Registry API queries: popularity listing and download resolution
//! - [`downloader`] - Download orchestration over a bounded worker pool
//! - [`extractor`] - Archive extraction over a bounded worker pool
//! - [`output`] - Artifact path generation and CSV reporting
//! - [`metrics`] - Optional Prometheus observability
//!
//! ## Phases
//!
//! The three phases run strictly in sequence: the full ranked listing is the
//! input to the download phase, and the archive directory's final state is the
//! input to the extraction phase. Each phase runs its own bounded worker pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// CLI command implementations
pub mod cli;

/// Download orchestration
pub mod downloader;

/// Archive extraction
pub mod extractor;

/// HTTP transport with retry and streaming
pub mod fetcher;

/// Prometheus metrics
pub mod metrics;

/// Artifact paths and CSV reporting
pub mod output;

/// Registry API queries
pub mod registry;

// Re-export commonly used types
pub use fetcher::RegistryClient;

/// A plugin discovered during the listing phase (one per slug after dedup).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Plugin {
    /// Registry slug, the unique key naming the plugin
    pub slug: String,
    /// Display name with HTML entities decoded
    pub name: String,
    /// Reported count of current installations
    pub active_installs: u64,
    /// Last-updated timestamp as reported by the registry (opaque)
    pub last_updated: Option<String>,
    /// Listing page the surviving entry was seen on (1-based)
    pub page: u32,
}

/// A resolved download locator for a single plugin.
///
/// `download_url` is `None` when the registry metadata carried no usable
/// absolute URL; callers treat that as a soft failure, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    /// Registry slug
    pub slug: String,
    /// Absolute archive URL, if the registry provided one
    pub download_url: Option<String>,
    /// Version string from the registry metadata, if present
    pub version: Option<String>,
}

/// Per-item result of a download or extraction attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outcome {
    /// Registry slug
    pub slug: String,
    /// Whether the item completed (including idempotent skips)
    pub success: bool,
    /// Human-readable disposition ("downloaded", "already exists", failure reason)
    pub message: String,
    /// Version string, when known
    pub version: Option<String>,
}

impl Outcome {
    /// Successful outcome.
    pub fn ok(slug: impl Into<String>, message: impl Into<String>, version: Option<String>) -> Self {
        Self {
            slug: slug.into(),
            success: true,
            message: message.into(),
            version,
        }
    }

    /// Failed outcome.
    pub fn fail(
        slug: impl Into<String>,
        message: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            success: false,
            message: message.into(),
            version,
        }
    }
}

/// Success/failure counts for one completed phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    /// Items that completed, including idempotent skips
    pub ok: usize,
    /// Items that failed
    pub fail: usize,
}

impl PhaseSummary {
    /// Tally outcomes into a summary.
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let ok = outcomes.iter().filter(|o| o.success).count();
        Self {
            ok,
            fail: outcomes.len() - ok,
        }
    }
}
