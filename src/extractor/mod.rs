//! Archive extraction over a bounded worker pool
//!
//! Operates independently of the download phase: the input is whatever
//! `*.zip` files are present in the archive directory. Extraction is
//! idempotent per slug (an existing destination directory is a completed
//! extraction) and failure-isolated (a corrupt archive yields a failure
//! outcome, not an aborted batch).
//!
//! ZIP decompression is blocking work, so each archive is unpacked on the
//! blocking thread pool; the in-flight count is still bounded by the
//! configured concurrency.

pub mod version;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use futures_util::{stream, Stream, StreamExt};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::metrics;
use crate::output::extract_path;
use crate::{Outcome, PhaseSummary};

/// Default number of concurrent extraction workers.
pub const DEFAULT_EXTRACT_CONCURRENCY: usize = 5;

/// Extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Setup-time filesystem failure; per-archive failures become outcomes instead
    #[error("IO error: {0}")]
    IoError(String),
}

/// Runs the extraction phase over a bounded worker pool.
#[derive(Debug, Clone)]
pub struct Extractor {
    concurrency: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Create an extractor with the default pool width.
    pub fn new() -> Self {
        Self {
            concurrency: DEFAULT_EXTRACT_CONCURRENCY,
        }
    }

    /// Set the worker pool width.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Extract every `*.zip` in `archive_dir` into `extract_dir`, returning
    /// outcomes in completion order. An empty or missing archive directory
    /// yields an empty result.
    ///
    /// # Errors
    /// Returns [`ExtractError::IoError`] only when `extract_dir` cannot be
    /// created or `archive_dir` cannot be read; per-archive failures are
    /// reported through the outcomes.
    pub async fn extract_all(
        &self,
        archive_dir: &Path,
        extract_dir: &Path,
    ) -> Result<Vec<Outcome>, ExtractError> {
        let span = tracing::info_span!("extract_all");
        let _enter = span.enter();

        let outcomes: Vec<Outcome> = self
            .extract_stream(archive_dir, extract_dir)?
            .collect()
            .await;

        let summary = PhaseSummary::from_outcomes(&outcomes);
        info!(ok = summary.ok, fail = summary.fail, "extraction phase complete");
        Ok(outcomes)
    }

    /// Start the extraction pool and yield outcomes as workers finish.
    ///
    /// # Errors
    /// Returns [`ExtractError::IoError`] on setup failure.
    pub fn extract_stream(
        &self,
        archive_dir: &Path,
        extract_dir: &Path,
    ) -> Result<impl Stream<Item = Outcome>, ExtractError> {
        std::fs::create_dir_all(extract_dir).map_err(|e| {
            ExtractError::IoError(format!("cannot create {}: {e}", extract_dir.display()))
        })?;

        let archives = list_archives(archive_dir)?;
        if archives.is_empty() {
            info!(dir = %archive_dir.display(), "no archives found");
        }

        let extract_dir = extract_dir.to_path_buf();
        Ok(stream::iter(archives)
            .map(move |archive| {
                let extract_dir = extract_dir.clone();
                async move {
                    let slug = archive_slug(&archive);
                    tokio::task::spawn_blocking(move || extract_one(&archive, &extract_dir))
                        .await
                        .unwrap_or_else(|e| {
                            Outcome::fail(slug, format!("extraction task failed: {e}"), None)
                        })
                }
            })
            .buffer_unordered(self.concurrency))
    }
}

/// Enumerate `*.zip` files in `dir`. A missing directory reads as empty.
fn list_archives(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(ExtractError::IoError(format!(
                "cannot read {}: {e}",
                dir.display()
            )));
        }
    };

    let mut archives: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "zip").unwrap_or(false))
        .collect();
    archives.sort();
    Ok(archives)
}

/// Slug an archive file was named from (`downloads/akismet.zip` -> `akismet`).
fn archive_slug(archive: &Path) -> String {
    archive
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Unpack one archive into the extraction root, idempotently.
fn extract_one(archive: &Path, extract_dir: &Path) -> Outcome {
    let slug = archive_slug(archive);

    let dest = extract_path(extract_dir, &slug);
    if dest.is_dir() {
        debug!(slug, dest = %dest.display(), "destination present, skipping");
        metrics::record_extract_skipped();
        return Outcome::ok(slug, "already exists", None);
    }

    let file = match File::open(archive) {
        Ok(file) => file,
        Err(e) => {
            metrics::record_extract_failure();
            return Outcome::fail(slug, format!("cannot open: {e}"), None);
        }
    };

    let mut zip = match ZipArchive::new(BufReader::new(file)) {
        Ok(zip) => zip,
        Err(e) => {
            metrics::record_extract_failure();
            return Outcome::fail(slug, format!("invalid archive: {e}"), None);
        }
    };

    // Archives carry a `<slug>/` top-level directory, so extracting into the
    // root produces the per-slug destination checked above.
    match zip.extract(extract_dir) {
        Ok(()) => {
            metrics::record_extract_success();
            Outcome::ok(slug, "extracted", None)
        }
        Err(e) => {
            metrics::record_extract_failure();
            Outcome::fail(slug, format!("extract failed: {e}"), None)
        }
    }
}
