//! Bounded-concurrency archive download

use std::path::Path;

use futures_util::{stream, Stream, StreamExt};
use tracing::{debug, info};

use crate::downloader::DownloadError;
use crate::fetcher::RegistryClient;
use crate::metrics;
use crate::output::archive_path;
use crate::registry::{resolve_download, DEFAULT_BASE_URL};
use crate::{Outcome, PhaseSummary, Plugin};

/// Default number of concurrent download workers.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 5;

/// Orchestrates the download phase over a bounded worker pool.
#[derive(Debug, Clone)]
pub struct DownloadOrchestrator {
    client: RegistryClient,
    base_url: String,
    concurrency: usize,
    force: bool,
}

impl DownloadOrchestrator {
    /// Create an orchestrator against the production registry.
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            force: false,
        }
    }

    /// Override the registry base URL (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the worker pool width.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Re-download archives even when they already exist on disk.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Download every plugin's archive into `out_dir`, returning outcomes in
    /// completion order. One outcome is produced per input plugin.
    ///
    /// # Errors
    /// Returns [`DownloadError::IoError`] only when `out_dir` cannot be
    /// created; per-item failures are reported through the outcomes.
    pub async fn download_all(
        &self,
        plugins: &[Plugin],
        out_dir: &Path,
    ) -> Result<Vec<Outcome>, DownloadError> {
        let span = tracing::info_span!("download_all", plugins = plugins.len());
        let _enter = span.enter();

        let outcomes: Vec<Outcome> = self
            .download_stream(plugins.to_vec(), out_dir)
            .await?
            .collect()
            .await;

        let summary = PhaseSummary::from_outcomes(&outcomes);
        info!(ok = summary.ok, fail = summary.fail, "download phase complete");
        Ok(outcomes)
    }

    /// Start the download pool and yield outcomes as workers finish.
    ///
    /// Callers that need per-item progress (the CLI's progress bar and
    /// `[OK]`/`[FAIL]` lines) consume this stream directly; [`Self::download_all`]
    /// is the collecting wrapper.
    ///
    /// # Errors
    /// Returns [`DownloadError::IoError`] when `out_dir` cannot be created.
    pub async fn download_stream(
        &self,
        plugins: Vec<Plugin>,
        out_dir: &Path,
    ) -> Result<impl Stream<Item = Outcome>, DownloadError> {
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| DownloadError::IoError(format!("cannot create {}: {e}", out_dir.display())))?;

        let out_dir = out_dir.to_path_buf();
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let force = self.force;

        Ok(stream::iter(plugins)
            .map(move |plugin| {
                let client = client.clone();
                let base_url = base_url.clone();
                let out_dir = out_dir.clone();
                async move { download_one(&client, &base_url, &plugin.slug, &out_dir, force).await }
            })
            .buffer_unordered(self.concurrency))
    }
}

/// Download a single plugin's archive, idempotently.
///
/// Dispositions, in order:
/// 1. archive already on disk with non-zero size -> success "already exists",
///    with zero network access (unless `force`)
/// 2. metadata fetch failed after retries -> failure outcome
/// 3. no usable locator -> failure outcome "no download link"
/// 4. streamed download -> success "downloaded" or failure with the reason
async fn download_one(
    client: &RegistryClient,
    base_url: &str,
    slug: &str,
    out_dir: &Path,
    force: bool,
) -> Outcome {
    let dest = archive_path(out_dir, slug);
    if !force && file_has_content(&dest).await {
        debug!(slug, dest = %dest.display(), "archive present, skipping");
        metrics::record_download_skipped();
        return Outcome::ok(slug, "already exists", None);
    }

    let resolved = match resolve_download(client, base_url, slug).await {
        Ok(resolved) => resolved,
        Err(e) => {
            metrics::record_download_failure();
            return Outcome::fail(slug, format!("error: {e}"), None);
        }
    };

    let Some(url) = resolved.download_url else {
        metrics::record_download_failure();
        return Outcome::fail(slug, "no download link", resolved.version);
    };

    match client.download_to_path(&url, &dest).await {
        Ok(()) => {
            metrics::record_download_success();
            Outcome::ok(slug, "downloaded", resolved.version)
        }
        Err(e) => {
            metrics::record_download_failure();
            Outcome::fail(slug, format!("download failed: {e}"), resolved.version)
        }
    }
}

/// Whether `path` exists as a non-empty file.
async fn file_has_content(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}
