//! Harvest command implementation
//!
//! Drives the three phases in sequence: listing, download, extraction. The
//! library reports outcomes; this layer owns everything user-facing - the
//! progress bar, per-item `[OK]`/`[FAIL]` lines, and the ranked listing echo.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::downloader::DownloadOrchestrator;
use crate::extractor::{version::probe_version, Extractor};
use crate::fetcher::RegistryClient;
use crate::output::write_report;
use crate::registry::PopularLister;
use crate::{Outcome, PhaseSummary, Plugin};

use super::CliError;

/// Maximum allowed concurrency to avoid hammering the registry
const MAX_CONCURRENCY: usize = 32;

/// Ranked entries echoed after the listing phase
const LISTING_ECHO_LIMIT: usize = 30;

/// Parse and validate a concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// Download popular plugins from the WordPress.org registry
#[derive(Debug, Parser)]
#[command(name = "plugin-harvester")]
#[command(about = "Bulk-download and extract popular WordPress.org plugins")]
pub struct Cli {
    /// Minimum active installs a plugin needs to be kept
    #[arg(short = 'm', long, default_value_t = 10_000)]
    pub min_installs: u64,

    /// Number of listing pages to fetch
    #[arg(short = 'p', long, default_value_t = 50)]
    pub pages: u32,

    /// Plugins per listing page
    #[arg(long, default_value_t = 100)]
    pub per_page: u32,

    /// Concurrent listing requests (max: 32)
    #[arg(long, default_value = "10", value_parser = parse_concurrency)]
    pub list_workers: usize,

    /// Concurrent archive downloads (max: 32)
    ///
    /// 5 is friendly to the registry; raise it for large offline mirrors.
    #[arg(short = 'w', long, default_value = "5", value_parser = parse_concurrency)]
    pub download_workers: usize,

    /// Concurrent archive extractions (max: 32)
    #[arg(long, default_value = "5", value_parser = parse_concurrency)]
    pub extract_workers: usize,

    /// Output directory for downloaded archives
    #[arg(short = 'o', long, default_value = "wp_zips")]
    pub output_dir: PathBuf,

    /// Output CSV report path
    #[arg(short = 'c', long, default_value = "plugins.csv")]
    pub csv_path: PathBuf,

    /// Only list plugins; skip download, extraction, and the report
    #[arg(long, default_value_t = false)]
    pub list_only: bool,

    /// Extract archives after downloading
    #[arg(short = 'e', long, default_value_t = false)]
    pub extract: bool,

    /// Directory for extracted plugins
    #[arg(long, default_value = "wp_extracted")]
    pub extract_dir: PathBuf,

    /// Re-download archives that already exist on disk
    #[arg(long, default_value_t = false)]
    pub force: bool,

    /// Bind a Prometheus scrape endpoint at this address (e.g. 127.0.0.1:9090)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Execute the harvest: list, download, extract, report.
    pub async fn execute(&self) -> Result<(), CliError> {
        info!(
            min_installs = self.min_installs,
            pages = self.pages,
            per_page = self.per_page,
            "fetching popular plugins"
        );

        let client = RegistryClient::new();
        let lister = PopularLister::new(client.clone());
        let plugins = lister
            .list_popular(self.min_installs, self.pages, self.per_page, self.list_workers)
            .await;

        println!("Unique plugins: {}", plugins.len());
        for plugin in plugins.iter().take(LISTING_ECHO_LIMIT) {
            println!(
                "{} {} - {} (page {})",
                plugin.active_installs, plugin.slug, plugin.name, plugin.page
            );
        }

        if self.list_only {
            return Ok(());
        }

        println!("\n--- Downloading archives ---");
        let mut outcomes = self.run_download_phase(client, &plugins).await?;

        if self.extract {
            println!("\n--- Extracting archives ---");
            self.run_extract_phase().await?;

            // Prefer the version each plugin declares in its extracted code
            // over the registry metadata.
            for outcome in outcomes.iter_mut().filter(|o| o.success) {
                if let Some(version) = probe_version(&self.extract_dir, &outcome.slug) {
                    outcome.version = Some(version);
                }
            }
        }

        write_report(&plugins, &outcomes, &self.csv_path)?;
        println!("Saved plugin report to {}", self.csv_path.display());

        Ok(())
    }

    /// Run the download pool, streaming per-item results to the terminal.
    async fn run_download_phase(
        &self,
        client: RegistryClient,
        plugins: &[Plugin],
    ) -> Result<Vec<Outcome>, CliError> {
        let orchestrator = DownloadOrchestrator::new(client)
            .with_concurrency(self.download_workers)
            .with_force(self.force);

        let pb = create_progress_bar(plugins.len() as u64, "Downloading archives");
        let mut stream = orchestrator
            .download_stream(plugins.to_vec(), &self.output_dir)
            .await?;

        let mut outcomes = Vec::with_capacity(plugins.len());
        while let Some(outcome) = stream.next().await {
            pb.println(format_outcome_line(&outcome));
            pb.inc(1);
            outcomes.push(outcome);
        }
        pb.finish_and_clear();

        let summary = PhaseSummary::from_outcomes(&outcomes);
        println!(
            "\nDownload done. OK={} FAIL={} -> folder: {}",
            summary.ok,
            summary.fail,
            self.output_dir.display()
        );

        Ok(outcomes)
    }

    /// Run the extraction pool, streaming per-item results to the terminal.
    async fn run_extract_phase(&self) -> Result<(), CliError> {
        let extractor = Extractor::new().with_concurrency(self.extract_workers);
        let mut stream = extractor.extract_stream(&self.output_dir, &self.extract_dir)?;

        let mut outcomes = Vec::new();
        while let Some(outcome) = stream.next().await {
            println!("{}", format_outcome_line(&outcome));
            outcomes.push(outcome);
        }

        let summary = PhaseSummary::from_outcomes(&outcomes);
        println!(
            "\nExtraction done. OK={} FAIL={} -> folder: {}",
            summary.ok,
            summary.fail,
            self.extract_dir.display()
        );

        Ok(())
    }
}

/// `[OK] slug: message` / `[FAIL] slug: message`
fn format_outcome_line(outcome: &Outcome) -> String {
    let tag = if outcome.success { "OK" } else { "FAIL" };
    format!("[{tag}] {}: {}", outcome.slug, outcome.message)
}

/// Create progress bar with style
fn create_progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(message);
    pb
}
