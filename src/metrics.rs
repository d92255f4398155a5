//! Production observability metrics
//!
//! Counters for retry behavior and per-phase outcomes, collected through the
//! `metrics` crate with an optional Prometheus scrape endpoint. Recording is
//! a no-op until [`init_metrics`] installs the exporter, so library callers
//! pay nothing when observability is off.

use std::net::SocketAddr;

use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

static METRICS_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Install the Prometheus exporter and register metric descriptions.
///
/// Idempotent; typically called once from `main` when `--metrics-addr` is
/// given.
///
/// # Errors
/// Returns an error when the scrape endpoint cannot bind.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INITIALIZED.get().is_some() {
        debug!("metrics already initialized, skipping");
        return Ok(());
    }

    info!(%addr, "initializing metrics exporter");

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "http_retries_total",
        Unit::Count,
        "Total number of HTTP retry attempts"
    );
    describe_counter!(
        "downloads_completed_total",
        Unit::Count,
        "Archives downloaded successfully"
    );
    describe_counter!(
        "downloads_skipped_total",
        Unit::Count,
        "Downloads skipped because the archive was already on disk"
    );
    describe_counter!(
        "downloads_failed_total",
        Unit::Count,
        "Download attempts that ended in a failure outcome"
    );
    describe_counter!(
        "extractions_completed_total",
        Unit::Count,
        "Archives extracted successfully"
    );
    describe_counter!(
        "extractions_skipped_total",
        Unit::Count,
        "Extractions skipped because the destination already existed"
    );
    describe_counter!(
        "extractions_failed_total",
        Unit::Count,
        "Extraction attempts that ended in a failure outcome"
    );

    let _ = METRICS_INITIALIZED.set(());
    Ok(())
}

/// Record one HTTP retry.
pub fn record_http_retry() {
    counter!("http_retries_total").increment(1);
}

/// Record a completed download.
pub fn record_download_success() {
    counter!("downloads_completed_total").increment(1);
}

/// Record an idempotent download skip.
pub fn record_download_skipped() {
    counter!("downloads_skipped_total").increment(1);
}

/// Record a failed download.
pub fn record_download_failure() {
    counter!("downloads_failed_total").increment(1);
}

/// Record a completed extraction.
pub fn record_extract_success() {
    counter!("extractions_completed_total").increment(1);
}

/// Record an idempotent extraction skip.
pub fn record_extract_skipped() {
    counter!("extractions_skipped_total").increment(1);
}

/// Record a failed extraction.
pub fn record_extract_failure() {
    counter!("extractions_failed_total").increment(1);
}
