//! CSV report writer
//!
//! One row per listed plugin, in ranked order, whether or not a download was
//! attempted. Status values:
//!
//! - `downloaded` - the archive is on disk (fresh download or idempotent skip)
//! - `failed: <reason>` - the attempt failed; the reason is the outcome message
//! - `not downloaded` - the plugin was listed but never attempted

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::Writer;
use serde::Serialize;
use tracing::info;

use super::{OutputError, OutputResult};
use crate::{Outcome, Plugin};

/// CSV row for one plugin
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    name: &'a str,
    version: &'a str,
    slug: &'a str,
    status: String,
}

/// Write the per-plugin report to `path`.
///
/// # Errors
/// Returns [`OutputError::IoError`] if the file or its parent directory
/// cannot be created, [`OutputError::CsvError`] on serialization failure.
pub fn write_report(plugins: &[Plugin], outcomes: &[Outcome], path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("failed to create directory: {e}")))?;
        }
    }

    let file = File::create(path)
        .map_err(|e| OutputError::IoError(format!("failed to create report: {e}")))?;
    let mut writer = Writer::from_writer(BufWriter::new(file));

    let by_slug: HashMap<&str, &Outcome> =
        outcomes.iter().map(|o| (o.slug.as_str(), o)).collect();

    for plugin in plugins {
        let (status, version) = match by_slug.get(plugin.slug.as_str()) {
            Some(outcome) if outcome.success => {
                ("downloaded".to_string(), outcome.version.as_deref())
            }
            Some(outcome) => (format!("failed: {}", outcome.message), outcome.version.as_deref()),
            None => ("not downloaded".to_string(), None),
        };

        writer
            .serialize(ReportRow {
                name: &plugin.name,
                version: version.unwrap_or(""),
                slug: &plugin.slug,
                status,
            })
            .map_err(|e| OutputError::CsvError(format!("failed to write row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| OutputError::IoError(format!("failed to flush report: {e}")))?;

    info!(path = %path.display(), rows = plugins.len(), "report written");
    Ok(())
}
