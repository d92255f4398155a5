//! Deterministic artifact path generation
//!
//! Every plugin owns exactly two on-disk artifacts, both named from its slug:
//! the downloaded archive `<dir>/<slug>.zip` and the extraction directory
//! `<dir>/<slug>/`. Their presence is the only resumability signal the tool
//! keeps, so path generation must be stable across runs.

use std::path::{Path, PathBuf};

/// Archive destination for a slug: `<dir>/<slug>.zip`.
pub fn archive_path(dir: &Path, slug: &str) -> PathBuf {
    dir.join(format!("{}.zip", safe_slug(slug)))
}

/// Extraction destination for a slug: `<dir>/<slug>/`.
pub fn extract_path(dir: &Path, slug: &str) -> PathBuf {
    dir.join(safe_slug(slug))
}

/// Registry slugs are lowercase `[a-z0-9-]`, but path generation does not
/// trust that: separators and leading dots are rewritten so a hostile slug
/// cannot escape the output directory.
fn safe_slug(slug: &str) -> String {
    let cleaned = slug.replace(['/', '\\'], "_");
    cleaned.trim_start_matches('.').to_string()
}
