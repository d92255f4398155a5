//! Version probe for extracted plugins
//!
//! The registry's metadata version can lag the shipped code, so after
//! extraction the report prefers the version declared inside the plugin
//! itself. Probe order:
//!
//! 1. `readme.txt` - the `Stable tag:` header (ignoring `trunk`)
//! 2. `<slug>.php` - the `Version:` line of the plugin header comment
//! 3. any other top-level `.php` file with a `Version:` line

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

static STABLE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*stable\s+tag:\s*(.+)").unwrap());
static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*\*?\s*version:\s*(.+)").unwrap());

/// Lines scanned per file before giving up; headers sit at the top.
const HEADER_SCAN_LINES: usize = 100;

/// Probe the extracted tree of `slug` for a declared version.
pub fn probe_version(extract_dir: &Path, slug: &str) -> Option<String> {
    let plugin_dir = crate::output::extract_path(extract_dir, slug);

    if let Some(version) = match_in_file(&plugin_dir.join("readme.txt"), &STABLE_TAG_RE) {
        if version != "trunk" {
            return Some(version);
        }
    }

    if let Some(version) = match_in_file(&plugin_dir.join(format!("{slug}.php")), &VERSION_RE) {
        return Some(version);
    }

    // Main file is not always named after the slug; try the rest.
    let entries = std::fs::read_dir(&plugin_dir).ok()?;
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.extension().map(|e| e == "php").unwrap_or(false) {
            if let Some(version) = match_in_file(&path, &VERSION_RE) {
                return Some(version);
            }
        }
    }

    None
}

/// First capture of `re` within the head of `path`, trimmed; `None` when the
/// file is missing, unreadable, or carries no match.
fn match_in_file(path: &Path, re: &Regex) -> Option<String> {
    let file = File::open(path).ok()?;
    let reader = BufReader::new(file);

    for line in reader.lines().take(HEADER_SCAN_LINES) {
        let line = line.ok()?;
        if let Some(caps) = re.captures(&line) {
            let version = caps.get(1)?.as_str().trim();
            if !version.is_empty() {
                return Some(version.to_string());
            }
        }
    }
    None
}
