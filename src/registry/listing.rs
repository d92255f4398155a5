//! Popularity listing with concurrent page aggregation
//!
//! Fans out one fetch task per page over a bounded worker pool and merges
//! completed pages into a deduplicated candidate map in a single aggregating
//! task, so no lock is needed around the map. Pages are merged in completion
//! order, not page order.
//!
//! Degradation policy: a page whose response has an unexpected shape
//! contributes zero candidates, and a page whose fetch fails after the retry
//! budget is logged and skipped. Neither aborts the listing of other pages.

use std::collections::HashMap;

use futures_util::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::fetcher::RegistryClient;
use crate::registry::query_plugins_url;
use crate::Plugin;

/// Lists popular plugins from the registry, ranked by install count.
#[derive(Debug, Clone)]
pub struct PopularLister {
    client: RegistryClient,
    base_url: String,
}

impl PopularLister {
    /// Create a lister against the production registry.
    pub fn new(client: RegistryClient) -> Self {
        Self {
            client,
            base_url: super::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the registry base URL (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch `pages` listing pages with at most `concurrency` requests in
    /// flight, keep plugins with at least `min_installs` active installs,
    /// deduplicate by slug, and return the survivors ranked by install count
    /// descending (ties broken by slug).
    pub async fn list_popular(
        &self,
        min_installs: u64,
        pages: u32,
        per_page: u32,
        concurrency: usize,
    ) -> Vec<Plugin> {
        let span = tracing::info_span!("list_popular", min_installs, pages, per_page);
        let _enter = span.enter();

        let mut completed = stream::iter(1..=pages)
            .map(|page| {
                let client = self.client.clone();
                let url = query_plugins_url(&self.base_url, page, per_page);
                async move { (page, fetch_page_items(&client, &url, page).await) }
            })
            .buffer_unordered(concurrency.max(1));

        // Single aggregating consumer: pages arrive in completion order and
        // are merged one at a time, which serializes map mutation.
        let mut by_slug: HashMap<String, Plugin> = HashMap::new();
        while let Some((page, items)) = completed.next().await {
            debug!(page, items = items.len(), "page aggregated");
            for raw in items {
                let Some(candidate) = parse_candidate(&raw, page) else {
                    continue;
                };
                if candidate.active_installs < min_installs {
                    continue;
                }
                merge_candidate(&mut by_slug, candidate);
            }
        }

        let mut plugins: Vec<Plugin> = by_slug.into_values().collect();
        plugins.sort_by(|a, b| {
            b.active_installs
                .cmp(&a.active_installs)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        info!(unique_plugins = plugins.len(), "listing complete");
        plugins
    }
}

/// Fetch one listing page and return its raw item array.
///
/// Both failure modes degrade to an empty page: a missing or non-array
/// `plugins` field, and a fetch that exhausts its retries.
async fn fetch_page_items(
    client: &RegistryClient,
    url: &str,
    page: u32,
) -> Vec<serde_json::Value> {
    match client.fetch_json(url).await {
        Ok(body) => match body.get("plugins").and_then(|p| p.as_array()) {
            Some(items) => items.clone(),
            None => {
                warn!(page, "listing page missing plugins array, skipping");
                Vec::new()
            }
        },
        Err(e) => {
            warn!(page, error = %e, "listing page fetch failed, skipping");
            Vec::new()
        }
    }
}

/// Parse one raw listing item into a candidate. Items without a slug are
/// dropped; a missing or malformed install count reads as zero.
fn parse_candidate(raw: &serde_json::Value, page: u32) -> Option<Plugin> {
    let slug = raw.get("slug")?.as_str()?.trim();
    if slug.is_empty() {
        return None;
    }

    let active_installs = match raw.get("active_installs") {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0),
        None => 0,
    };

    let name = raw
        .get("name")
        .and_then(|n| n.as_str())
        .map(decode_html_entities)
        .unwrap_or_default();

    let last_updated = raw
        .get("last_updated")
        .and_then(|l| l.as_str())
        .map(str::to_string);

    Some(Plugin {
        slug: slug.to_string(),
        name,
        active_installs,
        last_updated,
        page,
    })
}

/// Merge a candidate into the dedup map: a strictly greater install count
/// replaces the held entry, a tie keeps the earlier-seen one.
fn merge_candidate(by_slug: &mut HashMap<String, Plugin>, candidate: Plugin) {
    match by_slug.get(&candidate.slug) {
        Some(prev) if candidate.active_installs <= prev.active_installs => {}
        _ => {
            by_slug.insert(candidate.slug.clone(), candidate);
        }
    }
}

/// Decode common HTML entities in registry plugin names.
fn decode_html_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#038;", "&")
        .replace("&#8211;", "\u{2013}")
}
