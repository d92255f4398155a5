//! Download locator resolution
//!
//! One metadata fetch per slug. A response without a usable absolute URL in
//! `download_link` resolves to `download_url: None`, which callers record as
//! an unresolved item rather than an error.

use crate::fetcher::{FetcherResult, RegistryClient};
use crate::registry::plugin_information_url;
use crate::ResolvedDownload;

/// Resolve a slug to its archive locator and version.
///
/// # Errors
/// Returns the fetcher's error when the metadata request itself fails after
/// retries. A missing locator is not an error.
pub async fn resolve_download(
    client: &RegistryClient,
    base_url: &str,
    slug: &str,
) -> FetcherResult<ResolvedDownload> {
    let url = plugin_information_url(base_url, slug);
    let info = client.fetch_json(&url).await?;
    Ok(parse_resolution(slug, &info))
}

/// Extract the locator and version from a `plugin_information` response.
fn parse_resolution(slug: &str, info: &serde_json::Value) -> ResolvedDownload {
    let version = info
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    let download_url = info
        .get("download_link")
        .and_then(|d| d.as_str())
        .filter(|url| url.starts_with("http"))
        .map(str::to_string);

    ResolvedDownload {
        slug: slug.to_string(),
        download_url,
        version,
    }
}
