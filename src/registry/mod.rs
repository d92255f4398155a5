//! WordPress.org plugin registry API
//!
//! Two request shapes are consumed, both GET:
//!
//! - `query_plugins`: paged popularity listing (browse mode, page size, page
//!   number) returning a JSON object with a `plugins` array
//! - `plugin_information`: single-plugin metadata returning a JSON object
//!   with `download_link` and `version` fields
//!
//! [`listing`] aggregates the paged listing into a ranked candidate list;
//! [`resolve`] turns a slug into a download locator.

pub mod listing;
pub mod resolve;

pub use listing::PopularLister;
pub use resolve::resolve_download;

/// Production registry endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.wordpress.org/plugins/info/1.2/";

/// Build the paged popularity listing URL.
pub fn query_plugins_url(base_url: &str, page: u32, per_page: u32) -> String {
    format!(
        "{base_url}?action=query_plugins&request[browse]=popular&request[per_page]={per_page}&request[page]={page}"
    )
}

/// Build the single-plugin metadata URL.
pub fn plugin_information_url(base_url: &str, slug: &str) -> String {
    format!(
        "{base_url}?action=plugin_information&request[slug]={}",
        percent_encode(slug)
    )
}

/// URL-encode helper (subset; reqwest doesn't re-export this).
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push_str(&format!("%{b:02X}"));
            }
        }
    }
    out
}
