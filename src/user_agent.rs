//! Baseline browser headers shared by the fetcher and the extractor.
//!
//! Media hosts and CDNs routinely reject requests that do not look like a
//! desktop browser, so every outbound request starts from this set and callers
//! only override what they must (usually `Referer`).

use std::collections::BTreeMap;

/// Desktop Chrome User-Agent sent on every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Accept-Language matching the audience the bot was built for.
pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Referer used unless a strategy supplies a platform-specific one.
pub const DEFAULT_REFERER: &str = "https://www.google.com/";

/// Returns the baseline header set, keyed by canonical header name.
#[must_use]
pub fn baseline_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("User-Agent".to_string(), BROWSER_USER_AGENT.to_string()),
        ("Accept".to_string(), "*/*".to_string()),
        ("Accept-Language".to_string(), ACCEPT_LANGUAGE.to_string()),
        ("Referer".to_string(), DEFAULT_REFERER.to_string()),
    ])
}

/// Merges `overrides` over the baseline. Names compare case-insensitively and
/// the override's spelling wins.
#[must_use]
pub fn merged_headers(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut headers = baseline_headers();
    for (name, value) in overrides {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
    headers
}
