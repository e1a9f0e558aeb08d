//! Link handling around the resolver: finding the link in a message,
//! expanding short links, and picking a strategy chain per platform.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

use crate::download::HttpClient;
use crate::extract::{ExtractOptions, SubprocessExtractor};
use crate::resolver::{DirectStrategy, ExtractorStrategy, MediaResolver, ScraperApiStrategy};

/// First http(s) link in free text.
#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://\S+").expect("URL regex is valid") // Static pattern, safe to panic
});

/// Characters stripped from the end of a matched link (closing punctuation).
const TRAILING_PUNCTUATION: &[char] = &[')', ']', '}', '>', '"', '\''];

/// Hint appended to Pinterest failures when no cookies are configured.
pub const PINTEREST_COOKIE_HINT: &str =
    "Some pins need a logged-in session: set PINTEREST_COOKIES to a single-line cookie string";

/// Platform of a share link, as far as strategy selection needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// `tiktok.com`
    TikTok,
    /// `pinterest.com` or a `pin.it` short link
    Pinterest,
    /// `youtube.com` and `youtu.be`, Shorts included
    YouTube,
    /// Anything else
    Other,
}

impl Platform {
    /// Referer sent to the platform's CDN and to the extraction tool.
    #[must_use]
    pub fn referer(self) -> Option<&'static str> {
        match self {
            Self::TikTok => Some("https://www.tiktok.com/"),
            Self::Pinterest => Some("https://www.pinterest.com/"),
            Self::YouTube => Some("https://www.youtube.com/"),
            Self::Other => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TikTok => "TikTok",
            Self::Pinterest => "Pinterest",
            Self::YouTube => "YouTube",
            Self::Other => "other",
        })
    }
}

/// Returns the first http(s) link in `text` with trailing closing
/// punctuation removed.
#[must_use]
pub fn extract_first_url(text: &str) -> Option<String> {
    let found = URL_PATTERN.find(text)?;
    let url = found.as_str().trim_end_matches(TRAILING_PUNCTUATION);
    (!url.is_empty()).then(|| url.to_string())
}

/// Follows the redirects of a (short) link and returns where it lands.
///
/// Any failure returns `url` unchanged; expansion is best effort.
#[instrument(skip(client))]
pub async fn expand_url(client: &HttpClient, url: &str) -> String {
    match client.resolve_final_url(&client.request(url)).await {
        Ok(expanded) => {
            if expanded != url {
                debug!(%expanded, "short link expanded");
            }
            expanded
        }
        Err(error) => {
            debug!(%error, "link expansion failed, keeping original");
            url.to_string()
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Classifies a link. `original` is what the user sent, `expanded` where it
/// led; a `pin.it` original counts as Pinterest wherever it expanded to.
#[must_use]
pub fn classify(original: &str, expanded: &str) -> Platform {
    let host = host_of(expanded).unwrap_or_default();
    if host_matches(&host, "tiktok.com") {
        return Platform::TikTok;
    }
    if host_matches(&host, "pinterest.com")
        || host_of(original).is_some_and(|h| host_matches(&h, "pin.it"))
    {
        return Platform::Pinterest;
    }
    if host_matches(&host, "youtube.com") || host_matches(&host, "youtu.be") {
        return Platform::YouTube;
    }
    Platform::Other
}

/// Inputs for the per-platform strategy chains.
#[derive(Debug, Clone, Default)]
pub struct ChainSettings {
    /// JSON lookup service used for TikTok links.
    pub scraper_endpoint: Option<String>,
    /// Cookie line passed to the extractor for Pinterest links.
    pub pinterest_cookies: Option<String>,
}

/// Builds the strategy chain for a platform:
///
/// - TikTok: scraper API (when an endpoint is configured), then extractor
/// - Pinterest, YouTube: extractor
/// - Other: direct fetch, then extractor
#[must_use]
pub fn default_chain(
    platform: Platform,
    client: &Arc<HttpClient>,
    extractor: &Arc<SubprocessExtractor>,
    settings: &ChainSettings,
) -> MediaResolver {
    let mut options = platform
        .referer()
        .map(ExtractOptions::with_referer)
        .unwrap_or_default();
    if platform == Platform::Pinterest {
        options = options.cookies(settings.pinterest_cookies.as_deref());
    }
    let extract = Box::new(ExtractorStrategy::new(Arc::clone(extractor), options));

    let mut resolver = MediaResolver::new();
    match platform {
        Platform::TikTok => {
            if let Some(endpoint) = &settings.scraper_endpoint {
                let mut scraper = ScraperApiStrategy::new(Arc::clone(client), endpoint.clone());
                if let Some(referer) = platform.referer() {
                    scraper = scraper.media_header("Referer", referer);
                }
                resolver.register(Box::new(scraper));
            }
            resolver.register(extract);
        }
        Platform::Pinterest | Platform::YouTube => resolver.register(extract),
        Platform::Other => {
            resolver.register(Box::new(DirectStrategy::new(Arc::clone(client))));
            resolver.register(extract);
        }
    }
    resolver
}

/// Extra guidance for a failed acquisition, if any applies.
#[must_use]
pub fn failure_hint(original: &str, cookies_configured: bool) -> Option<&'static str> {
    let lower = original.to_ascii_lowercase();
    (!cookies_configured && (lower.contains("pinterest") || lower.contains("pin.it")))
        .then_some(PINTEREST_COOKIE_HINT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::FetchConfig;
    use crate::extract::ExtractorConfig;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn client() -> Arc<HttpClient> {
        Arc::new(
            HttpClient::new(FetchConfig {
                ipv4_only: false,
                max_retries: 1,
                ..FetchConfig::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn test_extract_first_url_trims_closing_punctuation() {
        assert_eq!(
            extract_first_url("olha isso (https://pin.it/abc123) demais").as_deref(),
            Some("https://pin.it/abc123")
        );
        assert_eq!(
            extract_first_url("\"https://www.tiktok.com/@u/video/1\"").as_deref(),
            Some("https://www.tiktok.com/@u/video/1")
        );
        assert_eq!(
            extract_first_url("a HTTPS://YOUTU.BE/x b https://second").as_deref(),
            Some("HTTPS://YOUTU.BE/x")
        );
        assert_eq!(extract_first_url("no link here"), None);
    }

    #[test]
    fn test_classify_platforms() {
        assert_eq!(
            classify("https://vm.tiktok.com/x", "https://www.tiktok.com/@u/video/1"),
            Platform::TikTok
        );
        assert_eq!(
            classify("https://pin.it/abc", "https://br.pinterest.com/pin/1/"),
            Platform::Pinterest
        );
        assert_eq!(
            classify("https://pin.it/abc", "https://pin.it/abc"),
            Platform::Pinterest
        );
        assert_eq!(
            classify("https://youtube.com/shorts/x", "https://www.youtube.com/shorts/x"),
            Platform::YouTube
        );
        assert_eq!(classify("https://youtu.be/x", "https://youtu.be/x"), Platform::YouTube);
        assert_eq!(
            classify("https://cdn.example.com/a.mp4", "https://cdn.example.com/a.mp4"),
            Platform::Other
        );
        assert_eq!(
            classify("https://nottiktok.com/x", "https://nottiktok.com/x"),
            Platform::Other
        );
    }

    #[test]
    fn test_default_chains() {
        let client = client();
        let extractor = Arc::new(SubprocessExtractor::new(ExtractorConfig::default()));
        let with_scraper = ChainSettings {
            scraper_endpoint: Some("https://api.example.com/ttdl".to_string()),
            pinterest_cookies: None,
        };
        let plain = ChainSettings::default();

        let chain = default_chain(Platform::TikTok, &client, &extractor, &with_scraper);
        assert_eq!(chain.strategy_names(), vec!["scraper-api", "extractor"]);
        let chain = default_chain(Platform::TikTok, &client, &extractor, &plain);
        assert_eq!(chain.strategy_names(), vec!["extractor"]);
        let chain = default_chain(Platform::Pinterest, &client, &extractor, &plain);
        assert_eq!(chain.strategy_names(), vec!["extractor"]);
        let chain = default_chain(Platform::YouTube, &client, &extractor, &plain);
        assert_eq!(chain.strategy_names(), vec!["extractor"]);
        let chain = default_chain(Platform::Other, &client, &extractor, &plain);
        assert_eq!(chain.strategy_names(), vec!["direct", "extractor"]);
    }

    #[test]
    fn test_failure_hint_only_for_pinterest_without_cookies() {
        assert_eq!(
            failure_hint("https://pin.it/abc", false),
            Some(PINTEREST_COOKIE_HINT)
        );
        assert_eq!(failure_hint("https://br.pinterest.com/pin/1", true), None);
        assert_eq!(failure_hint("https://youtu.be/x", false), None);
    }

    #[tokio::test]
    async fn test_expand_url_follows_redirects() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/abc"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/pin/99/"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pin/99/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;

        let client = client();
        let expanded = expand_url(&client, &format!("{}/abc", mock_server.uri())).await;
        assert_eq!(expanded, format!("{}/pin/99/", mock_server.uri()));
    }

    #[tokio::test]
    async fn test_expand_url_keeps_input_on_failure() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = client();
        let input = format!("{}/gone", mock_server.uri());
        assert_eq!(expand_url(&client, &input).await, input);
    }
}
