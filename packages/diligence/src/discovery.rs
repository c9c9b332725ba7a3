//! Bounded breadth-first URL discovery over a target domain.
//!
//! Seeds the frontier with the domain roots plus the well-known
//! organization-intelligence paths, then widens through on-page links.
//! Discovery is goal-directed, not exhaustive: it stops at the URL cap,
//! stays on the target domain, and skips binary resources. A failed fetch
//! never aborts the traversal.

use indexmap::IndexSet;
use regex::Regex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::traits::fetcher::PageFetcher;
use crate::types::config::{DiscoveryConfig, BINARY_EXTENSIONS};

/// Extracts candidate links from raw HTML.
///
/// Pages reference same-domain URLs in more places than anchor tags, so
/// four patterns run over every page: `href=`, `src=`, CSS `url(...)` and
/// bare absolute URLs in text or scripts.
pub struct LinkExtractor {
    href_pattern: Regex,
    src_pattern: Regex,
    css_url_pattern: Regex,
    absolute_pattern: Regex,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self {
            href_pattern: Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap(),
            src_pattern: Regex::new(r#"src\s*=\s*["']([^"']+)["']"#).unwrap(),
            css_url_pattern: Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).unwrap(),
            absolute_pattern: Regex::new(r#"https?://[A-Za-z0-9._~:/?#\[\]@!$&'*+,;=%-]+"#)
                .unwrap(),
        }
    }

    /// Extract all candidate links, resolved against the page URL.
    pub fn extract(&self, base_url: &Url, html: &str) -> Vec<String> {
        let mut links = Vec::new();

        for pattern in [&self.href_pattern, &self.src_pattern, &self.css_url_pattern] {
            for cap in pattern.captures_iter(html) {
                if let Some(raw) = cap.get(1) {
                    let raw = raw.as_str();

                    // Skip anchors, javascript, mailto
                    if raw.starts_with('#')
                        || raw.starts_with("javascript:")
                        || raw.starts_with("mailto:")
                        || raw.starts_with("tel:")
                        || raw.starts_with("data:")
                    {
                        continue;
                    }

                    if let Ok(resolved) = base_url.join(raw) {
                        links.push(resolved.to_string());
                    }
                }
            }
        }

        // Bare absolute URLs in text or inline scripts
        for m in self.absolute_pattern.find_iter(html) {
            links.push(m.as_str().trim_end_matches(['.', ',', ')']).to_string());
        }

        links
    }
}

/// Bounded BFS discovery over one domain's link graph.
pub struct UrlDiscovery<F: PageFetcher + ?Sized> {
    fetcher: Arc<F>,
    extractor: LinkExtractor,
    config: DiscoveryConfig,
}

impl<F: PageFetcher + ?Sized + 'static> UrlDiscovery<F> {
    pub fn new(fetcher: Arc<F>, config: DiscoveryConfig) -> Self {
        Self {
            fetcher,
            extractor: LinkExtractor::new(),
            config,
        }
    }

    /// Seed URLs for a domain: both schemes on the root plus every
    /// configured important path.
    fn seeds(&self, domain: &str) -> Vec<String> {
        let mut seeds = vec![
            format!("https://{}", domain),
            format!("http://{}", domain),
        ];
        for path in &self.config.seed_paths {
            seeds.push(format!("https://{}{}", domain, path));
        }
        seeds
    }

    /// Discover up to `max_urls` same-domain pages.
    ///
    /// Returns final (post-redirect) URLs, deduplicated, in discovery order.
    pub async fn discover(&self, domain: &str) -> Vec<String> {
        info!(
            domain = %domain,
            max_urls = self.config.max_urls,
            seeds = self.config.seed_paths.len() + 2,
            "URL discovery starting"
        );

        let mut queue: VecDeque<String> = self.seeds(domain).into();
        let mut visited: HashSet<String> = queue.iter().cloned().collect();
        let mut discovered: IndexSet<String> = IndexSet::new();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

        while !queue.is_empty() && discovered.len() < self.config.max_urls {
            // One BFS wave: everything currently queued, fetched in a
            // bounded-parallel group
            let wave: Vec<String> = queue.drain(..).collect();
            debug!(wave_size = wave.len(), discovered = discovered.len(), "Processing wave");

            let mut handles = Vec::with_capacity(wave.len());
            for url in wave {
                let fetcher = self.fetcher.clone();
                let sem = semaphore.clone();

                handles.push(tokio::spawn(async move {
                    let _permit = sem.acquire().await.ok()?;
                    match fetcher.fetch(&url).await {
                        Ok(page) => Some(page),
                        Err(e) => {
                            // A single bad page never aborts discovery
                            warn!(url = %url, error = %e, "Discovery fetch failed, skipping");
                            None
                        }
                    }
                }));
            }

            for handle in handles {
                let page = match handle.await {
                    Ok(Some(page)) => page,
                    _ => continue,
                };

                if discovered.len() >= self.config.max_urls {
                    break;
                }

                // Record the final URL so redirected duplicates collapse
                let final_url = normalize(&page.final_url);
                if !discovered.insert(final_url.clone()) {
                    continue;
                }

                let base = match Url::parse(&final_url) {
                    Ok(base) => base,
                    Err(_) => continue,
                };

                for link in self.extractor.extract(&base, &page.html) {
                    let link = normalize(&link);
                    if visited.contains(&link) {
                        continue;
                    }
                    if !is_crawlable(&link, domain) {
                        continue;
                    }
                    visited.insert(link.clone());
                    queue.push_back(link);
                }
            }
        }

        info!(
            domain = %domain,
            discovered = discovered.len(),
            visited = visited.len(),
            "URL discovery completed"
        );

        discovered.into_iter().collect()
    }
}

/// Strip fragments and trailing slashes so near-identical URLs collapse.
fn normalize(url: &str) -> String {
    let mut url = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return url.to_string(),
    };
    url.set_fragment(None);
    let mut s = url.to_string();
    if s.ends_with('/') && url.path() != "/" {
        s.pop();
    }
    s
}

/// Same-domain, non-binary, http(s) URLs only.
fn is_crawlable(url: &str, domain: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }

    let host = match parsed.host_str() {
        Some(h) => h,
        None => return false,
    };
    let bare = host.strip_prefix("www.").unwrap_or(host);
    let target = domain.strip_prefix("www.").unwrap_or(domain);
    if bare != target {
        return false;
    }

    let path = parsed.path().to_lowercase();
    if BINARY_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use crate::types::page::FetchedPage;

    #[test]
    fn test_extract_links_multiple_patterns() {
        let extractor = LinkExtractor::new();
        let base = Url::parse("https://example.com/page").unwrap();

        let html = r##"
            <a href="/about">About</a>
            <script src="/static/app.js"></script>
            <div style="background: url('/img/bg.png')"></div>
            Plain mention: https://example.com/pricing in text.
            <a href="#section">Anchor</a>
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:team@example.com">Mail</a>
        "##;

        let links = extractor.extract(&base, html);

        assert!(links.contains(&"https://example.com/about".to_string()));
        assert!(links.contains(&"https://example.com/static/app.js".to_string()));
        assert!(links.contains(&"https://example.com/img/bg.png".to_string()));
        assert!(links.contains(&"https://example.com/pricing".to_string()));
        assert!(!links.iter().any(|l| l.contains("javascript")));
        assert!(!links.iter().any(|l| l.contains("mailto")));
    }

    #[test]
    fn test_is_crawlable_filters() {
        assert!(is_crawlable("https://example.com/about", "example.com"));
        assert!(is_crawlable("https://www.example.com/about", "example.com"));
        assert!(!is_crawlable("https://other.com/about", "example.com"));
        assert!(!is_crawlable("https://example.com/logo.png", "example.com"));
        assert!(!is_crawlable("https://example.com/styles.css", "example.com"));
        assert!(!is_crawlable("ftp://example.com/file", "example.com"));
    }

    #[test]
    fn test_normalize_strips_fragment_and_slash() {
        assert_eq!(
            normalize("https://example.com/about/#team"),
            "https://example.com/about"
        );
        assert_eq!(normalize("https://example.com/"), "https://example.com/");
    }

    #[tokio::test]
    async fn test_discover_follows_links_and_dedupes() {
        let fetcher = MockFetcher::new()
            .with_page(FetchedPage::new(
                "https://example.com",
                r#"<a href="/about">About</a> <a href="/team">Team</a>"#,
            ))
            .with_page(FetchedPage::new(
                "https://example.com/about",
                r#"<a href="/team">Team</a>"#,
            ))
            .with_page(FetchedPage::new("https://example.com/team", "Team page"));

        let discovery = UrlDiscovery::new(
            Arc::new(fetcher),
            DiscoveryConfig::new()
                .with_seed_paths(["/about"])
                .with_max_urls(10),
        );

        let urls = discovery.discover("example.com").await;

        assert!(urls.contains(&"https://example.com/".to_string()));
        assert!(urls.contains(&"https://example.com/about".to_string()));
        assert!(urls.contains(&"https://example.com/team".to_string()));
        // No duplicates
        let unique: HashSet<_> = urls.iter().collect();
        assert_eq!(unique.len(), urls.len());
    }

    #[tokio::test]
    async fn test_discover_respects_cap_with_many_links() {
        // A root page linking to 400 pages must still stay under the cap
        let mut root_html = String::new();
        let mut fetcher = MockFetcher::new();
        for i in 0..400 {
            root_html.push_str(&format!(r#"<a href="/page-{}">p</a>"#, i));
            fetcher = fetcher.with_page(FetchedPage::new(
                format!("https://example.com/page-{}", i),
                "leaf",
            ));
        }
        fetcher = fetcher.with_page(FetchedPage::new("https://example.com", root_html));

        let discovery = UrlDiscovery::new(
            Arc::new(fetcher),
            DiscoveryConfig::new().with_seed_paths(Vec::<String>::new()).with_max_urls(300),
        );

        let urls = discovery.discover("example.com").await;
        assert!(urls.len() <= 300);
        assert!(urls.len() > 1);
    }

    #[tokio::test]
    async fn test_seed_paths_attempted_before_link_expansion() {
        // Seeds form the first wave, so every important path is requested
        // before any discovered link competes for the cap
        let mut root_html = String::new();
        for i in 0..20 {
            root_html.push_str(&format!(r#"<a href="/page-{}">p</a>"#, i));
        }
        let fetcher = MockFetcher::new()
            .with_page(FetchedPage::new("https://example.com", root_html))
            .with_page(FetchedPage::new("https://example.com/about", "about"))
            .with_page(FetchedPage::new("https://example.com/team", "team"));

        let fetcher = Arc::new(fetcher);
        let discovery = UrlDiscovery::new(
            fetcher.clone(),
            DiscoveryConfig::new()
                .with_seed_paths(["/about", "/team"])
                .with_max_urls(4),
        );

        discovery.discover("example.com").await;

        let calls = fetcher.calls();
        assert!(calls.contains(&"https://example.com/about".to_string()));
        assert!(calls.contains(&"https://example.com/team".to_string()));
    }

    #[tokio::test]
    async fn test_discover_survives_fetch_failures() {
        let fetcher = MockFetcher::new()
            .with_page(FetchedPage::new(
                "https://example.com",
                r#"<a href="/broken">x</a> <a href="/ok">y</a>"#,
            ))
            .with_page(FetchedPage::new("https://example.com/ok", "fine"))
            .fail_url("https://example.com/broken");

        let discovery = UrlDiscovery::new(
            Arc::new(fetcher),
            DiscoveryConfig::new().with_seed_paths(Vec::<String>::new()),
        );

        let urls = discovery.discover("example.com").await;
        assert!(urls.contains(&"https://example.com/ok".to_string()));
        assert!(!urls.contains(&"https://example.com/broken".to_string()));
    }

    #[tokio::test]
    async fn test_discover_records_post_redirect_url() {
        let fetcher = MockFetcher::new().with_page(
            FetchedPage::new("https://example.com", "<html>home</html>")
                .with_final_url("https://www.example.com/"),
        );

        let discovery = UrlDiscovery::new(
            Arc::new(fetcher),
            DiscoveryConfig::new().with_seed_paths(Vec::<String>::new()),
        );

        let urls = discovery.discover("example.com").await;
        assert_eq!(urls, vec!["https://www.example.com/".to_string()]);
    }
}
