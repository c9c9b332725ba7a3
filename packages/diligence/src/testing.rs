//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the engine without
//! making real network calls.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult, ToolError, ToolResult};
use crate::tools::{Capability, ToolOutput};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::{categories, EvidenceItem};
use crate::types::page::{FetchedPage, PageCharacteristics, PageContext};

/// A mock fetcher serving predefined pages without network access.
#[derive(Default)]
pub struct MockFetcher {
    /// Predefined pages by requested URL
    pages: Arc<RwLock<HashMap<String, FetchedPage>>>,

    /// URLs that should fail
    fail_urls: Arc<RwLock<Vec<String>>>,

    /// Requested URLs, in order
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined page, keyed by its request URL.
    pub fn with_page(self, page: FetchedPage) -> Self {
        self.pages.write().unwrap().insert(page.url.clone(), page);
        self
    }

    /// Add multiple predefined pages.
    pub fn with_pages(self, pages: impl IntoIterator<Item = FetchedPage>) -> Self {
        {
            let mut store = self.pages.write().unwrap();
            for page in pages {
                store.insert(page.url.clone(), page);
            }
        }
        self
    }

    /// Mark a URL as failing.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().push(url.into());
        self
    }

    /// All URLs requested from this mock.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        if self.fail_urls.read().unwrap().iter().any(|u| u == url) {
            return Err(FetchError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Mock connection refused",
            ))));
        }

        // Fall back to the normalized form so "https://x.com" and
        // "https://x.com/" resolve to the same fixture
        let pages = self.pages.read().unwrap();
        pages
            .get(url)
            .or_else(|| pages.get(url.trim_end_matches('/')))
            .or_else(|| pages.get(&format!("{}/", url)))
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

/// A capability returning scripted outputs, for exercising the decision
/// loop without real extraction.
pub struct ScriptedCapability {
    name: String,
    evidence_per_run: usize,
    category: String,
    characteristics: PageCharacteristics,
    fail: bool,
    calls: Arc<RwLock<Vec<String>>>,
}

impl ScriptedCapability {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evidence_per_run: 0,
            category: categories::GENERAL.to_string(),
            characteristics: PageCharacteristics::new(),
            fail: false,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Produce this many evidence items per run.
    pub fn yielding(mut self, count: usize) -> Self {
        self.evidence_per_run = count;
        self
    }

    /// Tag produced evidence with this category.
    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Report these characteristics on every run.
    pub fn with_characteristics(mut self, characteristics: PageCharacteristics) -> Self {
        self.characteristics = characteristics;
        self
    }

    /// Fail every run.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// URLs this capability ran against.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Shared call-log handle, usable after the capability moves into an
    /// executor.
    pub fn call_log(&self) -> Arc<RwLock<Vec<String>>> {
        self.calls.clone()
    }
}

#[async_trait]
impl Capability for ScriptedCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, url: &str, _ctx: &PageContext) -> ToolResult<ToolOutput> {
        self.calls.write().unwrap().push(url.to_string());

        if self.fail {
            return Err(ToolError::Execution {
                tool: self.name.clone(),
                source: Box::new(std::io::Error::other("scripted failure")),
            });
        }

        let mut output = ToolOutput::new();
        output.characteristics = self.characteristics.clone();
        for i in 0..self.evidence_per_run {
            output.evidence.push(EvidenceItem::new(
                &self.category,
                json!({"fact": format!("{}-{}-{}", self.name, url, i)}),
                url,
                0.8,
            ));
        }
        Ok(output)
    }
}

/// Build a MockFetcher for a site from `(path, html)` pairs.
pub fn site(domain: &str, pages: &[(&str, &str)]) -> MockFetcher {
    let mut fetcher = MockFetcher::new();
    for (path, html) in pages {
        let url = format!("https://{}{}", domain, path);
        fetcher = fetcher.with_page(FetchedPage::new(url, *html));
    }
    fetcher
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_serves_and_fails() {
        let fetcher = MockFetcher::new()
            .with_page(FetchedPage::new("https://example.com/a", "A"))
            .fail_url("https://example.com/b");

        assert!(fetcher.fetch("https://example.com/a").await.is_ok());
        assert!(fetcher.fetch("https://example.com/b").await.is_err());
        // Unknown URLs look like 404s
        assert!(matches!(
            fetcher.fetch("https://example.com/c").await,
            Err(FetchError::Status { status: 404, .. })
        ));
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_trailing_slash_fallback() {
        let fetcher = MockFetcher::new().with_page(FetchedPage::new("https://example.com", "home"));
        assert!(fetcher.fetch("https://example.com/").await.is_ok());
    }

    #[tokio::test]
    async fn test_scripted_capability() {
        let capability = ScriptedCapability::new("probe")
            .yielding(2)
            .in_category(categories::TECH_STACK);

        let output = capability
            .run("https://example.com", &PageContext::new("https://example.com"))
            .await
            .unwrap();

        assert_eq!(output.evidence.len(), 2);
        assert!(output.evidence.iter().all(|e| e.category == categories::TECH_STACK));
        assert_eq!(capability.calls(), vec!["https://example.com"]);
    }

    #[test]
    fn test_site_builder() {
        let fetcher = site("acme.dev", &[("/", "home"), ("/about", "about")]);
        assert_eq!(fetcher.pages.read().unwrap().len(), 2);
    }
}
