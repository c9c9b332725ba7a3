//! Basic HTML collection capability.
//!
//! Always the first tool run against a fresh URL: fetches the page, pulls
//! the cheap structural facts (title, meta tags, JSON-LD organization data,
//! named leadership) and records the characteristics every later decision
//! reads - whether the page leans on JavaScript, whether security headers
//! were present, how much content there is.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

use crate::error::ToolResult;
use crate::tools::{fetch_for_tool, names, Capability, ToolOutput};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::{categories, EvidenceItem};
use crate::types::page::{FetchedPage, PageCharacteristics, PageContext};

const SECURITY_HEADERS: &[&str] = &[
    "strict-transport-security",
    "content-security-policy",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
];

/// The `html-collector` capability.
pub struct HtmlCollector {
    fetcher: Arc<dyn PageFetcher>,
    title_pattern: Regex,
    meta_pattern: Regex,
    jsonld_pattern: Regex,
    name_patterns: Vec<Regex>,
}

impl HtmlCollector {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            title_pattern: Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap(),
            meta_pattern: Regex::new(
                r#"<meta\s+name=["'](description|generator|keywords)["']\s+content=["']([^"']+)["']"#,
            )
            .unwrap(),
            jsonld_pattern: Regex::new(
                r#"(?s)<script[^>]*type=["']application/ld\+json["'][^>]*>(.*?)</script>"#,
            )
            .unwrap(),
            name_patterns: vec![
                Regex::new(
                    r"(?:CEO|CTO|CFO|COO|VP|President|Director|Founder|Co-founder)[,:]?\s+([A-Z][a-z]+\s+[A-Z][a-z]+)",
                )
                .unwrap(),
                Regex::new(
                    r"([A-Z][a-z]+\s+[A-Z][a-z]+),?\s+(?:CEO|CTO|CFO|COO|VP|President|Director|Founder|Co-founder)",
                )
                .unwrap(),
            ],
        }
    }

    fn extract_title(&self, html: &str) -> Option<String> {
        self.title_pattern
            .captures(html)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Leadership names by title adjacency ("CTO Jane Doe", "Jane Doe, CEO").
    fn extract_people(&self, text: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for pattern in &self.name_patterns {
            for cap in pattern.captures_iter(text) {
                if let Some(name) = cap.get(1) {
                    let name = name.as_str().to_string();
                    let lower = name.to_lowercase();
                    // Common false positives
                    if ["company", "software", "platform", "service"]
                        .iter()
                        .any(|w| lower.contains(w))
                    {
                        continue;
                    }
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names.truncate(20);
        names
    }

    /// JSON-LD Organization blocks carry the most reliable self-description.
    fn extract_jsonld_org(&self, html: &str) -> Vec<serde_json::Value> {
        let mut orgs = Vec::new();
        for cap in self.jsonld_pattern.captures_iter(html) {
            if let Some(block) = cap.get(1) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(block.as_str()) {
                    let ty = value.get("@type").and_then(|t| t.as_str()).unwrap_or("");
                    if ty.eq_ignore_ascii_case("organization")
                        || ty.eq_ignore_ascii_case("corporation")
                    {
                        orgs.push(value);
                    }
                }
            }
        }
        orgs
    }

    fn characteristics(&self, page: &FetchedPage, text: &str) -> PageCharacteristics {
        let script_count = page.html.matches("<script").count();
        let spa_markers = ["id=\"root\"", "id=\"__next\"", "id=\"app\"", "data-reactroot", "ng-app"]
            .iter()
            .any(|m| page.html.contains(m));
        // Script-heavy page with little visible text needs rendering
        let has_javascript = spa_markers || (script_count >= 5 && text.len() < 500);

        let security_seen = SECURITY_HEADERS
            .iter()
            .any(|h| page.header(h).is_some());

        let api_indicators = page.html.contains("/api/")
            || text.to_lowercase().contains("api reference")
            || text.to_lowercase().contains("api documentation");

        PageCharacteristics::new()
            .with("has_javascript", has_javascript)
            .with("security_headers_seen", security_seen)
            .with("api_indicators", api_indicators)
            .with("content_length", text.len() as u64)
            .with("script_count", script_count as u64)
            .with("status", page.status as u64)
    }
}

#[async_trait]
impl Capability for HtmlCollector {
    fn name(&self) -> &str {
        names::HTML_COLLECTOR
    }

    async fn run(&self, url: &str, _ctx: &PageContext) -> ToolResult<ToolOutput> {
        let page = fetch_for_tool(self.fetcher.as_ref(), self.name(), url).await?;
        let text = visible_text(&page.html);

        let mut output = ToolOutput::new();
        output.characteristics = self.characteristics(&page, &text);

        let title = self.extract_title(&page.html);

        // Page-level descriptive evidence
        let mut page_info = serde_json::Map::new();
        if let Some(title) = &title {
            page_info.insert("title".into(), json!(title));
        }
        for cap in self.meta_pattern.captures_iter(&page.html) {
            let (name, content) = (cap[1].to_string(), cap[2].to_string());
            page_info.insert(name, json!(content));
        }
        if !page_info.is_empty() {
            page_info.insert("url".into(), json!(page.final_url));
            output.evidence.push(EvidenceItem::new(
                categories::GENERAL,
                serde_json::Value::Object(page_info),
                &page.final_url,
                0.6,
            ));
        }

        for org in self.extract_jsonld_org(&page.html) {
            output.evidence.push(EvidenceItem::new(
                categories::MARKET_POSITION,
                json!({"organization": org}),
                &page.final_url,
                0.85,
            ));
        }

        let people = self.extract_people(&text);
        for name in &people {
            output.evidence.push(EvidenceItem::new(
                categories::TEAM_MEMBER,
                json!({"name": name}),
                &page.final_url,
                0.7,
            ));
        }
        if !people.is_empty() {
            output.evidence.push(EvidenceItem::new(
                categories::TEAM_INFO,
                json!({
                    "page": title.unwrap_or_else(|| page.final_url.clone()),
                    "leadership_named": people,
                }),
                &page.final_url,
                0.75,
            ));
        }

        Ok(output)
    }
}

/// Strip scripts, styles and tags, leaving visible text.
pub(crate) fn visible_text(html: &str) -> String {
    let script_pattern = Regex::new(r"(?s)<script[^>]*>.*?</script>").unwrap();
    let style_pattern = Regex::new(r"(?s)<style[^>]*>.*?</style>").unwrap();
    let tag_pattern = Regex::new(r"<[^>]+>").unwrap();

    let text = script_pattern.replace_all(html, " ");
    let text = style_pattern.replace_all(&text, " ");
    let text = tag_pattern.replace_all(&text, " ");

    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    fn collector_with(html: &str) -> HtmlCollector {
        let fetcher = MockFetcher::new().with_page(FetchedPage::new("https://example.com", html));
        HtmlCollector::new(Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_extracts_title_and_meta() {
        let collector = collector_with(
            r#"<html><head><title>Acme Corp</title>
            <meta name="description" content="Acme builds rockets"></head></html>"#,
        );

        let output = collector
            .run("https://example.com", &PageContext::new("https://example.com"))
            .await
            .unwrap();

        let general = output
            .evidence
            .iter()
            .find(|e| e.category == categories::GENERAL)
            .unwrap();
        assert_eq!(general.value["title"], "Acme Corp");
        assert_eq!(general.value["description"], "Acme builds rockets");
    }

    #[tokio::test]
    async fn test_extracts_leadership_names() {
        let collector = collector_with(
            "<html><body><p>Our CEO Jane Doe and CTO John Smith lead the team.
            Mary Johnson, VP of Engineering joined in 2020.</p></body></html>",
        );

        let output = collector
            .run("https://example.com", &PageContext::new("https://example.com"))
            .await
            .unwrap();

        let members: Vec<_> = output
            .evidence
            .iter()
            .filter(|e| e.category == categories::TEAM_MEMBER)
            .collect();
        assert!(members.len() >= 2);
        assert!(members.iter().any(|m| m.value["name"] == "Jane Doe"));
        assert!(members.iter().any(|m| m.value["name"] == "John Smith"));
    }

    #[tokio::test]
    async fn test_jsonld_organization() {
        let collector = collector_with(
            r#"<script type="application/ld+json">
            {"@type": "Organization", "name": "Acme", "foundingDate": "2015"}
            </script>"#,
        );

        let output = collector
            .run("https://example.com", &PageContext::new("https://example.com"))
            .await
            .unwrap();

        let org = output
            .evidence
            .iter()
            .find(|e| e.category == categories::MARKET_POSITION)
            .unwrap();
        assert_eq!(org.value["organization"]["name"], "Acme");
    }

    #[tokio::test]
    async fn test_spa_marker_sets_has_javascript() {
        let collector = collector_with(r#"<html><body><div id="root"></div></body></html>"#);

        let output = collector
            .run("https://example.com", &PageContext::new("https://example.com"))
            .await
            .unwrap();

        assert!(output.characteristics.has_javascript());
    }

    #[tokio::test]
    async fn test_security_headers_characteristic() {
        let fetcher = MockFetcher::new().with_page(
            FetchedPage::new("https://example.com", "<html>plain</html>")
                .with_header("Strict-Transport-Security", "max-age=31536000"),
        );
        let collector = HtmlCollector::new(Arc::new(fetcher));

        let output = collector
            .run("https://example.com", &PageContext::new("https://example.com"))
            .await
            .unwrap();

        assert!(output.characteristics.security_headers_seen());
    }

    #[test]
    fn test_visible_text_strips_markup() {
        let text = visible_text("<p>Hello <b>world</b></p><script>var x = 1;</script>");
        assert_eq!(text, "Hello world");
    }
}
