//! Technology-stack fingerprinting capability.
//!
//! Combines four independent signal sources: response headers, CDN header
//! fingerprints, third-party script domains, and technology mentions in the
//! page text. Header-derived facts carry higher confidence than prose
//! mentions.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

use crate::error::ToolResult;
use crate::tools::html::visible_text;
use crate::tools::{fetch_for_tool, names, Capability, ToolOutput};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::{categories, EvidenceItem};
use crate::types::page::{FetchedPage, PageCharacteristics, PageContext};

/// CDN products and the response headers that betray them.
const CDN_FINGERPRINTS: &[(&str, &[&str])] = &[
    ("cloudflare", &["cf-ray", "cf-cache-status"]),
    ("cloudfront", &["x-amz-cf-id", "x-amz-cf-pop"]),
    ("akamai", &["x-akamai-transformed"]),
    ("fastly", &["x-served-by", "x-cache-hits"]),
    ("azure-cdn", &["x-ms-request-id"]),
];

/// Third-party service domains worth reporting.
const THIRD_PARTY_SERVICES: &[(&str, &str)] = &[
    ("google-analytics.com", "Google Analytics"),
    ("googletagmanager.com", "Google Tag Manager"),
    ("segment.com", "Segment"),
    ("intercom.io", "Intercom"),
    ("stripe.com", "Stripe"),
    ("sentry.io", "Sentry"),
    ("datadoghq.com", "Datadog"),
    ("amplitude.com", "Amplitude"),
    ("mixpanel.com", "Mixpanel"),
    ("hotjar.com", "Hotjar"),
];

/// Technologies commonly named in engineering pages and job postings.
const TECH_KEYWORDS: &[&str] = &[
    "python", "java", "javascript", "typescript", "golang", "rust", "ruby", "scala", "kotlin",
    "react", "angular", "vue", "svelte", "node.js", "django", "rails", "laravel", "spring",
    "aws", "azure", "gcp", "kubernetes", "docker", "terraform", "ansible",
    "postgresql", "mysql", "mongodb", "redis", "elasticsearch", "kafka", "rabbitmq",
    "graphql", "grpc", "snowflake", "spark", "airflow",
];

/// The `tech-stack-analysis` capability.
pub struct TechStackAnalysis {
    fetcher: Arc<dyn PageFetcher>,
    phrase_patterns: Vec<Regex>,
    generator_pattern: Regex,
    script_src_pattern: Regex,
}

impl TechStackAnalysis {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            // "built with X", "powered by Y", "written in Z"
            phrase_patterns: vec![
                Regex::new(r"built (?:with|on|using) ([a-zA-Z0-9.\-]{3,20})").unwrap(),
                Regex::new(r"powered by ([a-zA-Z0-9.\-]{3,20})").unwrap(),
                Regex::new(r"written in ([a-zA-Z0-9.\-]{3,20})").unwrap(),
                Regex::new(r"deployed (?:on|to) ([a-zA-Z0-9.\-]{3,20})").unwrap(),
                Regex::new(r"hosted on ([a-zA-Z0-9.\-]{3,20})").unwrap(),
            ],
            generator_pattern: Regex::new(
                r#"<meta\s+name=["']generator["']\s+content=["']([^"']+)["']"#,
            )
            .unwrap(),
            script_src_pattern: Regex::new(r#"<script[^>]*src=["']([^"']+)["']"#).unwrap(),
        }
    }

    fn detect_from_headers(&self, page: &FetchedPage) -> Vec<(String, &'static str)> {
        let mut found = Vec::new();

        if let Some(server) = page.header("server") {
            let server = server.to_lowercase();
            for known in ["nginx", "apache", "cloudflare", "caddy", "iis"] {
                if server.contains(known) {
                    found.push((known.to_string(), "server header"));
                }
            }
        }

        if let Some(powered) = page.header("x-powered-by") {
            let powered = powered.to_lowercase();
            if powered.contains("php") {
                found.push(("php".to_string(), "x-powered-by header"));
            }
            if powered.contains("express") {
                found.push(("node.js".to_string(), "x-powered-by header"));
                found.push(("express".to_string(), "x-powered-by header"));
            }
            if powered.contains("asp.net") {
                found.push((".net".to_string(), "x-powered-by header"));
            }
        }

        if page.header("x-aspnet-version").is_some() {
            found.push((".net".to_string(), "x-aspnet-version header"));
        }

        found
    }

    fn detect_cdn(&self, page: &FetchedPage) -> Option<&'static str> {
        CDN_FINGERPRINTS
            .iter()
            .find(|(_, headers)| headers.iter().any(|h| page.header(h).is_some()))
            .map(|(cdn, _)| *cdn)
    }

    fn detect_third_party(&self, html: &str) -> Vec<&'static str> {
        let mut services = Vec::new();
        for cap in self.script_src_pattern.captures_iter(html) {
            let src = &cap[1];
            for (domain, service) in THIRD_PARTY_SERVICES {
                if src.contains(domain) && !services.contains(service) {
                    services.push(*service);
                }
            }
        }
        services
    }

    fn detect_mentions(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let mut found: Vec<String> = Vec::new();

        for keyword in TECH_KEYWORDS {
            // Word-bounded match to keep "java" out of "javascript" pages
            let bounded = format!(r"(^|[^a-z0-9]){}($|[^a-z0-9])", regex::escape(keyword));
            if Regex::new(&bounded).unwrap().is_match(&lower) {
                found.push(keyword.to_string());
            }
        }

        for pattern in &self.phrase_patterns {
            for cap in pattern.captures_iter(&lower) {
                let tech = cap[1].trim_matches('.').to_string();
                if tech.len() > 2
                    && !["the", "and", "our", "your", "this", "that"].contains(&tech.as_str())
                    && !found.contains(&tech)
                {
                    found.push(tech);
                }
            }
        }

        found.truncate(20);
        found
    }
}

#[async_trait]
impl Capability for TechStackAnalysis {
    fn name(&self) -> &str {
        names::TECH_STACK
    }

    async fn run(&self, url: &str, _ctx: &PageContext) -> ToolResult<ToolOutput> {
        let page = fetch_for_tool(self.fetcher.as_ref(), self.name(), url).await?;
        let text = visible_text(&page.html);
        let mut output = ToolOutput::new();

        for (technology, via) in self.detect_from_headers(&page) {
            output.evidence.push(EvidenceItem::new(
                categories::TECH_STACK,
                json!({"technology": technology, "detected_via": via}),
                &page.final_url,
                0.9,
            ));
        }

        if let Some(cap) = self.generator_pattern.captures(&page.html) {
            output.evidence.push(EvidenceItem::new(
                categories::TECH_STACK,
                json!({"technology": cap[1].to_lowercase(), "detected_via": "meta generator"}),
                &page.final_url,
                0.9,
            ));
        }

        if let Some(cdn) = self.detect_cdn(&page) {
            output.evidence.push(EvidenceItem::new(
                categories::INFRASTRUCTURE,
                json!({"service": cdn, "kind": "cdn"}),
                &page.final_url,
                0.9,
            ));
        }

        for service in self.detect_third_party(&page.html) {
            output.evidence.push(EvidenceItem::new(
                categories::INFRASTRUCTURE,
                json!({"service": service, "kind": "third-party"}),
                &page.final_url,
                0.8,
            ));
        }

        for technology in self.detect_mentions(&text) {
            output.evidence.push(EvidenceItem::new(
                categories::TECH_STACK,
                json!({"technology": technology, "detected_via": "page content"}),
                &page.final_url,
                0.6,
            ));
        }

        output.characteristics =
            PageCharacteristics::new().with("tech_signals", output.evidence.len() as u64);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    async fn run_page(page: FetchedPage) -> ToolOutput {
        let url = page.url.clone();
        let fetcher = MockFetcher::new().with_page(page);
        TechStackAnalysis::new(Arc::new(fetcher))
            .run(&url, &PageContext::new(&url))
            .await
            .unwrap()
    }

    fn tech_names(output: &ToolOutput) -> Vec<String> {
        output
            .evidence
            .iter()
            .filter(|e| e.category == categories::TECH_STACK)
            .filter_map(|e| e.value["technology"].as_str().map(String::from))
            .collect()
    }

    #[tokio::test]
    async fn test_header_detection() {
        let output = run_page(
            FetchedPage::new("https://example.com", "<html></html>")
                .with_header("Server", "nginx/1.25")
                .with_header("X-Powered-By", "Express"),
        )
        .await;

        let names = tech_names(&output);
        assert!(names.contains(&"nginx".to_string()));
        assert!(names.contains(&"node.js".to_string()));
        // Header facts carry high confidence
        assert!(output
            .evidence
            .iter()
            .filter(|e| e.category == categories::TECH_STACK)
            .all(|e| e.confidence >= 0.9));
    }

    #[tokio::test]
    async fn test_cdn_fingerprint() {
        let output = run_page(
            FetchedPage::new("https://example.com", "<html></html>")
                .with_header("CF-Ray", "8f2d1-ORD"),
        )
        .await;

        assert!(output
            .evidence
            .iter()
            .any(|e| e.category == categories::INFRASTRUCTURE && e.value["service"] == "cloudflare"));
    }

    #[tokio::test]
    async fn test_third_party_scripts() {
        let output = run_page(FetchedPage::new(
            "https://example.com",
            r#"<script src="https://js.stripe.com/v3/"></script>
               <script src="https://cdn.segment.com/analytics.js"></script>"#,
        ))
        .await;

        let services: Vec<_> = output
            .evidence
            .iter()
            .filter(|e| e.category == categories::INFRASTRUCTURE)
            .map(|e| e.value["service"].clone())
            .collect();
        assert!(services.contains(&json!("Stripe")));
        assert!(services.contains(&json!("Segment")));
    }

    #[tokio::test]
    async fn test_content_mentions_word_bounded() {
        let output = run_page(FetchedPage::new(
            "https://example.com/engineering",
            "<p>Our stack: Rust services on Kubernetes, PostgreSQL, React and JavaScript. Built with Terraform.</p>",
        ))
        .await;

        let names = tech_names(&output);
        assert!(names.contains(&"rust".to_string()));
        assert!(names.contains(&"kubernetes".to_string()));
        assert!(names.contains(&"postgresql".to_string()));
        assert!(names.contains(&"javascript".to_string()));
        // "java" must not fire on a page that only says "javascript"
        assert!(!names.contains(&"java".to_string()));
    }
}
