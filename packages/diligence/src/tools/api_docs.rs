//! API-surface extraction capability.
//!
//! Run against documentation-looking pages: collects endpoint paths,
//! call-site literals in inline scripts, API specification links and
//! auth-scheme mentions.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

use crate::error::ToolResult;
use crate::tools::html::visible_text;
use crate::tools::{fetch_for_tool, names, Capability, ToolOutput};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::{categories, EvidenceItem};
use crate::types::page::{PageCharacteristics, PageContext};

/// The `api-extraction` capability.
pub struct ApiExtraction {
    fetcher: Arc<dyn PageFetcher>,
    endpoint_patterns: Vec<Regex>,
    spec_pattern: Regex,
}

impl ApiExtraction {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            endpoint_patterns: vec![
                // Call sites in inline scripts
                Regex::new(r#"(?:fetch|axios|request)\s*\(\s*["']([^"']*api[^"']*)["']"#).unwrap(),
                // Documented REST paths
                Regex::new(r#"(?:GET|POST|PUT|PATCH|DELETE)\s+(/[a-zA-Z0-9/_{}.:\-]+)"#).unwrap(),
                // Absolute API URLs
                Regex::new(r#"https?://[^\s"'<>]+/api/[^\s"'<>]+"#).unwrap(),
                // Versioned paths
                Regex::new(r#"(/api/v\d+[a-zA-Z0-9/_{}.\-]*)"#).unwrap(),
            ],
            spec_pattern: Regex::new(r#"(?i)(openapi|swagger)[^"'\s]*\.(?:json|ya?ml)"#).unwrap(),
        }
    }

    fn extract_endpoints(&self, html: &str) -> Vec<String> {
        let mut endpoints: Vec<String> = Vec::new();
        for pattern in &self.endpoint_patterns {
            for cap in pattern.captures_iter(html) {
                let endpoint = match cap.get(1) {
                    Some(m) => m.as_str().to_string(),
                    // The absolute-URL pattern has no capture group
                    None => cap[0].to_string(),
                };
                if !endpoints.contains(&endpoint) {
                    endpoints.push(endpoint);
                }
            }
        }
        endpoints.truncate(20);
        endpoints
    }

    fn auth_schemes(text: &str) -> Vec<&'static str> {
        let lower = text.to_lowercase();
        [
            ("oauth", "oauth2"),
            ("api key", "api-key"),
            ("bearer token", "bearer"),
            ("jwt", "jwt"),
            ("basic auth", "basic"),
        ]
        .iter()
        .filter(|(phrase, _)| lower.contains(phrase))
        .map(|(_, scheme)| *scheme)
        .collect()
    }
}

#[async_trait]
impl Capability for ApiExtraction {
    fn name(&self) -> &str {
        names::API_EXTRACTION
    }

    async fn run(&self, url: &str, _ctx: &PageContext) -> ToolResult<ToolOutput> {
        let page = fetch_for_tool(self.fetcher.as_ref(), self.name(), url).await?;
        let text = visible_text(&page.html);
        let mut output = ToolOutput::new();

        for endpoint in self.extract_endpoints(&page.html) {
            output.evidence.push(EvidenceItem::new(
                categories::API_ENDPOINT,
                json!({"endpoint": endpoint}),
                &page.final_url,
                0.75,
            ));
        }

        if let Some(m) = self.spec_pattern.find(&page.html) {
            output.evidence.push(EvidenceItem::new(
                categories::API_ENDPOINT,
                json!({"specification": m.as_str().to_lowercase()}),
                &page.final_url,
                0.9,
            ));
        }

        let lower = text.to_lowercase();
        if lower.contains("graphql") {
            output.evidence.push(EvidenceItem::new(
                categories::TECH_STACK,
                json!({"technology": "graphql", "detected_via": "api documentation"}),
                &page.final_url,
                0.8,
            ));
        }

        for scheme in Self::auth_schemes(&text) {
            output.evidence.push(EvidenceItem::new(
                categories::API_ENDPOINT,
                json!({"auth_scheme": scheme}),
                &page.final_url,
                0.7,
            ));
        }

        output.characteristics = PageCharacteristics::new()
            .with("api_indicators", !output.evidence.is_empty())
            .with("api_endpoints_found", output.evidence.len() as u64);

        Ok(output)
    }
}
