//! Rendered-content capability.
//!
//! Script-heavy pages ship their real content as embedded application state
//! rather than markup. This capability reads that state statically -
//! `__NEXT_DATA__` payloads, `window.__INITIAL_STATE__` assignments,
//! JSON-LD blocks and bundle names - instead of driving a browser.

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;

use crate::error::ToolResult;
use crate::tools::{fetch_for_tool, names, Capability, ToolOutput};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::{categories, EvidenceItem};
use crate::types::page::{PageCharacteristics, PageContext};

/// The `rendered-content` capability.
pub struct RenderedContent {
    fetcher: Arc<dyn PageFetcher>,
    next_data_pattern: Regex,
    state_pattern: Regex,
    bundle_pattern: Regex,
}

impl RenderedContent {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            next_data_pattern: Regex::new(
                r#"(?s)<script[^>]*id=["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#,
            )
            .unwrap(),
            state_pattern: Regex::new(
                r"(?s)window\.__(?:INITIAL_STATE|PRELOADED_STATE|APP_STATE)__\s*=\s*(\{.*?\})\s*[;<]",
            )
            .unwrap(),
            bundle_pattern: Regex::new(r#"src=["']([^"']*/([a-zA-Z0-9_.-]+)\.[a-f0-9]{8,}\.js)["']"#)
                .unwrap(),
        }
    }

    /// Pull interesting scalar fields out of an app-state payload without
    /// assuming its schema.
    fn summarize_state(state: &serde_json::Value) -> serde_json::Value {
        fn walk(value: &serde_json::Value, path: &str, found: &mut serde_json::Map<String, serde_json::Value>) {
            const INTERESTING: &[&str] = &[
                "name", "title", "description", "company", "product", "plan", "price",
                "version", "features",
            ];
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let next = if path.is_empty() {
                            k.clone()
                        } else {
                            format!("{}.{}", path, k)
                        };
                        if INTERESTING.contains(&k.as_str()) && !v.is_object() && !v.is_array() {
                            found.insert(next.clone(), v.clone());
                        }
                        if found.len() < 25 {
                            walk(v, &next, found);
                        }
                    }
                }
                serde_json::Value::Array(arr) => {
                    for v in arr.iter().take(5) {
                        walk(v, path, found);
                    }
                }
                _ => {}
            }
        }

        let mut found = serde_json::Map::new();
        walk(state, "", &mut found);
        serde_json::Value::Object(found)
    }
}

#[async_trait]
impl Capability for RenderedContent {
    fn name(&self) -> &str {
        names::RENDERED_CONTENT
    }

    async fn run(&self, url: &str, _ctx: &PageContext) -> ToolResult<ToolOutput> {
        let page = fetch_for_tool(self.fetcher.as_ref(), self.name(), url).await?;
        let mut output = ToolOutput::new();

        let mut state_found = false;

        if let Some(cap) = self.next_data_pattern.captures(&page.html) {
            if let Ok(state) = serde_json::from_str::<serde_json::Value>(&cap[1]) {
                state_found = true;
                output.evidence.push(EvidenceItem::new(
                    categories::PRODUCT_FEATURE,
                    json!({
                        "framework": "next.js",
                        "app_state": Self::summarize_state(&state),
                    }),
                    &page.final_url,
                    0.8,
                ));
                output.evidence.push(EvidenceItem::new(
                    categories::TECH_STACK,
                    json!({"technology": "next.js", "detected_via": "embedded app state"}),
                    &page.final_url,
                    0.9,
                ));
            }
        }

        if let Some(cap) = self.state_pattern.captures(&page.html) {
            if let Ok(state) = serde_json::from_str::<serde_json::Value>(&cap[1]) {
                state_found = true;
                output.evidence.push(EvidenceItem::new(
                    categories::PRODUCT_FEATURE,
                    json!({
                        "source": "window state",
                        "app_state": Self::summarize_state(&state),
                    }),
                    &page.final_url,
                    0.7,
                ));
            }
        }

        // Hashed bundle names reveal the build pipeline even when state
        // is absent
        let mut bundles: Vec<String> = Vec::new();
        for cap in self.bundle_pattern.captures_iter(&page.html) {
            let stem = cap[2].to_string();
            if !bundles.contains(&stem) {
                bundles.push(stem);
            }
        }
        if !bundles.is_empty() {
            bundles.truncate(10);
            output.evidence.push(EvidenceItem::new(
                categories::TECH_STACK,
                json!({"bundles": bundles, "detected_via": "hashed asset names"}),
                &page.final_url,
                0.6,
            ));
        }

        output.characteristics = PageCharacteristics::new()
            .with("rendered_state_found", state_found)
            .with("has_javascript", page.html.matches("<script").count() >= 3);

        Ok(output)
    }
}
