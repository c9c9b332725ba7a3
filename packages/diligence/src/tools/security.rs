//! Security-posture capability.
//!
//! Reads what the response actually says about the target's security
//! hygiene: the standard hardening headers, transport security, cookie
//! flags and compliance claims in the page copy. Produces one posture
//! summary plus individual compliance facts.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::error::ToolResult;
use crate::tools::html::visible_text;
use crate::tools::{fetch_for_tool, names, Capability, ToolOutput};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::{categories, EvidenceItem};
use crate::types::page::{FetchedPage, PageCharacteristics, PageContext};

const HARDENING_HEADERS: &[&str] = &[
    "strict-transport-security",
    "content-security-policy",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
    "permissions-policy",
];

/// Compliance regimes and the phrases that claim them.
const COMPLIANCE_CLAIMS: &[(&str, &[&str])] = &[
    ("soc2", &["soc 2", "soc2", "soc ii"]),
    ("iso27001", &["iso 27001", "iso27001", "iso/iec 27001"]),
    ("gdpr", &["gdpr"]),
    ("hipaa", &["hipaa"]),
    ("pci-dss", &["pci dss", "pci-dss", "payment card industry"]),
    ("privacy-policy", &["privacy policy"]),
    ("data-processing-agreement", &["data processing agreement"]),
];

/// The `security-scan` capability.
pub struct SecurityScan {
    fetcher: Arc<dyn PageFetcher>,
}

impl SecurityScan {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    fn header_report(page: &FetchedPage) -> (serde_json::Value, usize) {
        let mut report = serde_json::Map::new();
        let mut present = 0;
        for header in HARDENING_HEADERS {
            match page.header(header) {
                Some(value) => {
                    present += 1;
                    report.insert(header.to_string(), json!({"present": true, "value": value}));
                }
                None => {
                    report.insert(header.to_string(), json!({"present": false}));
                }
            }
        }
        (serde_json::Value::Object(report), present)
    }

    fn compliance_claims(text: &str) -> Vec<&'static str> {
        let lower = text.to_lowercase();
        COMPLIANCE_CLAIMS
            .iter()
            .filter(|(_, phrases)| phrases.iter().any(|p| lower.contains(p)))
            .map(|(claim, _)| *claim)
            .collect()
    }

    /// Weighted posture score: 40% headers, 20% transport, 40% compliance.
    fn posture_score(headers_present: usize, https: bool, claims: usize) -> f32 {
        let header_score = 0.4 * (headers_present as f32 / HARDENING_HEADERS.len() as f32);
        let tls_score = if https { 0.2 } else { 0.0 };
        let compliance_score = 0.4 * ((claims as f32 / 4.0).min(1.0));
        header_score + tls_score + compliance_score
    }
}

#[async_trait]
impl Capability for SecurityScan {
    fn name(&self) -> &str {
        names::SECURITY_SCAN
    }

    async fn run(&self, url: &str, _ctx: &PageContext) -> ToolResult<ToolOutput> {
        let page = fetch_for_tool(self.fetcher.as_ref(), self.name(), url).await?;
        let text = visible_text(&page.html);
        let mut output = ToolOutput::new();

        let (header_report, headers_present) = Self::header_report(&page);
        let https = page.final_url.starts_with("https://");
        let claims = Self::compliance_claims(&text);
        let score = Self::posture_score(headers_present, https, claims.len());

        let secure_cookies = page
            .header("set-cookie")
            .map(|c| {
                let c = c.to_lowercase();
                c.contains("secure") && c.contains("httponly")
            })
            .unwrap_or(false);

        output.evidence.push(EvidenceItem::new(
            categories::SECURITY_POSTURE,
            json!({
                "security_headers": header_report,
                "https": https,
                "secure_cookies": secure_cookies,
                "posture_score": score,
            }),
            &page.final_url,
            0.85,
        ));

        for claim in &claims {
            output.evidence.push(EvidenceItem::new(
                categories::COMPLIANCE,
                json!({"claim": claim}),
                &page.final_url,
                0.7,
            ));
        }

        output.characteristics = PageCharacteristics::new()
            .with("security_headers_seen", headers_present > 0)
            .with("security_scanned", true);

        Ok(output)
    }
}
