//! Targeted collection: category-specific gap remediation.
//!
//! The second pass of a run. Each gap dispatches the remediation that
//! historically closes it - canonical-path probes with the matching
//! capability for on-site categories, focused search queries for
//! off-site categories - and stops early once its deficit is met.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::search::categorize_result;
use crate::store::EvidenceStore;
use crate::tools::{names, ToolExecutor};
use crate::traits::searcher::WebSearcher;
use crate::types::audit::{AuditEntry, AuditLog, CollectionPhase};
use crate::types::evidence::{categories, EvidenceItem};
use crate::types::gap::Gap;
use crate::types::page::PageContext;

/// What remediation a gap category maps to.
enum Remediation {
    /// Probe these site paths with one capability
    Probe {
        paths: &'static [&'static str],
        tool: &'static str,
    },
    /// Issue these query templates ({company} substituted)
    Query(&'static [&'static str]),
}

fn remediation_for(category: &str) -> Remediation {
    match category {
        categories::TECH_STACK | categories::INFRASTRUCTURE => Remediation::Probe {
            paths: &["/technology", "/engineering", "/stack", "/about", "/blog"],
            tool: names::TECH_STACK,
        },
        categories::API_ENDPOINT => Remediation::Probe {
            paths: &["/api", "/docs", "/developers"],
            tool: names::API_EXTRACTION,
        },
        categories::SECURITY_POSTURE | categories::COMPLIANCE => Remediation::Probe {
            paths: &["/security", "/trust", "/privacy"],
            tool: names::SECURITY_SCAN,
        },
        categories::TEAM_INFO | categories::TEAM_MEMBER => Remediation::Query(&[
            "\"{company}\" leadership team executives",
            "site:linkedin.com \"{company}\" CEO founder CTO",
        ]),
        categories::FINANCIAL_METRIC => Remediation::Query(&[
            "\"{company}\" funding raised series valuation",
            "\"{company}\" annual revenue growth",
        ]),
        categories::MARKET_POSITION => Remediation::Query(&[
            "\"{company}\" competitors market share",
        ]),
        _ => Remediation::Query(&["\"{company}\" {category}"]),
    }
}

/// Dispatches gap remediation through the executor and searcher.
pub struct TargetedCollection {
    executor: Arc<ToolExecutor>,
    searcher: Arc<dyn WebSearcher>,
    store: Arc<EvidenceStore>,
    audit: Arc<AuditLog>,
}

impl TargetedCollection {
    pub fn new(
        executor: Arc<ToolExecutor>,
        searcher: Arc<dyn WebSearcher>,
        store: Arc<EvidenceStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            executor,
            searcher,
            store,
            audit,
        }
    }

    /// Work through gaps in priority order (the list arrives sorted).
    ///
    /// Returns total evidence gathered by the pass.
    pub async fn remediate(
        &self,
        domain: &str,
        company: &str,
        gaps: &[Gap],
        cancel: &CancellationToken,
    ) -> usize {
        let mut total = 0;

        for gap in gaps {
            if cancel.is_cancelled() {
                break;
            }
            if gap.deficit == 0 {
                continue;
            }

            info!(
                category = %gap.category,
                deficit = gap.deficit,
                priority = ?gap.priority,
                "Remediating gap"
            );

            let gathered = match remediation_for(&gap.category) {
                Remediation::Probe { paths, tool } => {
                    self.probe_paths(domain, paths, tool, gap, cancel).await
                }
                Remediation::Query(templates) => {
                    self.run_queries(company, templates, gap, cancel).await
                }
            };

            debug!(category = %gap.category, gathered = gathered, "Gap remediation finished");
            total += gathered;
        }

        total
    }

    async fn probe_paths(
        &self,
        domain: &str,
        paths: &[&str],
        tool: &str,
        gap: &Gap,
        cancel: &CancellationToken,
    ) -> usize {
        let mut gathered = 0;

        for path in paths {
            if cancel.is_cancelled() || gathered >= gap.deficit {
                break;
            }

            let url = format!("https://{}{}", domain, path);
            let ctx = PageContext::new(&url);
            let execution = self.executor.execute(tool, &url, &ctx).await;

            let count = execution.evidence.len();
            gathered += self.store.append(execution.evidence);

            self.audit.record(
                AuditEntry::new(CollectionPhase::TargetedCollection, "probe-path")
                    .with_tool(tool)
                    .with_input(&url)
                    .with_output(format!("{} evidence items", count))
                    .with_reasoning(format!(
                        "closing {} gap (deficit {})",
                        gap.category, gap.deficit
                    ))
                    .with_evidence_count(count)
                    .with_duration_ms(execution.duration_ms),
            );
        }

        gathered
    }

    async fn run_queries(
        &self,
        company: &str,
        templates: &[&str],
        gap: &Gap,
        cancel: &CancellationToken,
    ) -> usize {
        let mut gathered = 0;

        for template in templates {
            if cancel.is_cancelled() || gathered >= gap.deficit {
                break;
            }

            let query = template
                .replace("{company}", company)
                .replace("{category}", &gap.category.replace('-', " "));

            let hits = match self.searcher.search(&query).await {
                Ok(hits) => hits,
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "Targeted query failed");
                    continue;
                }
            };

            let evidence: Vec<EvidenceItem> = hits
                .iter()
                .map(|hit| {
                    // Bias hits toward the gap we are trying to close: a
                    // generic categorization still counts for the pass
                    let category = match categorize_result(hit) {
                        categories::GENERAL => gap.category.clone(),
                        other => other.to_string(),
                    };
                    EvidenceItem::new(
                        category,
                        serde_json::json!({
                            "title": hit.title,
                            "snippet": hit.snippet,
                            "query": query,
                        }),
                        &hit.url,
                        0.55,
                    )
                })
                .collect();

            let count = evidence.len();
            gathered += self.store.append(evidence);

            self.audit.record(
                AuditEntry::new(CollectionPhase::TargetedCollection, "run-query")
                    .with_input(&query)
                    .with_output(format!("{} results", count))
                    .with_reasoning(format!(
                        "closing {} gap (deficit {})",
                        gap.category, gap.deficit
                    ))
                    .with_evidence_count(count),
            );
        }

        gathered
    }
}
