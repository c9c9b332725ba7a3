//! Phased, keyword-driven agentic search.
//!
//! Four standing phases walk outward from the company itself to its
//! ecosystem: initial discovery, deep technical, competitive analysis,
//! investor network. Queries within a phase have no inter-dependency and
//! run concurrently; phases stay sequential because a thin phase injects
//! an adaptive follow-up phase aimed at the weakest category.

use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::EvidenceStore;
use crate::traits::searcher::{SearchResult, WebSearcher};
use crate::types::audit::{AuditEntry, AuditLog, CollectionPhase};
use crate::types::config::SearchConfig;
use crate::types::evidence::{categories, EvidenceItem};

/// One named phase of templated queries.
#[derive(Debug, Clone)]
pub struct SearchPhase {
    pub name: String,
    pub queries: Vec<String>,
}

impl SearchPhase {
    pub fn new(name: impl Into<String>, queries: Vec<String>) -> Self {
        Self {
            name: name.into(),
            queries,
        }
    }
}

/// The standing phase list for a company/domain pair.
pub fn default_phases(company: &str, domain: &str) -> Vec<SearchPhase> {
    vec![
        SearchPhase::new(
            "initial-discovery",
            vec![
                format!("\"{}\" company overview", company),
                format!("\"{}\" products services", company),
                format!("site:{} about", domain),
            ],
        ),
        SearchPhase::new(
            "deep-technical",
            vec![
                format!("\"{}\" technology stack architecture", company),
                format!("\"{}\" engineering blog", company),
                format!("site:github.com \"{}\"", company),
                format!("\"{}\" api documentation sdk", domain),
            ],
        ),
        SearchPhase::new(
            "competitive-analysis",
            vec![
                format!("\"{}\" competitors alternatives", company),
                format!("\"{}\" market share industry", company),
                format!("\"{}\" reviews comparison", company),
            ],
        ),
        SearchPhase::new(
            "investor-network",
            vec![
                format!("\"{}\" funding raised series", company),
                format!("\"{}\" investors valuation", company),
                format!("\"{}\" revenue growth", company),
            ],
        ),
    ]
}

/// Queries for an adaptive phase aimed at one thin category.
fn gap_queries(company: &str, category: &str) -> Vec<String> {
    match category {
        categories::TECH_STACK => vec![
            format!("\"{}\" built with technology", company),
            format!("\"{}\" software engineer job requirements", company),
        ],
        categories::TEAM_INFO => vec![
            format!("\"{}\" leadership team executives", company),
            format!("site:linkedin.com \"{}\" CEO founder", company),
        ],
        categories::FINANCIAL_METRIC => vec![
            format!("\"{}\" annual revenue ARR", company),
            format!("\"{}\" funding round crunchbase", company),
        ],
        categories::API_ENDPOINT => vec![
            format!("\"{}\" api reference developer portal", company),
        ],
        categories::SECURITY_POSTURE => vec![
            format!("\"{}\" security compliance soc 2", company),
        ],
        _ => vec![format!("\"{}\" {}", company, category.replace('-', " "))],
    }
}

/// Keyword map for categorizing a search hit.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        categories::API_ENDPOINT,
        &["api", "endpoint", "rest", "graphql", "sdk", "developer"],
    ),
    (
        categories::TECH_STACK,
        &["technology", "stack", "built", "architecture", "engineering", "infrastructure"],
    ),
    (
        categories::TEAM_INFO,
        &["team", "leadership", "founder", "ceo", "cto", "executives", "employees"],
    ),
    (
        categories::FINANCIAL_METRIC,
        &["funding", "revenue", "raised", "series", "valuation", "investors", "arr"],
    ),
    (
        categories::SECURITY_POSTURE,
        &["security", "compliance", "privacy", "encryption", "soc"],
    ),
    (
        categories::MARKET_POSITION,
        &["market", "competitor", "industry", "share", "alternative", "versus"],
    ),
    (
        categories::PRODUCT_FEATURE,
        &["product", "feature", "pricing", "plan", "launch"],
    ),
];

/// Categorize a search hit by keyword frequency across URL, title and
/// snippet; highest score wins, ties to the earlier (more specific) entry.
pub fn categorize_result(result: &SearchResult) -> &'static str {
    let haystack = format!(
        "{} {} {}",
        result.url,
        result.title.as_deref().unwrap_or(""),
        result.snippet.as_deref().unwrap_or("")
    )
    .to_lowercase();

    let mut best = categories::GENERAL;
    let mut best_score = 0usize;
    for (category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords.iter().filter(|k| haystack.contains(*k)).count();
        if score > best_score {
            best = category;
            best_score = score;
        }
    }
    best
}

/// Phased searcher with adaptive phase injection.
pub struct AgenticSearch {
    searcher: Arc<dyn WebSearcher>,
    store: Arc<EvidenceStore>,
    audit: Arc<AuditLog>,
    config: SearchConfig,
}

impl AgenticSearch {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        store: Arc<EvidenceStore>,
        audit: Arc<AuditLog>,
        config: SearchConfig,
    ) -> Self {
        Self {
            searcher,
            store,
            audit,
            config,
        }
    }

    /// Run all phases, injecting adaptive phases while the depth budget
    /// lasts. Returns total evidence gathered.
    pub async fn run(
        &self,
        company: &str,
        domain: &str,
        cancel: &CancellationToken,
    ) -> usize {
        let mut phases: VecDeque<SearchPhase> = default_phases(company, domain).into();
        let mut injected = 0usize;
        let mut targeted: std::collections::HashSet<&'static str> = std::collections::HashSet::new();
        let mut total = 0usize;

        while let Some(phase) = phases.pop_front() {
            if cancel.is_cancelled() {
                break;
            }

            let yielded = self.run_phase(&phase).await;
            total += yielded;

            debug!(phase = %phase.name, yielded = yielded, "Search phase finished");

            // Thin phase: aim a follow-up at the weakest category
            if yielded < self.config.min_phase_yield && injected < self.config.max_depth {
                let category = self.weakest_category(&targeted);
                targeted.insert(category);
                injected += 1;
                let adaptive = SearchPhase::new(
                    format!("adaptive-{}", category),
                    gap_queries(company, category),
                );
                info!(
                    after = %phase.name,
                    adaptive = %adaptive.name,
                    depth = injected,
                    "Injecting adaptive search phase"
                );
                phases.push_back(adaptive);
            }
        }

        info!(evidence = total, "Agentic search completed");
        total
    }

    /// Run one phase's queries concurrently and fold hits into evidence.
    async fn run_phase(&self, phase: &SearchPhase) -> usize {
        let results = join_all(phase.queries.iter().map(|query| {
            let searcher = self.searcher.clone();
            let limit = self.config.results_per_query;
            async move {
                let started = Instant::now();
                let outcome = searcher.search_with_limit(query, limit).await;
                (query.clone(), outcome, started.elapsed().as_millis() as u64)
            }
        }))
        .await;

        let mut yielded = 0;
        for (query, outcome, duration_ms) in results {
            let hits = match outcome {
                Ok(hits) => hits,
                Err(e) => {
                    // A failed query is an empty query
                    tracing::warn!(query = %query, error = %e, "Search query failed");
                    self.audit.record(
                        AuditEntry::new(CollectionPhase::Search, "run-query")
                            .with_input(&query)
                            .with_output(e.to_string())
                            .with_reasoning(format!("phase {}", phase.name))
                            .with_duration_ms(duration_ms),
                    );
                    continue;
                }
            };

            let evidence: Vec<EvidenceItem> = hits.iter().map(|hit| evidence_from(hit, &query)).collect();
            let count = evidence.len();
            yielded += self.store.append(evidence);

            self.audit.record(
                AuditEntry::new(CollectionPhase::Search, "run-query")
                    .with_input(&query)
                    .with_output(format!("{} results", count))
                    .with_reasoning(format!("phase {}", phase.name))
                    .with_evidence_count(count)
                    .with_duration_ms(duration_ms),
            );
        }
        yielded
    }

    /// The tracked high-value category with the least evidence so far,
    /// skipping categories an adaptive phase already targeted.
    fn weakest_category(&self, targeted: &std::collections::HashSet<&'static str>) -> &'static str {
        let counts = self.store.counts_by_category();
        let candidates = [
            categories::TECH_STACK,
            categories::TEAM_INFO,
            categories::FINANCIAL_METRIC,
            categories::API_ENDPOINT,
        ];

        candidates
            .into_iter()
            .filter(|c| !targeted.contains(c))
            .min_by_key(|c| counts.get(*c).copied().unwrap_or(0))
            .or_else(|| {
                candidates
                    .into_iter()
                    .min_by_key(|c| counts.get(*c).copied().unwrap_or(0))
            })
            .unwrap_or(categories::TECH_STACK)
    }
}

fn evidence_from(hit: &SearchResult, query: &str) -> EvidenceItem {
    let category = categorize_result(hit);
    // Provider relevance nudges confidence
    let confidence = 0.5 + hit.score.unwrap_or(0.0).clamp(0.0, 1.0) * 0.2;

    EvidenceItem::new(
        category,
        serde_json::json!({
            "title": hit.title,
            "snippet": hit.snippet,
            "query": query,
        }),
        &hit.url,
        confidence,
    )
}
