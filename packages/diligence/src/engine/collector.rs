//! Top-level collector: sequences discovery, crawling, search, gap
//! analysis and targeted collection into one best-effort run.
//!
//! The collector never discards work. Downstream failures degrade at
//! their own boundaries; cancellation mid-run skips the remaining stages
//! and still returns whatever was gathered, with coverage figures that say
//! what is authoritative and what is absent. The only hard error is a
//! malformed request.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::discovery::UrlDiscovery;
use crate::engine::crawler::IntelligentCrawler;
use crate::engine::decision::DecisionEngine;
use crate::engine::gaps::EvidenceMonitor;
use crate::engine::process;
use crate::engine::search::AgenticSearch;
use crate::engine::targeted::TargetedCollection;
use crate::error::{CollectError, Result};
use crate::store::EvidenceStore;
use crate::tools::ToolExecutor;
use crate::traits::fetcher::PageFetcher;
use crate::traits::searcher::WebSearcher;
use crate::types::audit::{AuditEntry, AuditLog, CollectionPhase, Quality};
use crate::types::config::{CategoryTargets, CollectionRequest, CollectorConfig};
use crate::types::evidence::{categories, EvidenceItem};

/// Coverage summary for a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub total_actions: usize,
    pub evidence_by_phase: HashMap<String, usize>,
    pub evidence_by_tool: HashMap<String, usize>,
    pub coverage_percentage: f32,
    pub missing_categories: Vec<String>,
    pub overall_quality: Quality,
}

/// Everything a collection run produced.
#[derive(Debug)]
pub struct CollectionResult {
    pub evidence: Vec<EvidenceItem>,
    pub audit_trail: Vec<crate::types::audit::AuditEntry>,
    pub summary: CollectionSummary,
}

/// The evidence-collection engine's front door.
pub struct Collector {
    fetcher: Arc<dyn PageFetcher>,
    searcher: Arc<dyn WebSearcher>,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(fetcher: Arc<dyn PageFetcher>, searcher: Arc<dyn WebSearcher>) -> Self {
        Self {
            fetcher,
            searcher,
            config: CollectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CollectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run a full collection without external cancellation.
    pub async fn collect(&self, request: &CollectionRequest) -> Result<CollectionResult> {
        self.collect_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Run a full collection, honoring the token between and inside stages.
    ///
    /// Cancellation is cooperative: the run stops starting new work,
    /// processes what it has, and returns a partial result.
    pub async fn collect_with_cancellation(
        &self,
        request: &CollectionRequest,
        cancel: &CancellationToken,
    ) -> Result<CollectionResult> {
        validate(request)?;

        let config = self.config.clone().scaled_for(request.depth);
        let targets = thesis_targets(
            config.targets.clone(),
            request.investment_thesis_tag.as_deref(),
        );

        info!(
            domain = %request.domain,
            company = %request.company_name,
            depth = ?request.depth,
            "Collection starting"
        );

        let store = Arc::new(EvidenceStore::with_limit(config.evidence_limit));
        let audit = Arc::new(AuditLog::new());
        let executor = Arc::new(ToolExecutor::standard(
            self.fetcher.clone(),
            config.tool_timeout,
        ));
        let monitor = EvidenceMonitor::new(targets);

        let crawler = IntelligentCrawler::new(
            executor.clone(),
            DecisionEngine::new(config.decision.clone()),
            store.clone(),
            audit.clone(),
        )
        .with_concurrency(config.crawl_concurrency);

        // Discovery
        let urls = if cancel.is_cancelled() {
            Vec::new()
        } else {
            let started = Instant::now();
            let discovery = UrlDiscovery::new(self.fetcher.clone(), config.discovery.clone());
            let urls = discovery.discover(&request.domain).await;
            audit.record(
                AuditEntry::new(CollectionPhase::Discovery, "discover-urls")
                    .with_input(&request.domain)
                    .with_output(format!("{} URLs", urls.len()))
                    .with_reasoning("seeded BFS over the target domain")
                    .with_duration_ms(started.elapsed().as_millis() as u64),
            );
            urls
        };

        // Crawling: independent per-URL decision loops
        if !cancel.is_cancelled() {
            crawler
                .crawl(&urls, CollectionPhase::Crawling, cancel)
                .await;
        }

        // Phased external search
        if !cancel.is_cancelled() {
            let search = AgenticSearch::new(
                self.searcher.clone(),
                store.clone(),
                audit.clone(),
                config.search.clone(),
            );
            search
                .run(&request.company_name, &request.domain, cancel)
                .await;
        }

        // Gap analysis, then a second pass against what is missing
        if !cancel.is_cancelled() {
            let started = Instant::now();
            let gaps = monitor.analyze(&store.counts_by_category());
            audit.record(
                AuditEntry::new(CollectionPhase::GapAnalysis, "analyze-gaps")
                    .with_input(&request.domain)
                    .with_output(format!("{} gaps", gaps.len()))
                    .with_reasoning("category counts compared against target quotas")
                    .with_duration_ms(started.elapsed().as_millis() as u64),
            );

            let targeted = TargetedCollection::new(
                executor.clone(),
                self.searcher.clone(),
                store.clone(),
                audit.clone(),
            );
            targeted
                .remediate(&request.domain, &request.company_name, &gaps, cancel)
                .await;
        }

        // Processing and coverage always run, even on a cancelled run
        let started = Instant::now();
        let raw_count = store.len();
        let evidence = process::process(store.snapshot());
        audit.record(
            AuditEntry::new(CollectionPhase::Processing, "process-evidence")
                .with_input(format!("{} raw items", raw_count))
                .with_output(format!("{} deduplicated items", evidence.len()))
                .with_reasoning("content-identity dedup and relevance scoring")
                .with_evidence_count(evidence.len())
                .with_duration_ms(started.elapsed().as_millis() as u64),
        );

        let counts = store.counts_by_category();
        let coverage_percentage = monitor.coverage_percentage(&counts);
        let missing_categories = monitor.missing_categories(&counts);

        let audit_summary = audit.summary();
        let summary = CollectionSummary {
            total_actions: audit_summary.total_actions,
            evidence_by_phase: audit_summary.evidence_by_phase,
            evidence_by_tool: audit_summary.evidence_by_tool,
            coverage_percentage,
            missing_categories,
            overall_quality: quality_for(coverage_percentage),
        };

        info!(
            evidence = evidence.len(),
            coverage = coverage_percentage,
            actions = summary.total_actions,
            cancelled = cancel.is_cancelled(),
            "Collection finished"
        );

        Ok(CollectionResult {
            evidence,
            audit_trail: audit.entries(),
            summary,
        })
    }
}

fn validate(request: &CollectionRequest) -> Result<()> {
    let domain = request.domain.trim();
    if domain.is_empty() {
        return Err(CollectError::InvalidRequest {
            reason: "domain is required".to_string(),
        });
    }
    if domain.contains("://") || domain.contains('/') || domain.contains(char::is_whitespace) {
        return Err(CollectError::InvalidRequest {
            reason: format!("domain must be a bare hostname, got {:?}", request.domain),
        });
    }
    if request.company_name.trim().is_empty() {
        return Err(CollectError::InvalidRequest {
            reason: "company name is required".to_string(),
        });
    }
    Ok(())
}

/// Investment-thesis tags shift which categories matter most.
fn thesis_targets(mut targets: CategoryTargets, tag: Option<&str>) -> CategoryTargets {
    match tag {
        Some("accelerate-organic-growth") => {
            targets = targets
                .with_weight(categories::MARKET_POSITION, 2)
                .with_weight(categories::PRODUCT_FEATURE, 2)
                .with_target(categories::FINANCIAL_METRIC, 20);
        }
        Some("buy-and-build") => {
            targets = targets
                .with_target(categories::API_ENDPOINT, 20)
                .with_weight(categories::API_ENDPOINT, 3)
                .with_required(categories::API_ENDPOINT);
        }
        Some("digital-transformation") => {
            targets = targets
                .with_target(categories::TECH_STACK, 40)
                .with_weight(categories::SECURITY_POSTURE, 3);
        }
        _ => {}
    }
    targets
}

fn quality_for(coverage_percentage: f32) -> Quality {
    if coverage_percentage >= 70.0 {
        Quality::High
    } else if coverage_percentage >= 40.0 {
        Quality::Medium
    } else {
        Quality::Low
    }
}
