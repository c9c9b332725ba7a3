//! Intelligent crawler: the per-URL decision loop, batched across URLs.
//!
//! Within one URL the loop is strictly sequential - each decision depends
//! on what the previous tool observed. Across URLs the loops are
//! independent and run in a bounded-parallel group; a failed or cancelled
//! loop never disturbs its siblings. The only shared state is the
//! append-only evidence store and audit log.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::decision::DecisionEngine;
use crate::store::EvidenceStore;
use crate::tools::ToolExecutor;
use crate::types::audit::{AuditEntry, AuditLog, CollectionPhase};
use crate::types::page::PageContext;

/// Composes the decision engine and tool executor over a URL set.
#[derive(Clone)]
pub struct IntelligentCrawler {
    executor: Arc<ToolExecutor>,
    engine: DecisionEngine,
    store: Arc<EvidenceStore>,
    audit: Arc<AuditLog>,
    concurrency: usize,
}

impl IntelligentCrawler {
    pub fn new(
        executor: Arc<ToolExecutor>,
        engine: DecisionEngine,
        store: Arc<EvidenceStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            executor,
            engine,
            store,
            audit,
            concurrency: 5,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run the decision loop for one URL until a stop condition fires.
    ///
    /// Returns the evidence count gathered for this URL. The context is
    /// discarded here; its evidence already lives in the shared store.
    pub async fn process_url(
        &self,
        url: &str,
        phase: CollectionPhase,
        cancel: &CancellationToken,
    ) -> usize {
        let mut ctx = PageContext::new(url);

        loop {
            if cancel.is_cancelled() {
                debug!(url = %url, "URL loop cancelled");
                break;
            }

            let decision = self.engine.decide(&ctx);
            if !self.engine.should_continue(&ctx, &decision) {
                debug!(
                    url = %url,
                    loops = ctx.loop_count,
                    evidence = ctx.evidence_count,
                    reason = %decision.reasoning,
                    "URL loop finished"
                );
                break;
            }

            // should_continue already rejected terminal decisions
            let Some(tool) = decision.tool.clone() else {
                break;
            };

            let execution = self.executor.execute(&tool, url, &ctx).await;
            let gathered = execution.evidence.len();
            self.store.append(execution.evidence);

            self.audit.record(
                AuditEntry::new(phase, "execute-tool")
                    .with_tool(&tool)
                    .with_input(url)
                    .with_output(if execution.success {
                        format!("{} evidence items", gathered)
                    } else {
                        execution
                            .error
                            .clone()
                            .unwrap_or_else(|| "failed".to_string())
                    })
                    .with_reasoning(&decision.reasoning)
                    .with_evidence_count(gathered)
                    .with_duration_ms(execution.duration_ms),
            );

            ctx.apply(&tool, &execution.characteristics, gathered);
        }

        ctx.evidence_count
    }

    /// Process a set of URLs as independent loops with bounded parallelism.
    ///
    /// Returns total evidence gathered. Partial-failure tolerant: one
    /// panicked or cancelled loop does not cancel the batch.
    pub async fn crawl(
        &self,
        urls: &[String],
        phase: CollectionPhase,
        cancel: &CancellationToken,
    ) -> usize {
        info!(
            urls = urls.len(),
            concurrency = self.concurrency,
            "Crawl starting"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            if cancel.is_cancelled() {
                break;
            }

            let crawler = self.clone();
            let url = url.clone();
            let cancel = cancel.clone();
            let sem = semaphore.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return 0;
                };
                crawler.process_url(&url, phase, &cancel).await
            }));
        }

        let mut total = 0;
        for handle in handles {
            // A failed join only loses that URL's count
            if let Ok(count) = handle.await {
                total += count;
            }
        }

        info!(evidence = total, "Crawl completed");
        total
    }
}
