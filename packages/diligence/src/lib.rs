//! Adaptive Evidence-Collection Engine
//!
//! Gathers dispersed, unstructured evidence about a target organization -
//! technology stack, team, security posture, market position - from its
//! public web presence and search engines, for a downstream report
//! generator to consume.
//!
//! # Design Philosophy
//!
//! **Bounded, goal-directed, best-effort.**
//!
//! - Evidence quotas drive collection, not exhaustive indexing
//! - Per-page tool choice adapts to what earlier tools observed
//! - Every failure degrades; only a malformed request is an error
//! - Coverage is reported honestly: callers see what is absent
//!
//! # Usage
//!
//! ```rust,ignore
//! use diligence::{Collector, CollectionRequest, HttpFetcher, TavilyWebSearcher};
//! use std::sync::Arc;
//!
//! let collector = Collector::new(
//!     Arc::new(HttpFetcher::new()),
//!     Arc::new(TavilyWebSearcher::new(api_key)),
//! );
//!
//! let request = CollectionRequest::new("acme.dev", "Acme")
//!     .with_thesis("digital-transformation");
//!
//! let result = collector.collect(&request).await?;
//! println!("{} evidence items, {:.0}% coverage",
//!     result.evidence.len(), result.summary.coverage_percentage);
//! ```
//!
//! # Modules
//!
//! - [`engine`] - decision policy, crawler, search, gap analysis, collector
//! - [`tools`] - pluggable collection capabilities behind one executor
//! - [`discovery`] - bounded BFS over a domain's link graph
//! - [`traits`] - fetcher/searcher/sink boundaries
//! - [`types`] - evidence, audit, page-context and config types
//! - [`testing`] - mock implementations for testing

pub mod discovery;
pub mod engine;
pub mod error;
pub mod security;
pub mod store;
pub mod testing;
pub mod tools;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CollectError, FetchError, SecurityError, ToolError};
pub use types::{
    audit::{AuditEntry, AuditLog, AuditSummary, CollectionPhase, Quality},
    config::{
        CategoryTargets, CollectionDepth, CollectionRequest, CollectorConfig, DecisionConfig,
        DiscoveryConfig, SearchConfig,
    },
    evidence::{categories, ContentKey, EvidenceId, EvidenceItem},
    gap::{Gap, GapPriority},
    page::{FetchedPage, PageCharacteristics, PageContext},
};

// Re-export the engine
pub use engine::{
    AgenticSearch, CollectionResult, CollectionSummary, Collector, Decision, DecisionEngine,
    EvidenceMonitor, IntelligentCrawler, TargetedCollection,
};

// Re-export boundaries and implementations
pub use discovery::UrlDiscovery;
pub use store::EvidenceStore;
pub use tools::{Capability, ToolExecution, ToolExecutor, ToolOutput};
pub use traits::{
    fetcher::{HttpFetcher, PageFetcher, RateLimitedFetcher, UrlValidator, ValidatedFetcher},
    searcher::{MockWebSearcher, SearchResult, TavilyWebSearcher, WebSearcher},
    sink::{EvidenceSink, MemorySink},
};

// Re-export testing utilities
pub use testing::{MockFetcher, ScriptedCapability};
