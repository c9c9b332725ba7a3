//! The adaptive collection engine.
//!
//! - [`decision`] - per-URL decision policy and stop conditions
//! - [`crawler`] - the decision loop, batched across URLs
//! - [`search`] - phased keyword search with adaptive phase injection
//! - [`gaps`] - coverage measurement and gap analysis
//! - [`targeted`] - category-specific gap remediation
//! - [`process`] - dedup, scoring, ordering
//! - [`collector`] - top-level sequencing

pub mod collector;
pub mod crawler;
pub mod decision;
pub mod gaps;
pub mod process;
pub mod search;
pub mod targeted;

pub use collector::{CollectionResult, CollectionSummary, Collector};
pub use crawler::IntelligentCrawler;
pub use decision::{Decision, DecisionEngine};
pub use gaps::EvidenceMonitor;
pub use search::{default_phases, AgenticSearch, SearchPhase};
pub use targeted::TargetedCollection;
