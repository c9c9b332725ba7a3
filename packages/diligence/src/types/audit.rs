//! Append-only audit trail of every action the engine takes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Unique identifier for an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditEntryId(pub Uuid);

impl AuditEntryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AuditEntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Phases of a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionPhase {
    Discovery,
    Crawling,
    Search,
    GapAnalysis,
    TargetedCollection,
    Processing,
}

impl CollectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Crawling => "crawling",
            Self::Search => "search",
            Self::GapAnalysis => "gap-analysis",
            Self::TargetedCollection => "targeted-collection",
            Self::Processing => "processing",
        }
    }
}

impl std::fmt::Display for CollectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subjective quality of an action's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
    Low,
}

/// One recorded action. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub timestamp: DateTime<Utc>,
    pub phase: CollectionPhase,
    /// What was done, e.g. "execute-tool", "run-query"
    pub action: String,
    /// Tool or capability involved (empty for non-tool actions)
    pub tool: String,
    /// Input handed to the action (URL, query, ...)
    pub input: String,
    /// Condensed outcome description
    pub output: String,
    /// Why the engine chose this action
    pub reasoning: String,
    pub evidence_count: usize,
    pub quality: Quality,
    pub duration_ms: u64,
}

impl AuditEntry {
    pub fn new(phase: CollectionPhase, action: impl Into<String>) -> Self {
        Self {
            id: AuditEntryId::new(),
            timestamp: Utc::now(),
            phase,
            action: action.into(),
            tool: String::new(),
            input: String::new(),
            output: String::new(),
            reasoning: String::new(),
            evidence_count: 0,
            quality: Quality::Medium,
            duration_ms: 0,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_evidence_count(mut self, count: usize) -> Self {
        self.evidence_count = count;
        // Yield is the quality signal for collection actions
        self.quality = match count {
            0 => Quality::Low,
            1..=4 => Quality::Medium,
            _ => Quality::High,
        };
        self
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Aggregated view over the audit trail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_actions: usize,
    pub evidence_by_phase: HashMap<String, usize>,
    pub evidence_by_tool: HashMap<String, usize>,
    pub total_duration_ms: u64,
}

/// Append-only audit log, safe for concurrent append from in-flight tasks.
#[derive(Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Entries are immutable once recorded.
    pub fn record(&self, entry: AuditEntry) {
        self.entries.write().unwrap().push(entry);
    }

    /// Snapshot of all entries in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }

    /// Summarize evidence counts by phase and tool.
    pub fn summary(&self) -> AuditSummary {
        let entries = self.entries.read().unwrap();
        let mut summary = AuditSummary {
            total_actions: entries.len(),
            ..Default::default()
        };

        for entry in entries.iter() {
            *summary
                .evidence_by_phase
                .entry(entry.phase.as_str().to_string())
                .or_insert(0) += entry.evidence_count;
            if !entry.tool.is_empty() {
                *summary
                    .evidence_by_tool
                    .entry(entry.tool.clone())
                    .or_insert(0) += entry.evidence_count;
            }
            summary.total_duration_ms += entry.duration_ms;
        }

        summary
    }
}
