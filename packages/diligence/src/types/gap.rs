//! Coverage gaps: categories where collected evidence falls short of quota.

use serde::{Deserialize, Serialize};

/// How urgently a gap needs remediation.
///
/// Ordering is High > Medium > Low so gap lists sort naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPriority {
    High,
    Medium,
    Low,
}

/// A category whose evidence count is below its target quota.
///
/// Computed fresh on each gap-analysis pass; not a long-lived entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    pub category: String,
    pub current: usize,
    pub target: usize,
    /// `target - current`, saturating at zero
    pub deficit: usize,
    pub priority: GapPriority,
}

impl Gap {
    pub fn new(category: impl Into<String>, current: usize, target: usize, priority: GapPriority) -> Self {
        Self {
            category: category.into(),
            current,
            target,
            deficit: target.saturating_sub(current),
            priority,
        }
    }
}
