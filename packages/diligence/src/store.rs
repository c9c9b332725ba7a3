//! Concurrency-safe append-only evidence accumulation.
//!
//! Many URL loops and search queries append in flight; nothing mutates or
//! removes. Readers take snapshots, so a slow aggregation never blocks
//! appends for long.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::evidence::EvidenceItem;

/// Shared evidence store for one collection run.
#[derive(Default)]
pub struct EvidenceStore {
    items: RwLock<Vec<EvidenceItem>>,
    /// Hard ceiling; appends past it are dropped (0 = unbounded)
    limit: usize,
}

impl EvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a global evidence ceiling.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            limit,
        }
    }

    /// Append items, returning how many were accepted.
    pub fn append(&self, new_items: impl IntoIterator<Item = EvidenceItem>) -> usize {
        let mut items = self.items.write().unwrap();
        let mut accepted = 0;
        for item in new_items {
            if self.limit > 0 && items.len() >= self.limit {
                tracing::warn!(limit = self.limit, "Evidence ceiling reached, dropping item");
                break;
            }
            items.push(item);
            accepted += 1;
        }
        accepted
    }

    /// Snapshot of all evidence in append order.
    pub fn snapshot(&self) -> Vec<EvidenceItem> {
        self.items.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().unwrap().is_empty()
    }

    /// Evidence counts grouped by category.
    pub fn counts_by_category(&self) -> HashMap<String, usize> {
        let items = self.items.read().unwrap();
        let mut counts = HashMap::new();
        for item in items.iter() {
            *counts.entry(item.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of items in one category.
    pub fn count_for_category(&self, category: &str) -> usize {
        self.items
            .read()
            .unwrap()
            .iter()
            .filter(|i| i.category == category)
            .count()
    }

    /// Number of items attributed to one source URL.
    pub fn count_for_url(&self, url: &str) -> usize {
        self.items
            .read()
            .unwrap()
            .iter()
            .filter(|i| i.source_url == url)
            .count()
    }
}
