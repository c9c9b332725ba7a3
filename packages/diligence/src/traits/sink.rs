//! Evidence sink boundary.
//!
//! Persistence lives outside the engine; the collector only needs somewhere
//! to hand the final evidence set. Implementations decide schema, storage
//! and retention.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::types::evidence::EvidenceItem;

/// Destination for a finished collection's evidence.
#[async_trait]
pub trait EvidenceSink: Send + Sync {
    /// Store the evidence set under a collection identifier.
    async fn store(&self, collection_id: &str, evidence: &[EvidenceItem]) -> Result<()>;
}

/// In-memory sink for testing and development.
#[derive(Default)]
pub struct MemorySink {
    collections: RwLock<HashMap<String, Vec<EvidenceItem>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, collection_id: &str) -> Option<Vec<EvidenceItem>> {
        self.collections.read().unwrap().get(collection_id).cloned()
    }

    pub fn collection_count(&self) -> usize {
        self.collections.read().unwrap().len()
    }
}

#[async_trait]
impl EvidenceSink for MemorySink {
    async fn store(&self, collection_id: &str, evidence: &[EvidenceItem]) -> Result<()> {
        self.collections
            .write()
            .unwrap()
            .insert(collection_id.to_string(), evidence.to_vec());
        Ok(())
    }
}
