//! Evidence items and their content-identity hashing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Unique identifier for an evidence item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceId(pub Uuid);

impl EvidenceId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EvidenceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Well-known evidence category tags.
///
/// Categories are plain strings so downstream consumers can introduce new
/// ones without a library release; these constants cover the tracked set.
pub mod categories {
    pub const TECH_STACK: &str = "tech-stack";
    pub const TEAM_INFO: &str = "team-info";
    pub const TEAM_MEMBER: &str = "team-member";
    pub const FINANCIAL_METRIC: &str = "financial-metric";
    pub const API_ENDPOINT: &str = "api-endpoint";
    pub const SECURITY_POSTURE: &str = "security-posture";
    pub const MARKET_POSITION: &str = "market-position";
    pub const PRODUCT_FEATURE: &str = "product-feature";
    pub const INFRASTRUCTURE: &str = "infrastructure";
    pub const COMPLIANCE: &str = "compliance";
    pub const GENERAL: &str = "general";

    /// Categories that carry extra weight during scoring.
    pub const HIGH_VALUE: &[&str] = &[TECH_STACK, FINANCIAL_METRIC, TEAM_INFO];
}

/// A single typed, sourced, confidence-scored fact extracted during
/// collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: EvidenceId,
    /// Category tag, e.g. "tech-stack", "team-member"
    pub category: String,
    /// The extracted fact (shape varies by category)
    pub value: serde_json::Value,
    /// URL the fact was extracted from
    pub source_url: String,
    /// Extraction confidence, always clamped to [0, 1]
    pub confidence: f32,
    /// Final relevance score; derived, never user-supplied
    pub score: f32,
    pub collected_at: DateTime<Utc>,
}

impl EvidenceItem {
    /// Create a new evidence item. Confidence is clamped to [0, 1] and the
    /// score starts at zero until the processor assigns it.
    pub fn new(
        category: impl Into<String>,
        value: serde_json::Value,
        source_url: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            id: EvidenceId::new(),
            category: category.into(),
            value,
            source_url: source_url.into(),
            confidence: confidence.clamp(0.0, 1.0),
            score: 0.0,
            collected_at: Utc::now(),
        }
    }

    /// Content-identity key used for deduplication.
    ///
    /// Two items with the same normalized value collapse to one entry no
    /// matter which URL produced them.
    pub fn content_key(&self) -> ContentKey {
        ContentKey::from_value(&self.value)
    }
}

/// Content hash identifying an evidence value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey(pub Vec<u8>);

impl ContentKey {
    /// Hash a JSON value after normalization.
    pub fn from_value(value: &serde_json::Value) -> Self {
        let normalized = normalize_json(value);
        let json_str = serde_json::to_string(&normalized).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json_str.as_bytes());
        Self(hasher.finalize().to_vec())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

/// Normalize JSON for consistent fingerprinting
fn normalize_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(s.trim().to_lowercase()),
        serde_json::Value::Object(map) => {
            let mut normalized = serde_json::Map::new();
            for (k, v) in map {
                normalized.insert(k.clone(), normalize_json(v));
            }
            serde_json::Value::Object(normalized)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(normalize_json).collect())
        }
        other => other.clone(),
    }
}
