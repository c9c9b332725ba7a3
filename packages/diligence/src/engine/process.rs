//! Evidence processing: deduplication, scoring, ordering.
//!
//! The final pass over the raw evidence set. Duplicate facts from
//! different pages collapse to the highest-confidence sighting; each
//! survivor gets its relevance score; output is sorted best-first.

use std::collections::HashMap;

use crate::types::evidence::{categories, ContentKey, EvidenceItem};

/// Score multiplier for high-value categories.
const HIGH_VALUE_BOOST: f32 = 1.5;

/// Collapse items with identical content keys, keeping the
/// highest-confidence sighting of each fact.
pub fn dedupe(items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    let mut seen: HashMap<ContentKey, usize> = HashMap::new();
    let mut result: Vec<EvidenceItem> = Vec::with_capacity(items.len());

    for item in items {
        let key = item.content_key();
        match seen.get(&key) {
            Some(&index) => {
                if item.confidence > result[index].confidence {
                    result[index] = item;
                }
            }
            None => {
                seen.insert(key, result.len());
                result.push(item);
            }
        }
    }

    result
}

/// Assign the final relevance score:
/// `min(confidence * boost, 1.0)`, boosted for high-value categories.
pub fn score(items: &mut [EvidenceItem]) {
    for item in items {
        let boost = if categories::HIGH_VALUE.contains(&item.category.as_str()) {
            HIGH_VALUE_BOOST
        } else {
            1.0
        };
        item.score = (item.confidence * boost).min(1.0);
    }
}

/// Dedupe, score and sort descending by score.
pub fn process(items: Vec<EvidenceItem>) -> Vec<EvidenceItem> {
    let mut deduped = dedupe(items);
    score(&mut deduped);
    deduped.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.source_url.cmp(&b.source_url))
    });
    deduped
}
