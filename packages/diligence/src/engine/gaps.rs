//! Evidence monitor: coverage measurement and gap analysis.
//!
//! Compares per-category evidence counts against their target quotas and
//! importance weights, producing the priority-ordered gap list that drives
//! targeted collection.

use std::collections::HashMap;

use crate::types::config::CategoryTargets;
use crate::types::gap::{Gap, GapPriority};

/// Minimal count a required category must reach before it stops being a
/// forced high-priority gap.
const REQUIRED_MINIMUM: usize = 5;

/// Computes gaps and coverage from category counts.
#[derive(Debug, Clone, Default)]
pub struct EvidenceMonitor {
    targets: CategoryTargets,
}

impl EvidenceMonitor {
    pub fn new(targets: CategoryTargets) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &CategoryTargets {
        &self.targets
    }

    /// Priority for one (current, target, importance) triple.
    ///
    /// Deterministic: identical inputs always produce the same priority.
    fn priority(current: usize, target: usize, importance: u8) -> GapPriority {
        let ratio = if target == 0 {
            1.0
        } else {
            current as f32 / target as f32
        };

        if ratio < 0.2 && importance >= 2 {
            GapPriority::High
        } else if ratio < 0.5 {
            GapPriority::Medium
        } else {
            GapPriority::Low
        }
    }

    /// Compute the gap list for the given per-category counts.
    ///
    /// Tracked categories below target appear with computed priority;
    /// required categories under the minimum are force-inserted as high
    /// priority even when untracked. Sorted High > Medium > Low, larger
    /// deficits first within a priority.
    pub fn analyze(&self, counts: &HashMap<String, usize>) -> Vec<Gap> {
        let mut gaps: Vec<Gap> = Vec::new();

        for (category, &target) in &self.targets.targets {
            let current = counts.get(category).copied().unwrap_or(0);
            if current >= target {
                continue;
            }
            let priority = Self::priority(current, target, self.targets.weight(category));
            gaps.push(Gap::new(category.clone(), current, target, priority));
        }

        for category in &self.targets.required {
            let current = counts.get(category).copied().unwrap_or(0);
            if current >= REQUIRED_MINIMUM {
                continue;
            }
            match gaps.iter_mut().find(|g| &g.category == category) {
                Some(gap) => gap.priority = GapPriority::High,
                None => gaps.push(Gap::new(
                    category.clone(),
                    current,
                    REQUIRED_MINIMUM,
                    GapPriority::High,
                )),
            }
        }

        gaps.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.deficit.cmp(&a.deficit))
                .then(a.category.cmp(&b.category))
        });
        gaps
    }

    /// Percentage of tracked categories with at least a minimal signal.
    pub fn coverage_percentage(&self, counts: &HashMap<String, usize>) -> f32 {
        if self.targets.targets.is_empty() {
            return 100.0;
        }
        let covered = self
            .targets
            .targets
            .keys()
            .filter(|category| counts.get(*category).copied().unwrap_or(0) > 0)
            .count();
        100.0 * covered as f32 / self.targets.targets.len() as f32
    }

    /// Tracked categories with no evidence at all.
    pub fn missing_categories(&self, counts: &HashMap<String, usize>) -> Vec<String> {
        let mut missing: Vec<String> = self
            .targets
            .targets
            .keys()
            .filter(|category| counts.get(*category).copied().unwrap_or(0) == 0)
            .cloned()
            .collect();
        missing.sort();
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::evidence::categories;

    fn counts(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_low_ratio_high_importance_is_high_priority() {
        // tech-stack: target 30, weight 3; 5/30 = 0.167 < 0.2
        let monitor = EvidenceMonitor::new(CategoryTargets::default());
        let gaps = monitor.analyze(&counts(&[(categories::TECH_STACK, 5)]));

        let tech = gaps
            .iter()
            .find(|g| g.category == categories::TECH_STACK)
            .unwrap();
        assert_eq!(tech.deficit, 25);
        assert_eq!(tech.priority, GapPriority::High);
    }

    #[test]
    fn test_mid_ratio_is_medium_priority() {
        let monitor = EvidenceMonitor::new(CategoryTargets::default());
        // 10/30 = 0.33 -> medium
        let gaps = monitor.analyze(&counts(&[(categories::TECH_STACK, 10)]));
        let tech = gaps
            .iter()
            .find(|g| g.category == categories::TECH_STACK)
            .unwrap();
        assert_eq!(tech.priority, GapPriority::Medium);
    }

    #[test]
    fn test_low_importance_never_high() {
        // product-feature weight is 1: even at zero it stays medium
        let monitor = EvidenceMonitor::new(CategoryTargets::default());
        let gaps = monitor.analyze(&HashMap::new());
        let product = gaps
            .iter()
            .find(|g| g.category == categories::PRODUCT_FEATURE)
            .unwrap();
        assert_eq!(product.priority, GapPriority::Medium);
    }

    #[test]
    fn test_met_target_produces_no_gap() {
        let monitor = EvidenceMonitor::new(CategoryTargets::default());
        let gaps = monitor.analyze(&counts(&[(categories::TECH_STACK, 30)]));
        assert!(!gaps.iter().any(|g| g.category == categories::TECH_STACK));
    }

    #[test]
    fn test_required_category_forced_high() {
        let targets = CategoryTargets::default().with_required("founder-background");
        let monitor = EvidenceMonitor::new(targets);

        let gaps = monitor.analyze(&counts(&[("founder-background", 2)]));
        let forced = gaps
            .iter()
            .find(|g| g.category == "founder-background")
            .unwrap();
        assert_eq!(forced.priority, GapPriority::High);
        assert_eq!(forced.target, 5);
        assert_eq!(forced.deficit, 3);
    }

    #[test]
    fn test_gaps_sorted_by_priority() {
        let monitor = EvidenceMonitor::new(CategoryTargets::default());
        let gaps = monitor.analyze(&counts(&[
            (categories::TECH_STACK, 2),       // high
            (categories::MARKET_POSITION, 4),  // weight 1, ratio 0.4 -> medium
            (categories::TEAM_INFO, 15),       // ratio 0.75 -> low, but >= target? 15 < 20 -> low
        ]));

        let priorities: Vec<GapPriority> = gaps.iter().map(|g| g.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        assert_eq!(gaps.first().unwrap().priority, GapPriority::High);
    }

    #[test]
    fn test_priority_deterministic() {
        for _ in 0..3 {
            assert_eq!(
                EvidenceMonitor::priority(5, 30, 2),
                EvidenceMonitor::priority(5, 30, 2)
            );
        }
        assert_eq!(EvidenceMonitor::priority(5, 30, 3), GapPriority::High);
        assert_eq!(EvidenceMonitor::priority(5, 30, 1), GapPriority::Medium);
        assert_eq!(EvidenceMonitor::priority(20, 30, 3), GapPriority::Low);
    }

    #[test]
    fn test_coverage_and_missing() {
        let monitor = EvidenceMonitor::new(CategoryTargets::default());
        let counts = counts(&[
            (categories::TECH_STACK, 3),
            (categories::TEAM_INFO, 1),
        ]);

        // 2 of 7 tracked categories have signal
        let coverage = monitor.coverage_percentage(&counts);
        assert!((coverage - 100.0 * 2.0 / 7.0).abs() < 0.01);

        let missing = monitor.missing_categories(&counts);
        assert_eq!(missing.len(), 5);
        assert!(missing.contains(&categories::FINANCIAL_METRIC.to_string()));
        assert!(!missing.contains(&categories::TECH_STACK.to_string()));
    }
}
