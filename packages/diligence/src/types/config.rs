//! Configuration for discovery, the decision loop, search and collection.
//!
//! Every stop-condition threshold is configurable rather than a constant;
//! the defaults mirror the values the engine was tuned with but carry no
//! claim of being optimal.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::types::evidence::categories;

/// Paths probed on every target domain before link traversal widens the
/// frontier. High-signal pages for organization intelligence.
pub const IMPORTANT_PATHS: &[&str] = &[
    "/about",
    "/about-us",
    "/company",
    "/team",
    "/technology",
    "/api",
    "/docs",
    "/developers",
    "/careers",
    "/jobs",
    "/security",
    "/trust",
    "/pricing",
    "/plans",
    "/product",
    "/features",
    "/integrations",
    "/partners",
    "/customers",
    "/blog",
    "/engineering",
    "/investors",
    "/press",
    "/contact",
];

/// File extensions skipped during link discovery.
pub const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".pdf", ".zip", ".gz", ".tar",
    ".mp4", ".mp3", ".webm", ".woff", ".woff2", ".ttf", ".eot", ".css", ".exe", ".dmg",
];

/// Configuration for URL discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Maximum URLs to discover
    pub max_urls: usize,

    /// Seed paths probed in addition to the domain roots
    pub seed_paths: Vec<String>,

    /// Concurrent fetches per BFS wave
    pub concurrency: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_urls: 250,
            seed_paths: IMPORTANT_PATHS.iter().map(|p| p.to_string()).collect(),
            concurrency: 5,
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_urls(mut self, max: usize) -> Self {
        self.max_urls = max;
        self
    }

    pub fn with_seed_paths(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.seed_paths = paths.into_iter().map(|p| p.into()).collect();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Thresholds governing the per-URL decision loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Hard cap on loop iterations per URL
    pub max_loops: usize,

    /// Stop once a URL has produced more evidence than this
    pub evidence_ceiling: usize,

    /// Evidence level past which low-value decisions stop the loop
    pub diminishing_returns: usize,

    /// Expected-evidence estimates below this count as low value
    pub low_value_threshold: u32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            max_loops: 10,
            evidence_ceiling: 50,
            diminishing_returns: 20,
            low_value_threshold: 5,
        }
    }
}

impl DecisionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_loops(mut self, max: usize) -> Self {
        self.max_loops = max;
        self
    }

    pub fn with_evidence_ceiling(mut self, ceiling: usize) -> Self {
        self.evidence_ceiling = ceiling;
        self
    }

    pub fn with_diminishing_returns(mut self, threshold: usize) -> Self {
        self.diminishing_returns = threshold;
        self
    }

    pub fn with_low_value_threshold(mut self, threshold: u32) -> Self {
        self.low_value_threshold = threshold;
        self
    }
}

/// Configuration for the phased keyword search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// A phase yielding fewer items than this triggers an adaptive phase
    pub min_phase_yield: usize,

    /// Bound on recursive phase growth
    pub max_depth: usize,

    /// Results requested per query
    pub results_per_query: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_phase_yield: 5,
            max_depth: 5,
            results_per_query: 10,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_phase_yield(mut self, min: usize) -> Self {
        self.min_phase_yield = min;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Per-category evidence quotas, importance weights and required categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTargets {
    /// Target evidence count per tracked category
    pub targets: HashMap<String, usize>,

    /// Importance weight per category, 1 (nice to have) to 3 (critical)
    pub weights: HashMap<String, u8>,

    /// Categories that must reach a minimal count (5) even when untracked
    pub required: Vec<String>,
}

impl Default for CategoryTargets {
    fn default() -> Self {
        let targets = [
            (categories::TECH_STACK, 30),
            (categories::TEAM_INFO, 20),
            (categories::FINANCIAL_METRIC, 15),
            (categories::PRODUCT_FEATURE, 15),
            (categories::API_ENDPOINT, 10),
            (categories::SECURITY_POSTURE, 10),
            (categories::MARKET_POSITION, 10),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let weights = [
            (categories::TECH_STACK, 3),
            (categories::TEAM_INFO, 2),
            (categories::FINANCIAL_METRIC, 3),
            (categories::PRODUCT_FEATURE, 1),
            (categories::API_ENDPOINT, 2),
            (categories::SECURITY_POSTURE, 2),
            (categories::MARKET_POSITION, 1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            targets,
            weights,
            required: vec![],
        }
    }
}

impl CategoryTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, category: impl Into<String>, target: usize) -> Self {
        self.targets.insert(category.into(), target);
        self
    }

    pub fn with_weight(mut self, category: impl Into<String>, weight: u8) -> Self {
        self.weights.insert(category.into(), weight.clamp(1, 3));
        self
    }

    pub fn with_required(mut self, category: impl Into<String>) -> Self {
        self.required.push(category.into());
        self
    }

    pub fn weight(&self, category: &str) -> u8 {
        self.weights.get(category).copied().unwrap_or(1)
    }
}

/// How thoroughly to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionDepth {
    Shallow,
    Deep,
    Comprehensive,
}

impl CollectionDepth {
    /// Scale factor applied to URL caps and search depth.
    pub fn scale(&self) -> f32 {
        match self {
            Self::Shallow => 0.4,
            Self::Deep => 1.0,
            Self::Comprehensive => 1.6,
        }
    }
}

/// A request to collect evidence about one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRequest {
    /// Target domain, e.g. "example.com"
    pub domain: String,
    pub company_name: String,
    /// Optional investment-thesis tag that reweights category targets
    pub investment_thesis_tag: Option<String>,
    pub depth: CollectionDepth,
}

impl CollectionRequest {
    pub fn new(domain: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            company_name: company_name.into(),
            investment_thesis_tag: None,
            depth: CollectionDepth::Deep,
        }
    }

    pub fn with_thesis(mut self, tag: impl Into<String>) -> Self {
        self.investment_thesis_tag = Some(tag.into());
        self
    }

    pub fn with_depth(mut self, depth: CollectionDepth) -> Self {
        self.depth = depth;
        self
    }
}

/// Top-level configuration for a collection run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub discovery: DiscoveryConfig,
    pub decision: DecisionConfig,
    pub search: SearchConfig,
    pub targets: CategoryTargets,

    /// Concurrent URL loops during crawling
    pub crawl_concurrency: usize,

    /// Deadline for a single tool execution
    pub tool_timeout: Duration,

    /// Global ceiling on collected evidence before processing
    pub evidence_limit: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            decision: DecisionConfig::default(),
            search: SearchConfig::default(),
            targets: CategoryTargets::default(),
            crawl_concurrency: 5,
            tool_timeout: Duration::from_secs(15),
            evidence_limit: 2000,
        }
    }
}

impl CollectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_decision(mut self, decision: DecisionConfig) -> Self {
        self.decision = decision;
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_targets(mut self, targets: CategoryTargets) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_crawl_concurrency(mut self, concurrency: usize) -> Self {
        self.crawl_concurrency = concurrency.max(1);
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Scale caps to the requested collection depth.
    pub fn scaled_for(mut self, depth: CollectionDepth) -> Self {
        let scale = depth.scale();
        self.discovery.max_urls = ((self.discovery.max_urls as f32) * scale).ceil() as usize;
        self.search.max_depth = ((self.search.max_depth as f32) * scale).ceil() as usize;
        self
    }
}
