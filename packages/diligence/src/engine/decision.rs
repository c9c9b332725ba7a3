//! Per-URL decision policy.
//!
//! The engine is deliberately stateless: `decide` and `should_continue` are
//! pure functions of the page context and configuration, so concurrent URL
//! loops share nothing and every decision is reproducible from its inputs.
//!
//! Policy rules are evaluated in fixed precedence order; the first match
//! wins. A page with no matching rule is finished.

use crate::types::config::DecisionConfig;
use crate::types::page::PageContext;
use crate::tools::names;

/// The next action for a URL, or termination when `tool` is `None`.
#[derive(Debug, Clone)]
pub struct Decision {
    pub tool: Option<String>,
    pub reasoning: String,
    pub priority: u8,
    /// Estimated evidence yield, discounted as the loop ages
    pub expected_evidence: u32,
}

impl Decision {
    fn run(tool: &str, reasoning: &str, priority: u8, expected: u32) -> Self {
        Self {
            tool: Some(tool.to_string()),
            reasoning: reasoning.to_string(),
            priority,
            expected_evidence: expected,
        }
    }

    fn stop(reasoning: &str) -> Self {
        Self {
            tool: None,
            reasoning: reasoning.to_string(),
            priority: 0,
            expected_evidence: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.tool.is_none()
    }
}

/// Stateless decision policy over page contexts.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Choose the next tool for this URL, first match wins.
    pub fn decide(&self, ctx: &PageContext) -> Decision {
        let url = ctx.url.to_lowercase();

        // Rendered content first: everything else reads markup this page
        // may not serve statically
        if (ctx.characteristics.has_javascript() || url_implies_app(&url))
            && !ctx.has_run(names::RENDERED_CONTENT)
        {
            return self.discounted(
                ctx,
                Decision::run(
                    names::RENDERED_CONTENT,
                    "page relies on client-side rendering; static markup is not authoritative",
                    9,
                    8,
                ),
            );
        }

        if url_implies_api(&url)
            && !ctx.has_run(names::API_EXTRACTION)
        {
            return self.discounted(
                ctx,
                Decision::run(
                    names::API_EXTRACTION,
                    "URL looks like API or developer documentation with no API evidence yet",
                    8,
                    10,
                ),
            );
        }

        if ctx.characteristics.security_headers_seen() && !ctx.has_run(names::SECURITY_SCAN) {
            return self.discounted(
                ctx,
                Decision::run(
                    names::SECURITY_SCAN,
                    "security headers observed but no dedicated scan has run",
                    7,
                    6,
                ),
            );
        }

        if url_implies_tech(&url) && !ctx.has_run(names::TECH_STACK) {
            return self.discounted(
                ctx,
                Decision::run(
                    names::TECH_STACK,
                    "URL looks technology-related and the stack analyzer has not run",
                    8,
                    12,
                ),
            );
        }

        if !ctx.has_run(names::HTML_COLLECTOR) {
            return self.discounted(
                ctx,
                Decision::run(
                    names::HTML_COLLECTOR,
                    "no basic content collected for this URL yet",
                    10,
                    10,
                ),
            );
        }

        Decision::stop("no applicable tool remains for this page")
    }

    /// Apply the loop-age discount to an estimate.
    fn discounted(&self, ctx: &PageContext, mut decision: Decision) -> Decision {
        let discount = (ctx.loop_count as u32) * 2;
        decision.expected_evidence = decision.expected_evidence.saturating_sub(discount);
        decision
    }

    /// Whether the per-URL loop should take this decision.
    ///
    /// False when any stop condition fires: loop budget spent, per-URL
    /// evidence ceiling crossed, no tool chosen, or the decision promises
    /// too little while the page is already well covered.
    pub fn should_continue(&self, ctx: &PageContext, decision: &Decision) -> bool {
        if ctx.loop_count >= self.config.max_loops {
            return false;
        }
        if ctx.evidence_count > self.config.evidence_ceiling {
            return false;
        }
        if decision.is_terminal() {
            return false;
        }
        if decision.expected_evidence < self.config.low_value_threshold
            && ctx.evidence_count > self.config.diminishing_returns
        {
            return false;
        }
        true
    }
}

fn url_implies_app(url: &str) -> bool {
    ["//app.", "/app/", "/dashboard", "/portal", "/console"]
        .iter()
        .any(|m| url.contains(m))
}

fn url_implies_api(url: &str) -> bool {
    ["/api", "/docs", "/developers", "/reference", "swagger", "graphql"]
        .iter()
        .any(|m| url.contains(m))
}

fn url_implies_tech(url: &str) -> bool {
    [
        "/technology",
        "/tech",
        "/engineering",
        "/stack",
        "/platform",
        "/infrastructure",
        "/architecture",
    ]
    .iter()
    .any(|m| url.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::page::PageCharacteristics;

    fn engine() -> DecisionEngine {
        DecisionEngine::new(DecisionConfig::default())
    }

    #[test]
    fn test_fresh_url_gets_html_collector() {
        let ctx = PageContext::new("https://example.com/about");
        let decision = engine().decide(&ctx);
        assert_eq!(decision.tool.as_deref(), Some(names::HTML_COLLECTOR));
        assert_eq!(decision.priority, 10);
    }

    #[test]
    fn test_javascript_page_prefers_rendered_fetch() {
        let mut ctx = PageContext::new("https://example.com/about");
        ctx.characteristics = PageCharacteristics::new().with("has_javascript", true);

        let decision = engine().decide(&ctx);
        assert_eq!(decision.tool.as_deref(), Some(names::RENDERED_CONTENT));
        assert_eq!(decision.priority, 9);
    }

    #[test]
    fn test_app_url_prefers_rendered_fetch() {
        let ctx = PageContext::new("https://app.example.com/login");
        let decision = engine().decide(&ctx);
        assert_eq!(decision.tool.as_deref(), Some(names::RENDERED_CONTENT));
    }

    #[test]
    fn test_api_url_prefers_api_extraction() {
        let ctx = PageContext::new("https://example.com/docs/api");
        let decision = engine().decide(&ctx);
        assert_eq!(decision.tool.as_deref(), Some(names::API_EXTRACTION));
    }

    #[test]
    fn test_security_headers_trigger_scan() {
        let mut ctx = PageContext::new("https://example.com/about");
        ctx.apply(
            names::HTML_COLLECTOR,
            &PageCharacteristics::new().with("security_headers_seen", true),
            2,
        );

        let decision = engine().decide(&ctx);
        assert_eq!(decision.tool.as_deref(), Some(names::SECURITY_SCAN));
    }

    #[test]
    fn test_tech_url_gets_stack_analyzer() {
        let mut ctx = PageContext::new("https://example.com/engineering");
        ctx.apply(names::HTML_COLLECTOR, &PageCharacteristics::new(), 1);

        let decision = engine().decide(&ctx);
        assert_eq!(decision.tool.as_deref(), Some(names::TECH_STACK));
    }

    #[test]
    fn test_exhausted_page_is_terminal() {
        let mut ctx = PageContext::new("https://example.com/about");
        ctx.apply(names::HTML_COLLECTOR, &PageCharacteristics::new(), 1);

        let decision = engine().decide(&ctx);
        assert!(decision.is_terminal());
    }

    #[test]
    fn test_never_repeats_a_tool() {
        // Whatever the context, a chosen tool is never one already run
        let mut ctx = PageContext::new("https://app.example.com/docs/engineering");
        ctx.characteristics = PageCharacteristics::new()
            .with("has_javascript", true)
            .with("security_headers_seen", true);

        for _ in 0..10 {
            let decision = engine().decide(&ctx);
            match decision.tool {
                Some(tool) => {
                    assert!(!ctx.has_run(&tool), "tool {} repeated", tool);
                    ctx.apply(&tool, &PageCharacteristics::new(), 1);
                }
                None => break,
            }
        }
    }

    #[test]
    fn test_stop_at_max_loops_regardless_of_estimate() {
        let engine = engine();
        let mut ctx = PageContext::new("https://example.com");
        ctx.loop_count = engine.config().max_loops;

        let decision = Decision::run(names::HTML_COLLECTOR, "test", 10, 100);
        assert!(!engine.should_continue(&ctx, &decision));
    }

    #[test]
    fn test_stop_past_evidence_ceiling() {
        let engine = engine();
        let mut ctx = PageContext::new("https://example.com");
        ctx.evidence_count = engine.config().evidence_ceiling + 1;

        let decision = Decision::run(names::HTML_COLLECTOR, "test", 10, 100);
        assert!(!engine.should_continue(&ctx, &decision));
    }

    #[test]
    fn test_stop_on_terminal_decision() {
        let engine = engine();
        let ctx = PageContext::new("https://example.com");
        assert!(!engine.should_continue(&ctx, &Decision::stop("done")));
    }

    #[test]
    fn test_diminishing_returns_stop() {
        let engine = engine();
        let mut ctx = PageContext::new("https://example.com");
        ctx.evidence_count = 25; // past diminishing-returns threshold

        let low_value = Decision::run(names::SECURITY_SCAN, "test", 7, 2);
        assert!(!engine.should_continue(&ctx, &low_value));

        // Same estimate on a thin page continues
        ctx.evidence_count = 3;
        assert!(engine.should_continue(&ctx, &low_value));
    }

    #[test]
    fn test_estimates_decay_with_loop_count() {
        let mut ctx = PageContext::new("https://example.com/docs");
        let fresh = engine().decide(&ctx).expected_evidence;

        ctx.loop_count = 3;
        let aged = engine().decide(&ctx).expected_evidence;
        assert!(aged < fresh);
    }
}
