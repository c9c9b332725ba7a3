//! Tool executor: runs one named capability against one URL.
//!
//! The executor is the engine's failure boundary. Whatever happens inside a
//! capability - a panic-free error, a timeout, an unknown name - the caller
//! receives a degraded `ToolExecution` with `success: false` and empty
//! evidence, never an `Err`. The decision loop then simply sees zero new
//! evidence and picks a different next step.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::tools::{Capability, ToolOutput};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::EvidenceItem;
use crate::types::page::{PageCharacteristics, PageContext};

/// Result of one capability run, degraded on failure.
#[derive(Debug)]
pub struct ToolExecution {
    pub tool: String,
    pub success: bool,
    pub evidence: Vec<EvidenceItem>,
    pub characteristics: PageCharacteristics,
    pub duration_ms: u64,
    /// Failure description when `success` is false
    pub error: Option<String>,
}

impl ToolExecution {
    fn failed(tool: &str, error: String, duration_ms: u64) -> Self {
        Self {
            tool: tool.to_string(),
            success: false,
            evidence: Vec::new(),
            characteristics: PageCharacteristics::new(),
            duration_ms,
            error: Some(error),
        }
    }
}

/// Registry and runner for named capabilities.
pub struct ToolExecutor {
    tools: HashMap<String, Arc<dyn Capability>>,
    timeout: Duration,
}

impl ToolExecutor {
    /// Create an empty executor.
    pub fn new(timeout: Duration) -> Self {
        Self {
            tools: HashMap::new(),
            timeout,
        }
    }

    /// Create an executor with the standard capability set, all backed by
    /// the given fetcher.
    pub fn standard(fetcher: Arc<dyn PageFetcher>, timeout: Duration) -> Self {
        Self::new(timeout)
            .with_capability(Arc::new(crate::tools::HtmlCollector::new(fetcher.clone())))
            .with_capability(Arc::new(crate::tools::RenderedContent::new(fetcher.clone())))
            .with_capability(Arc::new(crate::tools::TechStackAnalysis::new(
                fetcher.clone(),
            )))
            .with_capability(Arc::new(crate::tools::SecurityScan::new(fetcher.clone())))
            .with_capability(Arc::new(crate::tools::ApiExtraction::new(fetcher)))
    }

    /// Register a capability under its own name.
    pub fn with_capability(mut self, capability: Arc<dyn Capability>) -> Self {
        self.tools.insert(capability.name().to_string(), capability);
        self
    }

    /// Registered capability names.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Run one capability against one URL.
    ///
    /// Never returns an error: unknown tools, capability failures and
    /// timeouts all degrade to `success: false` with empty evidence.
    pub async fn execute(&self, tool: &str, url: &str, ctx: &PageContext) -> ToolExecution {
        let started = Instant::now();

        let capability = match self.tools.get(tool) {
            Some(c) => c.clone(),
            None => {
                warn!(tool = %tool, "Unknown tool requested");
                return ToolExecution::failed(tool, format!("unknown tool: {}", tool), 0);
            }
        };

        debug!(tool = %tool, url = %url, "Executing tool");

        let outcome = tokio::time::timeout(self.timeout, capability.run(url, ctx)).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(ToolOutput {
                evidence,
                characteristics,
            })) => {
                debug!(
                    tool = %tool,
                    url = %url,
                    evidence = evidence.len(),
                    duration_ms = duration_ms,
                    "Tool completed"
                );
                ToolExecution {
                    tool: tool.to_string(),
                    success: true,
                    evidence,
                    characteristics,
                    duration_ms,
                    error: None,
                }
            }
            Ok(Err(e)) => {
                warn!(tool = %tool, url = %url, error = %e, "Tool failed");
                ToolExecution::failed(tool, e.to_string(), duration_ms)
            }
            Err(_) => {
                warn!(
                    tool = %tool,
                    url = %url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Tool timed out"
                );
                ToolExecution::failed(
                    tool,
                    format!("timed out after {}ms", self.timeout.as_millis()),
                    duration_ms,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::testing::ScriptedCapability;
    use async_trait::async_trait;

    struct FailingCapability;

    #[async_trait]
    impl Capability for FailingCapability {
        fn name(&self) -> &str {
            "failing-tool"
        }

        async fn run(&self, _url: &str, _ctx: &PageContext) -> crate::error::ToolResult<ToolOutput> {
            Err(ToolError::Extraction {
                tool: "failing-tool".to_string(),
                reason: "regex blew up".to_string(),
            })
        }
    }

    struct SlowCapability;

    #[async_trait]
    impl Capability for SlowCapability {
        fn name(&self) -> &str {
            "slow-tool"
        }

        async fn run(&self, _url: &str, _ctx: &PageContext) -> crate::error::ToolResult<ToolOutput> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ToolOutput::new())
        }
    }

    #[tokio::test]
    async fn test_capability_error_degrades_to_unsuccessful_result() {
        let executor =
            ToolExecutor::new(Duration::from_secs(5)).with_capability(Arc::new(FailingCapability));
        let ctx = PageContext::new("https://example.com");

        let result = executor.execute("failing-tool", "https://example.com", &ctx).await;

        assert!(!result.success);
        assert!(result.evidence.is_empty());
        assert!(result.error.as_deref().unwrap().contains("regex blew up"));
    }

    #[tokio::test]
    async fn test_unknown_tool_degrades() {
        let executor = ToolExecutor::new(Duration::from_secs(5));
        let ctx = PageContext::new("https://example.com");

        let result = executor.execute("nope", "https://example.com", &ctx).await;
        assert!(!result.success);
        assert!(result.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_degrades() {
        let executor =
            ToolExecutor::new(Duration::from_millis(50)).with_capability(Arc::new(SlowCapability));
        let ctx = PageContext::new("https://example.com");

        let result = executor.execute("slow-tool", "https://example.com", &ctx).await;
        assert!(!result.success);
        assert!(result.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_successful_run_carries_evidence() {
        let scripted = ScriptedCapability::new("scripted").yielding(3);
        let executor = ToolExecutor::new(Duration::from_secs(5)).with_capability(Arc::new(scripted));
        let ctx = PageContext::new("https://example.com");

        let result = executor.execute("scripted", "https://example.com", &ctx).await;
        assert!(result.success);
        assert_eq!(result.evidence.len(), 3);
    }
}
