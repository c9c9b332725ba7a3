//! Collection capabilities and the executor that runs them.
//!
//! A capability is one pluggable extraction technique invoked by name. All
//! capabilities sit behind the same contract so production implementations
//! and test doubles are interchangeable:
//!
//! - `html-collector` - basic page fetch and structural extraction
//! - `rendered-content` - embedded application-state extraction
//! - `tech-stack-analysis` - technology fingerprinting
//! - `security-scan` - security headers and compliance posture
//! - `api-extraction` - API surface discovery

pub mod api_docs;
pub mod executor;
pub mod html;
pub mod rendered;
pub mod security;
pub mod tech;

pub use api_docs::ApiExtraction;
pub use executor::{ToolExecution, ToolExecutor};
pub use html::HtmlCollector;
pub use rendered::RenderedContent;
pub use security::SecurityScan;
pub use tech::TechStackAnalysis;

use async_trait::async_trait;

use crate::error::{ToolError, ToolResult};
use crate::traits::fetcher::PageFetcher;
use crate::types::evidence::EvidenceItem;
use crate::types::page::{FetchedPage, PageCharacteristics, PageContext};

/// Registered capability names.
pub mod names {
    pub const HTML_COLLECTOR: &str = "html-collector";
    pub const RENDERED_CONTENT: &str = "rendered-content";
    pub const TECH_STACK: &str = "tech-stack-analysis";
    pub const SECURITY_SCAN: &str = "security-scan";
    pub const API_EXTRACTION: &str = "api-extraction";
}

/// What one capability run produced.
#[derive(Debug, Default)]
pub struct ToolOutput {
    pub evidence: Vec<EvidenceItem>,
    pub characteristics: PageCharacteristics,
}

impl ToolOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A pluggable extraction technique invoked by name through the executor.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Name this capability registers under.
    fn name(&self) -> &str;

    /// Run against one URL with the page's accumulated context.
    async fn run(&self, url: &str, ctx: &PageContext) -> ToolResult<ToolOutput>;
}

/// Fetch a page on behalf of a capability, mapping failures into the
/// capability error domain.
pub(crate) async fn fetch_for_tool(
    fetcher: &dyn PageFetcher,
    tool: &str,
    url: &str,
) -> ToolResult<FetchedPage> {
    fetcher
        .fetch(url)
        .await
        .map_err(|e| ToolError::from_fetch(tool, e))
}
