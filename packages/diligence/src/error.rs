//! Typed errors for the evidence-collection engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Most errors never reach the caller: fetch failures are swallowed at the
//! discovery boundary, capability failures are degraded to unsuccessful
//! tool executions. Only a malformed request surfaces as a hard error.

use thiserror::Error;

/// Errors that can occur during a collection run.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Request was missing required fields
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Page fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Tool execution failed
    #[error("tool failed: {0}")]
    Tool(#[from] ToolError),

    /// Search provider unavailable or failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Malformed evidence encountered during dedup/scoring
    #[error("aggregation error: {reason}")]
    Aggregation { reason: String },

    /// Evidence sink rejected a write
    #[error("sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Run was cancelled
    #[error("collection cancelled")]
    Cancelled,

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Security validation failed
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// HTTP request failed (connect, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-2xx response
    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Connection or response timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors raised inside a collection capability.
///
/// The [`ToolExecutor`](crate::tools::ToolExecutor) converts every one of
/// these into an unsuccessful execution result; they never cross the
/// executor boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No capability registered under this name
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// Capability-internal failure
    #[error("tool {tool} failed: {source}")]
    Execution {
        tool: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Parse/regex failure inside a capability
    #[error("tool {tool} extraction failed: {reason}")]
    Extraction { tool: String, reason: String },

    /// Capability exceeded its deadline
    #[error("tool {tool} timed out after {ms}ms on {url}")]
    Timeout { tool: String, url: String, ms: u64 },
}

impl ToolError {
    /// Wrap a fetch failure as a capability execution failure.
    pub fn from_fetch(tool: impl Into<String>, err: FetchError) -> Self {
        Self::Execution {
            tool: tool.into(),
            source: Box::new(err),
        }
    }
}

/// Security-related errors, primarily for SSRF protection.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal IPs)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, CollectError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for capability operations.
pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Result type alias for security validation.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
