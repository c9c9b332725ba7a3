//! Fetched pages, observed page characteristics and per-URL loop state.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A fetched page with its response metadata.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL that was requested
    pub url: String,
    /// Final URL after redirects
    pub final_url: String,
    pub status: u16,
    /// Response headers, lowercased keys
    pub headers: HashMap<String, String>,
    pub html: String,
}

impl FetchedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            final_url: url.clone(),
            url,
            status: 200,
            headers: HashMap::new(),
            html: html.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_final_url(mut self, final_url: impl Into<String>) -> Self {
        self.final_url = final_url.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }
}

/// Signals observed about a page while tools run against it.
///
/// Backed by a string-keyed JSON map so capabilities can record arbitrary
/// observations; the typed accessors cover the signals the decision policy
/// reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageCharacteristics(pub HashMap<String, serde_json::Value>);

impl PageCharacteristics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    fn flag(&self, key: &str) -> bool {
        self.0.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Page appears to require JavaScript for meaningful content.
    pub fn has_javascript(&self) -> bool {
        self.flag("has_javascript")
    }

    /// Response carried at least one security header.
    pub fn security_headers_seen(&self) -> bool {
        self.flag("security_headers_seen")
    }

    /// Page content referenced API endpoints or API docs.
    pub fn api_indicators(&self) -> bool {
        self.flag("api_indicators")
    }

    pub fn content_length(&self) -> usize {
        self.0
            .get("content_length")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge observations from a tool run. Later observations win.
    pub fn merge(&mut self, other: &PageCharacteristics) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }
}

/// Accumulated state of tool usage and findings for one URL during its
/// decision loop.
///
/// Created on first visit, mutated once per loop iteration, and discarded
/// when the loop terminates - its evidence is folded into the global store,
/// the context itself is not persisted.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub url: String,
    /// Tools already run against this URL, in execution order
    pub tools_run: IndexSet<String>,
    pub characteristics: PageCharacteristics,
    pub loop_count: usize,
    /// Evidence gathered for this URL so far
    pub evidence_count: usize,
}

impl PageContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tools_run: IndexSet::new(),
            characteristics: PageCharacteristics::new(),
            loop_count: 0,
            evidence_count: 0,
        }
    }

    pub fn has_run(&self, tool: &str) -> bool {
        self.tools_run.contains(tool)
    }

    /// Apply one accepted decision's outcome: append the tool, merge
    /// characteristics, bump counters.
    pub fn apply(
        &mut self,
        tool: &str,
        characteristics: &PageCharacteristics,
        new_evidence: usize,
    ) {
        self.tools_run.insert(tool.to_string());
        self.characteristics.merge(characteristics);
        self.loop_count += 1;
        self.evidence_count += new_evidence;
    }
}
