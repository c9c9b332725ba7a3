//! Web searcher trait for external discovery.
//!
//! Crawling only sees what the target links to. The phased search passes
//! use this trait to reach evidence the site itself never mentions:
//! funding coverage, competitor comparisons, leadership profiles. Any
//! web-search backend suffices.

use async_trait::async_trait;

use crate::error::{CollectError, Result};
use crate::security::SecretString;

/// A search hit with the metadata the evidence extractors read.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,

    /// Title of the result (if the provider returned one).
    pub title: Option<String>,

    /// Snippet/description from the result page.
    pub snippet: Option<String>,

    /// Relevance score (0.0-1.0, if provided by the search API).
    pub score: Option<f32>,
}

impl SearchResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
            score: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Web search trait for open-world discovery.
///
/// # Implementations
///
/// - `TavilyWebSearcher` - Tavily API
/// - `MockWebSearcher` - For testing
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web for results relevant to the query.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    /// Search with a specific result limit.
    async fn search_with_limit(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let mut results = self.search(query).await?;
        results.truncate(limit);
        Ok(results)
    }
}

/// Mock web searcher for testing.
#[derive(Default)]
pub struct MockWebSearcher {
    results: std::sync::RwLock<std::collections::HashMap<String, Vec<SearchResult>>>,
    queries: std::sync::RwLock<Vec<String>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add results for an exact query.
    pub fn with_results(self, query: &str, results: Vec<SearchResult>) -> Self {
        self.results
            .write()
            .unwrap()
            .insert(query.to_string(), results);
        self
    }

    /// Add URL/snippet pairs as results for a query.
    pub fn with_snippets(self, query: &str, hits: &[(&str, &str)]) -> Self {
        let results = hits
            .iter()
            .map(|(url, snippet)| SearchResult::new(*url).with_snippet(*snippet))
            .collect();
        self.with_results(query, results)
    }

    /// Queries issued against this mock, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.queries.write().unwrap().push(query.to_string());
        Ok(self
            .results
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

/// Tavily-backed web searcher.
pub struct TavilyWebSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    /// Default number of results to return.
    pub default_limit: usize,
}

impl TavilyWebSearcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            client: reqwest::Client::new(),
            default_limit: 10,
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }
}

#[async_trait]
impl WebSearcher for TavilyWebSearcher {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.search_with_limit(query, self.default_limit).await
    }

    async fn search_with_limit(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        #[derive(serde::Serialize)]
        struct Request {
            query: String,
            search_depth: String,
            max_results: usize,
        }

        #[derive(serde::Deserialize)]
        struct Response {
            results: Vec<TavilyResult>,
        }

        #[derive(serde::Deserialize)]
        struct TavilyResult {
            url: String,
            title: Option<String>,
            content: Option<String>,
            score: Option<f32>,
        }

        let request = Request {
            query: query.to_string(),
            search_depth: "basic".to_string(),
            max_results: limit,
        };

        let response = self
            .client
            .post("https://api.tavily.com/search")
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| CollectError::Search(Box::new(e)))?;

        if !response.status().is_success() {
            return Err(CollectError::Search(Box::new(std::io::Error::other(
                format!("Tavily API error: {}", response.status()),
            ))));
        }

        let tavily_response: Response = response
            .json()
            .await
            .map_err(|e| CollectError::Search(Box::new(e)))?;

        let results = tavily_response
            .results
            .into_iter()
            .map(|r| {
                let mut result = SearchResult::new(r.url);
                if let Some(title) = r.title {
                    result = result.with_title(title);
                }
                if let Some(content) = r.content {
                    result = result.with_snippet(content);
                }
                if let Some(score) = r.score {
                    result = result.with_score(score);
                }
                result
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_web_searcher() {
        let searcher = MockWebSearcher::new().with_snippets(
            "\"Acme\" funding round",
            &[
                ("https://news.example.com/acme-series-b", "Acme raises $40M Series B"),
                ("https://example.org/acme", "Acme profile"),
            ],
        );

        let results = searcher.search("\"Acme\" funding round").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://news.example.com/acme-series-b");
        assert_eq!(searcher.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_query_is_empty_not_error() {
        let searcher = MockWebSearcher::new();
        let results = searcher.search("anything").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_with_limit() {
        let searcher = MockWebSearcher::new().with_snippets(
            "q",
            &[
                ("https://a.com", "a"),
                ("https://b.com", "b"),
                ("https://c.com", "c"),
            ],
        );

        let results = searcher.search_with_limit("q", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
