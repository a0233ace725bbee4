//! Tavily Client
//!
//! Thin HTTP client for the Tavily search API. One POST per query; the
//! aggregator in the parent module handles batching, failure isolation,
//! and result formatting.

use crate::search::{SearchApi, SearchDepth, SearchResponse};
use crate::types::AppResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

const TAVILY_API_BASE: &str = "https://api.tavily.com";

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Tavily API key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),
}

#[derive(Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
    include_raw_content: bool,
    include_answer: bool,
}

pub struct TavilyClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    /// Fails when no API key is configured, so callers construct the client
    /// lazily and degrade to an empty search batch.
    pub fn new(api_key: &str) -> Result<Self, SearchError> {
        if api_key.is_empty() {
            return Err(SearchError::NoApiKey);
        }
        Ok(Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: TAVILY_API_BASE.to_string(),
        })
    }

    /// Point the client at a different endpoint. Used by tests against a
    /// local mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchApi for TavilyClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        depth: SearchDepth,
        include_raw_content: bool,
    ) -> AppResult<SearchResponse> {
        info!(query = %query, depth = depth.as_str(), "searching via Tavily");

        let request = TavilySearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: depth.as_str(),
            include_raw_content,
            include_answer: false,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        debug!(query = %query, count = parsed.results.len(), "Tavily search completed");
        Ok(parsed)
    }
}
