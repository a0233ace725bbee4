//! Web Search Layer
//!
//! Runs batches of search queries against the web-search provider and
//! condenses the results into a single deduplicated, token-bounded context
//! block for the section writers.
//!
//! Provider responses are not uniform: a batch may arrive as a whole
//! response object, a bare list of documents, or a single document. The
//! [`SearchBatch`] union normalizes all of them at the boundary so the rest
//! of the aggregator only ever sees one flat document list.

pub mod tavily;

use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use futures::future::join_all;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// One retrieved source. Uniqueness is by `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocument {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    /// Full page text, only present when requested.
    #[serde(default)]
    pub raw_content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchDocument>,
}

/// A single query string. The structured-output step sometimes wraps the
/// text in a `{"search_query": ...}` object; both shapes deserialize here
/// and [`SearchQuery::as_text`] unwraps either.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchQuery {
    Plain(String),
    Structured { search_query: String },
}

impl SearchQuery {
    pub fn as_text(&self) -> &str {
        match self {
            SearchQuery::Plain(text) => text,
            SearchQuery::Structured { search_query } => search_query,
        }
    }
}

impl From<&str> for SearchQuery {
    fn from(s: &str) -> Self {
        SearchQuery::Plain(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDepth {
    Basic,
    Advanced,
}

impl SearchDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }
}

/// Capability interface for the web-search provider.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        depth: SearchDepth,
        include_raw_content: bool,
    ) -> AppResult<SearchResponse>;
}

/// The provider response shapes seen in the wild: a response object with a
/// nested `results` list, a bare list of documents, or one bare document.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SearchBatch {
    Response(SearchResponse),
    Documents(Vec<SearchDocument>),
    Single(SearchDocument),
}

impl SearchBatch {
    fn documents(&self) -> &[SearchDocument] {
        match self {
            SearchBatch::Response(response) => &response.results,
            SearchBatch::Documents(documents) => documents,
            SearchBatch::Single(document) => std::slice::from_ref(document),
        }
    }
}

/// Run every query concurrently against the provider.
///
/// An individual query failure is logged and its batch omitted. Failing to
/// construct the provider client at all (`client` is `Err`, e.g. missing
/// credentials) yields an empty list so downstream stages degrade to "no
/// search context" instead of aborting. No retries.
pub async fn run_search_queries(
    client: AppResult<Box<dyn SearchApi>>,
    queries: &[SearchQuery],
    max_results: usize,
    include_raw_content: bool,
) -> Vec<SearchBatch> {
    let client = match client {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "search client unavailable, returning no results");
            return Vec::new();
        }
    };

    let searches = queries.iter().map(|query| {
        let query_text = query.as_text().to_string();
        let client = &client;
        async move {
            match client
                .search(
                    &query_text,
                    max_results,
                    SearchDepth::Advanced,
                    include_raw_content,
                )
                .await
            {
                Ok(response) => Some(SearchBatch::Response(response)),
                Err(e) => {
                    warn!(query = %query_text, error = %e, "search query failed, omitting result");
                    None
                }
            }
        }
    });

    let batches: Vec<SearchBatch> = join_all(searches).await.into_iter().flatten().collect();
    debug!(
        requested = queries.len(),
        returned = batches.len(),
        "search batch completed"
    );
    batches
}

static BPE: Lazy<CoreBPE> =
    Lazy::new(|| tiktoken_rs::cl100k_base().expect("cl100k_base vocabulary is embedded"));

/// Truncate `text` to at most `max_tokens` BPE tokens, so raw page content
/// cannot blow past the writer's context budget.
fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let tokens = BPE.encode_ordinary(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }
    BPE.decode(tokens[..max_tokens].to_vec())
        .unwrap_or_else(|_| text.chars().take(max_tokens * 4).collect())
}

/// Flatten heterogeneous batches, deduplicate by URL (first occurrence
/// wins), and format one block per unique source.
///
/// Returns the literal `"No search results found."` when nothing survives;
/// callers treat that as valid, non-error output.
pub fn format_search_results(
    batches: &[SearchBatch],
    max_tokens: usize,
    include_raw_content: bool,
) -> String {
    let mut seen_urls = HashSet::new();
    let mut unique_sources: Vec<&SearchDocument> = Vec::new();
    for batch in batches {
        for document in batch.documents() {
            if seen_urls.insert(document.url.clone()) {
                unique_sources.push(document);
            }
        }
    }

    if unique_sources.is_empty() {
        return "No search results found.".to_string();
    }

    let mut formatted = String::from("Content from web search:\n\n");
    for source in unique_sources {
        let title = if source.title.is_empty() {
            "Untitled"
        } else {
            &source.title
        };
        formatted.push_str(&format!("Source {}:\n===\n", title));
        formatted.push_str(&format!("URL: {}\n===\n", source.url));
        formatted.push_str(&format!(
            "Most relevant content from source: {}\n===\n",
            if source.content.is_empty() {
                "No content available"
            } else {
                &source.content
            }
        ));

        if include_raw_content {
            if let Some(raw) = source.raw_content.as_deref().filter(|r| !r.is_empty()) {
                formatted.push_str(&format!(
                    "Raw Content: {}\n\n",
                    truncate_to_tokens(raw, max_tokens)
                ));
            }
        }
    }

    formatted.trim_end().to_string()
}

impl From<tavily::SearchError> for AppError {
    fn from(e: tavily::SearchError) -> Self {
        AppError::Provider(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str, title: &str) -> SearchDocument {
        SearchDocument {
            title: title.to_string(),
            url: url.to_string(),
            content: format!("snippet for {}", title),
            raw_content: None,
        }
    }

    struct FlakySearch;

    #[async_trait]
    impl SearchApi for FlakySearch {
        async fn search(
            &self,
            query: &str,
            _max_results: usize,
            _depth: SearchDepth,
            _include_raw_content: bool,
        ) -> AppResult<SearchResponse> {
            if query.contains("boom") {
                return Err(AppError::Provider("simulated outage".to_string()));
            }
            Ok(SearchResponse {
                results: vec![doc(&format!("https://example.com/{query}"), query)],
            })
        }
    }

    #[tokio::test]
    async fn test_individual_query_failure_is_omitted() {
        let queries = vec![
            SearchQuery::from("alpha"),
            SearchQuery::from("boom"),
            SearchQuery::Structured {
                search_query: "beta".to_string(),
            },
        ];
        let batches =
            run_search_queries(Ok(Box::new(FlakySearch) as Box<dyn SearchApi>), &queries, 4, false)
                .await;
        assert_eq!(batches.len(), 2);
    }

    #[tokio::test]
    async fn test_client_construction_failure_returns_empty() {
        let queries = vec![SearchQuery::from("alpha")];
        let batches = run_search_queries(
            Err(AppError::Provider("no credentials".to_string())),
            &queries,
            4,
            false,
        )
        .await;
        assert!(batches.is_empty());
    }

    #[test]
    fn test_format_empty_is_fixed_literal() {
        assert_eq!(format_search_results(&[], 100, false), "No search results found.");
    }

    #[test]
    fn test_dedup_by_url_first_occurrence_wins() {
        let batches = vec![
            SearchBatch::Documents(vec![doc("https://a", "first"), doc("https://b", "b")]),
            SearchBatch::Single(doc("https://a", "duplicate")),
        ];
        let formatted = format_search_results(&batches, 100, false);
        assert!(formatted.contains("Source first:"));
        assert!(!formatted.contains("Source duplicate:"));
    }

    #[test]
    fn test_dedup_idempotence() {
        // Formatting batches containing duplicates equals formatting the
        // already-deduplicated batch once.
        let duplicated = vec![
            SearchBatch::Documents(vec![doc("https://a", "a"), doc("https://b", "b")]),
            SearchBatch::Documents(vec![doc("https://b", "b"), doc("https://a", "a")]),
        ];
        let deduplicated =
            vec![SearchBatch::Documents(vec![doc("https://a", "a"), doc("https://b", "b")])];
        assert_eq!(
            format_search_results(&duplicated, 100, false),
            format_search_results(&deduplicated, 100, false)
        );
    }

    #[test]
    fn test_flattens_all_batch_shapes() {
        let batches = vec![
            SearchBatch::Response(SearchResponse {
                results: vec![doc("https://r", "nested")],
            }),
            SearchBatch::Documents(vec![doc("https://l", "listed")]),
            SearchBatch::Single(doc("https://s", "single")),
        ];
        let formatted = format_search_results(&batches, 100, false);
        for title in ["nested", "listed", "single"] {
            assert!(formatted.contains(&format!("Source {}:", title)));
        }
    }

    #[test]
    fn test_raw_content_is_token_bounded() {
        let long_raw = "word ".repeat(5000);
        let mut source = doc("https://a", "a");
        source.raw_content = Some(long_raw.clone());
        let batches = vec![SearchBatch::Single(source)];

        let formatted = format_search_results(&batches, 50, true);
        let raw_section = formatted.split("Raw Content: ").nth(1).unwrap();
        assert!(BPE.encode_ordinary(raw_section.trim()).len() <= 50);
        assert!(formatted.len() < long_raw.len());
    }

    #[test]
    fn test_raw_content_skipped_when_not_requested() {
        let mut source = doc("https://a", "a");
        source.raw_content = Some("full page text".to_string());
        let formatted = format_search_results(&[SearchBatch::Single(source)], 100, false);
        assert!(!formatted.contains("Raw Content"));
    }

    #[test]
    fn test_query_unwrapping() {
        let wrapped: SearchQuery =
            serde_json::from_str(r#"{"search_query": "rust async"}"#).unwrap();
        assert_eq!(wrapped.as_text(), "rust async");
        let plain: SearchQuery = serde_json::from_str(r#""rust async""#).unwrap();
        assert_eq!(plain.as_text(), "rust async");
    }
}
