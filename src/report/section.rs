//! Section Sub-workflow
//!
//! Produces the finished content for one research-backed section:
//! generate queries, search the web, write the section. Each step absorbs
//! its own failures so a broken provider call degrades this section alone,
//! never its siblings.

use crate::report::clients::ClientFactory;
use crate::report::prompts::{section_query_generator_prompt, section_writer_prompt};
use crate::report::state::{QueryList, Section};
use crate::search::{format_search_results, run_search_queries, SearchQuery};
use std::sync::Arc;
use tracing::{error, info};

/// Queries generated per section.
const SECTION_QUERY_COUNT: usize = 4;
/// Results requested per section query.
const SECTION_MAX_RESULTS: usize = 4;
/// Token budget for a section's source context.
const SECTION_CONTEXT_TOKENS: usize = 4000;

/// Placeholder written when the LLM call fails, so the compile step never
/// sees a missing content field for an attempted section.
pub const SECTION_WRITE_FAILURE_PLACEHOLDER: &str =
    "Error: Could not generate content due to API issues.";

/// Run the full sub-workflow for one section and return it completed.
pub async fn build_section(mut section: Section, factory: Arc<dyn ClientFactory>) -> Section {
    let queries = generate_queries(&section, factory.as_ref()).await;
    let source_context = search_web(&queries, factory.as_ref()).await;
    write_section(&mut section, &source_context, factory.as_ref()).await;
    section
}

/// Generate search queries for a specific report section. A failed call
/// yields no queries; the section still proceeds against empty context.
async fn generate_queries(section: &Section, factory: &dyn ClientFactory) -> Vec<SearchQuery> {
    info!(section = %section.name, "generating search queries for section");

    let result: crate::types::AppResult<QueryList> = async {
        let llm = factory.llm()?;
        llm.generate_structured(
            QueryList::response_schema(),
            &section_query_generator_prompt(&section.description, SECTION_QUERY_COUNT),
            "Generate search queries on the provided topic.",
        )
        .await
    }
    .await;

    match result {
        Ok(mut query_list) => {
            query_list.queries.truncate(SECTION_QUERY_COUNT);
            query_list.queries
        }
        Err(e) => {
            error!(section = %section.name, error = %e, "query generation failed, proceeding without queries");
            Vec::new()
        }
    }
}

/// Search the web for each query and format the sources into one
/// deduplicated context string.
async fn search_web(queries: &[SearchQuery], factory: &dyn ClientFactory) -> String {
    let batches = run_search_queries(factory.search(), queries, SECTION_MAX_RESULTS, true).await;
    format_search_results(&batches, SECTION_CONTEXT_TOKENS, true)
}

/// Write the section from its source context. On failure the content is
/// set to a visible placeholder instead of being left empty.
async fn write_section(section: &mut Section, source_context: &str, factory: &dyn ClientFactory) {
    info!(section = %section.name, "writing section");

    let result = async {
        let llm = factory.llm()?;
        llm.generate_text(
            &section_writer_prompt(&section.name, &section.description, source_context),
            "Generate a report section based on the provided sources.",
        )
        .await
    }
    .await;

    match result {
        Ok(content) => section.content = content,
        Err(e) => {
            error!(section = %section.name, error = %e, "section writing failed, using placeholder content");
            section.content = SECTION_WRITE_FAILURE_PLACEHOLDER.to_string();
        }
    }

    info!(section = %section.name, "writing section completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{LLMAdapter, LlmClient};
    use crate::search::{SearchApi, SearchDepth, SearchDocument, SearchResponse};
    use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};
    use async_trait::async_trait;

    struct ScriptedFactory {
        llm_content: Option<String>,
        search_available: bool,
    }

    struct ScriptedAdapter {
        content: String,
    }

    #[async_trait]
    impl LLMAdapter for ScriptedAdapter {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            let content = if request.response_schema.is_some() {
                r#"{"queries": [{"search_query": "battery supply chain 2024"}]}"#.to_string()
            } else {
                self.content.clone()
            };
            Ok(LLMResponse {
                content,
                finish_reason: "stop".to_string(),
                usage: Default::default(),
            })
        }
    }

    struct StubSearch;

    #[async_trait]
    impl SearchApi for StubSearch {
        async fn search(
            &self,
            query: &str,
            _max_results: usize,
            _depth: SearchDepth,
            _include_raw_content: bool,
        ) -> AppResult<SearchResponse> {
            Ok(SearchResponse {
                results: vec![SearchDocument {
                    title: query.to_string(),
                    url: format!("https://example.com/{query}"),
                    content: "snippet".to_string(),
                    raw_content: Some("full text".to_string()),
                }],
            })
        }
    }

    impl ClientFactory for ScriptedFactory {
        fn llm(&self) -> AppResult<LlmClient> {
            match &self.llm_content {
                Some(content) => Ok(LlmClient::from_adapter(
                    Box::new(ScriptedAdapter {
                        content: content.clone(),
                    }),
                    "gpt-4o",
                )),
                None => Err(AppError::Provider("no API key".to_string())),
            }
        }

        fn search(&self) -> AppResult<Box<dyn SearchApi>> {
            if self.search_available {
                Ok(Box::new(StubSearch))
            } else {
                Err(AppError::Provider("no search key".to_string()))
            }
        }
    }

    fn research_section() -> Section {
        Section {
            name: "Battery Supply Chains".to_string(),
            description: "Mining, refining, logistics".to_string(),
            requires_research: true,
            content: String::new(),
        }
    }

    #[tokio::test]
    async fn test_build_section_writes_content() {
        let factory = Arc::new(ScriptedFactory {
            llm_content: Some("## Battery Supply Chains\n\nWritten.".to_string()),
            search_available: true,
        });
        let section = build_section(research_section(), factory).await;
        assert_eq!(section.content, "## Battery Supply Chains\n\nWritten.");
    }

    #[tokio::test]
    async fn test_llm_failure_yields_placeholder_content() {
        let factory = Arc::new(ScriptedFactory {
            llm_content: None,
            search_available: true,
        });
        let section = build_section(research_section(), factory).await;
        assert_eq!(section.content, SECTION_WRITE_FAILURE_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_search_outage_still_writes_section() {
        let factory = Arc::new(ScriptedFactory {
            llm_content: Some("written without sources".to_string()),
            search_available: false,
        });
        let section = build_section(research_section(), factory).await;
        assert_eq!(section.content, "written without sources");
    }
}
