//! Report Workflow Orchestrator
//!
//! The top-level pipeline:
//!
//! ```text
//! PLANNING
//!     │
//!     ▼
//! RESEARCH_FANOUT ──► one section sub-workflow per research section,
//!     │               all in flight at once
//!     ▼
//! RESEARCH_JOIN ────► barrier, then format the research context
//!     │
//!     ▼
//! FINAL_FANOUT ─────► one synthesis call per non-research section
//!     │
//!     ▼
//! FINAL_JOIN ───────► barrier
//!     │
//!     ▼
//! COMPILE ──────────► merge by name onto planned order, escape, join
//!     │
//!     ▼
//! DONE
//! ```
//!
//! Failures below COMPILE are absorbed where they happen and show up as
//! degraded content; the machine always reaches DONE. The one exception is
//! COMPILE's missing-section check (see `compile`). Branches within a
//! fan-out share nothing but the append-only completed set and are merged
//! only at the join barrier.

use crate::report::clients::ClientFactory;
use crate::report::compile::compile_final_report;
use crate::report::planner::generate_report_plan;
use crate::report::section::build_section;
use crate::report::state::{format_sections, ReportState, Section};
use crate::report::synthesis::write_final_section;
use crate::types::AppResult;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Workflow steps a planned section costs: a research section runs query
/// generation, search, and writing; a synthesized section runs one write.
const RESEARCH_SECTION_STEPS: usize = 3;
const FINAL_SECTION_STEPS: usize = 1;
/// Planning and compilation.
const FIXED_STEPS: usize = 2;

pub const DEFAULT_RECURSION_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Planning,
    ResearchFanout,
    ResearchJoin,
    FinalFanout,
    FinalJoin,
    Compile,
    Done,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowStage::Planning => "planning",
            WorkflowStage::ResearchFanout => "researching sections",
            WorkflowStage::ResearchJoin => "merging research",
            WorkflowStage::FinalFanout => "writing final sections",
            WorkflowStage::FinalJoin => "merging final sections",
            WorkflowStage::Compile => "compiling report",
            WorkflowStage::Done => "done",
        };
        write!(f, "{}", label)
    }
}

pub struct WorkflowOptions {
    /// Caps total plan/fan-out steps to bound runaway plans.
    pub recursion_limit: usize,
    /// Optional channel for stage transitions, consumed by callers that
    /// poll a long-running run for progress.
    pub progress: Option<mpsc::UnboundedSender<WorkflowStage>>,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            progress: None,
        }
    }
}

impl WorkflowOptions {
    fn advance(&self, stage: WorkflowStage) {
        if let Some(progress) = &self.progress {
            // The receiver may have hung up; the run continues regardless.
            let _ = progress.send(stage);
        }
    }
}

/// Run the full report workflow for one topic.
///
/// Always completes unless a planned section's writer loses its result
/// (`AppError::MissingSection`). A run whose planning failed entirely
/// returns an empty string, which callers treat as a valid failure signal
/// distinct from an error.
pub async fn generate_report(
    topic: &str,
    factory: Arc<dyn ClientFactory>,
    options: WorkflowOptions,
) -> AppResult<String> {
    let mut state = ReportState::new(topic);

    options.advance(WorkflowStage::Planning);
    state.sections = generate_report_plan(topic, factory.as_ref()).await;
    apply_recursion_limit(&mut state.sections, options.recursion_limit);

    options.advance(WorkflowStage::ResearchFanout);
    let research_sections: Vec<Section> = state
        .sections
        .iter()
        .filter(|s| s.requires_research)
        .cloned()
        .collect();
    let completed = join_all(
        research_sections
            .into_iter()
            .map(|section| build_section(section, factory.clone())),
    )
    .await;

    options.advance(WorkflowStage::ResearchJoin);
    state.completed_sections.extend(completed);
    state.research_context = format_sections(&state.completed_sections);

    options.advance(WorkflowStage::FinalFanout);
    let final_sections: Vec<Section> = state
        .sections
        .iter()
        .filter(|s| !s.requires_research)
        .cloned()
        .collect();
    let research_context = state.research_context.clone();
    let completed = join_all(final_sections.into_iter().map(|section| {
        let context = research_context.clone();
        let factory = factory.clone();
        async move { write_final_section(section, &context, factory).await }
    }))
    .await;

    options.advance(WorkflowStage::FinalJoin);
    state.completed_sections.extend(completed);

    options.advance(WorkflowStage::Compile);
    let report = compile_final_report(&mut state)?;

    options.advance(WorkflowStage::Done);
    Ok(report)
}

/// Drop planned sections from the tail until the total step count fits the
/// limit.
fn apply_recursion_limit(sections: &mut Vec<Section>, limit: usize) {
    let step_cost = |sections: &[Section]| {
        FIXED_STEPS
            + sections
                .iter()
                .map(|s| {
                    if s.requires_research {
                        RESEARCH_SECTION_STEPS
                    } else {
                        FINAL_SECTION_STEPS
                    }
                })
                .sum::<usize>()
    };

    while !sections.is_empty() && step_cost(sections) > limit {
        if let Some(dropped) = sections.pop() {
            warn!(
                section = %dropped.name,
                limit,
                "recursion limit exceeded, dropping planned section"
            );
        }
    }

    info!(
        section_count = sections.len(),
        steps = step_cost(sections),
        "section plan within step budget"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::{LLMAdapter, LlmClient};
    use crate::report::section::SECTION_WRITE_FAILURE_PLACEHOLDER;
    use crate::search::{SearchApi, SearchDepth, SearchDocument, SearchResponse};
    use crate::types::{AppError, AppResult, LLMRequest, LLMResponse};
    use async_trait::async_trait;

    /// Scripted model covering every call the workflow makes: planning
    /// queries, the section plan, section writing, and synthesis.
    struct ScriptedModel;

    const PLAN_JSON: &str = r#"{"sections": [
        {"name": "Introduction", "description": "Overview", "research": false, "content": ""},
        {"name": "Battery Supply Chains", "description": "Mining and refining", "research": true, "content": ""},
        {"name": "Charging Infrastructure", "description": "Networks and grid load", "research": true, "content": ""},
        {"name": "Conclusion", "description": "Summary", "research": false, "content": ""}
    ]}"#;

    fn extract_section_title(system: &str) -> String {
        system
            .lines()
            .skip_while(|line| !line.starts_with("Title for the section:"))
            .nth(1)
            .unwrap_or("unknown")
            .trim()
            .to_string()
    }

    #[async_trait]
    impl LLMAdapter for ScriptedModel {
        async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
            let system = &request.messages[0].content;
            let content = match request.response_schema.as_ref().map(|s| s.name.as_str()) {
                Some("query_list") => {
                    r#"{"queries": [{"search_query": "ev infrastructure 2024"}]}"#.to_string()
                }
                Some("section_list") => PLAN_JSON.to_string(),
                _ => {
                    let title = extract_section_title(system);
                    if system.contains("Available report content of already completed sections:") {
                        // Synthesis call: both completed research blocks must
                        // be present in the shared context.
                        let grounded =
                            system.contains("Section 1:") && system.contains("Section 2:");
                        format!(
                            "## {}\n\n{} Budget impact: $42 per charger.",
                            title,
                            if grounded { "Grounded." } else { "Ungrounded." }
                        )
                    } else {
                        format!("## {}\n\nBudget impact: $42 per charger.", title)
                    }
                }
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
                    title: "source".to_string(),
                    url: format!("https://example.com/{query}"),
                    content: "snippet".to_string(),
                    raw_content: None,
                }],
            })
        }
    }

    struct HappyFactory;

    impl ClientFactory for HappyFactory {
        fn llm(&self) -> AppResult<LlmClient> {
            Ok(LlmClient::from_adapter(Box::new(ScriptedModel), "gpt-4o"))
        }
        fn search(&self) -> AppResult<Box<dyn SearchApi>> {
            Ok(Box::new(StubSearch))
        }
    }

    struct BrokenFactory;

    impl ClientFactory for BrokenFactory {
        fn llm(&self) -> AppResult<LlmClient> {
            Err(AppError::Provider("API key not found".to_string()))
        }
        fn search(&self) -> AppResult<Box<dyn SearchApi>> {
            Err(AppError::Provider("API key not found".to_string()))
        }
    }

    #[tokio::test]
    async fn test_end_to_end_report_generation() {
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let report = generate_report(
            "Impact of electric vehicles on urban infrastructure",
            Arc::new(HappyFactory),
            WorkflowOptions {
                recursion_limit: DEFAULT_RECURSION_LIMIT,
                progress: Some(progress_tx),
            },
        )
        .await
        .unwrap();

        // All four sections, in planned order.
        let expected_order = [
            "## Introduction",
            "## Battery Supply Chains",
            "## Charging Infrastructure",
            "## Conclusion",
        ];
        let mut last = 0;
        for heading in expected_order {
            let position = report.find(heading).expect(heading);
            assert!(position >= last, "{} out of planned order", heading);
            last = position;
        }

        // Every bare dollar was escaped.
        assert!(report.contains("\\$42"));
        assert!(!report.replace("\\$", "").contains('$'));

        // The machine announced every stage through to DONE.
        let mut stages = Vec::new();
        while let Ok(stage) = progress_rx.try_recv() {
            stages.push(stage);
        }
        assert_eq!(
            stages,
            vec![
                WorkflowStage::Planning,
                WorkflowStage::ResearchFanout,
                WorkflowStage::ResearchJoin,
                WorkflowStage::FinalFanout,
                WorkflowStage::FinalJoin,
                WorkflowStage::Compile,
                WorkflowStage::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_research_context_reaches_final_sections() {
        // The scripted model marks each synthesis call "Grounded." only if
        // its prompt carried both completed research blocks.
        let report = generate_report(
            "Impact of electric vehicles on urban infrastructure",
            Arc::new(HappyFactory),
            WorkflowOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.matches("Grounded.").count(), 2);
        assert!(!report.contains("Ungrounded."));
        assert_eq!(report.matches("Budget impact").count(), 4);
    }

    #[tokio::test]
    async fn test_degraded_planning_returns_empty_report() {
        let report = generate_report(
            "any topic",
            Arc::new(BrokenFactory),
            WorkflowOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(report, "");
    }

    #[tokio::test]
    async fn test_recursion_limit_truncates_plan() {
        // 2 fixed steps + Introduction (1) + two research sections (3 each)
        // = 9 steps; a limit of 6 keeps only the first two sections.
        let report = generate_report(
            "Impact of electric vehicles on urban infrastructure",
            Arc::new(HappyFactory),
            WorkflowOptions {
                recursion_limit: 6,
                progress: None,
            },
        )
        .await
        .unwrap();
        assert!(report.contains("## Introduction"));
        assert!(report.contains("## Battery Supply Chains"));
        assert!(!report.contains("## Charging Infrastructure"));
        assert!(!report.contains("## Conclusion"));
    }

    #[test]
    fn test_apply_recursion_limit_keeps_fitting_plans() {
        let mut sections = vec![
            Section {
                name: "A".to_string(),
                description: String::new(),
                requires_research: true,
                content: String::new(),
            },
            Section {
                name: "B".to_string(),
                description: String::new(),
                requires_research: false,
                content: String::new(),
            },
        ];
        apply_recursion_limit(&mut sections, DEFAULT_RECURSION_LIMIT);
        assert_eq!(sections.len(), 2);
    }

    #[tokio::test]
    async fn test_placeholder_content_still_compiles() {
        // Writer failures degrade to placeholder content, so COMPILE still
        // finds every planned name.
        struct PlanOnlyFactory;

        struct PlanOnlyModel;

        #[async_trait]
        impl LLMAdapter for PlanOnlyModel {
            async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
                match request.response_schema.as_ref().map(|s| s.name.as_str()) {
                    Some("query_list") => Ok(LLMResponse {
                        content: r#"{"queries": []}"#.to_string(),
                        finish_reason: "stop".to_string(),
                        usage: Default::default(),
                    }),
                    Some("section_list") => Ok(LLMResponse {
                        content: PLAN_JSON.to_string(),
                        finish_reason: "stop".to_string(),
                        usage: Default::default(),
                    }),
                    _ => Err(AppError::Provider("writer outage".to_string())),
                }
            }
        }

        impl ClientFactory for PlanOnlyFactory {
            fn llm(&self) -> AppResult<LlmClient> {
                Ok(LlmClient::from_adapter(Box::new(PlanOnlyModel), "gpt-4o"))
            }
            fn search(&self) -> AppResult<Box<dyn SearchApi>> {
                Err(AppError::Provider("search outage".to_string()))
            }
        }

        let report = generate_report(
            "any topic",
            Arc::new(PlanOnlyFactory),
            WorkflowOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(report.matches(SECTION_WRITE_FAILURE_PLACEHOLDER).count(), 4);
    }
}
