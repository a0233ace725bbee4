//! Report Planner
//!
//! Turns the topic into an ordered section plan: derive a handful of
//! planning queries, ground them with a web-search pass, then ask the
//! model for the section outline. Any failure degrades to an empty plan;
//! the run still completes and yields an empty report.

use crate::report::clients::ClientFactory;
use crate::report::prompts::{
    report_plan_query_generator_prompt, report_plan_section_generator_prompt,
    DEFAULT_REPORT_STRUCTURE,
};
use crate::report::state::{disambiguate_section_names, QueryList, Section, SectionList};
use crate::search::{format_search_results, run_search_queries};
use crate::types::AppResult;
use tracing::{error, info};

/// Queries generated for the planning search pass.
const PLANNING_QUERY_COUNT: usize = 4;
/// Results requested per planning query.
const PLANNING_MAX_RESULTS: usize = 4;
/// Token budget for the planning search context.
const PLANNING_CONTEXT_TOKENS: usize = 2500;

/// Generate the overall plan for building the report.
pub async fn generate_report_plan(topic: &str, factory: &dyn ClientFactory) -> Vec<Section> {
    info!(topic = %topic, "generating report plan");

    match plan_sections(topic, factory).await {
        Ok(sections) => {
            info!(section_count = sections.len(), "report plan complete");
            sections
        }
        Err(e) => {
            error!(error = %e, "report planning failed, continuing with empty plan");
            Vec::new()
        }
    }
}

async fn plan_sections(topic: &str, factory: &dyn ClientFactory) -> AppResult<Vec<Section>> {
    let llm = factory.llm()?;
    let query_instructions =
        report_plan_query_generator_prompt(topic, DEFAULT_REPORT_STRUCTURE, PLANNING_QUERY_COUNT);
    let mut query_list: QueryList = llm
        .generate_structured(
            QueryList::response_schema(),
            &query_instructions,
            "Generate search queries that will help with planning the sections of the report.",
        )
        .await?;
    query_list.queries.truncate(PLANNING_QUERY_COUNT);

    let batches = run_search_queries(
        factory.search(),
        &query_list.queries,
        PLANNING_MAX_RESULTS,
        false,
    )
    .await;
    let search_context = if batches.is_empty() {
        "No search results available.".to_string()
    } else {
        format_search_results(&batches, PLANNING_CONTEXT_TOKENS, false)
    };

    let section_instructions =
        report_plan_section_generator_prompt(topic, DEFAULT_REPORT_STRUCTURE, &search_context);
    let llm = factory.llm()?;
    let section_list: SectionList = llm
        .generate_structured(
            SectionList::response_schema(),
            &section_instructions,
            "Generate the sections of the report. Your response must include a 'sections' field \
             containing a list of sections. Each section must have: name, description, research, \
             and content fields.",
        )
        .await?;

    let mut sections = section_list.sections;
    // The planner leaves content empty; clear anything the model slipped in.
    for section in &mut sections {
        section.content.clear();
    }
    disambiguate_section_names(&mut sections);
    Ok(sections)
}
