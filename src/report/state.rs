//! Report State and Section Model
//!
//! The shared data structures threaded through every workflow stage.
//! `Section` identity is its `name`; the orchestrator merges parallel
//! results back into plan order by name, so name uniqueness is owned by
//! the planner (see [`disambiguate_section_names`]).

use crate::search::SearchQuery;
use crate::types::ResponseSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One titled unit of the final report.
///
/// Created exactly once by the planner with empty content, then written
/// exactly once by either the research writer or the final-section writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Name for this section of the report. Unique within a report.
    pub name: String,
    /// Brief overview of the main topics and concepts covered in this section.
    pub description: String,
    /// Whether to perform web search for this section of the report.
    #[serde(rename = "research")]
    pub requires_research: bool,
    /// The content for this section. Empty until written.
    #[serde(default)]
    pub content: String,
}

/// Structured-output wrapper: the planner asks the model for all sections
/// of the report at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionList {
    pub sections: Vec<Section>,
}

impl SectionList {
    pub fn response_schema() -> ResponseSchema {
        ResponseSchema {
            name: "section_list".to_string(),
            schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "sections": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "name": { "type": "string" },
                                "description": { "type": "string" },
                                "research": { "type": "boolean" },
                                "content": { "type": "string" }
                            },
                            "required": ["name", "description", "research", "content"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["sections"],
                "additionalProperties": false
            }),
        }
    }
}

/// Structured-output wrapper for a batch of web search queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryList {
    pub queries: Vec<SearchQuery>,
}

impl QueryList {
    pub fn response_schema() -> ResponseSchema {
        ResponseSchema {
            name: "query_list".to_string(),
            schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "queries": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "search_query": { "type": "string" }
                            },
                            "required": ["search_query"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["queries"],
                "additionalProperties": false
            }),
        }
    }
}

/// The orchestration-wide accumulator. Lives for one run and is discarded
/// once the final report string has been returned.
#[derive(Debug, Clone, Default)]
pub struct ReportState {
    pub topic: String,
    /// Ordered section plan, fixed after planning.
    pub sections: Vec<Section>,
    /// Append-only collection each parallel branch contributes exactly one
    /// section to. Unordered with respect to the plan.
    pub completed_sections: Vec<Section>,
    /// Formatted text of the completed research sections, derived once
    /// after the research join.
    pub research_context: String,
    pub final_report: String,
}

impl ReportState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }
}

/// Format a list of report sections into a single text string, used as
/// grounding context for the sections that synthesize rather than research.
pub fn format_sections(sections: &[Section]) -> String {
    let divider = "=".repeat(60);
    let mut formatted = String::new();
    for (idx, section) in sections.iter().enumerate() {
        formatted.push_str(&format!(
            "\n{divider}\nSection {number}: {name}\n{divider}\nDescription:\n{description}\nRequires Research:\n{requires_research}\n\nContent:\n{content}\n\n",
            number = idx + 1,
            name = section.name,
            description = section.description,
            requires_research = section.requires_research,
            content = if section.content.is_empty() {
                "[Not yet written]"
            } else {
                &section.content
            },
        ));
    }
    formatted
}

/// Rename later duplicates so every planned section name is unique.
///
/// The compile step merges parallel results by name; a silent collision
/// there would drop a section, so collisions are resolved here where the
/// plan is born.
pub fn disambiguate_section_names(sections: &mut [Section]) {
    let mut used: HashSet<String> = HashSet::new();
    for section in sections.iter_mut() {
        if used.insert(section.name.clone()) {
            continue;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{} ({})", section.name, n);
            if used.insert(candidate.clone()) {
                section.name = candidate;
                break;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, research: bool) -> Section {
        Section {
            name: name.to_string(),
            description: format!("about {}", name),
            requires_research: research,
            content: String::new(),
        }
    }

    #[test]
    fn test_section_deserializes_planner_shape() {
        let section: Section = serde_json::from_str(
            r#"{"name": "Battery Supply Chains",
                "description": "Mining and refining",
                "research": true,
                "content": ""}"#,
        )
        .unwrap();
        assert!(section.requires_research);
        assert!(section.content.is_empty());
    }

    #[test]
    fn test_format_sections_marks_unwritten_content() {
        let mut written = section("Charging", true);
        written.content = "Charging networks are growing.".to_string();
        let formatted = format_sections(&[written, section("Grid", true)]);

        assert!(formatted.contains("Section 1: Charging"));
        assert!(formatted.contains("Charging networks are growing."));
        assert!(formatted.contains("Section 2: Grid"));
        assert!(formatted.contains("[Not yet written]"));
    }

    #[test]
    fn test_disambiguate_renames_later_duplicates() {
        let mut sections = vec![
            section("Overview", false),
            section("Overview", true),
            section("Overview", true),
        ];
        disambiguate_section_names(&mut sections);
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Overview", "Overview (2)", "Overview (3)"]);
    }

    #[test]
    fn test_disambiguate_avoids_manufactured_collisions() {
        let mut sections = vec![
            section("Overview", false),
            section("Overview (2)", true),
            section("Overview", true),
        ];
        disambiguate_section_names(&mut sections);
        let names: Vec<&str> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Overview", "Overview (2)", "Overview (3)"]);
    }
}
