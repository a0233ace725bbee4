//! Report Compilation
//!
//! Reassembles the completed sections onto the original planned order and
//! joins them into the final document. This is the one stage that is
//! allowed to fail: a planned section with no completed counterpart means
//! the plan and the execution diverged, and silently shipping a report
//! with a hole would be worse than surfacing the mismatch.

use crate::report::state::{ReportState, Section};
use crate::types::{AppError, AppResult};
use std::collections::HashMap;
use tracing::info;

/// Compile the final report in planned order.
///
/// Fails with [`AppError::MissingSection`] when a planned section's name is
/// absent from the completed set.
pub fn compile_final_report(state: &mut ReportState) -> AppResult<String> {
    info!(
        planned = state.sections.len(),
        completed = state.completed_sections.len(),
        "compiling final report"
    );

    let completed_by_name: HashMap<&str, &str> = state
        .completed_sections
        .iter()
        .map(|s| (s.name.as_str(), s.content.as_str()))
        .collect();

    let mut contents: Vec<String> = Vec::with_capacity(state.sections.len());
    for section in &state.sections {
        let content = completed_by_name
            .get(section.name.as_str())
            .ok_or_else(|| AppError::MissingSection(section.name.clone()))?;
        contents.push((*content).to_string());
    }

    // Reassign content onto the planned order so the state reflects what
    // was shipped.
    for (section, content) in state.sections.iter_mut().zip(&contents) {
        section.content = content.clone();
    }

    let report = escape_dollar_signs(&contents.join("\n\n"));
    state.final_report = report.clone();

    info!(report_len = report.len(), "final report compiled");
    Ok(report)
}

/// Escape bare `$` characters for markdown rendering while leaving
/// already-escaped `\$` sequences untouched.
///
/// Pre-escaped sequences are masked with a marker, everything else is
/// escaped, then the marker is restored. The marker is extended until the
/// input provably does not contain it, so restoration can never corrupt
/// content.
pub fn escape_dollar_signs(text: &str) -> String {
    let marker = collision_free_marker(text);
    text.replace("\\$", &marker)
        .replace('$', "\\$")
        .replace(&marker, "\\$")
}

fn collision_free_marker(text: &str) -> String {
    let mut marker = String::from("\u{0}ESCAPED-DOLLAR\u{0}");
    while text.contains(&marker) {
        marker.push('\u{0}');
    }
    marker
}
