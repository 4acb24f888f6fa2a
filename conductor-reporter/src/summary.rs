//! End-of-run summary: a human table and a machine-readable JSON document.

use colored::Colorize;
use conductor_loader::{LoadOutcome, LoadResult, SuiteClassification, SuiteResult};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::error::ReportError;

pub fn classification_label(classification: SuiteClassification) -> &'static str {
    match classification {
        SuiteClassification::Success => "SUCCESS",
        SuiteClassification::Degraded => "DEGRADED",
        SuiteClassification::CriticalFailure => "CRITICAL FAILURE",
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "component")]
    component: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "critical")]
    critical: &'static str,
    #[tabled(rename = "outcome")]
    outcome: String,
    #[tabled(rename = "elapsed")]
    elapsed: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl From<&LoadResult> for SummaryRow {
    fn from(result: &LoadResult) -> Self {
        let detail = match (&result.error_message, result.missing_dependencies.is_empty()) {
            (Some(message), _) => message.clone(),
            (None, false) => format!("missing: {}", result.missing_dependencies.join(", ")),
            (None, true) => String::new(),
        };
        Self {
            component: result.id().to_string(),
            name: result.descriptor.display_name.clone(),
            critical: if result.descriptor.critical { "yes" } else { "no" },
            outcome: result.outcome.to_string(),
            elapsed: format!("{} ms", result.elapsed_ms),
            detail,
        }
    }
}

/// Render the run as a headline plus a rounded table: successes first, then
/// failures, each in load order.
pub fn render_table(result: &SuiteResult) -> String {
    let classification = result.classification();
    let label = match classification {
        SuiteClassification::Success => classification_label(classification).green(),
        SuiteClassification::Degraded => classification_label(classification).yellow(),
        SuiteClassification::CriticalFailure => classification_label(classification).red(),
    };
    let headline = format!(
        "Conductor v{} | {} components | {} loaded | {} unconfirmed | {} failed | {} ms | {}",
        env!("CARGO_PKG_VERSION"),
        result.attempted(),
        result.successful.len(),
        result.unconfirmed().count(),
        result.failed.len(),
        result.total_elapsed_ms,
        label.bold(),
    );

    if result.attempted() == 0 {
        return format!("{headline}\nNo components in manifest.");
    }

    let rows: Vec<SummaryRow> = result
        .successful
        .iter()
        .chain(result.failed.iter())
        .map(SummaryRow::from)
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{headline}\n{table}")
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    classification: SuiteClassification,
    loaded: usize,
    unconfirmed: usize,
    failed: usize,
    total_elapsed_ms: u128,
    components: Vec<ComponentJson<'a>>,
}

#[derive(Serialize)]
struct ComponentJson<'a> {
    id: &'a str,
    name: &'a str,
    critical: bool,
    outcome: LoadOutcome,
    elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    missing_dependencies: &'a [String],
}

pub fn to_json(result: &SuiteResult) -> Result<String, ReportError> {
    let payload = SummaryJson {
        classification: result.classification(),
        loaded: result.successful.len(),
        unconfirmed: result.unconfirmed().count(),
        failed: result.failed.len(),
        total_elapsed_ms: result.total_elapsed_ms,
        components: result
            .successful
            .iter()
            .chain(result.failed.iter())
            .map(|r| ComponentJson {
                id: r.id(),
                name: &r.descriptor.display_name,
                critical: r.descriptor.critical,
                outcome: r.outcome,
                elapsed_ms: r.elapsed_ms,
                error: r.error_message.as_deref(),
                missing_dependencies: &r.missing_dependencies,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&payload)?)
}
