//! Analysis result display models

use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use super::common::{EMPTY, summarize_value};
use crate::cli::OutputFormat;
use crate::client::models::AnalysisResult;
use crate::error::Result;
use crate::orchestrator::MergedAnalysis;
use crate::output::{Formattable, json::format_json, table::format_table};

/// Longest section summary shown in a table cell
const SUMMARY_WIDTH: usize = 80;

/// One analysis section per row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct SectionRow {
    #[tabled(rename = "SECTION")]
    pub section: String,

    /// ready, missing or skipped
    #[tabled(rename = "STATUS")]
    pub status: String,

    #[tabled(rename = "SUMMARY")]
    pub summary: String,
}

impl SectionRow {
    fn new(section: &str, value: Option<&Value>, absent: &str) -> Self {
        match value {
            Some(value) => Self {
                section: section.to_string(),
                status: "ready".to_string(),
                summary: summarize_value(value, SUMMARY_WIDTH),
            },
            None => Self {
                section: section.to_string(),
                status: absent.to_string(),
                summary: EMPTY.to_string(),
            },
        }
    }

    /// Rows for a completed analysis job
    pub fn for_result(result: &AnalysisResult) -> Vec<Self> {
        result
            .sections()
            .into_iter()
            .map(|(label, value)| Self::new(label, value, "missing"))
            .collect()
    }

    /// Rows for a cached report
    pub fn for_report(report: &MergedAnalysis) -> Vec<Self> {
        vec![
            Self::new("App analysis", Some(&report.app_analysis), "missing"),
            Self::new(
                "Competitor analysis",
                report.competitor_analysis.as_ref(),
                "skipped",
            ),
            Self::new("Keyword analysis", Some(&report.keyword_analysis), "missing"),
        ]
    }
}

/// Pretty-print a JSON payload under a section heading
fn render_section(out: &mut String, label: &str, value: Option<&Value>, absent: &str) {
    out.push_str(&format!("{}\n", label.bold()));
    match value {
        Some(Value::String(text)) => {
            for line in text.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
        Some(value) => {
            let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
            for line in body.lines() {
                out.push_str(&format!("  {}\n", line));
            }
        }
        None => out.push_str(&format!("  {}\n", absent.dimmed())),
    }
    out.push('\n');
}

fn render_result(result: &AnalysisResult) -> String {
    let mut out = format!("{}\n\n", "Analysis complete".bold().green());
    for (label, value) in result.sections() {
        render_section(&mut out, label, value, "not available");
    }
    out.trim_end().to_string()
}

fn render_report(report: &MergedAnalysis) -> String {
    let mut out = String::new();
    render_section(&mut out, "App analysis", Some(&report.app_analysis), "");
    render_section(
        &mut out,
        "Competitor analysis",
        report.competitor_analysis.as_ref(),
        "skipped (no competitors given)",
    );
    render_section(&mut out, "Keyword analysis", Some(&report.keyword_analysis), "");
    out.trim_end().to_string()
}

impl Formattable for AnalysisResult {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            OutputFormat::Table => format_table(&SectionRow::for_result(self)),
            OutputFormat::Pretty => render_result(self),
        })
    }
}

impl Formattable for MergedAnalysis {
    fn format(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => format_json(self)?,
            OutputFormat::Table => format_table(&SectionRow::for_report(self)),
            OutputFormat::Pretty => render_report(self),
        })
    }
}
