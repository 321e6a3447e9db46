//! CLI output: error mapping and text formatting for reports and job records.

use crate::error::ApiError;
use crate::pipeline::{JobRecord, JobResult};
use crate::quality::QualityReport;
use crate::validation::Severity;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::ProviderNotConfigured(_) => format!(
            "{}\nDefine a provider under [providers.<name>] in config/config.toml and select it with [stages] default.",
            e
        ),
        _ => e.to_string(),
    }
}

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn verdict(accepted: bool) -> String {
    if accepted {
        format!("{}", "accepted".green())
    } else {
        format!("{}", "rejected".red())
    }
}

/// Quality report as sub-score and issue tables
pub fn format_report_text(report: &QualityReport, threshold: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Quality")));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Component", "Weight", "Sub-score", "Passed"]);
    for component in &report.components {
        table.add_row(vec![
            component.component.to_string(),
            format!("{:.0}%", component.weight * 100.0),
            format!("{:.2}", component.subscore),
            if component.passed { "yes" } else { "no" }.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!(
        "  Score: {:.2} (threshold {:.2}) {}\n\n",
        report.score,
        threshold,
        verdict(report.accepts(threshold))
    ));

    if report.issues.is_empty() {
        out.push_str("No issues.\n");
        return out;
    }

    out.push_str(&format!("{}\n\n", format_section_heading("Issues")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Severity", "Kind", "Penalty", "Message"]);
    for issue in &report.issues {
        let severity = match issue.severity {
            Severity::Blocking => format!("{}", "blocking".red()),
            Severity::Advisory => format!("{}", "advisory".yellow()),
        };
        table.add_row(vec![
            severity,
            issue.kind.to_string(),
            format!("{:.2}", issue.penalty),
            issue.message.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// One job: status line, attempts per stage, then the puzzle or failure
pub fn format_job_text(record: &JobRecord, threshold: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading(&format!("Job {}", record.job_id))
    ));
    out.push_str(&format!("  Status: {}\n", record.status));
    out.push_str(&format!("  Stage: {}\n", record.stage));
    out.push_str(&format!(
        "  Updated: {}\n\n",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Stage", "Current", "Total"]);
    for (stage, attempts) in &record.attempts_per_stage {
        table.add_row(vec![
            stage.to_string(),
            attempts.current.to_string(),
            attempts.total.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    match &record.result {
        Some(JobResult::Puzzle(puzzle)) => {
            out.push_str(&format!("{}\n\n", format_section_heading("Grid")));
            for line in puzzle.grid.pattern() {
                out.push_str(&format!("  {}\n", line));
            }
            out.push('\n');

            out.push_str(&format!("{}\n\n", format_section_heading("Clues")));
            for answer in &puzzle.answers {
                out.push_str(&format!(
                    "  {:>3} {:<6} {:<15} {}\n",
                    answer.number,
                    answer.direction,
                    answer.normalized(),
                    answer.clue.as_deref().unwrap_or("")
                ));
            }
            out.push('\n');

            if let Some(report) = &puzzle.quality {
                out.push_str(&format_report_text(report, threshold));
            }
        }
        Some(JobResult::FailureReason(reason)) => {
            out.push_str(&format!(
                "  {} {}: {}\n",
                "Failed".red(),
                reason.kind,
                reason.message
            ));
            for issue in reason.issues.iter().filter(|issue| issue.is_blocking()) {
                out.push_str(&format!("    - {}\n", issue));
            }
        }
        None => out.push_str("  No result yet.\n"),
    }
    out
}

pub fn format_job_list_text(records: &[JobRecord]) -> String {
    if records.is_empty() {
        return "No archived jobs.\n".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Job", "Status", "Stage", "Updated"]);
    for record in records {
        table.add_row(vec![
            record.job_id.to_string(),
            record.status.to_string(),
            record.stage.to_string(),
            record.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    format!("{}\n", table)
}
