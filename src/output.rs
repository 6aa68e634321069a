//! Summary export of category reports.
//!
//! Supports pretty JSON logging and a long-format CSV with one row per item
//! and variable.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{CategoryReport, VariableSummary};

/// One row of the summary CSV.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    category: &'a str,
    code: &'a str,
    label: &'a str,
    responses: usize,
    variable: &'a str,
    count: usize,
    mean: f64,
    stddev: f64,
    stderr: f64,
}

/// Logs a category report as pretty-printed JSON.
pub fn log_report_json(report: &CategoryReport) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes the per-item aggregates of `report` to a CSV file, replacing any
/// existing file.
pub fn write_summary(path: &Path, report: &CategoryReport) -> Result<()> {
    debug!(path = %path.display(), items = report.items.len(), "Writing summary CSV");

    let mut writer = csv::Writer::from_path(path)?;

    for item in &report.items {
        let variables = report
            .property_names
            .iter()
            .zip(&item.properties)
            .chain(std::iter::once((&report.score_name, &item.score)));

        for (variable, summary) in variables {
            let VariableSummary {
                count,
                mean,
                stddev,
                stderr,
            } = *summary;
            writer.serialize(SummaryRow {
                category: &report.category,
                code: item.code.as_str(),
                label: &item.label,
                responses: item.responses,
                variable,
                count,
                mean,
                stddev,
                stderr,
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}
