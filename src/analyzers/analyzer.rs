use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzers::aggregate::{analyze_category, count_responses};
use crate::charts::{chart_path, render_counts, render_predictors};
use crate::config::ChartConfig;
use crate::dataset::Dataset;
use crate::output::{log_report_json, write_summary};

/// Which files a run produces for every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outputs {
    pub counts: bool,
    pub predictors: bool,
    pub summary: bool,
}

impl Outputs {
    pub fn all() -> Self {
        Self {
            counts: true,
            predictors: true,
            summary: true,
        }
    }
}

/// Renders the requested outputs for every category of `dataset` into
/// `output_dir`, creating it if needed. Returns the written paths.
///
/// Stops at the first category that cannot be analysed.
pub fn run(
    dataset: &Dataset,
    output_dir: &Path,
    options: &ChartConfig,
    outputs: Outputs,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;

    let mut written = Vec::new();

    for category in dataset.categories() {
        let span = tracing::info_span!("category", category = %category);
        let _enter = span.enter();

        if outputs.counts {
            written.push(write_counts_chart(dataset, category, output_dir, options)?);
        }

        if outputs.predictors || outputs.summary {
            let report = analyze_category(dataset, category)
                .with_context(|| format!("Failed to analyse category '{category}'"))?;

            if outputs.predictors {
                let path = chart_path(output_dir, "predictors", category);
                render_predictors(&path, &report, options)
                    .with_context(|| format!("Failed to render '{}'", path.display()))?;
                info!(path = %path.display(), "Predictor chart written");
                written.push(path);
            }

            if outputs.summary {
                let path = output_dir.join(format!(
                    "summary-{}.csv",
                    crate::charts::file_safe(category)
                ));
                write_summary(&path, &report)
                    .with_context(|| format!("Failed to write '{}'", path.display()))?;
                log_report_json(&report)?;
                info!(path = %path.display(), "Summary written");
                written.push(path);
            }
        }
    }

    info!(files = written.len(), output_dir = %output_dir.display(), "Run complete");
    Ok(written)
}

fn write_counts_chart(
    dataset: &Dataset,
    category: &str,
    output_dir: &Path,
    options: &ChartConfig,
) -> Result<PathBuf> {
    let counts = count_responses(dataset, category)?;
    let total: usize = counts.iter().map(|c| c.responses).sum();

    let variables: Vec<String> = dataset
        .property_names()
        .iter()
        .cloned()
        .chain(std::iter::once(dataset.score_name().to_string()))
        .collect();

    let path = chart_path(output_dir, "counts", category);
    render_counts(&path, category, &variables, &counts, options)
        .with_context(|| format!("Failed to render '{}'", path.display()))?;

    info!(path = %path.display(), items = counts.len(), responses = total, "Count chart written");
    Ok(path)
}
