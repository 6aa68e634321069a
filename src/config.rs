//! Runtime configuration: input schema and chart appearance.
//!
//! Every field has a default, so a JSON file only needs to list what it
//! overrides:
//!
//! ```json
//! {
//!   "schema": { "csv_category": "Jordnötter" },
//!   "charts": { "predictors_size": [2400, 1000] }
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Sheet and column names of the survey inputs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetSchema {
    pub translation_sheet: String,
    pub item_sheet: String,
    pub evaluation_sheet: String,

    pub name_column: String,
    pub letter_code_column: String,
    pub code_column: String,
    pub category_column: String,
    pub tester_column: String,
    /// Optional in the workbook; ratings without it are ordered by row.
    pub timestamp_column: String,

    pub property_columns: Vec<String>,
    pub score_column: String,

    pub csv_tester_column: String,
    pub csv_item_column: String,
    /// Category assigned to every item of a CSV input.
    pub csv_category: String,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            translation_sheet: "Sifferkoder".to_string(),
            item_sheet: "Nötter".to_string(),
            evaluation_sheet: "Utvärdering".to_string(),
            name_column: "Namn".to_string(),
            letter_code_column: "Bokstavskod".to_string(),
            code_column: "Sifferkod".to_string(),
            category_column: "Nöttyp".to_string(),
            tester_column: "Testare".to_string(),
            timestamp_column: "Timestamp".to_string(),
            property_columns: ["Flottig", "Knaprig", "Rostad", "Salt"]
                .into_iter()
                .map(String::from)
                .collect(),
            score_column: "Betyg".to_string(),
            csv_tester_column: "TBF".to_string(),
            csv_item_column: "Nöt".to_string(),
            csv_category: "Alla".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub counts_size: (u32, u32),
    pub predictors_size: (u32, u32),
    pub title_font_size: f64,
    pub label_font_size: f64,
    /// Multiplier applied to the standard error for error bars (95 % by default).
    pub confidence_z: f64,
    pub cap_width: u32,
    pub marker_size: i32,
    pub legend_columns: usize,
    pub counts_axis_label: String,
    pub counts_title: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            counts_size: (1200, 900),
            predictors_size: (1800, 900),
            title_font_size: 32.0,
            label_font_size: 18.0,
            confidence_z: 1.96,
            cap_width: 10,
            marker_size: 7,
            legend_columns: 3,
            counts_axis_label: "Antal svar".to_string(),
            counts_title: "Antal svar".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub schema: DatasetSchema,
    pub charts: ChartConfig,
}

impl Config {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))?;
        Ok(config)
    }
}
