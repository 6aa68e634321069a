//! Data types produced by the aggregation pipeline.

use serde::Serialize;

use crate::dataset::ItemCode;

/// Number of responses for one item of a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseCount {
    pub code: ItemCode,
    pub label: String,
    /// Ratings rows for the item.
    pub responses: usize,
    /// Non-missing values per property, in schema order.
    pub property_counts: Vec<usize>,
    pub score_count: usize,
}

impl ResponseCount {
    /// Non-missing values per property followed by the score.
    pub fn variable_counts(&self) -> Vec<usize> {
        self.property_counts
            .iter()
            .copied()
            .chain(std::iter::once(self.score_count))
            .collect()
    }
}

/// Summary statistics of one scored variable for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariableSummary {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub stderr: f64,
}

impl VariableSummary {
    /// Half-width of the confidence interval, `z * stderr`.
    pub fn half_width(&self, z: f64) -> f64 {
        self.stderr * z
    }
}

/// Per-item aggregate over all of its ratings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAggregate {
    pub code: ItemCode,
    pub label: String,
    pub responses: usize,
    pub properties: Vec<VariableSummary>,
    pub score: VariableSummary,
}

/// Ordinary least-squares fit of y on x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regression {
    pub n: usize,
    pub slope: f64,
    pub intercept: f64,
    pub rvalue: f64,
    /// Two-sided p-value for a zero slope.
    pub pvalue: f64,
    pub slope_stderr: f64,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Regression of item-mean score on item-mean property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRegression {
    pub property: String,
    pub regression: Regression,
}

/// Aggregates and regressions of one category, input to the predictor chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub category: String,
    pub property_names: Vec<String>,
    pub score_name: String,
    pub items: Vec<ItemAggregate>,
    pub regressions: Vec<PropertyRegression>,
}
