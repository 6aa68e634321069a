//! Grouping, aggregation and regression of ratings.
//!
//! This module groups ratings by item within each category, computes
//! per-item means and standard errors, fits score-on-property regressions
//! across items, and drives chart and summary output per category.

pub mod aggregate;
pub mod analyzer;
pub mod regression;
pub mod types;
pub mod utility;
