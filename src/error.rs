//! Error types for loading and analysing tasting data.

use thiserror::Error;

/// Fatal conditions raised while loading a dataset or computing statistics.
///
/// None of these are recovered from: the run aborts and the message is
/// reported to the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("sheet '{0}' not found in workbook")]
    MissingSheet(String),
    #[error("column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },
    #[error("invalid value in table '{table}', row {row}, column '{column}': {reason}")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        reason: String,
    },
    #[error("letter code '{0}' has no numeric code in the translation table")]
    UnknownLetterCode(String),
    #[error("item code '{0}' appears more than once in the item table")]
    DuplicateItem(String),
    #[error("unknown item category '{0}'")]
    UnknownCategory(String),
    #[error("insufficient data for {subject}: found {found} value(s), need at least {required}")]
    InsufficientData {
        subject: String,
        found: usize,
        required: usize,
    },
    #[error("regression of {0} is degenerate: all x values are equal")]
    DegenerateRegression(String),
    #[error("x and y have different lengths ({x} vs {y})")]
    MismatchedLengths { x: usize, y: usize },
    #[error("distribution error: {0}")]
    Distribution(String),
}

impl AnalysisError {
    /// Replaces the subject of an [`AnalysisError::InsufficientData`] or
    /// [`AnalysisError::DegenerateRegression`] error; other variants pass through.
    pub fn about(self, subject: impl Into<String>) -> Self {
        match self {
            AnalysisError::InsufficientData {
                found, required, ..
            } => AnalysisError::InsufficientData {
                subject: subject.into(),
                found,
                required,
            },
            AnalysisError::DegenerateRegression(_) => {
                AnalysisError::DegenerateRegression(subject.into())
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
