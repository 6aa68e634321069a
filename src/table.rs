//! Source-agnostic table of cells with header lookup.
//!
//! Both the workbook sheets and the CSV file are read into a [`Table`] so the
//! loader can address columns by name and report missing columns uniformly.

use chrono::{DateTime, NaiveDateTime};

use crate::dataset::ItemCode;
use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Builds a cell from raw text, treating blank text as empty.
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parses the timestamp formats produced by common survey exports.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers: headers.into_iter().map(|h| h.trim().to_string()).collect(),
            rows: rows
                .into_iter()
                .filter(|row| row.iter().any(|c| *c != Cell::Empty))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column named `name`.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.find_column(name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    fn invalid(&self, row: usize, col: usize, reason: impl Into<String>) -> AnalysisError {
        AnalysisError::InvalidValue {
            table: self.name.clone(),
            // 1-based, counting the header line
            row: row + 2,
            column: self.headers.get(col).cloned().unwrap_or_default(),
            reason: reason.into(),
        }
    }

    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        match self.cell(row, col) {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(ItemCode::from_number(*n).to_string()),
            Cell::DateTime(dt) => Some(dt.to_string()),
        }
    }

    pub fn required_text(&self, row: usize, col: usize) -> Result<String> {
        self.text(row, col)
            .ok_or_else(|| self.invalid(row, col, "value is empty"))
    }

    /// Numeric value; accepts a decimal comma in text cells.
    pub fn number(&self, row: usize, col: usize) -> Result<Option<f64>> {
        match self.cell(row, col) {
            Cell::Empty => Ok(None),
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Text(s) => s
                .replace(',', ".")
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(row, col, format!("'{s}' is not a number"))),
            Cell::DateTime(dt) => Err(self.invalid(row, col, format!("'{dt}' is not a number"))),
        }
    }

    pub fn item_code(&self, row: usize, col: usize) -> Result<ItemCode> {
        match self.cell(row, col) {
            Cell::Number(n) => Ok(ItemCode::from_number(*n)),
            Cell::Text(s) => Ok(ItemCode::new(s.as_str())),
            Cell::Empty => Err(self.invalid(row, col, "item code is empty")),
            Cell::DateTime(dt) => Err(self.invalid(row, col, format!("'{dt}' is not an item code"))),
        }
    }

    pub fn timestamp(&self, row: usize, col: usize) -> Result<Option<NaiveDateTime>> {
        match self.cell(row, col) {
            Cell::Empty => Ok(None),
            Cell::DateTime(dt) => Ok(Some(*dt)),
            Cell::Text(s) => parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| self.invalid(row, col, format!("'{s}' is not a timestamp"))),
            Cell::Number(n) => Err(self.invalid(row, col, format!("'{n}' is not a timestamp"))),
        }
    }
}
