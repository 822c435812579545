//! Annotation table loading.
//!
//! The table is a CSV export of the annotation spreadsheet: a header row,
//! then one row per primary study. Required columns are checked before any
//! row is read; a missing column is the one structural failure that aborts
//! a run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{Result, ReviewError};
use crate::schema::Schema;

/// Label used on the year axis for records without a usable year.
pub const UNKNOWN_YEAR: &str = "n/a";

/// One primary study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationRecord {
    pub paper_id: String,
    pub year: Option<i32>,
    cells: BTreeMap<String, String>,
}

impl AnnotationRecord {
    pub fn new(paper_id: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            paper_id: paper_id.into(),
            year,
            cells: BTreeMap::new(),
        }
    }

    pub fn with_cell(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    pub fn cell(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn year_label(&self) -> String {
        self.year
            .map(|y| y.to_string())
            .unwrap_or_else(|| UNKNOWN_YEAR.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationTable {
    /// Display name of the source, used in diagnostics.
    pub source: String,
    pub columns: Vec<String>,
    pub records: Vec<AnnotationRecord>,
}

impl AnnotationTable {
    pub fn load(path: &Path, schema: &Schema, extra_columns: &[String]) -> Result<Self> {
        let file = File::open(path).map_err(|e| ReviewError::io(path, e))?;
        Self::from_reader(&path.display().to_string(), file, schema, extra_columns)
    }

    /// Reads a table, failing with [`ReviewError::MissingColumn`] when any
    /// schema-required column or any of `extra_columns` is absent.
    pub fn from_reader<R: Read>(
        source: &str,
        reader: R,
        schema: &Schema,
        extra_columns: &[String],
    ) -> Result<Self> {
        let csv_error = |e: csv::Error| ReviewError::Csv {
            path: source.to_string(),
            source: e,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut required: Vec<String> = schema.required_columns();
        required.extend(extra_columns.iter().cloned());
        check_columns(source, &columns, &required)?;

        let id_index = position(&columns, &schema.id_column);
        let year_index = position(&columns, &schema.year_column);

        let mut records = Vec::new();
        let mut seen_ids = BTreeSet::new();
        for (row, result) in reader.records().enumerate() {
            let row_data = result.map_err(csv_error)?;
            let get = |i: Option<usize>| i.and_then(|i| row_data.get(i)).unwrap_or("").trim();

            let mut paper_id = get(id_index).to_string();
            if paper_id.is_empty() {
                // Data rows start on line 2 of the file.
                paper_id = format!("row-{}", row + 2);
                warn!(table = source, paper = %paper_id, "row has no paper id");
            }
            if !seen_ids.insert(paper_id.clone()) {
                warn!(table = source, paper = %paper_id, "duplicate paper id, keeping both rows");
            }

            let year_text = get(year_index);
            let year = parse_year(year_text);
            if year.is_none() && !year_text.is_empty() {
                warn!(table = source, paper = %paper_id, year = year_text, "unreadable year");
            }

            let mut record = AnnotationRecord::new(paper_id, year);
            for (column, value) in columns.iter().zip(row_data.iter()) {
                record.cells.insert(column.clone(), value.to_string());
            }
            records.push(record);
        }

        debug!(table = source, rows = records.len(), columns = columns.len(), "table loaded");
        Ok(Self {
            source: source.to_string(),
            columns,
            records,
        })
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

fn position(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|c| c == name)
}

fn check_columns(source: &str, columns: &[String], required: &[String]) -> Result<()> {
    let mut missing: Vec<String> = Vec::new();
    for column in required {
        if !columns.contains(column) && !missing.contains(column) {
            missing.push(column.clone());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ReviewError::missing_columns(source, missing, columns))
    }
}

/// Accepts `2021` and spreadsheet-style `2021.0`.
fn parse_year(text: &str) -> Option<i32> {
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.fract() == 0.0 && f.is_finite())
        .map(|f| f as i32)
}
