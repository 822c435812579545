//! CSV artifacts, the input of the plotting scripts.
//!
//! Count tables are written in long form: one row per cell, zero cells
//! included, so every axis combination is present.

use crate::emit::{axis_title, format_median, ReportData};
use crate::errors::{Result, ReviewError};

pub fn render(name: &str, data: &ReportData) -> Result<String> {
    let rows = rows(data);
    let error = |source: ::csv::Error| ReviewError::Csv {
        path: name.to_string(),
        source,
    };

    let mut writer = ::csv::WriterBuilder::new()
        .terminator(::csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in &rows {
        writer.write_record(row).map_err(error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| error(::csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn rows(data: &ReportData) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    match data {
        ReportData::Counts(result) => {
            let mut header: Vec<String> = result
                .axes
                .iter()
                .map(|axis| axis_title(&axis.dimension, &result.field))
                .collect();
            header.extend(["count".to_string(), "papers".to_string()]);
            rows.push(header);
            for cell in &result.cells {
                let mut row = cell.key.clone();
                row.push(cell.count.to_string());
                row.push(cell.papers.join("; "));
                rows.push(row);
            }
        }
        ReportData::Numeric { field, summaries } => {
            rows.push(
                [field.as_str(), "count", "min", "median", "max", "values", "papers"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            );
            for summary in summaries {
                rows.push(vec![
                    summary.group.clone(),
                    summary.count.to_string(),
                    summary.min.to_string(),
                    format_median(summary.median),
                    summary.max.to_string(),
                    summary
                        .values
                        .iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(" "),
                    summary.papers.join("; "),
                ]);
            }
        }
        ReportData::Combinations { combinations, .. } => {
            rows.push(
                ["combination", "size", "count", "papers"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            );
            for combination in combinations {
                rows.push(vec![
                    combination.label(),
                    combination.members.len().to_string(),
                    combination.count.to_string(),
                    combination.papers.join("; "),
                ]);
            }
        }
    }
    rows
}
