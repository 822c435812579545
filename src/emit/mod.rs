//! Artifact writers.
//!
//! Emitters are pure: they turn a report's data into file contents and leave
//! writing to the pipeline, which only touches the disk once every report
//! has been generated.

pub mod csv;
pub mod json;
pub mod latex;

use serde::Serialize;

use crate::aggregate::{AggregationResult, Combination, Dimension, NumericSummary};
use crate::errors::Result;
use crate::report::{OutputFormat, ReportDef};

/// One output file, named relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// The computed data of one report, ready to be emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportData {
    Counts(AggregationResult),
    Numeric {
        field: String,
        summaries: Vec<NumericSummary>,
    },
    Combinations {
        /// The field whose categories were combined, or the compared fields.
        subject: Vec<String>,
        combinations: Vec<Combination>,
    },
}

/// Emits `data` in one output format.
pub fn emit(report: &ReportDef, data: &ReportData, format: OutputFormat) -> Result<Artifact> {
    let name = format!("{}.{}", report.name, format.extension());
    let contents = match format {
        OutputFormat::Csv => csv::render(&name, data)?,
        OutputFormat::Json => json::render(&name, report, data)?,
        OutputFormat::Latex => latex::render(report, data),
    };
    Ok(Artifact { name, contents })
}

/// Column heading for an axis.
pub(crate) fn axis_title(dimension: &Dimension, field: &str) -> String {
    match dimension {
        Dimension::Category => field.to_string(),
        Dimension::Year => "Year".to_string(),
        Dimension::Paper => "Paper".to_string(),
        Dimension::Column(name) | Dimension::CategoryOf(name) => name.clone(),
    }
}

/// Integral medians print without a fraction.
pub(crate) fn format_median(median: f64) -> String {
    if median.fract() == 0.0 {
        format!("{median:.0}")
    } else {
        format!("{median:.1}")
    }
}
