//! JSON artifacts.

use serde::Serialize;

use crate::emit::ReportData;
use crate::errors::{Result, ReviewError};
use crate::report::ReportDef;

#[derive(Serialize)]
struct Document<'a> {
    report: &'a str,
    #[serde(flatten)]
    data: &'a ReportData,
}

pub fn render(name: &str, report: &ReportDef, data: &ReportData) -> Result<String> {
    to_pretty(
        name,
        &Document {
            report: &report.name,
            data,
        },
    )
}

/// Pretty JSON with a trailing newline.
pub fn to_pretty<T: Serialize>(what: &str, value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| ReviewError::Json {
        what: what.to_string(),
        source,
    })?;
    text.push('\n');
    Ok(text)
}
