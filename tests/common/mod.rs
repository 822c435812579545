//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use review_stats::pipeline::RunConfig;
use review_stats::schema::{FieldSpec, Schema};
use review_stats::table::{AnnotationRecord, AnnotationTable};

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn schema() -> Schema {
    Schema::load(&fixture("fields.yaml")).expect("fixture schema loads")
}

pub fn table() -> AnnotationTable {
    AnnotationTable::load(&fixture("annotations.csv"), &schema(), &[]).expect("fixture table loads")
}

pub fn field(name: &str) -> FieldSpec {
    schema()
        .field(name)
        .cloned()
        .unwrap_or_else(|| panic!("fixture field {name}"))
}

/// A record with one cell per `(column, value)` pair.
pub fn record(id: &str, year: Option<i32>, cells: &[(&str, &str)]) -> AnnotationRecord {
    cells
        .iter()
        .fold(AnnotationRecord::new(id, year), |record, (column, value)| {
            record.with_cell(*column, *value)
        })
}

/// Pipeline configuration over the fixtures, writing into `out`.
pub fn config(table: &str, out: &Path) -> RunConfig {
    RunConfig {
        table: fixture(table),
        schema: fixture("fields.yaml"),
        reports: fixture("reports"),
        out: out.to_path_buf(),
    }
}
