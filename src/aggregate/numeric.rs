//! Distribution summaries for numeric details (`[Mutants: 50]`,
//! `[Qubits: From 2 to 32]`), the data behind the box plots of the review.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::normalize::normalize_records;
use crate::schema::FieldSpec;
use crate::table::AnnotationRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    /// Entry category, suffixed with the value label when there is one
    /// (`Specific: H gates`).
    pub group: String,
    /// Number of values; a range contributes both of its ends.
    pub count: usize,
    pub papers: Vec<String>,
    pub min: u64,
    pub max: u64,
    pub median: f64,
    pub values: Vec<u64>,
}

pub fn numeric_summary(records: &[AnnotationRecord], field: &FieldSpec) -> Vec<NumericSummary> {
    let mut groups: BTreeMap<String, (Vec<u64>, BTreeSet<String>)> = BTreeMap::new();

    for (record, entries) in records.iter().zip(normalize_records(records, field)) {
        for entry in &entries {
            for value in &entry.values {
                let Some(quantity) = value.quantity else {
                    continue;
                };
                let group = match &value.label {
                    Some(label) => format!("{}: {}", entry.label(), label),
                    None => entry.label().to_string(),
                };
                let slot = groups.entry(group).or_default();
                slot.0.push(quantity.min());
                if quantity.max() != quantity.min() {
                    slot.0.push(quantity.max());
                }
                slot.1.insert(record.paper_id.clone());
            }
        }
    }

    groups
        .into_iter()
        .map(|(group, (mut values, papers))| {
            values.sort_unstable();
            NumericSummary {
                count: values.len(),
                min: values.first().copied().unwrap_or(0),
                max: values.last().copied().unwrap_or(0),
                median: median(&values),
                papers: papers.into_iter().collect(),
                values,
                group,
            }
        })
        .collect()
}

/// Median of sorted values; the mean of the middle pair for even lengths.
fn median(sorted: &[u64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_and_odd() {
        assert_eq!(median(&[1, 3, 8]), 3.0);
        assert_eq!(median(&[1, 3, 5, 8]), 4.0);
        assert_eq!(median(&[]), 0.0);
    }
}
