//! Combination counts for UpSet-style figures: which sets of categories (or
//! of fields) appear together in the same paper.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::normalize::{normalize_cell, normalize_records};
use crate::schema::FieldSpec;
use crate::table::AnnotationRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combination {
    /// Members present together, ascending. Empty for papers with none.
    pub members: Vec<String>,
    pub count: u64,
    pub papers: Vec<String>,
}

impl Combination {
    pub fn label(&self) -> String {
        self.members.join(" & ")
    }
}

/// For each paper, the set of `field` categories it uses.
///
/// Papers with a blank cell are not counted.
pub fn category_combinations(records: &[AnnotationRecord], field: &FieldSpec) -> Vec<Combination> {
    let cells = normalize_records(records, field);
    tally(records.iter().zip(cells).filter_map(|(record, entries)| {
        if entries.is_empty() {
            return None;
        }
        let members: BTreeSet<String> = entries.iter().map(|e| e.label().to_string()).collect();
        Some((members, record.paper_id.clone()))
    }))
}

/// For each paper, the set of `fields` with a non-blank cell.
///
/// Every paper is counted, including those with none of the fields.
pub fn field_combinations(records: &[AnnotationRecord], fields: &[&FieldSpec]) -> Vec<Combination> {
    tally(records.iter().map(|record| {
        let members: BTreeSet<String> = fields
            .iter()
            .filter(|field| !normalize_cell(record.cell(&field.name).unwrap_or(""), field).is_empty())
            .map(|field| field.name.clone())
            .collect();
        (members, record.paper_id.clone())
    }))
}

/// Counts identical member sets; count descending, then label ascending.
fn tally(rows: impl Iterator<Item = (BTreeSet<String>, String)>) -> Vec<Combination> {
    let mut groups: BTreeMap<Vec<String>, BTreeSet<String>> = BTreeMap::new();
    for (members, paper) in rows {
        groups
            .entry(members.into_iter().collect())
            .or_default()
            .insert(paper);
    }

    let mut combinations: Vec<Combination> = groups
        .into_iter()
        .map(|(members, papers)| Combination {
            members,
            count: papers.len() as u64,
            papers: papers.into_iter().collect(),
        })
        .collect();
    combinations.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label().cmp(&b.label())));
    combinations
}
