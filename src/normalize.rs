//! Record Normalizer
//!
//! Maps parsed tags onto a field's controlled vocabulary. Every tag becomes
//! exactly one [`NormalizedEntry`]; nothing is dropped, so totals computed
//! downstream always match the number of tags the parser produced.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::errors::IssueKind;
use crate::label::{self, DetailValue, ParsedTag, Quantity, TagKind};
use crate::schema::{collapse_whitespace, is_reserved, match_key, FieldSpec};
use crate::table::AnnotationRecord;

pub const OTHER: &str = "other";

/// The bucket an entry is counted under.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// A vocabulary label, or a discovered label of an extensible field.
    Known(String),
    /// Outside the vocabulary of a closed field.
    Other,
    /// Rejected by the label grammar.
    Unparsed,
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Self::Known(label) => label,
            Self::Other => OTHER,
            Self::Unparsed => label::UNPARSED,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedEntry {
    pub category: Category,
    /// The category as written in the cell (the raw segment when unparsed).
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<DetailValue>,
    pub numeric: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<IssueKind>,
}

impl NormalizedEntry {
    pub fn label(&self) -> &str {
        self.category.label()
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.values.iter().filter_map(|v| v.quantity)
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.contains(&kind)
    }
}

/// Normalizes the tags of one cell.
pub fn normalize(tags: &[ParsedTag], field: &FieldSpec) -> Vec<NormalizedEntry> {
    tags.iter().map(|tag| normalize_tag(tag, field)).collect()
}

/// Parses then normalizes a raw cell.
pub fn normalize_cell(cell: &str, field: &FieldSpec) -> Vec<NormalizedEntry> {
    normalize(&label::parse(cell, field), field)
}

/// Normalizes `field` for every record, one entry list per record.
///
/// Discovered labels of open fields that differ only in case or spacing are
/// merged under their smallest spelling, so `[Qiskit]` and `[qiskit]` count
/// as one category.
pub fn normalize_records(records: &[AnnotationRecord], field: &FieldSpec) -> Vec<Vec<NormalizedEntry>> {
    let mut cells: Vec<Vec<NormalizedEntry>> = records
        .iter()
        .map(|record| normalize_cell(record.cell(&field.name).unwrap_or(""), field))
        .collect();

    let mut spellings: BTreeMap<String, String> = BTreeMap::new();
    for entry in cells.iter().flatten() {
        if let Category::Known(label) = &entry.category {
            let spelling = spellings
                .entry(match_key(label))
                .or_insert_with(|| label.clone());
            if *label < *spelling {
                *spelling = label.clone();
            }
        }
    }
    for entry in cells.iter_mut().flatten() {
        if let Category::Known(label) = &mut entry.category {
            if let Some(spelling) = spellings.get(&match_key(label)) {
                label.clone_from(spelling);
            }
        }
    }
    cells
}

fn normalize_tag(tag: &ParsedTag, field: &FieldSpec) -> NormalizedEntry {
    let mut issues = Vec::new();

    let (category, original) = match tag.kind {
        TagKind::Unparsed => {
            issues.push(IssueKind::UnparsedLabel);
            let raw = tag.detail.clone().unwrap_or_default();
            (Category::Unparsed, raw)
        }
        // The category comes from the schema, not from the annotator.
        TagKind::NumberList => {
            let label = field
                .resolve(&tag.category)
                .unwrap_or_else(|| collapse_whitespace(&tag.category));
            (Category::Known(label), tag.category.clone())
        }
        TagKind::Bracketed | TagKind::FreeText => {
            let category = match field.resolve(&tag.category) {
                Some(label) => Category::Known(label),
                None if field.is_extensible() && !is_reserved(&tag.category) => {
                    Category::Known(collapse_whitespace(&tag.category))
                }
                None => {
                    debug!(field = %field.name, category = %tag.category, "outside vocabulary");
                    issues.push(IssueKind::VocabularyMiss);
                    Category::Other
                }
            };
            (category, tag.category.clone())
        }
    };

    let numeric = tag.is_numeric();
    if tag.kind == TagKind::Bracketed
        && tag.detail.is_some()
        && !numeric
        && field.expects_numeric(&tag.category)
    {
        debug!(field = %field.name, detail = ?tag.detail, "no number in numeric detail");
        issues.push(IssueKind::NumericCoercionFailure);
    }

    NormalizedEntry {
        category,
        original,
        detail: match tag.kind {
            TagKind::Unparsed => None,
            _ => tag.detail.clone(),
        },
        values: tag.values.clone(),
        numeric,
        issues,
    }
}
