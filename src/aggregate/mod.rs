//! Aggregator
//!
//! Groups normalized entries by one or more dimensions and counts them.
//!
//! Two counting modes exist because research questions ask two different
//! things of a multi-valued field. A paper that uses three mutation operators
//! counts once towards "papers using mutation" ([`CountMode::PaperCount`])
//! but three times towards "operator popularity"
//! ([`CountMode::OccurrenceCount`]).
//!
//! Results are dense: every combination of axis labels is present, with zero
//! counts where nothing was observed.

pub mod combinations;
pub mod numeric;
pub mod result;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::normalize::{normalize_records, NormalizedEntry, OTHER};
use crate::schema::{FieldSpec, Schema};
use crate::table::{AnnotationRecord, UNKNOWN_YEAR};
use crate::label::UNPARSED;

pub use combinations::{category_combinations, field_combinations, Combination};
pub use numeric::{numeric_summary, NumericSummary};
pub use result::{AggregationResult, Axis, Cell};

/// Placeholder label for records without a value on a secondary dimension.
pub const MISSING: &str = "n/a";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CountMode {
    /// Each distinct key counted at most once per record.
    #[default]
    #[serde(rename = "paper-count")]
    PaperCount,
    /// Every tag instance counted.
    #[serde(rename = "occurrence-count")]
    OccurrenceCount,
}

/// A grouping dimension.
///
/// Written in configuration as `category`, `year`, `paper`,
/// `column:<name>` or `category_of:<field>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dimension {
    /// Categories of the aggregated field.
    Category,
    Year,
    Paper,
    /// Raw, trimmed value of another column.
    Column(String),
    /// Categories of a second field, for category x category tables.
    CategoryOf(String),
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => f.write_str("category"),
            Self::Year => f.write_str("year"),
            Self::Paper => f.write_str("paper"),
            Self::Column(name) => write!(f, "column:{name}"),
            Self::CategoryOf(field) => write!(f, "category_of:{field}"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "category" => return Ok(Self::Category),
            "year" => return Ok(Self::Year),
            "paper" => return Ok(Self::Paper),
            _ => {}
        }
        match s.split_once(':') {
            Some(("column", name)) if !name.trim().is_empty() => {
                Ok(Self::Column(name.trim().to_string()))
            }
            Some(("category_of", field)) if !field.trim().is_empty() => {
                Ok(Self::CategoryOf(field.trim().to_string()))
            }
            _ => Err(format!(
                "unknown dimension '{s}' (expected category, year, paper, column:<name> or category_of:<field>)"
            )),
        }
    }
}

impl TryFrom<String> for Dimension {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dimension> for String {
    fn from(value: Dimension) -> Self {
        value.to_string()
    }
}

/// Aggregates `field` over `records`.
///
/// `schema` resolves [`Dimension::CategoryOf`] references; an unknown field
/// there is reported as `Err` with the offending name.
pub fn aggregate(
    records: &[AnnotationRecord],
    field: &FieldSpec,
    group_by: &[Dimension],
    mode: CountMode,
    schema: &Schema,
) -> Result<AggregationResult, String> {
    let secondary = resolve_secondary(group_by, schema)?;

    let mut counts: BTreeMap<Vec<String>, u64> = BTreeMap::new();
    let mut papers: BTreeMap<Vec<String>, BTreeSet<String>> = BTreeMap::new();
    let mut observed: Vec<BTreeSet<String>> = vec![BTreeSet::new(); group_by.len()];
    let mut contributing_records = 0;
    let mut total_entries = 0;

    let primary = normalize_records(records, field);
    let secondary_entries: BTreeMap<&str, Vec<Vec<NormalizedEntry>>> = secondary
        .iter()
        .map(|(name, spec)| (name.as_str(), normalize_records(records, spec)))
        .collect();

    for (index, (record, entries)) in records.iter().zip(&primary).enumerate() {
        if entries.is_empty() {
            continue;
        }
        contributing_records += 1;
        total_entries += entries.len();

        let per_dimension: Vec<Vec<String>> = group_by
            .iter()
            .map(|dim| dimension_labels(dim, record, entries, &secondary_entries, index))
            .collect();
        for (seen, labels) in observed.iter_mut().zip(&per_dimension) {
            seen.extend(labels.iter().cloned());
        }

        let keys = cartesian(&per_dimension);
        let keys: Vec<Vec<String>> = match mode {
            CountMode::OccurrenceCount => keys,
            CountMode::PaperCount => keys.into_iter().collect::<BTreeSet<_>>().into_iter().collect(),
        };
        for key in keys {
            *counts.entry(key.clone()).or_default() += 1;
            papers.entry(key).or_default().insert(record.paper_id.clone());
        }
    }

    let axes: Vec<Axis> = group_by
        .iter()
        .zip(observed)
        .map(|(dim, seen)| Axis {
            dimension: dim.clone(),
            labels: axis_labels(dim, seen, field, &secondary),
        })
        .collect();

    let cells = cartesian(&axes.iter().map(|a| a.labels.clone()).collect::<Vec<_>>())
        .into_iter()
        .map(|key| Cell {
            count: counts.get(&key).copied().unwrap_or(0),
            papers: papers
                .get(&key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default(),
            key,
        })
        .collect();

    Ok(AggregationResult {
        field: field.name.clone(),
        mode,
        axes,
        cells,
        contributing_records,
        total_entries,
    })
}

fn resolve_secondary<'a>(
    group_by: &[Dimension],
    schema: &'a Schema,
) -> Result<BTreeMap<String, &'a FieldSpec>, String> {
    let mut secondary = BTreeMap::new();
    for dim in group_by {
        if let Dimension::CategoryOf(name) = dim {
            let spec = schema
                .field(name)
                .ok_or_else(|| format!("dimension refers to unknown field '{name}'"))?;
            secondary.insert(name.clone(), spec);
        }
    }
    Ok(secondary)
}

fn dimension_labels(
    dim: &Dimension,
    record: &AnnotationRecord,
    entries: &[NormalizedEntry],
    secondary: &BTreeMap<&str, Vec<Vec<NormalizedEntry>>>,
    index: usize,
) -> Vec<String> {
    match dim {
        Dimension::Category => entries.iter().map(|e| e.label().to_string()).collect(),
        Dimension::Year => vec![record.year_label()],
        Dimension::Paper => vec![record.paper_id.clone()],
        Dimension::Column(name) => {
            let value = record.cell(name).unwrap_or("").trim();
            vec![if value.is_empty() { MISSING.to_string() } else { value.to_string() }]
        }
        Dimension::CategoryOf(name) => {
            let labels: Vec<String> = secondary
                .get(name.as_str())
                .and_then(|cells| cells.get(index))
                .map(|entries| entries.iter().map(|e| e.label().to_string()).collect())
                .unwrap_or_default();
            if labels.is_empty() {
                vec![MISSING.to_string()]
            } else {
                labels
            }
        }
    }
}

/// Orders the labels of one axis.
///
/// Category axes: declared vocabulary first (always present, so tables stay
/// dense), then discovered labels ascending, then `other` and `unparsed`.
/// Year axes: ascending, unknown year last. Anything else: ascending.
fn axis_labels(
    dim: &Dimension,
    seen: BTreeSet<String>,
    field: &FieldSpec,
    secondary: &BTreeMap<String, &FieldSpec>,
) -> Vec<String> {
    match dim {
        Dimension::Category => category_axis(field, seen),
        Dimension::CategoryOf(name) => match secondary.get(name) {
            Some(spec) => category_axis(spec, seen),
            None => seen.into_iter().collect(),
        },
        Dimension::Year => {
            let mut years: Vec<String> = seen.into_iter().collect();
            years.sort_by_key(|label| (label == UNKNOWN_YEAR, label.parse::<i64>().unwrap_or(0)));
            years
        }
        Dimension::Paper | Dimension::Column(_) => {
            let has_missing = seen.contains(MISSING);
            let mut labels: Vec<String> = seen.into_iter().filter(|l| l != MISSING).collect();
            if has_missing {
                labels.push(MISSING.to_string());
            }
            labels
        }
    }
}

fn category_axis(field: &FieldSpec, seen: BTreeSet<String>) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for label in &field.vocabulary {
        if !labels.contains(label) {
            labels.push(label.clone());
        }
    }
    let trailing = [OTHER, UNPARSED, MISSING];
    let discovered: Vec<String> = seen
        .iter()
        .filter(|l| !labels.contains(l) && !trailing.contains(&l.as_str()))
        .cloned()
        .collect();
    labels.extend(discovered);
    for special in trailing {
        if seen.contains(special) && !labels.iter().any(|l| l == special) {
            labels.push(special.to_string());
        }
    }
    labels
}

/// All combinations picking one label from each list, in list order.
pub(crate) fn cartesian(lists: &[Vec<String>]) -> Vec<Vec<String>> {
    lists.iter().fold(vec![Vec::new()], |acc, labels| {
        acc.into_iter()
            .flat_map(|prefix| {
                labels.iter().map(move |label| {
                    let mut key = prefix.clone();
                    key.push(label.clone());
                    key
                })
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_round_trip_through_strings() {
        for text in ["category", "year", "paper", "column:Venue", "category_of:Programs"] {
            let dim: Dimension = text.parse().unwrap();
            assert_eq!(dim.to_string(), text);
        }
        assert!("venue".parse::<Dimension>().is_err());
        assert!("column:".parse::<Dimension>().is_err());
    }

    #[test]
    fn cartesian_keeps_order() {
        let lists = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["1".to_string(), "2".to_string()],
        ];
        let keys = cartesian(&lists);
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[1], vec!["a", "2"]);
        assert_eq!(keys[2], vec!["b", "1"]);
    }
}
