//! Aggregation results: dense grids over ordered, labeled axes.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::aggregate::{cartesian, CountMode, Dimension};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub dimension: Dimension,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// One label per axis, in axis order.
    pub key: Vec<String>,
    pub count: u64,
    /// Paper ids contributing to this cell, ascending.
    pub papers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationResult {
    pub field: String,
    pub mode: CountMode,
    pub axes: Vec<Axis>,
    /// Row-major over `axes`; the last axis varies fastest.
    pub cells: Vec<Cell>,
    /// Records with a non-blank cell for `field`.
    pub contributing_records: usize,
    pub total_entries: usize,
}

impl AggregationResult {
    pub fn count(&self, key: &[&str]) -> u64 {
        self.cell(key).map(|c| c.count).unwrap_or(0)
    }

    pub fn cell(&self, key: &[&str]) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|c| c.key.len() == key.len() && c.key.iter().zip(key).all(|(a, b)| a.as_str() == *b))
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().map(|c| c.count).sum()
    }

    /// Sums of cell counts per label of axis `axis`, in axis order.
    pub fn marginals(&self, axis: usize) -> Vec<(String, u64)> {
        let Some(labels) = self.axes.get(axis).map(|a| &a.labels) else {
            return Vec::new();
        };
        let mut sums: BTreeMap<&str, u64> = BTreeMap::new();
        for cell in &self.cells {
            *sums.entry(cell.key[axis].as_str()).or_default() += cell.count;
        }
        labels
            .iter()
            .map(|label| (label.clone(), sums.get(label.as_str()).copied().unwrap_or(0)))
            .collect()
    }

    /// Distinct papers per label of axis `axis`, in axis order.
    pub fn papers_by(&self, axis: usize) -> Vec<(String, Vec<String>)> {
        let Some(labels) = self.axes.get(axis).map(|a| &a.labels) else {
            return Vec::new();
        };
        let mut papers: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for cell in &self.cells {
            papers
                .entry(cell.key[axis].as_str())
                .or_default()
                .extend(cell.papers.iter().map(String::as_str));
        }
        labels
            .iter()
            .map(|label| {
                let ids = papers
                    .get(label.as_str())
                    .map(|set| set.iter().map(|s| s.to_string()).collect())
                    .unwrap_or_default();
                (label.clone(), ids)
            })
            .collect()
    }

    /// Labels of the first axis with their totals, count descending, ties by
    /// label ascending.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked = self.marginals(0);
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn top_n(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// Like [`top_n`](Self::top_n) but keeps every entry tied with the n-th.
    pub fn top_n_with_ties(&self, n: usize) -> Vec<(String, u64)> {
        let ranked = self.ranked();
        if n == 0 || ranked.len() <= n {
            return ranked;
        }
        let cutoff = ranked[n - 1].1;
        ranked.into_iter().filter(|(_, count)| *count >= cutoff).collect()
    }

    /// Folds first-axis labels whose total is below `threshold` into `label`.
    ///
    /// Counts are summed and papers merged, so [`total`](Self::total) is
    /// unchanged. The folded bucket goes after the remaining labels.
    pub fn collapse_rare(&self, threshold: u64, label: &str) -> AggregationResult {
        if self.axes.is_empty() {
            return self.clone();
        }
        let rare: BTreeSet<String> = self
            .marginals(0)
            .into_iter()
            .filter(|(l, total)| *total < threshold && l != label)
            .map(|(l, _)| l)
            .collect();
        if rare.is_empty() {
            return self.clone();
        }

        let mut first: Vec<String> = self.axes[0]
            .labels
            .iter()
            .filter(|l| !rare.contains(*l) && l.as_str() != label)
            .cloned()
            .collect();
        first.push(label.to_string());

        let mut merged: BTreeMap<Vec<String>, (u64, BTreeSet<String>)> = BTreeMap::new();
        for cell in &self.cells {
            let mut key = cell.key.clone();
            if rare.contains(&key[0]) {
                key[0] = label.to_string();
            }
            let slot = merged.entry(key).or_default();
            slot.0 += cell.count;
            slot.1.extend(cell.papers.iter().cloned());
        }

        let mut axes = self.axes.clone();
        axes[0].labels = first;

        let rest: Vec<Vec<String>> = axes[1..].iter().map(|a| a.labels.clone()).collect();
        let mut cells = Vec::with_capacity(self.cells.len());
        for head in &axes[0].labels {
            for tail in cartesian(&rest) {
                let mut key = vec![head.clone()];
                key.extend(tail);
                let (count, papers) = merged.remove(&key).unwrap_or_default();
                cells.push(Cell {
                    key,
                    count,
                    papers: papers.into_iter().collect(),
                });
            }
        }

        AggregationResult {
            field: self.field.clone(),
            mode: self.mode,
            axes,
            cells,
            contributing_records: self.contributing_records,
            total_entries: self.total_entries,
        }
    }

    /// Keeps only the given first-axis labels, in the given order.
    pub fn retain_labels(&self, keep: &[String]) -> AggregationResult {
        let mut result = self.clone();
        if result.axes.is_empty() {
            return result;
        }
        result.axes[0].labels = keep
            .iter()
            .filter(|l| self.axes[0].labels.contains(l))
            .cloned()
            .collect();
        let order: BTreeMap<&str, usize> = result.axes[0]
            .labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        result.cells.retain(|c| order.contains_key(c.key[0].as_str()));
        // Stable sort keeps the row-major order of the remaining axes.
        result.cells.sort_by_key(|c| order[c.key[0].as_str()]);
        result
    }
}
