//! Audit of non-fatal annotation issues.
//!
//! Nothing in a single cell stops a run. The audit is how those problems stay
//! visible: per field, how many cells and entries there were, how many
//! ended up in `other` or `unparsed`, and which papers to go back to.

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::IssueKind;
use crate::normalize::normalize_cell;
use crate::schema::Schema;
use crate::table::AnnotationRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditIssue {
    pub paper_id: String,
    pub kind: IssueKind,
    /// The offending text as written in the cell.
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldAudit {
    pub field: String,
    pub non_empty_cells: usize,
    pub entries: usize,
    pub other: usize,
    pub unparsed: usize,
    pub numeric_failures: usize,
    pub issues: Vec<AuditIssue>,
}

impl FieldAudit {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        match kind {
            IssueKind::UnparsedLabel => self.unparsed,
            IssueKind::VocabularyMiss => self.other,
            IssueKind::NumericCoercionFailure => self.numeric_failures,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub records: usize,
    pub fields: Vec<FieldAudit>,
}

impl AuditSummary {
    pub fn field(&self, name: &str) -> Option<&FieldAudit> {
        self.fields.iter().find(|f| f.field == name)
    }

    pub fn total_issues(&self) -> usize {
        self.fields.iter().map(|f| f.issues.len()).sum()
    }
}

/// Normalizes every schema field of every record and collects the issues,
/// in schema field order then table row order.
pub fn audit(records: &[AnnotationRecord], schema: &Schema) -> AuditSummary {
    let fields = schema
        .fields
        .iter()
        .map(|field| {
            let mut summary = FieldAudit {
                field: field.name.clone(),
                ..FieldAudit::default()
            };
            for record in records {
                let entries = normalize_cell(record.cell(&field.name).unwrap_or(""), field);
                if entries.is_empty() {
                    continue;
                }
                summary.non_empty_cells += 1;
                summary.entries += entries.len();
                for entry in &entries {
                    for kind in &entry.issues {
                        let text = match kind {
                            IssueKind::NumericCoercionFailure => entry
                                .detail
                                .clone()
                                .unwrap_or_else(|| entry.original.clone()),
                            _ => entry.original.clone(),
                        };
                        match kind {
                            IssueKind::UnparsedLabel => {
                                summary.unparsed += 1;
                                warn!(field = %field.name, paper = %record.paper_id, text = %text, "unparsed label");
                            }
                            IssueKind::VocabularyMiss => {
                                summary.other += 1;
                                debug!(field = %field.name, paper = %record.paper_id, text = %text, "counted as other");
                            }
                            IssueKind::NumericCoercionFailure => {
                                summary.numeric_failures += 1;
                                debug!(field = %field.name, paper = %record.paper_id, text = %text, "numeric coercion failed");
                            }
                        }
                        summary.issues.push(AuditIssue {
                            paper_id: record.paper_id.clone(),
                            kind: *kind,
                            text,
                        });
                    }
                }
            }
            summary
        })
        .collect();

    AuditSummary {
        records: records.len(),
        fields,
    }
}
