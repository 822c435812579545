//! Review Error Handling
//!
//! Fatal errors stop a run before any aggregation starts: a required column is
//! missing, an input cannot be read, or a configuration file is invalid. They
//! are `miette` diagnostics so the CLI can render them with source snippets.
//!
//! Everything that can go wrong inside a single annotation cell is *not* an
//! error. Those cases are [`IssueKind`]s, collected by the audit and routed to
//! the `other` / `unparsed` buckets so totals are conserved.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use thiserror::Error;

pub type SourceArc = Arc<NamedSource<String>>;

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;

// ============================================================================
// FATAL ERRORS
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum ReviewError {
    #[error("missing required column(s) {missing} in {table}", missing = .columns.join(", "))]
    #[diagnostic(code(review::table::missing_column))]
    MissingColumn {
        table: String,
        columns: Vec<String>,
        #[help]
        help: Option<String>,
    },

    #[error("failed to read {path}")]
    #[diagnostic(code(review::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read table {path}")]
    #[diagnostic(code(review::table::csv))]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("invalid field schema: {message}")]
    #[diagnostic(code(review::schema::invalid))]
    Schema {
        message: String,
        #[source_code]
        src: SourceArc,
        #[label("here")]
        span: Option<SourceSpan>,
        #[help]
        help: Option<String>,
    },

    #[error("invalid report definition: {message}")]
    #[diagnostic(code(review::report::invalid))]
    Report {
        message: String,
        #[source_code]
        src: SourceArc,
        #[label("here")]
        span: Option<SourceSpan>,
        #[help]
        help: Option<String>,
    },

    #[error("failed to walk report directory {path}")]
    #[diagnostic(code(review::report::discovery))]
    Discovery {
        path: String,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to serialize {what}")]
    #[diagnostic(code(review::emit::json))]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ReviewError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn missing_columns(table: &str, columns: Vec<String>, available: &[String]) -> Self {
        Self::MissingColumn {
            table: table.to_string(),
            columns,
            help: Some(format!("available columns: {}", available.join(", "))),
        }
    }

    /// Schema error located by a `serde_yaml` error, when it carries a location.
    pub fn schema_yaml(src: SourceArc, error: &serde_yaml::Error) -> Self {
        Self::Schema {
            message: error.to_string(),
            span: yaml_span(error),
            src,
            help: None,
        }
    }

    pub fn schema(src: SourceArc, message: impl Into<String>, help: Option<String>) -> Self {
        Self::Schema {
            message: message.into(),
            src,
            span: None,
            help,
        }
    }

    pub fn report_yaml(src: SourceArc, error: &serde_yaml::Error) -> Self {
        Self::Report {
            message: error.to_string(),
            span: yaml_span(error),
            src,
            help: None,
        }
    }

    pub fn report(src: SourceArc, message: impl Into<String>, help: Option<String>) -> Self {
        Self::Report {
            message: message.into(),
            src,
            span: None,
            help,
        }
    }

    /// True for the one failure the pipeline treats as a structural problem
    /// with the annotation table itself.
    pub fn is_missing_column(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }
}

fn yaml_span(error: &serde_yaml::Error) -> Option<SourceSpan> {
    error
        .location()
        .map(|loc| SourceSpan::from((loc.index(), 1)))
}

/// Wraps file content for diagnostics.
pub fn named_source(name: impl AsRef<str>, content: impl Into<String>) -> SourceArc {
    Arc::new(NamedSource::new(name.as_ref(), content.into()))
}

// ============================================================================
// NON-FATAL ISSUES
// ============================================================================

/// A recoverable problem found in a single annotation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The cell does not follow the bracket grammar.
    UnparsedLabel,
    /// The category is not part of the field's controlled vocabulary.
    VocabularyMiss,
    /// The field expects a number in the detail but none was found.
    NumericCoercionFailure,
}

impl IssueKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnparsedLabel => "unparsed label",
            Self::VocabularyMiss => "vocabulary miss",
            Self::NumericCoercionFailure => "numeric coercion failure",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
