//! Annotation labels: the bracket micro-syntax used in annotation cells.
//!
//! A cell such as
//!
//! ```text
//! [Mutants: 30]
//! [Mutation tooling: QMutPy]
//! ```
//!
//! parses into one [`ParsedTag`] per bracket. See [`parser::parse`].

pub mod parser;
pub mod quantity;

use serde::Serialize;

pub use parser::{parse, split_segments};
pub use quantity::{bare_quantity, scan_quantity, Quantity};

/// Category given to segments that do not follow the bracket grammar.
pub const UNPARSED: &str = "unparsed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    /// `[Category]` or `[Category: Detail]`.
    Bracketed,
    /// A phrase written without brackets.
    FreeText,
    /// A colon-less list of numbers in a numeric field, `[2, From 6 to 66]`.
    /// The category comes from the schema; `detail` holds the list as written.
    NumberList,
    /// A segment the grammar rejected; `detail` holds the raw text.
    Unparsed,
}

/// One comma-separated item of a tag detail.
///
/// `Mutants: 50` becomes `label = Some("Mutants")`, `text = "50"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
}

impl DetailValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            label: None,
            text: text.into(),
            quantity: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTag {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<DetailValue>,
    pub kind: TagKind,
}

impl ParsedTag {
    pub fn bracketed(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            detail: None,
            values: Vec::new(),
            kind: TagKind::Bracketed,
        }
    }

    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self {
            category: UNPARSED.to_string(),
            detail: Some(raw.into()),
            values: Vec::new(),
            kind: TagKind::Unparsed,
        }
    }

    pub fn free_text(phrase: impl Into<String>) -> Self {
        Self {
            category: phrase.into(),
            detail: None,
            values: Vec::new(),
            kind: TagKind::FreeText,
        }
    }

    /// True when every detail value carries a quantity.
    pub fn is_numeric(&self) -> bool {
        !self.values.is_empty() && self.values.iter().all(|v| v.quantity.is_some())
    }

    pub fn quantities(&self) -> impl Iterator<Item = Quantity> + '_ {
        self.values.iter().filter_map(|v| v.quantity)
    }
}
