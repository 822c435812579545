//! Report definitions.
//!
//! One YAML file per research question, each holding a list of reports:
//!
//! ```yaml
//! - name: rq2_baselines
//!   field: AdoptedBaseline-InclusionMethod
//!   group_by: [category]
//!   mode: paper-count
//!   top: 5
//!   outputs: [csv, latex]
//!   commands:
//!     - name: NumberOfAblationStudies
//!       value: count:Ablation study
//! ```
//!
//! Files are discovered recursively under the reports directory and loaded
//! in path order, so report order (and `numbers.tex`) is stable.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::aggregate::{CountMode, Dimension};
use crate::errors::{named_source, Result, ReviewError, SourceArc};
use crate::schema::Schema;

pub const DEFAULT_OTHERS_LABEL: &str = "Others";

/// Base names of the artifacts every run writes.
pub const RESERVED_NAMES: &[&str] = &["numbers", "manifest"];

// ============================================================================
// DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Category counts over `group_by`.
    #[default]
    Counts,
    /// Distribution of numeric details per category.
    Numeric,
    /// Co-occurrence of categories, or of whole fields.
    Combinations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Csv,
    Json,
    Latex,
}

impl OutputFormat {
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Latex => "tex",
        }
    }
}

/// What a number macro expands to, written as a string in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NumberValue {
    /// Records with a non-blank cell for the field.
    Contributing,
    /// Total entries of the field.
    Entries,
    /// Categories with a non-zero count; needs `category` as the first dimension.
    Distinct,
    /// First-axis total of one label.
    Count(String),
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contributing => f.write_str("contributing"),
            Self::Entries => f.write_str("entries"),
            Self::Distinct => f.write_str("distinct"),
            Self::Count(label) => write!(f, "count:{label}"),
        }
    }
}

impl FromStr for NumberValue {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "contributing" => Ok(Self::Contributing),
            "entries" => Ok(Self::Entries),
            "distinct" => Ok(Self::Distinct),
            other => match other.split_once(':') {
                Some(("count", label)) if !label.trim().is_empty() => {
                    Ok(Self::Count(label.trim().to_string()))
                }
                _ => Err(format!(
                    "unknown number value '{other}' (expected contributing, entries, distinct or count:<label>)"
                )),
            },
        }
    }
}

impl TryFrom<String> for NumberValue {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NumberValue> for String {
    fn from(value: NumberValue) -> Self {
        value.to_string()
    }
}

/// A `\newcommand` emitted into `numbers.tex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NumberCommand {
    /// Macro name without the backslash; letters only.
    pub name: String,
    pub value: NumberValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportDef {
    /// Artifact base name.
    pub name: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub kind: ReportKind,
    #[serde(default = "default_group_by")]
    pub group_by: Vec<Dimension>,
    #[serde(default)]
    pub mode: CountMode,
    /// Keep the `top` highest ranked labels of the first axis.
    #[serde(default)]
    pub top: Option<usize>,
    /// With `top`, also keep labels tied with the last kept one.
    #[serde(default)]
    pub ties: bool,
    /// Fold first-axis labels with a total below this into `others_label`.
    #[serde(default)]
    pub collapse_below: Option<u64>,
    #[serde(default = "default_others_label")]
    pub others_label: String,
    /// Fields compared by a `combinations` report.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputFormat>,
    #[serde(default)]
    pub commands: Vec<NumberCommand>,
    /// Header cells of the LaTeX table; defaults to the axis names.
    #[serde(default)]
    pub caption_headers: Vec<String>,
    /// Add a `\cite{}` column of contributing papers to one-axis tables.
    #[serde(default)]
    pub cite: bool,
}

fn default_group_by() -> Vec<Dimension> {
    vec![Dimension::Category]
}

fn default_others_label() -> String {
    DEFAULT_OTHERS_LABEL.to_string()
}

fn default_outputs() -> Vec<OutputFormat> {
    vec![OutputFormat::Csv, OutputFormat::Json]
}

impl ReportDef {
    /// Columns the annotation table must carry for this report.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        columns.extend(self.field.iter().cloned());
        columns.extend(self.fields.iter().cloned());
        if self.kind == ReportKind::Counts {
            for dim in &self.group_by {
                match dim {
                    Dimension::Column(name) | Dimension::CategoryOf(name) => {
                        columns.push(name.clone())
                    }
                    _ => {}
                }
            }
        }
        columns
    }

    fn validate(&self, schema: &Schema) -> std::result::Result<(), (String, Option<String>)> {
        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err((
                format!("report name '{}' is not a valid file name", self.name),
                Some("use letters, digits, '_', '-' and '.'".into()),
            ));
        }
        if RESERVED_NAMES.contains(&self.name.as_str()) {
            return Err((
                format!("report name '{}' is reserved", self.name),
                Some(format!("reserved names: {}", RESERVED_NAMES.join(", "))),
            ));
        }

        let known = |name: &str| -> std::result::Result<(), (String, Option<String>)> {
            if schema.field(name).is_some() {
                Ok(())
            } else {
                Err((
                    format!("report '{}' refers to unknown field '{}'", self.name, name),
                    Some(format!(
                        "declared fields: {}",
                        schema.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
                    )),
                ))
            }
        };

        match (&self.field, self.kind) {
            (Some(field), _) => known(field)?,
            (None, ReportKind::Combinations) if !self.fields.is_empty() => {}
            (None, _) => {
                return Err((format!("report '{}' has no `field`", self.name), None));
            }
        }
        for field in &self.fields {
            known(field)?;
        }

        if self.kind == ReportKind::Counts {
            if self.group_by.is_empty() {
                return Err((
                    format!("report '{}' has an empty `group_by`", self.name),
                    Some("use at least `[category]`".into()),
                ));
            }
            for dim in &self.group_by {
                if let Dimension::CategoryOf(name) = dim {
                    known(name)?;
                }
            }
            let ranks_categories = self.group_by[0] == Dimension::Category;
            if (self.top.is_some() || self.collapse_below.is_some()) && !ranks_categories {
                return Err((
                    format!(
                        "report '{}' uses `top` or `collapse_below` but its first dimension is '{}'",
                        self.name, self.group_by[0]
                    ),
                    Some("put `category` first in `group_by`".into()),
                ));
            }
        } else if !self.commands.is_empty() {
            return Err((
                format!("report '{}' declares commands but only counts reports emit numbers", self.name),
                None,
            ));
        }

        for command in &self.commands {
            if command.name.is_empty() || !command.name.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err((
                    format!("command name '{}' is not a valid LaTeX macro name", command.name),
                    Some("LaTeX macro names consist of letters only".into()),
                ));
            }
            if command.value == NumberValue::Distinct && self.group_by.first() != Some(&Dimension::Category) {
                return Err((
                    format!(
                        "command '{}' counts distinct categories but report '{}' does not group by category first",
                        command.name, self.name
                    ),
                    Some("put `category` first in `group_by`".into()),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// One report file with its raw text (digested into the manifest).
#[derive(Debug, Clone)]
pub struct ReportFile {
    pub path: PathBuf,
    pub text: String,
    pub reports: Vec<ReportDef>,
}

/// Recursively finds `.yaml` / `.yml` files under `root`, sorted by path.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| ReviewError::Discovery {
            path: root.display().to_string(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        ) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Parses and validates one report file.
pub fn parse_file(name: &str, text: &str, schema: &Schema) -> Result<Vec<ReportDef>> {
    let src = named_source(name, text);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let reports: Vec<ReportDef> =
        serde_yaml::from_str(text).map_err(|e| ReviewError::report_yaml(src.clone(), &e))?;
    for report in &reports {
        report
            .validate(schema)
            .map_err(|(message, help)| ReviewError::report(src.clone(), message, help))?;
    }
    Ok(reports)
}

/// Loads every report file under `root`.
///
/// Report names and command names must be unique across all files.
pub fn load(root: &Path, schema: &Schema) -> Result<Vec<ReportFile>> {
    let mut files = Vec::new();
    let mut names = BTreeSet::new();
    let mut commands = BTreeSet::new();

    for path in discover(root)? {
        let text = fs::read_to_string(&path).map_err(|e| ReviewError::io(&path, e))?;
        let file_name = path.display().to_string();
        let reports = parse_file(&file_name, &text, schema)?;
        let src = named_source(&file_name, text.as_str());

        for report in &reports {
            if !names.insert(report.name.clone()) {
                return Err(duplicate(src, "report", &report.name));
            }
            for command in &report.commands {
                if !commands.insert(command.name.clone()) {
                    return Err(duplicate(src, "command", &command.name));
                }
            }
        }
        debug!(file = %file_name, reports = reports.len(), "report file loaded");
        files.push(ReportFile {
            path,
            text,
            reports,
        });
    }
    Ok(files)
}

fn duplicate(src: SourceArc, what: &str, name: &str) -> ReviewError {
    ReviewError::report(
        src,
        format!("{what} '{name}' is defined more than once"),
        Some(format!("{what} names must be unique across all report files")),
    )
}

/// Every column the given reports need, deduplicated, in first-use order.
pub fn required_columns<'a>(reports: impl IntoIterator<Item = &'a ReportDef>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for report in reports {
        for column in report.columns() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    columns
}
