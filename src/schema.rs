//! Field schema: the explicit description of every annotation column.
//!
//! A [`FieldSpec`] tells the parser how to split a cell, which categories
//! the field accepts, which spellings are synonyms, and where numbers are
//! expected. The [`Schema`] groups the field specs with the identity
//! columns of the table and is loaded from YAML:
//!
//! ```yaml
//! id_column: PaperID
//! year_column: Year
//! defaults:
//!   delimiters: ["\n", ";"]
//! fields:
//!   - name: AdoptedBaseline-InclusionMethod
//!     vocabulary: [state-of-the-art, Ablation study]
//!     synonyms: { SOTA competitor: state-of-the-art }
//!     extensible: true
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{named_source, Result, ReviewError};
use crate::label::UNPARSED;
use crate::normalize::OTHER;

// ============================================================================
// DEFAULTS
// ============================================================================

pub const DEFAULT_DELIMITERS: &[&str] = &["\n", ";"];
pub const DEFAULT_BLANK_MARKERS: &[&str] = &["N/A", "[None]", "[Un-specified]"];
pub const DEFAULT_UNSPECIFIED_MARKERS: &[&str] = &["Un-specified"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Lowercase with runs of whitespace collapsed to a single space.
pub fn match_key(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True for labels that would collide with the `other` / `unparsed` buckets.
pub fn is_reserved(label: &str) -> bool {
    let key = match_key(label);
    key == OTHER || key == UNPARSED
}

/// Parser settings shared by every field unless the field overrides them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParserDefaults {
    #[serde(default = "default_delimiters")]
    pub delimiters: Vec<String>,
    #[serde(default = "default_blank_markers")]
    pub blank_markers: Vec<String>,
    #[serde(default = "default_unspecified_markers")]
    pub unspecified_markers: Vec<String>,
}

fn default_delimiters() -> Vec<String> {
    strings(DEFAULT_DELIMITERS)
}

fn default_blank_markers() -> Vec<String> {
    strings(DEFAULT_BLANK_MARKERS)
}

fn default_unspecified_markers() -> Vec<String> {
    strings(DEFAULT_UNSPECIFIED_MARKERS)
}

impl Default for ParserDefaults {
    fn default() -> Self {
        Self {
            delimiters: default_delimiters(),
            blank_markers: default_blank_markers(),
            unspecified_markers: default_unspecified_markers(),
        }
    }
}

// ============================================================================
// FIELD SPEC
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// Column name in the annotation table.
    pub name: String,
    /// Accepted category labels, in presentation order.
    #[serde(default)]
    pub vocabulary: Vec<String>,
    /// Alternative spelling -> vocabulary label.
    #[serde(default)]
    pub synonyms: BTreeMap<String, String>,
    /// Admit categories outside the vocabulary as their own labels.
    #[serde(default)]
    pub extensible: bool,
    #[serde(default)]
    pub delimiters: Vec<String>,
    /// Scan tag details for quantities.
    #[serde(default)]
    pub numeric: bool,
    /// Restricts `numeric` to these categories; empty means all of them.
    #[serde(default)]
    pub numeric_categories: Vec<String>,
    /// Category of bare number lists such as `[2, 32]`; the field name when unset.
    #[serde(default)]
    pub number_list_category: Option<String>,
    #[serde(default)]
    pub blank_markers: Vec<String>,
    #[serde(default)]
    pub unspecified_markers: Vec<String>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldSpec {
    /// A closed field with an empty vocabulary and the default parser settings.
    pub fn new(name: impl Into<String>) -> Self {
        let mut spec = Self {
            name: name.into(),
            vocabulary: Vec::new(),
            synonyms: BTreeMap::new(),
            extensible: false,
            delimiters: Vec::new(),
            numeric: false,
            numeric_categories: Vec::new(),
            number_list_category: None,
            blank_markers: Vec::new(),
            unspecified_markers: Vec::new(),
            required: true,
        };
        spec.apply_defaults(&ParserDefaults::default());
        spec
    }

    pub fn with_vocabulary<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_synonym(mut self, alias: impl Into<String>, label: impl Into<String>) -> Self {
        self.synonyms.insert(alias.into(), label.into());
        self
    }

    pub fn extensible(mut self) -> Self {
        self.extensible = true;
        self
    }

    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub fn with_numeric_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric = true;
        self.numeric_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_number_list_category(mut self, category: impl Into<String>) -> Self {
        self.numeric = true;
        self.number_list_category = Some(category.into());
        self
    }

    pub fn with_delimiters<I, S>(mut self, delimiters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delimiters = delimiters.into_iter().map(Into::into).collect();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn apply_defaults(&mut self, defaults: &ParserDefaults) {
        if self.delimiters.is_empty() {
            self.delimiters = defaults.delimiters.clone();
        }
        if self.blank_markers.is_empty() {
            self.blank_markers = defaults.blank_markers.clone();
        }
        if self.unspecified_markers.is_empty() {
            self.unspecified_markers = defaults.unspecified_markers.clone();
        }
    }

    /// Fields without a declared vocabulary are open enumerations.
    pub fn is_extensible(&self) -> bool {
        self.extensible || self.vocabulary.is_empty()
    }

    pub fn declares(&self, label: &str) -> bool {
        let key = match_key(label);
        self.vocabulary.iter().any(|v| match_key(v) == key)
    }

    /// Maps a raw category onto its vocabulary label.
    ///
    /// Synonyms are consulted first, then the vocabulary. Returns `None` when
    /// the category is unknown.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let mut key = match_key(raw);
        if let Some((_, target)) = self.synonyms.iter().find(|(alias, _)| match_key(alias) == key) {
            key = match_key(target);
            if !self.declares(target) {
                return Some(collapse_whitespace(target));
            }
        }
        self.vocabulary
            .iter()
            .find(|label| match_key(label) == key)
            .cloned()
    }

    pub fn expects_numeric(&self, category: &str) -> bool {
        if !self.numeric {
            return false;
        }
        if self.numeric_categories.is_empty() {
            return true;
        }
        let raw = match_key(category);
        let resolved = self.resolve(category).map(|label| match_key(&label));
        self.numeric_categories.iter().any(|c| {
            let key = match_key(c);
            key == raw || resolved.as_deref() == Some(key.as_str())
        })
    }

    /// The category a bare number list is counted under.
    pub fn list_category(&self) -> &str {
        self.number_list_category.as_deref().unwrap_or(&self.name)
    }

    pub fn is_blank(&self, cell: &str) -> bool {
        let key = match_key(cell);
        key.is_empty() || self.blank_markers.iter().any(|m| match_key(m) == key)
    }

    pub fn is_unspecified(&self, value: &str) -> bool {
        let key = match_key(value);
        self.unspecified_markers.iter().any(|m| match_key(m) == key)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    pub id_column: String,
    pub year_column: String,
    #[serde(default)]
    pub defaults: ParserDefaults,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(id_column: impl Into<String>, year_column: impl Into<String>) -> Self {
        Self {
            id_column: id_column.into(),
            year_column: year_column.into(),
            defaults: ParserDefaults::default(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, mut field: FieldSpec) -> Self {
        field.apply_defaults(&self.defaults);
        self.fields.push(field);
        self
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| ReviewError::io(path, e))?;
        Self::from_yaml(&path.display().to_string(), &text)
    }

    pub fn from_yaml(name: &str, text: &str) -> Result<Self> {
        let src = named_source(name, text);
        let mut schema: Schema =
            serde_yaml::from_str(text).map_err(|e| ReviewError::schema_yaml(src.clone(), &e))?;

        let defaults = schema.defaults.clone();
        for field in &mut schema.fields {
            field.apply_defaults(&defaults);
        }

        if let Some(problem) = schema.validate() {
            let (message, help) = problem;
            return Err(ReviewError::schema(src, message, help));
        }
        Ok(schema)
    }

    /// Returns the first structural problem, if any.
    fn validate(&self) -> Option<(String, Option<String>)> {
        let mut seen = std::collections::BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Some((format!("field '{}' is declared twice", field.name), None));
            }
            if field.delimiters.iter().any(|d| d.is_empty()) {
                return Some((
                    format!("field '{}' has an empty delimiter", field.name),
                    None,
                ));
            }
            if field.number_list_category.is_some() && !field.numeric {
                return Some((
                    format!("field '{}' sets `number_list_category` but is not numeric", field.name),
                    Some("add `numeric: true`".into()),
                ));
            }
            let reserved = field
                .vocabulary
                .iter()
                .chain(field.synonyms.values())
                .find(|label| is_reserved(label));
            if let Some(label) = reserved {
                return Some((
                    format!("field '{}' uses the reserved label '{}'", field.name, label),
                    Some(format!("'{OTHER}' and '{UNPARSED}' name the buckets of unmatched and malformed labels")),
                ));
            }
            if field.is_extensible() {
                continue;
            }
            for (alias, target) in &field.synonyms {
                if !field.declares(target) {
                    return Some((
                        format!(
                            "synonym '{}' of field '{}' points to '{}', which is not in its vocabulary",
                            alias, field.name, target
                        ),
                        Some("add the label to `vocabulary` or mark the field `extensible`".into()),
                    ));
                }
            }
        }
        None
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Identity columns plus every field marked `required`.
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns = vec![self.id_column.clone(), self.year_column.clone()];
        columns.extend(
            self.fields
                .iter()
                .filter(|f| f.required)
                .map(|f| f.name.clone()),
        );
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_resolve_before_vocabulary() {
        let field = FieldSpec::new("Baseline")
            .with_vocabulary(["state-of-the-art", "Ablation study"])
            .with_synonym("SOTA competitor", "state-of-the-art");
        assert_eq!(field.resolve("  sota   COMPETITOR "), Some("state-of-the-art".into()));
        assert_eq!(field.resolve("ablation study"), Some("Ablation study".into()));
        assert_eq!(field.resolve("Random"), None);
    }

    #[test]
    fn numeric_categories_restrict_scanning() {
        let field = FieldSpec::new("Mutation").with_numeric_categories(["Mutants"]);
        assert!(field.expects_numeric("mutants"));
        assert!(!field.expects_numeric("Mutation tooling"));
    }

    #[test]
    fn blank_markers_are_case_insensitive() {
        let field = FieldSpec::new("Oracle");
        assert!(field.is_blank("  n/a "));
        assert!(field.is_blank("[un-specified]"));
        assert!(field.is_blank(""));
        assert!(!field.is_blank("[Y]"));
    }

    #[test]
    fn dangling_synonym_is_rejected() {
        let yaml = r#"
id_column: PaperID
year_column: Year
fields:
  - name: Baseline
    vocabulary: [Ablation study]
    synonyms: { SOTA competitor: state-of-the-art }
"#;
        let err = Schema::from_yaml("schema.yaml", yaml).unwrap_err();
        assert!(err.to_string().contains("SOTA competitor"));
    }

    #[test]
    fn defaults_flow_into_fields() {
        let yaml = r#"
id_column: PaperID
year_column: Year
defaults:
  delimiters: ["|"]
fields:
  - name: Oracle
  - name: Programs
    delimiters: ["\n"]
"#;
        let schema = Schema::from_yaml("schema.yaml", yaml).unwrap();
        assert_eq!(schema.field("Oracle").unwrap().delimiters, vec!["|"]);
        assert_eq!(schema.field("Programs").unwrap().delimiters, vec!["\n"]);
        assert_eq!(
            schema.field("Oracle").unwrap().blank_markers,
            strings(DEFAULT_BLANK_MARKERS)
        );
    }

    #[test]
    fn bucket_names_are_reserved() {
        let yaml = r#"
id_column: PaperID
year_column: Year
fields:
  - name: Oracle
    vocabulary: [Metamorphic relation, Other]
"#;
        let err = Schema::from_yaml("schema.yaml", yaml).unwrap_err();
        assert!(err.to_string().contains("reserved label 'Other'"));
    }

    #[test]
    fn number_list_category_defaults_to_field_name() {
        let field = FieldSpec::new("Scalability").numeric();
        assert_eq!(field.list_category(), "Scalability");
        let field = field.with_number_list_category("Qubits");
        assert_eq!(field.list_category(), "Qubits");
    }
}
