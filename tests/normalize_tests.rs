// tests/normalize_tests.rs

mod common;

use review_stats::normalize::{normalize_cell, Category};
use review_stats::schema::FieldSpec;
use review_stats::IssueKind;

fn baselines() -> FieldSpec {
    FieldSpec::new("AdoptedBaseline-InclusionMethod")
        .with_vocabulary(["state-of-the-art", "Ablation study"])
        .with_synonym("SOTA competitor", "state-of-the-art")
}

#[test]
fn test_vocabulary_label_has_one_entry() {
    let entries = normalize_cell("[Ablation study]", &baselines());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, Category::Known("Ablation study".into()));
    assert!(!entries[0].numeric);
    assert!(entries[0].issues.is_empty());
}

#[test]
fn test_unknown_category_is_other_with_text() {
    let entries = normalize_cell("[Bespoke Technique]", &baselines());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, Category::Other);
    assert_eq!(entries[0].label(), "other");
    assert_eq!(entries[0].original, "Bespoke Technique");
    assert!(entries[0].has_issue(IssueKind::VocabularyMiss));
}

#[test]
fn test_matching_ignores_case_and_spacing() {
    let entries = normalize_cell("[ablation   STUDY]", &baselines());
    assert_eq!(entries[0].category, Category::Known("Ablation study".into()));
}

#[test]
fn test_synonyms_resolve_first() {
    let entries = normalize_cell("[SOTA competitor]", &baselines());
    assert_eq!(entries[0].category, Category::Known("state-of-the-art".into()));
    assert_eq!(entries[0].original, "SOTA competitor");
}

#[test]
fn test_extensible_field_admits_new_labels() {
    let field = baselines().extensible();
    let entries = normalize_cell("[Bespoke   Technique]", &field);
    assert_eq!(entries[0].category, Category::Known("Bespoke Technique".into()));
    assert!(entries[0].issues.is_empty());
}

#[test]
fn test_numeric_detail() {
    let entries = normalize_cell("[Mutants: 30]\n[Mutation tooling: QMutPy]", &common::field("Mutation"));
    assert_eq!(entries.len(), 2);
    assert!(entries[0].numeric);
    assert_eq!(entries[0].quantities().map(|q| q.min()).collect::<Vec<_>>(), vec![30]);
    assert!(!entries[1].numeric);
    assert!(entries[1].issues.is_empty());
}

#[test]
fn test_numeric_coercion_failure_keeps_text() {
    let entries = normalize_cell("[Mutants: many]", &common::field("Mutation"));
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, Category::Known("Mutants".into()));
    assert!(!entries[0].numeric);
    assert_eq!(entries[0].detail.as_deref(), Some("many"));
    assert!(entries[0].has_issue(IssueKind::NumericCoercionFailure));
}

#[test]
fn test_unparsed_entry() {
    let entries = normalize_cell("[Ablation study", &baselines());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].category, Category::Unparsed);
    assert_eq!(entries[0].label(), "unparsed");
    assert!(entries[0].has_issue(IssueKind::UnparsedLabel));
}

#[test]
fn test_every_tag_becomes_an_entry() {
    let cell = "[Ablation study][Bespoke]\n[SOTA competitor, Random]; broken]";
    let entries = normalize_cell(cell, &baselines());
    let labels: Vec<_> = entries.iter().map(|e| e.label().to_string()).collect();
    assert_eq!(
        labels,
        vec!["Ablation study", "other", "state-of-the-art", "other", "unparsed"]
    );
}
