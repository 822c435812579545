// tests/aggregate_tests.rs

mod common;

use review_stats::aggregate::{
    aggregate, category_combinations, field_combinations, numeric_summary, CountMode, Dimension,
};
use review_stats::audit::audit;
use review_stats::normalize::normalize_cell;
use review_stats::schema::FieldSpec;

fn counts(field: &str, group_by: &[Dimension], mode: CountMode) -> review_stats::aggregate::AggregationResult {
    let schema = common::schema();
    let table = common::table();
    let spec = schema.field(field).expect("fixture field");
    aggregate(&table.records, spec, group_by, mode, &schema).expect("aggregation succeeds")
}

// ---
// Counting modes
// ---

#[test]
fn test_paper_count_vs_occurrence_count() {
    let field = FieldSpec::new("Operators").with_vocabulary(["Add gate", "Change qubit"]);
    let schema = review_stats::schema::Schema::new("PaperID", "Year");
    let records = vec![common::record(
        "P1",
        Some(2021),
        &[("Operators", "[Add gate][Change qubit][Add gate]")],
    )];

    let papers = aggregate(&records, &field, &[Dimension::Category], CountMode::PaperCount, &schema).unwrap();
    let occurrences =
        aggregate(&records, &field, &[Dimension::Category], CountMode::OccurrenceCount, &schema).unwrap();

    assert_eq!(papers.count(&["Add gate"]), 1);
    assert_eq!(occurrences.count(&["Add gate"]), 2);
    assert_eq!(occurrences.count(&["Change qubit"]), 1);
}

#[test]
fn test_fixture_category_counts() {
    let result = counts("Operators", &[Dimension::Category], CountMode::PaperCount);
    assert_eq!(
        result.axes[0].labels,
        vec!["Add gate", "Change qubit", "Remove gate", "unparsed"]
    );
    assert_eq!(result.count(&["Add gate"]), 2);
    assert_eq!(result.count(&["Change qubit"]), 1);
    assert_eq!(result.count(&["Remove gate"]), 0);
    assert_eq!(result.count(&["unparsed"]), 1);
    assert_eq!(result.cell(&["Add gate"]).unwrap().papers, vec!["P1", "P2"]);
}

// ---
// Conservation
// ---

#[test]
fn test_conservation_over_every_field() {
    let schema = common::schema();
    let table = common::table();
    for field in &schema.fields {
        let non_empty = table
            .records
            .iter()
            .filter(|r| !field.is_blank(r.cell(&field.name).unwrap_or("")))
            .count();
        for record in &table.records {
            let cell = record.cell(&field.name).unwrap_or("");
            if !field.is_blank(cell) {
                assert!(!normalize_cell(cell, field).is_empty(), "{} / {}", field.name, record.paper_id);
            }
        }

        let result = aggregate(&table.records, field, &[Dimension::Category], CountMode::OccurrenceCount, &schema)
            .unwrap();
        assert_eq!(result.contributing_records, non_empty, "{}", field.name);
        assert_eq!(result.total() as usize, result.total_entries, "{}", field.name);
    }
}

#[test]
fn test_fixture_totals() {
    let result = counts("Operators", &[Dimension::Category], CountMode::OccurrenceCount);
    assert_eq!(result.contributing_records, 3);
    assert_eq!(result.total_entries, 5);
    assert_eq!(result.total(), 5);
}

// ---
// Cross-tabulation
// ---

#[test]
fn test_year_axis_is_dense_and_ordered() {
    let result = counts("Operators", &[Dimension::Year, Dimension::Category], CountMode::PaperCount);
    assert_eq!(result.axes[0].labels, vec!["2021", "2022", "n/a"]);
    assert_eq!(result.cells.len(), 3 * 4);
    assert_eq!(result.count(&["2021", "Add gate"]), 1);
    assert_eq!(result.count(&["2022", "Add gate"]), 1);
    assert_eq!(result.count(&["2022", "Change qubit"]), 0);
    assert_eq!(result.count(&["n/a", "unparsed"]), 1);
}

#[test]
fn test_category_by_category() {
    let result = counts(
        "Oracle",
        &[Dimension::Category, Dimension::CategoryOf("Operators".into())],
        CountMode::PaperCount,
    );
    assert_eq!(
        result.axes[0].labels,
        vec!["Metamorphic relation", "Statistical test", "Ablation study", "other"]
    );
    assert_eq!(
        result.axes[1].labels,
        vec!["Add gate", "Change qubit", "Remove gate", "unparsed", "n/a"]
    );
    assert_eq!(result.cells.len(), 20);
    assert_eq!(result.count(&["Metamorphic relation", "Add gate"]), 1);
    assert_eq!(result.count(&["Metamorphic relation", "n/a"]), 1);
    assert_eq!(result.count(&["Metamorphic relation", "Remove gate"]), 0);
    assert_eq!(result.count(&["other", "Add gate"]), 1);
    assert_eq!(result.count(&["Ablation study", "unparsed"]), 1);
}

#[test]
fn test_column_dimension() {
    let result = counts(
        "Oracle",
        &[Dimension::Category, Dimension::Column("Venue".into())],
        CountMode::PaperCount,
    );
    assert_eq!(result.axes[1].labels, vec!["Conference", "Journal", "Workshop"]);
    assert_eq!(result.count(&["Metamorphic relation", "Conference"]), 2);
}

#[test]
fn test_unknown_secondary_field_is_an_error() {
    let schema = common::schema();
    let table = common::table();
    let spec = schema.field("Oracle").unwrap();
    let err = aggregate(
        &table.records,
        spec,
        &[Dimension::Category, Dimension::CategoryOf("Nope".into())],
        CountMode::PaperCount,
        &schema,
    )
    .unwrap_err();
    assert!(err.contains("Nope"));
}

// ---
// Ranking and collapsing
// ---

#[test]
fn test_ranking_and_ties() {
    let result = counts("Oracle", &[Dimension::Category], CountMode::PaperCount);
    let ranked: Vec<_> = result.ranked().into_iter().map(|(l, _)| l).collect();
    assert_eq!(
        ranked,
        vec!["Metamorphic relation", "Ablation study", "Statistical test", "other"]
    );
    assert_eq!(result.top_n(2).len(), 2);
    assert_eq!(result.top_n_with_ties(1).len(), 1);
    assert_eq!(result.top_n_with_ties(2).len(), 4);
}

#[test]
fn test_collapse_rare_conserves_totals() {
    let result = counts("Oracle", &[Dimension::Category], CountMode::PaperCount);
    let collapsed = result.collapse_rare(2, "Others");
    assert_eq!(collapsed.axes[0].labels, vec!["Metamorphic relation", "Others"]);
    assert_eq!(collapsed.count(&["Others"]), 3);
    assert_eq!(collapsed.total(), result.total());
    assert_eq!(collapsed.cell(&["Others"]).unwrap().papers, vec!["P2", "P3", "P4"]);
}

#[test]
fn test_retain_labels_follows_ranking() {
    let result = counts("Operators", &[Dimension::Category], CountMode::OccurrenceCount);
    let keep: Vec<String> = result.top_n(2).into_iter().map(|(l, _)| l).collect();
    let trimmed = result.retain_labels(&keep);
    assert_eq!(trimmed.axes[0].labels, vec!["Add gate", "Change qubit"]);
    assert_eq!(trimmed.cells.len(), 2);
}

// ---
// Numeric summaries and combinations
// ---

#[test]
fn test_numeric_summary_with_range() {
    let table = common::table();
    let summaries = numeric_summary(&table.records, &common::field("Mutation"));
    assert_eq!(summaries.len(), 1);
    let mutants = &summaries[0];
    assert_eq!(mutants.group, "Mutants");
    assert_eq!(mutants.values, vec![6, 30, 66]);
    assert_eq!(mutants.count, 3);
    assert_eq!((mutants.min, mutants.max), (6, 66));
    assert_eq!(mutants.median, 30.0);
    assert_eq!(mutants.papers, vec!["P1", "P2"]);
}

#[test]
fn test_field_combinations() {
    let schema = common::schema();
    let table = common::table();
    let fields: Vec<&FieldSpec> = ["Operators", "Oracle", "Mutation"]
        .iter()
        .map(|name| schema.field(name).unwrap())
        .collect();
    let combinations = field_combinations(&table.records, &fields);
    let rows: Vec<(String, u64)> = combinations.iter().map(|c| (c.label(), c.count)).collect();
    assert_eq!(
        rows,
        vec![
            ("Mutation & Operators & Oracle".to_string(), 2),
            ("Mutation & Oracle".to_string(), 1),
            ("Operators & Oracle".to_string(), 1),
        ]
    );
}

#[test]
fn test_category_combinations() {
    let table = common::table();
    let combinations = category_combinations(&table.records, &common::field("Oracle"));
    let labels: Vec<String> = combinations.iter().map(|c| c.label()).collect();
    assert_eq!(
        labels,
        vec![
            "Ablation study",
            "Metamorphic relation",
            "Metamorphic relation & Statistical test",
            "other",
        ]
    );
}

// ---
// Audit
// ---

#[test]
fn test_audit_of_fixture() {
    let summary = audit(&common::table().records, &common::schema());
    assert_eq!(summary.records, 4);
    let operators = summary.field("Operators").unwrap();
    assert_eq!((operators.non_empty_cells, operators.entries, operators.unparsed), (3, 5, 1));
    assert_eq!(summary.field("Oracle").unwrap().other, 1);
    let mutation = summary.field("Mutation").unwrap();
    assert_eq!(mutation.numeric_failures, 1);
    assert_eq!(mutation.issues[0].paper_id, "P3");
    assert_eq!(summary.total_issues(), 3);
}

#[test]
fn test_numeric_summary_of_number_lists() {
    let field = FieldSpec::new("Scalability")
        .with_vocabulary(["Qubits", "Gates", "Depth"])
        .numeric();
    let records = vec![
        common::record("P1", Some(2021), &[("Scalability", "[2, 32]")]),
        common::record("P2", Some(2022), &[("Scalability", "[From 6 to 66]")]),
        common::record("P3", Some(2022), &[("Scalability", "[Qubits: 5]")]),
    ];

    let summaries = numeric_summary(&records, &field);
    let groups: Vec<&str> = summaries.iter().map(|s| s.group.as_str()).collect();
    assert_eq!(groups, vec!["Qubits", "Scalability"]);

    let lists = &summaries[1];
    assert_eq!(lists.values, vec![2, 6, 32, 66]);
    assert_eq!((lists.min, lists.max), (2, 66));
    assert_eq!(lists.median, 19.0);
    assert_eq!(lists.papers, vec!["P1", "P2"]);

    let entries = normalize_cell("[2, 32]", &field);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].numeric);
    assert!(entries[0].issues.is_empty());
}

#[test]
fn test_number_list_category_from_schema() {
    let field = FieldSpec::new("Scalability")
        .with_vocabulary(["Qubits", "Gates"])
        .with_number_list_category("qubits");
    let records = vec![common::record("P1", None, &[("Scalability", "[2, 32]")])];
    let summaries = numeric_summary(&records, &field);
    assert_eq!(summaries[0].group, "Qubits");
    assert_eq!(summaries[0].count, 2);
}

// ---
// Open vocabularies
// ---

#[test]
fn test_discovered_labels_merge_case_variants() {
    let field = FieldSpec::new("Tools");
    let schema = review_stats::schema::Schema::new("PaperID", "Year").with_field(field.clone());
    let records = vec![
        common::record("P1", Some(2021), &[("Tools", "[Qiskit]")]),
        common::record("P2", Some(2022), &[("Tools", "[qiskit]")]),
        common::record("P3", Some(2022), &[("Tools", "[other]")]),
    ];

    let result = aggregate(&records, &field, &[Dimension::Category], CountMode::PaperCount, &schema).unwrap();
    assert_eq!(result.axes[0].labels, vec!["Qiskit", "other"]);
    assert_eq!(result.count(&["Qiskit"]), 2);
    assert_eq!(result.count(&["other"]), 1);

    let summary = audit(&records, &schema);
    assert_eq!(summary.field("Tools").unwrap().other, 1);

    let labels: Vec<String> = category_combinations(&records, &field).iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["Qiskit", "other"]);
}
