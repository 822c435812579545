// tests/parser_tests.rs

mod common;

use review_stats::label::{parse, Quantity, TagKind, UNPARSED};
use review_stats::schema::FieldSpec;

fn mutation() -> FieldSpec {
    common::field("Mutation")
}

fn open() -> FieldSpec {
    FieldSpec::new("Any")
}

#[test]
fn test_parse_two_tags_with_details() {
    let tags = parse("[Mutants: 30]\n[Mutation tooling: QMutPy]", &mutation());
    assert_eq!(tags.len(), 2);

    assert_eq!(tags[0].category, "Mutants");
    assert_eq!(tags[0].detail.as_deref(), Some("30"));
    assert!(tags[0].is_numeric());
    assert_eq!(tags[0].quantities().collect::<Vec<_>>(), vec![Quantity::Exact(30)]);

    assert_eq!(tags[1].category, "Mutation tooling");
    assert_eq!(tags[1].detail.as_deref(), Some("QMutPy"));
    assert!(!tags[1].is_numeric());
}

#[test]
fn test_parse_is_deterministic() {
    let cell = "[Add gate][Change qubit]; [Specific: [H gates: 233], [Pauli-X gates]]\nfree text";
    let field = open();
    assert_eq!(parse(cell, &field), parse(cell, &field));
}

#[test]
fn test_parse_blank_cells() {
    let field = open();
    for cell in ["", "   ", "N/A", "n/a", "[None]", "[Un-specified]"] {
        assert!(parse(cell, &field).is_empty(), "{cell:?} should be blank");
    }
}

#[test]
fn test_parse_adjacent_and_comma_separated_tags() {
    let field = open();
    let adjacent: Vec<_> = parse("[Add gate][Change qubit][Add gate]", &field)
        .into_iter()
        .map(|t| t.category)
        .collect();
    assert_eq!(adjacent, vec!["Add gate", "Change qubit", "Add gate"]);

    let separated: Vec<_> = parse("[Add gate], [Change qubit]", &field)
        .into_iter()
        .map(|t| t.category)
        .collect();
    assert_eq!(separated, vec!["Add gate", "Change qubit"]);
}

#[test]
fn test_parse_colonless_comma_list() {
    let categories: Vec<_> = parse("[Qiskit, Cirq]", &open())
        .into_iter()
        .map(|t| t.category)
        .collect();
    assert_eq!(categories, vec!["Qiskit", "Cirq"]);
}

#[test]
fn test_parse_nested_detail_values() {
    let field = FieldSpec::new("Gates").numeric();
    let tags = parse("[Specific: [H gates: 233], [Pauli-X gates]]", &field);
    assert_eq!(tags.len(), 1);
    let values = &tags[0].values;
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].label.as_deref(), Some("H gates"));
    assert_eq!(values[0].quantity, Some(Quantity::Exact(233)));
    assert_eq!(values[1].text, "Pauli-X gates");
    assert_eq!(values[1].quantity, None);
    // Not every value carries a number.
    assert!(!tags[0].is_numeric());
}

#[test]
fn test_parse_range() {
    let tags = parse("[Mutants: From 6 to 66]", &mutation());
    assert_eq!(
        tags[0].quantities().collect::<Vec<_>>(),
        vec![Quantity::Range { min: 6, max: 66 }]
    );
}

#[test]
fn test_parse_strips_comments() {
    let tags = parse("[Hadamard test <see appendix B>: 12 <approx>]", &FieldSpec::new("X").numeric());
    assert_eq!(tags[0].category, "Hadamard test");
    assert_eq!(tags[0].detail.as_deref(), Some("12"));
}

#[test]
fn test_parse_unspecified_detail_is_dropped() {
    let tags = parse("[Version-level: Un-specified]", &open());
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].category, "Version-level");
    assert_eq!(tags[0].detail, None);
    assert!(tags[0].values.is_empty());
}

#[test]
fn test_parse_malformed_segments_are_unparsed() {
    let field = open();
    for cell in ["[Add gate", "Add gate]", "[Outer [inner]]", "[: 30]", "[A] stray [B]"] {
        let tags = parse(cell, &field);
        assert_eq!(tags.len(), 1, "{cell:?}");
        assert_eq!(tags[0].kind, TagKind::Unparsed, "{cell:?}");
        assert_eq!(tags[0].category, UNPARSED);
        assert_eq!(tags[0].detail.as_deref(), Some(cell));
    }
}

#[test]
fn test_parse_malformed_segment_keeps_siblings() {
    let tags = parse("[Add gate]\n[Change qubit", &open());
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].kind, TagKind::Bracketed);
    assert_eq!(tags[1].kind, TagKind::Unparsed);
    assert_eq!(tags[1].detail.as_deref(), Some("[Change qubit"));
}

#[test]
fn test_parse_free_text() {
    let tags = parse("Hand-written circuits", &open());
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].kind, TagKind::FreeText);
    assert_eq!(tags[0].category, "Hand-written circuits");
}

#[test]
fn test_parse_custom_delimiters() {
    let field = FieldSpec::new("Tools").with_delimiters(["|"]);
    let tags = parse("[Qiskit] | [Cirq]; [Q#]", &field);
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[1].kind, TagKind::Unparsed);
}

#[test]
fn test_parse_number_list_in_numeric_field() {
    let field = FieldSpec::new("Scalability").with_vocabulary(["Qubits", "Gates", "Depth"]).numeric();
    let tags = parse("[300, 233, From 6 to 66]", &field);
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].kind, TagKind::NumberList);
    assert_eq!(tags[0].category, "Scalability");
    assert_eq!(tags[0].detail.as_deref(), Some("300, 233, From 6 to 66"));
    assert!(tags[0].is_numeric());
    assert_eq!(
        tags[0].quantities().collect::<Vec<_>>(),
        vec![
            Quantity::Exact(300),
            Quantity::Exact(233),
            Quantity::Range { min: 6, max: 66 }
        ]
    );
}

#[test]
fn test_parse_number_list_needs_only_numbers() {
    let field = FieldSpec::new("Scalability").numeric();
    let categories: Vec<_> = parse("[32, Qiskit]", &field).into_iter().map(|t| t.category).collect();
    assert_eq!(categories, vec!["32", "Qiskit"]);

    // Outside numeric fields numbers are ordinary labels.
    let tags = parse("[2, 32]", &open());
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].kind, TagKind::Bracketed);
}

#[test]
fn test_parse_skips_unspecified_blocks() {
    let field = open();
    let categories: Vec<_> = parse("[Quantum state], [Un-specified]", &field)
        .into_iter()
        .map(|t| t.category)
        .collect();
    assert_eq!(categories, vec!["Quantum state"]);

    let categories: Vec<_> = parse("[Quantum gate]; [Un-specified: 456]", &field)
        .into_iter()
        .map(|t| t.category)
        .collect();
    assert_eq!(categories, vec!["Quantum gate"]);

    let categories: Vec<_> = parse("[Quantum state, un-specified]", &field)
        .into_iter()
        .map(|t| t.category)
        .collect();
    assert_eq!(categories, vec!["Quantum state"]);
}

#[test]
fn test_parse_only_unspecified_blocks_is_blank() {
    let field = open();
    assert!(parse("[Un-specified: 456]", &field).is_empty());
    assert!(parse("[Un-specified]\n[Un-specified: 12]", &field).is_empty());
    // Comments alone still surface as unparsed.
    assert_eq!(parse("<tbd>", &field)[0].kind, TagKind::Unparsed);
}
