//! Label Parser
//!
//! Converts one raw annotation cell into [`ParsedTag`]s. The parser is purely
//! syntactic: vocabulary matching happens later in [`crate::normalize`].
//!
//! Parsing never fails. Segments the grammar rejects become a single
//! `unparsed` tag carrying the raw text, so every non-blank cell yields at
//! least one tag. Blocks headed by an unspecified marker (`[Un-specified]`,
//! `[Un-specified: 456]`) are dropped, and a cell holding nothing else counts
//! as blank.

use once_cell::sync::Lazy;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;
use tracing::debug;

use crate::label::{bare_quantity, scan_quantity, DetailValue, ParsedTag, TagKind};
use crate::schema::FieldSpec;

#[derive(Parser)]
#[grammar = "label/grammar.pest"]
struct LabelParser;

// Annotator comments, e.g. `[Hadamard Test <see appendix>]`.
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").expect("static regex"));

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a raw cell according to `field`.
///
/// Blank cells, blank markers (`N/A` by default) and cells made only of
/// unspecified blocks yield an empty vector. Tags are returned in
/// left-to-right order.
pub fn parse(cell: &str, field: &FieldSpec) -> Vec<ParsedTag> {
    if field.is_blank(cell) {
        return Vec::new();
    }

    let mut tags = Vec::new();
    let mut skipped = false;
    for segment in split_segments(cell, &field.delimiters) {
        skipped |= parse_segment(segment, field, &mut tags);
    }

    // A cell made only of `[Un-specified]` blocks is blank. One made only of
    // comments or separators stays visible downstream.
    if tags.is_empty() && !skipped {
        tags.push(ParsedTag::unparsed(cell.trim()));
    }
    tags
}

/// Splits `cell` on any of `delimiters` at bracket depth zero.
///
/// Segments are trimmed; empty segments are skipped.
pub fn split_segments<'a>(cell: &'a str, delimiters: &[String]) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;
    let mut i = 0;

    while i < cell.len() {
        let rest = &cell[i..];
        if depth <= 0 {
            if let Some(delim) = delimiters.iter().find(|d| !d.is_empty() && rest.starts_with(d.as_str())) {
                push_segment(&mut segments, &cell[start..i]);
                i += delim.len();
                start = i;
                continue;
            }
        }
        let ch = rest.chars().next().unwrap_or_default();
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            _ => {}
        }
        i += ch.len_utf8().max(1);
    }
    push_segment(&mut segments, &cell[start..]);
    segments
}

fn push_segment<'a>(segments: &mut Vec<&'a str>, segment: &'a str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        segments.push(segment);
    }
}

// ============================================================================
// SEGMENTS
// ============================================================================

/// What became of one `[...]` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Built,
    /// Headed by an unspecified marker, `[Un-specified]` or `[Un-specified: 456]`.
    Skipped,
    /// Syntactically valid but empty, `[ ]` or `[ : x]`.
    Empty,
}

/// Parses one segment into `out`. Returns `true` when a block was skipped
/// as unspecified.
fn parse_segment(raw: &str, field: &FieldSpec, out: &mut Vec<ParsedTag>) -> bool {
    let cleaned = COMMENT.replace_all(raw, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == ',' || c.is_whitespace()) {
        return false;
    }

    if !cleaned.contains(&['[', ']'][..]) {
        if field.is_unspecified(cleaned) {
            return true;
        }
        out.push(ParsedTag::free_text(cleaned));
        return false;
    }

    let pairs = match LabelParser::parse(Rule::segment, cleaned) {
        Ok(pairs) => pairs,
        Err(err) => {
            debug!(field = %field.name, segment = raw, error = %err, "label rejected by grammar");
            out.push(ParsedTag::unparsed(raw));
            return false;
        }
    };

    let mut parsed = Vec::new();
    let mut skipped = false;
    for segment in pairs {
        for pair in segment.into_inner().filter(|p| p.as_rule() == Rule::tag) {
            match build_tags(pair, field, &mut parsed) {
                Block::Built => {}
                Block::Skipped => skipped = true,
                Block::Empty => {
                    out.push(ParsedTag::unparsed(raw));
                    return false;
                }
            }
        }
    }
    out.extend(parsed);
    skipped
}

/// Builds the tags for one `[...]` block.
fn build_tags(pair: Pair<Rule>, field: &FieldSpec, out: &mut Vec<ParsedTag>) -> Block {
    let mut head = "";
    let mut detail = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::head => head = inner.as_str(),
            Rule::detail => detail = Some(inner.as_str().trim()),
            _ => {}
        }
    }

    let head = head.trim();
    if head.is_empty() {
        return Block::Empty;
    }
    if field.is_unspecified(head) {
        debug!(field = %field.name, block = head, "unspecified block skipped");
        return Block::Skipped;
    }

    match detail {
        // `[A, B]` is shorthand for `[A], [B]`.
        None => {
            let items: Vec<&str> = head
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if items.is_empty() {
                return Block::Empty;
            }
            if let Some(tag) = number_list(head, &items, field) {
                out.push(tag);
                return Block::Built;
            }
            let named: Vec<&str> = items
                .into_iter()
                .filter(|item| !field.is_unspecified(item))
                .collect();
            if named.is_empty() {
                return Block::Skipped;
            }
            out.extend(named.into_iter().map(ParsedTag::bracketed));
        }
        Some(detail) => {
            let values = detail_values(head, detail, field);
            out.push(ParsedTag {
                category: head.to_string(),
                detail: (!detail.is_empty() && !field.is_unspecified(detail))
                    .then(|| detail.to_string()),
                values,
                kind: TagKind::Bracketed,
            });
        }
    }
    Block::Built
}

/// `[2, 32]` in a numeric field: one tag under the field's list category,
/// one value per number.
fn number_list(head: &str, items: &[&str], field: &FieldSpec) -> Option<ParsedTag> {
    let category = field.list_category();
    if !field.expects_numeric(category) {
        return None;
    }
    let values = items
        .iter()
        .map(|item| {
            bare_quantity(item).map(|quantity| DetailValue {
                label: None,
                text: item.to_string(),
                quantity: Some(quantity),
            })
        })
        .collect::<Option<Vec<_>>>()?;
    Some(ParsedTag {
        category: category.to_string(),
        detail: Some(head.to_string()),
        values,
        kind: TagKind::NumberList,
    })
}

// ============================================================================
// DETAILS
// ============================================================================

fn detail_values(category: &str, detail: &str, field: &FieldSpec) -> Vec<DetailValue> {
    let numeric = field.expects_numeric(category);
    split_top_level(detail)
        .into_iter()
        .filter_map(|item| detail_value(item, numeric))
        .filter(|value| !field.is_unspecified(&value.text))
        .collect()
}

fn detail_value(item: &str, numeric: bool) -> Option<DetailValue> {
    let mut item = item.trim();
    if item.starts_with('[') && item.ends_with(']') {
        item = item[1..item.len() - 1].trim();
    }
    if item.is_empty() {
        return None;
    }

    let (label, text) = match item.split_once(':') {
        Some((label, text)) if !label.trim().is_empty() => {
            (Some(label.trim().to_string()), text.trim())
        }
        _ => (None, item),
    };

    Some(DetailValue {
        label,
        text: text.to_string(),
        quantity: if numeric { scan_quantity(text) } else { None },
    })
}

/// Splits on commas that are not inside brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delims() -> Vec<String> {
        vec!["\n".into(), ";".into()]
    }

    #[test]
    fn splits_only_at_depth_zero() {
        let cell = "[A: x; y]; [B]\n[C]";
        assert_eq!(split_segments(cell, &delims()), vec!["[A: x; y]", "[B]", "[C]"]);
    }

    #[test]
    fn unclosed_bracket_swallows_the_rest() {
        let cell = "[A: x; [B]";
        assert_eq!(split_segments(cell, &delims()), vec!["[A: x; [B]"]);
    }

    #[test]
    fn nested_values_are_unwrapped() {
        let parts = split_top_level("[H gates: 233], [Pauli-X gates]");
        assert_eq!(parts, vec!["[H gates: 233]", "[Pauli-X gates]"]);
        let value = detail_value(parts[0], true).unwrap();
        assert_eq!(value.label.as_deref(), Some("H gates"));
        assert_eq!(value.text, "233");
        assert!(value.quantity.is_some());
    }
}
