//! LaTeX artifacts: booktabs tabulars and `\newcommand` number macros.
//!
//! Table layout follows the number of axes:
//!
//! - one axis: a vertical `label & count` table, optionally with a `\cite`
//!   column listing the contributing papers;
//! - two axes: a matrix with the first axis as rows;
//! - more: a long table with one row per non-zero cell.

use crate::aggregate::AggregationResult;
use crate::emit::{axis_title, format_median, ReportData};
use crate::report::ReportDef;

pub fn render(report: &ReportDef, data: &ReportData) -> String {
    match data {
        ReportData::Counts(result) => match result.axes.len() {
            1 => vertical(report, result),
            2 => matrix(report, result),
            _ => long(report, result),
        },
        ReportData::Numeric { field, summaries } => {
            let field = escape(field);
            let defaults = [field.as_str(), "Count", "Min", "Median", "Max"];
            let rows = summaries
                .iter()
                .map(|s| {
                    vec![
                        escape(&s.group),
                        s.count.to_string(),
                        s.min.to_string(),
                        format_median(s.median),
                        s.max.to_string(),
                    ]
                })
                .collect();
            tabular("l|rrrr", headers(report, &defaults), rows)
        }
        ReportData::Combinations { combinations, .. } => {
            let rows = combinations
                .iter()
                .map(|c| vec![escape(&c.label()), c.count.to_string()])
                .collect();
            tabular("l|r", headers(report, &["Combination", "Count"]), rows)
        }
    }
}

fn vertical(report: &ReportDef, result: &AggregationResult) -> String {
    let title = escape(&axis_title(&result.axes[0].dimension, &result.field));
    let papers = result.papers_by(0);
    let rows: Vec<Vec<String>> = result
        .marginals(0)
        .into_iter()
        .zip(papers)
        .map(|((label, count), (_, ids))| {
            let mut row = vec![escape(&label), count.to_string()];
            if report.cite {
                row.push(cite(&ids));
            }
            row
        })
        .collect();

    if report.cite {
        tabular("l|r|l", headers(report, &[title.as_str(), "Count", "Papers"]), rows)
    } else {
        tabular("l|r", headers(report, &[title.as_str(), "Count"]), rows)
    }
}

fn matrix(report: &ReportDef, result: &AggregationResult) -> String {
    let columns = &result.axes[1].labels;
    let mut defaults = vec![String::new()];
    defaults.extend(columns.iter().map(|c| escape(c)));
    let defaults: Vec<&str> = defaults.iter().map(String::as_str).collect();

    let rows = result.axes[0]
        .labels
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = vec![escape(row)];
            cells.extend(
                result.cells[i * columns.len()..(i + 1) * columns.len()]
                    .iter()
                    .map(|c| c.count.to_string()),
            );
            cells
        })
        .collect();

    let spec = format!("l|{}", "c".repeat(columns.len()));
    let mut out = String::new();
    out.push_str(&format!("\\begin{{tabular}}{{{spec}}}\n"));
    out.push_str("    \\toprule[1pt]\n");
    out.push_str(&format!("    {} \\\\\n", headers(report, &defaults).join(" & ")));
    out.push_str(&format!("    \\cmidrule(r){{2-{}}}\n", columns.len() + 1));
    push_rows(&mut out, rows);
    out.push_str("    \\bottomrule[1pt]\n");
    out.push_str("\\end{tabular}\n");
    out
}

fn long(report: &ReportDef, result: &AggregationResult) -> String {
    let titles: Vec<String> = result
        .axes
        .iter()
        .map(|a| escape(&axis_title(&a.dimension, &result.field)))
        .collect();
    let mut defaults: Vec<&str> = titles.iter().map(String::as_str).collect();
    defaults.push("Count");

    let rows = result
        .cells
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| {
            let mut row: Vec<String> = c.key.iter().map(|k| escape(k)).collect();
            row.push(c.count.to_string());
            row
        })
        .collect();
    let spec = format!("{}|r", "l".repeat(result.axes.len()));
    tabular(&spec, headers(report, &defaults), rows)
}

// ============================================================================
// NUMBER MACROS
// ============================================================================

/// `\newcommand{\Name}{value\xspace}`
pub fn newcommand(name: &str, value: u64) -> String {
    format!("\\newcommand{{\\{name}}}{{{value}\\xspace}}")
}

/// The contents of `numbers.tex`.
pub fn numbers(commands: &[(String, u64)]) -> String {
    let mut out = String::new();
    for (name, value) in commands {
        out.push_str(&newcommand(name, *value));
        out.push('\n');
    }
    out
}

// ============================================================================
// HELPERS
// ============================================================================

/// Escapes LaTeX special characters.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(ch);
            }
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            _ => out.push(ch),
        }
    }
    out
}

fn cite(papers: &[String]) -> String {
    if papers.is_empty() {
        String::new()
    } else {
        format!("\\cite{{{}}}", papers.join(", "))
    }
}

/// Caption headers override the defaults position by position.
fn headers(report: &ReportDef, defaults: &[&str]) -> Vec<String> {
    defaults
        .iter()
        .enumerate()
        .map(|(i, default)| {
            report
                .caption_headers
                .get(i)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        })
        .collect()
}

fn tabular(spec: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> String {
    let mut out = String::new();
    out.push_str(&format!("\\begin{{tabular}}{{{spec}}}\n"));
    out.push_str("    \\toprule[1pt]\n");
    out.push_str(&format!("    {} \\\\\n", headers.join(" & ")));
    out.push_str("    \\midrule\n");
    push_rows(&mut out, rows);
    out.push_str("    \\bottomrule[1pt]\n");
    out.push_str("\\end{tabular}\n");
    out
}

fn push_rows(out: &mut String, rows: Vec<Vec<String>>) {
    for row in rows {
        out.push_str(&format!("    {} \\\\\n", row.join(" & ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_specials() {
        assert_eq!(escape("50% of Q#_1 & more"), "50\\% of Q\\#\\_1 \\& more");
        assert_eq!(escape("a~b"), "a\\textasciitilde{}b");
    }

    #[test]
    fn newcommand_uses_xspace() {
        assert_eq!(
            newcommand("NumberOfPrimaryStudies", 56),
            "\\newcommand{\\NumberOfPrimaryStudies}{56\\xspace}"
        );
    }
}
