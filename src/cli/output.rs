//! Handles all user-facing output for the CLI.
//!
//! Results go to stdout, colored through `termcolor`; fatal errors go to
//! stderr as `miette` reports.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use unicode_width::UnicodeWidthStr;

use crate::audit::AuditSummary;
use crate::cli::args::ColorMode;
use crate::errors::ReviewError;
use crate::label::ParsedTag;
use crate::normalize::{Category, NormalizedEntry};
use crate::pipeline::{Drift, RunSummary};

/// Colors only when asked to, or when stdout is a terminal.
pub fn color_choice(mode: ColorMode) -> ColorChoice {
    match mode {
        ColorMode::Always => ColorChoice::Always,
        ColorMode::Never => ColorChoice::Never,
        ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
        ColorMode::Auto => ColorChoice::Never,
    }
}

pub struct Printer {
    out: StandardStream,
}

impl Printer {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            out: StandardStream::stdout(color_choice(mode)),
        }
    }

    // ========================================================================
    // AUDIT
    // ========================================================================

    pub fn audit(&mut self, summary: &AuditSummary, details: bool) -> io::Result<()> {
        let header = ["field", "cells", "entries", "other", "unparsed", "numeric"];
        let rows: Vec<[String; 6]> = summary
            .fields
            .iter()
            .map(|f| {
                [
                    f.field.clone(),
                    f.non_empty_cells.to_string(),
                    f.entries.to_string(),
                    f.other.to_string(),
                    f.unparsed.to_string(),
                    f.numeric_failures.to_string(),
                ]
            })
            .collect();

        let mut widths = header.map(|h| h.width());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.width());
            }
        }

        self.out.set_color(ColorSpec::new().set_bold(true))?;
        let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        self.row(&header, &widths)?;
        self.out.reset()?;

        for (row, field) in rows.iter().zip(&summary.fields) {
            if !field.is_clean() {
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            }
            self.row(row, &widths)?;
            self.out.reset()?;
        }

        let total = summary.total_issues();
        writeln!(self.out)?;
        if total == 0 {
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(self.out, "{} records, no issues", summary.records)?;
        } else {
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            writeln!(self.out, "{} records, {} issues", summary.records, total)?;
        }
        self.out.reset()?;

        if details {
            for field in summary.fields.iter().filter(|f| !f.is_clean()) {
                writeln!(self.out)?;
                self.out.set_color(ColorSpec::new().set_bold(true))?;
                writeln!(self.out, "{}", field.field)?;
                self.out.reset()?;
                for issue in &field.issues {
                    writeln!(
                        self.out,
                        "  {}: {} {:?}",
                        issue.paper_id, issue.kind, issue.text
                    )?;
                }
            }
        }
        Ok(())
    }

    fn row(&mut self, cells: &[String], widths: &[usize]) -> io::Result<()> {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            let pad = width.saturating_sub(cell.width());
            if i == 0 {
                line.push_str(cell);
                line.push_str(&" ".repeat(pad));
            } else {
                line.push_str("  ");
                line.push_str(&" ".repeat(pad));
                line.push_str(cell);
            }
        }
        writeln!(self.out, "{}", line.trim_end())
    }

    // ========================================================================
    // RUN / CHECK
    // ========================================================================

    pub fn written(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
        write!(self.out, "wrote")?;
        self.out.reset()?;
        writeln!(self.out, " {} artifacts", summary.written.len())?;
        for path in &summary.written {
            writeln!(self.out, "  {}", path.display())?;
        }
        Ok(())
    }

    pub fn drift(&mut self, drift: &[Drift]) -> io::Result<()> {
        if drift.is_empty() {
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            writeln!(self.out, "artifacts are up to date")?;
            return self.out.reset();
        }
        for item in drift {
            self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
            match item {
                Drift::Missing { name } => {
                    writeln!(self.out, "--- {name}: missing ---")?;
                    self.out.reset()?;
                }
                Drift::Changed {
                    name,
                    on_disk,
                    generated,
                } => {
                    writeln!(self.out, "--- {name}: changed ---")?;
                    self.out.reset()?;
                    let changeset = Changeset::new(on_disk, generated, "\n");
                    self.diff(&changeset.diffs)?;
                }
            }
        }
        self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
        writeln!(self.out, "{} artifact(s) out of date", drift.len())?;
        self.out.reset()
    }

    /// Changed lines only; unchanged runs are elided.
    fn diff(&mut self, diffs: &[Difference]) -> io::Result<()> {
        for diff in diffs {
            match diff {
                Difference::Same(_) => {
                    self.out.reset()?;
                    writeln!(self.out, " ...")?;
                }
                Difference::Add(x) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                    for line in x.lines() {
                        writeln!(self.out, "+{line}")?;
                    }
                }
                Difference::Rem(x) => {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                    for line in x.lines() {
                        writeln!(self.out, "-{line}")?;
                    }
                }
            }
        }
        self.out.reset()
    }

    // ========================================================================
    // PARSE
    // ========================================================================

    pub fn parsed(&mut self, tags: &[ParsedTag], entries: &[NormalizedEntry]) -> io::Result<()> {
        if tags.is_empty() {
            writeln!(self.out, "(blank)")?;
            return Ok(());
        }
        for (tag, entry) in tags.iter().zip(entries) {
            let color = match entry.category {
                Category::Known(_) => Color::Green,
                Category::Other => Color::Yellow,
                Category::Unparsed => Color::Red,
            };
            self.out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
            write!(self.out, "{}", entry.label())?;
            self.out.reset()?;
            write!(self.out, "  <- {:?}", tag.category)?;
            if let Some(detail) = &entry.detail {
                write!(self.out, "  detail: {detail:?}")?;
            }
            writeln!(self.out)?;
            for value in &entry.values {
                write!(self.out, "    ")?;
                if let Some(label) = &value.label {
                    write!(self.out, "{label}: ")?;
                }
                write!(self.out, "{}", value.text)?;
                if let Some(quantity) = value.quantity {
                    write!(self.out, "  = {quantity}")?;
                }
                writeln!(self.out)?;
            }
            for issue in &entry.issues {
                self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                writeln!(self.out, "    ! {issue}")?;
                self.out.reset()?;
            }
        }
        Ok(())
    }

    pub fn plain(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")
    }
}

/// Renders a fatal error as a miette report on stderr.
pub fn print_error(error: ReviewError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
