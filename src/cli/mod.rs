//! The review-stats Command-Line Interface.
//!
//! Parses arguments, installs logging and dispatches to the pipeline. Every
//! subcommand exits with status 1 on a fatal error; `check` also exits 1
//! when artifacts have drifted.

use std::process;

use clap::Parser;
use serde::Serialize;

use crate::cli::args::{Command, InputArgs, PipelineArgs, ReviewArgs};
use crate::cli::output::{print_error, Printer};
use crate::emit::json::to_pretty;
use crate::errors::{Result, ReviewError};
use crate::label::{self, ParsedTag};
use crate::normalize::{normalize, NormalizedEntry};
use crate::schema::{FieldSpec, Schema};
use crate::table::AnnotationTable;
use crate::{audit, logging, pipeline};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = ReviewArgs::parse();
    logging::init(args.verbose);

    let mut printer = Printer::new(args.color);
    let result = match args.command {
        Command::Run { args } => handle_run(&args, &mut printer),
        Command::Audit {
            inputs,
            details,
            json,
        } => handle_audit(&inputs, details, json, &mut printer),
        Command::Parse {
            cell,
            schema,
            field,
            json,
        } => handle_parse(&cell, &schema, field.as_deref(), json, &mut printer),
        Command::Check { args } => handle_check(&args, &mut printer),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================
// Each returns Ok(false) for a non-fatal failure that should still exit 1.

fn handle_run(args: &PipelineArgs, printer: &mut Printer) -> Result<bool> {
    let summary = pipeline::run(&args.to_config())?;
    printer.audit(&summary.audit, false).map_err(stdout_error)?;
    printer.plain("\n").map_err(stdout_error)?;
    printer.written(&summary).map_err(stdout_error)?;
    Ok(true)
}

fn handle_audit(inputs: &InputArgs, details: bool, json: bool, printer: &mut Printer) -> Result<bool> {
    let schema = Schema::load(&inputs.schema)?;
    let table = AnnotationTable::load(&inputs.table, &schema, &[])?;
    let summary = audit::audit(&table.records, &schema);
    if json {
        printer
            .plain(&to_pretty("audit", &summary)?)
            .map_err(stdout_error)?;
    } else {
        printer.audit(&summary, details).map_err(stdout_error)?;
    }
    Ok(true)
}

#[derive(Serialize)]
struct ParseOutput<'a> {
    field: &'a str,
    tags: &'a [ParsedTag],
    entries: &'a [NormalizedEntry],
}

fn handle_parse(
    cell: &str,
    schema_path: &std::path::Path,
    field: Option<&str>,
    json: bool,
    printer: &mut Printer,
) -> Result<bool> {
    let spec = match field {
        Some(name) => {
            let schema = Schema::load(schema_path)?;
            match schema.field(name) {
                Some(spec) => spec.clone(),
                None => {
                    return Err(ReviewError::schema(
                        crate::errors::named_source(schema_path.display().to_string(), ""),
                        format!("no field named '{name}'"),
                        Some(format!(
                            "declared fields: {}",
                            schema.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
                        )),
                    ))
                }
            }
        }
        // An open field with the default parser settings.
        None => FieldSpec::new("cell"),
    };

    // Shells pass `\n` literally.
    let cell = cell.replace("\\n", "\n");
    let tags = label::parse(&cell, &spec);
    let entries = normalize(&tags, &spec);

    if json {
        let output = ParseOutput {
            field: &spec.name,
            tags: &tags,
            entries: &entries,
        };
        printer.plain(&to_pretty("parse output", &output)?).map_err(stdout_error)?;
    } else {
        printer.parsed(&tags, &entries).map_err(stdout_error)?;
    }
    Ok(true)
}

fn handle_check(args: &PipelineArgs, printer: &mut Printer) -> Result<bool> {
    let drift = pipeline::check(&args.to_config())?;
    printer.drift(&drift).map_err(stdout_error)?;
    Ok(drift.is_empty())
}

fn stdout_error(e: std::io::Error) -> ReviewError {
    ReviewError::io("<stdout>", e)
}
