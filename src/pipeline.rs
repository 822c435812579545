//! The batch pipeline: load, validate, aggregate, emit.
//!
//! All inputs are loaded and validated before anything is computed, and all
//! artifacts are generated in memory before anything is written. A missing
//! column or an invalid report therefore leaves the output directory
//! untouched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::aggregate::{
    aggregate, category_combinations, field_combinations, numeric_summary, AggregationResult,
};
use crate::audit::{audit, AuditSummary};
use crate::emit::{self, latex, Artifact, ReportData};
use crate::errors::{named_source, Result, ReviewError};
use crate::report::{self, NumberValue, ReportDef, ReportFile, ReportKind};
use crate::schema::{match_key, Schema};
use crate::table::AnnotationTable;

pub const NUMBERS_FILE: &str = "numbers.tex";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const PRIMARY_STUDIES_COMMAND: &str = "NumberOfPrimaryStudies";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub table: PathBuf,
    pub schema: PathBuf,
    pub reports: PathBuf,
    pub out: PathBuf,
}

/// An input file with its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputDigest {
    /// File name, or the path below the reports directory for report files.
    pub name: String,
    pub sha256: String,
}

/// Everything a run needs, validated.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub schema: Schema,
    pub reports: Vec<ReportFile>,
    pub table: AnnotationTable,
    pub digests: Vec<InputDigest>,
}

impl Inputs {
    pub fn report_defs(&self) -> impl Iterator<Item = &ReportDef> {
        self.reports.iter().flat_map(|file| file.reports.iter())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

// ============================================================================
// LOADING
// ============================================================================

/// Loads the schema, then the reports, then the table.
///
/// The table is checked for the schema's required columns and for every
/// column a report refers to.
pub fn load_inputs(config: &RunConfig) -> Result<Inputs> {
    let schema_text =
        fs::read_to_string(&config.schema).map_err(|e| ReviewError::io(&config.schema, e))?;
    let schema = Schema::from_yaml(&config.schema.display().to_string(), &schema_text)?;

    let reports = report::load(&config.reports, &schema)?;
    let extra_columns = report::required_columns(reports.iter().flat_map(|f| f.reports.iter()));

    let table_bytes = fs::read(&config.table).map_err(|e| ReviewError::io(&config.table, e))?;
    let table = AnnotationTable::from_reader(
        &config.table.display().to_string(),
        table_bytes.as_slice(),
        &schema,
        &extra_columns,
    )?;

    let mut digests = vec![
        InputDigest {
            name: file_name(&config.table),
            sha256: sha256_hex(&table_bytes),
        },
        InputDigest {
            name: file_name(&config.schema),
            sha256: sha256_hex(schema_text.as_bytes()),
        },
    ];
    for file in &reports {
        let name = file
            .path
            .strip_prefix(&config.reports)
            .unwrap_or(&file.path)
            .to_string_lossy()
            .replace('\\', "/");
        digests.push(InputDigest {
            name,
            sha256: sha256_hex(file.text.as_bytes()),
        });
    }

    info!(
        records = table.records.len(),
        fields = schema.fields.len(),
        reports = reports.iter().map(|f| f.reports.len()).sum::<usize>(),
        "inputs loaded"
    );
    Ok(Inputs {
        schema,
        reports,
        table,
        digests,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// GENERATION
// ============================================================================

/// Computes one report.
pub fn compute(report: &ReportDef, inputs: &Inputs) -> Result<ReportData> {
    let records = &inputs.table.records;
    let schema = &inputs.schema;
    let field = |name: &str| {
        schema.field(name).ok_or_else(|| {
            ReviewError::report(
                named_source(&report.name, ""),
                format!("report '{}' refers to unknown field '{}'", report.name, name),
                None,
            )
        })
    };

    let data = match report.kind {
        ReportKind::Counts => {
            let spec = field(report.field.as_deref().unwrap_or_default())?;
            let result = aggregate(records, spec, &report.group_by, report.mode, schema)
                .map_err(|message| ReviewError::report(named_source(&report.name, ""), message, None))?;
            ReportData::Counts(shape(report, result))
        }
        ReportKind::Numeric => {
            let spec = field(report.field.as_deref().unwrap_or_default())?;
            ReportData::Numeric {
                field: spec.name.clone(),
                summaries: numeric_summary(records, spec),
            }
        }
        ReportKind::Combinations if !report.fields.is_empty() => {
            let specs = report
                .fields
                .iter()
                .map(|name| field(name))
                .collect::<Result<Vec<_>>>()?;
            ReportData::Combinations {
                subject: report.fields.clone(),
                combinations: field_combinations(records, &specs),
            }
        }
        ReportKind::Combinations => {
            let spec = field(report.field.as_deref().unwrap_or_default())?;
            ReportData::Combinations {
                subject: vec![spec.name.clone()],
                combinations: category_combinations(records, spec),
            }
        }
    };
    Ok(data)
}

/// Applies `collapse_below`, then `top`, to the first axis.
fn shape(report: &ReportDef, result: AggregationResult) -> AggregationResult {
    let mut result = match report.collapse_below {
        Some(threshold) => result.collapse_rare(threshold, &report.others_label),
        None => result,
    };
    if let Some(n) = report.top {
        let kept = if report.ties {
            result.top_n_with_ties(n)
        } else {
            result.top_n(n)
        };
        let labels: Vec<String> = kept.into_iter().map(|(label, _)| label).collect();
        result = result.retain_labels(&labels);
    }
    result
}

/// Evaluates a number command against an unshaped result.
pub fn number_value(value: &NumberValue, result: &AggregationResult) -> u64 {
    match value {
        NumberValue::Contributing => result.contributing_records as u64,
        NumberValue::Entries => result.total_entries as u64,
        NumberValue::Distinct => result.marginals(0).iter().filter(|(_, c)| *c > 0).count() as u64,
        NumberValue::Count(label) => {
            let key = match_key(label);
            match result.marginals(0).into_iter().find(|(l, _)| match_key(l) == key) {
                Some((_, count)) => count,
                None => {
                    warn!(field = %result.field, label = %label, "number command refers to an unseen label");
                    0
                }
            }
        }
    }
}

/// Generates every artifact in memory: report files, `numbers.tex` and
/// `manifest.json`, in that order.
pub fn generate(inputs: &Inputs) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    let mut numbers = vec![(
        PRIMARY_STUDIES_COMMAND.to_string(),
        inputs.table.records.len() as u64,
    )];

    for report in inputs.report_defs() {
        let data = compute(report, inputs)?;

        if !report.commands.is_empty() {
            // Numbers describe the data, not the trimmed table.
            let spec = inputs
                .schema
                .field(report.field.as_deref().unwrap_or_default());
            if let Some(spec) = spec {
                let raw = aggregate(
                    &inputs.table.records,
                    spec,
                    &report.group_by,
                    report.mode,
                    &inputs.schema,
                )
                .map_err(|message| ReviewError::report(named_source(&report.name, ""), message, None))?;
                for command in &report.commands {
                    numbers.push((command.name.clone(), number_value(&command.value, &raw)));
                }
            }
        }

        let mut formats = report.outputs.clone();
        formats.sort();
        formats.dedup();
        for format in formats {
            artifacts.push(emit::emit(report, &data, format)?);
        }
        debug!(report = %report.name, "report generated");
    }

    artifacts.push(Artifact::new(NUMBERS_FILE, latex::numbers(&numbers)));
    let manifest = manifest(inputs, &artifacts)?;
    artifacts.push(manifest);
    Ok(artifacts)
}

#[derive(Serialize)]
struct Manifest<'a> {
    inputs: &'a [InputDigest],
    records: usize,
    artifacts: Vec<InputDigest>,
}

fn manifest(inputs: &Inputs, artifacts: &[Artifact]) -> Result<Artifact> {
    let manifest = Manifest {
        inputs: &inputs.digests,
        records: inputs.table.records.len(),
        artifacts: artifacts
            .iter()
            .map(|a| InputDigest {
                name: a.name.clone(),
                sha256: sha256_hex(a.contents.as_bytes()),
            })
            .collect(),
    };
    Ok(Artifact::new(
        MANIFEST_FILE,
        emit::json::to_pretty(MANIFEST_FILE, &manifest)?,
    ))
}

// ============================================================================
// RUN / CHECK
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub audit: AuditSummary,
}

/// Full pipeline. Nothing is written unless every input is valid.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let inputs = load_inputs(config)?;
    let audit = audit(&inputs.table.records, &inputs.schema);
    let artifacts = generate(&inputs)?;

    fs::create_dir_all(&config.out).map_err(|e| ReviewError::io(&config.out, e))?;
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in &artifacts {
        let path = config.out.join(&artifact.name);
        fs::write(&path, &artifact.contents).map_err(|e| ReviewError::io(&path, e))?;
        written.push(path);
    }
    info!(artifacts = written.len(), out = %config.out.display(), "artifacts written");
    Ok(RunSummary { written, audit })
}

/// An artifact whose on-disk contents differ from a fresh generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    Missing { name: String },
    Changed {
        name: String,
        on_disk: String,
        generated: String,
    },
}

impl Drift {
    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name } | Self::Changed { name, .. } => name,
        }
    }
}

/// Regenerates in memory and compares against `config.out`.
pub fn check(config: &RunConfig) -> Result<Vec<Drift>> {
    let inputs = load_inputs(config)?;
    let artifacts = generate(&inputs)?;

    let mut drift = Vec::new();
    for artifact in artifacts {
        let path = config.out.join(&artifact.name);
        match fs::read_to_string(&path) {
            Ok(on_disk) if on_disk == artifact.contents => {}
            Ok(on_disk) => drift.push(Drift::Changed {
                name: artifact.name,
                on_disk,
                generated: artifact.contents,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                drift.push(Drift::Missing {
                    name: artifact.name,
                })
            }
            Err(e) => return Err(ReviewError::io(&path, e)),
        }
    }
    Ok(drift)
}
