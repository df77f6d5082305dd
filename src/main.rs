// src/main.rs

use anyhow::{bail, Context, Result};
use clap::Parser;
use coursegrid::{import_path, ImportConfig, ImportReport, TimestampIds};
use glob::glob;
use rayon::prelude::*;
use serde::Serialize;
use std::{path::PathBuf, time::Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Import timetable spreadsheets and print their course records as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// YAML import config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject courses with a missing teacher, location or weeks
    #[arg(long)]
    strict: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Spreadsheet files or glob patterns
    #[arg(required = true, value_name = "PATH|GLOB")]
    inputs: Vec<String>,
}

/// Literal paths pass through; anything else is treated as a glob pattern.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        let literal = PathBuf::from(input);
        if literal.is_file() {
            paths.push(literal);
            continue;
        }
        let matched: Vec<PathBuf> = glob(input)
            .with_context(|| format!("Failed to read glob pattern '{}'", input))?
            .filter_map(|entry| entry.ok())
            .filter(|p| p.is_file())
            .collect();
        if matched.is_empty() {
            warn!(pattern = %input, "no files matched");
        }
        paths.extend(matched);
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

#[derive(Serialize)]
struct FileOutcome {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ImportReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,coursegrid=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) args & config ────────────────────────────────────────────
    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ImportConfig::load(path)?,
        None => ImportConfig::default(),
    }
    .with_env_overrides();
    if args.strict {
        config.strict = true;
    }
    info!(strict = config.strict, compaction = %config.week_compaction, "configuration ready");

    // ─── 3) resolve inputs ───────────────────────────────────────────
    let paths = expand_inputs(&args.inputs)?;
    if paths.is_empty() {
        bail!("no input files found");
    }
    info!("importing {} file(s)", paths.len());

    // ─── 4) import in parallel, one id generator per file ────────────
    let start = Instant::now();
    let outcomes: Vec<FileOutcome> = paths
        .par_iter()
        .map(|path| {
            let mut ids = TimestampIds::new();
            match import_path(path, &config, &mut ids) {
                Ok(report) => FileOutcome {
                    path: path.display().to_string(),
                    report: Some(report),
                    error: None,
                },
                Err(e) => {
                    error!(path = %path.display(), "import failed: {:#}", e);
                    FileOutcome {
                        path: path.display().to_string(),
                        report: None,
                        error: Some(format!("{:#}", e)),
                    }
                }
            }
        })
        .collect();

    // ─── 5) report ───────────────────────────────────────────────────
    let json = if args.pretty {
        serde_json::to_string_pretty(&outcomes)?
    } else {
        serde_json::to_string(&outcomes)?
    };
    println!("{}", json);

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    let (courses, skipped, conflicts) = outcomes
        .iter()
        .filter_map(|o| o.report.as_ref())
        .fold((0, 0, 0), |(c, s, k), r| {
            (c + r.courses.len(), s + r.diagnostics.len(), k + r.conflicts.len())
        });
    info!(
        files = outcomes.len(),
        failed,
        courses,
        skipped,
        conflicts,
        elapsed = ?start.elapsed(),
        "done"
    );
    if failed > 0 {
        bail!("{} of {} file(s) failed to import", failed, outcomes.len());
    }
    Ok(())
}
