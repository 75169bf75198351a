//! `plp ingest` command - Parse log files and write their records
//!
//! Every input file goes through its own extract / classify / decode /
//! group / dispatch run. A failing file is reported and the remaining
//! files still run; the command exits non-zero if any file failed.

use std::path::PathBuf;

use console::style;
use miette::Result;
use serde::Serialize;
use tracing::error;

use crate::cli::helpers::{open_store, print_json, print_yaml};
use crate::cli::table::Table;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::parser::CorrelationMode;
use crate::pipeline::{collect_inputs, ingest_file, FileReport};

#[derive(clap::Args, Debug)]
pub struct IngestArgs {
    /// Log files or directories to ingest
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Parse and report without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Re-ingest files whose content was ingested before
    #[arg(long)]
    pub force: bool,

    /// How step batches are matched to Final stations
    #[arg(long, value_name = "MODE")]
    pub correlation: Option<CorrelationMode>,
}

/// One row of the ingest summary
#[derive(Debug, Serialize)]
struct FileSummary {
    file: String,
    status: String,
    units: usize,
    downloads: usize,
    stations: usize,
    step_batches: usize,
    steps: usize,
    skipped: usize,
    error: Option<String>,
}

impl FileSummary {
    fn from_report(report: &FileReport) -> Self {
        let counts = report.parsed.counts;
        Self {
            file: report.path.display().to_string(),
            status: report.status.as_str().to_string(),
            units: report.parsed.aggregates.len(),
            downloads: counts.downloads,
            stations: counts.final_stations + counts.pcba_stations,
            step_batches: counts.step_batches,
            steps: counts.total_steps,
            skipped: report.parsed.skipped.len(),
            error: None,
        }
    }

    fn failed(file: String, message: String) -> Self {
        Self {
            file,
            status: "failed".to_string(),
            units: 0,
            downloads: 0,
            stations: 0,
            step_batches: 0,
            steps: 0,
            skipped: 0,
            error: Some(message),
        }
    }
}

pub fn run(args: IngestArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let mut settings = config.parser_settings();
    if let Some(mode) = args.correlation {
        settings.correlation = mode;
    }

    let mut store = if args.dry_run {
        None
    } else {
        Some(open_store(config)?)
    };

    let inputs = collect_inputs(&args.paths, &config.extensions());
    if inputs.is_empty() {
        return Err(miette::miette!(
            help = format!(
                "directories are filtered by extension: {}",
                config.extensions().join(", ")
            ),
            "No log files found"
        ));
    }

    let total = inputs.len();
    let mut summaries = Vec::with_capacity(total);
    let mut failures = 0usize;

    for input in inputs {
        let outcome =
            input.and_then(|path| ingest_file(&path, &settings, store.as_mut(), args.force));
        match outcome {
            Ok(report) => summaries.push(FileSummary::from_report(&report)),
            Err(err) => {
                failures += 1;
                error!(
                    file = %err.path.display(),
                    stage = %err.stage,
                    error = %err.source,
                    "file failed"
                );
                let summary =
                    FileSummary::failed(err.path.display().to_string(), err.source.to_string());
                if !global.quiet {
                    eprintln!("{:?}", miette::Report::new(err));
                }
                summaries.push(summary);
            }
        }
    }

    print_summary(&summaries, global.format)?;

    if failures > 0 {
        return Err(miette::miette!("{} of {} file(s) failed", failures, total));
    }
    Ok(())
}

fn print_summary(summaries: &[FileSummary], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => return print_json(summaries),
        OutputFormat::Yaml => return print_yaml(summaries),
        _ => {}
    }

    let mut table = Table::new(&[
        "FILE", "STATUS", "UNITS", "DOWNLOADS", "STATIONS", "BATCHES", "STEPS", "SKIPPED",
    ]);
    for s in summaries {
        table.push_row([
            s.file.clone(),
            s.status.clone(),
            s.units.to_string(),
            s.downloads.to_string(),
            s.stations.to_string(),
            s.step_batches.to_string(),
            s.steps.to_string(),
            s.skipped.to_string(),
        ]);
    }
    print!("{}", table.render(format)?);

    if matches!(format, OutputFormat::Auto) {
        let ingested = summaries.iter().filter(|s| s.status == "ingested").count();
        let failed = summaries.iter().filter(|s| s.status == "failed").count();
        println!();
        println!(
            "{} {} ingested, {} failed, {} total",
            style("Summary:").bold(),
            style(ingested).green(),
            style(failed).red(),
            summaries.len()
        );
    }

    Ok(())
}
