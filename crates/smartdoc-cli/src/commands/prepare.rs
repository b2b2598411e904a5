//! Prepare command - build the NER training corpus.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use smartdoc_core::corpus::records::load_records;
use smartdoc_core::corpus::{BuildReport, DocumentOutcome};
use smartdoc_core::{Document, FieldRecord, TrainingCorpus, TrainingSetBuilder};

use super::{expand_text_files, load_config, progress_bar};

/// Arguments for the prepare command.
#[derive(Args)]
pub struct PrepareArgs {
    /// Field records (CSV or JSON) produced by `extract`
    #[arg(short, long)]
    records: Option<PathBuf>,

    /// Cleaned .txt documents (glob pattern); fields are extracted on the fly
    #[arg(short, long)]
    input: Option<String>,

    /// Corpus output path (default: paths.corpus from config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory of cleaned texts for records without a Text value
    #[arg(long)]
    text_dir: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Print the build report as JSON
    #[arg(long)]
    json: bool,
}

/// One unit of work for the pool.
enum Job {
    File(PathBuf),
    Record(FieldRecord),
}

impl Job {
    fn run(self, builder: &TrainingSetBuilder, text_dir: &Path) -> DocumentOutcome {
        match self {
            Job::File(path) => {
                let id = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string();
                match fs::read_to_string(&path) {
                    Ok(text) => builder.process_document(&Document::from_text(id, text)),
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        DocumentOutcome::skipped(id)
                    }
                }
            }
            Job::Record(record) => builder.process_record(&record, text_dir),
        }
    }
}

#[derive(Serialize)]
struct PrepareSummary<'a> {
    output: &'a Path,
    #[serde(flatten)]
    report: &'a BuildReport,
}

pub async fn run(args: PrepareArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let builder = Arc::new(TrainingSetBuilder::from_config(&config)?);

    let text_dir = Arc::new(args.text_dir.clone().unwrap_or_else(|| config.paths.text_dir.clone()));
    let output = args.output.clone().unwrap_or_else(|| config.paths.corpus.clone());

    let jobs: Vec<Job> = match (&args.records, &args.input) {
        (Some(records), None) => load_records(records)?.into_iter().map(Job::Record).collect(),
        (None, Some(pattern)) => expand_text_files(pattern)?.into_iter().map(Job::File).collect(),
        _ => anyhow::bail!("Pass exactly one of --records or --input"),
    };

    if !args.json {
        println!("{} Preparing {} documents", style("ℹ").blue(), jobs.len());
    }

    let pb = progress_bar(jobs.len(), "documents")?;
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let builder = Arc::clone(&builder);
        let text_dir = Arc::clone(&text_dir);
        let pb = pb.clone();
        tasks.spawn_blocking(move || {
            let outcome = job.run(&builder, &text_dir);
            pb.inc(1);
            drop(permit);
            outcome
        });
    }

    let mut outcomes = Vec::new();
    while let Some(result) = tasks.join_next().await {
        outcomes.push(result?);
    }
    pb.finish_and_clear();

    let corpus = TrainingCorpus::from_outcomes(outcomes);
    if corpus.is_empty() {
        warn!("No document produced a training example");
    }
    corpus.save(&output)?;

    let report = corpus.report();
    if args.json {
        let summary = PrepareSummary {
            output: &output,
            report,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} Wrote {} examples to {} in {:?}",
        style("✓").green(),
        report.examples,
        output.display(),
        start.elapsed()
    );
    println!(
        "   {} documents seen, {} misaligned, {} not found, {} conflicting, {} skipped",
        report.total_seen,
        style(report.misaligned).yellow(),
        style(report.not_found).yellow(),
        style(report.conflicting).yellow(),
        style(report.skipped_documents).red()
    );

    Ok(())
}
