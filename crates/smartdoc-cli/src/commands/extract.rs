//! Extract command - pull field values out of cleaned text files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{error, warn};

use smartdoc_core::corpus::records::{write_records_csv, write_records_json};
use smartdoc_core::{FieldExtractor, FieldRecord};

use super::{expand_text_files, load_config, progress_bar};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input .txt files (glob pattern)
    #[arg(required = true)]
    input: String,

    /// Output JSON records file
    #[arg(short, long, default_value = "artifacts/extracted_fields.json")]
    output: PathBuf,

    /// Also write a CSV summary to this path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Leave document text out of the records
    #[arg(long)]
    no_text: bool,

    /// Continue on unreadable files
    #[arg(long)]
    continue_on_error: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let extractor = FieldExtractor::from_config(&config)?;

    let files = expand_text_files(&args.input)?;
    println!("{} Found {} files to extract", style("ℹ").blue(), files.len());

    let pb = progress_bar(files.len(), "files")?;
    let mut records = Vec::with_capacity(files.len());
    let mut failed = 0;

    for path in &files {
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        match fs::read_to_string(path) {
            Ok(text) => {
                let fields = extractor.extract(&text);
                let text = (!args.no_text).then_some(text);
                records.push(FieldRecord::new(filename, text, fields));
            }
            Err(e) if args.continue_on_error => {
                warn!("Failed to read {}: {}", path.display(), e);
                failed += 1;
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                anyhow::bail!("Extraction failed: {}", e);
            }
        }

        pb.inc(1);
    }
    pb.finish_and_clear();

    write_records_json(&args.output, &records)?;
    println!(
        "{} Wrote {} records to {}",
        style("✓").green(),
        records.len(),
        args.output.display()
    );

    if let Some(summary) = &args.summary {
        write_records_csv(summary, &records)?;
        println!("{} Summary written to {}", style("✓").green(), summary.display());
    }

    let found: usize = records.iter().map(|r| r.fields.found()).sum();
    println!(
        "   {} fields found across {} documents in {:?} ({} failed)",
        style(found).green(),
        records.len(),
        start.elapsed(),
        style(failed).red()
    );

    Ok(())
}
