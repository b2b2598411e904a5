//! Predict and labels commands - serve a trained model.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use smartdoc_core::{NerModel, PredictionResult, Predictor};

use super::load_config;

/// Arguments for the predict command.
#[derive(Args)]
pub struct PredictArgs {
    /// Text to analyze
    text: Option<String>,

    /// Read the text from a file instead
    #[arg(short, long, conflicts_with = "text")]
    file: Option<PathBuf>,

    /// Model directory (default: paths.model_dir from config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Arguments for the labels command.
#[derive(Args)]
pub struct LabelsArgs {
    /// Model directory (default: paths.model_dir from config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: PredictArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let model_dir = args.model_dir.unwrap_or_else(|| config.paths.model_dir.clone());

    let text = match (args.text, args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path)?,
        (None, None) => anyhow::bail!("Pass a text or --file"),
    };

    let predictor = Predictor::load(&model_dir)?;
    let result = predictor.predict(&text);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Csv => format_csv(&result)?,
        OutputFormat::Text => format_text(&result),
    };
    println!("{}", output);

    Ok(())
}

pub async fn labels(args: LabelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let model_dir = args.model_dir.unwrap_or_else(|| config.paths.model_dir.clone());

    for label in NerModel::read_labels(&model_dir)? {
        println!("{}", label);
    }

    Ok(())
}

fn format_csv(result: &PredictionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["text", "label"])?;
    for (text, label) in &result.entities {
        wtr.write_record([text, label])?;
    }
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(result: &PredictionResult) -> String {
    let mut out = String::new();

    if result.entities.is_empty() {
        out.push_str(&format!("{}\n", style("No entities found").yellow()));
    }
    for (text, label) in &result.entities {
        out.push_str(&format!("{:<24} {}\n", style(label).cyan(), text));
    }

    out.push_str(&format!("\nLabels: {}", result.labels.join(", ")));
    out
}
