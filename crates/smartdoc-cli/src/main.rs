//! CLI application for building NER training data from business documents.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, extract, predict, prepare, train};

/// smartdoc - Turn business documents into a trained entity recognizer
#[derive(Parser)]
#[command(name = "smartdoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract field values from cleaned text files
    Extract(extract::ExtractArgs),

    /// Build the training corpus from documents or field records
    Prepare(prepare::PrepareArgs),

    /// Train the entity recognizer on a corpus
    Train(train::TrainArgs),

    /// Run a trained model over a text
    Predict(predict::PredictArgs),

    /// List the labels a trained model can detect
    Labels(predict::LabelsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Extract(args) => extract::run(args, cli.config.as_deref()).await,
        Commands::Prepare(args) => prepare::run(args, cli.config.as_deref()).await,
        Commands::Train(args) => train::run(args, cli.config.as_deref()).await,
        Commands::Predict(args) => predict::run(args, cli.config.as_deref()).await,
        Commands::Labels(args) => predict::labels(args, cli.config.as_deref()).await,
        Commands::Config(args) => config::run(args).await,
    }
}
