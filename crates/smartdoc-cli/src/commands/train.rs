//! Train command - fit the entity recognizer on a prepared corpus.

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::warn;

use smartdoc_core::{SmartdocError, Trainer, TrainingCorpus, TrainingError};

use super::load_config;

/// Arguments for the train command.
#[derive(Args)]
pub struct TrainArgs {
    /// Training corpus (default: paths.corpus from config)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Model output directory (default: paths.model_dir from config)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Number of epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Feature dropout rate in [0, 1)
    #[arg(long)]
    dropout: Option<f32>,

    /// SGD learning rate
    #[arg(long)]
    learn_rate: Option<f32>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Shuffle examples every epoch
    #[arg(long)]
    shuffle: bool,

    /// Print the training summary as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: TrainArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let mut training = config.training.clone();
    if let Some(epochs) = args.epochs {
        training.epochs = epochs;
    }
    if let Some(dropout) = args.dropout {
        training.dropout = dropout;
    }
    if let Some(learn_rate) = args.learn_rate {
        training.learn_rate = learn_rate;
    }
    if let Some(seed) = args.seed {
        training.seed = seed;
    }
    training.shuffle |= args.shuffle;
    training.validate()?;

    let corpus_path = args.corpus.unwrap_or_else(|| config.paths.corpus.clone());
    let model_dir = args.model_dir.unwrap_or_else(|| config.paths.model_dir.clone());

    if !corpus_path.exists() {
        anyhow::bail!("Corpus not found: {}", corpus_path.display());
    }
    let corpus = TrainingCorpus::load(&corpus_path)?;

    if !args.json {
        println!(
            "{} Training on {} examples for {} epochs (Ctrl-C stops after the current epoch, twice aborts)",
            style("ℹ").blue(),
            corpus.len(),
            training.epochs
        );
    }

    let trainer = Trainer::new(training);
    let cancel = trainer.cancel_flag();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current epoch (Ctrl-C again to abort)");
            cancel.store(true, Ordering::SeqCst);
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{} Aborted, no model written", style("✗").red());
            std::process::exit(130);
        }
    });

    let save_dir = model_dir.clone();
    let result = tokio::task::spawn_blocking(move || trainer.train_and_save(&corpus, &save_dir)).await?;
    signal.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(SmartdocError::Training(TrainingError::CancelledBeforeFirstEpoch)) => {
            println!(
                "{} Training cancelled before the first epoch; {} left unchanged",
                style("!").yellow(),
                model_dir.display()
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary())?);
        return Ok(());
    }

    for (epoch, loss) in outcome.epoch_losses.iter().enumerate() {
        println!("   epoch {:>3}: loss {:.4}", epoch + 1, loss);
    }

    if outcome.cancelled {
        println!(
            "{} Training cancelled after {} epochs; saved best snapshot",
            style("!").yellow(),
            outcome.epoch_losses.len()
        );
    }

    println!(
        "{} Model saved to {} in {:?}",
        style("✓").green(),
        model_dir.display(),
        start.elapsed()
    );
    println!(
        "   {} labels, {} examples, {} skipped",
        outcome.labels.len(),
        outcome.examples_seen,
        style(outcome.skipped_examples).red()
    );

    Ok(())
}
