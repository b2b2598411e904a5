//! Sequential SGD training of the tagger.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::features::sequence_features;
use super::model::{log_softmax, ModelMeta, NerModel, FORMAT_VERSION};
use super::tags::TagSet;
use crate::align::{offset, RuleTokenizer, Token, Tokenizer};
use crate::corpus::{TrainingCorpus, TrainingExample};
use crate::error::{Result, TrainingError, TrainingUpdateError};
use crate::models::config::TrainingConfig;

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: NerModel,
    /// Summed loss of each completed epoch.
    pub epoch_losses: Vec<f32>,
    /// Examples in the corpus.
    pub examples_seen: usize,
    /// Distinct examples whose update failed at least once.
    pub skipped_examples: usize,
    /// Training stopped early on request; `model` is the lowest-loss snapshot.
    pub cancelled: bool,
    pub labels: Vec<String>,
}

/// Summary of an outcome without the model, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub epoch_losses: Vec<f32>,
    pub examples_seen: usize,
    pub skipped_examples: usize,
    pub cancelled: bool,
    pub labels: Vec<String>,
}

impl TrainingOutcome {
    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            epochs: self.epoch_losses.len(),
            epoch_losses: self.epoch_losses.clone(),
            examples_seen: self.examples_seen,
            skipped_examples: self.skipped_examples,
            cancelled: self.cancelled,
            labels: self.labels.clone(),
        }
    }
}

/// One example turned into feature rows and gold tags.
struct Prepared {
    rows: Vec<Vec<usize>>,
    gold: Vec<usize>,
}

/// Trains a [`NerModel`] from a [`TrainingCorpus`].
///
/// Updates are applied one example at a time against a single weight
/// matrix owned by the run. Cancellation is honored only between epochs.
pub struct Trainer {
    config: TrainingConfig,
    cancel: Arc<AtomicBool>,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an external cancel flag.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train and write the resulting artifact to `model_dir`.
    ///
    /// A run cancelled before its first epoch leaves `model_dir` untouched.
    pub fn train_and_save(&self, corpus: &TrainingCorpus, model_dir: &Path) -> Result<TrainingOutcome> {
        let outcome = self.train(corpus)?;
        if outcome.cancelled && outcome.epoch_losses.is_empty() {
            warn!("Training cancelled before the first epoch, keeping {}", model_dir.display());
            return Err(TrainingError::CancelledBeforeFirstEpoch.into());
        }
        outcome.model.save(model_dir)?;
        Ok(outcome)
    }

    pub fn train(&self, corpus: &TrainingCorpus) -> Result<TrainingOutcome> {
        self.config.validate()?;
        if corpus.is_empty() {
            return Err(TrainingError::EmptyCorpus.into());
        }

        let tags = TagSet::new(corpus.labels());
        let tokenizer = RuleTokenizer::new();
        let mut skipped = BTreeSet::new();

        // Encode every example once; the vocabulary is every feature seen
        // in an encodable example.
        let mut encoded = Vec::with_capacity(corpus.len());
        let mut vocab_set = BTreeSet::new();
        for (i, example) in corpus.iter().enumerate() {
            let tokens = tokenizer.tokenize(&example.text);
            match encode_example(&tags, &tokens, example) {
                Ok(gold) => {
                    let feats = sequence_features(&tokens);
                    vocab_set.extend(feats.iter().flatten().cloned());
                    encoded.push(Some((feats, gold)));
                }
                Err(e) => {
                    warn!("Skipping example {} ({}): {}", i, example.source_id, e);
                    skipped.insert(i);
                    encoded.push(None);
                }
            }
        }

        if skipped.len() == corpus.len() {
            return Err(TrainingError::AllExamplesSkipped(corpus.len()).into());
        }

        let features: Vec<String> = vocab_set.into_iter().collect();
        let vocab: HashMap<&str, usize> = features.iter().enumerate().map(|(i, f)| (f.as_str(), i)).collect();
        let prepared: Vec<Option<Prepared>> = encoded
            .into_iter()
            .map(|e| {
                e.map(|(feats, gold)| Prepared {
                    rows: feats
                        .iter()
                        .map(|fs| fs.iter().filter_map(|f| vocab.get(f.as_str()).copied()).collect())
                        .collect(),
                    gold,
                })
            })
            .collect();

        info!(
            "Training on {} examples: {} labels, {} features, {} epochs",
            corpus.len() - skipped.len(),
            tags.labels().len(),
            features.len(),
            self.config.epochs
        );

        let mut weights = Array2::<f32>::zeros((features.len(), tags.len()));
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..prepared.len()).collect();
        let mut losses = Vec::with_capacity(self.config.epochs);
        let mut best: Option<(f32, Array2<f32>)> = None;
        let mut cancelled = false;

        for epoch in 0..self.config.epochs {
            if self.cancel.load(Ordering::SeqCst) {
                info!("Cancellation requested, stopping before epoch {}", epoch + 1);
                cancelled = true;
                break;
            }

            if self.config.shuffle {
                order.shuffle(&mut rng);
            }

            let mut epoch_loss = 0.0f32;
            for &i in &order {
                let Some(example) = &prepared[i] else { continue };
                match self.update(&mut weights, example, &mut rng) {
                    Ok(loss) => epoch_loss += loss,
                    Err(e) => {
                        if skipped.insert(i) {
                            warn!("Skipping example {}: {}", i, e);
                        }
                    }
                }
            }

            info!("Epoch {}/{}: loss {:.4}", epoch + 1, self.config.epochs, epoch_loss);
            losses.push(epoch_loss);

            if best.as_ref().is_none_or(|(l, _)| epoch_loss < *l) {
                best = Some((epoch_loss, weights.clone()));
            }
        }

        let final_weights = match (cancelled, best) {
            (true, Some((loss, snapshot))) => {
                debug!("Publishing best snapshot with loss {:.4}", loss);
                snapshot
            }
            _ => weights,
        };

        let labels = tags.labels().to_vec();
        let meta = ModelMeta {
            version: FORMAT_VERSION,
            labels: labels.clone(),
            tags: tags.names(),
            epochs: losses.len(),
            losses: losses.clone(),
            dropout: self.config.dropout,
            learn_rate: self.config.learn_rate,
            skipped_examples: skipped.len(),
            trained_at: Utc::now(),
        };

        Ok(TrainingOutcome {
            model: NerModel::from_parts(tags, features, final_weights, meta),
            epoch_losses: losses,
            examples_seen: corpus.len(),
            skipped_examples: skipped.len(),
            cancelled,
            labels,
        })
    }

    /// One SGD step on token-level cross-entropy with inverted feature
    /// dropout. Weights are left untouched when the loss is not finite.
    fn update(
        &self,
        weights: &mut Array2<f32>,
        example: &Prepared,
        rng: &mut StdRng,
    ) -> std::result::Result<f32, TrainingUpdateError> {
        let dropout = self.config.dropout;
        let scale = 1.0 / (1.0 - dropout);
        let n_tags = weights.ncols();

        let mut loss = 0.0f32;
        let mut steps = Vec::with_capacity(example.rows.len());

        for (active, &gold) in example.rows.iter().zip(&example.gold) {
            let kept: Vec<usize> = active
                .iter()
                .copied()
                .filter(|_| dropout == 0.0 || rng.random::<f32>() >= dropout)
                .collect();

            let mut logits = Array1::<f32>::zeros(n_tags);
            for &f in &kept {
                logits.scaled_add(scale, &weights.row(f));
            }
            let log_probs = log_softmax(logits.view());
            loss -= log_probs[gold];

            let mut grad = log_probs.mapv(f32::exp);
            grad[gold] -= 1.0;
            steps.push((kept, grad));
        }

        if !loss.is_finite() {
            return Err(TrainingUpdateError::NonFiniteLoss);
        }

        let lr = self.config.learn_rate;
        for (kept, grad) in steps {
            for f in kept {
                weights.row_mut(f).scaled_add(-lr * scale, &grad);
            }
        }

        Ok(loss)
    }
}

fn encode_example(
    tags: &TagSet,
    tokens: &[Token],
    example: &TrainingExample,
) -> std::result::Result<Vec<usize>, TrainingUpdateError> {
    let len = offset::char_len(&example.text);
    if let Some(span) = example.spans.iter().find(|s| !s.fits(len)) {
        return Err(TrainingUpdateError::SpanOutOfBounds {
            start: span.start,
            end: span.end,
            len,
        });
    }
    tags.encode(tokens, example.spans.as_slice())
}
