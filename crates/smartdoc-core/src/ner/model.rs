//! Linear BILOU tagger and its on-disk artifact.
//!
//! An artifact is a directory holding `meta.json` (format version, labels,
//! tag inventory, training summary) and `weights.json` (feature vocabulary
//! and weight matrix, one row per feature and one column per tag).

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::features::sequence_features;
use super::tags::TagSet;
use crate::align::{RuleTokenizer, Tokenizer};
use crate::error::{ModelError, Result};
use crate::models::span::EntitySpan;

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 1;

const META_FILE: &str = "meta.json";
const WEIGHTS_FILE: &str = "weights.json";

/// Model metadata, readable without loading the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    pub version: u32,
    pub labels: Vec<String>,
    pub tags: Vec<String>,
    /// Epochs actually run.
    pub epochs: usize,
    pub losses: Vec<f32>,
    pub dropout: f32,
    pub learn_rate: f32,
    pub skipped_examples: usize,
    pub trained_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct WeightsFile {
    features: Vec<String>,
    weights: Array2<f32>,
}

/// A trained entity recognizer. Immutable once built.
#[derive(Debug, Clone)]
pub struct NerModel {
    meta: ModelMeta,
    tags: TagSet,
    features: Vec<String>,
    vocab: HashMap<String, usize>,
    weights: Array2<f32>,
    tokenizer: RuleTokenizer,
}

impl NerModel {
    pub(crate) fn from_parts(tags: TagSet, features: Vec<String>, weights: Array2<f32>, meta: ModelMeta) -> Self {
        let vocab = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), i))
            .collect();
        Self {
            meta,
            tags,
            features,
            vocab,
            weights,
            tokenizer: RuleTokenizer::new(),
        }
    }

    /// Labels the model can predict, sorted.
    pub fn labels(&self) -> &[String] {
        self.tags.labels()
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    pub fn tag_set(&self) -> &TagSet {
        &self.tags
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Non-overlapping entity spans in `text`, left to right.
    pub fn predict_spans(&self, text: &str) -> Vec<EntitySpan> {
        let tokens = self.tokenizer.tokenize(text);
        if tokens.is_empty() {
            return Vec::new();
        }

        let rows: Vec<Vec<usize>> = sequence_features(&tokens)
            .iter()
            .map(|feats| feats.iter().filter_map(|f| self.vocab.get(f).copied()).collect())
            .collect();

        let mut scores = Array2::zeros((tokens.len(), self.tags.len()));
        for (i, active) in rows.iter().enumerate() {
            let mut logits = Array1::zeros(self.tags.len());
            for &f in active {
                logits += &self.weights.row(f);
            }
            scores.row_mut(i).assign(&log_softmax(logits.view()));
        }

        let path = viterbi(&self.tags, &scores);
        self.tags
            .decode(&path)
            .into_iter()
            .map(|(first, last, label)| {
                EntitySpan::new(tokens[first].start, tokens[last].end, self.tags.labels()[label].clone())
            })
            .collect()
    }

    /// Write the artifact into `dir`, replacing any previous one.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let mut meta = BufWriter::new(File::create(dir.join(META_FILE))?);
        serde_json::to_writer_pretty(&mut meta, &self.meta)?;
        meta.flush()?;

        let weights = WeightsFile {
            features: self.features.clone(),
            weights: self.weights.clone(),
        };
        let mut out = BufWriter::new(File::create(dir.join(WEIGHTS_FILE))?);
        serde_json::to_writer(&mut out, &weights)?;
        out.flush()?;

        info!(
            "Saved model ({} labels, {} features) to {}",
            self.labels().len(),
            self.features.len(),
            dir.display()
        );
        Ok(())
    }

    /// Load an artifact written by [`NerModel::save`].
    pub fn load(dir: &Path) -> Result<Self> {
        let meta = read_meta(dir)?;
        let tags = TagSet::new(meta.labels.iter().cloned());

        let weights_path = dir.join(WEIGHTS_FILE);
        if !weights_path.is_file() {
            return Err(ModelError::NotFound(weights_path).into());
        }
        let file: WeightsFile = serde_json::from_reader(BufReader::new(File::open(&weights_path)?))?;

        let (rows, cols) = file.weights.dim();
        if rows != file.features.len() || cols != tags.len() {
            return Err(ModelError::ShapeMismatch {
                rows,
                cols,
                expected_rows: file.features.len(),
                expected_cols: tags.len(),
            }
            .into());
        }

        debug!("Loaded {}x{} weights from {}", rows, cols, weights_path.display());
        Ok(Self::from_parts(tags, file.features, file.weights, meta))
    }

    /// Label set of the artifact in `dir`, without loading the weights.
    pub fn read_labels(dir: &Path) -> Result<Vec<String>> {
        Ok(read_meta(dir)?.labels)
    }
}

/// Metadata of the artifact in `dir`.
pub fn read_meta(dir: &Path) -> Result<ModelMeta> {
    let path = dir.join(META_FILE);
    if !path.is_file() {
        return Err(ModelError::NotFound(dir.to_path_buf()).into());
    }

    let meta: ModelMeta = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
    if meta.version != FORMAT_VERSION {
        return Err(ModelError::UnsupportedVersion {
            found: meta.version,
            expected: FORMAT_VERSION,
        }
        .into());
    }
    Ok(meta)
}

/// Numerically stable log-softmax.
pub(crate) fn log_softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits.fold(f32::NEG_INFINITY, |m, &x| m.max(x));
    let log_sum = logits.mapv(|x| (x - max).exp()).sum().ln();
    logits.mapv(|x| x - max - log_sum)
}

/// Best tag sequence under the BILOU transition constraints.
pub(crate) fn viterbi(tags: &TagSet, scores: &Array2<f32>) -> Vec<usize> {
    let (n, t) = scores.dim();
    if n == 0 {
        return Vec::new();
    }

    let allowed: Vec<bool> = (0..t * t).map(|k| tags.allows(Some(k / t), k % t)).collect();
    let mut best = Array2::from_elem((n, t), f32::NEG_INFINITY);
    let mut back = Array2::<usize>::zeros((n, t));

    for j in 0..t {
        if tags.allows(None, j) {
            best[[0, j]] = scores[[0, j]];
        }
    }

    for i in 1..n {
        for j in 0..t {
            let mut top = f32::NEG_INFINITY;
            let mut arg = 0;
            for p in 0..t {
                let prev = best[[i - 1, p]];
                if allowed[p * t + j] && prev > top {
                    top = prev;
                    arg = p;
                }
            }
            if top > f32::NEG_INFINITY {
                best[[i, j]] = top + scores[[i, j]];
                back[[i, j]] = arg;
            }
        }
    }

    let mut last = 0;
    let mut top = f32::NEG_INFINITY;
    for j in 0..t {
        if tags.allows_end(j) && best[[n - 1, j]] > top {
            top = best[[n - 1, j]];
            last = j;
        }
    }

    let mut path = vec![0; n];
    path[n - 1] = last;
    for i in (1..n).rev() {
        path[i - 1] = back[[i, path[i]]];
    }
    path
}
