//! Read-only inference over a persisted model.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::NerModel;
use crate::error::Result;

/// Entities found in a text, in document order, plus every label the
/// model can produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// `(entity text, label)` pairs, left to right.
    pub entities: Vec<(String, String)>,
    pub labels: Vec<String>,
}

/// Loaded model ready for prediction. Immutable, so one instance can be
/// shared across threads.
#[derive(Debug, Clone)]
pub struct Predictor {
    model: NerModel,
}

impl Predictor {
    pub fn load(model_dir: &Path) -> Result<Self> {
        Ok(Self::from_model(NerModel::load(model_dir)?))
    }

    pub fn from_model(model: NerModel) -> Self {
        Self { model }
    }

    pub fn labels(&self) -> &[String] {
        self.model.labels()
    }

    pub fn predict(&self, text: &str) -> PredictionResult {
        let entities: Vec<(String, String)> = self
            .model
            .predict_spans(text)
            .into_iter()
            .filter_map(|span| span.slice(text).map(|s| (s.to_string(), span.label)))
            .collect();

        debug!("Predicted {} entities", entities.len());

        PredictionResult {
            entities,
            labels: self.model.labels().to_vec(),
        }
    }
}

/// Load the model in `model_dir` and run it over `text`.
pub fn predict(model_dir: &Path, text: &str) -> Result<PredictionResult> {
    Ok(Predictor::load(model_dir)?.predict(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{TrainingCorpus, TrainingExample};
    use crate::models::config::TrainingConfig;
    use crate::models::span::{EntitySpan, ResolvedSpanSet};
    use crate::ner::Trainer;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn trained_dir() -> TempDir {
        let examples = [
            ("a", "Bill To: Beta Corp", vec![EntitySpan::new(9, 18, "BUYER")]),
            ("b", "Invoice No: INV-1040", vec![EntitySpan::new(12, 20, "INVOICE_NUMBER")]),
        ]
        .into_iter()
        .map(|(id, text, spans)| TrainingExample::new(id, text, ResolvedSpanSet::try_from_spans(spans).unwrap()))
        .collect();

        let config = TrainingConfig {
            epochs: 25,
            dropout: 0.0,
            learn_rate: 0.1,
            ..TrainingConfig::default()
        };
        let dir = TempDir::new().unwrap();
        Trainer::new(config)
            .train_and_save(&TrainingCorpus::new(examples), dir.path())
            .unwrap();
        dir
    }

    #[test]
    fn test_predict_from_artifact() {
        let dir = trained_dir();
        let result = predict(dir.path(), "Invoice No: INV-1040").unwrap();

        assert_eq!(
            result.entities,
            vec![("INV-1040".to_string(), "INVOICE_NUMBER".to_string())]
        );
        assert_eq!(result.labels, vec!["BUYER", "INVOICE_NUMBER"]);
    }

    #[test]
    fn test_labels_reported_without_matches() {
        let dir = trained_dir();
        let predictor = Predictor::load(dir.path()).unwrap();
        let result = predictor.predict("");

        assert!(result.entities.is_empty());
        assert_eq!(result.labels, predictor.labels());
    }

    #[test]
    fn test_missing_model() {
        let dir = TempDir::new().unwrap();
        assert!(predict(&dir.path().join("absent"), "text").is_err());
    }
}
