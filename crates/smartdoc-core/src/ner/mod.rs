//! Trainable entity recognizer.
//!
//! A per-token linear classifier over sparse features with BILOU tags and
//! constrained Viterbi decoding, so predicted spans never overlap.

pub mod features;
pub mod model;
mod predictor;
pub mod tags;
mod trainer;

pub use model::{ModelMeta, NerModel};
pub use predictor::{predict, PredictionResult, Predictor};
pub use trainer::{Trainer, TrainingOutcome, TrainingSummary};
