//! Core library for turning business documents into NER training data.
//!
//! This crate provides:
//! - Field extraction from cleaned document text (pattern rules + entity detection)
//! - Alignment of extracted field values to token-aligned character spans
//! - Deterministic overlap resolution of candidate spans
//! - Training corpus assembly and persistence
//! - A trainable entity-recognition model and a prediction interface

pub mod align;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod models;
pub mod ner;
pub mod resolve;

pub use error::{Result, SmartdocError, TrainingError};
pub use models::config::SmartdocConfig;
pub use models::document::{Document, FieldRecord, FieldValues};
pub use models::span::{AlignmentFailure, EntitySpan, FailureReason, ResolvedSpanSet};
pub use extract::{EntityDetector, FieldExtractor, HeuristicDetector};
pub use align::{AlignmentOutcome, SpanAligner, Token, Tokenizer, RuleTokenizer};
pub use resolve::OverlapResolver;
pub use corpus::{BuildReport, TrainingCorpus, TrainingExample, TrainingSetBuilder};
pub use ner::{predict, NerModel, PredictionResult, Predictor, Trainer, TrainingOutcome};
