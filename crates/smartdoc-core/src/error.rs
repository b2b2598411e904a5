//! Error types for the smartdoc-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the smartdoc library.
#[derive(Error, Debug)]
pub enum SmartdocError {
    /// Static configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Corpus building or persistence error.
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),

    /// Training run error.
    #[error("training error: {0}")]
    Training(#[from] TrainingError),

    /// Model artifact error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV record error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors in the static configuration. Always fatal, raised before any
/// document is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A pattern rule failed to compile.
    #[error("malformed pattern for {field}: {message}")]
    MalformedPattern { field: String, message: String },

    /// A pattern rule has no capture group to take the value from.
    #[error("pattern for {0} has no capture group")]
    NoCaptureGroup(String),

    /// The same field is listed twice.
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    /// A label is empty or not of the form `[A-Z][A-Z0-9_]*`.
    #[error("invalid label {label:?} for field {field}")]
    InvalidLabel { field: String, label: String },

    /// The field schema is empty.
    #[error("field schema is empty")]
    EmptySchema,

    /// A numeric training parameter is out of range.
    #[error("invalid training parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Errors related to the training corpus artifact.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// A document's text could not be found.
    #[error("missing source text for {id}: {path}")]
    MissingSourceArtifact { id: String, path: PathBuf },

    /// A record has no filename.
    #[error("record {0} has no Filename")]
    MissingFilename(usize),

    /// A persisted span does not fit its text.
    #[error("span {start}..{end} out of bounds for text of {len} chars")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    /// A persisted span set overlaps.
    #[error("overlapping spans in example {0}")]
    Overlap(usize),
}

/// Errors that abort a whole training run.
#[derive(Error, Debug)]
pub enum TrainingError {
    /// Nothing to train on.
    #[error("training corpus is empty")]
    EmptyCorpus,

    /// Every example was skipped.
    #[error("all {0} examples failed to update")]
    AllExamplesSkipped(usize),

    /// Stopped before any epoch finished; nothing was written.
    #[error("training cancelled before the first epoch, no model written")]
    CancelledBeforeFirstEpoch,
}

/// Failure during a single example's parameter update. Recovered by
/// skipping the example.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingUpdateError {
    /// A span does not fit inside the example text.
    #[error("span {start}..{end} out of bounds for text of {len} chars")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },

    /// A span does not start and end on token boundaries.
    #[error("span {start}..{end} does not align to tokens")]
    SpanNotOnTokens { start: usize, end: usize },

    /// Two spans claim the same token.
    #[error("overlapping spans at {0}")]
    OverlappingSpans(usize),

    /// A label is not part of the model's vocabulary.
    #[error("unknown label {0}")]
    UnknownLabel(String),

    /// The update produced a NaN or infinite loss.
    #[error("non-finite loss")]
    NonFiniteLoss,
}

/// Errors related to model artifacts.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The artifact directory or one of its files is absent.
    #[error("model artifact not found: {0}")]
    NotFound(PathBuf),

    /// The artifact was written by an incompatible version.
    #[error("unsupported model format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// The weight matrix does not match the feature/tag inventory.
    #[error("weight matrix is {rows}x{cols}, expected {expected_rows}x{expected_cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
}

/// Result type for the smartdoc library.
pub type Result<T> = std::result::Result<T, SmartdocError>;
