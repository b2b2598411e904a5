//! Training corpus assembly and persistence.
//!
//! The persisted artifact is a JSON array of
//! `[text, {"entities": [[start, end, "LABEL"], ...]}]` entries, one per
//! document that produced at least one resolved span.

mod builder;
pub mod records;

pub use builder::{record_text, DocumentOutcome, TrainingSetBuilder};

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::align::offset;
use crate::error::{CorpusError, Result};
use crate::models::span::{EntitySpan, ResolvedSpanSet};

/// One document's text with its resolved spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    /// Source document id. Not persisted.
    pub source_id: String,
    pub text: String,
    pub spans: ResolvedSpanSet,
}

impl TrainingExample {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>, spans: ResolvedSpanSet) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            spans,
        }
    }
}

#[derive(Serialize)]
struct AnnotationsRef<'a> {
    entities: &'a ResolvedSpanSet,
}

#[derive(Deserialize)]
struct Annotations {
    entities: Vec<EntitySpan>,
}

impl Serialize for TrainingExample {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        (&self.text, AnnotationsRef { entities: &self.spans }).serialize(serializer)
    }
}

/// Aggregate counters of a corpus build. Reported, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Documents looked at, including skipped ones.
    pub total_seen: usize,
    /// Documents that produced a training example.
    pub examples: usize,
    /// Values found in the text but not alignable to tokens.
    pub misaligned: usize,
    /// Values not found verbatim in the text.
    pub not_found: usize,
    /// Aligned spans dropped by overlap resolution.
    pub conflicting: usize,
    /// Documents whose text could not be obtained.
    pub skipped_documents: usize,
}

impl BuildReport {
    pub fn merge(&mut self, other: &BuildReport) {
        self.total_seen += other.total_seen;
        self.examples += other.examples;
        self.misaligned += other.misaligned;
        self.not_found += other.not_found;
        self.conflicting += other.conflicting;
        self.skipped_documents += other.skipped_documents;
    }
}

/// Ordered training examples plus the counters of the build that made them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingCorpus {
    examples: Vec<TrainingExample>,
    report: BuildReport,
}

impl TrainingCorpus {
    /// Corpus from examples, ordered by source id.
    pub fn new(mut examples: Vec<TrainingExample>) -> Self {
        examples.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        let report = BuildReport {
            total_seen: examples.len(),
            examples: examples.len(),
            ..BuildReport::default()
        };
        Self { examples, report }
    }

    /// Merge per-document outcomes in any order. The result is ordered by
    /// document id, so it does not depend on processing order.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = DocumentOutcome>) -> Self {
        let mut report = BuildReport::default();
        let mut examples = Vec::new();

        for outcome in outcomes {
            report.merge(&outcome.report());
            if let Some(example) = outcome.example {
                examples.push(example);
            }
        }

        examples.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        Self { examples, report }
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingExample> {
        self.examples.iter()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Union of labels across all examples.
    pub fn labels(&self) -> BTreeSet<String> {
        self.examples
            .iter()
            .flat_map(|e| e.spans.iter().map(|s| s.label.clone()))
            .collect()
    }

    /// Write the corpus artifact, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &self.examples)?;
        writer.flush()?;

        info!("Saved {} training examples to {}", self.examples.len(), path.display());
        Ok(())
    }

    /// Read a corpus artifact, validating every span against its text.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let raw: Vec<(String, Annotations)> = serde_json::from_reader(reader)?;

        let mut examples = Vec::with_capacity(raw.len());
        for (i, (text, annotations)) in raw.into_iter().enumerate() {
            let len = offset::char_len(&text);
            if let Some(span) = annotations.entities.iter().find(|s| !s.fits(len)) {
                return Err(CorpusError::SpanOutOfBounds {
                    start: span.start,
                    end: span.end,
                    len,
                }
                .into());
            }
            let spans = ResolvedSpanSet::try_from_spans(annotations.entities).ok_or(CorpusError::Overlap(i))?;
            examples.push(TrainingExample::new(format!("{i:06}"), text, spans));
        }

        info!("Loaded {} training examples from {}", examples.len(), path.display());
        Ok(Self::new(examples))
    }
}

impl<'a> IntoIterator for &'a TrainingCorpus {
    type Item = &'a TrainingExample;
    type IntoIter = std::slice::Iter<'a, TrainingExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}
