use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{BuildReport, TrainingCorpus, TrainingExample};
use crate::align::SpanAligner;
use crate::error::{ConfigError, CorpusError};
use crate::extract::FieldExtractor;
use crate::models::config::SmartdocConfig;
use crate::models::document::{Document, FieldRecord, FieldValues};
use crate::models::span::FailureReason;
use crate::resolve::OverlapResolver;

/// What one document contributed to a corpus build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutcome {
    pub id: String,
    /// Present when at least one span survived resolution.
    pub example: Option<TrainingExample>,
    pub misaligned: usize,
    pub not_found: usize,
    pub conflicting: usize,
    /// The document's text could not be obtained.
    pub skipped: bool,
}

impl DocumentOutcome {
    /// Outcome for a document whose text could not be obtained.
    pub fn skipped(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            example: None,
            misaligned: 0,
            not_found: 0,
            conflicting: 0,
            skipped: true,
        }
    }

    /// This outcome's contribution to the aggregate counters.
    pub fn report(&self) -> BuildReport {
        BuildReport {
            total_seen: 1,
            examples: usize::from(self.example.is_some()),
            misaligned: self.misaligned,
            not_found: self.not_found,
            conflicting: self.conflicting,
            skipped_documents: usize::from(self.skipped),
        }
    }
}

/// Runs extraction, alignment and overlap resolution per document and
/// collects the results into a [`TrainingCorpus`].
///
/// Per-document processing is independent and takes `&self`, so callers
/// can fan documents out across threads and merge with
/// [`TrainingCorpus::from_outcomes`].
pub struct TrainingSetBuilder {
    extractor: FieldExtractor,
    aligner: SpanAligner,
    resolver: OverlapResolver,
}

impl TrainingSetBuilder {
    pub fn new(extractor: FieldExtractor, aligner: SpanAligner) -> Self {
        Self {
            extractor,
            aligner,
            resolver: OverlapResolver::new(),
        }
    }

    /// Build from configuration, validating rules and schema up front.
    pub fn from_config(config: &SmartdocConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let extractor = FieldExtractor::from_config(config)?;
        let aligner = SpanAligner::new(config.field_schema()?);
        Ok(Self::new(extractor, aligner))
    }

    /// Extract fields from the document's cleaned text, then align and resolve.
    pub fn process_document(&self, document: &Document) -> DocumentOutcome {
        let fields = self.extractor.extract(document.text());
        self.process_fields(&document.id, document.text(), &fields)
    }

    /// Align and resolve a record whose fields were extracted earlier.
    /// Text comes from the record itself or from `<text_dir>/<stem>.txt`.
    pub fn process_record(&self, record: &FieldRecord, text_dir: &Path) -> DocumentOutcome {
        match record_text(record, text_dir) {
            Ok(text) => self.process_fields(&record.filename, &text, &record.fields),
            Err(e) => {
                warn!("Skipping {}: {}", record.filename, e);
                DocumentOutcome::skipped(&record.filename)
            }
        }
    }

    /// Align and resolve already-extracted `fields` against `text`.
    pub fn process_fields(&self, id: &str, text: &str, fields: &FieldValues) -> DocumentOutcome {
        let (spans, failures) = self.aligner.align(text, fields);
        let misaligned = failures
            .iter()
            .filter(|f| f.reason == FailureReason::Misaligned)
            .count();
        let not_found = failures.len() - misaligned;

        let (resolved, conflicting) = self.resolver.resolve_counted(spans);
        let example = if resolved.is_empty() {
            None
        } else {
            Some(TrainingExample::new(id, text, resolved))
        };

        DocumentOutcome {
            id: id.to_string(),
            example,
            misaligned,
            not_found,
            conflicting,
            skipped: false,
        }
    }

    /// Build a corpus from raw documents.
    pub fn build(&self, documents: &[Document]) -> TrainingCorpus {
        let corpus = TrainingCorpus::from_outcomes(documents.iter().map(|d| self.process_document(d)));
        log_report(corpus.report());
        corpus
    }

    /// Build a corpus from previously extracted field records.
    pub fn build_from_records(&self, records: &[FieldRecord], text_dir: &Path) -> TrainingCorpus {
        let corpus = TrainingCorpus::from_outcomes(records.iter().map(|r| self.process_record(r, text_dir)));
        log_report(corpus.report());
        corpus
    }
}

/// Text for `record`: its own `Text` value, or the `.txt` file named after it.
pub fn record_text(record: &FieldRecord, text_dir: &Path) -> Result<String, CorpusError> {
    if let Some(text) = record.text.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(text.to_string());
    }

    let path = text_path(&record.filename, text_dir);
    fs::read_to_string(&path).map_err(|_| CorpusError::MissingSourceArtifact {
        id: record.filename.clone(),
        path,
    })
}

fn text_path(filename: &str, text_dir: &Path) -> PathBuf {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    text_dir.join(format!("{stem}.txt"))
}

fn log_report(report: &BuildReport) {
    info!(
        "Built {} examples from {} documents ({} misaligned, {} not found, {} conflicting, {} skipped)",
        report.examples,
        report.total_seen,
        report.misaligned,
        report.not_found,
        report.conflicting,
        report.skipped_documents
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{FieldSchema, RuleSet};
    use crate::models::span::EntitySpan;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn builder() -> TrainingSetBuilder {
        TrainingSetBuilder::from_config(&SmartdocConfig::default()).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldValues {
        pairs.iter().map(|(k, v)| (*k, Some(*v))).collect()
    }

    #[test]
    fn test_build_from_documents() {
        let docs = vec![
            Document::from_text("b.txt", "nothing useful in here"),
            Document::from_text("a.txt", "Invoice No: INV-1040\nAmount Paid: $1528.61"),
        ];

        let corpus = builder().build(&docs);

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.report().total_seen, 2);
        assert_eq!(corpus.report().examples, 1);

        let example = &corpus.examples()[0];
        assert_eq!(example.source_id, "a.txt");
        let invoice = example
            .spans
            .iter()
            .find(|s| s.label == "INVOICE_NUMBER")
            .unwrap();
        assert_eq!(invoice.slice(&example.text), Some("INV-1040"));
    }

    #[test]
    fn test_spans_index_the_cleaned_text() {
        let doc = Document::new("raw.txt", "Invoice   No:\tINV-1040  \n\n", "Invoice No: INV-1040");
        let outcome = builder().process_document(&doc);

        let example = outcome.example.unwrap();
        assert_eq!(example.text, "Invoice No: INV-1040");
        let invoice = example
            .spans
            .iter()
            .find(|s| s.label == "INVOICE_NUMBER")
            .unwrap();
        assert_eq!((invoice.start, invoice.end), (12, 20));
    }

    #[test]
    fn test_counters_for_failures_and_conflicts() {
        let builder = TrainingSetBuilder::new(
            FieldExtractor::new(RuleSet::default()).without_detector(),
            SpanAligner::new(FieldSchema::defaults()),
        );
        let text = "Bill To: Beta Corp Ltd\nInvoice No: INV-1040";
        let outcome = builder.process_fields(
            "x.txt",
            text,
            &fields(&[
                ("Bill To", "Beta Corp Ltd"),
                ("Bill From", "Corp Ltd"),
                ("Invoice Number", "1040"),
                ("PO Number", "PO-9"),
            ]),
        );

        assert_eq!(outcome.misaligned, 1);
        assert_eq!(outcome.not_found, 1);
        assert_eq!(outcome.conflicting, 1);
        let spans = outcome.example.unwrap().spans.into_vec();
        assert_eq!(spans, vec![EntitySpan::new(9, 22, "BUYER")]);
    }

    #[test]
    fn test_record_text_falls_back_to_text_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("inv_7.txt"), "Invoice No: INV-7").unwrap();

        let record = FieldRecord::new("inv_7.pdf", None, fields(&[("Invoice Number", "INV-7")]));
        let outcome = builder().process_record(&record, dir.path());

        assert!(!outcome.skipped);
        assert_eq!(outcome.example.unwrap().text, "Invoice No: INV-7");
    }

    #[test]
    fn test_missing_text_is_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        let records = vec![
            FieldRecord::new("gone.pdf", None, fields(&[("Invoice Number", "INV-1")])),
            FieldRecord::new("here.pdf", Some("Invoice No: INV-2".into()), fields(&[("Invoice Number", "INV-2")])),
        ];

        let corpus = builder().build_from_records(&records, dir.path());

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.report().skipped_documents, 1);
        assert_eq!(corpus.report().total_seen, 2);
        assert!(matches!(
            record_text(&records[0], dir.path()),
            Err(CorpusError::MissingSourceArtifact { .. })
        ));
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let builder = builder();
        let docs = [
            Document::from_text("c.txt", "Invoice No: C-3"),
            Document::from_text("a.txt", "Invoice No: A-1"),
            Document::from_text("b.txt", "Invoice No: B-2"),
        ];

        let forward = TrainingCorpus::from_outcomes(docs.iter().map(|d| builder.process_document(d)));
        let backward = TrainingCorpus::from_outcomes(docs.iter().rev().map(|d| builder.process_document(d)));

        assert_eq!(forward, backward);
        let ids: Vec<&str> = forward.iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "b.txt", "c.txt"]);
    }
}
