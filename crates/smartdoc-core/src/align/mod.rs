//! Alignment of extracted field values to token-aligned entity spans.

pub mod offset;
mod tokenizer;

pub use tokenizer::{RuleTokenizer, Token, Tokenizer};

use tracing::{debug, warn};

use crate::extract::FieldSchema;
use crate::models::document::FieldValues;
use crate::models::span::{AlignmentFailure, EntitySpan, FailureReason};

/// Result of aligning one field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentOutcome {
    /// Value located and snapped to whole tokens.
    Aligned(EntitySpan),
    /// Value does not occur verbatim in the text.
    NotFound,
    /// Value occurs but no whole-token span preserves it.
    Misaligned,
}

/// Turns field values into labeled spans over a specific text.
pub struct SpanAligner {
    schema: FieldSchema,
    tokenizer: Box<dyn Tokenizer>,
}

impl SpanAligner {
    /// Aligner using the rule tokenizer.
    pub fn new(schema: FieldSchema) -> Self {
        Self::with_tokenizer(schema, Box::new(RuleTokenizer::new()))
    }

    pub fn with_tokenizer(schema: FieldSchema, tokenizer: Box<dyn Tokenizer>) -> Self {
        Self { schema, tokenizer }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Align every schema field that has a value. Fields outside the schema
    /// are ignored; failures never stop the remaining fields.
    pub fn align(&self, text: &str, fields: &FieldValues) -> (Vec<EntitySpan>, Vec<AlignmentFailure>) {
        let tokens = self.tokenizer.tokenize(text);
        let mut spans = Vec::new();
        let mut failures = Vec::new();

        for (field, label) in self.schema.iter() {
            let Some(value) = fields.get(field) else { continue };

            let reason = match align_value(text, &tokens, value, label) {
                AlignmentOutcome::Aligned(span) => {
                    debug!("Aligned {} to {}", field, span);
                    spans.push(span);
                    continue;
                }
                AlignmentOutcome::NotFound => {
                    debug!("Value for {} not found in text: {:?}", field, value);
                    FailureReason::NotFound
                }
                AlignmentOutcome::Misaligned => {
                    warn!("Misaligned span for {}: {:?}", field, value);
                    FailureReason::Misaligned
                }
            };

            failures.push(AlignmentFailure {
                field: field.to_string(),
                value: value.to_string(),
                reason,
            });
        }

        (spans, failures)
    }
}

/// Locate the first exact occurrence of `value` in `text` and snap it to
/// token boundaries.
///
/// A span whose edges fall inside a token is contracted to the whole tokens
/// it covers, and kept only if the contracted text still contains the
/// value's first and last characters (case-insensitively).
pub fn align_value(text: &str, tokens: &[Token], value: &str, label: &str) -> AlignmentOutcome {
    let value = value.trim();
    if value.is_empty() {
        return AlignmentOutcome::NotFound;
    }

    let Some(byte_start) = text.find(value) else {
        return AlignmentOutcome::NotFound;
    };
    let start = offset::byte_to_char(text, byte_start);
    let end = start + offset::char_len(value);

    let starts_on_token = tokens.iter().any(|t| t.start == start);
    let ends_on_token = tokens.iter().any(|t| t.end == end);
    if starts_on_token && ends_on_token {
        return AlignmentOutcome::Aligned(EntitySpan::new(start, end, label));
    }

    let mut inside = tokens.iter().filter(|t| t.start >= start && t.end <= end);
    let Some(first) = inside.next() else {
        return AlignmentOutcome::Misaligned;
    };
    let new_start = first.start;
    let new_end = inside.last().map_or(first.end, |t| t.end);
    if new_start >= new_end {
        return AlignmentOutcome::Misaligned;
    }

    let Some(contracted) = offset::char_slice(text, new_start, new_end) else {
        return AlignmentOutcome::Misaligned;
    };
    let contracted = contracted.to_lowercase();
    let keeps_edges = [value.chars().next(), value.chars().last()]
        .into_iter()
        .flatten()
        .all(|c| c.to_lowercase().all(|lc| contracted.contains(lc)));

    if keeps_edges {
        AlignmentOutcome::Aligned(EntitySpan::new(new_start, new_end, label))
    } else {
        AlignmentOutcome::Misaligned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FieldMapping;
    use pretty_assertions::assert_eq;

    fn aligner() -> SpanAligner {
        SpanAligner::new(FieldSchema::defaults())
    }

    fn outcome(text: &str, value: &str) -> AlignmentOutcome {
        let tokens = RuleTokenizer::new().tokenize(text);
        align_value(text, &tokens, value, "X")
    }

    #[test]
    fn test_invoice_number_and_total() {
        let text = "Invoice No: INV-1040\nAmount Paid: $1528.61";
        let fields: FieldValues = [
            ("Invoice Number", Some("INV-1040")),
            ("Total Amount", Some("1528.61")),
        ]
        .into_iter()
        .collect();

        let (spans, failures) = aligner().align(text, &fields);

        assert!(failures.is_empty());
        assert_eq!(
            spans,
            vec![
                EntitySpan::new(12, 20, "INVOICE_NUMBER"),
                EntitySpan::new(35, 42, "TOTAL_AMOUNT"),
            ]
        );
        assert_eq!(spans[0].slice(text), Some("INV-1040"));
        assert_eq!(spans[1].slice(text), Some("1528.61"));
    }

    #[test]
    fn test_value_with_different_casing_is_not_found() {
        let text = "Invoice No: INV-1040";
        let fields: FieldValues = [("Invoice Number", Some("inv-1040"))].into_iter().collect();

        let (spans, failures) = aligner().align(text, &fields);

        assert!(spans.is_empty());
        assert_eq!(
            failures,
            vec![AlignmentFailure {
                field: "Invoice Number".to_string(),
                value: "inv-1040".to_string(),
                reason: FailureReason::NotFound,
            }]
        );
    }

    #[test]
    fn test_inserted_value_aligns_exactly() {
        let value = "PO-5240";
        for prefix in ["", "Ref ", "Order placed under ", "Köln € "] {
            let text = format!("{prefix}{value} shipped today.");
            let offset = offset::char_len(prefix);
            assert_eq!(
                outcome(&text, value),
                AlignmentOutcome::Aligned(EntitySpan::new(offset, offset + 7, "X")),
                "prefix {prefix:?}"
            );
        }
    }

    #[test]
    fn test_value_inside_token_is_misaligned() {
        assert_eq!(outcome("Invoice INV-1040", "1040"), AlignmentOutcome::Misaligned);
        assert_eq!(outcome("Total $1528.61", "$1528"), AlignmentOutcome::Misaligned);
    }

    #[test]
    fn test_contraction_keeps_value_edges() {
        // "e Sale" starts inside "Use"; contracting to "Sale" still holds 'e'
        assert_eq!(
            outcome("Use Sale", "e Sale"),
            AlignmentOutcome::Aligned(EntitySpan::new(4, 8, "X"))
        );
    }

    #[test]
    fn test_fields_outside_schema_are_ignored() {
        let schema = FieldSchema::new(vec![FieldMapping {
            field: "Bill To".to_string(),
            label: "BUYER".to_string(),
        }])
        .unwrap();
        let fields: FieldValues = [("Bill From", Some("Acme")), ("Bill To", Some("Beta"))]
            .into_iter()
            .collect();

        let (spans, failures) = SpanAligner::new(schema).align("Acme sells to Beta", &fields);

        assert_eq!(spans, vec![EntitySpan::new(14, 18, "BUYER")]);
        assert!(failures.is_empty());
    }

    #[test]
    fn test_misalignment_does_not_stop_other_fields() {
        let text = "Invoice No: INV-1040\nBill To: Beta Corp";
        let fields: FieldValues = [("Invoice Number", Some("1040")), ("Bill To", Some("Beta Corp"))]
            .into_iter()
            .collect();

        let (spans, failures) = aligner().align(text, &fields);

        assert_eq!(spans, vec![EntitySpan::new(30, 39, "BUYER")]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].reason, FailureReason::Misaligned);
    }
}
