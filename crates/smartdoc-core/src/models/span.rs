//! Entity spans and alignment diagnostics.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A labeled character range `[start, end)` in one specific text.
///
/// Offsets count Unicode scalar values, not bytes. Serialized as the
/// tuple `[start, end, "LABEL"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "(usize, usize, String)", try_from = "(usize, usize, String)")]
pub struct EntitySpan {
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Entity label, e.g. `INVOICE_NUMBER`.
    pub label: String,
}

impl EntitySpan {
    /// Create a span. Callers must guarantee `start < end`.
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        debug_assert!(start < end, "empty or inverted span {start}..{end}");
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether the span lies inside a text of `text_len` characters.
    pub fn fits(&self, text_len: usize) -> bool {
        self.start < self.end && self.end <= text_len
    }

    /// Whether two spans share at least one offset. Adjacent spans do not.
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The covered substring of `text`, if the span fits.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        crate::align::offset::char_slice(text, self.start, self.end)
    }
}

impl From<EntitySpan> for (usize, usize, String) {
    fn from(span: EntitySpan) -> Self {
        (span.start, span.end, span.label)
    }
}

impl TryFrom<(usize, usize, String)> for EntitySpan {
    type Error = String;

    fn try_from((start, end, label): (usize, usize, String)) -> Result<Self, Self::Error> {
        if start >= end {
            return Err(format!("span start {start} must be before end {end}"));
        }
        if label.is_empty() {
            return Err(format!("span {start}..{end} has an empty label"));
        }
        Ok(Self { start, end, label })
    }
}

impl fmt::Display for EntitySpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.start, self.end, self.label)
    }
}

/// Spans for one document, pairwise non-overlapping and ordered by start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedSpanSet {
    spans: Vec<EntitySpan>,
}

impl ResolvedSpanSet {
    /// Build from spans already known to be disjoint.
    pub(crate) fn from_disjoint(mut spans: Vec<EntitySpan>) -> Self {
        spans.sort_by_key(|s| (s.start, s.end));
        debug_assert!(spans.windows(2).all(|w| !w[0].overlaps(&w[1])));
        Self { spans }
    }

    /// Build from untrusted spans, returning `None` if any two overlap.
    pub fn try_from_spans(mut spans: Vec<EntitySpan>) -> Option<Self> {
        spans.sort_by_key(|s| (s.start, s.end));
        if spans.windows(2).any(|w| w[0].overlaps(&w[1])) {
            return None;
        }
        Some(Self { spans })
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EntitySpan> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[EntitySpan] {
        &self.spans
    }

    pub fn into_vec(self) -> Vec<EntitySpan> {
        self.spans
    }

    /// Distinct labels used by the spans.
    pub fn labels(&self) -> BTreeSet<&str> {
        self.spans.iter().map(|s| s.label.as_str()).collect()
    }
}

impl<'de> Deserialize<'de> for ResolvedSpanSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let spans = Vec::<EntitySpan>::deserialize(deserializer)?;
        Self::try_from_spans(spans)
            .ok_or_else(|| serde::de::Error::custom("entity spans overlap"))
    }
}

impl<'a> IntoIterator for &'a ResolvedSpanSet {
    type Item = &'a EntitySpan;
    type IntoIter = std::slice::Iter<'a, EntitySpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Why a field value produced no span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The value does not occur verbatim in the text.
    NotFound,
    /// The value occurs but cannot be aligned to whole tokens.
    Misaligned,
}

/// A field value that could not be turned into a span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentFailure {
    pub field: String,
    pub value: String,
    pub reason: FailureReason,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_span_serializes_as_tuple() {
        let span = EntitySpan::new(12, 20, "INVOICE_NUMBER");
        let json = serde_json::to_string(&span).unwrap();
        assert_eq!(json, r#"[12,20,"INVOICE_NUMBER"]"#);

        let back: EntitySpan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, span);
    }

    #[test]
    fn test_span_rejects_inverted_offsets() {
        assert!(serde_json::from_str::<EntitySpan>(r#"[5,5,"X"]"#).is_err());
        assert!(serde_json::from_str::<EntitySpan>(r#"[9,3,"X"]"#).is_err());
        assert!(serde_json::from_str::<EntitySpan>(r#"[1,3,""]"#).is_err());
    }

    #[test]
    fn test_adjacent_spans_do_not_overlap() {
        let a = EntitySpan::new(0, 5, "A");
        let b = EntitySpan::new(5, 9, "B");
        let c = EntitySpan::new(4, 6, "C");
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_resolved_set_rejects_overlap() {
        let ok = ResolvedSpanSet::try_from_spans(vec![
            EntitySpan::new(6, 9, "B"),
            EntitySpan::new(0, 6, "A"),
        ])
        .unwrap();
        assert_eq!(ok.as_slice()[0].label, "A");

        assert!(ResolvedSpanSet::try_from_spans(vec![
            EntitySpan::new(0, 6, "A"),
            EntitySpan::new(5, 9, "B"),
        ])
        .is_none());
    }

    #[test]
    fn test_slice_uses_char_offsets() {
        let text = "Total: €50 paid";
        let span = EntitySpan::new(7, 10, "TOTAL_AMOUNT");
        assert_eq!(span.slice(text), Some("€50"));
        assert_eq!(EntitySpan::new(7, 99, "X").slice(text), None);
    }
}
