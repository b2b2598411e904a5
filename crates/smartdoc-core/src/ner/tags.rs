//! BILOU tag inventory over a label vocabulary.

use std::collections::BTreeSet;

use crate::align::Token;
use crate::error::TrainingUpdateError;
use crate::models::span::EntitySpan;

/// One BILOU tag; the payload is the label index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Out,
    Begin(usize),
    Inside(usize),
    Last(usize),
    Unit(usize),
}

impl Tag {
    /// Whether an entity may end after this tag.
    fn closes(self) -> bool {
        matches!(self, Tag::Out | Tag::Last(_) | Tag::Unit(_))
    }

    /// Whether an entity may not be open when this tag starts.
    fn opens(self) -> bool {
        matches!(self, Tag::Out | Tag::Begin(_) | Tag::Unit(_))
    }
}

/// Label vocabulary and its dense tag indexing: `O` is 0, then
/// `B-`, `I-`, `L-`, `U-` for each label in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    labels: Vec<String>,
}

impl TagSet {
    pub fn new(labels: impl IntoIterator<Item = String>) -> Self {
        let labels: BTreeSet<String> = labels.into_iter().collect();
        Self {
            labels: labels.into_iter().collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        1 + 4 * self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn index(&self, tag: Tag) -> usize {
        match tag {
            Tag::Out => 0,
            Tag::Begin(l) => 1 + 4 * l,
            Tag::Inside(l) => 2 + 4 * l,
            Tag::Last(l) => 3 + 4 * l,
            Tag::Unit(l) => 4 + 4 * l,
        }
    }

    pub fn tag(&self, index: usize) -> Tag {
        if index == 0 {
            return Tag::Out;
        }
        let label = (index - 1) / 4;
        match (index - 1) % 4 {
            0 => Tag::Begin(label),
            1 => Tag::Inside(label),
            2 => Tag::Last(label),
            _ => Tag::Unit(label),
        }
    }

    /// Display name, e.g. `B-INVOICE_NUMBER`.
    pub fn name(&self, index: usize) -> String {
        match self.tag(index) {
            Tag::Out => "O".to_string(),
            Tag::Begin(l) => format!("B-{}", self.labels[l]),
            Tag::Inside(l) => format!("I-{}", self.labels[l]),
            Tag::Last(l) => format!("L-{}", self.labels[l]),
            Tag::Unit(l) => format!("U-{}", self.labels[l]),
        }
    }

    pub fn names(&self) -> Vec<String> {
        (0..self.len()).map(|i| self.name(i)).collect()
    }

    /// Whether tag `next` may follow `prev` (`None` is the sequence start).
    pub fn allows(&self, prev: Option<usize>, next: usize) -> bool {
        let next = self.tag(next);
        match prev.map(|p| self.tag(p)) {
            None => next.opens(),
            Some(Tag::Begin(l)) | Some(Tag::Inside(l)) => {
                matches!(next, Tag::Inside(n) | Tag::Last(n) if n == l)
            }
            Some(_) => next.opens(),
        }
    }

    /// Whether a sequence may end on `index`.
    pub fn allows_end(&self, index: usize) -> bool {
        self.tag(index).closes()
    }

    /// Gold tag indices for `tokens` given `spans`. Every span must start and
    /// end on token boundaries and no two spans may share a token.
    pub fn encode(&self, tokens: &[Token], spans: &[EntitySpan]) -> Result<Vec<usize>, TrainingUpdateError> {
        let mut tags = vec![0; tokens.len()];
        let mut taken = vec![false; tokens.len()];

        for span in spans {
            let label = self
                .label_index(&span.label)
                .ok_or_else(|| TrainingUpdateError::UnknownLabel(span.label.clone()))?;

            let first = tokens.iter().position(|t| t.start == span.start);
            let last = tokens.iter().position(|t| t.end == span.end);
            let (Some(first), Some(last)) = (first, last) else {
                return Err(TrainingUpdateError::SpanNotOnTokens {
                    start: span.start,
                    end: span.end,
                });
            };
            if first > last {
                return Err(TrainingUpdateError::SpanNotOnTokens {
                    start: span.start,
                    end: span.end,
                });
            }

            if let Some(i) = (first..=last).find(|&i| taken[i]) {
                return Err(TrainingUpdateError::OverlappingSpans(tokens[i].start));
            }

            for i in first..=last {
                taken[i] = true;
                let tag = if first == last {
                    Tag::Unit(label)
                } else if i == first {
                    Tag::Begin(label)
                } else if i == last {
                    Tag::Last(label)
                } else {
                    Tag::Inside(label)
                };
                tags[i] = self.index(tag);
            }
        }

        Ok(tags)
    }

    /// Token ranges `(first, last, label_index)` of a well-formed tag sequence.
    pub fn decode(&self, tags: &[usize]) -> Vec<(usize, usize, usize)> {
        let mut entities = Vec::new();
        let mut open: Option<(usize, usize)> = None;

        for (i, &index) in tags.iter().enumerate() {
            match self.tag(index) {
                Tag::Unit(l) => {
                    entities.push((i, i, l));
                    open = None;
                }
                Tag::Begin(l) => open = Some((i, l)),
                Tag::Inside(_) => {}
                Tag::Last(l) => {
                    if let Some((first, open_label)) = open.take() {
                        if open_label == l {
                            entities.push((first, i, l));
                        }
                    }
                }
                Tag::Out => open = None,
            }
        }

        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{RuleTokenizer, Tokenizer};
    use pretty_assertions::assert_eq;

    fn tag_set() -> TagSet {
        TagSet::new(["SELLER".to_string(), "BUYER".to_string()])
    }

    #[test]
    fn test_indexing_round_trips() {
        let tags = tag_set();
        assert_eq!(tags.len(), 9);
        assert_eq!(tags.labels(), ["BUYER".to_string(), "SELLER".to_string()]);
        for i in 0..tags.len() {
            assert_eq!(tags.index(tags.tag(i)), i);
        }
        assert_eq!(tags.name(0), "O");
        assert_eq!(tags.name(4), "U-BUYER");
        assert_eq!(tags.name(5), "B-SELLER");
    }

    #[test]
    fn test_transitions() {
        let tags = tag_set();
        let b_buyer = tags.index(Tag::Begin(0));
        let i_buyer = tags.index(Tag::Inside(0));
        let l_seller = tags.index(Tag::Last(1));

        assert!(tags.allows(None, 0));
        assert!(tags.allows(None, b_buyer));
        assert!(!tags.allows(None, i_buyer));
        assert!(tags.allows(Some(b_buyer), i_buyer));
        assert!(!tags.allows(Some(b_buyer), l_seller));
        assert!(!tags.allows(Some(b_buyer), 0));
        assert!(!tags.allows_end(b_buyer));
    }

    #[test]
    fn test_encode_and_decode() {
        let text = "Bill To: Beta Corp Ltd Seller: Acme";
        let tokens = RuleTokenizer::new().tokenize(text);
        let spans = vec![EntitySpan::new(9, 22, "BUYER"), EntitySpan::new(31, 35, "SELLER")];
        let tags = tag_set();

        let encoded = tags.encode(&tokens, &spans).unwrap();
        let names: Vec<String> = encoded.iter().map(|&i| tags.name(i)).collect();
        assert_eq!(
            names,
            vec!["O", "O", "O", "B-BUYER", "I-BUYER", "L-BUYER", "O", "O", "U-SELLER"]
        );
        assert_eq!(tags.decode(&encoded), vec![(3, 5, 0), (8, 8, 1)]);
    }

    #[test]
    fn test_encode_rejects_bad_spans() {
        let tokens = RuleTokenizer::new().tokenize("Invoice INV-1040 paid");
        let tags = tag_set();

        assert_eq!(
            tags.encode(&tokens, &[EntitySpan::new(12, 16, "BUYER")]),
            Err(TrainingUpdateError::SpanNotOnTokens { start: 12, end: 16 })
        );
        assert_eq!(
            tags.encode(&tokens, &[EntitySpan::new(0, 7, "TOTAL")]),
            Err(TrainingUpdateError::UnknownLabel("TOTAL".to_string()))
        );
        assert_eq!(
            tags.encode(
                &tokens,
                &[EntitySpan::new(0, 16, "BUYER"), EntitySpan::new(8, 21, "SELLER")]
            ),
            Err(TrainingUpdateError::OverlappingSpans(8))
        );
    }
}
