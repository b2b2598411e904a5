//! Deterministic rule tokenizer over character offsets.

use serde::{Deserialize, Serialize};

/// A token as a character range of the text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
}

/// Trait for tokenizers. Must be deterministic for a given text and
/// return tokens in order, without overlaps or whitespace.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

const PREFIXES: &[char] = &['(', '[', '{', '"', '\'', '$', '£', '€', '₹', '#', '<', '“', '‘'];
const SUFFIXES: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '"', '\'', '%', '>', '”', '’'];

/// Whitespace tokenizer that also splits off leading/trailing punctuation,
/// `:` (except between digits) and hyphens between letters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTokenizer;

impl RuleTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            split_chunk(&chars, start, i, &mut tokens);
        }

        tokens
    }
}

fn push(chars: &[char], start: usize, end: usize, out: &mut Vec<Token>) {
    if start < end {
        out.push(Token {
            text: chars[start..end].iter().collect(),
            start,
            end,
        });
    }
}

fn split_chunk(chars: &[char], mut start: usize, mut end: usize, out: &mut Vec<Token>) {
    while start < end && PREFIXES.contains(&chars[start]) {
        push(chars, start, start + 1, out);
        start += 1;
    }

    let mut suffixes = Vec::new();
    while end > start && SUFFIXES.contains(&chars[end - 1]) {
        end -= 1;
        suffixes.push(end);
    }

    let mut piece_start = start;
    for i in start..end {
        if is_infix(chars, i, start, end) {
            push(chars, piece_start, i, out);
            push(chars, i, i + 1, out);
            piece_start = i + 1;
        }
    }
    push(chars, piece_start, end, out);

    for s in suffixes.into_iter().rev() {
        push(chars, s, s + 1, out);
    }
}

fn is_infix(chars: &[char], i: usize, start: usize, end: usize) -> bool {
    if i == start || i + 1 >= end {
        return false;
    }
    let (prev, c, next) = (chars[i - 1], chars[i], chars[i + 1]);
    match c {
        ':' => !(prev.is_ascii_digit() && next.is_ascii_digit()),
        '-' => prev.is_alphabetic() && next.is_alphabetic(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(text: &str) -> Vec<String> {
        RuleTokenizer::new().tokenize(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_splits_punctuation() {
        assert_eq!(
            texts("Invoice No: INV-1040\nAmount Paid: $1528.61"),
            vec!["Invoice", "No", ":", "INV-1040", "Amount", "Paid", ":", "$", "1528.61"]
        );
    }

    #[test]
    fn test_nested_prefix_and_suffix() {
        assert_eq!(texts("(\"$5\")."), vec!["(", "\"", "$", "5", "\"", ")", "."]);
    }

    #[test]
    fn test_infixes() {
        assert_eq!(texts("No:INV"), vec!["No", ":", "INV"]);
        assert_eq!(texts("12:30"), vec!["12:30"]);
        assert_eq!(texts("E-way"), vec!["E", "-", "way"]);
        assert_eq!(texts("PO-5240"), vec!["PO-5240"]);
    }

    #[test]
    fn test_offsets_are_characters() {
        let tokens = RuleTokenizer::new().tokenize("café €50");
        assert_eq!(tokens[0], Token { text: "café".into(), start: 0, end: 4 });
        assert_eq!(tokens[1], Token { text: "€".into(), start: 5, end: 6 });
        assert_eq!(tokens[2], Token { text: "50".into(), start: 6, end: 8 });
    }

    #[test]
    fn test_empty_and_blank_text() {
        assert!(texts("").is_empty());
        assert!(texts(" \n\t ").is_empty());
    }
}
