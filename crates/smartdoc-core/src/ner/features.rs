//! Sparse string features per token.

use crate::align::Token;

pub const BIAS: &str = "bias";

/// Word shape with runs longer than four collapsed, e.g. `INV-1040` -> `XXX-dddd`.
pub fn shape(word: &str) -> String {
    let mut out = String::new();
    let mut last = None;
    let mut run = 0;

    for c in word.chars() {
        let mapped = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_ascii_digit() {
            'd'
        } else {
            c
        };

        if Some(mapped) == last {
            run += 1;
        } else {
            last = Some(mapped);
            run = 1;
        }
        if run <= 4 {
            out.push(mapped);
        }
    }

    out
}

fn affix(word: &str, n: usize, suffix: bool) -> String {
    let chars: Vec<char> = word.chars().collect();
    if suffix {
        chars[chars.len().saturating_sub(n)..].iter().collect()
    } else {
        chars[..n.min(chars.len())].iter().collect()
    }
}

/// Features for token `i` of `tokens`.
pub fn token_features(tokens: &[Token], i: usize) -> Vec<String> {
    let word = &tokens[i].text;
    let lower = word.to_lowercase();
    let mut feats = vec![
        BIAS.to_string(),
        format!("w={lower}"),
        format!("shape={}", shape(word)),
        format!("pre3={}", affix(&lower, 3, false)),
        format!("suf3={}", affix(&lower, 3, true)),
    ];

    if word.chars().any(|c| c.is_ascii_digit()) {
        feats.push("has_digit".to_string());
    }
    if word.chars().all(|c| c.is_ascii_digit()) {
        feats.push("all_digit".to_string());
    }
    if word.chars().all(|c| !c.is_alphanumeric()) {
        feats.push("punct".to_string());
    }
    if word.chars().next().is_some_and(char::is_uppercase) {
        feats.push("title".to_string());
    }

    match i.checked_sub(1).map(|p| &tokens[p]) {
        Some(prev) => {
            feats.push(format!("w-1={}", prev.text.to_lowercase()));
            feats.push(format!("shape-1={}", shape(&prev.text)));
        }
        None => feats.push("BOS".to_string()),
    }
    match tokens.get(i + 1) {
        Some(next) => {
            feats.push(format!("w+1={}", next.text.to_lowercase()));
            feats.push(format!("shape+1={}", shape(&next.text)));
        }
        None => feats.push("EOS".to_string()),
    }
    if i >= 2 {
        feats.push(format!("w-2={}", tokens[i - 2].text.to_lowercase()));
    }

    feats
}

/// Features for every token.
pub fn sequence_features(tokens: &[Token]) -> Vec<Vec<String>> {
    (0..tokens.len()).map(|i| token_features(tokens, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{RuleTokenizer, Tokenizer};

    #[test]
    fn test_shape() {
        assert_eq!(shape("INV-1040"), "XXX-dddd");
        assert_eq!(shape("Invoice"), "Xxxxx");
        assert_eq!(shape("1528.61"), "dddd.dd");
    }

    #[test]
    fn test_token_features() {
        let tokens = RuleTokenizer::new().tokenize("Invoice No: INV-1040");
        let feats = token_features(&tokens, 3);

        assert!(feats.contains(&"bias".to_string()));
        assert!(feats.contains(&"w=inv-1040".to_string()));
        assert!(feats.contains(&"w-1=:".to_string()));
        assert!(feats.contains(&"w-2=no".to_string()));
        assert!(feats.contains(&"has_digit".to_string()));
        assert!(feats.contains(&"EOS".to_string()));
        assert!(!feats.contains(&"BOS".to_string()));

        assert!(token_features(&tokens, 0).contains(&"BOS".to_string()));
    }
}
