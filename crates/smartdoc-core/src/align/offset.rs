//! Byte/character offset conversion.
//!
//! Spans are stored as character offsets; `str::find` and regex matches
//! return byte offsets. Convert at the boundary and nowhere else.

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Character offset of byte position `byte`. `byte` must be a char boundary.
pub fn byte_to_char(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Byte position of character offset `ch`; `ch == char_len(text)` maps to `text.len()`.
pub fn char_to_byte(text: &str, ch: usize) -> Option<usize> {
    text.char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .nth(ch)
}

/// Substring covering characters `[start, end)`.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let b_start = char_to_byte(text, start)?;
    let b_end = char_to_byte(text, end)?;
    Some(&text[b_start..b_end])
}
