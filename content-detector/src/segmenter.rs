//! Paragraph segmentation.
//!
//! Splits text on blank-line separators and keeps the original byte offsets of
//! every paragraph so the cursor can be mapped back onto it.

use crate::types::Paragraph;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A line break followed by one or more whitespace-only lines.
    // [^\S\n] is "whitespace except newline", which also absorbs the \r of CRLF.
    static ref SEPARATOR: Regex = Regex::new(r"\r?\n(?:[^\S\n]*\n)+").unwrap();
}

/// Split text into paragraphs
///
/// Segments that are empty after trimming are dropped. Never fails: empty or
/// whitespace-only input yields an empty vector.
pub fn segment(text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut start = 0;

    for separator in SEPARATOR.find_iter(text) {
        push_segment(&mut paragraphs, text, start, separator.start());
        start = separator.end();
    }
    push_segment(&mut paragraphs, text, start, text.len());

    paragraphs
}

fn push_segment(paragraphs: &mut Vec<Paragraph>, text: &str, start: usize, end: usize) {
    let trimmed = text[start..end].trim();
    if trimmed.is_empty() {
        return;
    }
    paragraphs.push(Paragraph::new(trimmed, start, end));
}

/// Bytes between a paragraph and the next one (0 for the last paragraph)
pub fn separator_len(paragraphs: &[Paragraph], index: usize) -> usize {
    match (paragraphs.get(index), paragraphs.get(index + 1)) {
        (Some(current), Some(next)) => next.start_offset.saturating_sub(current.end_offset),
        _ => 0,
    }
}
