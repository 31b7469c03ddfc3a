//! Cursor location.
//!
//! Maps a cursor byte offset onto the index of the paragraph it belongs to.

use crate::segmenter::separator_len;
use crate::types::Paragraph;
use tracing::trace;

/// Find the paragraph containing `cursor_offset`
///
/// Paragraph `i` matches when the cursor falls within
/// `[start_offset, end_offset + separator]`, so a cursor sitting on the
/// separator (or exactly on the boundary) binds to the preceding paragraph.
///
/// Returns 0 when the cursor precedes every paragraph or there are no
/// paragraphs at all; callers must treat an empty slice as "no focus".
/// A cursor past every paragraph falls back to the last index.
pub fn locate(paragraphs: &[Paragraph], cursor_offset: usize) -> usize {
    if paragraphs.is_empty() {
        return 0;
    }

    for (index, paragraph) in paragraphs.iter().enumerate() {
        let band_end = paragraph.end_offset + separator_len(paragraphs, index);
        if cursor_offset < paragraph.start_offset {
            // Only reachable for the first paragraph (bands are contiguous)
            return index;
        }
        if cursor_offset <= band_end {
            return index;
        }
    }

    let last = paragraphs.len() - 1;
    trace!(
        "Cursor {} past last paragraph (ends at {}), falling back to {}",
        cursor_offset,
        paragraphs[last].end_offset,
        last
    );
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::segment;

    #[test]
    fn test_empty_paragraphs() {
        assert_eq!(locate(&[], 0), 0);
        assert_eq!(locate(&[], 42), 0);
    }

    #[test]
    fn test_cursor_inside_first_paragraph() {
        let paragraphs = segment("Intro text.\n\nSecond paragraph.");
        assert_eq!(locate(&paragraphs, 5), 0);
    }

    #[test]
    fn test_cursor_inside_second_paragraph() {
        let paragraphs = segment("Intro text.\n\nSecond paragraph.");
        assert_eq!(locate(&paragraphs, 20), 1);
        assert_eq!(locate(&paragraphs, 30), 1);
    }

    #[test]
    fn test_cursor_on_separator_binds_to_preceding() {
        let paragraphs = segment("Intro text.\n\nSecond paragraph.");
        // End of first paragraph and inside the blank line
        assert_eq!(locate(&paragraphs, 11), 0);
        assert_eq!(locate(&paragraphs, 12), 0);
        // Exact boundary: end + separator
        assert_eq!(locate(&paragraphs, 13), 0);
        assert_eq!(locate(&paragraphs, 14), 1);
    }

    #[test]
    fn test_cursor_before_all_paragraphs() {
        let paragraphs = segment("\n\n\nFirst\n\nSecond");
        assert!(paragraphs[0].start_offset > 0);
        assert_eq!(locate(&paragraphs, 0), 0);
    }

    #[test]
    fn test_cursor_past_end_falls_back_to_last() {
        let paragraphs = segment("a\n\nb\n\nc\n\n\n\n");
        assert_eq!(locate(&paragraphs, 1000), 2);
    }

    #[test]
    fn test_single_paragraph() {
        let paragraphs = segment("only one");
        for cursor in 0..=8 {
            assert_eq!(locate(&paragraphs, cursor), 0);
        }
    }
}
