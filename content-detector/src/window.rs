//! Context window around the focus paragraph.

use crate::types::Paragraph;

/// Default number of paragraphs on each side of the focus
pub const DEFAULT_CONTEXT_RADIUS: usize = 3;

/// Return up to `radius` paragraphs before and after `focus_index`, inclusive
/// of the focus itself, clipped at the document boundaries.
///
/// The window never holds more than `2 * radius + 1` paragraphs. An
/// out-of-range focus yields an empty slice.
pub fn build_window(paragraphs: &[Paragraph], focus_index: usize, radius: usize) -> &[Paragraph] {
    if focus_index >= paragraphs.len() {
        return &[];
    }

    let start = focus_index.saturating_sub(radius);
    let end = focus_index
        .saturating_add(radius)
        .saturating_add(1)
        .min(paragraphs.len());

    &paragraphs[start..end]
}
