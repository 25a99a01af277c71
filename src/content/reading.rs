//! Read-time estimation

use super::{RichTextRenderer, Section};

/// Fixed reading speed
pub const WORDS_PER_MINUTE: usize = 200;

/// Count the words of every section body, as rendered to plain text
pub fn count_words<R: RichTextRenderer + ?Sized>(sections: &[Section], renderer: &R) -> usize {
    sections
        .iter()
        .map(|section| renderer.as_text(&section.body).split_whitespace().count())
        .sum()
}

/// Estimated reading time in whole minutes, rounded up
pub fn estimate_read_time<R: RichTextRenderer + ?Sized>(sections: &[Section], renderer: &R) -> usize {
    count_words(sections, renderer).div_ceil(WORDS_PER_MINUTE)
}
