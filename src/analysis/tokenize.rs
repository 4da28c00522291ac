//! Tokenization over normalized text.
use unicode_segmentation::UnicodeSegmentation;

/// Split a normalized string into candidate tokens, preserving order.
/// Uses UAX-29 word bounds, so apostrophes and underscores stay inside
/// their word while stray punctuation is dropped.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.unicode_words().collect()
}
