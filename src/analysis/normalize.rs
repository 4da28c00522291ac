//! Text normalization.
use unicode_normalization::UnicodeNormalization;

/// Normalize a string for identification and tokenization:
/// NFKC, lowercase fold, punctuation stripped to spaces (intra-word
/// apostrophes, hyphens and underscores are preserved for the stemmers),
/// whitespace collapsed.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().flat_map(char::to_lowercase).collect();

    let mut out = String::with_capacity(folded.len());
    let mut last_was_space = true;
    for c in folded.chars() {
        let keep = c.is_alphanumeric() || c == '\'' || c == '-' || c == '_';
        if keep {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}
