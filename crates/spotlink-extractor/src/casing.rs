//! Semi-truecasing
//!
//! Linkers tend to miss proper nouns in uncased text. Before the linker is
//! re-run, the whole text is lowercased and the first character of every
//! whitespace-delimited token inside an upstream entity span is uppercased.
//! The output always has the same number of characters as the input, so
//! offsets computed on it are valid for the original text.

use crate::index::SpanIndex;

/// Lowercase `text` except the token starts inside indexed spans
pub fn semi_truecase(text: &str, index: &SpanIndex) -> String {
    let original: Vec<char> = text.chars().collect();
    let mut cased: Vec<char> = original.iter().map(|&c| lower(c)).collect();

    for span in index.spans() {
        let Some(slice) = span.slice(&original) else {
            tracing::warn!(%span, text_len = original.len(), "Entity span outside document text");
            continue;
        };

        let mut at_token_start = true;
        for (offset, c) in slice.iter().enumerate() {
            if c.is_whitespace() {
                at_token_start = true;
            } else if at_token_start {
                let pos = span.start + offset;
                cased[pos] = upper(cased[pos]);
                at_token_start = false;
            }
        }
    }

    cased.into_iter().collect()
}

/// Single-character lowercase; multi-character mappings keep the original
fn lower(c: char) -> char {
    single(c.to_lowercase()).unwrap_or(c)
}

fn upper(c: char) -> char {
    single(c.to_uppercase()).unwrap_or(c)
}

fn single(mut mapped: impl Iterator<Item = char>) -> Option<char> {
    let first = mapped.next()?;
    mapped.next().is_none().then_some(first)
}
