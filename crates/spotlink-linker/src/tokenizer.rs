//! Word/punctuation tokenizer
//!
//! Splits text into runs of word characters and single punctuation marks,
//! reporting character offsets so that token boundaries can be compared
//! with annotations made by other tools.

use std::sync::OnceLock;

use regex::Regex;

use crate::Token;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\w+|[^\w\s]").expect("token pattern is valid"))
}

/// Tokenize `text`, offsets in characters
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    // matches arrive in order, so byte offsets convert incrementally
    let mut byte_pos = 0;
    let mut char_pos = 0;

    for mat in token_pattern().find_iter(text) {
        char_pos += text[byte_pos..mat.start()].chars().count();
        byte_pos = mat.start();
        tokens.push(Token::new(mat.as_str(), char_pos));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_and_punctuation() {
        let tokens = tokenize("Bob plays guitar.");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Bob", "plays", "guitar", "."]);
        assert_eq!(tokens[1].idx, 4);
        assert_eq!(tokens[3].idx, 16);
    }

    #[test]
    fn test_offsets_are_characters() {
        let tokens = tokenize("Zoë visits Köln");
        assert_eq!(tokens[1], Token::new("visits", 4));
        assert_eq!(tokens[2], Token::new("Köln", 11));
    }

    #[test]
    fn test_empty_text() {
        assert!(tokenize("   \n").is_empty());
    }
}
