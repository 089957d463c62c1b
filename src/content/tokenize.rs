//! Word tokenization for the index

use serde::{Deserialize, Serialize};

/// A whitespace-delimited word and its index key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The word as authored
    pub original: String,
    /// Lower-cased, ASCII alphanumerics only
    pub normalized: String,
}

impl Token {
    /// Create a token from a raw word
    pub fn new(original: &str) -> Self {
        Self {
            original: original.to_string(),
            normalized: normalize(original),
        }
    }

    /// Whether the normalized form is non-empty
    pub fn is_indexable(&self) -> bool {
        !self.normalized.is_empty()
    }
}

/// Lower-case a word and strip everything outside `[0-9a-zA-Z]`
pub fn normalize(word: &str) -> String {
    word.to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Split text on whitespace into tokens, preserving order.
///
/// Tokens whose normalized form is empty are kept; callers drop them
/// before persisting.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace().map(Token::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(text: &str) -> Vec<(String, String)> {
        tokenize(text)
            .into_iter()
            .map(|t| (t.original, t.normalized))
            .collect()
    }

    #[test]
    fn test_tokenize_mixed_punctuation() {
        let expected = vec![
            ("AI/ML".to_string(), "aiml".to_string()),
            ("Inc.".to_string(), "inc".to_string()),
            ("(NASDAQ:".to_string(), "nasdaq".to_string()),
            ("XYZ)".to_string(), "xyz".to_string()),
        ];
        assert_eq!(pairs("AI/ML Inc. (NASDAQ: XYZ)"), expected);
    }

    #[test]
    fn test_punctuation_only_normalizes_to_empty() {
        let tokens = tokenize("---");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].normalized, "");
        assert!(!tokens[0].is_indexable());
    }

    #[test]
    fn test_whitespace_variants() {
        let tokens = tokenize("  one\ttwo\n\nthree  ");
        let words: Vec<_> = tokens.iter().map(|t| t.original.as_str()).collect();
        assert_eq!(words, vec!["one", "two", "three"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_non_ascii_is_stripped() {
        assert_eq!(normalize("Café"), "caf");
        assert_eq!(normalize("$GME🚀"), "gme");
        assert_eq!(normalize("R2-D2"), "r2d2");
    }

    #[test]
    fn test_repeated_words_are_not_merged() {
        let tokens = tokenize("buy buy BUY");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.normalized == "buy"));
    }
}
