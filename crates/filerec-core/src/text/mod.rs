//! Text processing: tokenization and composable token filtering passes
//!
//! Tokenization always runs first; each pass then rewrites the current
//! token sequence in place.

mod dates;

use crate::config::TokenizerConfig;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::sync::OnceLock;

pub use dates::is_date_like;

/// Word pattern: letter/digit runs, optionally joined by inner punctuation
/// such as apostrophes, hyphens, dots, slashes and colons ("don't",
/// "e-mail", "2024-01-05", "12:30")
static WORD: OnceLock<Regex> = OnceLock::new();

/// Common English stop words
static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();

/// Porter stemmer for English text
static STEMMER: OnceLock<Stemmer> = OnceLock::new();

fn word_regex() -> &'static Regex {
    WORD.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}]+(?:['’\-./:][\p{L}\p{N}]+)*").expect("word pattern is valid")
    })
}

fn get_stop_words() -> &'static HashSet<&'static str> {
    STOP_WORDS.get_or_init(|| {
        [
            "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into",
            "is", "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then",
            "there", "these", "they", "this", "to", "was", "will", "with",
        ]
        .iter()
        .copied()
        .collect()
    })
}

fn get_stemmer() -> &'static Stemmer {
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Split text into word tokens, preserving order and case
pub fn tokenize(text: &str) -> Vec<String> {
    word_regex()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Drop tokens that parse as numbers
pub fn remove_numeric(tokens: &mut Vec<String>) {
    tokens.retain(|t| !is_numeric(t));
}

/// Drop tokens that parse as a date or time expression
pub fn remove_date_like(tokens: &mut Vec<String>) {
    tokens.retain(|t| !is_date_like(t));
}

/// Case-fold every token
pub fn to_lowercase(tokens: &mut [String]) {
    for token in tokens.iter_mut() {
        *token = token.to_lowercase();
    }
}

/// Drop common English stop words (case-insensitive)
pub fn remove_stop_words(tokens: &mut Vec<String>) {
    let stop_words = get_stop_words();
    tokens.retain(|t| !stop_words.contains(t.to_lowercase().as_str()));
}

/// Reduce tokens to their Porter stems
pub fn stem(tokens: &mut [String]) {
    let stemmer = get_stemmer();
    for token in tokens.iter_mut() {
        *token = stemmer.stem(token).to_string();
    }
}

/// A number in the usual decimal notations; words like "nan" or "inf"
/// do not count
pub fn is_numeric(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit()) && token.parse::<f64>().is_ok()
}

/// Tokenize and apply the passes enabled in `config`
///
/// Numeric and date filtering run before case-folding so that patterns
/// such as month names are matched on the original text.
pub fn tokenize_with(text: &str, config: &TokenizerConfig) -> Vec<String> {
    let mut tokens = tokenize(text);
    if config.remove_numeric {
        remove_numeric(&mut tokens);
    }
    if config.remove_date_like {
        remove_date_like(&mut tokens);
    }
    if config.lowercase {
        to_lowercase(&mut tokens);
    }
    if config.remove_stop_words {
        remove_stop_words(&mut tokens);
    }
    if config.stemming {
        stem(&mut tokens);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("Hello world! This is a test.");
        assert_eq!(tokens, vec!["Hello", "world", "This", "is", "a", "test"]);
    }

    #[test]
    fn test_tokenize_keeps_inner_punctuation() {
        let tokens = tokenize("don't e-mail me on 2024-01-05 at 12:30, ok?");
        assert_eq!(
            tokens,
            vec!["don't", "e-mail", "me", "on", "2024-01-05", "at", "12:30", "ok"]
        );
    }

    #[test]
    fn test_tokenize_unicode_words() {
        let tokens = tokenize("Grüße aus Köln");
        assert_eq!(tokens, vec!["Grüße", "aus", "Köln"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("   \n\t ...").is_empty());
    }

    #[test]
    fn test_remove_numeric() {
        let mut tokens = tokenize("release 3.14 has 42 fixes and 1,000 users nan inf");
        remove_numeric(&mut tokens);
        assert_eq!(
            tokens,
            vec!["release", "has", "fixes", "and", "users", "nan", "inf"]
        );
    }

    #[test]
    fn test_remove_date_like() {
        let mut tokens = tokenize("meeting Monday 2024-01-05 12:30 about budget in March");
        remove_date_like(&mut tokens);
        assert_eq!(tokens, vec!["meeting", "about", "budget", "in"]);
    }

    #[test]
    fn test_to_lowercase_in_place() {
        let mut tokens = vec!["Graph".to_string(), "THEORY".to_string()];
        to_lowercase(&mut tokens);
        assert_eq!(tokens, vec!["graph", "theory"]);
    }

    #[test]
    fn test_remove_stop_words() {
        let mut tokens = tokenize("The quick brown fox");
        remove_stop_words(&mut tokens);
        assert_eq!(tokens, vec!["quick", "brown", "fox"]);
    }

    #[test]
    fn test_stemming() {
        let mut tokens = vec!["graphs".to_string(), "networks".to_string()];
        stem(&mut tokens);
        assert_eq!(tokens, vec!["graph", "network"]);
    }

    #[test]
    fn test_tokenize_with_default_config() {
        let config = TokenizerConfig::default();
        let tokens = tokenize_with("Budget 2024 review on Friday, 3 Items", &config);
        assert_eq!(tokens, vec!["budget", "review", "on", "items"]);
    }

    #[test]
    fn test_tokenize_with_all_passes_disabled() {
        let config = TokenizerConfig {
            lowercase: false,
            remove_numeric: false,
            remove_date_like: false,
            remove_stop_words: false,
            stemming: false,
        };
        let tokens = tokenize_with("Budget 2024", &config);
        assert_eq!(tokens, vec!["Budget", "2024"]);
    }
}
