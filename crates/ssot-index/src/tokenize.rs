//! Tokenization shared by the term index and the ranker.
//!
//! Text is split on non-alphanumeric boundaries and lower-cased. A
//! hyphenated word stays whole only when the vocabulary knows it as a
//! compound; otherwise it splits into its parts.

use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::OnceLock;

/// Words dropped from query keywords and from undefined-term candidates.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for",
    "from", "how", "i", "if", "in", "is", "it", "its", "of", "on", "or", "should", "that",
    "the", "this", "to", "was", "we", "what", "when", "where", "which", "who", "why", "will",
    "with", "you", "your",
];

/// One token with the spelling it had in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Lower-cased term.
    pub term: String,
    /// Original spelling.
    pub surface: &'a str,
    /// Byte range of `surface` within the tokenized text.
    pub span: Range<usize>,
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}]+(?:-[\p{L}\p{N}]+)*").expect("word pattern is valid")
    })
}

/// Splits `text` into tokens, keeping hyphenated words listed in `compounds` whole.
///
/// Tokens of a single character are dropped.
pub fn tokenize<'a>(text: &'a str, compounds: &HashSet<String>) -> Vec<Token<'a>> {
    let mut tokens = Vec::new();
    for m in word_re().find_iter(text) {
        let word = m.as_str();
        if word.contains('-') {
            let lower = word.to_lowercase();
            if compounds.contains(&lower) {
                tokens.push(Token {
                    term: lower,
                    surface: word,
                    span: m.range(),
                });
                continue;
            }
            let mut start = m.start();
            for part in word.split('-') {
                tokens.extend(token(part, start));
                start += part.len() + 1;
            }
        } else if let Some(t) = token(word, m.start()) {
            tokens.push(t);
        }
    }
    tokens
}

fn token(word: &str, start: usize) -> Option<Token<'_>> {
    if word.chars().count() < 2 {
        return None;
    }
    Some(Token {
        term: word.to_lowercase(),
        surface: word,
        span: start..start + word.len(),
    })
}

pub fn is_stop_word(term: &str) -> bool {
    STOP_WORDS.contains(&term)
}

/// True for tokens made only of digits.
pub fn is_numeric(term: &str) -> bool {
    term.chars().all(|c| c.is_numeric())
}
