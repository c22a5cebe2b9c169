//! Pattern and utterance lexing
//!
//! Turns raw strings into [`Token`] streams using the pest grammar in
//! `pattern.pest`. The [`Lemmatizer`] trait is the seam for plugging in a
//! real morphological analyser; [`SimpleLemmatizer`] is the built-in
//! lower-casing tokenizer with a small English suffix heuristic.

use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Parser)]
#[grammar = "pattern.pest"]
struct PatternLexer;

/// Error type for lexing failures
#[derive(Debug, Error)]
pub enum LexError {
    #[error("lex error: {0}")]
    Pattern(#[from] pest::error::Error<Rule>),
}

/// Produces the token stream consumed by the match tree.
pub trait Lemmatizer {
    fn lemmatize(&self, input: &str) -> Result<Vec<Token>, LexError>;
}

/// Built-in tokenizer: Unicode lower-casing, wildcard/variable recognition,
/// and a naive English suffix lemmatizer. POS tags are left empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleLemmatizer;

impl Lemmatizer for SimpleLemmatizer {
    fn lemmatize(&self, input: &str) -> Result<Vec<Token>, LexError> {
        let pairs = PatternLexer::parse(Rule::pattern, input)?;
        let mut tokens = Vec::new();

        let pattern = pairs.into_iter().next().expect("grammar yields one pattern");
        for pair in pattern.into_inner() {
            let original = pair.as_str().to_string();
            match pair.as_rule() {
                Rule::word => {
                    let normalized = original.to_lowercase();
                    let lemma = lemma_of(&normalized);
                    tokens.push(Token {
                        original,
                        normalized,
                        lemma,
                        pos_tag: String::new(),
                        kind: TokenKind::Word,
                    });
                }
                Rule::wildcard => {
                    let kind = if original == "*" {
                        TokenKind::WildcardStar
                    } else {
                        TokenKind::WildcardPlus
                    };
                    tokens.push(Token {
                        normalized: original.clone(),
                        original,
                        lemma: String::new(),
                        pos_tag: String::new(),
                        kind,
                    });
                }
                Rule::variable => {
                    let name = pair
                        .into_inner()
                        .next()
                        .expect("variable always holds a name")
                        .as_str()
                        .to_string();
                    tokens.push(Token {
                        normalized: original.to_lowercase(),
                        original,
                        lemma: String::new(),
                        pos_tag: String::new(),
                        kind: TokenKind::Variable(name),
                    });
                }
                Rule::symbol => {
                    tokens.push(Token {
                        normalized: original.clone(),
                        original,
                        lemma: String::new(),
                        pos_tag: String::new(),
                        kind: TokenKind::Symbol,
                    });
                }
                Rule::EOI => {}
                _ => {}
            }
        }

        Ok(tokens)
    }
}

/// Strip common English suffixes. Good enough for demos and tests; real
/// deployments supply their own [`Lemmatizer`].
fn lemma_of(norm: &str) -> String {
    if let Some(stem) = norm.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
    }
    if let Some(stem) = norm.strip_suffix("ing") {
        if stem.len() >= 3 {
            return squeeze(stem);
        }
    }
    if let Some(stem) = norm.strip_suffix("ed") {
        if stem.len() >= 3 {
            return squeeze(stem);
        }
    }
    if norm.len() > 3 && norm.ends_with('s') && !norm.ends_with("ss") {
        return norm[..norm.len() - 1].to_string();
    }
    norm.to_string()
}

/// Drop a doubled trailing consonant left behind by suffix removal
/// ("running" -> "runn" -> "run"). Doubled `s` is kept: "miss", "kiss".
fn squeeze(stem: &str) -> String {
    let b = stem.as_bytes();
    if b.len() >= 2
        && b[b.len() - 1] == b[b.len() - 2]
        && b[b.len() - 1].is_ascii_alphabetic()
        && !matches!(b[b.len() - 1], b'a' | b'e' | b'i' | b'o' | b'u' | b's')
    {
        return stem[..stem.len() - 1].to_string();
    }
    stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        SimpleLemmatizer.lemmatize(input).unwrap()
    }

    #[test]
    fn test_lex_words() {
        let tokens = lex("Hello World");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].original, "Hello");
        assert_eq!(tokens[0].normalized, "hello");
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[1].normalized, "world");
    }

    #[test]
    fn test_lex_wildcards() {
        let tokens = lex("hello * + there");
        assert_eq!(tokens[1].kind, TokenKind::WildcardStar);
        assert_eq!(tokens[2].kind, TokenKind::WildcardPlus);
    }

    #[test]
    fn test_lex_variable() {
        let tokens = lex("my name is [name]");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].kind, TokenKind::Variable("name".to_string()));
        assert_eq!(tokens[3].original, "[name]");
    }

    #[test]
    fn test_lex_symbols_split_from_words() {
        let tokens = lex("hello!");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].normalized, "hello");
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert_eq!(tokens[1].original, "!");
    }

    #[test]
    fn test_lex_quoted_word_stays_whole() {
        let tokens = lex("'Run' now");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].original, "'Run'");
        assert_eq!(tokens[0].kind, TokenKind::Word);
    }

    #[test]
    fn test_lex_apostrophe_inside_word() {
        let tokens = lex("don't panic");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].normalized, "don't");
    }

    #[test]
    fn test_lex_empty_input() {
        assert!(lex("").is_empty());
        assert!(lex("   ").is_empty());
    }

    #[test]
    fn test_unclosed_bracket_degrades_to_symbol() {
        let tokens = lex("[oops input");
        assert_eq!(tokens[0].kind, TokenKind::Symbol);
        assert_eq!(tokens[1].normalized, "oops");
        assert_eq!(tokens[2].normalized, "input");
    }

    #[test]
    fn test_lemma_heuristic() {
        assert_eq!(lemma_of("cats"), "cat");
        assert_eq!(lemma_of("running"), "run");
        assert_eq!(lemma_of("missed"), "miss");
        assert_eq!(lemma_of("ponies"), "pony");
        assert_eq!(lemma_of("is"), "is");
        assert_eq!(lemma_of("glass"), "glass");
    }
}
