//! Tokenizer of the transformer language.

use crate::core::tokenizer::{LowLevelToken, Tokenizer, TriviaCollector, c_family_token};
use crate::core::{Token, TokenType};

const TRIPLE_QUOTE: &str = "\"\"\"";

/// C-family lexemes, `"""raw strings"""`, `//` and nested `/* */` comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformerTokenizer;

impl Tokenizer for TransformerTokenizer {
    fn low_level_token(&self, text: &str, _previous: Option<TokenType>) -> LowLevelToken {
        if let Some(rest) = text.strip_prefix(TRIPLE_QUOTE) {
            let length = match rest.find(TRIPLE_QUOTE) {
                Some(end) => 2 * TRIPLE_QUOTE.len() + end,
                None => text.len(),
            };
            return LowLevelToken::new(TokenType::RawString, length);
        }
        c_family_token(text)
    }

    fn parse_trivia(&self, collector: &mut TriviaCollector<'_>) {
        let _ = collector.accept_whitespace()
            || collector.accept_line_comment("//")
            || collector.accept_block_comment("/*", "*/", true);
    }
}

/// Value of a string token.
///
/// Quoted strings support `\n`, `\t`, `\\` and escaped quotes. Raw strings
/// are taken verbatim, except that a leading newline is dropped, a trailing
/// whitespace-only line is dropped and the common indentation is removed.
pub fn string_value(token: &Token) -> String {
    match token.token_type() {
        TokenType::RawString => raw_value(token.text()),
        _ => quoted_value(token.text()),
    }
}

fn quoted_value(text: &str) -> String {
    let inner = match text.chars().next() {
        Some(q @ ('"' | '\'')) if text.len() >= 2 && text.ends_with(q) => &text[1..text.len() - 1],
        _ => text,
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn raw_value(text: &str) -> String {
    let inner = text.strip_prefix(TRIPLE_QUOTE).unwrap_or(text);
    let inner = inner.strip_suffix(TRIPLE_QUOTE).unwrap_or(inner);
    let inner = inner
        .strip_prefix("\r\n")
        .or_else(|| inner.strip_prefix('\n'))
        .unwrap_or(inner);
    let mut lines: Vec<&str> = inner.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    if lines.len() > 1 && lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}
