//! TypeScript / JavaScript.
//!
//! The C-family lexemes are refined with two context-sensitive literals:
//! regular expressions (a `/` where an operand is expected, decided from the
//! previous token) and template strings.

use std::sync::Arc;

use super::generic::{CFamilyTokenizer, GENERIC_SPAN_TYPES, parse_statement};
use super::{LanguageSpanTypes, TransformLanguage};
use crate::core::tokenizer::{LowLevelToken, Tokenizer, TriviaCollector, c_family_token};
use crate::core::{Analyzer, CompositeParser, TokenType};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptTokenizer {
    comments: CFamilyTokenizer,
}

/// Whether a `/` after `previous` starts a regular expression rather than a
/// division.
pub fn regex_allowed(previous: Option<TokenType>) -> bool {
    match previous {
        None => true,
        Some(t) => !matches!(
            t,
            TokenType::Identifier
                | TokenType::Number
                | TokenType::String
                | TokenType::RawString
                | TokenType::RegularExpression
                | TokenType::CloseParen
                | TokenType::CloseBracket
                | TokenType::CloseBrace
                | TokenType::PlusPlus
                | TokenType::MinusMinus
        ),
    }
}

/// Length of the regular expression literal starting `text` (`/.../flags`),
/// or `None` when the line ends before the closing slash.
fn regex_length(text: &str) -> Option<usize> {
    let mut in_class = false;
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            '\n' | '\r' => return None,
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let flags: usize = text[i + 1..]
                    .chars()
                    .take_while(|c| c.is_ascii_alphabetic())
                    .map(char::len_utf8)
                    .sum();
                return Some(i + 1 + flags);
            }
            _ => {}
        }
    }
    None
}

/// Length of the template string starting `text`; unterminated templates run
/// to the end of the input.
fn template_length(text: &str) -> usize {
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '`' => return i + 1,
            _ => {}
        }
    }
    text.len()
}

impl Tokenizer for TypeScriptTokenizer {
    fn low_level_token(&self, text: &str, previous: Option<TokenType>) -> LowLevelToken {
        if text.starts_with('/') && regex_allowed(previous) {
            if let Some(length) = regex_length(text) {
                return LowLevelToken::new(TokenType::RegularExpression, length);
            }
        }
        if text.starts_with('`') {
            return LowLevelToken::new(TokenType::String, template_length(text));
        }
        c_family_token(text)
    }

    fn parse_trivia(&self, collector: &mut TriviaCollector<'_>) {
        self.comments.accept_comments(collector);
    }
}

pub struct TypeScriptLanguage {
    analyzer: Analyzer,
}

impl TypeScriptLanguage {
    pub fn new() -> Self {
        let parser = CompositeParser::new("typescript").with(parse_statement);
        Self {
            analyzer: Analyzer::new(Arc::new(TypeScriptTokenizer::default()), parser),
        }
    }
}

impl Default for TypeScriptLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformLanguage for TypeScriptLanguage {
    fn name(&self) -> &str {
        "typescript"
    }

    fn file_extensions(&self) -> &[&str] {
        &["ts", "tsx", "js"]
    }

    fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn span_types(&self) -> LanguageSpanTypes {
        GENERIC_SPAN_TYPES
    }
}
