//! Tokenizer layer
//!
//! A language provides a [`Tokenizer`]: a low-level classifier that looks at
//! the head of the remaining input and returns a [`LowLevelToken`] (type and
//! length, no allocation), plus a trivia hook that recognizes whitespace and
//! comments. The [`TokenizerHead`] drives both and builds [`Token`]s with
//! their leading and trailing trivia.
//!
//! [`Token`]: super::Token

mod collector;
mod head;
mod lexer;

pub use collector::TriviaCollector;
pub use head::TokenizerHead;
pub use lexer::{Lexeme, c_family_token, identifier_length};

use super::token::{Token, TokenType};

/// Result of the low-level classification of the head of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowLevelToken {
    pub token_type: TokenType,
    /// Length in bytes.
    pub length: usize,
}

impl LowLevelToken {
    pub const END: LowLevelToken = LowLevelToken {
        token_type: TokenType::EndOfInput,
        length: 0,
    };

    pub const fn new(token_type: TokenType, length: usize) -> Self {
        Self { token_type, length }
    }

    /// An unrecognized run of `length` bytes.
    pub const fn none(length: usize) -> Self {
        Self::new(TokenType::None, length)
    }
}

/// Language-specific lexical rules.
///
/// Implementations must be stateless: the same tokenizer is shared by every
/// parse of the language, possibly from several threads.
pub trait Tokenizer: Send + Sync {
    /// Classify the token that starts `text` (never empty, never starts with
    /// trivia). `previous` is the type of the last token created, which makes
    /// context-sensitive decisions explicit.
    fn low_level_token(&self, text: &str, previous: Option<TokenType>) -> LowLevelToken;

    /// Accept trivia at the collector's position. Called repeatedly until it
    /// makes no progress.
    fn parse_trivia(&self, collector: &mut TriviaCollector<'_>);
}

/// All tokens of `text`, end-of-input excluded.
pub fn tokenize(tokenizer: &dyn Tokenizer, text: &str) -> Vec<Token> {
    let mut head = TokenizerHead::new(text, tokenizer);
    let mut tokens = Vec::new();
    while !head.is_end_of_input() {
        tokens.push(head.create_token());
    }
    tokens
}
