//! The tokenizer head: a cursor over the remaining input.

use super::collector::TriviaCollector;
use super::{LowLevelToken, Tokenizer};
use crate::core::node::Node;
use crate::core::token::{Token, TokenType};
use crate::core::trivia::Trivia;

/// Cursor over a source text that produces tokens on demand.
///
/// The head always knows the low-level classification of the next token and
/// has already collected its leading trivia. It is cheap to clone, which is how
/// parsers backtrack: parse on a clone and commit it only on success.
#[derive(Clone)]
pub struct TokenizerHead<'a> {
    text: &'a str,
    tokenizer: &'a dyn Tokenizer,
    /// Start of the pending leading trivia.
    offset: usize,
    /// Start of the current token text.
    token_start: usize,
    leading: Vec<Trivia>,
    current: LowLevelToken,
    previous: Option<TokenType>,
}

impl<'a> TokenizerHead<'a> {
    pub fn new(text: &'a str, tokenizer: &'a dyn Tokenizer) -> Self {
        let mut head = Self {
            text,
            tokenizer,
            offset: 0,
            token_start: 0,
            leading: Vec::new(),
            current: LowLevelToken::END,
            previous: None,
        };
        head.advance_to(0);
        head
    }

    fn collect_trivia(&self, from: usize, trailing: bool) -> (Vec<Trivia>, usize) {
        let mut collector = TriviaCollector::new(self.text, from, trailing);
        loop {
            let before = collector.position();
            self.tokenizer.parse_trivia(&mut collector);
            if collector.position() == before {
                break;
            }
        }
        collector.finish()
    }

    /// Collect leading trivia from `from` and classify the next token.
    fn advance_to(&mut self, from: usize) {
        let (leading, token_start) = self.collect_trivia(from, false);
        self.offset = from;
        self.leading = leading;
        self.token_start = token_start;
        self.current = self.classify();
    }

    fn classify(&self) -> LowLevelToken {
        let rest = &self.text[self.token_start..];
        if rest.is_empty() {
            return LowLevelToken::END;
        }
        let token = self.tokenizer.low_level_token(rest, self.previous);
        let first_char = rest.chars().next().map_or(1, char::len_utf8);
        let valid = token.token_type != TokenType::EndOfInput
            && token.length > 0
            && token.length <= rest.len()
            && rest.is_char_boundary(token.length);
        if valid {
            token
        } else {
            LowLevelToken::none(first_char)
        }
    }

    /// Whole input being tokenized.
    pub fn source(&self) -> &'a str {
        self.text
    }

    /// Byte offset of the next token including its leading trivia.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte offset of the next token text.
    pub fn token_offset(&self) -> usize {
        self.token_start
    }

    pub fn token_type(&self) -> TokenType {
        self.current.token_type
    }

    pub fn token_text(&self) -> &'a str {
        &self.text[self.token_start..self.token_start + self.current.length]
    }

    pub fn previous_token_type(&self) -> Option<TokenType> {
        self.previous
    }

    pub fn is_end_of_input(&self) -> bool {
        self.current.token_type == TokenType::EndOfInput
    }

    pub fn is_token(&self, token_type: TokenType) -> bool {
        self.current.token_type == token_type
    }

    /// Whether the next token is a non-string token with exactly this text.
    pub fn is_text(&self, text: &str) -> bool {
        !self.is_end_of_input() && self.token_type() != TokenType::String && self.token_text() == text
    }

    /// Text of the token after the next one, without consuming anything.
    pub fn peek_text(&self) -> Option<&'a str> {
        if self.is_end_of_input() {
            return None;
        }
        let mut clone = self.clone();
        clone.create_token();
        (!clone.is_end_of_input()).then(|| clone.token_text())
    }

    /// Consume the next token with its trivia.
    ///
    /// At end of input this returns the end-of-input token carrying the
    /// remaining trivia; the head then stays at end of input with no trivia.
    pub fn create_token(&mut self) -> Token {
        let token_type = self.current.token_type;
        self.create_token_as(token_type)
    }

    /// Consume the next token forcing its type (parser-side refinement).
    pub fn create_token_as(&mut self, token_type: TokenType) -> Token {
        let leading = std::mem::take(&mut self.leading);
        if self.is_end_of_input() {
            self.offset = self.text.len();
            return Token::new(TokenType::EndOfInput, "", leading, Vec::new());
        }
        let end = self.token_start + self.current.length;
        let text = &self.text[self.token_start..end];
        let (trailing, next) = self.collect_trivia(end, true);
        self.previous = Some(token_type);
        self.advance_to(next);
        Token::new(token_type, text, leading, trailing)
    }

    pub fn match_token(&mut self, token_type: TokenType) -> Option<Token> {
        self.is_token(token_type).then(|| self.create_token())
    }

    pub fn match_text(&mut self, text: &str) -> Option<Token> {
        self.is_text(text).then(|| self.create_token())
    }

    /// Consume the next token as an [`Unexpected`](crate::core::NodeBody::Unexpected)
    /// node. Returns `None` at end of input.
    pub fn create_unexpected(&mut self) -> Option<Node> {
        if self.is_end_of_input() {
            return None;
        }
        Some(Node::unexpected(self.create_token()))
    }

    /// A zero-width marker for an expected token that is not there.
    pub fn create_missing(&self, expected: TokenType) -> Node {
        Node::missing(expected)
    }
}
