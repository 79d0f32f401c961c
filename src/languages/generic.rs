//! Generic C-family language: statements and `{ }` blocks.
//!
//! Statements end at `;`, right before a `}` or the end of input, or right
//! after a block unless the block is followed by `; , ) .` (as in
//! `x = { a: 1 };` or `f(function() { })`). Everything else is kept as plain
//! tokens, which is enough to locate and edit spans.

use std::sync::Arc;

use super::{LanguageSpanTypes, TransformLanguage};
use crate::core::tokenizer::{LowLevelToken, Tokenizer, TriviaCollector, c_family_token};
use crate::core::{
    Analyzer, CompositeParser, Node, NodeKind, ParseError, TokenError, TokenType, TokenizerHead,
};

/// `//` line comments and `/* */` block comments around C-family lexemes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFamilyTokenizer {
    pub nested_comments: bool,
}

impl CFamilyTokenizer {
    pub fn accept_comments(&self, collector: &mut TriviaCollector<'_>) -> bool {
        collector.accept_whitespace()
            || collector.accept_line_comment("//")
            || collector.accept_block_comment("/*", "*/", self.nested_comments)
    }
}

impl Tokenizer for CFamilyTokenizer {
    fn low_level_token(&self, text: &str, _previous: Option<TokenType>) -> LowLevelToken {
        c_family_token(text)
    }

    fn parse_trivia(&self, collector: &mut TriviaCollector<'_>) {
        self.accept_comments(collector);
    }
}

/// Tokens that keep a statement going after a block.
const BLOCK_CONTINUATIONS: &[TokenType] = &[
    TokenType::SemiColon,
    TokenType::Comma,
    TokenType::CloseParen,
    TokenType::Dot,
];

/// Parse one statement (or a bare block).
pub fn parse_statement(head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
    if head.is_end_of_input() || head.is_token(TokenType::CloseBrace) {
        return Err(TokenError::new(
            format!("statement cannot start with {}", head.token_type()),
            head.token_offset(),
        )
        .into());
    }
    let mut items = Vec::new();
    loop {
        if head.is_end_of_input() || head.is_token(TokenType::CloseBrace) {
            break;
        }
        if head.is_token(TokenType::OpenBrace) {
            items.push(parse_block(head)?);
            if !BLOCK_CONTINUATIONS.iter().any(|&t| head.is_token(t)) {
                break;
            }
            continue;
        }
        if head.token_type().is_error() {
            if let Some(unexpected) = head.create_unexpected() {
                let message = format!("Unexpected '{}'", unexpected.full_text().trim());
                items.push(Node::syntax_error(message, vec![unexpected])?);
            }
            continue;
        }
        let token = head.create_token();
        let end = token.token_type() == TokenType::SemiColon;
        items.push(Node::from_token(token));
        if end {
            break;
        }
    }
    if items.len() == 1 && items[0].kind() == NodeKind::Block {
        return Ok(items.remove(0));
    }
    Ok(Node::collection(NodeKind::Statement, items)?)
}

/// Parse `{ statements }`. A missing `}` becomes a syntax error in the close
/// slot.
pub fn parse_block(head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
    let Some(open) = head.match_token(TokenType::OpenBrace) else {
        return Err(TokenError::new("expected '{'", head.token_offset()).into());
    };
    let mut content = Vec::new();
    while !head.is_end_of_input() && !head.is_token(TokenType::CloseBrace) {
        content.push(parse_statement(head)?);
    }
    let close = match head.match_token(TokenType::CloseBrace) {
        Some(close) => Node::from_token(close),
        None => Node::syntax_error(
            "Missing '}'",
            vec![head.create_missing(TokenType::CloseBrace)],
        )?,
    };
    Ok(Node::composite(
        NodeKind::Block,
        vec![
            Some(Node::from_token(open)),
            Some(Node::collection(NodeKind::BlockContent, content)?),
            Some(close),
        ],
    )?)
}

/// Span types every C-family language understands.
pub const GENERIC_SPAN_TYPES: LanguageSpanTypes =
    &[("statement", NodeKind::Statement), ("block", NodeKind::Block)];

/// Fallback language for C-family text without a dedicated grammar.
pub struct GenericLanguage {
    analyzer: Analyzer,
}

impl GenericLanguage {
    pub fn new() -> Self {
        let parser = CompositeParser::new("generic").with(parse_statement);
        Self {
            analyzer: Analyzer::new(Arc::new(CFamilyTokenizer::default()), parser),
        }
    }
}

impl Default for GenericLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformLanguage for GenericLanguage {
    fn name(&self) -> &str {
        "generic"
    }

    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn span_types(&self) -> LanguageSpanTypes {
        GENERIC_SPAN_TYPES
    }
}
