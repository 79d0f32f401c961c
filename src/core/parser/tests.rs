use std::sync::Arc;

use super::*;
use crate::core::errors::{InvariantError, ParseError, TokenError};
use crate::core::node::{Node, NodeKind};
use crate::core::token::{Token, TokenType};
use crate::core::tokenizer::{LowLevelToken, Tokenizer, TriviaCollector, c_family_token};

struct TestTokenizer;

impl Tokenizer for TestTokenizer {
    fn low_level_token(&self, text: &str, _previous: Option<TokenType>) -> LowLevelToken {
        c_family_token(text)
    }

    fn parse_trivia(&self, collector: &mut TriviaCollector<'_>) {
        let _ = collector.accept_whitespace() || collector.accept_line_comment("//");
    }
}

/// `identifier+ ;`
fn statement(head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
    if !head.is_token(TokenType::Identifier) {
        return Err(TokenError::new("expected identifier", head.token_offset()).into());
    }
    let mut items = Vec::new();
    while let Some(token) = head.match_token(TokenType::Identifier) {
        items.push(Node::from_token(token));
    }
    match head.match_token(TokenType::SemiColon) {
        Some(semi) => items.push(Node::from_token(semi)),
        None => {
            let missing = head.create_missing(TokenType::SemiColon);
            items.push(Node::syntax_error("Missing ';'", vec![missing])?);
        }
    }
    Ok(Node::collection(NodeKind::Statement, items)?)
}

fn analyzer(parser: CompositeParser) -> Analyzer {
    Analyzer::new(Arc::new(TestTokenizer), parser)
}

#[test]
fn test_analyze_round_trip() {
    let analyzer = analyzer(CompositeParser::new("test").with(statement));
    let text = "  a b;\n// c\nd ;  \n";
    let source = analyzer.analyze(text).unwrap();
    assert_eq!(source.text(), text);
    assert_eq!(source.nodes().len(), 2);
    assert!(!source.has_errors());
    let last = source.root().items().unwrap().last().unwrap().clone();
    assert!(last.token().unwrap().is_end_of_input());
}

#[test]
fn test_empty_text() {
    let analyzer = analyzer(CompositeParser::new("test").with(statement));
    let source = analyzer.analyze("").unwrap();
    assert!(source.nodes().is_empty());
    assert_eq!(source.root().width(), 1);
}

#[test]
fn test_unrecognized_tokens_are_grouped() {
    let analyzer = analyzer(CompositeParser::new("test").with(statement));
    let source = analyzer.analyze("a; 1 2 b;").unwrap();
    assert_eq!(source.nodes().len(), 3);
    let error = &source.nodes()[1];
    assert_eq!(error.kind(), NodeKind::SyntaxError);
    assert_eq!(error.width(), 2);
    let errors = source.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Unexpected '1'");
    assert_eq!(u32::from(errors[0].range.start()), 3);
}

#[test]
fn test_missing_token_error_location() {
    let analyzer = analyzer(CompositeParser::new("test").with(statement));
    let source = analyzer.analyze("a\nb").unwrap();
    let located = source.located_errors();
    assert_eq!(located.len(), 1);
    assert_eq!(located[0].1.message, "Missing ';'");
    assert_eq!(source.text(), "a\nb");
}

#[test]
fn test_parsers_are_tried_in_order() {
    let numbers = |head: &mut TokenizerHead<'_>| -> Result<Node, ParseError> {
        match head.match_token(TokenType::Number) {
            Some(t) => Ok(Node::collection(NodeKind::Statement, vec![Node::from_token(t)])?),
            None => Err(TokenError::new("expected number", head.token_offset()).into()),
        }
    };
    let parser = CompositeParser::new("test").with(statement).with(numbers);
    assert!(!parser.is_transparent());
    let source = analyzer(parser).analyze("1 a; 2").unwrap();
    assert_eq!(source.nodes().len(), 3);
    assert!(!source.has_errors());
}

#[test]
fn test_no_progress_is_an_invariant_error() {
    let lazy = |_: &mut TokenizerHead<'_>| -> Result<Node, ParseError> {
        Ok(Node::from_token(Token::bare(TokenType::Identifier, "x")))
    };
    let err = analyzer(CompositeParser::new("lazy").with(lazy))
        .analyze("a")
        .unwrap_err();
    assert!(matches!(err, InvariantError::NoProgress { .. }));
}

#[test]
fn test_missing_node_is_not_a_top_level_node() {
    let bad = |head: &mut TokenizerHead<'_>| -> Result<Node, ParseError> {
        head.create_token();
        Ok(Node::missing(TokenType::SemiColon))
    };
    let err = analyzer(CompositeParser::new("bad").with(bad))
        .analyze("a")
        .unwrap_err();
    assert_eq!(
        err,
        InvariantError::InvalidTopLevel {
            parser: "bad".into(),
            found: NodeKind::MissingToken
        }
    );
}

#[test]
fn test_transparent_mode_checks_length() {
    // Drops the trailing trivia of the token it consumed.
    let lossy = |head: &mut TokenizerHead<'_>| -> Result<Node, ParseError> {
        let token = head.create_token();
        let bare = Token::bare(token.token_type(), token.text());
        Ok(Node::collection(NodeKind::Statement, vec![Node::from_token(bare)])?)
    };
    let err = analyzer(CompositeParser::new("lossy").with(lossy))
        .analyze("a b")
        .unwrap_err();
    assert_eq!(
        err,
        InvariantError::LengthMismatch {
            parser: "lossy".into(),
            consumed: 2,
            covered: 1
        }
    );
}

#[test]
fn test_composite_parser_as_parser() {
    let inner = CompositeParser::new("inner").with(statement);
    let mut head = TokenizerHead::new("1", &TestTokenizer);
    let err = inner.parse(&mut head).unwrap_err();
    assert!(matches!(err, ParseError::Unrecognized(_)));
    assert_eq!(head.offset(), 0);
}
