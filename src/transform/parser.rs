//! Parser of the transformer language.
//!
//! ```text
//! create [language] transformer [name] [on "target"]
//! begin
//!     inject "..." into <Marker/>;
//!     inject "..." before|after [cardinality] [{type}][.language] "pattern";
//!     replace [cardinality] [{type}][.language] "pattern" with "...";
//!     in [cardinality] [{type}][.language] "pattern" begin ... end
//! end
//! ```
//!
//! Statements the core does not know are handed to the language named in the
//! header, else to the language of the source (`theme.less.t`). Missing
//! pieces become syntax errors in the tree; only a text that does not start
//! with `create` is declined.

use std::sync::Arc;

use smol_str::SmolStr;

use super::tokenizer::TransformerTokenizer;
use crate::core::{
    Analyzer, CompositeParser, InvariantError, Node, NodeKind, ParseError, Parser, TokenError,
    TokenType, TokenizerHead,
};
use crate::languages::LanguageRegistry;

const STRINGS: &[TokenType] = &[TokenType::String, TokenType::RawString];
const CARDINALITIES: &[&str] = &["single", "first", "last", "all", "each"];

/// Builds the analyzer of transformer sources.
pub fn transformer_analyzer(registry: Arc<LanguageRegistry>) -> Analyzer {
    transformer_analyzer_for(registry, None)
}

/// Analyzer of transformer sources whose functions default to `language`
/// when their header names none.
pub fn transformer_analyzer_for(
    registry: Arc<LanguageRegistry>,
    language: Option<SmolStr>,
) -> Analyzer {
    let parser = CompositeParser::new("transformer").with(FunctionParser { registry, language });
    Analyzer::new(Arc::new(TransformerTokenizer), parser)
}

/// Parses `create ... transformer ... begin ... end`.
struct FunctionParser {
    registry: Arc<LanguageRegistry>,
    language: Option<SmolStr>,
}

impl Parser for FunctionParser {
    fn parse(&self, head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
        let Some(create) = head.match_text("create") else {
            return Err(TokenError::new("expected 'create'", head.token_offset()).into());
        };
        let language = if head.is_token(TokenType::Identifier) && !head.is_text("transformer") {
            Some(head.create_token())
        } else {
            None
        };
        let transformer = expect_keyword(head, "transformer")?;
        let name = (head.is_token(TokenType::Identifier)
            && !head.is_text("on")
            && !head.is_text("begin"))
        .then(|| Node::from_token(head.create_token()));
        let on = head.match_text("on").map(Node::from_token);
        let target = match on {
            Some(_) => Some(expect_string(head)?),
            None => None,
        };
        let statements = self.statement_parser(language.as_ref().map(|t| t.text()));
        let body = statements.parse_block(head)?;
        Ok(Node::composite(
            NodeKind::TransformerFunction,
            vec![
                Some(Node::from_token(create)),
                language.map(Node::from_token),
                Some(transformer),
                name,
                on,
                target,
                Some(body),
            ],
        )?)
    }
}

impl FunctionParser {
    fn statement_parser(&self, language: Option<&str>) -> StatementParser {
        StatementParser {
            extension: language
                .or(self.language.as_deref())
                .and_then(|name| self.registry.get(name))
                .and_then(|l| l.statement_parser()),
        }
    }
}

/// Statements of one function body.
struct StatementParser {
    extension: Option<Arc<dyn Parser>>,
}

impl StatementParser {
    /// `begin statement* end`
    fn parse_block(&self, head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
        let begin = expect_keyword(head, "begin")?;
        let mut statements = Vec::new();
        while !head.is_end_of_input() && !head.is_text("end") {
            statements.push(self.parse_statement(head)?);
        }
        let end = expect_keyword(head, "end")?;
        Node::composite(
            NodeKind::StatementBlock,
            vec![
                Some(begin),
                Some(Node::collection(NodeKind::StatementList, statements)?),
                Some(end),
            ],
        )
    }

    fn parse_statement(&self, head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
        if head.is_text("inject") {
            return parse_inject(head);
        }
        if head.is_text("replace") {
            return parse_replace(head);
        }
        if head.is_text("in") {
            return self.parse_in(head);
        }
        if let Some(extension) = &self.extension {
            let mut attempt = head.clone();
            match extension.parse(&mut attempt) {
                Ok(node) if attempt.offset() > head.offset() => {
                    *head = attempt;
                    return Ok(node);
                }
                Ok(_) | Err(ParseError::Unrecognized(_)) => {}
                Err(ParseError::Invariant(e)) => return Err(e),
            }
        }
        skip_statement(head)
    }

    fn parse_in(&self, head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
        let keyword = expect_keyword(head, "in")?;
        let location = parse_location(head)?;
        let body = self.parse_block(head)?;
        Node::composite(
            NodeKind::InScope,
            vec![Some(keyword), Some(location), Some(body)],
        )
    }
}

fn missing(head: &TokenizerHead<'_>, what: &str, token_type: TokenType) -> Result<Node, InvariantError> {
    Node::syntax_error(
        format!("Missing {what}"),
        vec![head.create_missing(token_type)],
    )
}

fn expect_keyword(head: &mut TokenizerHead<'_>, word: &str) -> Result<Node, InvariantError> {
    match head.match_text(word) {
        Some(token) => Ok(Node::from_token(token)),
        None => missing(head, &format!("'{word}'"), TokenType::Identifier),
    }
}

fn expect_token(head: &mut TokenizerHead<'_>, token_type: TokenType) -> Result<Node, InvariantError> {
    match head.match_token(token_type) {
        Some(token) => Ok(Node::from_token(token)),
        None => missing(head, token_type.describe(), token_type),
    }
}

fn expect_string(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    if STRINGS.iter().any(|&t| head.is_token(t)) {
        return Ok(Node::from_token(head.create_token()));
    }
    missing(head, "string", TokenType::String)
}

/// Unknown statement: everything up to the next `;` (included) or `end`.
fn skip_statement(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    let mut skipped = Vec::new();
    let first = head.token_text().to_string();
    while !head.is_end_of_input() && !head.is_text("end") {
        let semicolon = head.is_token(TokenType::SemiColon);
        if let Some(unexpected) = head.create_unexpected() {
            skipped.push(unexpected);
        }
        if semicolon {
            break;
        }
    }
    if skipped.is_empty() {
        return missing(head, "statement", TokenType::Identifier);
    }
    Node::syntax_error(format!("Unexpected '{first}'"), skipped)
}

fn parse_inject(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    let inject = expect_keyword(head, "inject")?;
    let content = expect_string(head)?;
    if head.is_text("into") {
        let into = expect_keyword(head, "into")?;
        let point = parse_injection_point(head)?;
        let semicolon = expect_token(head, TokenType::SemiColon)?;
        return Node::composite(
            NodeKind::InjectInto,
            vec![
                Some(inject),
                Some(content),
                Some(into),
                Some(point),
                Some(semicolon),
            ],
        );
    }
    let position = match head.match_text("before").or_else(|| head.match_text("after")) {
        Some(token) => Node::from_token(token),
        None => missing(head, "'before', 'after' or 'into'", TokenType::Identifier)?,
    };
    let location = parse_location(head)?;
    let semicolon = expect_token(head, TokenType::SemiColon)?;
    Node::composite(
        NodeKind::InjectAround,
        vec![
            Some(inject),
            Some(content),
            Some(position),
            Some(location),
            Some(semicolon),
        ],
    )
}

/// `<Name/>` or `<Name>`
fn parse_injection_point(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    let open = expect_token(head, TokenType::Less)?;
    let name = expect_token(head, TokenType::Identifier)?;
    let slash = head.match_token(TokenType::Slash).map(Node::from_token);
    let close = expect_token(head, TokenType::Greater)?;
    Node::composite(
        NodeKind::InjectionPoint,
        vec![Some(open), Some(name), slash, Some(close)],
    )
}

fn parse_replace(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    let replace = expect_keyword(head, "replace")?;
    let location = parse_location(head)?;
    let with = expect_keyword(head, "with")?;
    let content = expect_string(head)?;
    let semicolon = expect_token(head, TokenType::SemiColon)?;
    Node::composite(
        NodeKind::Replace,
        vec![
            Some(replace),
            Some(location),
            Some(with),
            Some(content),
            Some(semicolon),
        ],
    )
}

/// `[cardinality] [{type}] [.language] "pattern"`
fn parse_location(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    let cardinality = if CARDINALITIES.iter().any(|c| head.is_text(c)) {
        Some(parse_cardinality(head)?)
    } else {
        None
    };
    let matcher = parse_span_matcher(head)?;
    Node::composite(NodeKind::Location, vec![cardinality, Some(matcher)])
}

fn parse_cardinality(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    let keyword = head.create_token();
    let (sign, offset, out, of, count) = match keyword.text() {
        "first" | "last" => {
            let sign_type = if keyword.text() == "first" {
                TokenType::Plus
            } else {
                TokenType::Minus
            };
            let sign = head.match_token(sign_type).map(Node::from_token);
            let offset = match sign {
                Some(_) => Some(expect_token(head, TokenType::Number)?),
                None => None,
            };
            let out = head.match_text("out").map(Node::from_token);
            let (of, count) = match out {
                Some(_) => (
                    Some(expect_keyword(head, "of")?),
                    Some(expect_token(head, TokenType::Number)?),
                ),
                None => (None, None),
            };
            (sign, offset, out, of, count)
        }
        "all" | "each" => {
            let count = head.match_token(TokenType::Number).map(Node::from_token);
            (None, None, None, None, count)
        }
        _ => (None, None, None, None, None),
    };
    Node::composite(
        NodeKind::Cardinality,
        vec![Some(Node::from_token(keyword)), sign, offset, out, of, count],
    )
}

fn parse_span_matcher(head: &mut TokenizerHead<'_>) -> Result<Node, InvariantError> {
    let (open, span_type, close) = match head.match_token(TokenType::OpenBrace) {
        Some(open) => (
            Some(Node::from_token(open)),
            Some(expect_token(head, TokenType::Identifier)?),
            Some(expect_token(head, TokenType::CloseBrace)?),
        ),
        None => (None, None, None),
    };
    let (dot, language) = match head.match_token(TokenType::Dot) {
        Some(dot) => (
            Some(Node::from_token(dot)),
            Some(expect_token(head, TokenType::Identifier)?),
        ),
        None => (None, None),
    };
    let pattern = expect_string(head)?;
    Node::composite(
        NodeKind::SpanMatcher,
        vec![open, span_type, close, dot, language, Some(pattern)],
    )
}
