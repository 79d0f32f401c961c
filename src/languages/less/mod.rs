//! Less stylesheets.
//!
//! Top-level `@import (options) 'path';` statements are parsed into
//! `ImportStatement` nodes; everything else uses the generic C-family
//! statements. The transformer language gains
//! `ensure import (options) 'a.less', 'b.less';` which merges imports (see
//! [`imports`]).

pub mod imports;

use std::sync::Arc;

use super::generic::{CFamilyTokenizer, parse_statement};
use super::{LanguageSpanTypes, TransformLanguage};
use crate::core::{
    Analyzer, CompositeParser, InvariantError, Node, NodeKind, ParseError, Parser, TokenError,
    TokenType, TokenizerHead,
};

pub use imports::{ImportKind, LessImport, LessImportOptions, Multiplicity, ensure_imports};

const LESS_SPAN_TYPES: LanguageSpanTypes = &[
    ("statement", NodeKind::Statement),
    ("block", NodeKind::Block),
    ("import", NodeKind::ImportStatement),
];

pub struct LessLanguage {
    analyzer: Analyzer,
}

impl LessLanguage {
    pub fn new() -> Self {
        let parser = CompositeParser::new("less")
            .with(parse_import_statement)
            .with(parse_statement);
        Self {
            analyzer: Analyzer::new(Arc::new(CFamilyTokenizer::default()), parser),
        }
    }
}

impl Default for LessLanguage {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformLanguage for LessLanguage {
    fn name(&self) -> &str {
        "less"
    }

    fn file_extensions(&self) -> &[&str] {
        &["less"]
    }

    fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn span_types(&self) -> LanguageSpanTypes {
        LESS_SPAN_TYPES
    }

    fn statement_parser(&self) -> Option<Arc<dyn Parser>> {
        Some(Arc::new(parse_ensure_imports))
    }

    fn apply_statement(
        &self,
        statement: &Node,
        root: &Node,
        newline: &str,
    ) -> Option<Result<Node, InvariantError>> {
        if statement.kind() != NodeKind::EnsureImports {
            return None;
        }
        let requested = LessImport::from_ensure(statement);
        Some(ensure_imports(root, &requested, newline))
    }
}

fn declined(head: &TokenizerHead<'_>, expected: &str) -> ParseError {
    TokenError::new(format!("expected {expected}"), head.token_offset()).into()
}

/// `( identifier {, identifier} )`
fn parse_import_options(head: &mut TokenizerHead<'_>) -> Result<Option<Node>, ParseError> {
    let Some(open) = head.match_token(TokenType::OpenParen) else {
        return Ok(None);
    };
    let mut list = Vec::new();
    while head.is_token(TokenType::Identifier) || head.is_token(TokenType::Comma) {
        list.push(Node::from_token(head.create_token()));
    }
    let Some(close) = head.match_token(TokenType::CloseParen) else {
        return Err(declined(head, "')'"));
    };
    Ok(Some(Node::composite(
        NodeKind::ImportOptions,
        vec![
            Some(Node::from_token(open)),
            Some(Node::collection(NodeKind::ImportOptionList, list)?),
            Some(Node::from_token(close)),
        ],
    )?))
}

/// `@import [(options)] 'path';`. Other `@import` forms (`url(...)`, media
/// queries) are left to the generic statement parser.
pub fn parse_import_statement(head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
    if !(head.is_token(TokenType::AtKeyword) && head.token_text() == "@import") {
        return Err(declined(head, "@import"));
    }
    let import = head.create_token();
    let options = parse_import_options(head)?;
    let Some(path) = head.match_token(TokenType::String) else {
        return Err(declined(head, "import path"));
    };
    let Some(semicolon) = head.match_token(TokenType::SemiColon) else {
        return Err(declined(head, "';'"));
    };
    Ok(Node::composite(
        NodeKind::ImportStatement,
        vec![
            Some(Node::from_token(import)),
            options,
            Some(Node::from_token(path)),
            Some(Node::from_token(semicolon)),
        ],
    )?)
}

/// `ensure import [(options)] 'path' {, [(options)] 'path'} ;` in a
/// transformer body.
pub fn parse_ensure_imports(head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
    let Some(ensure) = head.match_text("ensure") else {
        return Err(declined(head, "ensure"));
    };
    let import = match head.match_text("import").or_else(|| head.match_text("@import")) {
        Some(import) => Node::from_token(import),
        None => return Err(declined(head, "import")),
    };
    let mut specs = Vec::new();
    loop {
        let options = parse_import_options(head)?;
        let Some(path) = head.match_token(TokenType::String) else {
            return Err(declined(head, "import path"));
        };
        let comma = head.match_token(TokenType::Comma).map(Node::from_token);
        let more = comma.is_some();
        specs.push(Node::composite(
            NodeKind::ImportSpec,
            vec![options, Some(Node::from_token(path)), comma],
        )?);
        if !more {
            break;
        }
    }
    let semicolon = match head.match_token(TokenType::SemiColon) {
        Some(semicolon) => Node::from_token(semicolon),
        None => Node::syntax_error(
            "Missing ';'",
            vec![head.create_missing(TokenType::SemiColon)],
        )?,
    };
    Ok(Node::composite(
        NodeKind::EnsureImports,
        vec![
            Some(Node::from_token(ensure)),
            Some(import),
            Some(Node::collection(NodeKind::ImportList, specs)?),
            Some(semicolon),
        ],
    )?)
}
