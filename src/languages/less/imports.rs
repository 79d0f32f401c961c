//! Merging of Less `@import` statements.
//!
//! `ensure import` requests a list of imports. The requested block is placed
//! where the first existing import stands (or before the first node when
//! there is none), existing imports of the requested paths are removed, and
//! the options of both are reconciled:
//!
//! - `less`/`css`/`inline` and `once`/`multiple` are exclusive: the rightmost
//!   word of a list wins, and a requested value overrides the existing one
//! - `reference` and `optional` are unioned
//!
//! An import whose merged options are unchanged is kept as is, so applying
//! the same request twice is a no-op.

use smol_str::SmolStr;

use crate::core::{
    CollectionMutator, InvariantError, Node, NodeKind, Token, TokenType, Trivia, TriviaKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Less,
    Css,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    Once,
    Multiple,
}

/// Options of an import, by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessImportOptions {
    pub kind: Option<ImportKind>,
    pub multiplicity: Option<Multiplicity>,
    pub reference: bool,
    pub optional: bool,
    /// Unknown words, kept in order.
    pub others: Vec<SmolStr>,
}

impl LessImportOptions {
    pub fn parse<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut options = Self::default();
        for word in words {
            match word {
                "less" => options.kind = Some(ImportKind::Less),
                "css" => options.kind = Some(ImportKind::Css),
                "inline" => options.kind = Some(ImportKind::Inline),
                "once" => options.multiplicity = Some(Multiplicity::Once),
                "multiple" => options.multiplicity = Some(Multiplicity::Multiple),
                "reference" => options.reference = true,
                "optional" => options.optional = true,
                other => {
                    if !options.others.iter().any(|o| o == other) {
                        options.others.push(SmolStr::new(other));
                    }
                }
            }
        }
        options
    }

    /// Options of an `ImportOptions` node.
    pub fn from_node(node: Option<&Node>) -> Self {
        let Some(list) = node.and_then(|n| n.named_slot("list")) else {
            return Self::default();
        };
        Self::parse(
            list.children()
                .filter_map(Node::token)
                .filter(|t| t.token_type() == TokenType::Identifier)
                .map(Token::text),
        )
    }

    /// `self` updated by a requested set of options.
    pub fn merge(&self, requested: &Self) -> Self {
        let mut others = self.others.clone();
        for word in &requested.others {
            if !others.contains(word) {
                others.push(word.clone());
            }
        }
        Self {
            kind: requested.kind.or(self.kind),
            multiplicity: requested.multiplicity.or(self.multiplicity),
            reference: self.reference || requested.reference,
            optional: self.optional || requested.optional,
            others,
        }
    }

    pub fn words(&self) -> Vec<&str> {
        let mut words = Vec::new();
        if self.reference {
            words.push("reference");
        }
        if self.optional {
            words.push("optional");
        }
        match self.kind {
            Some(ImportKind::Less) => words.push("less"),
            Some(ImportKind::Css) => words.push("css"),
            Some(ImportKind::Inline) => words.push("inline"),
            None => {}
        }
        match self.multiplicity {
            Some(Multiplicity::Once) => words.push("once"),
            Some(Multiplicity::Multiple) => words.push("multiple"),
            None => {}
        }
        words.extend(self.others.iter().map(SmolStr::as_str));
        words
    }

    pub fn is_empty(&self) -> bool {
        self.words().is_empty()
    }
}

/// A requested or existing import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessImport {
    /// Path without quotes.
    pub path: SmolStr,
    pub options: LessImportOptions,
}

impl LessImport {
    pub fn new(path: impl Into<SmolStr>, options: LessImportOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    /// Import of an `ImportStatement` node.
    pub fn from_statement(node: &Node) -> Option<Self> {
        if node.kind() != NodeKind::ImportStatement {
            return None;
        }
        let path = node.named_slot("path")?.token()?;
        Some(Self::new(
            unquote(path.text()),
            LessImportOptions::from_node(node.named_slot("options")),
        ))
    }

    /// Imports requested by an `EnsureImports` node. A path requested twice
    /// keeps its first position and merged options.
    pub fn from_ensure(node: &Node) -> Vec<Self> {
        let mut imports: Vec<Self> = Vec::new();
        let Some(list) = node.named_slot("imports") else {
            return imports;
        };
        for spec in list.children().filter(|n| n.kind() == NodeKind::ImportSpec) {
            let Some(path) = spec.named_slot("path").and_then(Node::token) else {
                continue;
            };
            let import = Self::new(
                unquote(path.text()),
                LessImportOptions::from_node(spec.named_slot("options")),
            );
            match imports.iter_mut().find(|i| i.path == import.path) {
                Some(previous) => previous.options = previous.options.merge(&import.options),
                None => imports.push(import),
            }
        }
        imports
    }
}

fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('\'' | '"')), Some(close)) if open == close && text.len() >= 2 => {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}

fn quote_of(node: &Node) -> Option<char> {
    node.named_slot("path")?.token()?.text().chars().next()
}

/// Build `@import (options) 'path';` followed by a newline.
fn build_import(
    import: &LessImport,
    quote: char,
    newline: &str,
) -> Result<Node, InvariantError> {
    let space = || vec![Trivia::whitespace(" ")];
    let keyword = Token::new(TokenType::AtKeyword, "@import", Vec::new(), space());
    let options = match import.options.words() {
        words if words.is_empty() => None,
        words => {
            let mut list = Vec::new();
            for (i, word) in words.iter().enumerate() {
                if i > 0 {
                    list.push(Node::from_token(Token::new(
                        TokenType::Comma,
                        ",",
                        Vec::new(),
                        space(),
                    )));
                }
                list.push(Node::from_token(Token::bare(TokenType::Identifier, *word)));
            }
            Some(Node::composite(
                NodeKind::ImportOptions,
                vec![
                    Some(Node::from_token(Token::bare(TokenType::OpenParen, "("))),
                    Some(Node::collection(NodeKind::ImportOptionList, list)?),
                    Some(Node::from_token(Token::new(
                        TokenType::CloseParen,
                        ")",
                        Vec::new(),
                        space(),
                    ))),
                ],
            )?)
        }
    };
    let path = format!("{quote}{}{quote}", import.path);
    let semicolon = Token::new(
        TokenType::SemiColon,
        ";",
        Vec::new(),
        vec![Trivia::whitespace(newline)],
    );
    Node::composite(
        NodeKind::ImportStatement,
        vec![
            Some(Node::from_token(keyword)),
            options,
            Some(Node::from_token(Token::bare(TokenType::String, path))),
            Some(Node::from_token(semicolon)),
        ],
    )
}

/// Make a block member end its line. Comments on the line are kept.
fn end_line(node: &Node, newline: &str) -> Result<Node, InvariantError> {
    let Some(trailing) = node.last_token().map(Token::trailing_trivia) else {
        return Ok(node.clone());
    };
    if trailing.iter().any(|t| t.text().contains('\n')) {
        return Ok(node.clone());
    }
    let mut trivia = trailing.to_vec();
    while trivia.last().is_some_and(|t| t.kind() == TriviaKind::Whitespace) {
        trivia.pop();
    }
    trivia.push(Trivia::whitespace(newline));
    node.with_trailing_trivia(trivia)
}

/// Merge `requested` imports into the top level of a Less tree.
pub fn ensure_imports(
    root: &Node,
    requested: &[LessImport],
    newline: &str,
) -> Result<Node, InvariantError> {
    let Some(items) = root.items() else {
        return Ok(root.clone());
    };
    if requested.is_empty() || items.is_empty() {
        return Ok(root.clone());
    }
    let existing: Vec<(usize, LessImport)> = items
        .iter()
        .enumerate()
        .filter_map(|(i, n)| LessImport::from_statement(n).map(|imp| (i, imp)))
        .collect();
    let is_requested = |path: &str| requested.iter().any(|r| r.path == path);

    let anchor_index = existing.first().map_or(0, |(i, _)| *i);
    let anchor = &items[anchor_index];
    let anchor_kept = existing.first().is_none_or(|(_, imp)| !is_requested(&imp.path));
    let leading = anchor
        .first_token()
        .map(|t| t.leading_trivia().to_vec())
        .unwrap_or_default();
    let default_quote = existing
        .first()
        .and_then(|(i, _)| quote_of(&items[*i]))
        .unwrap_or('\'');

    let mut block = Vec::with_capacity(requested.len());
    for (position, request) in requested.iter().enumerate() {
        let current = existing.iter().find(|(_, imp)| imp.path == request.path);
        let node = match current {
            Some((i, imp)) => {
                let merged = imp.options.merge(&request.options);
                if merged == imp.options {
                    items[*i].clone()
                } else {
                    let quote = quote_of(&items[*i]).unwrap_or(default_quote);
                    build_import(&LessImport::new(request.path.clone(), merged), quote, newline)?
                }
            }
            None => build_import(request, default_quote, newline)?,
        };
        let node = if position == 0 {
            node.with_leading_trivia(leading.clone())?
        } else if node.ptr_eq(anchor) {
            node.with_leading_trivia(Vec::new())?
        } else {
            node
        };
        let node = if position + 1 < requested.len() {
            end_line(&node, newline)?
        } else {
            node
        };
        block.push(node);
    }

    let Some(mut mutator) = CollectionMutator::new(root) else {
        return Ok(root.clone());
    };
    let raw = mutator.raw_items();
    let old = std::mem::take(raw);
    for (i, item) in old.into_iter().enumerate() {
        if i == anchor_index {
            raw.append(&mut block);
            if anchor_kept {
                let trivia = if existing.is_empty() {
                    vec![Trivia::whitespace(newline)]
                } else {
                    Vec::new()
                };
                raw.push(item.with_leading_trivia(trivia)?);
            }
            continue;
        }
        let replaced = LessImport::from_statement(&item).is_some_and(|imp| is_requested(&imp.path));
        if !replaced {
            raw.push(item);
        }
    }
    mutator.clone_node()
}
