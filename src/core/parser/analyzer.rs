use std::sync::Arc;

use super::CompositeParser;
use crate::base::{LineIndex, Span};
use crate::core::errors::InvariantError;
use crate::core::node::{Node, NodeError, NodeKind};
use crate::core::tokenizer::{Tokenizer, TokenizerHead};

/// Turns a text into a [`SourceCode`] tree with a language's tokenizer and
/// top-level parser.
#[derive(Clone)]
pub struct Analyzer {
    tokenizer: Arc<dyn Tokenizer>,
    parser: CompositeParser,
}

impl Analyzer {
    pub fn new(tokenizer: Arc<dyn Tokenizer>, parser: CompositeParser) -> Self {
        Self { tokenizer, parser }
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    pub fn parser(&self) -> &CompositeParser {
        &self.parser
    }

    /// Parse a whole text. Syntax errors are part of the returned tree; an
    /// error here means a parser broke a structural contract.
    pub fn analyze(&self, text: &str) -> Result<SourceCode, InvariantError> {
        let mut head = TokenizerHead::new(text, self.tokenizer.as_ref());
        let mut items = self.parser.parse_all(&mut head)?;
        items.push(Node::from_token(head.create_token()));
        let root = Node::collection(NodeKind::SourceCode, items)?;
        if root.text_len() != text.len() {
            return Err(InvariantError::LostText {
                length: text.len(),
                covered: root.text_len(),
            });
        }
        Ok(SourceCode { root })
    }
}

/// Root of an analyzed text: top-level nodes then the end-of-input token.
#[derive(Debug, Clone)]
pub struct SourceCode {
    root: Node,
}

impl SourceCode {
    /// Wrap an existing `SourceCode` node.
    pub fn from_root(root: Node) -> Option<Self> {
        (root.kind() == NodeKind::SourceCode).then_some(Self { root })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// Top-level nodes without the end-of-input token.
    pub fn nodes(&self) -> &[Node] {
        let items = self.root.items().unwrap_or_default();
        &items[..items.len().saturating_sub(1)]
    }

    pub fn text(&self) -> String {
        self.root.full_text()
    }

    pub fn has_errors(&self) -> bool {
        self.root.has_errors()
    }

    pub fn errors(&self) -> Vec<NodeError> {
        self.root.errors()
    }

    /// Errors with their line/column spans.
    pub fn located_errors(&self) -> Vec<(Span, NodeError)> {
        let errors = self.errors();
        if errors.is_empty() {
            return Vec::new();
        }
        let text = self.text();
        let index = LineIndex::new(&text);
        errors
            .into_iter()
            .map(|e| (index.span(e.range), e))
            .collect()
    }
}
