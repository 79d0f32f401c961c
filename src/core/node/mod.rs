//! Immutable node tree
//!
//! A [`Node`] is a cheap handle (`Arc`) on immutable node data. The node body
//! is a closed sum type:
//!
//! ```text
//! Token(Token)                  leaf, width 1
//! Collection(Vec<Node>)         variable arity (statement lists...)
//! Composite(Vec<Option<Node>>)  fixed, named slots (see NodeKind::schema)
//! Missing(TokenType)            error-tolerant marker, width 0
//! Unexpected(Token)             error-tolerant leaf, width 1
//! SyntaxError { message, .. }   error-tolerant container
//! ```
//!
//! Every constructor validates the kind's invariants, and editing goes through
//! the mutators of [`mutator`] which build new nodes: a node that can be
//! observed is always structurally valid.

mod invariants;
mod kind;
pub mod mutator;

pub use kind::{NodeKind, Rule, Schema, Slot};
pub use mutator::{CollectionMutator, CompositeMutator, NodeMutator, replace_descendant};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::errors::InvariantError;
use super::token::{Token, TokenType};
use super::trivia::Trivia;

/// Stable identity of a node, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Body of a node.
#[derive(Debug)]
pub enum NodeBody {
    Token(Token),
    Collection(Vec<Node>),
    Composite(Vec<Option<Node>>),
    Missing(TokenType),
    Unexpected(Token),
    SyntaxError { message: SmolStr, children: Vec<Node> },
}

#[derive(Debug)]
struct NodeData {
    id: NodeId,
    kind: NodeKind,
    body: NodeBody,
    width: usize,
    text_len: usize,
}

/// Handle on an immutable node.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

/// A syntax error found in a tree, with the byte range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeError {
    pub message: SmolStr,
    pub range: TextRange,
}

impl Node {
    fn build(kind: NodeKind, body: NodeBody) -> Result<Node, InvariantError> {
        invariants::check(kind, &body)?;
        let (width, text_len) = match &body {
            NodeBody::Token(t) | NodeBody::Unexpected(t) => (1, t.full_len()),
            NodeBody::Missing(_) => (0, 0),
            NodeBody::Collection(items) | NodeBody::SyntaxError { children: items, .. } => items
                .iter()
                .fold((0, 0), |(w, l), n| (w + n.width(), l + n.text_len())),
            NodeBody::Composite(slots) => slots
                .iter()
                .flatten()
                .fold((0, 0), |(w, l), n| (w + n.width(), l + n.text_len())),
        };
        Ok(Node(Arc::new(NodeData {
            id: NodeId::next(),
            kind,
            body,
            width,
            text_len,
        })))
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn from_token(token: Token) -> Node {
        Self::leaf(NodeKind::Token, NodeBody::Token(token))
    }

    /// Zero-width marker for an expected token.
    pub fn missing(expected: TokenType) -> Node {
        Self::leaf(NodeKind::MissingToken, NodeBody::Missing(expected))
    }

    pub fn unexpected(token: Token) -> Node {
        Self::leaf(NodeKind::UnexpectedToken, NodeBody::Unexpected(token))
    }

    fn leaf(kind: NodeKind, body: NodeBody) -> Node {
        let (width, text_len) = match &body {
            NodeBody::Token(t) | NodeBody::Unexpected(t) => (1, t.full_len()),
            _ => (0, 0),
        };
        Node(Arc::new(NodeData {
            id: NodeId::next(),
            kind,
            body,
            width,
            text_len,
        }))
    }

    /// Error container. Fails when no child is error-tolerant.
    pub fn syntax_error(
        message: impl AsRef<str>,
        children: Vec<Node>,
    ) -> Result<Node, InvariantError> {
        Self::build(
            NodeKind::SyntaxError,
            NodeBody::SyntaxError {
                message: SmolStr::new(message.as_ref()),
                children,
            },
        )
    }

    pub fn collection(kind: NodeKind, items: Vec<Node>) -> Result<Node, InvariantError> {
        Self::build(kind, NodeBody::Collection(items))
    }

    pub fn composite(kind: NodeKind, slots: Vec<Option<Node>>) -> Result<Node, InvariantError> {
        Self::build(kind, NodeBody::Composite(slots))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    pub fn body(&self) -> &NodeBody {
        &self.0.body
    }

    /// Number of tokens (leaves) covered by this node.
    pub fn width(&self) -> usize {
        self.0.width
    }

    /// Length in bytes of the full text (trivia included).
    pub fn text_len(&self) -> usize {
        self.0.text_len
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_error_tolerant(&self) -> bool {
        self.kind().is_error_tolerant()
    }

    /// Token of a token leaf (not of an unexpected token).
    pub fn token(&self) -> Option<&Token> {
        match &self.0.body {
            NodeBody::Token(t) => Some(t),
            _ => None,
        }
    }

    /// Token of a token or unexpected leaf.
    pub fn leaf_token(&self) -> Option<&Token> {
        match &self.0.body {
            NodeBody::Token(t) | NodeBody::Unexpected(t) => Some(t),
            _ => None,
        }
    }

    /// Whether this is a token leaf whose text is `text`.
    pub fn is_text(&self, text: &str) -> bool {
        self.token().is_some_and(|t| t.text() == text)
    }

    pub fn items(&self) -> Option<&[Node]> {
        match &self.0.body {
            NodeBody::Collection(items) => Some(items),
            NodeBody::SyntaxError { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn slots(&self) -> Option<&[Option<Node>]> {
        match &self.0.body {
            NodeBody::Composite(slots) => Some(slots),
            _ => None,
        }
    }

    pub fn slot(&self, index: usize) -> Option<&Node> {
        self.slots().and_then(|s| s.get(index)).and_then(Option::as_ref)
    }

    /// Slot by schema name.
    pub fn named_slot(&self, name: &str) -> Option<&Node> {
        self.kind().slot_index(name).and_then(|i| self.slot(i))
    }

    /// Present children, in order.
    pub fn children(&self) -> Box<dyn Iterator<Item = &Node> + '_> {
        match &self.0.body {
            NodeBody::Collection(items) | NodeBody::SyntaxError { children: items, .. } => {
                Box::new(items.iter())
            }
            NodeBody::Composite(slots) => Box::new(slots.iter().flatten()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Leaves that carry a token (tokens and unexpected tokens), depth-first.
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::with_capacity(self.width());
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Node>) {
        match &self.0.body {
            NodeBody::Token(_) | NodeBody::Unexpected(_) => out.push(self),
            NodeBody::Missing(_) => {}
            _ => {
                for child in self.children() {
                    child.collect_leaves(out);
                }
            }
        }
    }

    pub fn first_token(&self) -> Option<&Token> {
        match &self.0.body {
            NodeBody::Token(t) | NodeBody::Unexpected(t) => Some(t),
            _ => self.children().find_map(|c| c.first_token()),
        }
    }

    pub fn last_token(&self) -> Option<&Token> {
        match &self.0.body {
            NodeBody::Token(t) | NodeBody::Unexpected(t) => Some(t),
            NodeBody::Collection(items) | NodeBody::SyntaxError { children: items, .. } => {
                items.iter().rev().find_map(|c| c.last_token())
            }
            NodeBody::Composite(slots) => slots.iter().rev().flatten().find_map(|c| c.last_token()),
            NodeBody::Missing(_) => None,
        }
    }

    pub fn write_to(&self, out: &mut String) {
        match &self.0.body {
            NodeBody::Token(t) | NodeBody::Unexpected(t) => t.write_to(out),
            NodeBody::Missing(_) => {}
            _ => {
                for child in self.children() {
                    child.write_to(out);
                }
            }
        }
    }

    /// Full text, trivia included.
    pub fn full_text(&self) -> String {
        let mut out = String::with_capacity(self.text_len());
        self.write_to(&mut out);
        out
    }

    /// Token texts joined by a single space (trivia dropped).
    pub fn token_text(&self) -> String {
        self.leaves()
            .iter()
            .filter_map(|l| l.leaf_token())
            .map(Token::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn has_errors(&self) -> bool {
        self.is_error_tolerant() || self.children().any(Node::has_errors)
    }

    /// Syntax errors of this subtree with their byte ranges (relative to the
    /// start of this node). Missing markers outside a syntax error cannot
    /// exist, so only `SyntaxError` nodes are reported.
    pub fn errors(&self) -> Vec<NodeError> {
        let mut out = Vec::new();
        self.collect_errors(0, &mut out);
        out
    }

    fn collect_errors(&self, offset: usize, out: &mut Vec<NodeError>) {
        if let NodeBody::SyntaxError { message, .. } = &self.0.body {
            let start = TextSize::new(offset as u32);
            let end = TextSize::new((offset + self.text_len()) as u32);
            out.push(NodeError {
                message: message.clone(),
                range: TextRange::new(start, end),
            });
            return;
        }
        let mut offset = offset;
        for child in self.children() {
            child.collect_errors(offset, out);
            offset += child.text_len();
        }
    }

    /// Re-run the invariant checks of this node.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        invariants::check(self.kind(), self.body())
    }

    /// Start editing this node. `None` for leaves.
    pub fn create_mutator(&self) -> Option<NodeMutator<'_>> {
        NodeMutator::new(self)
    }

    // =========================================================================
    // Trivia editing
    // =========================================================================

    /// A copy whose first token has the given leading trivia.
    pub fn with_leading_trivia(&self, leading: Vec<Trivia>) -> Result<Node, InvariantError> {
        self.edit_edge_token(true, &mut |t: &Token| t.with_leading(leading.clone()))
    }

    /// A copy whose last token has the given trailing trivia.
    pub fn with_trailing_trivia(&self, trailing: Vec<Trivia>) -> Result<Node, InvariantError> {
        self.edit_edge_token(false, &mut |t: &Token| t.with_trailing(trailing.clone()))
    }

    fn edit_edge_token(
        &self,
        first: bool,
        edit: &mut dyn FnMut(&Token) -> Token,
    ) -> Result<Node, InvariantError> {
        match &self.0.body {
            NodeBody::Token(t) => return Ok(Node::from_token(edit(t))),
            NodeBody::Unexpected(t) => return Ok(Node::unexpected(edit(t))),
            NodeBody::Missing(_) => return Ok(self.clone()),
            _ => {}
        }
        let children: Vec<&Node> = self.children().collect();
        let target = if first {
            children.iter().position(|c| c.width() > 0)
        } else {
            children.iter().rposition(|c| c.width() > 0)
        };
        let Some(target) = target else {
            return Ok(self.clone());
        };
        let replacement = children[target].edit_edge_token(first, edit)?;
        let target_id = children[target].id();
        let Some(mut mutator) = self.create_mutator() else {
            return Ok(self.clone());
        };
        mutator.apply_mutation(|n| {
            if n.id() == target_id {
                Some(replacement.clone())
            } else {
                Some(n.clone())
            }
        });
        mutator.clone_node()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.body {
            NodeBody::Token(t) => write!(f, "Token({:?} {:?})", t.token_type(), t.text()),
            NodeBody::Unexpected(t) => write!(f, "Unexpected({:?})", t.text()),
            NodeBody::Missing(tt) => write!(f, "Missing({tt:?})"),
            NodeBody::SyntaxError { message, children } => f
                .debug_struct("SyntaxError")
                .field("message", message)
                .field("children", children)
                .finish(),
            NodeBody::Collection(items) => {
                write!(f, "{:?}", self.kind())?;
                f.debug_list().entries(items).finish()
            }
            NodeBody::Composite(slots) => {
                write!(f, "{:?}", self.kind())?;
                f.debug_list().entries(slots).finish()
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}

/// Short description of a node for diagnostics.
pub(crate) fn describe(node: &Node) -> String {
    match node.body() {
        NodeBody::Token(t) if t.is_end_of_input() => "end of input".to_string(),
        NodeBody::Token(t) => format!("{} '{}'", t.token_type().describe(), t.text()),
        _ => node.kind().to_string(),
    }
}

#[cfg(test)]
mod tests;
