//! Typed wrappers over transformer language nodes.
//!
//! Each struct wraps a [`Node`] of one kind and provides accessors for its
//! slots. Accessors return `None` when the slot holds a syntax error.

use super::tokenizer::string_value;
use crate::core::{Node, NodeKind, Token};
use crate::location::LocationCardinality;

/// Trait for AST nodes that wrap a Node
pub trait AstNode: Sized {
    fn can_cast(kind: NodeKind) -> bool;
    fn cast(node: Node) -> Option<Self>;
    fn syntax(&self) -> &Node;
}

// ============================================================================
// Helper macros
// ============================================================================

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone)]
        pub struct $name(Node);

        impl AstNode for $name {
            fn can_cast(kind: NodeKind) -> bool {
                kind == NodeKind::$kind
            }

            fn cast(node: Node) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &Node {
                &self.0
            }
        }
    };
}

fn slot_token<'a>(node: &'a Node, name: &str) -> Option<&'a Token> {
    node.named_slot(name).and_then(Node::token)
}

fn slot_text<'a>(node: &'a Node, name: &str) -> Option<&'a str> {
    slot_token(node, name).map(Token::text)
}

fn slot_string(node: &Node, name: &str) -> Option<String> {
    slot_token(node, name).map(string_value)
}

// ============================================================================
// Functions
// ============================================================================

ast_node!(TransformerFunctionNode, TransformerFunction);

impl TransformerFunctionNode {
    pub fn language(&self) -> Option<&str> {
        slot_text(&self.0, "language")
    }

    pub fn name(&self) -> Option<&str> {
        slot_text(&self.0, "name")
    }

    /// Value of the `on "..."` target.
    pub fn target(&self) -> Option<String> {
        slot_string(&self.0, "target")
    }

    pub fn body(&self) -> Option<StatementBlock> {
        self.0.named_slot("body").cloned().and_then(StatementBlock::cast)
    }
}

ast_node!(StatementBlock, StatementBlock);

impl StatementBlock {
    pub fn statements(&self) -> impl Iterator<Item = Statement> + '_ {
        self.0
            .named_slot("statements")
            .into_iter()
            .flat_map(Node::children)
            .cloned()
            .filter_map(Statement::cast)
    }
}

// ============================================================================
// Statements
// ============================================================================

/// Any statement of a function body.
#[derive(Debug, Clone)]
pub enum Statement {
    InjectInto(InjectInto),
    InjectAround(InjectAround),
    Replace(Replace),
    InScope(InScope),
    /// A statement contributed by the target language.
    Language(Node),
}

impl AstNode for Statement {
    fn can_cast(kind: NodeKind) -> bool {
        matches!(
            kind,
            NodeKind::InjectInto
                | NodeKind::InjectAround
                | NodeKind::Replace
                | NodeKind::InScope
                | NodeKind::EnsureImports
        )
    }

    fn cast(node: Node) -> Option<Self> {
        match node.kind() {
            NodeKind::InjectInto => Some(Self::InjectInto(InjectInto(node))),
            NodeKind::InjectAround => Some(Self::InjectAround(InjectAround(node))),
            NodeKind::Replace => Some(Self::Replace(Replace(node))),
            NodeKind::InScope => Some(Self::InScope(InScope(node))),
            NodeKind::EnsureImports => Some(Self::Language(node)),
            _ => None,
        }
    }

    fn syntax(&self) -> &Node {
        match self {
            Self::InjectInto(n) => &n.0,
            Self::InjectAround(n) => &n.0,
            Self::Replace(n) => &n.0,
            Self::InScope(n) => &n.0,
            Self::Language(n) => n,
        }
    }
}

ast_node!(InjectInto, InjectInto);

impl InjectInto {
    pub fn content(&self) -> Option<String> {
        slot_string(&self.0, "content")
    }

    pub fn point(&self) -> Option<InjectionPoint> {
        self.0.named_slot("point").cloned().and_then(InjectionPoint::cast)
    }
}

ast_node!(InjectionPoint, InjectionPoint);

impl InjectionPoint {
    pub fn name(&self) -> Option<&str> {
        slot_text(&self.0, "name")
    }

    /// `<Name/>` rather than `<Name>`.
    pub fn is_self_closing(&self) -> bool {
        self.0.named_slot("slash").is_some()
    }
}

ast_node!(InjectAround, InjectAround);

impl InjectAround {
    pub fn content(&self) -> Option<String> {
        slot_string(&self.0, "content")
    }

    pub fn is_before(&self) -> bool {
        slot_text(&self.0, "where") == Some("before")
    }

    pub fn location(&self) -> Option<Location> {
        self.0.named_slot("location").cloned().and_then(Location::cast)
    }
}

ast_node!(Replace, Replace);

impl Replace {
    pub fn location(&self) -> Option<Location> {
        self.0.named_slot("location").cloned().and_then(Location::cast)
    }

    pub fn content(&self) -> Option<String> {
        slot_string(&self.0, "content")
    }
}

ast_node!(InScope, InScope);

impl InScope {
    pub fn location(&self) -> Option<Location> {
        self.0.named_slot("location").cloned().and_then(Location::cast)
    }

    pub fn body(&self) -> Option<StatementBlock> {
        self.0.named_slot("body").cloned().and_then(StatementBlock::cast)
    }
}

// ============================================================================
// Locations
// ============================================================================

ast_node!(Location, Location);

impl Location {
    pub fn cardinality(&self) -> Option<Cardinality> {
        self.0
            .named_slot("cardinality")
            .cloned()
            .and_then(Cardinality::cast)
    }

    pub fn matcher(&self) -> Option<SpanMatcher> {
        self.0.named_slot("matcher").cloned().and_then(SpanMatcher::cast)
    }
}

ast_node!(Cardinality, Cardinality);

impl Cardinality {
    fn number(&self, slot: &str) -> Option<usize> {
        slot_text(&self.0, slot).and_then(|t| t.parse().ok())
    }

    /// The cardinality this node denotes. `None` when a number is malformed.
    pub fn value(&self) -> Option<LocationCardinality> {
        let offset = match slot_token(&self.0, "sign") {
            Some(_) => self.number("offset")?,
            None => 1,
        };
        let out_of = match self.0.named_slot("out") {
            Some(_) => Some(self.number("count")?),
            None => None,
        };
        let count = self.number("count");
        Some(match slot_text(&self.0, "keyword")? {
            "single" => LocationCardinality::Single,
            "first" => LocationCardinality::First { offset, out_of },
            "last" => LocationCardinality::Last { offset, out_of },
            "all" => LocationCardinality::All { expected: count },
            "each" => LocationCardinality::Each { expected: count },
            _ => return None,
        })
    }
}

ast_node!(SpanMatcher, SpanMatcher);

impl SpanMatcher {
    pub fn span_type(&self) -> Option<&str> {
        slot_text(&self.0, "span_type")
    }

    pub fn language(&self) -> Option<&str> {
        slot_text(&self.0, "language")
    }

    pub fn pattern(&self) -> Option<String> {
        slot_string(&self.0, "pattern")
    }
}
