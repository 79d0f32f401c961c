//! Node kinds and their structural schemas.
//!
//! Every kind declares its shape here. The match in [`NodeKind::schema`] is
//! exhaustive: adding a kind without deciding its slots does not compile.

use std::fmt;

use crate::core::token::TokenType;

/// All node kinds (leaves, error-tolerant nodes, collections, composites).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    // =========================================================================
    // LEAVES AND ERROR-TOLERANT NODES
    // =========================================================================
    Token,
    MissingToken,
    UnexpectedToken,
    SyntaxError,

    // =========================================================================
    // SHARED
    // =========================================================================
    /// Root of every analyzed source: top-level nodes then the end-of-input token.
    SourceCode,

    // =========================================================================
    // C-FAMILY (generic statements and blocks)
    // =========================================================================
    Statement,
    Block,
    BlockContent,

    // =========================================================================
    // LESS
    // =========================================================================
    ImportStatement,
    ImportOptions,
    ImportOptionList,
    EnsureImports,
    ImportList,
    ImportSpec,

    // =========================================================================
    // TRANSFORMER LANGUAGE
    // =========================================================================
    TransformerFunction,
    StatementBlock,
    StatementList,
    InjectInto,
    InjectionPoint,
    InjectAround,
    Replace,
    InScope,
    Location,
    Cardinality,
    SpanMatcher,
}

/// What a slot or a collection item accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// A token leaf of this type.
    Token(TokenType),
    /// A token leaf of any of these types.
    Tokens(&'static [TokenType]),
    /// A token leaf whose text is one of these keywords.
    Keyword(&'static [&'static str]),
    /// Any token leaf.
    AnyToken,
    /// A node of this kind.
    Node(NodeKind),
    /// A node of any of these kinds.
    Nodes(&'static [NodeKind]),
}

/// A named composite slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: &'static str,
    pub optional: bool,
    pub rule: Rule,
}

const fn req(name: &'static str, rule: Rule) -> Slot {
    Slot {
        name,
        optional: false,
        rule,
    }
}

const fn opt(name: &'static str, rule: Rule) -> Slot {
    Slot {
        name,
        optional: true,
        rule,
    }
}

/// Structural shape of a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Leaf,
    ErrorTolerant,
    Collection {
        items: &'static [Rule],
        non_empty: bool,
    },
    Composite(&'static [Slot]),
}

const STATEMENT_KINDS: &[NodeKind] = &[
    NodeKind::InjectInto,
    NodeKind::InjectAround,
    NodeKind::Replace,
    NodeKind::InScope,
    NodeKind::EnsureImports,
];

const BLOCK_ITEMS: &[NodeKind] = &[NodeKind::Statement, NodeKind::Block];

const SOURCE_ITEMS: &[NodeKind] = &[
    NodeKind::Statement,
    NodeKind::Block,
    NodeKind::ImportStatement,
    NodeKind::TransformerFunction,
];

const SOURCE_CODE_RULES: &[Rule] = &[Rule::Nodes(SOURCE_ITEMS), Rule::Token(TokenType::EndOfInput)];
const STATEMENT_RULES: &[Rule] = &[Rule::AnyToken, Rule::Node(NodeKind::Block)];
const BLOCK_CONTENT_RULES: &[Rule] = &[Rule::Nodes(BLOCK_ITEMS)];
const IMPORT_OPTION_RULES: &[Rule] = &[Rule::Tokens(&[TokenType::Identifier, TokenType::Comma])];
const IMPORT_LIST_RULES: &[Rule] = &[Rule::Node(NodeKind::ImportSpec)];
const STATEMENT_LIST_RULES: &[Rule] = &[Rule::Nodes(STATEMENT_KINDS)];

const STRINGS: &[TokenType] = &[TokenType::String, TokenType::RawString];

const BLOCK: &[Slot] = &[
    req("open", Rule::Token(TokenType::OpenBrace)),
    req("content", Rule::Node(NodeKind::BlockContent)),
    req("close", Rule::Token(TokenType::CloseBrace)),
];

const IMPORT_STATEMENT: &[Slot] = &[
    req("import", Rule::Keyword(&["@import"])),
    opt("options", Rule::Node(NodeKind::ImportOptions)),
    req("path", Rule::Token(TokenType::String)),
    req("semicolon", Rule::Token(TokenType::SemiColon)),
];

const IMPORT_OPTIONS: &[Slot] = &[
    req("open", Rule::Token(TokenType::OpenParen)),
    req("list", Rule::Node(NodeKind::ImportOptionList)),
    req("close", Rule::Token(TokenType::CloseParen)),
];

const ENSURE_IMPORTS: &[Slot] = &[
    req("ensure", Rule::Keyword(&["ensure"])),
    req("import", Rule::Keyword(&["import", "@import"])),
    req("imports", Rule::Node(NodeKind::ImportList)),
    req("semicolon", Rule::Token(TokenType::SemiColon)),
];

const IMPORT_SPEC: &[Slot] = &[
    opt("options", Rule::Node(NodeKind::ImportOptions)),
    req("path", Rule::Token(TokenType::String)),
    opt("comma", Rule::Token(TokenType::Comma)),
];

const TRANSFORMER_FUNCTION: &[Slot] = &[
    req("create", Rule::Keyword(&["create"])),
    opt("language", Rule::Token(TokenType::Identifier)),
    req("transformer", Rule::Keyword(&["transformer"])),
    opt("name", Rule::Token(TokenType::Identifier)),
    opt("on", Rule::Keyword(&["on"])),
    opt("target", Rule::Tokens(STRINGS)),
    req("body", Rule::Node(NodeKind::StatementBlock)),
];

const STATEMENT_BLOCK: &[Slot] = &[
    req("begin", Rule::Keyword(&["begin"])),
    req("statements", Rule::Node(NodeKind::StatementList)),
    req("end", Rule::Keyword(&["end"])),
];

const INJECT_INTO: &[Slot] = &[
    req("inject", Rule::Keyword(&["inject"])),
    req("content", Rule::Tokens(STRINGS)),
    req("into", Rule::Keyword(&["into"])),
    req("point", Rule::Node(NodeKind::InjectionPoint)),
    req("semicolon", Rule::Token(TokenType::SemiColon)),
];

const INJECTION_POINT: &[Slot] = &[
    req("open", Rule::Token(TokenType::Less)),
    req("name", Rule::Token(TokenType::Identifier)),
    opt("slash", Rule::Token(TokenType::Slash)),
    req("close", Rule::Token(TokenType::Greater)),
];

const INJECT_AROUND: &[Slot] = &[
    req("inject", Rule::Keyword(&["inject"])),
    req("content", Rule::Tokens(STRINGS)),
    req("where", Rule::Keyword(&["before", "after"])),
    req("location", Rule::Node(NodeKind::Location)),
    req("semicolon", Rule::Token(TokenType::SemiColon)),
];

const REPLACE: &[Slot] = &[
    req("replace", Rule::Keyword(&["replace"])),
    req("location", Rule::Node(NodeKind::Location)),
    req("with", Rule::Keyword(&["with"])),
    req("content", Rule::Tokens(STRINGS)),
    req("semicolon", Rule::Token(TokenType::SemiColon)),
];

const IN_SCOPE: &[Slot] = &[
    req("in", Rule::Keyword(&["in"])),
    req("location", Rule::Node(NodeKind::Location)),
    req("body", Rule::Node(NodeKind::StatementBlock)),
];

const LOCATION: &[Slot] = &[
    opt("cardinality", Rule::Node(NodeKind::Cardinality)),
    req("matcher", Rule::Node(NodeKind::SpanMatcher)),
];

const CARDINALITY: &[Slot] = &[
    req(
        "keyword",
        Rule::Keyword(&["single", "first", "last", "all", "each"]),
    ),
    opt("sign", Rule::Tokens(&[TokenType::Plus, TokenType::Minus])),
    opt("offset", Rule::Token(TokenType::Number)),
    opt("out", Rule::Keyword(&["out"])),
    opt("of", Rule::Keyword(&["of"])),
    opt("count", Rule::Token(TokenType::Number)),
];

const SPAN_MATCHER: &[Slot] = &[
    opt("open", Rule::Token(TokenType::OpenBrace)),
    opt("span_type", Rule::Token(TokenType::Identifier)),
    opt("close", Rule::Token(TokenType::CloseBrace)),
    opt("dot", Rule::Token(TokenType::Dot)),
    opt("language", Rule::Token(TokenType::Identifier)),
    req("pattern", Rule::Tokens(STRINGS)),
];

impl NodeKind {
    pub fn schema(self) -> Schema {
        match self {
            Self::Token => Schema::Leaf,
            Self::MissingToken | Self::UnexpectedToken | Self::SyntaxError => {
                Schema::ErrorTolerant
            }
            Self::SourceCode => Schema::Collection {
                items: SOURCE_CODE_RULES,
                non_empty: true,
            },
            Self::Statement => Schema::Collection {
                items: STATEMENT_RULES,
                non_empty: true,
            },
            Self::Block => Schema::Composite(BLOCK),
            Self::BlockContent => Schema::Collection {
                items: BLOCK_CONTENT_RULES,
                non_empty: false,
            },
            Self::ImportStatement => Schema::Composite(IMPORT_STATEMENT),
            Self::ImportOptions => Schema::Composite(IMPORT_OPTIONS),
            Self::ImportOptionList => Schema::Collection {
                items: IMPORT_OPTION_RULES,
                non_empty: false,
            },
            Self::EnsureImports => Schema::Composite(ENSURE_IMPORTS),
            Self::ImportList => Schema::Collection {
                items: IMPORT_LIST_RULES,
                non_empty: true,
            },
            Self::ImportSpec => Schema::Composite(IMPORT_SPEC),
            Self::TransformerFunction => Schema::Composite(TRANSFORMER_FUNCTION),
            Self::StatementBlock => Schema::Composite(STATEMENT_BLOCK),
            Self::StatementList => Schema::Collection {
                items: STATEMENT_LIST_RULES,
                non_empty: false,
            },
            Self::InjectInto => Schema::Composite(INJECT_INTO),
            Self::InjectionPoint => Schema::Composite(INJECTION_POINT),
            Self::InjectAround => Schema::Composite(INJECT_AROUND),
            Self::Replace => Schema::Composite(REPLACE),
            Self::InScope => Schema::Composite(IN_SCOPE),
            Self::Location => Schema::Composite(LOCATION),
            Self::Cardinality => Schema::Composite(CARDINALITY),
            Self::SpanMatcher => Schema::Composite(SPAN_MATCHER),
        }
    }

    pub fn is_error_tolerant(self) -> bool {
        matches!(self.schema(), Schema::ErrorTolerant)
    }

    pub fn is_collection(self) -> bool {
        matches!(self.schema(), Schema::Collection { .. })
    }

    pub fn is_composite(self) -> bool {
        matches!(self.schema(), Schema::Composite(_))
    }

    /// Index of a named composite slot.
    pub fn slot_index(self, name: &str) -> Option<usize> {
        match self.schema() {
            Schema::Composite(slots) => slots.iter().position(|s| s.name == name),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
