//! Error types of the transform core.

use smol_str::SmolStr;
use text_size::TextSize;
use thiserror::Error;

use super::node::NodeKind;

/// A broken structural contract.
///
/// These are programming errors (a parser or an edit built an invalid tree),
/// never data errors: syntax errors of the input live in the tree itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("{kind}: expected {expected} slots, got {actual}")]
    SlotCount {
        kind: NodeKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind}: required slot '{slot}' is empty")]
    MissingSlot { kind: NodeKind, slot: &'static str },

    #[error("{kind}: slot '{slot}' cannot hold {found}")]
    InvalidSlot {
        kind: NodeKind,
        slot: &'static str,
        found: String,
    },

    #[error("{kind}: item #{index} cannot be {found}")]
    InvalidItem {
        kind: NodeKind,
        index: usize,
        found: String,
    },

    #[error("{kind} cannot be empty")]
    EmptyCollection { kind: NodeKind },

    #[error("{found} must be nested in a SyntaxError node, found directly in {kind}")]
    UncontainedErrorNode { kind: NodeKind, found: NodeKind },

    #[error("SyntaxError node must contain at least one error-tolerant child")]
    SyntaxErrorWithoutError,

    #[error("{kind} cannot be built with this body")]
    BodyMismatch { kind: NodeKind },

    #[error("SourceCode must end with exactly one end-of-input token")]
    MissingEndOfInput,

    #[error("parser '{parser}' succeeded without consuming input at offset {offset:?}")]
    NoProgress { parser: SmolStr, offset: TextSize },

    #[error("parser '{parser}' returned {found} which cannot be a top-level node")]
    InvalidTopLevel { parser: SmolStr, found: NodeKind },

    #[error("parser '{parser}' consumed {consumed} bytes but its node covers {covered}")]
    LengthMismatch {
        parser: SmolStr,
        consumed: usize,
        covered: usize,
    },

    #[error("{kind} width is {width} but it has {leaves} leaves")]
    WidthMismatch {
        kind: NodeKind,
        width: usize,
        leaves: usize,
    },

    #[error("analyzed tree covers {covered} bytes of a {length} bytes text")]
    LostText { length: usize, covered: usize },
}

/// The head of the input is not recognized by a parser.
///
/// Nothing has been consumed: the caller may try another parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset:?}")]
pub struct TokenError {
    pub message: SmolStr,
    pub offset: TextSize,
}

impl TokenError {
    pub fn new(message: impl AsRef<str>, offset: usize) -> Self {
        Self {
            message: SmolStr::new(message.as_ref()),
            offset: TextSize::new(offset as u32),
        }
    }
}

/// Failure of a [`Parser`](super::parser::Parser).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Unrecognized(#[from] TokenError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),
}
