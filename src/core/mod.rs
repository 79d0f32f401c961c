//! Transform core: tokens, trivia, tokenizer, node tree and parsers.
//!
//! Everything here is language-agnostic. Languages plug in a
//! [`Tokenizer`] and a [`CompositeParser`]; the resulting trees are
//! immutable and edited through [`NodeMutator`]s.

pub mod errors;
pub mod node;
pub mod parser;
pub mod token;
pub mod tokenizer;
pub mod trivia;

pub use errors::{InvariantError, ParseError, TokenError};
pub use node::{
    CollectionMutator, CompositeMutator, Node, NodeBody, NodeError, NodeId, NodeKind, NodeMutator,
    replace_descendant,
};
pub use parser::{Analyzer, CompositeParser, Parser, SourceCode};
pub use token::{Token, TokenType};
pub use tokenizer::{LowLevelToken, Tokenizer, TokenizerHead, TriviaCollector, tokenize};
pub use trivia::{Trivia, TriviaKind};
