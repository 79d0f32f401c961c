//! Parser layer
//!
//! A [`Parser`] looks at the tokenizer head and either builds a node (having
//! consumed at least one character) or reports that it does not recognize the
//! head with a [`TokenError`](crate::core::TokenError). Parsers of a language
//! are tried in turn by a [`CompositeParser`]; the [`Analyzer`] runs one over a
//! whole text and wraps the result in a [`SourceCode`] root.

mod analyzer;
mod composite;

pub use analyzer::{Analyzer, SourceCode};
pub use composite::CompositeParser;

use super::errors::ParseError;
use super::node::Node;
use super::tokenizer::TokenizerHead;

pub trait Parser: Send + Sync {
    fn parse(&self, head: &mut TokenizerHead<'_>) -> Result<Node, ParseError>;
}

impl<F> Parser for F
where
    F: Fn(&mut TokenizerHead<'_>) -> Result<Node, ParseError> + Send + Sync,
{
    fn parse(&self, head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
        self(head)
    }
}

#[cfg(test)]
mod tests;
