use std::sync::Arc;

use smol_str::SmolStr;
use text_size::TextSize;
use tracing::trace;

use super::Parser;
use crate::core::errors::{InvariantError, ParseError, TokenError};
use crate::core::node::{Node, NodeKind};
use crate::core::tokenizer::TokenizerHead;

/// Tries a list of parsers in order at each position.
///
/// With a single parser the composite is *transparent*: it also checks that
/// the node covers exactly the consumed text and that its width matches its
/// leaf count.
#[derive(Clone)]
pub struct CompositeParser {
    name: SmolStr,
    parsers: Vec<Arc<dyn Parser>>,
}

impl CompositeParser {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            parsers: Vec::new(),
        }
    }

    pub fn with(mut self, parser: impl Parser + 'static) -> Self {
        self.parsers.push(Arc::new(parser));
        self
    }

    pub fn with_shared(mut self, parser: Arc<dyn Parser>) -> Self {
        self.parsers.push(parser);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_transparent(&self) -> bool {
        self.parsers.len() == 1
    }

    /// Parse one top-level node. `Ok(None)` when no parser recognizes the head;
    /// the head is then left untouched.
    pub fn parse_one(&self, head: &mut TokenizerHead<'_>) -> Result<Option<Node>, InvariantError> {
        for parser in &self.parsers {
            let mut attempt = head.clone();
            match parser.parse(&mut attempt) {
                Ok(node) => {
                    self.validate(head, &attempt, &node)?;
                    *head = attempt;
                    return Ok(Some(node));
                }
                Err(ParseError::Unrecognized(error)) => {
                    trace!(parser = %self.name, %error, "parser declined");
                }
                Err(ParseError::Invariant(error)) => return Err(error),
            }
        }
        Ok(None)
    }

    /// Parse top-level nodes up to the end of input. Runs of unrecognized
    /// tokens are grouped into syntax error nodes.
    pub fn parse_all(&self, head: &mut TokenizerHead<'_>) -> Result<Vec<Node>, InvariantError> {
        let mut nodes = Vec::new();
        let mut unexpected = Vec::new();
        while !head.is_end_of_input() {
            if let Some(node) = self.parse_one(head)? {
                flush_unexpected(&mut unexpected, &mut nodes)?;
                nodes.push(node);
                continue;
            }
            match head.create_unexpected() {
                Some(node) => unexpected.push(node),
                None => break,
            }
        }
        flush_unexpected(&mut unexpected, &mut nodes)?;
        Ok(nodes)
    }

    fn validate(
        &self,
        before: &TokenizerHead<'_>,
        after: &TokenizerHead<'_>,
        node: &Node,
    ) -> Result<(), InvariantError> {
        if after.offset() <= before.offset() {
            return Err(InvariantError::NoProgress {
                parser: self.name.clone(),
                offset: TextSize::new(before.offset() as u32),
            });
        }
        if matches!(
            node.kind(),
            NodeKind::MissingToken | NodeKind::UnexpectedToken | NodeKind::SourceCode
        ) {
            return Err(InvariantError::InvalidTopLevel {
                parser: self.name.clone(),
                found: node.kind(),
            });
        }
        if self.is_transparent() {
            let consumed = after.offset() - before.offset();
            if consumed != node.text_len() {
                return Err(InvariantError::LengthMismatch {
                    parser: self.name.clone(),
                    consumed,
                    covered: node.text_len(),
                });
            }
            if cfg!(debug_assertions) {
                let leaves = node.leaves().len();
                if leaves != node.width() {
                    return Err(InvariantError::WidthMismatch {
                        kind: node.kind(),
                        width: node.width(),
                        leaves,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Parser for CompositeParser {
    fn parse(&self, head: &mut TokenizerHead<'_>) -> Result<Node, ParseError> {
        match self.parse_one(head)? {
            Some(node) => Ok(node),
            None => Err(TokenError::new(
                format!("{} does not recognize {}", self.name, head.token_type()),
                head.token_offset(),
            )
            .into()),
        }
    }
}

fn flush_unexpected(unexpected: &mut Vec<Node>, nodes: &mut Vec<Node>) -> Result<(), InvariantError> {
    if unexpected.is_empty() {
        return Ok(());
    }
    let first = unexpected
        .first()
        .and_then(Node::leaf_token)
        .map(|t| t.text().to_string())
        .unwrap_or_default();
    let message = format!("Unexpected '{first}'");
    nodes.push(Node::syntax_error(message, std::mem::take(unexpected))?);
    Ok(())
}
