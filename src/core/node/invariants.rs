//! Structural checks run by every node constructor.

use super::kind::{NodeKind, Rule, Schema, Slot};
use super::{Node, NodeBody, describe};
use crate::core::errors::InvariantError;
use crate::core::token::TokenType;

pub(super) fn check(kind: NodeKind, body: &NodeBody) -> Result<(), InvariantError> {
    match (kind.schema(), body) {
        (Schema::Leaf, NodeBody::Token(_)) => Ok(()),
        (Schema::ErrorTolerant, NodeBody::Missing(_)) if kind == NodeKind::MissingToken => Ok(()),
        (Schema::ErrorTolerant, NodeBody::Unexpected(_)) if kind == NodeKind::UnexpectedToken => {
            Ok(())
        }
        (Schema::ErrorTolerant, NodeBody::SyntaxError { children, .. })
            if kind == NodeKind::SyntaxError =>
        {
            if children.iter().any(Node::is_error_tolerant) {
                Ok(())
            } else {
                Err(InvariantError::SyntaxErrorWithoutError)
            }
        }
        (Schema::Collection { items, non_empty }, NodeBody::Collection(nodes)) => {
            check_collection(kind, items, non_empty, nodes)
        }
        (Schema::Composite(slots), NodeBody::Composite(nodes)) => {
            check_composite(kind, slots, nodes)
        }
        _ => Err(InvariantError::BodyMismatch { kind }),
    }
}

fn check_collection(
    kind: NodeKind,
    rules: &[Rule],
    non_empty: bool,
    nodes: &[Node],
) -> Result<(), InvariantError> {
    if non_empty && nodes.is_empty() {
        return Err(InvariantError::EmptyCollection { kind });
    }
    for (index, node) in nodes.iter().enumerate() {
        ensure_contained(kind, node)?;
        if node.kind() == NodeKind::SyntaxError {
            continue;
        }
        let is_eoi = node.token().is_some_and(|t| t.is_end_of_input());
        let eoi_allowed = kind == NodeKind::SourceCode && index + 1 == nodes.len();
        if (is_eoi && !eoi_allowed) || !rules.iter().any(|r| matches_rule(r, node)) {
            return Err(InvariantError::InvalidItem {
                kind,
                index,
                found: describe(node),
            });
        }
    }
    if kind == NodeKind::SourceCode {
        let ends_with_eoi = nodes
            .last()
            .and_then(Node::token)
            .is_some_and(|t| t.is_end_of_input());
        if !ends_with_eoi {
            return Err(InvariantError::MissingEndOfInput);
        }
    }
    Ok(())
}

fn check_composite(
    kind: NodeKind,
    slots: &[Slot],
    nodes: &[Option<Node>],
) -> Result<(), InvariantError> {
    if slots.len() != nodes.len() {
        return Err(InvariantError::SlotCount {
            kind,
            expected: slots.len(),
            actual: nodes.len(),
        });
    }
    for (slot, node) in slots.iter().zip(nodes) {
        let Some(node) = node else {
            if slot.optional {
                continue;
            }
            return Err(InvariantError::MissingSlot {
                kind,
                slot: slot.name,
            });
        };
        ensure_contained(kind, node)?;
        if node.kind() == NodeKind::SyntaxError {
            continue;
        }
        if !matches_rule(&slot.rule, node) {
            return Err(InvariantError::InvalidSlot {
                kind,
                slot: slot.name,
                found: describe(node),
            });
        }
    }
    Ok(())
}

/// Missing and unexpected tokens only exist inside a syntax error.
fn ensure_contained(kind: NodeKind, node: &Node) -> Result<(), InvariantError> {
    match node.kind() {
        found @ (NodeKind::MissingToken | NodeKind::UnexpectedToken) => {
            Err(InvariantError::UncontainedErrorNode { kind, found })
        }
        _ => Ok(()),
    }
}

fn matches_rule(rule: &Rule, node: &Node) -> bool {
    match *rule {
        Rule::Token(tt) => node.token().is_some_and(|t| t.token_type() == tt),
        Rule::Tokens(types) => node
            .token()
            .is_some_and(|t| types.contains(&t.token_type())),
        Rule::Keyword(words) => node.token().is_some_and(|t| {
            matches!(t.token_type(), TokenType::Identifier | TokenType::AtKeyword)
                && words.contains(&t.text())
        }),
        Rule::AnyToken => node
            .token()
            .is_some_and(|t| !t.is_end_of_input() && !t.token_type().is_error()),
        Rule::Node(k) => node.kind() == k,
        Rule::Nodes(kinds) => kinds.contains(&node.kind()),
    }
}
