//! Node mutators
//!
//! Nodes are immutable. A mutator copies the children of a node, lets the
//! caller edit the copy, then builds a new node with `clone_node` which
//! re-checks the invariants of the kind. When nothing changed the original
//! node is returned.

use super::kind::NodeKind;
use super::{Node, NodeBody, NodeId};
use crate::core::errors::InvariantError;

/// Editable copy of the items of a collection (or of a syntax error).
pub struct CollectionMutator<'a> {
    node: &'a Node,
    items: Vec<Node>,
}

impl<'a> CollectionMutator<'a> {
    pub fn new(node: &'a Node) -> Option<Self> {
        let items = node.items()?.to_vec();
        Some(Self { node, items })
    }

    pub fn items(&self) -> &[Node] {
        &self.items
    }

    /// Direct access to the items.
    pub fn raw_items(&mut self) -> &mut Vec<Node> {
        &mut self.items
    }

    /// Map every item; `None` removes it.
    pub fn apply_mutation(&mut self, mut f: impl FnMut(&Node) -> Option<Node>) {
        self.items = self.items.iter().filter_map(|n| f(n)).collect();
    }

    pub fn clone_node(self) -> Result<Node, InvariantError> {
        let Self { node, items } = self;
        let original = node.items().unwrap_or_default();
        let unchanged =
            original.len() == items.len() && original.iter().zip(&items).all(|(a, b)| a.ptr_eq(b));
        if unchanged {
            return Ok(node.clone());
        }
        match node.body() {
            NodeBody::SyntaxError { message, .. } => Node::syntax_error(message, items),
            _ => rebuild_collection(node.kind(), items),
        }
    }
}

/// A statement reduced to a single nested block or statement is that child.
fn rebuild_collection(kind: NodeKind, items: Vec<Node>) -> Result<Node, InvariantError> {
    if kind == NodeKind::Statement
        && items.len() == 1
        && matches!(items[0].kind(), NodeKind::Block | NodeKind::Statement)
    {
        return Ok(items[0].clone());
    }
    Node::collection(kind, items)
}

/// Editable copy of the slots of a composite.
pub struct CompositeMutator<'a> {
    node: &'a Node,
    slots: Vec<Option<Node>>,
}

impl<'a> CompositeMutator<'a> {
    pub fn new(node: &'a Node) -> Option<Self> {
        let slots = node.slots()?.to_vec();
        Some(Self { node, slots })
    }

    pub fn slots(&self) -> &[Option<Node>] {
        &self.slots
    }

    pub fn raw_slots(&mut self) -> &mut [Option<Node>] {
        &mut self.slots
    }

    /// Replace a slot by schema name. Returns false for an unknown name.
    pub fn set_slot(&mut self, name: &str, node: Option<Node>) -> bool {
        match self.node.kind().slot_index(name) {
            Some(index) => {
                self.slots[index] = node;
                true
            }
            None => false,
        }
    }

    /// Map every present slot; `None` empties it.
    pub fn apply_mutation(&mut self, mut f: impl FnMut(&Node) -> Option<Node>) {
        for slot in &mut self.slots {
            if let Some(node) = slot.take() {
                *slot = f(&node);
            }
        }
    }

    pub fn clone_node(self) -> Result<Node, InvariantError> {
        let Self { node, slots } = self;
        let original = node.slots().unwrap_or_default();
        let unchanged = original.len() == slots.len()
            && original.iter().zip(&slots).all(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a.ptr_eq(b),
                (None, None) => true,
                _ => false,
            });
        if unchanged {
            return Ok(node.clone());
        }
        Node::composite(node.kind(), slots)
    }
}

/// Mutator of any non-leaf node.
pub enum NodeMutator<'a> {
    Collection(CollectionMutator<'a>),
    Composite(CompositeMutator<'a>),
}

impl<'a> NodeMutator<'a> {
    pub fn new(node: &'a Node) -> Option<Self> {
        match node.body() {
            NodeBody::Collection(_) | NodeBody::SyntaxError { .. } => {
                CollectionMutator::new(node).map(Self::Collection)
            }
            NodeBody::Composite(_) => CompositeMutator::new(node).map(Self::Composite),
            _ => None,
        }
    }

    pub fn apply_mutation(&mut self, f: impl FnMut(&Node) -> Option<Node>) {
        match self {
            Self::Collection(m) => m.apply_mutation(f),
            Self::Composite(m) => m.apply_mutation(f),
        }
    }

    pub fn clone_node(self) -> Result<Node, InvariantError> {
        match self {
            Self::Collection(m) => m.clone_node(),
            Self::Composite(m) => m.clone_node(),
        }
    }
}

/// Replace the node with id `target` anywhere under `root` by `replacement`
/// (`None` removes it). Ancestors are rebuilt bottom-up; unrelated subtrees
/// are shared with the original tree.
pub fn replace_descendant(
    root: &Node,
    target: NodeId,
    replacement: Option<Node>,
) -> Result<Option<Node>, InvariantError> {
    if root.id() == target {
        return Ok(replacement);
    }
    if !contains(root, target) {
        return Ok(Some(root.clone()));
    }
    let Some(mut mutator) = root.create_mutator() else {
        return Ok(Some(root.clone()));
    };
    let mut replacement = Some(replacement);
    let mut error = None;
    mutator.apply_mutation(|child| {
        if !contains(child, target) {
            return Some(child.clone());
        }
        match replace_descendant(child, target, replacement.take().flatten()) {
            Ok(node) => node,
            Err(e) => {
                error = Some(e);
                Some(child.clone())
            }
        }
    });
    if let Some(e) = error {
        return Err(e);
    }
    mutator.clone_node().map(Some)
}

fn contains(node: &Node, target: NodeId) -> bool {
    node.id() == target || node.children().any(|c| contains(c, target))
}
