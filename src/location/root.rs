//! Lazily materialized locations over one tree.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use text_size::{TextRange, TextSize};

use crate::core::{Node, NodeId, NodeKind};

#[derive(Debug)]
struct LocationData {
    node: Node,
    /// Index of the first leaf covered by the node.
    position: usize,
    /// Byte offset of the node's full text (leading trivia included).
    offset: usize,
    depth: usize,
    /// Index among the parent's present children.
    index: usize,
    parent: Option<Arc<LocationData>>,
}

struct RootData {
    root: Arc<LocationData>,
    dense_limit: usize,
    cache: Mutex<FxHashMap<NodeId, Arc<LocationData>>>,
    dense: Mutex<Option<Arc<[Arc<LocationData>]>>>,
}

/// Entry point for locations in one tree. Cheap to clone.
///
/// Locations are cached per node id. When the tree has at most
/// `dense_limit` leaves, the leaf locations are also kept in a dense vector
/// indexed by position.
#[derive(Clone)]
pub struct LocationRoot(Arc<RootData>);

/// One step of a navigation: a location or one of the input boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationStep {
    BegOfInput,
    Location(NodeLocation),
    EndOfInput,
}

impl LocationStep {
    pub fn location(self) -> Option<NodeLocation> {
        match self {
            Self::Location(location) => Some(location),
            _ => None,
        }
    }
}

impl LocationRoot {
    pub fn new(root: Node, dense_limit: usize) -> Self {
        let data = Arc::new(LocationData {
            node: root,
            position: 0,
            offset: 0,
            depth: 0,
            index: 0,
            parent: None,
        });
        let mut cache = FxHashMap::default();
        cache.insert(data.node.id(), data.clone());
        Self(Arc::new(RootData {
            root: data,
            dense_limit,
            cache: Mutex::new(cache),
            dense: Mutex::new(None),
        }))
    }

    pub fn node(&self) -> &Node {
        &self.0.root.node
    }

    pub fn root_location(&self) -> NodeLocation {
        self.wrap(self.0.root.clone())
    }

    /// Number of leaves of the tree (end-of-input included).
    pub fn width(&self) -> usize {
        self.node().width()
    }

    fn wrap(&self, data: Arc<LocationData>) -> NodeLocation {
        NodeLocation {
            root: self.clone(),
            data,
        }
    }

    /// Cached location of the `index`-th present child of `parent`.
    fn child_data(&self, parent: &Arc<LocationData>, index: usize) -> Option<Arc<LocationData>> {
        let mut position = parent.position;
        let mut offset = parent.offset;
        for (i, child) in parent.node.children().enumerate() {
            if i == index {
                let mut cache = self.0.cache.lock();
                let data = cache.entry(child.id()).or_insert_with(|| {
                    Arc::new(LocationData {
                        node: child.clone(),
                        position,
                        offset,
                        depth: parent.depth + 1,
                        index,
                        parent: Some(parent.clone()),
                    })
                });
                return Some(data.clone());
            }
            position += child.width();
            offset += child.text_len();
        }
        None
    }

    /// Location of a node of this tree.
    pub fn location_of(&self, node: &Node) -> Option<NodeLocation> {
        if let Some(data) = self.0.cache.lock().get(&node.id()) {
            return Some(self.wrap(data.clone()));
        }
        let mut path = Vec::new();
        if !find_path(self.node(), node.id(), &mut path) {
            return None;
        }
        let mut data = self.0.root.clone();
        for index in path.into_iter().rev() {
            data = self.child_data(&data, index)?;
        }
        Some(self.wrap(data))
    }

    /// Deepest leaf at `position`.
    pub fn location_at(&self, position: usize) -> Option<NodeLocation> {
        if position >= self.width() {
            return None;
        }
        if let Some(dense) = self.dense() {
            return dense.get(position).map(|d| self.wrap(d.clone()));
        }
        let mut data = self.0.root.clone();
        loop {
            let mut start = data.position;
            let mut next = None;
            for (index, child) in data.node.children().enumerate() {
                let end = start + child.width();
                if position < end {
                    next = Some(index);
                    break;
                }
                start = end;
            }
            match next {
                Some(index) => data = self.child_data(&data, index)?,
                None => return Some(self.wrap(data)),
            }
        }
    }

    /// Every leaf location, in order.
    pub fn leaves(&self) -> Vec<NodeLocation> {
        if let Some(dense) = self.dense() {
            return dense.iter().map(|d| self.wrap(d.clone())).collect();
        }
        let mut out = Vec::with_capacity(self.width());
        self.collect_leaves(&self.0.root.clone(), &mut out);
        out.into_iter().map(|d| self.wrap(d)).collect()
    }

    fn collect_leaves(&self, data: &Arc<LocationData>, out: &mut Vec<Arc<LocationData>>) {
        if data.node.leaf_token().is_some() {
            out.push(data.clone());
            return;
        }
        let count = data.node.children().count();
        for index in 0..count {
            if let Some(child) = self.child_data(data, index) {
                if child.node.width() > 0 {
                    self.collect_leaves(&child, out);
                }
            }
        }
    }

    fn dense(&self) -> Option<Arc<[Arc<LocationData>]>> {
        if self.width() > self.0.dense_limit {
            return None;
        }
        if let Some(dense) = self.0.dense.lock().as_ref() {
            return Some(dense.clone());
        }
        let mut leaves = Vec::with_capacity(self.width());
        self.collect_leaves(&self.0.root.clone(), &mut leaves);
        let dense: Arc<[Arc<LocationData>]> = leaves.into();
        *self.0.dense.lock() = Some(dense.clone());
        Some(dense)
    }
}

fn find_path(node: &Node, target: NodeId, path: &mut Vec<usize>) -> bool {
    if node.id() == target {
        return true;
    }
    for (index, child) in node.children().enumerate() {
        if find_path(child, target, path) {
            path.push(index);
            return true;
        }
    }
    false
}

/// A node and its position in the tree.
#[derive(Clone)]
pub struct NodeLocation {
    root: LocationRoot,
    data: Arc<LocationData>,
}

impl NodeLocation {
    pub fn root(&self) -> &LocationRoot {
        &self.root
    }

    pub fn node(&self) -> &Node {
        &self.data.node
    }

    pub fn kind(&self) -> NodeKind {
        self.data.node.kind()
    }

    /// Index of the first covered leaf.
    pub fn position(&self) -> usize {
        self.data.position
    }

    /// Index after the last covered leaf.
    pub fn end_position(&self) -> usize {
        self.data.position + self.data.node.width()
    }

    pub fn depth(&self) -> usize {
        self.data.depth
    }

    /// Bytes of the node, trivia included.
    pub fn full_range(&self) -> TextRange {
        range(self.data.offset, self.data.offset + self.data.node.text_len())
    }

    /// Bytes from the first token text to the last token text (outer trivia
    /// excluded).
    pub fn token_range(&self) -> TextRange {
        let node = &self.data.node;
        let start = self.data.offset + node.first_token().map_or(0, |t| t.leading_len());
        let end = self.data.offset + node.text_len() - node.last_token().map_or(0, |t| t.trailing_len());
        range(start, end.max(start))
    }

    pub fn parent(&self) -> Option<NodeLocation> {
        self.data.parent.clone().map(|p| self.root.wrap(p))
    }

    /// Parent, grand-parent... up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeLocation> + '_ {
        std::iter::successors(self.parent(), |l| l.parent())
    }

    /// Closest strict ancestor of the given kind.
    pub fn ancestor_of_kind(&self, kind: NodeKind) -> Option<NodeLocation> {
        self.ancestors().find(|l| l.kind() == kind)
    }

    pub fn child(&self, index: usize) -> Option<NodeLocation> {
        self.root
            .child_data(&self.data, index)
            .map(|d| self.root.wrap(d))
    }

    pub fn children(&self) -> Vec<NodeLocation> {
        let count = self.data.node.children().count();
        (0..count).filter_map(|i| self.child(i)).collect()
    }

    /// Deepest leaf before this node.
    pub fn predecessor(&self) -> LocationStep {
        match self.position().checked_sub(1) {
            None => LocationStep::BegOfInput,
            Some(p) => self
                .root
                .location_at(p)
                .map_or(LocationStep::BegOfInput, LocationStep::Location),
        }
    }

    /// Deepest leaf after this node.
    pub fn successor(&self) -> LocationStep {
        self.root
            .location_at(self.end_position())
            .map_or(LocationStep::EndOfInput, LocationStep::Location)
    }

    /// Previous sibling, or the raw predecessor of the parent.
    pub fn raw_predecessor(&self) -> LocationStep {
        let Some(parent) = self.parent() else {
            return LocationStep::BegOfInput;
        };
        match self.data.index.checked_sub(1).and_then(|i| parent.child(i)) {
            Some(sibling) => LocationStep::Location(sibling),
            None => parent.raw_predecessor(),
        }
    }

    /// Next sibling, or the raw successor of the parent.
    pub fn raw_successor(&self) -> LocationStep {
        let Some(parent) = self.parent() else {
            return LocationStep::EndOfInput;
        };
        match parent.child(self.data.index + 1) {
            Some(sibling) => LocationStep::Location(sibling),
            None => parent.raw_successor(),
        }
    }

    /// Order by start position, then by depth. With `parent_is_greater` an
    /// ancestor sorts after its descendants starting at the same leaf.
    pub fn compare_to(&self, other: &NodeLocation, parent_is_greater: bool) -> Ordering {
        self.position()
            .cmp(&other.position())
            .then_with(|| depth_order(self.depth(), other.depth(), parent_is_greater))
    }

    /// Same as [`compare_to`](Self::compare_to) on end positions.
    pub fn compare_end(&self, other: &NodeLocation, parent_is_greater: bool) -> Ordering {
        self.end_position()
            .cmp(&other.end_position())
            .then_with(|| depth_order(self.depth(), other.depth(), parent_is_greater))
    }

    /// Whether `other` lies inside this node (or is this node).
    pub fn contains(&self, other: &NodeLocation) -> bool {
        self.position() <= other.position()
            && other.end_position() <= self.end_position()
            && self.depth() <= other.depth()
    }
}

fn depth_order(depth: usize, other: usize, parent_is_greater: bool) -> Ordering {
    let by_depth = other.cmp(&depth);
    if parent_is_greater { by_depth } else { by_depth.reverse() }
}

fn range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32))
}

impl PartialEq for NodeLocation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root.0, &other.root.0) && self.data.node.id() == other.data.node.id()
    }
}

impl fmt::Debug for NodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}..{} depth {}",
            self.kind(),
            self.position(),
            self.end_position(),
            self.depth()
        )
    }
}
