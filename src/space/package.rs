//! Packages, sources and targets of a space.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::external::ExternalTransformableItem;
use crate::base::ResourceLocator;
use crate::transform::TransformerFunction;

/// Index of a source in its space. Stable until the source is removed.
pub type SourceIndex = usize;

/// A named group of sources with its list of changed sources.
///
/// The dirty list is singly linked through
/// [`TransformableSource::next_dirty`]; new entries go to the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPackage {
    name: SmolStr,
    order: usize,
    pub(super) first_dirty: Option<SourceIndex>,
}

impl TransformPackage {
    pub(super) fn new(name: SmolStr, order: usize) -> Self {
        Self {
            name,
            order,
            first_dirty: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rank of the package: functions of lower ranks apply first.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn has_changes(&self) -> bool {
        self.first_dirty.is_some()
    }
}

/// What a registered resource is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// `*.t`: transformer functions. The language comes from a secondary
    /// extension (`theme.less.t`) when there is one.
    Transformer { language: Option<SmolStr> },
    /// A text in a known language.
    Item { language: SmolStr },
    /// Anything else. Kept so that duplicates are still detected.
    Unmanaged,
}

/// A registered resource.
#[derive(Debug, Clone)]
pub struct TransformableSource {
    locator: ResourceLocator,
    kind: SourceKind,
    text: String,
    pub(super) package: usize,
    pub(super) next_dirty: Option<SourceIndex>,
    pub(super) dirty: bool,
}

impl TransformableSource {
    pub(super) fn new(locator: ResourceLocator, kind: SourceKind, text: String, package: usize) -> Self {
        Self {
            locator,
            kind,
            text,
            package,
            next_dirty: None,
            dirty: false,
        }
    }

    pub fn locator(&self) -> &ResourceLocator {
        &self.locator
    }

    pub fn path(&self) -> &str {
        self.locator.path()
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(super) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Identity of a function in its space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub(super) u32);

/// Application order of functions on one target: package order, then
/// source path, then position in the source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionKey {
    pub package_order: usize,
    pub source: SmolStr,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionState {
    Unbound,
    Resolving,
    Bound,
    Applied,
    Verified,
    Error,
}

impl fmt::Display for FunctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unbound => "unbound",
            Self::Resolving => "resolving",
            Self::Bound => "bound",
            Self::Applied => "applied",
            Self::Verified => "verified",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// A function registered from a transformer source.
#[derive(Debug, Clone)]
pub struct BoundFunction {
    pub(super) function: TransformerFunction,
    pub(super) source: SourceIndex,
    pub(super) key: FunctionKey,
    pub(super) state: FunctionState,
    pub(super) target: Option<String>,
}

impl BoundFunction {
    pub fn function(&self) -> &TransformerFunction {
        &self.function
    }

    pub fn key(&self) -> &FunctionKey {
        &self.key
    }

    pub fn state(&self) -> FunctionState {
        self.state
    }

    /// Target path, once bound.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

/// Where the text of a target comes from.
#[derive(Clone)]
pub enum TargetOrigin {
    /// A source of the space.
    Source(SourceIndex),
    External(Arc<dyn ExternalTransformableItem>),
}

impl fmt::Debug for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(index) => f.debug_tuple("Source").field(index).finish(),
            Self::External(item) => f.debug_tuple("External").field(&item.path()).finish(),
        }
    }
}

/// A target and the functions bound to it, in application order.
#[derive(Debug, Clone)]
pub struct TransformableItem {
    path: String,
    pub(super) origin: TargetOrigin,
    chain: Vec<(FunctionKey, FunctionId)>,
    pub(super) output: Option<String>,
}

impl TransformableItem {
    pub(super) fn new(path: String, origin: TargetOrigin) -> Self {
        Self {
            path,
            origin,
            chain: Vec::new(),
            output: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_external(&self) -> bool {
        matches!(self.origin, TargetOrigin::External(_))
    }

    /// Functions in application order.
    pub fn functions(&self) -> impl Iterator<Item = FunctionId> + '_ {
        self.chain.iter().map(|(_, id)| *id)
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Last verified output.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Where a function with `key` goes in the chain: after every function
    /// that does not sort after it.
    pub fn insertion_index(&self, key: &FunctionKey) -> usize {
        self.chain.partition_point(|(k, _)| k <= key)
    }

    pub(super) fn insert(&mut self, key: FunctionKey, id: FunctionId) {
        let index = self.insertion_index(&key);
        self.chain.insert(index, (key, id));
    }

    pub(super) fn remove(&mut self, id: FunctionId) -> bool {
        let before = self.chain.len();
        self.chain.retain(|(_, f)| *f != id);
        self.chain.len() != before
    }
}
