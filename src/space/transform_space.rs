//! The transform space: registered sources, bound functions, outputs.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use smol_str::SmolStr;
use tracing::{debug, error, info, trace};

use super::errors::{ApplyFailure, RegistrationError, SpaceError};
use super::external::ExternalItemResolver;
use super::install::{FileInstaller, InstallHook, InstallerChain};
use super::options::SpaceOptions;
use super::package::{
    BoundFunction, FunctionId, FunctionKey, FunctionState, SourceIndex, SourceKind, TargetOrigin,
    TransformPackage, TransformableItem, TransformableSource,
};
use crate::base::{ResourceLocator, normalize_path};
use crate::languages::LanguageRegistry;
pub use crate::transform::TRANSFORMER_EXTENSION;
use crate::transform::{TransformError, TransformHost, TransformerFunction};

/// Outcome of [`TransformSpace::apply`] and [`TransformSpace::apply_changes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Targets whose whole chain succeeded.
    pub applied: usize,
    /// Targets whose output differed from their input and was installed.
    pub installed: Vec<String>,
    /// Targets left as they were.
    pub unchanged: Vec<String>,
    pub failures: Vec<ApplyFailure>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns every registered source and the functions they define.
///
/// Sources are registered with [`register`](Self::register), changed with
/// [`on_tracked_change`](Self::on_tracked_change) and removed with
/// [`remove`](Self::remove). [`apply`](Self::apply) transforms every target;
/// [`apply_changes`](Self::apply_changes) only those affected by changes
/// since the last application.
pub struct TransformSpace {
    options: SpaceOptions,
    host: TransformHost,
    packages: IndexMap<SmolStr, TransformPackage>,
    sources: Vec<Option<TransformableSource>>,
    by_path: IndexMap<String, SourceIndex>,
    functions: IndexMap<FunctionId, BoundFunction>,
    items: IndexMap<String, TransformableItem>,
    /// Targets that lost functions since the last application.
    stale: IndexSet<String>,
    resolver: Option<Arc<dyn ExternalItemResolver>>,
    installers: InstallerChain,
    next_function: u32,
}

/// Result of one target's chain, computed off the space.
struct Outcome {
    target: String,
    functions: Vec<FunctionId>,
    result: Result<Option<String>, ApplyFailure>,
}

impl TransformSpace {
    pub fn new(options: SpaceOptions) -> Self {
        Self::with_registry(options, Arc::new(LanguageRegistry::with_defaults()))
    }

    pub fn with_registry(options: SpaceOptions, registry: Arc<LanguageRegistry>) -> Self {
        let host = TransformHost::new(registry, options.transform.clone());
        let installers = InstallerChain::new(FileInstaller::new(options.output_root.clone()));
        Self {
            options,
            host,
            packages: IndexMap::new(),
            sources: Vec::new(),
            by_path: IndexMap::new(),
            functions: IndexMap::new(),
            items: IndexMap::new(),
            stale: IndexSet::new(),
            resolver: None,
            installers,
            next_function: 0,
        }
    }

    pub fn options(&self) -> &SpaceOptions {
        &self.options
    }

    pub fn host(&self) -> &TransformHost {
        &self.host
    }

    pub fn set_resolver(&mut self, resolver: Arc<dyn ExternalItemResolver>) {
        self.resolver = Some(resolver);
    }

    /// Hooks are tried in the order they are added, before the file
    /// installer.
    pub fn add_install_hook(&mut self, hook: Arc<dyn InstallHook>) {
        self.installers.push(hook);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Declare a package. Packages declared first apply first; undeclared
    /// packages are declared on first registration.
    pub fn add_package(&mut self, name: &str) -> &TransformPackage {
        let order = self.packages.len();
        self.packages
            .entry(SmolStr::new(name))
            .or_insert_with(|| TransformPackage::new(SmolStr::new(name), order))
    }

    pub fn package(&self, name: &str) -> Option<&TransformPackage> {
        self.packages.get(name)
    }

    pub fn packages(&self) -> impl Iterator<Item = &TransformPackage> {
        self.packages.values()
    }

    pub fn source(&self, path: &str) -> Option<&TransformableSource> {
        let index = *self.by_path.get(normalize_path(path).as_str())?;
        self.source_at(index)
    }

    pub fn sources(&self) -> impl Iterator<Item = &TransformableSource> {
        self.sources.iter().flatten()
    }

    pub fn item(&self, path: &str) -> Option<&TransformableItem> {
        self.items.get(normalize_path(path).as_str())
    }

    pub fn function(&self, id: FunctionId) -> Option<&BoundFunction> {
        self.functions.get(&id)
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &BoundFunction)> {
        self.functions.iter().map(|(id, f)| (*id, f))
    }

    /// Paths in the dirty list of a package, most recent first.
    pub fn dirty_sources(&self, package: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut cursor = self.packages.get(package).and_then(|p| p.first_dirty);
        while let Some(index) = cursor {
            let Some(source) = self.source_at(index) else {
                break;
            };
            out.push(source.path());
            cursor = source.next_dirty;
        }
        out
    }

    /// Kind of a resource, from its path.
    pub fn classify(&self, path: &str) -> SourceKind {
        let registry = self.host.registry();
        if let Some(stem) = path.strip_suffix(TRANSFORMER_EXTENSION) {
            let language = registry.for_path(stem).map(|l| SmolStr::new(l.name()));
            return SourceKind::Transformer { language };
        }
        match registry.for_path(path) {
            Some(language) => SourceKind::Item {
                language: SmolStr::new(language.name()),
            },
            None => SourceKind::Unmanaged,
        }
    }

    fn source_at(&self, index: SourceIndex) -> Option<&TransformableSource> {
        self.sources.get(index).and_then(Option::as_ref)
    }

    fn source_at_mut(&mut self, index: SourceIndex) -> Option<&mut TransformableSource> {
        self.sources.get_mut(index).and_then(Option::as_mut)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Add a resource. A path can only be registered once across all
    /// packages.
    pub fn register(
        &mut self,
        locator: ResourceLocator,
        text: impl Into<String>,
    ) -> Result<SourceKind, RegistrationError> {
        let path = locator.path().to_string();
        if let Some(first) = self.by_path.get(&path).and_then(|&i| self.source_at(i)) {
            let error = RegistrationError::DuplicatePath {
                path,
                first: first.locator().to_string(),
                second: locator.to_string(),
            };
            error!(%error, "duplicate registration");
            return Err(error);
        }
        let text = text.into();
        let kind = self.classify(&path);
        let functions = match kind {
            SourceKind::Transformer { .. } => self
                .host
                .parse_functions(&locator, &text)
                .map_err(RegistrationError::Syntax)?,
            _ => Vec::new(),
        };
        let package = self.add_package(locator.package()).order();
        let index = self.sources.len();
        debug!(path = %path, package = locator.package(), kind = ?kind, functions = functions.len(), "register");
        self.sources.push(Some(TransformableSource::new(
            locator,
            kind.clone(),
            text,
            package,
        )));
        self.by_path.insert(path, index);
        self.add_functions(index, functions);
        self.mark_dirty(index);
        Ok(kind)
    }

    /// Record a new text for a registered resource and put it in the dirty
    /// list of its package. Returns false when the text did not change.
    pub fn on_tracked_change(
        &mut self,
        path: &str,
        text: impl Into<String>,
    ) -> Result<bool, RegistrationError> {
        let path = normalize_path(path);
        let index = *self
            .by_path
            .get(&path)
            .ok_or_else(|| RegistrationError::UnknownSource(path.clone()))?;
        let text = text.into();
        let Some(source) = self.source_at(index) else {
            return Err(RegistrationError::UnknownSource(path));
        };
        if source.text() == text {
            return Ok(false);
        }
        let functions = match source.kind() {
            SourceKind::Transformer { .. } => Some(
                self.host
                    .parse_functions(source.locator(), &text)
                    .map_err(RegistrationError::Syntax)?,
            ),
            _ => None,
        };
        if let Some(functions) = functions {
            self.remove_functions(index);
            self.add_functions(index, functions);
        }
        if let Some(source) = self.source_at_mut(index) {
            source.set_text(text);
        }
        self.mark_dirty(index);
        trace!(path = %path, "tracked change");
        Ok(true)
    }

    /// Unregister a resource. Functions targeting it become unbound.
    pub fn remove(&mut self, path: &str) -> Result<(), RegistrationError> {
        let path = normalize_path(path);
        let index = self
            .by_path
            .shift_remove(&path)
            .ok_or_else(|| RegistrationError::UnknownSource(path.clone()))?;
        self.unlink_dirty(index);
        self.remove_functions(index);
        let orphaned: Vec<String> = self
            .items
            .iter()
            .filter(|(_, item)| matches!(item.origin, TargetOrigin::Source(i) if i == index))
            .map(|(p, _)| p.clone())
            .collect();
        for target in orphaned {
            let Some(item) = self.items.shift_remove(&target) else {
                continue;
            };
            for id in item.functions() {
                if let Some(bound) = self.functions.get_mut(&id) {
                    bound.target = None;
                    bound.state = FunctionState::Unbound;
                }
            }
        }
        self.sources[index] = None;
        debug!(path = %path, "removed");
        Ok(())
    }

    fn add_functions(&mut self, index: SourceIndex, functions: Vec<TransformerFunction>) {
        let Some(source) = self.source_at(index) else {
            return;
        };
        let package_order = source.package;
        let path = SmolStr::new(source.path());
        for function in functions {
            let id = FunctionId(self.next_function);
            self.next_function += 1;
            let key = FunctionKey {
                package_order,
                source: path.clone(),
                index: function.index(),
            };
            self.functions.insert(
                id,
                BoundFunction {
                    function,
                    source: index,
                    key,
                    state: FunctionState::Unbound,
                    target: None,
                },
            );
        }
    }

    fn remove_functions(&mut self, index: SourceIndex) {
        let ids: Vec<FunctionId> = self
            .functions
            .iter()
            .filter(|(_, f)| f.source == index)
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            let Some(bound) = self.functions.shift_remove(&id) else {
                continue;
            };
            if let Some(target) = bound.target {
                if let Some(item) = self.items.get_mut(&target) {
                    item.remove(id);
                }
                self.stale.insert(target);
            }
        }
    }

    // ========================================================================
    // Dirty lists
    // ========================================================================

    /// Push a source to the front of its package's dirty list.
    fn mark_dirty(&mut self, index: SourceIndex) -> bool {
        let Some(source) = self.sources.get_mut(index).and_then(Option::as_mut) else {
            return false;
        };
        if source.dirty {
            return false;
        }
        let Some((_, package)) = self.packages.get_index_mut(source.package) else {
            return false;
        };
        source.next_dirty = package.first_dirty;
        source.dirty = true;
        package.first_dirty = Some(index);
        true
    }

    fn unlink_dirty(&mut self, index: SourceIndex) {
        let Some(source) = self.source_at(index) else {
            return;
        };
        if !source.dirty {
            return;
        }
        let (package, next) = (source.package, source.next_dirty);
        let Some((_, list)) = self.packages.get_index_mut(package) else {
            return;
        };
        if list.first_dirty == Some(index) {
            list.first_dirty = next;
        } else {
            let mut cursor = list.first_dirty;
            while let Some(current) = cursor {
                let Some(previous) = self.sources.get_mut(current).and_then(Option::as_mut) else {
                    break;
                };
                if previous.next_dirty == Some(index) {
                    previous.next_dirty = next;
                    break;
                }
                cursor = previous.next_dirty;
            }
        }
        if let Some(source) = self.source_at_mut(index) {
            source.dirty = false;
            source.next_dirty = None;
        }
    }

    /// Empty the dirty list of every package and return its sources.
    fn drain_dirty(&mut self) -> Vec<SourceIndex> {
        let mut drained = Vec::new();
        for package in 0..self.packages.len() {
            let Some((name, list)) = self.packages.get_index_mut(package) else {
                continue;
            };
            let mut cursor = list.first_dirty.take();
            let name = name.clone();
            let start = drained.len();
            while let Some(index) = cursor {
                let Some(source) = self.sources.get_mut(index).and_then(Option::as_mut) else {
                    break;
                };
                cursor = source.next_dirty.take();
                source.dirty = false;
                drained.push(index);
            }
            if drained.len() > start {
                debug!(package = %name, count = drained.len() - start, "drained dirty list");
            }
        }
        drained
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Bind every function that has no target yet. Returns the functions
    /// that could not be bound.
    pub fn bind(&mut self) -> Vec<ApplyFailure> {
        let pending: Vec<FunctionId> = self
            .functions
            .iter()
            .filter(|(_, f)| f.target.is_none())
            .map(|(id, _)| *id)
            .collect();
        pending
            .into_iter()
            .filter_map(|id| self.bind_function(id).err())
            .collect()
    }

    fn bind_function(&mut self, id: FunctionId) -> Result<(), ApplyFailure> {
        let Some(bound) = self.functions.get_mut(&id) else {
            return Ok(());
        };
        bound.state = FunctionState::Resolving;
        let (function, source, key) = (bound.function.clone(), bound.source, bound.key.clone());
        let path = self.target_path(&function, source);
        let resolved = path
            .as_deref()
            .ok_or_else(|| unresolved(&function, "", "no target"))
            .and_then(|path| self.resolve_target(&function, path));
        let bound = self.functions.get_mut(&id);
        match resolved {
            Ok(origin) => {
                let path = path.unwrap_or_default();
                self.items
                    .entry(path.clone())
                    .or_insert_with(|| TransformableItem::new(path.clone(), origin))
                    .insert(key, id);
                trace!(function = %function.display_name(), target = %path, "bound");
                if let Some(bound) = bound {
                    bound.state = FunctionState::Bound;
                    bound.target = Some(path);
                }
                Ok(())
            }
            Err(error) => {
                if let Some(bound) = bound {
                    bound.state = FunctionState::Error;
                }
                let target = path.unwrap_or_default();
                error!(function = %function.display_name(), target = %target, %error, "binding failed");
                Err(ApplyFailure {
                    target,
                    function: function.display_name(),
                    error,
                })
            }
        }
    }

    /// `on "x"` relative to the folder of the source, else the source path
    /// without `.t`.
    fn target_path(&self, function: &TransformerFunction, source: SourceIndex) -> Option<String> {
        let source = self.source_at(source)?;
        match function.target() {
            Some(target) if source.locator().folder().is_empty() => Some(normalize_path(target)),
            Some(target) => Some(normalize_path(&format!(
                "{}/{}",
                source.locator().folder(),
                target
            ))),
            None => source
                .path()
                .strip_suffix(TRANSFORMER_EXTENSION)
                .map(str::to_string),
        }
    }

    fn resolve_target(
        &self,
        function: &TransformerFunction,
        path: &str,
    ) -> Result<TargetOrigin, TransformError> {
        let origin = if path.starts_with("../") {
            let resolver = self
                .resolver
                .as_ref()
                .ok_or_else(|| unresolved(function, path, "no resolver for external targets"))?;
            let item = resolver
                .resolve(path)
                .ok_or_else(|| unresolved(function, path, "external target not found"))?;
            TargetOrigin::External(item)
        } else {
            match self.by_path.get(path).and_then(|&i| Some((i, self.source_at(i)?))) {
                Some((index, source)) if matches!(source.kind(), SourceKind::Item { .. }) => {
                    TargetOrigin::Source(index)
                }
                Some(_) => return Err(unresolved(function, path, "target is not transformable")),
                None => return Err(unresolved(function, path, "target not found")),
            }
        };
        self.host.language_for(function, path)?;
        Ok(origin)
    }

    // ========================================================================
    // Application
    // ========================================================================

    /// Bind, then transform every target and install the changed outputs.
    pub fn apply(&mut self) -> Result<ApplyReport, SpaceError> {
        let failures = self.bind();
        let targets: Vec<String> = self.items.keys().cloned().collect();
        self.drain_dirty();
        self.stale.clear();
        info!(targets = targets.len(), "apply");
        self.apply_targets(targets, failures)
    }

    /// Transform only the targets affected by changes since the last
    /// application.
    pub fn apply_changes(&mut self) -> Result<ApplyReport, SpaceError> {
        let drained = self.drain_dirty();
        let failures = self.bind();
        let mut targets: IndexSet<String> = std::mem::take(&mut self.stale);
        for index in drained {
            let Some(source) = self.source_at(index) else {
                continue;
            };
            match source.kind() {
                SourceKind::Item { .. } if self.items.contains_key(source.path()) => {
                    targets.insert(source.path().to_string());
                }
                SourceKind::Transformer { .. } => {
                    targets.extend(
                        self.functions
                            .values()
                            .filter(|f| f.source == index)
                            .filter_map(|f| f.target.clone()),
                    );
                }
                _ => {}
            }
        }
        debug!(targets = targets.len(), "apply changes");
        self.apply_targets(targets.into_iter().collect(), failures)
    }

    fn apply_targets(
        &mut self,
        targets: Vec<String>,
        mut failures: Vec<ApplyFailure>,
    ) -> Result<ApplyReport, SpaceError> {
        let outcomes = self.compute(&targets);
        let state = if self.options.transform.verify_idempotence {
            FunctionState::Verified
        } else {
            FunctionState::Applied
        };
        let mut report = ApplyReport::default();
        for outcome in outcomes {
            let Outcome {
                target,
                functions,
                result,
            } = outcome;
            match result {
                Ok(output) => {
                    self.set_states(&functions, state);
                    report.applied += 1;
                    match output {
                        Some(text) => {
                            self.install(&target, &text)?;
                            if let Some(item) = self.items.get_mut(&target) {
                                item.output = Some(text);
                            }
                            report.installed.push(target);
                        }
                        None => report.unchanged.push(target),
                    }
                }
                Err(failure) => {
                    if let TransformError::Invariant(e) = &failure.error {
                        return Err(SpaceError::Invariant(e.clone()));
                    }
                    self.set_states(&functions, FunctionState::Error);
                    error!(
                        target = %failure.target,
                        function = %failure.function,
                        error = %failure.error,
                        "transform failed"
                    );
                    failures.push(failure);
                }
            }
        }
        report.failures = failures;
        if self.options.warnings_as_errors && !report.failures.is_empty() {
            return Err(SpaceError::TransformFailed {
                failures: report.failures,
            });
        }
        Ok(report)
    }

    /// Run the chains of `targets` in parallel. Nothing is installed here.
    fn compute(&self, targets: &[String]) -> Vec<Outcome> {
        let work: Vec<(&str, &str, Vec<(FunctionId, &TransformerFunction)>)> = targets
            .iter()
            .filter_map(|path| {
                let item = self.items.get(path)?;
                if item.is_empty() {
                    return None;
                }
                let text = match &item.origin {
                    TargetOrigin::Source(index) => self.source_at(*index)?.text(),
                    TargetOrigin::External(external) => external.initial_text(),
                };
                let chain = item
                    .functions()
                    .filter_map(|id| Some((id, &self.functions.get(&id)?.function)))
                    .collect();
                Some((path.as_str(), text, chain))
            })
            .collect();
        let host = &self.host;
        work.par_iter()
            .map(|(target, text, chain)| {
                let functions: Vec<FunctionId> = chain.iter().map(|(id, _)| *id).collect();
                let mut current = text.to_string();
                for (_, function) in chain {
                    match host.apply(function, target, &current) {
                        Ok(next) => current = next,
                        Err(error) => {
                            return Outcome {
                                target: target.to_string(),
                                functions,
                                result: Err(ApplyFailure {
                                    target: target.to_string(),
                                    function: function.display_name(),
                                    error,
                                }),
                            };
                        }
                    }
                }
                let changed = current != *text;
                Outcome {
                    target: target.to_string(),
                    functions,
                    result: Ok(changed.then_some(current)),
                }
            })
            .collect()
    }

    fn set_states(&mut self, functions: &[FunctionId], state: FunctionState) {
        for id in functions {
            if let Some(bound) = self.functions.get_mut(id) {
                bound.state = state;
            }
        }
    }

    fn install(&self, target: &str, text: &str) -> Result<(), SpaceError> {
        match self.items.get(target).map(|item| &item.origin) {
            Some(TargetOrigin::External(item)) => item.install(text)?,
            _ => self.installers.install(target, text)?,
        }
        debug!(target, "installed");
        Ok(())
    }
}

fn unresolved(function: &TransformerFunction, path: &str, reason: &str) -> TransformError {
    TransformError::Resolution {
        origin: function.origin().to_string(),
        location: path.to_string(),
        reason: reason.to_string(),
    }
}

impl std::fmt::Debug for TransformSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformSpace")
            .field("packages", &self.packages.len())
            .field("sources", &self.by_path.len())
            .field("functions", &self.functions.len())
            .field("items", &self.items.len())
            .finish()
    }
}
