//! Transformer functions and the host that parses and applies them.

use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{debug, error, warn};

use super::ast::{AstNode, StatementBlock, TransformerFunctionNode};
use super::engine::{check_syntax, run};
use super::errors::TransformError;
use super::options::TransformOptions;
use super::parser::{transformer_analyzer, transformer_analyzer_for};
use crate::base::ResourceLocator;
use crate::core::{Analyzer, Node};
use crate::languages::{LanguageRegistry, TransformLanguage};

/// Suffix of transformer sources.
pub const TRANSFORMER_EXTENSION: &str = ".t";

/// One `create ... transformer ... begin ... end` of a transformer source.
#[derive(Debug, Clone)]
pub struct TransformerFunction {
    node: TransformerFunctionNode,
    body: StatementBlock,
    language: Option<SmolStr>,
    name: Option<SmolStr>,
    target: Option<String>,
    origin: ResourceLocator,
    index: usize,
}

impl TransformerFunction {
    fn from_node(
        node: TransformerFunctionNode,
        origin: &ResourceLocator,
        index: usize,
    ) -> Option<Self> {
        let body = node.body()?;
        Some(Self {
            language: node.language().map(SmolStr::new),
            name: node.name().map(SmolStr::new),
            target: node.target(),
            body,
            node,
            origin: origin.clone(),
            index,
        })
    }

    pub fn syntax(&self) -> &Node {
        self.node.syntax()
    }

    pub fn body(&self) -> &StatementBlock {
        &self.body
    }

    /// Language named in the header.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Explicit `on "..."` target, as written.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn origin(&self) -> &ResourceLocator {
        &self.origin
    }

    /// Position of the function in its source.
    pub fn index(&self) -> usize {
        self.index
    }

    /// `name` or `origin#index`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.to_string(),
            None => format!("{}#{}", self.origin, self.index),
        }
    }

    /// Text of the function, as written.
    pub fn text(&self) -> String {
        self.node.syntax().full_text()
    }
}

/// Parses transformer sources and applies their functions.
pub struct TransformHost {
    registry: Arc<LanguageRegistry>,
    options: TransformOptions,
    analyzer: Analyzer,
}

impl TransformHost {
    pub fn new(registry: Arc<LanguageRegistry>, options: TransformOptions) -> Self {
        let analyzer = transformer_analyzer(registry.clone());
        Self {
            registry,
            options,
            analyzer,
        }
    }

    /// Host over the built-in languages with default options.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(LanguageRegistry::with_defaults()),
            TransformOptions::default(),
        )
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Parse every function of a transformer source.
    ///
    /// Any syntax error rejects the whole source.
    pub fn parse_functions(
        &self,
        origin: &ResourceLocator,
        text: &str,
    ) -> Result<Vec<TransformerFunction>, TransformError> {
        let source = match self.source_language(origin) {
            Some(language) => {
                let name = SmolStr::new(language.name());
                transformer_analyzer_for(self.registry.clone(), Some(name)).analyze(text)?
            }
            None => self.analyzer.analyze(text)?,
        };
        if let Err(e) = check_syntax(&origin.to_string(), &source) {
            warn!(origin = %origin, error = %e, "transformer source has errors");
            return Err(e);
        }
        let mut functions = Vec::new();
        for (index, node) in source.nodes().iter().enumerate() {
            let Some(function) = TransformerFunctionNode::cast(node.clone())
                .and_then(|n| TransformerFunction::from_node(n, origin, index))
            else {
                continue;
            };
            if let Some(language) = function.language() {
                if self.registry.get(language).is_none() {
                    return Err(TransformError::UnknownLanguage(language.into()));
                }
            }
            functions.push(function);
        }
        debug!(origin = %origin, count = functions.len(), "parsed transformer source");
        Ok(functions)
    }

    /// Language a function edits: the one of its header, else the secondary
    /// extension of its source (`theme.less.t`), else the one of the target
    /// path.
    pub fn language_for(
        &self,
        function: &TransformerFunction,
        target: &str,
    ) -> Result<Arc<dyn TransformLanguage>, TransformError> {
        if let Some(name) = function.language() {
            return self
                .registry
                .get(name)
                .cloned()
                .ok_or_else(|| TransformError::UnknownLanguage(name.into()));
        }
        if let Some(language) = self.source_language(function.origin()) {
            return Ok(language.clone());
        }
        self.registry.for_path(target).cloned().ok_or_else(|| {
            let extension = target.rsplit_once('.').map_or("", |(_, e)| e);
            TransformError::UnknownLanguage(extension.into())
        })
    }

    /// Language named by the secondary extension of a transformer source.
    fn source_language(&self, origin: &ResourceLocator) -> Option<&Arc<dyn TransformLanguage>> {
        origin
            .path()
            .strip_suffix(TRANSFORMER_EXTENSION)
            .and_then(|stem| self.registry.for_path(stem))
    }

    /// Apply one function to a target text.
    ///
    /// With idempotence verification the function is applied again to its
    /// own output, which must not change.
    pub fn apply(
        &self,
        function: &TransformerFunction,
        target: &str,
        text: &str,
    ) -> Result<String, TransformError> {
        let language = self.language_for(function, target)?;
        let origin = function.origin().to_string();
        let once = run(
            &self.registry,
            &self.options,
            &origin,
            target,
            language.clone(),
            function.body(),
            text,
        )?;
        if !self.options.verify_idempotence {
            return Ok(once);
        }
        let twice = run(
            &self.registry,
            &self.options,
            &origin,
            target,
            language,
            function.body(),
            &once,
        )?;
        if twice != once {
            error!(origin = %origin, target, function = %function.display_name(), "not idempotent");
            return Err(TransformError::Idempotence {
                origin,
                first: once,
                second: twice,
            });
        }
        Ok(once)
    }

    /// Apply functions in order. The first failure aborts the chain.
    pub fn apply_all<'a>(
        &self,
        functions: impl IntoIterator<Item = &'a TransformerFunction>,
        target: &str,
        text: &str,
    ) -> Result<String, TransformError> {
        let mut current = text.to_string();
        for function in functions {
            current = self.apply(function, target, &current)?;
        }
        Ok(current)
    }

    /// Parse `transformer` and apply all its functions to `text`.
    pub fn transform(
        &self,
        origin: &ResourceLocator,
        transformer: &str,
        target: &str,
        text: &str,
    ) -> Result<String, TransformError> {
        let functions = self.parse_functions(origin, transformer)?;
        self.apply_all(&functions, target, text)
    }
}

impl std::fmt::Debug for TransformHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformHost")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}
