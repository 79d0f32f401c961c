//! Target languages
//!
//! A [`TransformLanguage`] bundles what the transform engine needs to know
//! about the text it edits: an [`Analyzer`] (tokenizer and top-level parser),
//! the span types usable in `{type}"pattern"` matchers, and optional
//! language-specific statements of the transformer language.
//!
//! ## Languages
//!
//! - [`GenericLanguage`] - C-family statements and blocks
//! - [`LessLanguage`] - adds `@import` statements and `ensure import`
//! - [`TypeScriptLanguage`] - regular expression and template literals

pub mod generic;
pub mod less;
pub mod typescript;

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::core::{Analyzer, InvariantError, Node, NodeKind, Parser, SourceCode};

pub use generic::{CFamilyTokenizer, GenericLanguage};
pub use less::LessLanguage;
pub use typescript::TypeScriptLanguage;

/// `(name, kind)` pairs of the span types of a language.
pub type LanguageSpanTypes = &'static [(&'static str, NodeKind)];

pub trait TransformLanguage: Send + Sync {
    fn name(&self) -> &str;

    /// Extensions (without the dot) of the files written in this language.
    fn file_extensions(&self) -> &[&str];

    fn analyzer(&self) -> &Analyzer;

    fn span_types(&self) -> LanguageSpanTypes;

    fn analyze(&self, text: &str) -> Result<SourceCode, InvariantError> {
        self.analyzer().analyze(text)
    }

    /// Node kind of a span type name (case-insensitive).
    fn span_type(&self, name: &str) -> Option<NodeKind> {
        self.span_types()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, kind)| kind)
    }

    /// Parser of the statements this language adds to the transformer
    /// language.
    fn statement_parser(&self) -> Option<Arc<dyn Parser>> {
        None
    }

    /// Apply one of the statements built by [`statement_parser`] to a whole
    /// tree. `None` when the statement is not handled by this language.
    ///
    /// [`statement_parser`]: TransformLanguage::statement_parser
    fn apply_statement(
        &self,
        _statement: &Node,
        _root: &Node,
        _newline: &str,
    ) -> Option<Result<Node, InvariantError>> {
        None
    }
}

/// Languages by name, with an extension index.
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    languages: IndexMap<SmolStr, Arc<dyn TransformLanguage>>,
    extensions: IndexMap<SmolStr, SmolStr>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generic, Less and TypeScript.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(GenericLanguage::new()));
        registry.register(Arc::new(LessLanguage::new()));
        registry.register(Arc::new(TypeScriptLanguage::new()));
        registry
    }

    /// Add (or replace) a language.
    pub fn register(&mut self, language: Arc<dyn TransformLanguage>) {
        let name = SmolStr::new(language.name().to_ascii_lowercase());
        for ext in language.file_extensions() {
            self.extensions
                .insert(SmolStr::new(ext.to_ascii_lowercase()), name.clone());
        }
        self.languages.insert(name, language);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn TransformLanguage>> {
        self.languages.get(name.to_ascii_lowercase().as_str())
    }

    pub fn by_extension(&self, extension: &str) -> Option<&Arc<dyn TransformLanguage>> {
        let name = self.extensions.get(extension.to_ascii_lowercase().as_str())?;
        self.languages.get(name)
    }

    /// Language of a path, from its last extension.
    pub fn for_path(&self, path: &str) -> Option<&Arc<dyn TransformLanguage>> {
        let file = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = file.rsplit_once('.')?;
        self.by_extension(ext)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(SmolStr::as_str)
    }
}

impl std::fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests;
