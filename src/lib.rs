//! # ck-transform
//!
//! Lossless parsing core and idempotent source-to-source transformation
//! engine.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! space      → Packages, transformable sources, binding, dirty lists, install
//!   ↓
//! transform  → Transformer language, editor, statement engine
//!   ↓
//! languages  → Generic C-family, Less, TypeScript
//!   ↓
//! location   → Node locations, ranges, span matching, cardinality
//!   ↓
//! core       → Tokens, trivia, tokenizer, node tree, parsers
//!   ↓
//! base       → Primitives (ResourceLocator, Position, Span, TextRange)
//! ```
//!
//! ## Example
//!
//! ```
//! use cktransform::base::ResourceLocator;
//! use cktransform::transform::TransformHost;
//!
//! let host = TransformHost::with_defaults();
//! let transformer = "create transformer begin replace \"1\" with \"2\"; end";
//! let origin = ResourceLocator::detached("a.ts.t");
//! let out = host.transform(&origin, transformer, "a.ts", "x = 1;").unwrap();
//! assert_eq!(out, "x = 2;");
//! ```

// ============================================================================
// MODULES (dependency order: base → core → location → languages → transform → space)
// ============================================================================

/// Foundation types: ResourceLocator, Position, Span, TextRange
pub mod base;

/// Lossless tokenizer, node tree and composite parsers
pub mod core;

/// Locations, ranges and span matchers over analyzed trees
pub mod location;

/// Target languages and their registry
pub mod languages;

/// Transformer language and the statement engine
pub mod transform;

/// Multi-package transform space
pub mod space;

// Re-export foundation types
pub use base::{Position, ResourceLocator, Span, TextRange, TextSize};

pub use crate::core::{InvariantError, Node, NodeKind, SourceCode};
pub use crate::languages::{LanguageRegistry, TransformLanguage};
pub use space::{ApplyReport, SpaceError, SpaceOptions, TransformSpace};
pub use transform::{TransformError, TransformHost, TransformOptions};
