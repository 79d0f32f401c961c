//! Foundation types for the transform toolchain.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - [`LineIndex`] - Byte offset to line/column conversion
//! - [`Position`], [`Span`] - Line/column positions for diagnostics
//! - [`ResourceLocator`] - Opaque provenance of a resource (normalized path)
//!
//! This module has NO dependencies on other crate modules.

mod locator;
mod position;

pub use locator::{ResourceLocator, normalize_path};
pub use position::{LineIndex, Position, Span};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};

#[cfg(test)]
mod tests;
