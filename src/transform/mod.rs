//! Transformer language and engine
//!
//! A transformer source holds functions written in a small language:
//!
//! ```text
//! create less transformer on "theme.less"
//! begin
//!     ensure import (reference) 'mixins.less';
//!     in {block} ".header" begin
//!         inject "color: red;" after "margin: 0;";
//!     end
//!     inject "@import 'extra.less';" into <Imports/>;
//! end
//! ```
//!
//! [`TransformHost`] parses sources into [`TransformerFunction`]s and applies
//! them to target texts. Every edit is a text substitution on the target, so
//! formatting outside the edited spans is preserved. A function must be
//! idempotent: applied to its own output it changes nothing.

pub mod ast;
pub mod editor;
mod engine;
pub mod errors;
pub mod function;
pub mod options;
pub mod parser;
pub mod tokenizer;

pub use editor::{SourceCodeEditor, TextEdit};
pub use errors::TransformError;
pub use function::{TRANSFORMER_EXTENSION, TransformHost, TransformerFunction};
pub use options::TransformOptions;
pub use parser::{transformer_analyzer, transformer_analyzer_for};
pub use tokenizer::{TransformerTokenizer, string_value};

#[cfg(test)]
mod tests;
