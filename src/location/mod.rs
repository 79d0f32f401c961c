//! Location system
//!
//! Addresses parts of an analyzed tree:
//!
//! - [`LocationRoot`] / [`NodeLocation`] - cached cursors with position, depth,
//!   ancestors and leaf navigation
//! - [`LocationRange`] - inclusive range between two locations, and
//!   [`normalize`] which orders ranges and drops coarser duplicates
//! - [`SpanMatcher`] - trivia-insensitive token sequence search
//! - [`LocationCardinality`] - which matches are selected (`single`,
//!   `first +n out of N`, `last -n`, `all N`, `each N`)

mod cardinality;
mod errors;
mod matcher;
mod range;
mod root;

pub use cardinality::{LocationCardinality, Selection};
pub use errors::LocationError;
pub use matcher::SpanMatcher;
pub use range::{LocationRange, normalize};
pub use root::{LocationRoot, LocationStep, NodeLocation};
