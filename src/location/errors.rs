use thiserror::Error;

/// Failure to resolve a location into ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("no match")]
    NoMatch,

    #[error("expected a single match, found {count}")]
    Ambiguous { count: usize },

    #[error("match #{offset} requested but only {count} found")]
    NotEnough { offset: usize, count: usize },

    #[error("expected {expected} matches, found {count}")]
    CountMismatch { expected: usize, count: usize },

    #[error("offset must be at least 1, got {offset}")]
    InvalidOffset { offset: usize },

    #[error("'out of {count}' cannot be less than the offset {offset}")]
    InvalidOutOf { offset: usize, count: usize },

    #[error("empty pattern")]
    EmptyPattern,
}
