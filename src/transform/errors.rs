use smol_str::SmolStr;
use thiserror::Error;

use crate::base::Span;
use crate::core::InvariantError;

/// Failure of the transform engine.
///
/// Everything but [`Invariant`](TransformError::Invariant) is a data error:
/// it aborts the functions of one target and leaves its text untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{origin}:{span}: {message}")]
    Syntax {
        origin: String,
        span: Span,
        message: String,
    },

    #[error("unknown language '{0}'")]
    UnknownLanguage(SmolStr),

    #[error("{origin}: cannot resolve {location}: {reason}")]
    Resolution {
        origin: String,
        location: String,
        reason: String,
    },

    #[error("{origin}: injection point <{marker}>: {reason}")]
    Marker {
        origin: String,
        marker: SmolStr,
        reason: String,
    },

    #[error("{origin}: '{statement}' is not supported by language '{language}'")]
    Unsupported {
        origin: String,
        statement: String,
        language: SmolStr,
    },

    #[error("{origin}: transformation is not idempotent")]
    Idempotence {
        origin: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

impl TransformError {
    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }
}
