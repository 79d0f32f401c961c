use smol_str::SmolStr;
use thiserror::Error;

use crate::core::InvariantError;
use crate::transform::TransformError;

/// Failure to add or update a source of the space.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("'{path}' is registered by both {first} and {second}")]
    DuplicatePath {
        path: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    Syntax(TransformError),

    #[error("unknown source '{0}'")]
    UnknownSource(String),

    #[error("unknown package '{0}'")]
    UnknownPackage(SmolStr),
}

#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("install of '{path}' rejected: {reason}")]
    Rejected { path: String, reason: String },
}

/// A function chain that could not be applied to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub target: String,
    pub function: String,
    pub error: TransformError,
}

impl std::fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.target, self.function, self.error)
    }
}

#[derive(Debug, Error)]
pub enum SpaceError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error("{} target(s) failed to transform", failures.len())]
    TransformFailed { failures: Vec<ApplyFailure> },
}
