use std::path::PathBuf;

use crate::transform::TransformOptions;

/// Options of a [`TransformSpace`](super::TransformSpace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceOptions {
    pub transform: TransformOptions,
    /// Fail `apply` when any target failed.
    pub warnings_as_errors: bool,
    /// Root of the default file installer.
    pub output_root: PathBuf,
}

impl Default for SpaceOptions {
    fn default() -> Self {
        Self {
            transform: TransformOptions::default(),
            warnings_as_errors: false,
            output_root: PathBuf::from("."),
        }
    }
}

impl SpaceOptions {
    pub fn with_transform(mut self, transform: TransformOptions) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_warnings_as_errors(mut self, value: bool) -> Self {
        self.warnings_as_errors = value;
        self
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }
}
