/// Options of the transform engine.
///
/// Passed explicitly to every application: there is no process-wide
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Line break used in generated text (injection regions, imports).
    pub newline: String,
    /// Apply every function a second time and require a no-op.
    pub verify_idempotence: bool,
    /// Trees with at most this many leaves keep a dense leaf cache.
    pub max_dense_cache: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            newline: "\n".to_string(),
            verify_idempotence: true,
            max_dense_cache: 4096,
        }
    }
}

impl TransformOptions {
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    pub fn with_verify_idempotence(mut self, verify: bool) -> Self {
        self.verify_idempotence = verify;
        self
    }

    pub fn with_max_dense_cache(mut self, max: usize) -> Self {
        self.max_dense_cache = max;
        self
    }
}
