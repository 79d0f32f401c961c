//! Targets outside the space
//!
//! A function may target `"../path"`, a resource that escapes the space root.
//! Such targets are resolved by an [`ExternalItemResolver`] into items that
//! provide their own text and installation.

use std::path::PathBuf;
use std::sync::Arc;

use super::errors::InstallError;

pub trait ExternalTransformableItem: Send + Sync {
    /// Normalized path, as targeted (with its leading `../`).
    fn path(&self) -> &str;

    /// Text before any transformation.
    fn initial_text(&self) -> &str;

    /// Called only when the verified output differs from the initial text.
    fn install(&self, text: &str) -> Result<(), InstallError>;
}

pub trait ExternalItemResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Option<Arc<dyn ExternalTransformableItem>>;
}

/// Resolves external targets against a directory on disk.
///
/// `"../a.ts"` is read from `<base>/a.ts`; the text is loaded at resolution
/// time and written back on install.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    base: PathBuf,
}

impl DirectoryResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl ExternalItemResolver for DirectoryResolver {
    fn resolve(&self, path: &str) -> Option<Arc<dyn ExternalTransformableItem>> {
        let relative = path.strip_prefix("../")?;
        let file = self.base.join(relative);
        let text = std::fs::read_to_string(&file).ok()?;
        Some(Arc::new(ExternalFile {
            path: path.to_string(),
            file,
            text,
        }))
    }
}

struct ExternalFile {
    path: String,
    file: PathBuf,
    text: String,
}

impl ExternalTransformableItem for ExternalFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn initial_text(&self) -> &str {
        &self.text
    }

    fn install(&self, text: &str) -> Result<(), InstallError> {
        std::fs::write(&self.file, text)?;
        Ok(())
    }
}
