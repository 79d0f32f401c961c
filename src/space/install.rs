//! Output installation
//!
//! Transformed texts are offered to the install hooks in order. The first
//! hook that claims a path wins; unclaimed outputs go to the
//! [`FileInstaller`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use super::errors::InstallError;

pub trait InstallHook: Send + Sync {
    /// Install `text` as the output of `path`. Returns false when the hook
    /// does not handle this path.
    fn install(&self, path: &str, text: &str) -> Result<bool, InstallError>;
}

/// Writes outputs under a root directory.
#[derive(Debug, Clone)]
pub struct FileInstaller {
    root: PathBuf,
}

impl FileInstaller {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that receives the output of `path`.
    pub fn output_path(&self, path: &str) -> Result<PathBuf, InstallError> {
        if path.is_empty() || path.starts_with("../") || path == ".." || path.starts_with('/') {
            return Err(InstallError::Rejected {
                path: path.to_string(),
                reason: "path is outside the output root".to_string(),
            });
        }
        Ok(self.root.join(path))
    }
}

impl InstallHook for FileInstaller {
    fn install(&self, path: &str, text: &str) -> Result<bool, InstallError> {
        let file = self.output_path(path)?;
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&file, text)?;
        debug!(path, file = %file.display(), "installed");
        Ok(true)
    }
}

/// Keeps outputs in memory, for hosts that collect them.
#[derive(Debug, Default)]
pub struct MemoryInstaller {
    outputs: Mutex<IndexMap<String, String>>,
}

impl MemoryInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.outputs.lock().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.outputs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.lock().is_empty()
    }

    /// Remove and return everything installed so far.
    pub fn take(&self) -> IndexMap<String, String> {
        std::mem::take(&mut *self.outputs.lock())
    }
}

impl InstallHook for MemoryInstaller {
    fn install(&self, path: &str, text: &str) -> Result<bool, InstallError> {
        self.outputs.lock().insert(path.to_string(), text.to_string());
        Ok(true)
    }
}

/// Hooks in registration order, then the file installer.
pub struct InstallerChain {
    hooks: Vec<Arc<dyn InstallHook>>,
    fallback: FileInstaller,
}

impl InstallerChain {
    pub fn new(fallback: FileInstaller) -> Self {
        Self {
            hooks: Vec::new(),
            fallback,
        }
    }

    pub fn push(&mut self, hook: Arc<dyn InstallHook>) {
        self.hooks.push(hook);
    }

    pub fn fallback(&self) -> &FileInstaller {
        &self.fallback
    }

    pub fn install(&self, path: &str, text: &str) -> Result<(), InstallError> {
        for hook in &self.hooks {
            if hook.install(path, text)? {
                return Ok(());
            }
        }
        self.fallback.install(path, text).map(|_| ())
    }
}

impl std::fmt::Debug for InstallerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallerChain")
            .field("hooks", &self.hooks.len())
            .field("fallback", &self.fallback)
            .finish()
    }
}
