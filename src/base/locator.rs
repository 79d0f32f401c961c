//! Resource provenance.

use std::fmt;

use smol_str::SmolStr;

/// Identity of a resource: the package it comes from and its normalized path.
///
/// The core never opens a locator; it only uses it as a key and for messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceLocator {
    package: SmolStr,
    path: SmolStr,
}

impl ResourceLocator {
    pub fn new(package: impl AsRef<str>, path: impl AsRef<str>) -> Self {
        Self {
            package: SmolStr::new(package.as_ref()),
            path: SmolStr::new(normalize_path(path.as_ref())),
        }
    }

    /// A locator for text that does not come from a package (tests, ad-hoc calls).
    pub fn detached(path: impl AsRef<str>) -> Self {
        Self::new("", path)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Folder part of the path, without the trailing `/` (empty at root).
    pub fn folder(&self) -> &str {
        match self.path.rfind('/') {
            Some(i) => &self.path[..i],
            None => "",
        }
    }

    /// File name part of the path.
    pub fn file_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(i) => &self.path[i + 1..],
            None => &self.path,
        }
    }
}

impl fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}:{}", self.package, self.path)
        }
    }
}

/// Normalize a resource path: `\` becomes `/`, `.` segments disappear and
/// `..` segments collapse against a preceding named segment.
///
/// Leading `..` segments that cannot collapse are kept: they denote paths that
/// escape the root (external targets).
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}
