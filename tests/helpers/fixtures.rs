//! Source fixtures and package trees on disk.

use std::path::Path;

use cktransform::base::ResourceLocator;
use cktransform::{SpaceError, TransformSpace};

/// A transformer source with one anonymous function.
pub fn transformer(body: &str) -> String {
    format!("create transformer\nbegin\n{body}\nend\n")
}

/// Write `(path, text)` pairs under `root`, creating folders as needed.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, text) in files {
        let file = root.join(path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file, text).unwrap();
    }
}

/// Register every file under `root` as a resource of `package`, paths
/// relative to `root`. Returns the registered paths, sorted.
pub fn register_tree(
    space: &mut TransformSpace,
    package: &str,
    root: &Path,
) -> Result<Vec<String>, SpaceError> {
    let mut files = Vec::new();
    collect(root, root, &mut files);
    files.sort();
    for path in &files {
        let text = std::fs::read_to_string(root.join(path)).unwrap();
        space.register(ResourceLocator::new(package, path), text)?;
    }
    Ok(files)
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<String>) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect(root, &path, out);
        } else {
            let relative = path.strip_prefix(root).unwrap();
            out.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
}
