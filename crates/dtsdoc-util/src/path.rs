//! Lexical path helpers. Nothing here touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by removing `.` and resolving `..` components.
///
/// `..` at the root is dropped rather than escaping it.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other),
        }
    }
    result
}

/// Join `relative` onto `base` and normalize, unless `relative` is already absolute.
#[must_use]
pub fn absolutize(base: &Path, relative: &Path) -> PathBuf {
    if relative.is_absolute() {
        normalize_path(relative)
    } else {
        normalize_path(&base.join(relative))
    }
}
