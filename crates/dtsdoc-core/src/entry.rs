//! Entry-point collection.
//!
//! Turns a resolved [`ExportMap`] (or the manifest's `types`/`typings`
//! fallback) into the frozen set of files handed to the documentation
//! generator.

use crate::diagnostics::DiagnosticSink;
use crate::error::{codes, Error, Result};
use crate::manifest::Manifest;
use crate::resolver::{ExportMap, DEFAULT_CONDITION};
use dtsdoc_util::fs::is_file;
use dtsdoc_util::path::absolutize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// TypeScript declaration file suffixes.
pub const DECLARATION_EXTENSIONS: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

/// Source file suffixes accepted as entry points.
pub const SOURCE_EXTENSIONS: &[&str] =
    &[".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs"];

/// What to do with a `types`-condition candidate that is not a declaration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationPolicy {
    /// Warn, then keep the file.
    #[default]
    WarnAndInclude,
    /// Warn, then drop the file.
    Exclude,
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// `index.d.ts`, `index.d.mts`, `index.d.cts`.
#[must_use]
pub fn is_declaration_file(path: &Path) -> bool {
    let name = file_name(path);
    DECLARATION_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

#[must_use]
pub fn is_source_file(path: &Path) -> bool {
    let name = file_name(path);
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Declaration or source file.
#[must_use]
pub fn is_allowed_entry(path: &Path) -> bool {
    is_declaration_file(path) || is_source_file(path)
}

/// Deduplicated, sorted set of absolute entry-point paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntryPointSet {
    paths: BTreeSet<PathBuf>,
}

impl EntryPointSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// True when every entry is a declaration file (and there is at least one).
    #[must_use]
    pub fn all_declarations(&self) -> bool {
        !self.paths.is_empty() && self.paths.iter().all(|p| is_declaration_file(p))
    }

    /// Union of two sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            paths: self.paths.union(&other.paths).cloned().collect(),
        }
    }
}

/// Accumulates candidates; [`build`](Self::build) freezes them.
#[derive(Debug, Default)]
pub struct EntryPointSetBuilder {
    paths: BTreeSet<PathBuf>,
}

impl EntryPointSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(path.into());
        self
    }

    pub fn add(&mut self, path: impl Into<PathBuf>) {
        self.paths.insert(path.into());
    }

    #[must_use]
    pub fn build(self) -> EntryPointSet {
        EntryPointSet { paths: self.paths }
    }
}

/// Collect the entry points of `manifest`.
///
/// Non-empty `exports`: every resolved value is a candidate. Otherwise, for
/// the `types` condition only, `types` then `typings` (first string wins).
/// Candidates must exist and have a source/declaration extension; under
/// `types` a non-declaration candidate is warned about and kept or dropped per
/// `policy`. Paths containing `*` are passed through unexpanded.
pub fn collect_entry_points(
    manifest: &Manifest,
    exports: &ExportMap,
    condition: &str,
    policy: DeclarationPolicy,
    sink: &dyn DiagnosticSink,
) -> Result<EntryPointSet> {
    let mut candidates: Vec<(String, PathBuf)> = Vec::new();

    if exports.is_empty() {
        if condition == DEFAULT_CONDITION {
            let fallback = [("types", &manifest.types), ("typings", &manifest.typings)]
                .into_iter()
                .find_map(|(field, value)| value.as_deref().map(|v| (field, v)));
            if let Some((field, value)) = fallback {
                sink.info(
                    codes::TYPES_FALLBACK,
                    format!("{} has no usable exports; using \"{field}\"", manifest.label()),
                );
                candidates.push((
                    format!("\"{field}\""),
                    absolutize(&manifest.directory, Path::new(value)),
                ));
            }
        }
    } else {
        candidates.extend(
            exports
                .iter()
                .map(|(key, path)| (format!("exports[\"{key}\"]"), path.to_path_buf())),
        );
    }

    let mut builder = EntryPointSetBuilder::new();
    for (origin, path) in candidates {
        if admit(&origin, &path, condition, policy, sink) {
            sink.info(codes::ENTRY_POINT, format!("entry point {}", path.display()));
            builder.add(path);
        }
    }

    let set = builder.build();
    if set.is_empty() {
        return Err(Error::NoEntryPoints {
            origin: manifest.path.clone(),
            condition: condition.to_string(),
        });
    }
    Ok(set)
}

fn admit(
    origin: &str,
    path: &Path,
    condition: &str,
    policy: DeclarationPolicy,
    sink: &dyn DiagnosticSink,
) -> bool {
    // Patterns may end without an extension, e.g. `./dist/*`.
    let pattern = path.to_string_lossy().contains('*');
    if !pattern && !is_allowed_entry(path) {
        sink.warn(
            codes::ENTRY_UNSUPPORTED_EXTENSION,
            format!(
                "{origin} references {}, which is not a source or declaration file",
                path.display()
            ),
        );
        return false;
    }

    let declaration = is_declaration_file(path) || (pattern && !is_source_file(path));
    if condition == DEFAULT_CONDITION && !declaration {
        sink.warn(
            codes::INVALID_DECLARATION_FILE,
            format!(
                "property {origin} does not reference a declaration file: {}",
                path.display()
            ),
        );
        if policy == DeclarationPolicy::Exclude {
            return false;
        }
    }

    if pattern {
        sink.info(
            codes::ENTRY_PATTERN_UNEXPANDED,
            format!("{origin} is a pattern; passing {} through", path.display()),
        );
        return true;
    }

    if !is_file(path) {
        sink.warn(
            codes::ENTRY_NOT_FOUND,
            format!("{origin} references a missing file: {}", path.display()),
        );
        return false;
    }

    true
}
