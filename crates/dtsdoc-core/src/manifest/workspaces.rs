//! Workspace support for monorepos.
//!
//! Parses the `workspaces` field from a root package.json and lists member
//! manifests. Supports glob patterns like `packages/*` and `!packages/skip`.

use super::{json_kind, Manifest, MANIFEST_FILE};
use crate::diagnostics::DiagnosticSink;
use crate::error::{codes, Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// List the member manifests declared by `root`'s `workspaces` field.
///
/// Order: pattern declaration order, then path order within a pattern.
/// Returns `Ok(None)` when the manifest has no `workspaces` field.
pub fn detect_workspaces(
    root: &Manifest,
    sink: &dyn DiagnosticSink,
) -> Result<Option<Vec<PathBuf>>> {
    let Some(workspaces) = root.raw.get("workspaces") else {
        return Ok(None);
    };

    // Workspaces can be an array or an object with a "packages" field (yarn-style)
    let list = match workspaces {
        Value::Array(arr) => arr,
        Value::Object(obj) => match obj.get("packages") {
            Some(Value::Array(arr)) => arr,
            _ => {
                return Err(Error::invalid_field(
                    "workspaces",
                    "object form must have a \"packages\" array",
                ))
            }
        },
        other => {
            return Err(Error::invalid_field(
                "workspaces",
                format!("expected an array or object, found {}", json_kind(other)),
            ))
        }
    };

    let mut includes = Vec::new();
    let mut excludes = Vec::new();
    for entry in list {
        let Some(pattern) = entry.as_str() else {
            return Err(Error::invalid_field(
                "workspaces",
                format!("patterns must be strings, found {}", json_kind(entry)),
            ));
        };
        match pattern.strip_prefix('!') {
            Some(negated) => excludes.push(compile(&root.directory, negated)?),
            None => includes.push(pattern),
        }
    }

    let mut members: Vec<PathBuf> = Vec::new();
    for pattern in includes {
        for dir in expand(&root.directory, pattern)? {
            let manifest = dir.join(MANIFEST_FILE);
            if !manifest.is_file() || members.contains(&manifest) {
                continue;
            }
            if excludes.iter().any(|ex| ex.matches_path(&dir)) {
                continue;
            }
            sink.info(
                codes::WORKSPACE_MEMBER,
                format!("workspace member {}", manifest.display()),
            );
            members.push(manifest);
        }
    }

    Ok(Some(members))
}

/// `pattern` under `root`, with glob metacharacters in `root` escaped.
fn rooted(root: &Path, pattern: &str) -> String {
    let root = glob::Pattern::escape(&root.to_string_lossy());
    Path::new(&root).join(pattern).to_string_lossy().into_owned()
}

fn compile(root: &Path, pattern: &str) -> Result<glob::Pattern> {
    glob::Pattern::new(&rooted(root, pattern)).map_err(|e| bad_pattern(pattern, &e))
}

fn bad_pattern(pattern: &str, e: &glob::PatternError) -> Error {
    Error::invalid_field("workspaces", format!("bad pattern \"{pattern}\": {e}"))
}

/// Expand one pattern to the directories it names, sorted.
fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(&rooted(root, pattern)).map_err(|e| bad_pattern(pattern, &e))?;

    let mut dirs: Vec<PathBuf> = entries.flatten().filter(|p| p.is_dir()).collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::manifest::load_manifest;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn write_pkg(dir: &Path, value: &Value) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE), value.to_string()).unwrap();
    }

    fn detect(root: &Path) -> Result<Option<Vec<PathBuf>>> {
        let diags = Diagnostics::new();
        let manifest = load_manifest(&root.join(MANIFEST_FILE), &diags).unwrap();
        detect_workspaces(&manifest, &diags)
    }

    #[test]
    fn test_detect_workspaces_array_format() {
        let root = tempdir().unwrap();
        write_pkg(root.path(), &json!({ "name": "root", "workspaces": ["packages/*"] }));
        write_pkg(&root.path().join("packages/b"), &json!({ "name": "b" }));
        write_pkg(&root.path().join("packages/a"), &json!({ "name": "a" }));
        // no manifest: skipped
        fs::create_dir_all(root.path().join("packages/empty")).unwrap();

        let members = detect(root.path()).unwrap().unwrap();
        assert_eq!(
            members,
            [
                root.path().join("packages/a/package.json"),
                root.path().join("packages/b/package.json"),
            ]
        );
    }

    #[test]
    fn test_detect_workspaces_object_format_keeps_pattern_order() {
        let root = tempdir().unwrap();
        write_pkg(
            root.path(),
            &json!({ "workspaces": { "packages": ["tools/*", "libs/*"] } }),
        );
        write_pkg(&root.path().join("libs/core"), &json!({ "name": "core" }));
        write_pkg(&root.path().join("tools/cli"), &json!({ "name": "cli" }));

        let members = detect(root.path()).unwrap().unwrap();
        assert_eq!(
            members,
            [
                root.path().join("tools/cli/package.json"),
                root.path().join("libs/core/package.json"),
            ]
        );
    }

    #[test]
    fn test_negated_pattern_excludes() {
        let root = tempdir().unwrap();
        write_pkg(
            root.path(),
            &json!({ "workspaces": ["packages/*", "!packages/private"] }),
        );
        write_pkg(&root.path().join("packages/public"), &json!({}));
        write_pkg(&root.path().join("packages/private"), &json!({}));

        let members = detect(root.path()).unwrap().unwrap();
        assert_eq!(members, [root.path().join("packages/public/package.json")]);
    }

    #[test]
    fn test_root_with_glob_metacharacters() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("repo[1]");
        write_pkg(
            &root,
            &json!({ "workspaces": ["packages/*", "!packages/private"] }),
        );
        write_pkg(&root.join("packages/public"), &json!({}));
        write_pkg(&root.join("packages/private"), &json!({}));

        let members = detect(&root).unwrap().unwrap();
        assert_eq!(members, [root.join("packages/public/package.json")]);
    }

    #[test]
    fn test_no_workspaces_field() {
        let root = tempdir().unwrap();
        write_pkg(root.path(), &json!({ "name": "solo" }));
        assert!(detect(root.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_workspaces_shape() {
        let root = tempdir().unwrap();
        write_pkg(root.path(), &json!({ "workspaces": "packages/*" }));
        let err = detect(root.path()).unwrap_err();
        assert_eq!(err.field(), Some("workspaces"));
    }
}
