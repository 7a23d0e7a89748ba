//! Package.json exports field evaluation.
//!
//! Implements Node.js-compatible condition selection over the whole map:
//! - Root exports (`"exports": "./index.d.ts"` or a root conditions object)
//! - Subpath exports (`"./sub"`), one entry per key
//! - Pattern exports (`"./*"`), kept literal; expansion happens downstream
//! - Conditional exports, nested to any depth, array fallbacks, `null` exclusions

use super::tree::{is_subpath_key, ExportsTree};
use crate::diagnostics::DiagnosticSink;
use crate::error::codes;
use dtsdoc_util::path::absolutize;
use std::path::{Path, PathBuf};

/// Condition used when the request does not name one.
pub const DEFAULT_CONDITION: &str = "types";

/// Catch-all condition; always last in a [`ConditionSet`].
const DEFAULT_KEY: &str = "default";

/// Ordered condition precedence for one resolution run.
///
/// The first name is the target condition. The list always ends in `"default"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionSet {
    names: Vec<String>,
}

impl ConditionSet {
    /// Precedence `[condition, "default"]`.
    #[must_use]
    pub fn for_condition(condition: &str) -> Self {
        Self::with_precedence([condition])
    }

    /// Caller-supplied precedence. Duplicates are removed and `"default"` is
    /// moved to (or appended at) the end.
    #[must_use]
    pub fn with_precedence<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref();
            if name != DEFAULT_KEY && !ordered.iter().any(|n| n == name) {
                ordered.push(name.to_string());
            }
        }
        ordered.push(DEFAULT_KEY.to_string());
        Self { names: ordered }
    }

    /// The target condition (first in precedence).
    #[must_use]
    pub fn primary(&self) -> &str {
        &self.names[0]
    }

    /// Conditions in precedence order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for ConditionSet {
    fn default() -> Self {
        Self::for_condition(DEFAULT_CONDITION)
    }
}

/// Resolved exports: subpath key -> absolute path, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportMap {
    entries: Vec<(String, PathBuf)>,
}

impl ExportMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, path: PathBuf) -> Option<PathBuf> {
        let key = key.into();
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, path));
        }
        self.entries.push((key, path));
        None
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, p)| p.as_path())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p.as_path()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// Resolve every export of a manifest under `conditions`.
///
/// Returns an empty map when `exports` is absent, `null`, or a scalar that is
/// not a string; the caller then falls back to `types`/`typings`. Subpaths
/// with no matching condition are left out. Never fails: malformed pieces are
/// reported through `sink` and skipped.
#[must_use]
pub fn resolve_exports(
    exports: Option<&ExportsTree>,
    directory: &Path,
    conditions: &ConditionSet,
    sink: &dyn DiagnosticSink,
) -> ExportMap {
    let mut map = ExportMap::new();
    let Some(exports) = exports else {
        return map;
    };

    let subpaths: Vec<(&str, &ExportsTree)> = match exports {
        ExportsTree::Subpaths(entries) => dedupe_subpaths(entries, sink),
        ExportsTree::Mixed(entries) => {
            let ignored: Vec<&str> = entries
                .iter()
                .map(|(k, _)| k.as_str())
                .filter(|k| !is_subpath_key(k))
                .collect();
            sink.warn(
                codes::EXPORTS_MIXED_KEYS,
                format!(
                    "exports mixes subpath and condition keys; ignoring conditions: {}",
                    ignored.join(", ")
                ),
            );
            dedupe_subpaths(entries, sink)
        }
        ExportsTree::Target(_) | ExportsTree::Conditions(_) | ExportsTree::Fallbacks(_) => {
            vec![(".", exports)]
        }
        ExportsTree::Null => Vec::new(),
        ExportsTree::Unsupported(kind) => {
            sink.warn(
                codes::EXPORTS_INVALID_TARGET,
                format!("exports must be a string, array, or object, found {kind}"),
            );
            Vec::new()
        }
    };

    for (key, tree) in subpaths {
        match resolve_target(tree, key, conditions, sink) {
            Some(target) => {
                let path = absolutize(directory, Path::new(&target));
                sink.info(
                    codes::EXPORT_RESOLVED,
                    format!("exports[\"{key}\"] -> {}", path.display()),
                );
                map.insert(key, path);
            }
            None => sink.info(
                codes::EXPORT_NO_MATCH,
                format!(
                    "exports[\"{key}\"] has no target for conditions [{}]",
                    conditions.names().join(", ")
                ),
            ),
        }
    }

    map
}

/// Collapse duplicate subpath keys: the last declaration's value wins, placed
/// at the first declaration's position.
fn dedupe_subpaths<'a>(
    entries: &'a [(String, ExportsTree)],
    sink: &dyn DiagnosticSink,
) -> Vec<(&'a str, &'a ExportsTree)> {
    let mut out: Vec<(&str, &ExportsTree)> = Vec::with_capacity(entries.len());
    for (key, tree) in entries {
        if !is_subpath_key(key) {
            continue;
        }
        if let Some(slot) = out.iter_mut().find(|(k, _)| *k == key.as_str()) {
            sink.warn(
                codes::EXPORTS_DUPLICATE_KEY,
                format!(
                    "exports key \"{key}\" is declared more than once; \
                     using the last declaration"
                ),
            );
            slot.1 = tree;
        } else {
            out.push((key.as_str(), tree));
        }
    }
    out
}

/// Resolve a target which can be a string, array, or (nested) conditions object.
fn resolve_target(
    tree: &ExportsTree,
    key: &str,
    conditions: &ConditionSet,
    sink: &dyn DiagnosticSink,
) -> Option<String> {
    match tree {
        ExportsTree::Target(s) => validate_export_path(s, key, sink),
        ExportsTree::Null => None,
        ExportsTree::Fallbacks(items) => items
            .iter()
            .find_map(|item| resolve_target(item, key, conditions, sink)),
        ExportsTree::Conditions(entries) => resolve_conditions(entries, key, conditions, sink),
        ExportsTree::Subpaths(_) | ExportsTree::Mixed(_) => {
            sink.warn(
                codes::EXPORTS_INVALID_TARGET,
                format!("exports[\"{key}\"] nests subpath keys inside a target"),
            );
            None
        }
        ExportsTree::Unsupported(kind) => {
            sink.warn(
                codes::EXPORTS_INVALID_TARGET,
                format!("exports[\"{key}\"] target is a {kind}"),
            );
            None
        }
    }
}

/// Pick the first condition, in precedence order, that resolves.
///
/// A condition that is present but resolves to nothing falls through to the
/// next one. Duplicate condition keys: the last declaration is used.
fn resolve_conditions(
    entries: &[(String, ExportsTree)],
    key: &str,
    conditions: &ConditionSet,
    sink: &dyn DiagnosticSink,
) -> Option<String> {
    conditions.names().iter().find_map(|name| {
        let (_, target) = entries.iter().rev().find(|(k, _)| k == name)?;
        resolve_target(target, key, conditions, sink)
    })
}

/// Validate that an export path starts with "./" and stays inside the package,
/// as required by Node.
fn validate_export_path(path: &str, key: &str, sink: &dyn DiagnosticSink) -> Option<String> {
    let Some(rest) = path.strip_prefix("./") else {
        sink.warn(
            codes::EXPORTS_INVALID_TARGET,
            format!("exports[\"{key}\"] target \"{path}\" must start with \"./\""),
        );
        return None;
    };

    if rest
        .split(['/', '\\'])
        .any(|segment| segment == ".." || segment == "node_modules")
    {
        sink.warn(
            codes::EXPORTS_INVALID_TARGET,
            format!("exports[\"{key}\"] target \"{path}\" escapes the package"),
        );
        return None;
    }

    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use serde_json::json;

    const DIR: &str = "/work/pkg";

    fn resolve(value: serde_json::Value, conditions: &ConditionSet) -> (ExportMap, Diagnostics) {
        let tree = ExportsTree::from_value(&value);
        let diags = Diagnostics::new();
        let map = resolve_exports(Some(&tree), Path::new(DIR), conditions, &diags);
        (map, diags)
    }

    fn types() -> ConditionSet {
        ConditionSet::for_condition("types")
    }

    fn abs(rel: &str) -> PathBuf {
        absolutize(Path::new(DIR), Path::new(rel))
    }

    #[test]
    fn test_condition_set_ends_in_default() {
        let set = ConditionSet::with_precedence(["default", "types", "types", "import"]);
        assert_eq!(set.names(), ["types", "import", "default"]);
        assert_eq!(set.primary(), "types");
        assert_eq!(ConditionSet::for_condition("default").names(), ["default"]);
    }

    #[test]
    fn test_exports_string_root() {
        let (map, _) = resolve(json!("./dist/index.d.ts"), &types());
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("."), Some(abs("./dist/index.d.ts").as_path()));
    }

    #[test]
    fn test_exports_subpaths_with_types() {
        let (map, _) = resolve(
            json!({
                ".": { "types": "./index.d.ts" },
                "./sub": { "types": "./sub/index.d.ts" }
            }),
            &types(),
        );
        assert_eq!(map.keys().collect::<Vec<_>>(), [".", "./sub"]);
        assert_eq!(map.get("."), Some(Path::new("/work/pkg/index.d.ts")));
        assert_eq!(map.get("./sub"), Some(Path::new("/work/pkg/sub/index.d.ts")));
    }

    #[test]
    fn test_root_conditions_object() {
        let (map, _) = resolve(
            json!({ "import": "./esm.js", "types": "./index.d.ts" }),
            &types(),
        );
        assert_eq!(map.get("."), Some(abs("./index.d.ts").as_path()));
    }

    #[test]
    fn test_never_selects_import_or_require_without_default() {
        let (map, diags) = resolve(
            json!({
                ".": { "import": "./esm.d.ts", "require": "./cjs.d.ts" },
                "./x": { "require": { "types": "./x.d.ts" } }
            }),
            &types(),
        );
        assert!(map.is_empty());
        assert_eq!(diags.count_code(codes::EXPORT_NO_MATCH), 2);
    }

    #[test]
    fn test_default_falls_through_to_nested_types() {
        let (map, _) = resolve(
            json!({
                ".": {
                    "import": "./esm.js",
                    "default": { "types": "./index.d.ts", "default": "./index.js" }
                }
            }),
            &types(),
        );
        assert_eq!(map.get("."), Some(abs("./index.d.ts").as_path()));
    }

    #[test]
    fn test_precedence_order_not_declaration_order() {
        // "default" is declared first but "types" has precedence.
        let (map, _) = resolve(
            json!({ ".": { "default": "./index.js", "types": "./index.d.ts" } }),
            &types(),
        );
        assert_eq!(map.get("."), Some(abs("./index.d.ts").as_path()));
    }

    #[test]
    fn test_custom_precedence() {
        let set = ConditionSet::with_precedence(["import", "types"]);
        let (map, _) = resolve(
            json!({ ".": { "types": "./index.d.ts", "import": "./index.mjs" } }),
            &set,
        );
        assert_eq!(map.get("."), Some(abs("./index.mjs").as_path()));
    }

    #[test]
    fn test_condition_present_but_unresolvable_falls_through() {
        let (map, _) = resolve(
            json!({ ".": { "types": { "node": "./node.d.ts" }, "default": "./index.d.ts" } }),
            &types(),
        );
        assert_eq!(map.get("."), Some(abs("./index.d.ts").as_path()));
    }

    #[test]
    fn test_pattern_kept_literal() {
        let (map, _) = resolve(
            json!({ "./*": { "types": "./dist/*.d.ts" } }),
            &types(),
        );
        assert_eq!(map.get("./*"), Some(Path::new("/work/pkg/dist/*.d.ts")));
    }

    #[test]
    fn test_null_excludes_subpath() {
        let (map, _) = resolve(
            json!({ ".": "./index.d.ts", "./internal": null }),
            &types(),
        );
        assert_eq!(map.keys().collect::<Vec<_>>(), ["."]);
    }

    #[test]
    fn test_array_fallbacks() {
        let (map, diags) = resolve(
            json!({ ".": ["not-relative.d.ts", { "types": "./index.d.ts" }] }),
            &types(),
        );
        assert_eq!(map.get("."), Some(abs("./index.d.ts").as_path()));
        assert!(diags.has_code(codes::EXPORTS_INVALID_TARGET));
    }

    #[test]
    fn test_invalid_targets_dropped() {
        let (map, diags) = resolve(
            json!({ ".": "https://example.com/x.d.ts", "./a": "/abs/a.d.ts", "./b": "lodash" }),
            &types(),
        );
        assert!(map.is_empty());
        assert_eq!(diags.count_code(codes::EXPORTS_INVALID_TARGET), 3);
    }

    #[test]
    fn test_duplicate_subpath_last_wins_with_warning() {
        let tree: ExportsTree = serde_json::from_str(
            r#"{ "./a": "./first.d.ts", "./b": "./b.d.ts", "./a": "./second.d.ts" }"#,
        )
        .unwrap();
        let diags = Diagnostics::new();
        let map = resolve_exports(Some(&tree), Path::new(DIR), &types(), &diags);

        assert_eq!(map.keys().collect::<Vec<_>>(), ["./a", "./b"]);
        assert_eq!(map.get("./a"), Some(abs("./second.d.ts").as_path()));
        assert_eq!(diags.count_code(codes::EXPORTS_DUPLICATE_KEY), 1);
    }

    #[test]
    fn test_mixed_keys_warn_and_keep_subpaths() {
        let tree: ExportsTree =
            serde_json::from_str(r#"{ ".": "./index.d.ts", "types": "./other.d.ts" }"#).unwrap();
        let diags = Diagnostics::new();
        let map = resolve_exports(Some(&tree), Path::new(DIR), &types(), &diags);

        assert_eq!(map.keys().collect::<Vec<_>>(), ["."]);
        assert_eq!(map.get("."), Some(abs("./index.d.ts").as_path()));
        assert!(diags.has_code(codes::EXPORTS_MIXED_KEYS));
    }

    #[test]
    fn test_absent_or_scalar_exports_is_empty() {
        let diags = Diagnostics::new();
        assert!(resolve_exports(None, Path::new(DIR), &types(), &diags).is_empty());

        let (map, diags) = resolve(json!(42), &types());
        assert!(map.is_empty());
        assert!(diags.has_code(codes::EXPORTS_INVALID_TARGET));

        let (map, _) = resolve(json!(null), &types());
        assert!(map.is_empty());
    }

    #[test]
    fn test_path_traversal_rejected() {
        let (map, diags) = resolve(
            json!({ ".": "./../secret.d.ts", "./dep": "./node_modules/dep/index.d.ts" }),
            &types(),
        );
        assert!(map.is_empty());
        assert_eq!(diags.count_code(codes::EXPORTS_INVALID_TARGET), 2);
    }

    #[test]
    fn test_cur_dir_segments_normalized() {
        let (map, _) = resolve(json!({ ".": "./dist/./index.d.ts" }), &types());
        assert_eq!(map.get("."), Some(Path::new("/work/pkg/dist/index.d.ts")));
    }

    #[test]
    fn test_export_map_insert_keeps_position() {
        let mut map = ExportMap::new();
        map.insert(".", PathBuf::from("/a"));
        map.insert("./b", PathBuf::from("/b"));
        let old = map.insert(".", PathBuf::from("/c"));

        assert_eq!(old, Some(PathBuf::from("/a")));
        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, [(".", Path::new("/c")), ("./b", Path::new("/b"))]);
    }
}
