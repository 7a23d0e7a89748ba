//! Combining per-package configs into one documentation run.

use crate::config::{check_exclusive, GenerateConfig};
use crate::diagnostics::DiagnosticSink;
use crate::error::{codes, Error, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Module identifier -> display name, in insertion order.
///
/// An identifier maps to exactly one display name; re-inserting the same
/// pair is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleNameTable {
    entries: Vec<(String, String)>,
}

impl ModuleNameTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mapping, failing if `module` already maps to another name.
    pub fn insert(&mut self, module: impl Into<String>, display: impl Into<String>) -> Result<()> {
        let module = module.into();
        let display = display.into();
        match self.get(&module) {
            Some(existing) if existing == display => Ok(()),
            Some(existing) => Err(Error::ModuleNameCollision {
                module,
                existing: existing.to_string(),
                incoming: display,
            }),
            None => {
                self.entries.push((module, display));
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn get(&self, module: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id == module)
            .map(|(_, display)| display.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, d)| (id.as_str(), d.as_str()))
    }

    /// Fold `other` into this table.
    pub fn extend_from(&mut self, other: &Self) -> Result<()> {
        for (module, display) in other.iter() {
            self.insert(module, display)?;
        }
        Ok(())
    }
}

impl Serialize for ModuleNameTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (module, display) in &self.entries {
            map.serialize_entry(module, display)?;
        }
        map.end()
    }
}

/// Merge validated configs for a multi-package run.
///
/// Entry points, manifests, and module names are unioned. Link plugins are
/// unioned and re-checked for exclusivity. Every other setting comes from the
/// first config; a later config that disagrees gets a warning.
pub fn merge_configs(
    configs: Vec<GenerateConfig>,
    sink: &dyn DiagnosticSink,
) -> Result<GenerateConfig> {
    let mut configs = configs.into_iter();
    let Some(mut merged) = configs.next() else {
        return Err(Error::invalid_field("packages", "nothing to merge"));
    };

    for config in configs {
        let label = config
            .name
            .clone()
            .or_else(|| config.manifests.first().map(|p| p.display().to_string()))
            .unwrap_or_else(|| "package".to_string());

        warn_if_differs(sink, &label, "condition", merged.condition != config.condition);
        warn_if_differs(sink, &label, "output", merged.output != config.output);
        warn_if_differs(sink, &label, "navigation", merged.navigation != config.navigation);
        warn_if_differs(sink, &label, "tsconfig", merged.tsconfig != config.tsconfig);
        warn_if_differs(
            sink,
            &label,
            "compilerOptions",
            merged.compiler_options != config.compiler_options
                || merged.unset_compiler_options != config.unset_compiler_options,
        );
        warn_if_differs(
            sink,
            &label,
            "typedocOptions",
            merged.typedoc_options != config.typedoc_options,
        );

        merged.entry_points = merged.entry_points.union(&config.entry_points);
        for manifest in config.manifests {
            if !merged.manifests.contains(&manifest) {
                merged.manifests.push(manifest);
            }
        }
        merged.module_names.extend_from(&config.module_names)?;
        for plugin in config.link_plugins {
            if !merged.link_plugins.contains(&plugin) {
                merged.link_plugins.push(plugin);
            }
        }
        check_exclusive(&merged.link_plugins)?;
        merged.entry_points_dts &= config.entry_points_dts;
        merged.from_package &= config.from_package;
    }

    // Merged runs have no single package name or explicit file.
    merged.name = None;
    merged.path = None;
    merged.has_compiler_options = !merged.compiler_options.is_empty();
    Ok(merged)
}

fn warn_if_differs(sink: &dyn DiagnosticSink, label: &str, setting: &str, differs: bool) {
    if differs {
        sink.warn(
            codes::MERGE_SETTING_IGNORED,
            format!(
                "{label}: '{setting}' differs from the first package; \
                 using the first package's value"
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LinkPlugin, Navigation};
    use crate::diagnostics::Diagnostics;
    use crate::entry::{DeclarationPolicy, EntryPointSetBuilder};
    use serde_json::{json, Map};
    use std::path::PathBuf;

    fn config(name: &str, entry: &str) -> GenerateConfig {
        let mut module_names = ModuleNameTable::new();
        module_names.insert(name, name.to_uppercase()).unwrap();
        GenerateConfig {
            condition: "types".to_string(),
            output: PathBuf::from("/work/docs"),
            path: None,
            name: Some(name.to_string()),
            entry_points: EntryPointSetBuilder::new().with(entry).build(),
            compiler_options: Map::new(),
            unset_compiler_options: Vec::new(),
            link_plugins: Vec::new(),
            module_names,
            navigation: None,
            tsconfig: None,
            typedoc_json: None,
            typedoc_options: Map::new(),
            manifests: vec![PathBuf::from(format!("/work/{name}/package.json"))],
            declaration_policy: DeclarationPolicy::WarnAndInclude,
            from_package: true,
            entry_points_dts: true,
            has_compiler_options: false,
        }
    }

    #[test]
    fn test_table_insert_and_collision() {
        let mut table = ModuleNameTable::new();
        table.insert("a", "A").unwrap();
        table.insert("a", "A").unwrap();
        table.insert("b", "B").unwrap();
        assert_eq!(table.len(), 2);

        let err = table.insert("a", "Other").unwrap_err();
        assert_eq!(err.code(), codes::MODULE_NAME_COLLISION);
        assert_eq!(table.get("a"), Some("A"));
    }

    #[test]
    fn test_table_serializes_in_order() {
        let mut table = ModuleNameTable::new();
        table.insert("z", "Zed").unwrap();
        table.insert("a", "Ay").unwrap();
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"z":"Zed","a":"Ay"}"#
        );
    }

    #[test]
    fn test_merge_unions_entry_points() {
        let diags = Diagnostics::new();
        let merged = merge_configs(
            vec![config("a", "/work/a/index.d.ts"), config("b", "/work/b/index.d.ts")],
            &diags,
        )
        .unwrap();

        assert_eq!(merged.entry_points.len(), 2);
        assert_eq!(merged.manifests.len(), 2);
        assert_eq!(merged.module_names.get("b"), Some("B"));
        assert!(merged.name.is_none());
        assert!(merged.entry_points_dts);
        assert!(!diags.has_code(codes::MERGE_SETTING_IGNORED));
    }

    #[test]
    fn test_merge_overlapping_entry_points() {
        let diags = Diagnostics::new();
        let merged = merge_configs(
            vec![config("a", "/work/shared.d.ts"), config("b", "/work/shared.d.ts")],
            &diags,
        )
        .unwrap();
        assert_eq!(merged.entry_points.len(), 1);
    }

    #[test]
    fn test_merge_empty_input() {
        let diags = Diagnostics::new();
        let err = merge_configs(Vec::new(), &diags).unwrap_err();
        assert_eq!(err.field(), Some("packages"));
    }

    #[test]
    fn test_merge_conflicting_plugins() {
        let diags = Diagnostics::new();
        let mut a = config("a", "/work/a.d.ts");
        a.link_plugins = vec![LinkPlugin::Dom];
        let mut b = config("b", "/work/b.d.ts");
        b.link_plugins = vec![LinkPlugin::Worker];

        let err = merge_configs(vec![a, b], &diags).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_LINK_PLUGIN_COMBINATION);
    }

    #[test]
    fn test_merge_module_name_collision() {
        let diags = Diagnostics::new();
        let a = config("a", "/work/a.d.ts");
        let mut b = config("b", "/work/b.d.ts");
        b.module_names.insert("a", "Not A").unwrap();

        let err = merge_configs(vec![a, b], &diags).unwrap_err();
        assert_eq!(err.code(), codes::MODULE_NAME_COLLISION);
    }

    #[test]
    fn test_merge_warns_on_differing_settings() {
        let diags = Diagnostics::new();
        let a = config("a", "/work/a.ts");
        let mut b = config("b", "/work/b.d.ts");
        b.navigation = Some(Navigation::Flat);
        b.compiler_options.insert("strict".to_string(), json!(true));
        b.entry_points_dts = false;

        let merged = merge_configs(vec![a, b], &diags).unwrap();
        assert_eq!(diags.count_code(codes::MERGE_SETTING_IGNORED), 2);
        assert!(merged.navigation.is_none());
        assert!(!merged.entry_points_dts);
        assert!(!merged.has_compiler_options);
    }
}
