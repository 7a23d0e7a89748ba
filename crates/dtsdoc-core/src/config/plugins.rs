//! Link plugin registry.

use crate::diagnostics::DiagnosticSink;
use crate::error::{codes, Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// A known link plugin: cross-references into an external API catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkPlugin {
    /// Browser DOM globals.
    Dom,
    /// Web worker globals.
    Worker,
    /// Node.js built-in modules.
    Node,
    /// Deno namespace.
    Deno,
}

/// Plugins that describe the same globals differently and cannot be combined.
const EXCLUSIVE_GROUPS: &[&[LinkPlugin]] = &[&[LinkPlugin::Dom, LinkPlugin::Worker]];

impl LinkPlugin {
    pub const ALL: [LinkPlugin; 4] = [Self::Dom, Self::Worker, Self::Node, Self::Deno];

    /// Name as written in requests.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Dom => "dom",
            Self::Worker => "worker",
            Self::Node => "node",
            Self::Deno => "deno",
        }
    }

    /// Module the generator loads for this plugin.
    #[must_use]
    pub fn module(self) -> &'static str {
        match self {
            Self::Dom => "@dtsdoc/link-dom",
            Self::Worker => "@dtsdoc/link-worker",
            Self::Node => "@dtsdoc/link-node",
            Self::Deno => "@dtsdoc/link-deno",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for LinkPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialized as the backing module, which is what the generator consumes.
impl Serialize for LinkPlugin {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.module())
    }
}

/// Translate requested names into plugins.
///
/// Unknown names are warned about and dropped; duplicates keep their first
/// position. Fails if two mutually exclusive plugins are both present.
pub fn resolve_link_plugins(
    names: &[String],
    sink: &dyn DiagnosticSink,
) -> Result<Vec<LinkPlugin>> {
    let mut plugins = Vec::new();
    for name in names {
        match LinkPlugin::from_name(name) {
            Some(plugin) if !plugins.contains(&plugin) => plugins.push(plugin),
            Some(_) => {}
            None => {
                let known: Vec<&str> = LinkPlugin::ALL.iter().map(|p| p.name()).collect();
                sink.warn(
                    codes::UNKNOWN_LINK_PLUGIN,
                    format!(
                        "unknown link plugin '{name}' ignored (known: {})",
                        known.join(", ")
                    ),
                );
            }
        }
    }
    check_exclusive(&plugins)?;
    Ok(plugins)
}

/// Fail on the first mutually exclusive pair present in `plugins`.
pub fn check_exclusive(plugins: &[LinkPlugin]) -> Result<()> {
    for group in EXCLUSIVE_GROUPS {
        let present: Vec<LinkPlugin> = group
            .iter()
            .copied()
            .filter(|p| plugins.contains(p))
            .collect();
        if let [first, second, ..] = present.as_slice() {
            return Err(Error::InvalidLinkPluginCombination {
                first: first.name().to_string(),
                second: second.name().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_known_plugins_translated_and_deduplicated() {
        let diags = Diagnostics::new();
        let plugins = resolve_link_plugins(&names(&["node", "dom", "node"]), &diags).unwrap();

        assert_eq!(plugins, [LinkPlugin::Node, LinkPlugin::Dom]);
        assert_eq!(
            serde_json::to_value(&plugins).unwrap(),
            serde_json::json!(["@dtsdoc/link-node", "@dtsdoc/link-dom"])
        );
    }

    #[test]
    fn test_unknown_plugin_warns_and_drops() {
        let diags = Diagnostics::new();
        let plugins = resolve_link_plugins(&names(&["dom", "react"]), &diags).unwrap();

        assert_eq!(plugins, [LinkPlugin::Dom]);
        assert_eq!(diags.count_code(codes::UNKNOWN_LINK_PLUGIN), 1);
    }

    #[test]
    fn test_dom_and_worker_conflict() {
        let diags = Diagnostics::new();
        let err = resolve_link_plugins(&names(&["worker", "node", "dom"]), &diags).unwrap_err();

        assert_eq!(err.code(), codes::INVALID_LINK_PLUGIN_COMBINATION);
        assert_eq!(err.to_string(), "Link plugins 'dom' and 'worker' cannot be used together");
    }

    #[test]
    fn test_round_trip_names() {
        for plugin in LinkPlugin::ALL {
            assert_eq!(LinkPlugin::from_name(plugin.name()), Some(plugin));
        }
        assert_eq!(LinkPlugin::from_name("DOM"), None);
    }
}
