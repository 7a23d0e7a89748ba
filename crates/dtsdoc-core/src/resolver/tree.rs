//! Parsed form of a package.json `exports` value.

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use std::fmt;

/// A node of the `exports` field.
///
/// Objects keep their entries in declaration order, duplicates included, so
/// that the resolver can apply last-declaration-wins and report the clash.
/// `serde_json::Value` would already have collapsed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportsTree {
    /// `"./dist/index.d.ts"`
    Target(String),
    /// `null`: explicitly not exported.
    Null,
    /// Array target: first entry that resolves wins.
    Fallbacks(Vec<ExportsTree>),
    /// Object whose keys are all conditions (`types`, `import`, ...).
    Conditions(Vec<(String, ExportsTree)>),
    /// Object whose keys are all subpaths (`.`, `./sub`, `./*`).
    Subpaths(Vec<(String, ExportsTree)>),
    /// Object mixing subpath and condition keys. Node rejects these.
    Mixed(Vec<(String, ExportsTree)>),
    /// A number or boolean where a target was expected.
    Unsupported(&'static str),
}

impl ExportsTree {
    /// Build a tree from an already-parsed JSON value.
    ///
    /// Duplicate keys cannot be observed this way; parse the manifest text
    /// directly when they matter.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::String(s) => Self::Target(s.clone()),
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Unsupported("boolean"),
            Value::Number(_) => Self::Unsupported("number"),
            Value::Array(items) => Self::Fallbacks(items.iter().map(Self::from_value).collect()),
            Value::Object(map) => Self::classify(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_value(v)))
                    .collect(),
            ),
        }
    }

    fn classify(entries: Vec<(String, ExportsTree)>) -> Self {
        let subpaths = entries.iter().filter(|(k, _)| is_subpath_key(k)).count();
        if subpaths == 0 {
            Self::Conditions(entries)
        } else if subpaths == entries.len() {
            Self::Subpaths(entries)
        } else {
            Self::Mixed(entries)
        }
    }

    /// Short description of the node kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Target(_) => "string",
            Self::Null => "null",
            Self::Fallbacks(_) => "array",
            Self::Conditions(_) => "conditions object",
            Self::Subpaths(_) => "subpath object",
            Self::Mixed(_) => "mixed object",
            Self::Unsupported(kind) => kind,
        }
    }
}

/// Subpath keys start with `.`; everything else is a condition name.
#[must_use]
pub fn is_subpath_key(key: &str) -> bool {
    key.starts_with('.')
}

impl<'de> Deserialize<'de> for ExportsTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ExportsTreeVisitor)
    }
}

struct ExportsTreeVisitor;

impl<'de> Visitor<'de> for ExportsTreeVisitor {
    type Value = ExportsTree;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a package.json exports value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ExportsTree::Target(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ExportsTree::Target(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ExportsTree::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(ExportsTree::Null)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(ExportsTree::Unsupported("boolean"))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Ok(ExportsTree::Unsupported("number"))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Ok(ExportsTree::Unsupported("number"))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(ExportsTree::Unsupported("number"))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<ExportsTree>()? {
            items.push(item);
        }
        Ok(ExportsTree::Fallbacks(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, ExportsTree>()? {
            entries.push((key, value));
        }
        Ok(ExportsTree::classify(entries))
    }
}
