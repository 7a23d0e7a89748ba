//! Package manifest (`package.json`) discovery and parsing.

mod workspaces;

pub use workspaces::detect_workspaces;

use crate::diagnostics::DiagnosticSink;
use crate::error::{codes, Error, Result};
use crate::resolver::ExportsTree;
use dtsdoc_util::fs::{is_file, read_to_string_lossy};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

/// A parsed package manifest. Immutable after loading.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Directory containing the manifest; export targets resolve against it.
    pub directory: PathBuf,
    /// Path of the manifest file itself.
    pub path: PathBuf,
    pub name: Option<String>,
    pub exports: Option<ExportsTree>,
    pub types: Option<String>,
    pub typings: Option<String>,
    /// The whole document, for fields resolution does not care about.
    pub raw: Value,
}

/// The fields resolution reads. Parsed from the manifest text directly (not
/// from `raw`) so `exports` keeps duplicate keys.
#[derive(Deserialize)]
struct ManifestFields {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    exports: Option<ExportsTree>,
    #[serde(default)]
    types: Option<Value>,
    #[serde(default)]
    typings: Option<Value>,
}

impl Manifest {
    /// Parse manifest text read from `path`.
    pub fn parse(path: &Path, source: &str, sink: &dyn DiagnosticSink) -> Result<Self> {
        let parse_err = |message: String| Error::ManifestParse {
            path: path.to_path_buf(),
            message,
        };

        let raw: Value = serde_json::from_str(source).map_err(|e| parse_err(e.to_string()))?;
        if !raw.is_object() {
            return Err(parse_err("top level must be an object".to_string()));
        }
        let fields: ManifestFields =
            serde_json::from_str(source).map_err(|e| parse_err(e.to_string()))?;

        let directory = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Ok(Self {
            directory,
            path: path.to_path_buf(),
            name: string_field(path, "name", fields.name, sink),
            exports: fields.exports,
            types: string_field(path, "types", fields.types, sink),
            typings: string_field(path, "typings", fields.typings, sink),
            raw,
        })
    }

    /// Display label: the package name, or the manifest path when unnamed.
    #[must_use]
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Keep a string-valued field; anything else is ignored with a warning.
fn string_field(
    path: &Path,
    field: &str,
    value: Option<Value>,
    sink: &dyn DiagnosticSink,
) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => {
            sink.warn(
                codes::MANIFEST_FIELD_NOT_STRING,
                format!(
                    "\"{field}\" in {} must be a string, found {}; ignoring it",
                    path.display(),
                    json_kind(&other)
                ),
            );
            None
        }
    }
}

/// Human name for a JSON value's type.
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Find the nearest manifest by walking up from `start`.
///
/// Returns the path of the first `package.json` found, or `None`.
#[must_use]
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let candidate = current.join(MANIFEST_FILE);
        if is_file(&candidate) {
            return Some(candidate);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Read and parse the manifest at `path`.
pub fn load_manifest(path: &Path, sink: &dyn DiagnosticSink) -> Result<Manifest> {
    if !is_file(path) {
        return Err(Error::ManifestNotFound {
            start: path.to_path_buf(),
        });
    }
    let source = read_to_string_lossy(path).map_err(|source| Error::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest = Manifest::parse(path, &source, sink)?;
    sink.info(
        codes::MANIFEST_LOADED,
        format!("loaded {} ({})", path.display(), manifest.label()),
    );
    Ok(manifest)
}

/// Locate the nearest manifest from `start` and load it.
pub fn discover_manifest(start: &Path, sink: &dyn DiagnosticSink) -> Result<Manifest> {
    let path = find_manifest(start).ok_or_else(|| Error::ManifestNotFound {
        start: start.to_path_buf(),
    })?;
    load_manifest(&path, sink)
}
