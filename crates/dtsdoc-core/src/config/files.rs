//! On-disk config inputs: `tsconfig.json` and `typedoc.json`.

use crate::error::{Error, Result};
use crate::manifest::json_kind;
use dtsdoc_util::fs::read_to_string_lossy;
use dtsdoc_util::jsonc::strip_jsonc;
use dtsdoc_util::path::absolutize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Deepest `extends` chain followed before giving up.
const MAX_EXTENDS_DEPTH: usize = 16;

/// Read a JSONC file whose top level must be an object.
pub fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let source = read_to_string_lossy(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&strip_jsonc(&source)).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::ConfigParse {
            path: path.to_path_buf(),
            message: format!("top level must be an object, found {}", json_kind(&other)),
        }),
    }
}

/// `compilerOptions` of a tsconfig, with relative `extends` bases merged
/// underneath (base first, extending file wins per key).
///
/// `extends` may be a string or, as in TypeScript 5, an array of strings;
/// later array entries win over earlier ones. Package-name bases
/// (`"@tsconfig/node18/tsconfig.json"`) are not followed; resolving them
/// needs node_modules lookup.
pub fn tsconfig_compiler_options(path: &Path) -> Result<Map<String, Value>> {
    let mut merged = Map::new();
    collect_compiler_options(path, &mut Vec::new(), &mut merged)?;
    Ok(merged)
}

/// Overlay `path`'s bases, then `path` itself, onto `merged`. `stack` holds
/// the files currently being expanded.
fn collect_compiler_options(
    path: &Path,
    stack: &mut Vec<PathBuf>,
    merged: &mut Map<String, Value>,
) -> Result<()> {
    if stack.iter().any(|p| p == path) {
        return Err(Error::ConfigParse {
            path: path.to_path_buf(),
            message: "circular \"extends\"".to_string(),
        });
    }
    if stack.len() == MAX_EXTENDS_DEPTH {
        return Err(Error::ConfigParse {
            path: path.to_path_buf(),
            message: format!("\"extends\" chain deeper than {MAX_EXTENDS_DEPTH}"),
        });
    }

    let config = read_json_object(path)?;
    stack.push(path.to_path_buf());
    for base in extends_bases(path, &config)? {
        collect_compiler_options(&base, stack, merged)?;
    }
    stack.pop();

    if let Some(options) = object_field(path, &config, "compilerOptions")? {
        for (k, v) in options {
            merged.insert(k.clone(), v.clone());
        }
    }
    Ok(())
}

/// Relative `extends` entries of `config`, resolved against `path`'s directory.
fn extends_bases(path: &Path, config: &Map<String, Value>) -> Result<Vec<PathBuf>> {
    let names: Vec<&str> = match config.get("extends") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(base)) => vec![base.as_str()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| Error::ConfigParse {
                    path: path.to_path_buf(),
                    message: format!(
                        "\"extends\" entries must be strings, found {}",
                        json_kind(item)
                    ),
                })
            })
            .collect::<Result<_>>()?,
        Some(other) => {
            return Err(Error::ConfigParse {
                path: path.to_path_buf(),
                message: format!(
                    "\"extends\" must be a string or an array, found {}",
                    json_kind(other)
                ),
            })
        }
    };

    let dir = path.parent().unwrap_or(Path::new("."));
    Ok(names
        .into_iter()
        .filter(|base| base.starts_with('.'))
        .map(|base| {
            let mut base_path = absolutize(dir, Path::new(base));
            if base_path.extension().is_none() {
                base_path.set_extension("json");
            }
            base_path
        })
        .collect())
}

/// An optional field that must be an object when present.
pub fn object_field<'a>(
    path: &Path,
    config: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a Map<String, Value>>> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(Error::ConfigParse {
            path: path.to_path_buf(),
            message: format!("\"{field}\" must be an object, found {}", json_kind(other)),
        }),
    }
}
