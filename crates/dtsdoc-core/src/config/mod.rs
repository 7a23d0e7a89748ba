//! Generation request validation.
//!
//! [`ConfigValidator`] checks a [`GenerateRequest`] field by field, failing on
//! the first invalid one, then resolves the manifest (or explicit path) and
//! produces the immutable [`GenerateConfig`] handed to the generator.

mod compiler;
mod files;
mod plugins;

pub use compiler::{BuiltinCompilerOptions, CompilerOptionsValidator};
pub use files::{read_json_object, tsconfig_compiler_options};
pub use plugins::{check_exclusive, resolve_link_plugins, LinkPlugin};

use crate::diagnostics::DiagnosticSink;
use crate::entry::{
    collect_entry_points, is_allowed_entry, is_declaration_file, DeclarationPolicy,
    EntryPointSet, EntryPointSetBuilder,
};
use crate::error::{codes, Error, Result};
use crate::manifest::{find_manifest, json_kind, load_manifest, MANIFEST_FILE};
use crate::merge::ModuleNameTable;
use crate::resolver::{resolve_exports, ConditionSet, DEFAULT_CONDITION};
use dtsdoc_util::fs::is_file;
use dtsdoc_util::path::absolutize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output directory when the request does not name one.
pub const DEFAULT_OUTPUT_DIR: &str = "docs";

/// typedoc options the assembled config derives itself.
const RESERVED_TYPEDOC_KEYS: &[&str] = &["entryPoints", "out", "tsconfig", "plugin"];

/// Navigation layout of the rendered docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    Compact,
    Flat,
}

impl Navigation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Flat => "flat",
        }
    }
}

impl FromStr for Navigation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "compact" => Ok(Self::Compact),
            "flat" => Ok(Self::Flat),
            other => Err(Error::invalid_field(
                "navigation",
                format!("expected one of compact, flat; found '{other}'"),
            )),
        }
    }
}

/// A generation request as supplied by the caller. Nothing here is trusted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateRequest {
    pub navigation: Option<String>,
    pub condition: Option<String>,
    pub output: Option<String>,
    /// Display name override for the package.
    pub name: Option<String>,
    /// Explicit entry file, manifest, or package directory.
    pub path: Option<PathBuf>,
    pub tsconfig: Option<PathBuf>,
    pub typedoc_options: Option<Map<String, Value>>,
    pub typedoc_json: Option<PathBuf>,
    pub link_plugins: Option<Vec<String>>,
    pub compiler_options: Option<Map<String, Value>>,
    /// Module identifier -> display name, in declaration order.
    pub module_names: Option<Vec<(String, String)>>,
    pub declaration_policy: DeclarationPolicy,
}

impl GenerateRequest {
    /// Shape-check a JSON request (e.g. from `--request file.json`).
    ///
    /// Keys are camelCase. `null` means unset. Unknown keys are rejected.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(fields) = value else {
            return Err(Error::invalid_field(
                "request",
                format!("expected an object, found {}", json_kind(value)),
            ));
        };

        let mut request = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "navigation" => request.navigation = string(key, value)?,
                "condition" => request.condition = string(key, value)?,
                "output" => request.output = string(key, value)?,
                "name" => request.name = string(key, value)?,
                "path" => request.path = string(key, value)?.map(PathBuf::from),
                "tsconfig" => request.tsconfig = string(key, value)?.map(PathBuf::from),
                "typedocOptions" => request.typedoc_options = object(key, value)?,
                "typedocJson" => request.typedoc_json = string(key, value)?.map(PathBuf::from),
                "linkPlugins" => request.link_plugins = string_list(key, value)?,
                "compilerOptions" => request.compiler_options = object(key, value)?,
                "moduleNames" => {
                    request.module_names = object(key, value)?
                        .map(|map| {
                            map.into_iter()
                                .map(|(id, display)| match display {
                                    Value::String(s) => Ok((id, s)),
                                    other => Err(Error::invalid_field(
                                        key,
                                        format!(
                                            "display name for '{id}' must be a string, found {}",
                                            json_kind(&other)
                                        ),
                                    )),
                                })
                                .collect::<Result<Vec<_>>>()
                        })
                        .transpose()?;
                }
                "strictDeclarations" => match value {
                    Value::Bool(true) => request.declaration_policy = DeclarationPolicy::Exclude,
                    Value::Bool(false) | Value::Null => {}
                    other => {
                        return Err(Error::invalid_field(
                            key,
                            format!("expected a boolean, found {}", json_kind(other)),
                        ))
                    }
                },
                other => return Err(Error::invalid_field(other, "unknown request field")),
            }
        }
        Ok(request)
    }
}

fn string(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(Error::invalid_field(
            field,
            format!("expected a string, found {}", json_kind(other)),
        )),
    }
}

fn object(field: &str, value: &Value) -> Result<Option<Map<String, Value>>> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map.clone())),
        other => Err(Error::invalid_field(
            field,
            format!("expected an object, found {}", json_kind(other)),
        )),
    }
}

fn string_list(field: &str, value: &Value) -> Result<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::invalid_field(
                        field,
                        format!("entries must be strings, found {}", json_kind(item)),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        other => Err(Error::invalid_field(
            field,
            format!("expected a list, found {}", json_kind(other)),
        )),
    }
}

/// The validated, immutable configuration consumed by the generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    pub condition: String,
    pub output: PathBuf,
    /// Set when an explicit entry file replaced manifest resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub entry_points: EntryPointSet,
    pub compiler_options: Map<String, Value>,
    /// Options set to `null` in some source, unsetting an inherited value.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unset_compiler_options: Vec<String>,
    pub link_plugins: Vec<LinkPlugin>,
    #[serde(rename = "dmtModuleNames")]
    pub module_names: ModuleNameTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Navigation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tsconfig: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typedoc_json: Option<PathBuf>,
    pub typedoc_options: Map<String, Value>,
    /// Manifests that contributed, in resolution order.
    pub manifests: Vec<PathBuf>,
    pub declaration_policy: DeclarationPolicy,
    pub from_package: bool,
    #[serde(rename = "entryPointsDTS")]
    pub entry_points_dts: bool,
    pub has_compiler_options: bool,
}

impl GenerateConfig {
    /// Express this config as a request; validating it again yields an equal
    /// config (for single-manifest and explicit-path configs).
    #[must_use]
    pub fn to_request(&self) -> GenerateRequest {
        let path = self.path.clone().or_else(|| match self.manifests.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        });

        GenerateRequest {
            navigation: self.navigation.map(|n| n.as_str().to_string()),
            condition: Some(self.condition.clone()),
            output: Some(self.output.to_string_lossy().into_owned()),
            name: self.name.clone(),
            path,
            tsconfig: self.tsconfig.clone(),
            typedoc_options: Some(self.typedoc_options.clone()),
            typedoc_json: self.typedoc_json.clone(),
            link_plugins: Some(
                self.link_plugins
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect(),
            ),
            compiler_options: Some(self.request_compiler_options()),
            module_names: Some(
                self.module_names
                    .iter()
                    .map(|(id, display)| (id.to_string(), display.to_string()))
                    .collect(),
            ),
            declaration_policy: self.declaration_policy,
        }
    }

    /// Normalized options plus a `null` for each unset option, so inherited
    /// tsconfig values stay unset on re-validation.
    fn request_compiler_options(&self) -> Map<String, Value> {
        let mut options = self.compiler_options.clone();
        for name in &self.unset_compiler_options {
            options.insert(name.clone(), Value::Null);
        }
        options
    }
}

/// Where entry points come from.
enum Source {
    /// A single source/declaration file.
    Explicit(PathBuf),
    /// A package.json to resolve.
    Manifest(PathBuf),
}

/// Validates requests relative to a working directory.
pub struct ConfigValidator<'a> {
    cwd: PathBuf,
    sink: &'a dyn DiagnosticSink,
    compiler: Box<dyn CompilerOptionsValidator + 'a>,
}

impl<'a> ConfigValidator<'a> {
    /// Validator using the built-in compiler option table.
    pub fn new(cwd: impl Into<PathBuf>, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            cwd: cwd.into(),
            sink,
            compiler: Box::new(BuiltinCompilerOptions),
        }
    }

    /// Replace the compiler options validator.
    pub fn with_compiler_validator(
        mut self,
        validator: impl CompilerOptionsValidator + 'a,
    ) -> Self {
        self.compiler = Box::new(validator);
        self
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Shape-check and validate a JSON request.
    pub fn validate_value(&self, value: &Value) -> Result<GenerateConfig> {
        self.validate(&GenerateRequest::from_value(value)?)
    }

    /// Validate `request` and resolve its entry points. Fails on the first
    /// invalid field; no partial config is ever returned.
    pub fn validate(&self, request: &GenerateRequest) -> Result<GenerateConfig> {
        let navigation = request
            .navigation
            .as_deref()
            .map(str::parse::<Navigation>)
            .transpose()?;
        let condition = non_empty("condition", request.condition.as_deref())?
            .unwrap_or(DEFAULT_CONDITION)
            .to_string();
        let output = non_empty("output", request.output.as_deref())?.unwrap_or(DEFAULT_OUTPUT_DIR);
        let output = absolutize(&self.cwd, Path::new(output));
        let name_override = non_empty("name", request.name.as_deref())?.map(str::to_string);

        let link_plugins =
            resolve_link_plugins(request.link_plugins.as_deref().unwrap_or_default(), self.sink)?;

        let tsconfig = self.existing_file("tsconfig", request.tsconfig.as_deref())?;
        let typedoc_json = self.existing_file("typedocJson", request.typedoc_json.as_deref())?;
        let (typedoc_options, compiler_options, unset_compiler_options) =
            self.assemble_options(request, tsconfig.as_deref(), typedoc_json.as_deref())?;

        let mut module_names = ModuleNameTable::new();
        for (id, display) in request.module_names.iter().flatten() {
            module_names.insert(id, display)?;
        }

        let source = self.select_source(request.path.as_deref())?;
        let (path, name, entry_points, manifests) = match source {
            Source::Explicit(file) => {
                let entry_points = EntryPointSetBuilder::new().with(file.clone()).build();
                (Some(file), name_override, entry_points, Vec::new())
            }
            Source::Manifest(manifest_path) => {
                let manifest = load_manifest(&manifest_path, self.sink)?;
                let exports = resolve_exports(
                    manifest.exports.as_ref(),
                    &manifest.directory,
                    &ConditionSet::for_condition(&condition),
                    self.sink,
                );
                let entry_points = collect_entry_points(
                    &manifest,
                    &exports,
                    &condition,
                    request.declaration_policy,
                    self.sink,
                )?;
                if let (Some(package), Some(display)) = (&manifest.name, &name_override) {
                    if package != display {
                        module_names.insert(package, display)?;
                    }
                }
                let name = name_override.or_else(|| manifest.name.clone());
                (None, name, entry_points, vec![manifest.path])
            }
        };

        let entry_points_dts = match &path {
            Some(file) => is_declaration_file(file),
            None => entry_points.all_declarations(),
        };

        Ok(GenerateConfig {
            condition,
            output,
            from_package: path.is_none(),
            path,
            name,
            entry_points,
            has_compiler_options: !compiler_options.is_empty(),
            compiler_options,
            unset_compiler_options,
            link_plugins,
            module_names,
            navigation,
            tsconfig,
            typedoc_json,
            typedoc_options,
            manifests,
            declaration_policy: request.declaration_policy,
            entry_points_dts,
        })
    }

    fn existing_file(&self, field: &str, path: Option<&Path>) -> Result<Option<PathBuf>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let abs = absolutize(&self.cwd, path);
        if is_file(&abs) {
            Ok(Some(abs))
        } else {
            Err(Error::invalid_field(
                field,
                format!("file does not exist: {}", abs.display()),
            ))
        }
    }

    /// Explicit path, or the nearest manifest from the working directory.
    fn select_source(&self, path: Option<&Path>) -> Result<Source> {
        let Some(path) = path else {
            let found = find_manifest(&self.cwd).ok_or_else(|| Error::ManifestNotFound {
                start: self.cwd.clone(),
            })?;
            return Ok(Source::Manifest(found));
        };

        let abs = absolutize(&self.cwd, path);
        if abs.is_dir() {
            let manifest = abs.join(MANIFEST_FILE);
            if is_file(&manifest) {
                return Ok(Source::Manifest(manifest));
            }
            return Err(Error::invalid_field(
                "path",
                format!("directory {} has no {MANIFEST_FILE}", abs.display()),
            ));
        }
        if !is_file(&abs) {
            return Err(Error::invalid_field(
                "path",
                format!("file does not exist: {}", abs.display()),
            ));
        }
        if abs.file_name() == Some(OsStr::new(MANIFEST_FILE)) {
            return Ok(Source::Manifest(abs));
        }
        if is_allowed_entry(&abs) {
            return Ok(Source::Explicit(abs));
        }
        Err(Error::invalid_field(
            "path",
            format!(
                "{} is not a source file, declaration file, or {MANIFEST_FILE}",
                abs.display()
            ),
        ))
    }

    /// Merge typedoc options and compiler options from every source.
    ///
    /// Compiler options, lowest precedence first: tsconfig, typedoc JSON,
    /// request typedoc options, request compiler options. Returns the typedoc
    /// options, the validated compiler options, and the sorted names of
    /// options that ended up `null`.
    fn assemble_options(
        &self,
        request: &GenerateRequest,
        tsconfig: Option<&Path>,
        typedoc_json: Option<&Path>,
    ) -> Result<(Map<String, Value>, Map<String, Value>, Vec<String>)> {
        let mut compiler_sources = Vec::new();
        if let Some(path) = tsconfig {
            compiler_sources.push(tsconfig_compiler_options(path)?);
        }

        let mut typedoc = Map::new();
        if let Some(path) = typedoc_json {
            let file = read_json_object(path)?;
            self.absorb_typedoc(&mut typedoc, &mut compiler_sources, file, "typedocJson")?;
        }
        if let Some(options) = &request.typedoc_options {
            self.absorb_typedoc(
                &mut typedoc,
                &mut compiler_sources,
                options.clone(),
                "typedocOptions",
            )?;
        }
        if let Some(options) = &request.compiler_options {
            compiler_sources.push(options.clone());
        }

        let mut merged = Map::new();
        for source in compiler_sources {
            for (key, value) in source {
                merged.insert(key, value);
            }
        }
        let mut unset: Vec<String> = merged
            .iter()
            .filter(|(_, value)| value.is_null())
            .map(|(key, _)| key.clone())
            .collect();
        unset.sort();

        let compiler_options = self
            .compiler
            .validate(&merged, self.sink)
            .map_err(|diagnostics| Error::InvalidCompilerOptions { diagnostics })?;

        Ok((typedoc, compiler_options, unset))
    }

    fn absorb_typedoc(
        &self,
        typedoc: &mut Map<String, Value>,
        compiler_sources: &mut Vec<Map<String, Value>>,
        options: Map<String, Value>,
        origin: &str,
    ) -> Result<()> {
        for (key, value) in options {
            if key == "compilerOptions" {
                match value {
                    Value::Object(map) => compiler_sources.push(map),
                    Value::Null => {}
                    other => {
                        return Err(Error::invalid_field(
                            origin,
                            format!(
                                "\"compilerOptions\" must be an object, found {}",
                                json_kind(&other)
                            ),
                        ))
                    }
                }
            } else if RESERVED_TYPEDOC_KEYS.contains(&key.as_str()) {
                self.sink.warn(
                    codes::TYPEDOC_OPTION_OVERRIDDEN,
                    format!("{origin} sets \"{key}\", which dtsdoc derives itself; ignoring it"),
                );
            } else {
                typedoc.insert(key, value);
            }
        }
        Ok(())
    }
}

fn non_empty<'v>(field: &str, value: Option<&'v str>) -> Result<Option<&'v str>> {
    match value {
        Some(s) if s.trim().is_empty() => Err(Error::invalid_field(field, "must not be empty")),
        other => Ok(other),
    }
}
