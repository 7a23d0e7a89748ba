//! Error types and stable codes for dtsdoc.

use std::path::PathBuf;
use thiserror::Error;

/// Stable error and warning codes. These are part of the public output
/// (`--json`) and must not change. New codes may be added.
pub mod codes {
    // Errors
    pub const MANIFEST_NOT_FOUND: &str = "MANIFEST_NOT_FOUND";
    pub const MANIFEST_READ_FAILED: &str = "MANIFEST_READ_FAILED";
    pub const MANIFEST_INVALID: &str = "MANIFEST_INVALID";
    pub const NO_ENTRY_POINTS: &str = "NO_ENTRY_POINTS";
    pub const INVALID_COMPILER_OPTIONS: &str = "INVALID_COMPILER_OPTIONS";
    pub const INVALID_LINK_PLUGIN_COMBINATION: &str = "INVALID_LINK_PLUGIN_COMBINATION";
    pub const MODULE_NAME_COLLISION: &str = "MODULE_NAME_COLLISION";
    pub const INVALID_FIELD: &str = "INVALID_FIELD";
    pub const CONFIG_READ_FAILED: &str = "CONFIG_READ_FAILED";
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    // Warnings
    pub const INVALID_DECLARATION_FILE: &str = "INVALID_DECLARATION_FILE";
    pub const UNKNOWN_LINK_PLUGIN: &str = "UNKNOWN_LINK_PLUGIN";
    pub const UNKNOWN_COMPILER_OPTION: &str = "UNKNOWN_COMPILER_OPTION";
    pub const MANIFEST_FIELD_NOT_STRING: &str = "MANIFEST_FIELD_NOT_STRING";
    pub const EXPORTS_DUPLICATE_KEY: &str = "EXPORTS_DUPLICATE_KEY";
    pub const EXPORTS_MIXED_KEYS: &str = "EXPORTS_MIXED_KEYS";
    pub const EXPORTS_INVALID_TARGET: &str = "EXPORTS_INVALID_TARGET";
    pub const ENTRY_NOT_FOUND: &str = "ENTRY_NOT_FOUND";
    pub const ENTRY_UNSUPPORTED_EXTENSION: &str = "ENTRY_UNSUPPORTED_EXTENSION";
    pub const TYPEDOC_OPTION_OVERRIDDEN: &str = "TYPEDOC_OPTION_OVERRIDDEN";
    pub const MERGE_SETTING_IGNORED: &str = "MERGE_SETTING_IGNORED";

    // Info
    pub const MANIFEST_LOADED: &str = "MANIFEST_LOADED";
    pub const EXPORT_RESOLVED: &str = "EXPORT_RESOLVED";
    pub const EXPORT_NO_MATCH: &str = "EXPORT_NO_MATCH";
    pub const ENTRY_POINT: &str = "ENTRY_POINT";
    pub const ENTRY_PATTERN_UNEXPANDED: &str = "ENTRY_PATTERN_UNEXPANDED";
    pub const TYPES_FALLBACK: &str = "TYPES_FALLBACK";
    pub const WORKSPACE_MEMBER: &str = "WORKSPACE_MEMBER";
}

/// Result alias used throughout dtsdoc-core.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dtsdoc operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No package.json found from {}", start.display())]
    ManifestNotFound { start: PathBuf },

    #[error("Failed to read manifest at {}: {source}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error("No entry points found in {} for condition '{condition}'", origin.display())]
    NoEntryPoints { origin: PathBuf, condition: String },

    #[error("Invalid compiler options:\n  {}", diagnostics.join("\n  "))]
    InvalidCompilerOptions { diagnostics: Vec<String> },

    #[error("Link plugins '{first}' and '{second}' cannot be used together")]
    InvalidLinkPluginCombination { first: String, second: String },

    #[error("Module '{module}' is named both '{existing}' and '{incoming}'")]
    ModuleNameCollision {
        module: String,
        existing: String,
        incoming: String,
    },

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Failed to read config at {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },
}

impl Error {
    /// Create an invalid-field error naming the offending field.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ManifestNotFound { .. } => codes::MANIFEST_NOT_FOUND,
            Self::ManifestRead { .. } => codes::MANIFEST_READ_FAILED,
            Self::ManifestParse { .. } => codes::MANIFEST_INVALID,
            Self::NoEntryPoints { .. } => codes::NO_ENTRY_POINTS,
            Self::InvalidCompilerOptions { .. } => codes::INVALID_COMPILER_OPTIONS,
            Self::InvalidLinkPluginCombination { .. } => codes::INVALID_LINK_PLUGIN_COMBINATION,
            Self::ModuleNameCollision { .. } => codes::MODULE_NAME_COLLISION,
            Self::InvalidField { .. } => codes::INVALID_FIELD,
            Self::ConfigRead { .. } => codes::CONFIG_READ_FAILED,
            Self::ConfigParse { .. } => codes::CONFIG_INVALID,
        }
    }

    /// The request field this error is about, when there is one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
            Self::InvalidCompilerOptions { .. } => Some("compilerOptions"),
            Self::InvalidLinkPluginCombination { .. } => Some("linkPlugins"),
            Self::ModuleNameCollision { .. } => Some("moduleNames"),
            _ => None,
        }
    }
}
