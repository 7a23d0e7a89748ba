#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

//! Resolves a package's published module surface into documentation entry
//! points and assembles the validated generation config.
//!
//! Pipeline: [`manifest`] -> [`resolver`] -> [`entry`] -> [`config`] ->
//! [`merge`] (workspaces only). [`plan`] wires the stages together.

pub mod config;
pub mod diagnostics;
pub mod entry;
pub mod error;
pub mod manifest;
pub mod merge;
pub mod plan;
pub mod resolver;
pub mod version;

pub use config::{
    BuiltinCompilerOptions, CompilerOptionsValidator, ConfigValidator, GenerateConfig,
    GenerateRequest, LinkPlugin, Navigation, DEFAULT_OUTPUT_DIR,
};
pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, Severity};
pub use entry::{collect_entry_points, DeclarationPolicy, EntryPointSet, EntryPointSetBuilder};
pub use error::{Error, Result};
pub use manifest::{
    detect_workspaces, discover_manifest, find_manifest, load_manifest, Manifest, MANIFEST_FILE,
};
pub use merge::{merge_configs, ModuleNameTable};
pub use plan::{plan, PlanOptions};
pub use resolver::{resolve_exports, ConditionSet, ExportMap, ExportsTree, DEFAULT_CONDITION};
pub use version::{version_string, VERSION};
