//! Request -> final config, for one package or a whole workspace.

use crate::config::{ConfigValidator, GenerateConfig, GenerateRequest};
use crate::diagnostics::DiagnosticSink;
use crate::error::{codes, Error, Result};
use crate::manifest::{detect_workspaces, discover_manifest, load_manifest, Manifest, MANIFEST_FILE};
use crate::merge::merge_configs;
use crate::resolver::DEFAULT_CONDITION;
use dtsdoc_util::path::absolutize;
use std::path::PathBuf;

/// Options for [`plan`].
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Directory relative paths and manifest discovery start from.
    pub cwd: PathBuf,
    /// Resolve every workspace member of the root manifest and merge them.
    pub workspaces: bool,
}

impl PlanOptions {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            workspaces: false,
        }
    }

    #[must_use]
    pub fn workspaces(mut self, workspaces: bool) -> Self {
        self.workspaces = workspaces;
        self
    }
}

/// Validate `request` into the config handed to the generator.
///
/// A failure is also emitted to `sink` at error severity; compiler option
/// problems are emitted one diagnostic each.
pub fn plan(
    request: &GenerateRequest,
    options: &PlanOptions,
    sink: &dyn DiagnosticSink,
) -> Result<GenerateConfig> {
    let validator = ConfigValidator::new(&options.cwd, sink);
    let result = if options.workspaces {
        plan_workspaces(&validator, request, sink)
    } else {
        validator.validate(request)
    };

    match &result {
        Err(Error::InvalidCompilerOptions { diagnostics }) => {
            for message in diagnostics {
                sink.error(codes::INVALID_COMPILER_OPTIONS, message.clone());
            }
        }
        Err(err) => sink.error(err.code(), err.to_string()),
        Ok(_) => {}
    }
    result
}

fn plan_workspaces(
    validator: &ConfigValidator<'_>,
    request: &GenerateRequest,
    sink: &dyn DiagnosticSink,
) -> Result<GenerateConfig> {
    let root = workspace_root(validator, request, sink)?;
    let Some(members) = detect_workspaces(&root, sink)? else {
        return Err(Error::invalid_field(
            "workspaces",
            format!("{} declares no workspaces", root.path.display()),
        ));
    };
    if members.is_empty() {
        return Err(Error::NoEntryPoints {
            origin: root.directory,
            condition: request
                .condition
                .clone()
                .unwrap_or_else(|| DEFAULT_CONDITION.to_string()),
        });
    }

    if request.name.is_some() && members.len() > 1 {
        sink.warn(
            codes::MERGE_SETTING_IGNORED,
            "'name' names a single package; ignoring it for a multi-package run".to_string(),
        );
    }

    let single = members.len() == 1;
    let mut configs = Vec::with_capacity(members.len());
    for member in members {
        let member_request = GenerateRequest {
            path: Some(member),
            name: if single { request.name.clone() } else { None },
            ..request.clone()
        };
        configs.push(validator.validate(&member_request)?);
    }

    if single {
        return Ok(configs.remove(0));
    }
    merge_configs(configs, sink)
}

/// The manifest whose `workspaces` field drives the run.
fn workspace_root(
    validator: &ConfigValidator<'_>,
    request: &GenerateRequest,
    sink: &dyn DiagnosticSink,
) -> Result<Manifest> {
    match &request.path {
        Some(path) => {
            let abs = absolutize(validator.cwd(), path);
            let manifest = if abs.is_dir() { abs.join(MANIFEST_FILE) } else { abs };
            load_manifest(&manifest, sink)
        }
        None => discover_manifest(validator.cwd(), sink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostics, Severity};
    use serde_json::{json, Map};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn monorepo(root: &Path) {
        write(
            &root.join(MANIFEST_FILE),
            r#"{"name":"root","private":true,"workspaces":["packages/*"]}"#,
        );
        write(
            &root.join("packages/a/package.json"),
            r#"{"name":"pkg-a","exports":{".":{"types":"./index.d.ts"}}}"#,
        );
        write(&root.join("packages/a/index.d.ts"), "export {};\n");
        write(
            &root.join("packages/b/package.json"),
            r#"{"name":"pkg-b","types":"./lib/b.d.ts"}"#,
        );
        write(&root.join("packages/b/lib/b.d.ts"), "export {};\n");
    }

    #[test]
    fn test_plan_single_package() {
        let dir = tempdir().unwrap();
        write(&dir.path().join(MANIFEST_FILE), r#"{"types":"./i.d.ts"}"#);
        write(&dir.path().join("i.d.ts"), "export {};\n");

        let diags = Diagnostics::new();
        let config = plan(
            &GenerateRequest::default(),
            &PlanOptions::new(dir.path()),
            &diags,
        )
        .unwrap();
        assert_eq!(config.entry_points.len(), 1);
        assert!(diags.has_code(codes::MANIFEST_LOADED));
    }

    #[test]
    fn test_plan_workspaces_merges_members() {
        let dir = tempdir().unwrap();
        monorepo(dir.path());

        let diags = Diagnostics::new();
        let config = plan(
            &GenerateRequest::default(),
            &PlanOptions::new(dir.path()).workspaces(true),
            &diags,
        )
        .unwrap();

        assert_eq!(config.entry_points.len(), 2);
        assert!(config
            .entry_points
            .contains(&dir.path().join("packages/b/lib/b.d.ts")));
        assert_eq!(
            config.manifests,
            vec![
                dir.path().join("packages/a/package.json"),
                dir.path().join("packages/b/package.json"),
            ]
        );
        assert!(config.name.is_none());
        assert_eq!(diags.count_code(codes::WORKSPACE_MEMBER), 2);
    }

    #[test]
    fn test_plan_workspaces_without_field() {
        let dir = tempdir().unwrap();
        write(&dir.path().join(MANIFEST_FILE), r#"{"types":"./i.d.ts"}"#);

        let diags = Diagnostics::new();
        let err = plan(
            &GenerateRequest::default(),
            &PlanOptions::new(dir.path()).workspaces(true),
            &diags,
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("workspaces"));
        assert_eq!(diags.with_severity(Severity::Error).len(), 1);
    }

    #[test]
    fn test_plan_workspaces_no_members() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join(MANIFEST_FILE),
            r#"{"workspaces":["packages/*"]}"#,
        );

        let diags = Diagnostics::new();
        let err = plan(
            &GenerateRequest::default(),
            &PlanOptions::new(dir.path()).workspaces(true),
            &diags,
        )
        .unwrap_err();
        assert_eq!(err.code(), codes::NO_ENTRY_POINTS);
    }

    #[test]
    fn test_plan_single_member_keeps_name() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join(MANIFEST_FILE),
            r#"{"workspaces":["packages/*"]}"#,
        );
        write(
            &dir.path().join("packages/a/package.json"),
            r#"{"name":"pkg-a","types":"./a.d.ts"}"#,
        );
        write(&dir.path().join("packages/a/a.d.ts"), "export {};\n");

        let diags = Diagnostics::new();
        let request = GenerateRequest {
            name: Some("Package A".to_string()),
            ..Default::default()
        };
        let config = plan(
            &request,
            &PlanOptions::new(dir.path()).workspaces(true),
            &diags,
        )
        .unwrap();
        assert_eq!(config.name.as_deref(), Some("Package A"));
        assert_eq!(config.module_names.get("pkg-a"), Some("Package A"));
        assert!(config.path.is_none());
    }

    #[test]
    fn test_plan_reports_each_compiler_diagnostic() {
        let dir = tempdir().unwrap();
        write(&dir.path().join(MANIFEST_FILE), r#"{"types":"./i.d.ts"}"#);
        write(&dir.path().join("i.d.ts"), "export {};\n");

        let mut options = Map::new();
        options.insert("target".to_string(), json!("es1999"));
        options.insert("strict".to_string(), json!("yes"));
        let request = GenerateRequest {
            compiler_options: Some(options),
            ..Default::default()
        };

        let diags = Diagnostics::new();
        let err = plan(&request, &PlanOptions::new(dir.path()), &diags).unwrap_err();
        assert_eq!(err.code(), codes::INVALID_COMPILER_OPTIONS);
        assert_eq!(diags.with_severity(Severity::Error).len(), 2);
    }
}
