//! The generate command: flags/request file -> validated config on stdout.

use crate::sink::TracingSink;
use crate::Cli;
use dtsdoc_core::config::read_json_object;
use dtsdoc_core::version::version_string;
use dtsdoc_core::{
    plan, DeclarationPolicy, DiagnosticSink, GenerateConfig, GenerateRequest, PlanOptions,
};
use dtsdoc_util::path::absolutize;
use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use std::path::Path;

/// Run the command, printing the config (or the JSON error) to stdout.
pub fn run(cli: &Cli, cwd: &Path) -> Result<()> {
    let sink = TracingSink;
    let outcome = match build_request(cli, cwd) {
        Ok(request) => {
            let options = PlanOptions::new(cwd).workspaces(cli.workspaces);
            plan(&request, &options, &sink)
        }
        Err(e) => {
            sink.error(e.code(), e.to_string());
            Err(e)
        }
    };

    match outcome {
        Ok(config) => {
            if cli.json {
                let body = serde_json::json!({ "ok": true, "config": config });
                println!("{}", serde_json::to_string_pretty(&body).into_diagnostic()?);
            } else {
                print_summary(&config);
            }
            Ok(())
        }
        Err(e) => {
            if cli.json {
                let mut error = serde_json::json!({
                    "code": e.code(),
                    "message": e.to_string(),
                });
                if let Some(field) = e.field() {
                    error["field"] = Value::from(field);
                }
                let body = serde_json::json!({ "ok": false, "error": error });
                println!("{}", serde_json::to_string_pretty(&body).into_diagnostic()?);
            }
            // The sink has already logged the failure.
            std::process::exit(1);
        }
    }
}

/// Request file first, then explicit flags on top.
fn build_request(cli: &Cli, cwd: &Path) -> dtsdoc_core::Result<GenerateRequest> {
    let mut request = match &cli.request {
        Some(file) => {
            let object = read_json_object(&absolutize(cwd, file))?;
            GenerateRequest::from_value(&Value::Object(object))?
        }
        None => GenerateRequest::default(),
    };

    if cli.path.is_some() {
        request.path.clone_from(&cli.path);
    }
    if cli.condition.is_some() {
        request.condition.clone_from(&cli.condition);
    }
    if cli.out.is_some() {
        request.output.clone_from(&cli.out);
    }
    if cli.name.is_some() {
        request.name.clone_from(&cli.name);
    }
    if cli.tsconfig.is_some() {
        request.tsconfig.clone_from(&cli.tsconfig);
    }
    if cli.typedoc_json.is_some() {
        request.typedoc_json.clone_from(&cli.typedoc_json);
    }
    if cli.navigation.is_some() {
        request.navigation.clone_from(&cli.navigation);
    }
    if !cli.link_plugins.is_empty() {
        request.link_plugins = Some(cli.link_plugins.clone());
    }
    if !cli.module_names.is_empty() {
        request
            .module_names
            .get_or_insert_with(Vec::new)
            .extend(cli.module_names.iter().cloned());
    }
    if cli.strict_declarations {
        request.declaration_policy = DeclarationPolicy::Exclude;
    }
    Ok(request)
}

fn print_summary(config: &GenerateConfig) {
    println!("{}", version_string());
    if let Some(name) = &config.name {
        println!("Package:    {name}");
    }
    println!("Condition:  {}", config.condition);
    println!("Output:     {}", config.output.display());
    if let Some(path) = &config.path {
        println!("Path:       {}", path.display());
    }
    for manifest in &config.manifests {
        println!("Manifest:   {}", manifest.display());
    }
    println!();
    println!("Entry points ({}):", config.entry_points.len());
    for entry in config.entry_points.iter() {
        println!("  {}", entry.display());
    }
    if !config.link_plugins.is_empty() {
        println!();
        println!("Link plugins:");
        for plugin in &config.link_plugins {
            println!("  {plugin} ({})", plugin.module());
        }
    }
    if !config.module_names.is_empty() {
        println!();
        println!("Module names:");
        for (module, display) in config.module_names.iter() {
            println!("  {module} -> {display}");
        }
    }
    if config.has_compiler_options {
        println!();
        println!("Compiler options: {}", config.compiler_options.len());
    }
}
