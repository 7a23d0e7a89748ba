#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::doc_markdown)]

mod generate;
mod logging;
mod sink;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dtsdoc")]
#[command(
    author,
    version,
    about = "Resolve a package's exports into a documentation config",
    long_about = None
)]
pub struct Cli {
    /// Entry file, package.json, or package directory (default: nearest package.json)
    pub path: Option<PathBuf>,

    /// Export condition to resolve (default: types)
    #[arg(long, value_name = "NAME")]
    pub condition: Option<String>,

    /// Output directory for the generated docs (default: docs)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out: Option<String>,

    /// Display name for the package
    #[arg(long)]
    pub name: Option<String>,

    /// tsconfig.json supplying base compiler options
    #[arg(long, value_name = "FILE")]
    pub tsconfig: Option<PathBuf>,

    /// typedoc.json supplying generator options
    #[arg(long, value_name = "FILE")]
    pub typedoc_json: Option<PathBuf>,

    /// Link plugin to enable (dom, worker, node, deno); repeatable
    #[arg(long = "link-plugin", value_name = "NAME")]
    pub link_plugins: Vec<String>,

    /// Navigation layout: compact or flat
    #[arg(long)]
    pub navigation: Option<String>,

    /// Module display name as ID=NAME; repeatable
    #[arg(long = "module-name", value_name = "ID=NAME", value_parser = parse_module_name)]
    pub module_names: Vec<(String, String)>,

    /// JSON request file; flags override its fields
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Resolve every workspace member and merge them
    #[arg(long)]
    pub workspaces: bool,

    /// Drop non-declaration files found under the types condition
    #[arg(long)]
    pub strict_declarations: bool,

    /// Override the working directory
    #[arg(long, value_name = "PATH", env = "DTSDOC_CWD")]
    pub cwd: Option<PathBuf>,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long)]
    pub json: bool,
}

fn parse_module_name(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((id, name)) if !id.is_empty() && !name.is_empty() => {
            Ok((id.to_string(), name.to_string()))
        }
        _ => Err(format!("expected ID=NAME, got '{s}'")),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

    logging::init(cli.verbose, cli.json);
    tracing::debug!(target: logging::TARGET, cwd = %cwd.display(), "starting");

    generate::run(&cli, &cwd)
}
