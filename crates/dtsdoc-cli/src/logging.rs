//! Logging initialization for the CLI.
//!
//! Logging is owned by the CLI crate; the library crates report through a
//! `DiagnosticSink` instead.

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Target used for every dtsdoc log line.
pub const TARGET: &str = "dtsdoc";

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = WARN, 1 = DEBUG, 2+ = TRACE
/// * `json` - If true, output JSON lines to stderr
///
/// JSON output format:
/// ```json
/// {"timestamp":"...","level":"WARN",
///  "fields":{"code":"ENTRY_NOT_FOUND","message":"..."},"target":"dtsdoc"}
/// ```
pub fn init(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG is honoured; the verbosity flag raises the dtsdoc target.
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Ok(directive) = format!("{TARGET}={level}").parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
