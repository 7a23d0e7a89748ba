//! Diagnostics -> tracing.

use crate::logging::TARGET;
use dtsdoc_core::{Diagnostic, DiagnosticSink, Severity};

/// Forwards core diagnostics to tracing, with the code as a field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let Diagnostic {
            code,
            severity,
            message,
        } = diagnostic;
        match severity {
            Severity::Info => tracing::info!(target: TARGET, code = %code, "{message}"),
            Severity::Warn => tracing::warn!(target: TARGET, code = %code, "{message}"),
            Severity::Error => tracing::error!(target: TARGET, code = %code, "{message}"),
        }
    }
}
