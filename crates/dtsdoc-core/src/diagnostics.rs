//! Diagnostics channel.
//!
//! Every stage takes a `&dyn DiagnosticSink` instead of logging directly, so the
//! library stays free of a logging dependency and tests can inspect exactly
//! what was reported. The CLI forwards diagnostics to `tracing`.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Diagnostic severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// A diagnostic with a stable code (see [`crate::error::codes`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity,
            message: message.into(),
        }
    }
}

/// Receiver for diagnostics emitted by the pipeline.
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: Diagnostic);

    fn info(&self, code: &str, message: String) {
        self.emit(Diagnostic::new(Severity::Info, code, message));
    }

    fn warn(&self, code: &str, message: String) {
        self.emit(Diagnostic::new(Severity::Warn, code, message));
    }

    fn error(&self, code: &str, message: String) {
        self.emit(Diagnostic::new(Severity::Error, code, message));
    }
}

/// Sink that records diagnostics in emission order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn items(&self) -> Vec<Diagnostic> {
        self.items.borrow().clone()
    }

    #[must_use]
    pub fn with_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.items
            .borrow()
            .iter()
            .filter(|d| d.severity == severity)
            .cloned()
            .collect()
    }

    /// Returns true if any diagnostic with `code` was recorded.
    #[must_use]
    pub fn has_code(&self, code: &str) -> bool {
        self.items.borrow().iter().any(|d| d.code == code)
    }

    #[must_use]
    pub fn count_code(&self, code: &str) -> usize {
        self.items.borrow().iter().filter(|d| d.code == code).count()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.items.into_inner()
    }
}

impl DiagnosticSink for Diagnostics {
    fn emit(&self, diagnostic: Diagnostic) {
        self.items.borrow_mut().push(diagnostic);
    }
}
