use std::fmt;

use crate::ast::Span;

/// A single static diagnostic, per spec §6's upstream contract: `(line, col,
/// message)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.span, self.message)
    }
}

/// The error sink interface the three core passes are specified against
/// (spec §6): records a diagnostic and increments a fatal count. Name
/// analysis, type check, and code generation never abort on their own —
/// whether to proceed past a pass with a non-zero fatal count is the
/// driver's decision (spec §7).
pub trait ErrorSink {
    fn report(&mut self, span: Span, message: impl Into<String>);
    fn fatal_count(&self) -> usize;
}

/// A concrete `ErrorSink` that simply collects diagnostics in the order
/// reported. The CLI driver uses this and prints the collected diagnostics
/// if any pass reported one.
#[derive(Debug, Default, Clone)]
pub struct CollectingErrorSink {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl ErrorSink for CollectingErrorSink {
    fn report(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            span,
            message: message.into(),
        });
    }

    fn fatal_count(&self) -> usize {
        self.diagnostics.len()
    }
}
