//! Diagnostics — Syntax and semantic error reporting.
//!
//! Every diagnostic belongs to one project entry, so it carries no file of
//! its own; the publisher attaches the path when it hands diagnostics to
//! the sink.

use std::sync::Arc;

use crate::base::Span;
use crate::syntax::{ParseError, ParseErrorKind};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Start line (0-indexed).
    pub start_line: u32,
    /// Start column (0-indexed).
    pub start_col: u32,
    /// End line (0-indexed).
    pub end_line: u32,
    /// End column (0-indexed).
    pub end_col: u32,
    /// Severity level.
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(line: u32, col: u32, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Error, line, col, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(line: u32, col: u32, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Warning, line, col, message)
    }

    pub fn new(severity: Severity, line: u32, col: u32, message: impl Into<Arc<str>>) -> Self {
        Self {
            start_line: line,
            start_col: col,
            end_line: line,
            end_col: col,
            severity,
            code: None,
            message: message.into(),
        }
    }

    /// Create a diagnostic covering `span`.
    pub fn at(severity: Severity, span: Span, message: impl Into<Arc<str>>) -> Self {
        Self::new(
            severity,
            span.start.line as u32,
            span.start.column as u32,
            message,
        )
        .with_span(span.end.line as u32, span.end.column as u32)
    }

    /// Convert a parse error. Indentation inconsistencies take the
    /// configured severity; `None` drops them.
    pub fn from_parse_error(error: &ParseError, indentation: Option<Severity>) -> Option<Self> {
        let (severity, code) = match error.kind {
            ParseErrorKind::Syntax => (Severity::Error, codes::SYNTAX_ERROR),
            ParseErrorKind::InconsistentIndentation => {
                (indentation?, codes::INCONSISTENT_INDENTATION)
            }
        };
        Some(Self::at(severity, error.span, error.message.as_str()).with_code(code))
    }

    /// Set the span (range) for this diagnostic.
    pub fn with_span(mut self, end_line: u32, end_col: u32) -> Self {
        self.end_line = end_line;
        self.end_col = end_col;
        self
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Code Ranges
///
/// - **E0001-E0099**: Errors (syntax, misplaced statements, malformed resources)
/// - **W0001-W0099**: Warnings (resolution gaps, indentation)
pub mod codes {
    /// Source text does not parse.
    pub const SYNTAX_ERROR: &str = "E0001";
    /// `return` outside of a function body.
    pub const RETURN_OUTSIDE_FUNCTION: &str = "E0002";
    /// Markup resource could not be scanned.
    pub const MALFORMED_RESOURCE: &str = "E0003";

    /// Import that no known module satisfies.
    pub const UNRESOLVED_IMPORT: &str = "W0001";
    /// Tabs and spaces mixed in one block.
    pub const INCONSISTENT_INDENTATION: &str = "W0002";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during semantic analysis.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an unresolved import warning.
    pub fn unresolved_import(&mut self, span: Span, module: &str) {
        self.add(
            Diagnostic::at(
                Severity::Warning,
                span,
                format!("unresolved import: '{}'", module),
            )
            .with_code(codes::UNRESOLVED_IMPORT),
        );
    }

    /// Add a `return` outside function error.
    pub fn return_outside_function(&mut self, span: Span) {
        self.add(
            Diagnostic::at(Severity::Error, span, "'return' outside function")
                .with_code(codes::RETURN_OUTSIDE_FUNCTION),
        );
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| !d.is_error()).count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.is_error())
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
