//! Syntax file wrapper for parsed source files.

use crate::base::{LanguageVersion, LineIndex};
use crate::parser::{Module, parse_with_options};
use crate::syntax::parser::{ParseError, ParseErrorKind, parse_options};

/// A parsed source file: the (possibly partial) tree, its errors and the
/// line index used to report positions.
#[derive(Debug, Clone)]
pub struct SyntaxFile {
    module: Module,
    errors: Vec<ParseError>,
    line_index: LineIndex,
}

impl SyntaxFile {
    /// Parse `source` for the given language version.
    pub fn new(source: &str, version: LanguageVersion) -> Self {
        let line_index = LineIndex::new(source);
        let parse = parse_with_options(source, parse_options(version));
        let mut errors: Vec<ParseError> = parse
            .errors
            .iter()
            .map(|e| ParseError::syntax_error(e.message.clone(), e.range, &line_index))
            .collect();
        errors.extend(
            parse
                .inconsistent_indents
                .iter()
                .map(|range| ParseError::inconsistent_indentation(*range, &line_index)),
        );
        Self {
            module: parse.module,
            errors,
            line_index,
        }
    }

    /// Join several files submitted together into one composite file.
    ///
    /// Statements keep the ranges of the buffer they came from; positions
    /// are reported against the last part.
    pub fn concat(parts: Vec<SyntaxFile>) -> Self {
        let mut errors = Vec::new();
        let mut line_index = LineIndex::new("");
        let mut modules = Vec::with_capacity(parts.len());
        for part in parts {
            errors.extend(part.errors);
            line_index = part.line_index;
            modules.push(part.module);
        }
        Self {
            module: Module::concat(modules),
            errors,
            line_index,
        }
    }

    /// Get the syntax tree
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Get parse errors and indentation warnings
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Check if parsing had syntax errors
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.kind == ParseErrorKind::Syntax)
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }
}
