//! Syntax-level parsing interface.
//!
//! Converts parser output into line/column [`ParseError`]s and loads source
//! text from disk.

use crate::base::{LanguageVersion, LineIndex, Span};
use crate::parser::ParseOptions;
use std::path::Path;
use text_size::TextRange;

/// What kind of problem a [`ParseError`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// The text is not valid source.
    Syntax,
    /// Indentation mixes tabs and spaces so its meaning depends on tab width.
    InconsistentIndentation,
}

/// Parse error with line/column information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub range: TextRange,
    pub span: Span,
}

impl ParseError {
    pub fn syntax_error(message: impl Into<String>, range: TextRange, lines: &LineIndex) -> Self {
        Self {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
            range,
            span: lines.span(range),
        }
    }

    pub fn inconsistent_indentation(range: TextRange, lines: &LineIndex) -> Self {
        Self {
            kind: ParseErrorKind::InconsistentIndentation,
            message: "inconsistent use of tabs and spaces in indentation".to_string(),
            range,
            span: lines.span(range),
        }
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line() + 1, self.column() + 1, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parser switches for a language version.
pub fn parse_options(version: LanguageVersion) -> ParseOptions {
    ParseOptions {
        print_statement: version.is_legacy(),
    }
}

/// Load file contents.
///
/// A UTF-8 byte order mark is dropped and invalid UTF-8 is replaced rather
/// than rejected, so a badly encoded file still gets analyzed.
pub fn load_file(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
