//! Parsed files and source loading.
pub mod file;
pub mod markup;
pub mod parser;

pub use file::SyntaxFile;
pub use markup::{MarkupFile, NamedElement, scan_markup};
pub use parser::{ParseError, ParseErrorKind, load_file, parse_options};

// Re-export Position and Span from base for convenience
pub use crate::base::{Position, Span};
