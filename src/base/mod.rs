//! Foundation types for the analysis engine.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`Position`], [`Span`] - Line/column positions
//! - [`LineIndex`] - Offset to line/column conversion
//! - [`TextRange`], [`TextSize`] - Source positions (byte offsets)
//! - Text utilities used by the query layer
//! - Domain constants (file extensions, package marker)
//! - [`LanguageVersion`] - the language level being analyzed
//!
//! This module has NO dependencies on other crate modules.

pub mod constants;
mod position;
pub mod text_utils;
mod version;

pub use position::{LineIndex, Position, Span};
pub use version::LanguageVersion;

pub use text_size::{TextRange, TextSize};
