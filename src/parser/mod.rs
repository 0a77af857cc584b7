//! Source parser
//!
//! This module turns source text into an owned syntax tree using:
//! - **logos** for fast lexing
//! - a hand-written recursive descent parser with per-statement recovery
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → physical tokens with SyntaxKind
//!     ↓
//! Layout pass → logical lines (NEWLINE / INDENT / DEDENT)
//!     ↓
//! Parser → Module (owned AST, every node ranged)
//!     ↓
//! HIR → Semantic model
//! ```
//!
//! A parse never fails outright: syntax errors are collected next to
//! whatever part of the tree could be recovered.

#[allow(clippy::module_inception)]
mod parser;

pub mod ast;
pub mod lexer;
mod syntax_kind;

pub use ast::*;
pub use lexer::{Lexer, Token, raw_tokens, tokenize};
pub use parser::{Parse, ParseOptions, SyntaxError, parse, parse_expression, parse_with_options};
pub use syntax_kind::{EXPRESSION_KEYWORDS, STATEMENT_KEYWORDS, SyntaxKind};
