//! # serpent-base
//!
//! Incremental background analysis for Python source trees: parsing,
//! scope and type inference, cross-module tracking, and editor queries
//! (expression facts, completions, signature help, import suggestions).
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → Queries over published facts (completion, signatures, imports)
//!   ↓
//! project   → Engine, analysis actor, parse/analysis queues, buffers
//!   ↓
//! hir       → Scopes, lazy value inference, type database, export index
//!   ↓
//! syntax    → SyntaxFile, markup resources, ParseError
//!   ↓
//! parser    → Logos lexer, recursive-descent parser, AST
//!   ↓
//! base      → Primitives (LineIndex, Position, TextRange, constants)
//! ```
//!
//! The engine's query methods are thin wrappers over [`ide::Analysis`].

// ============================================================================
// MODULES (dependency order: base → parser → syntax → hir → project → ide)
// ============================================================================

/// Foundation types: positions, text ranges, language version
pub mod base;

/// Parser: Logos lexer, recursive-descent parser, AST
pub mod parser;

/// Syntax: parsed files, markup resources, parse errors
pub mod syntax;

/// Semantic model: scopes, values, type database
pub mod hir;

/// Engine and pipeline: entries, buffers, queues, diagnostics
pub mod project;

/// Query façade: expressions, completions, signatures, imports
pub mod ide;

// Re-export the engine surface
pub use project::{
    BindingHandle, Engine, EngineConfig, EngineError, EntryStatus, ProjectEntry, Result,
    TextBuffer, TextSnapshot,
};

// Re-export foundation types
pub use base::{LanguageVersion, LineIndex, Position, Span, TextRange, TextSize};
