//! Analysis — read-only queries over a published module table.
//!
//! An [`Analysis`] holds one published table, so every query made through
//! it sees the same set of entries. Queries read whatever facts are
//! attached to an entry when they run; they never wait for parses or
//! analyses in progress.
//!
//! ## Usage
//!
//! ```ignore
//! let analysis = engine.analysis();
//! let entry = engine.binding_entry(binding).unwrap();
//! let items = analysis.completions(&entry, &buffer.snapshot(), cursor);
//! ```

use std::sync::Arc;

use text_size::{TextRange, TextSize};

use super::completion::{self, CompletionItem};
use super::expression::{self, ExpressionInfo};
use super::imports::{self, ImportSuggestion};
use super::signatures::{self, SignatureHelp};
use crate::base::text_utils::line_prefix;
use crate::hir::{Evaluator, ModuleAnalysis, ScopeId, Value};
use crate::parser::parse_expression;
use crate::project::{ModuleTable, ProjectEntry, TextSnapshot};

/// Snapshot of the engine's facts for querying.
#[derive(Debug, Clone)]
pub struct Analysis {
    table: Arc<ModuleTable>,
}

impl Analysis {
    pub fn new(table: Arc<ModuleTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ModuleTable {
        &self.table
    }

    /// Facts about the expression around `range`.
    pub fn analyze_expression(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> ExpressionInfo {
        expression::analyze_expression(&self.table, entry, snapshot, range)
    }

    /// Completions at the end of `range`.
    pub fn completions(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> Vec<CompletionItem> {
        completion::completions(&self.table, entry, snapshot, range)
    }

    /// Signature help for the call enclosing the end of `range`.
    pub fn signatures(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> Option<SignatureHelp> {
        signatures::signatures(&self.table, entry, snapshot, range)
    }

    /// Modules that could be imported to define the name at `range`.
    pub fn missing_imports(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> Vec<ImportSuggestion> {
        imports::missing_imports(&self.table, entry, snapshot, range)
    }
}

/// An entry's analysis and the scope enclosing a cursor.
pub(super) struct Located {
    pub analysis: Arc<ModuleAnalysis>,
    pub scope: ScopeId,
}

impl Located {
    pub fn find(entry: &ProjectEntry, snapshot: &TextSnapshot, offset: TextSize) -> Option<Self> {
        let analysis = entry.analysis()?;
        let prefix = line_prefix(snapshot.text(), offset);
        let indent = prefix.len() - prefix.trim_start().len();
        let scope = analysis.scope_at(snapshot.position(offset), Some(indent));
        Some(Self { analysis, scope })
    }

    /// Values of the expression `text` evaluated in the located scope.
    pub fn evaluate(&self, table: &ModuleTable, text: &str) -> Vec<Value> {
        let Some(expr) = parse_expression(text) else {
            return Vec::new();
        };
        Evaluator::new(&self.analysis, table).eval(&self.analysis, self.scope, &expr)
    }
}
