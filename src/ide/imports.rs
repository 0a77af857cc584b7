//! Import suggestions for undefined names.

use smol_str::SmolStr;
use text_size::TextRange;

use super::analysis::Located;
use crate::base::constants::is_reserved_name;
use crate::base::text_utils::expression_range;
use crate::project::{ModuleTable, ProjectEntry, TextSnapshot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSuggestion {
    pub name: SmolStr,
    pub module: SmolStr,
}

impl ImportSuggestion {
    /// `from module import name`
    pub fn statement(&self) -> String {
        format!("from {} import {}", self.module, self.name)
    }
}

pub(crate) fn missing_imports(
    table: &ModuleTable,
    entry: &ProjectEntry,
    snapshot: &TextSnapshot,
    range: TextRange,
) -> Vec<ImportSuggestion> {
    let text = snapshot.text();
    let range = expression_range(text, snapshot.clamp(range));
    let name = &text[range];
    if !is_bare_name(name) || is_reserved_name(name) {
        return Vec::new();
    }
    let Some(located) = Located::find(entry, snapshot, range.start()) else {
        return Vec::new();
    };
    if located.analysis.lookup(located.scope, name).is_some()
        || !located.evaluate(table, name).is_empty()
    {
        return Vec::new();
    }

    let own = entry.module_name();
    table
        .index()
        .modules_exporting(name)
        .into_iter()
        .filter(|module| Some(module) != own)
        .map(|module| ImportSuggestion {
            name: SmolStr::new(name),
            module,
        })
        .collect()
}

fn is_bare_name(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
