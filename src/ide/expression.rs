//! Facts about the expression under the cursor.

use text_size::TextRange;

use super::analysis::Located;
use crate::base::text_utils::expression_range;
use crate::hir::{Value, describe};
use crate::project::{ModuleTable, ProjectEntry, TextSnapshot};

#[derive(Debug, Clone)]
pub struct ExpressionInfo {
    /// The complete expression the request was extended to.
    pub range: TextRange,
    pub text: String,
    pub values: Vec<Value>,
    /// False when the entry had no analysis attached yet.
    pub analyzed: bool,
}

impl ExpressionInfo {
    /// No known value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `int | str`, or `unknown`.
    pub fn description(&self) -> String {
        describe(&self.values)
    }

    pub fn doc(&self) -> Option<&str> {
        self.values.iter().find_map(Value::doc)
    }
}

pub(crate) fn analyze_expression(
    table: &ModuleTable,
    entry: &ProjectEntry,
    snapshot: &TextSnapshot,
    range: TextRange,
) -> ExpressionInfo {
    let text = snapshot.text();
    let range = expression_range(text, snapshot.clamp(range));
    let mut info = ExpressionInfo {
        range,
        text: text[range].to_string(),
        values: Vec::new(),
        analyzed: false,
    };
    let Some(located) = Located::find(entry, snapshot, range.start()) else {
        return info;
    };
    info.analyzed = true;
    if !info.text.is_empty() {
        info.values = located.evaluate(table, &info.text);
    }
    info
}
