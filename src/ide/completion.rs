//! Completion suggestions implementation.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::analysis::Located;
use super::context::{LexicalContext, lexical_context};
use crate::base::text_utils::{line_prefix, word_before};
use crate::hir::{
    Evaluator, ModuleAnalysis, ModuleResolver, ScopeId, Value, describe, resolve_relative,
    union_into,
};
use crate::parser::{EXPRESSION_KEYWORDS, STATEMENT_KEYWORDS};
use crate::project::{ModuleTable, ProjectEntry, TextSnapshot};

/// Kind of completion item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionKind {
    Module,
    Class,
    Function,
    Field,
    Variable,
    Keyword,
    File,
    Folder,
}

impl CompletionKind {
    /// Convert to LSP completion item kind number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            CompletionKind::Function => 3,
            CompletionKind::Field => 5,
            CompletionKind::Variable => 6,
            CompletionKind::Class => 7,
            CompletionKind::Module => 9,
            CompletionKind::Keyword => 14,
            CompletionKind::File => 17,
            CompletionKind::Folder => 19,
        }
    }
}

/// A completion suggestion.
#[derive(Clone, Debug)]
pub struct CompletionItem {
    /// The text to insert.
    pub label: Arc<str>,
    /// The kind of completion.
    pub kind: CompletionKind,
    /// Detail text (shown after label).
    pub detail: Option<Arc<str>>,
    /// Documentation (shown in popup).
    pub documentation: Option<Arc<str>>,
    /// Text to insert (if different from label).
    pub insert_text: Option<Arc<str>>,
    /// Sort priority (lower = higher priority).
    pub sort_priority: u32,
}

impl CompletionItem {
    /// Create a new completion item.
    pub fn new(label: impl Into<Arc<str>>, kind: CompletionKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            insert_text: None,
            sort_priority: 100,
        }
    }

    /// Set the insert text.
    pub fn with_insert_text(mut self, text: impl Into<Arc<str>>) -> Self {
        self.insert_text = Some(text.into());
        self
    }

    /// Set the sort priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.sort_priority = priority;
        self
    }

    /// Create from a name and the values bound to it.
    pub fn from_values(name: &str, values: &[Value], member: bool) -> Self {
        let kind = match values.first() {
            Some(Value::Module(_)) => CompletionKind::Module,
            Some(Value::Class(_)) | Some(Value::Type(_)) => CompletionKind::Class,
            Some(Value::Function(_)) => CompletionKind::Function,
            _ if member => CompletionKind::Field,
            _ => CompletionKind::Variable,
        };
        let mut item = Self::new(name, kind);
        if !values.is_empty() {
            item.detail = Some(Arc::from(describe(values)));
        }
        if let Some(doc) = values.iter().find_map(Value::doc) {
            item.documentation = Some(Arc::from(doc));
        }
        item.sort_priority = if name.starts_with('_') { 60 } else { 20 };
        item
    }

    fn module(name: &str) -> Self {
        Self::new(name, CompletionKind::Module).with_priority(20)
    }
}

/// Completions at the end of `range`.
pub(crate) fn completions(
    table: &ModuleTable,
    entry: &ProjectEntry,
    snapshot: &TextSnapshot,
    range: TextRange,
) -> Vec<CompletionItem> {
    let text = snapshot.text();
    let offset = snapshot.clamp(range).end();
    let mut items = match lexical_context(text, offset) {
        LexicalContext::Comment => return Vec::new(),
        LexicalContext::String(typed) => path_completions(entry.path(), &typed),
        LexicalContext::ModuleName { package: None } => table
            .top_level_modules()
            .iter()
            .map(|m| CompletionItem::module(m))
            .collect(),
        LexicalContext::ModuleName {
            package: Some(package),
        } => match absolute_module(entry, &package) {
            Some(package) => table
                .submodules(&package)
                .iter()
                .map(|m| CompletionItem::module(m))
                .collect(),
            None => Vec::new(),
        },
        LexicalContext::ImportedName { module } => match absolute_module(entry, &module) {
            Some(module) => imported_names(table, entry, &module),
            None => Vec::new(),
        },
        LexicalContext::EmptyLine => match entry.analysis() {
            Some(analysis) => scope_names(table, &analysis, ScopeId::ROOT),
            None => Vec::new(),
        },
        LexicalContext::Member { target } => match Located::find(entry, snapshot, offset) {
            Some(located) => member_names(table, &located, &target),
            None => Vec::new(),
        },
        LexicalContext::Name => {
            let mut items = match Located::find(entry, snapshot, offset) {
                Some(located) => scope_names(table, &located.analysis, located.scope),
                None => Vec::new(),
            };
            items.extend(keyword_completions(at_statement_start(text, offset)));
            items
        }
    };

    // Sort by priority, keeping the first item of each label
    items.sort_by_key(|item| item.sort_priority);
    let mut seen = FxHashSet::default();
    items.retain(|item| seen.insert(item.label.clone()));
    items
}

/// Resolve a possibly relative module name typed in an import.
fn absolute_module(entry: &ProjectEntry, typed: &str) -> Option<String> {
    let level = typed.chars().take_while(|c| *c == '.').count();
    let tail = &typed[level..];
    resolve_relative(
        entry.module_name().map(SmolStr::as_str),
        entry.is_package(),
        level as u32,
        (!tail.is_empty()).then_some(tail),
    )
}

fn scope_names(table: &ModuleTable, analysis: &ModuleAnalysis, scope: ScopeId) -> Vec<CompletionItem> {
    let eval = Evaluator::new(analysis, table);
    eval.visible_names(analysis, scope)
        .iter()
        .map(|(name, values)| {
            let item = CompletionItem::from_values(name, values, false);
            if analysis.lookup(scope, name).is_none() {
                // Builtin
                item.with_priority(40)
            } else {
                item
            }
        })
        .collect()
}

fn member_names(table: &ModuleTable, located: &Located, target: &str) -> Vec<CompletionItem> {
    let eval = Evaluator::new(&located.analysis, table);
    let mut members: Vec<(SmolStr, Vec<Value>)> = Vec::new();
    for value in located.evaluate(table, target) {
        for (name, values) in eval.members(&value) {
            match members.iter_mut().find(|(n, _)| *n == name) {
                Some((_, existing)) => union_into(existing, values),
                None => members.push((name, values)),
            }
        }
    }
    members
        .iter()
        .map(|(name, values)| CompletionItem::from_values(name, values, true))
        .collect()
}

fn imported_names(table: &ModuleTable, entry: &ProjectEntry, module: &str) -> Vec<CompletionItem> {
    let home = match entry.analysis() {
        Some(analysis) => analysis,
        None => Arc::new(ModuleAnalysis::empty(
            entry.key().clone(),
            entry.module_name().cloned(),
            0,
        )),
    };
    let eval = Evaluator::new(&home, table);
    eval.members(&Value::Module(SmolStr::new(module)))
        .iter()
        .map(|(name, values)| CompletionItem::from_values(name, values, true))
        .collect()
}

/// Whether the word being typed is the first token of its line.
fn at_statement_start(text: &str, offset: TextSize) -> bool {
    let word = &text[word_before(text, offset)];
    line_prefix(text, offset).trim_start() == word
}

/// Get keyword completions.
fn keyword_completions(statement_start: bool) -> Vec<CompletionItem> {
    let statements = STATEMENT_KEYWORDS.iter().filter(|_| statement_start);
    statements
        .chain(EXPRESSION_KEYWORDS)
        .map(|keyword| CompletionItem::new(*keyword, CompletionKind::Keyword).with_priority(80))
        .collect()
}

/// Files and folders next to the entry's file, following the path typed
/// inside the string so far.
fn path_completions(file: Option<&Path>, typed: &str) -> Vec<CompletionItem> {
    let Some(base) = file.and_then(Path::parent) else {
        return Vec::new();
    };
    let dir = match typed.rfind(['/', '\\']) {
        Some(i) => {
            let typed_dir = Path::new(&typed[..=i]);
            if typed_dir.is_absolute() {
                typed_dir.to_path_buf()
            } else {
                base.join(typed_dir)
            }
        }
        None => base.to_path_buf(),
    };
    let Ok(read) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut items: Vec<CompletionItem> = read
        .flatten()
        .map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if is_dir {
                let insert = format!("{}/", name);
                CompletionItem::new(name, CompletionKind::Folder)
                    .with_insert_text(insert)
                    .with_priority(20)
            } else {
                CompletionItem::new(name, CompletionKind::File).with_priority(30)
            }
        })
        .collect();
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ide::test_support::Fixture;

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_ref()).collect()
    }

    fn complete(fixture: &Fixture, entry: &ProjectEntry, text: &str) -> Vec<CompletionItem> {
        let snapshot = fixture.snapshot(entry, text);
        completions(
            fixture.table(),
            entry,
            &snapshot,
            TextRange::empty(TextSize::of(text)),
        )
    }

    #[test]
    fn test_member_completions_follow_inferred_type() {
        let mut fixture = Fixture::new();
        let entry = fixture.module("m", "x = 1\n");
        let items = complete(&fixture, &entry, "x = 1\nx.");
        assert!(labels(&items).contains(&"bit_length"));
        assert!(!labels(&items).contains(&"upper"));

        fixture.reanalyze(&entry, "x = 'a'\n");
        let items = complete(&fixture, &entry, "x = 'a'\nx.");
        assert!(labels(&items).contains(&"upper"));
        assert!(!labels(&items).contains(&"bit_length"));
    }

    #[test]
    fn test_comment_has_no_completions() {
        let mut fixture = Fixture::new();
        let entry = fixture.module("m", "x = 1\n");
        assert!(complete(&fixture, &entry, "x = 1\n# x.").is_empty());
    }

    #[test]
    fn test_import_completion_lists_top_level_modules() {
        let mut fixture = Fixture::new();
        let entry = fixture.module("m", "");
        fixture.module("pkg.inner", "VALUE = 1\n");
        let items = complete(&fixture, &entry, "import ");
        let top = labels(&items);
        assert!(top.contains(&"os"));
        assert!(top.contains(&"pkg"));
        assert!(!top.iter().any(|l| l.contains('.')));

        let items = complete(&fixture, &entry, "import pkg.");
        assert_eq!(labels(&items), vec!["inner"]);
        let items = complete(&fixture, &entry, "import os.");
        assert!(labels(&items).contains(&"path"));
    }

    #[test]
    fn test_from_import_lists_module_members() {
        let mut fixture = Fixture::new();
        let entry = fixture.module("m", "");
        fixture.module("helpers", "def tool(a):\n    pass\n_hidden = 1\n");
        let items = complete(&fixture, &entry, "from helpers import ");
        let tool = items.iter().find(|i| i.label.as_ref() == "tool").unwrap();
        assert_eq!(tool.kind, CompletionKind::Function);
    }

    #[test]
    fn test_empty_line_offers_module_scope_only() {
        let mut fixture = Fixture::new();
        let source = "top = 1\ndef f(local):\n    inner = 2\n";
        let entry = fixture.module("m", source);
        let text = format!("{}\n", source);
        let items = complete(&fixture, &entry, &text);
        let labels = labels(&items);
        assert!(labels.contains(&"top"));
        assert!(labels.contains(&"f"));
        assert!(!labels.contains(&"inner"));
        assert!(!labels.contains(&"local"));
        assert!(!labels.contains(&"def"));
    }

    #[test]
    fn test_name_completion_inside_function() {
        let mut fixture = Fixture::new();
        let source = "top = 1\ndef f(local):\n    inner = 2\n    re";
        let entry = fixture.module("m", source);
        let items = complete(&fixture, &entry, source);
        let labels = labels(&items);
        assert!(labels.contains(&"local"));
        assert!(labels.contains(&"inner"));
        assert!(labels.contains(&"top"));
        assert!(labels.contains(&"len"));
        assert!(labels.contains(&"return"));
        // Locals sort before builtins and keywords.
        let position = |name: &str| labels.iter().position(|l| *l == name).unwrap();
        assert!(position("inner") < position("len"));
        assert!(position("len") < position("return"));
    }

    #[test]
    fn test_string_completes_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/input.csv"), "").unwrap();
        std::fs::write(dir.path().join("main.py"), "").unwrap();

        let items = path_completions(Some(&dir.path().join("main.py")), "da");
        assert_eq!(labels(&items), vec!["data", "main.py"]);
        assert_eq!(items[0].kind, CompletionKind::Folder);

        let items = path_completions(Some(&dir.path().join("main.py")), "data/in");
        assert_eq!(labels(&items), vec!["input.csv"]);
        assert!(path_completions(None, "x").is_empty());
    }

    #[test]
    fn test_completion_kind_to_lsp() {
        assert_eq!(CompletionKind::Module.to_lsp(), 9);
        assert_eq!(CompletionKind::Class.to_lsp(), 7);
        assert_eq!(CompletionKind::Keyword.to_lsp(), 14);
    }
}
