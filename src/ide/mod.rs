//! Query façade over published facts.
//!
//! Everything here reads an [`Analysis`] (one published module table) plus
//! the caller's [`TextSnapshot`](crate::project::TextSnapshot). The text
//! decides where the cursor is; the attached analysis decides what names
//! mean. When the two disagree, because an edit is still being analyzed,
//! queries answer from the older facts rather than waiting.
//!
//! ## Usage
//!
//! ```ignore
//! let analysis = engine.analysis();
//! let info = analysis.analyze_expression(&entry, &snapshot, range);
//! println!("{}", info.description());
//! ```

mod analysis;
mod completion;
mod context;
mod expression;
mod imports;
mod signatures;

pub use analysis::Analysis;
pub use completion::{CompletionItem, CompletionKind};
pub use context::{LexicalContext, lexical_context};
pub use expression::ExpressionInfo;
pub use imports::ImportSuggestion;
pub use signatures::SignatureHelp;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::base::LanguageVersion;
    use crate::hir::{ExportedSurface, ModuleContext, analyze_module};
    use crate::project::{
        AnalysisCookie, EntryContent, EntryId, EntryKind, ModuleTable, ProjectEntry, TextBuffer,
        TextSnapshot, standard_database,
    };
    use crate::project::ParseOutcome;
    use crate::syntax::SyntaxFile;

    /// A module table filled by analyzing sources synchronously.
    pub(crate) struct Fixture {
        table: ModuleTable,
        next: u32,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            let database = standard_database(LanguageVersion::default());
            Self {
                table: ModuleTable::new(Arc::new(database)),
                next: 1,
            }
        }

        pub(crate) fn table(&self) -> &ModuleTable {
            &self.table
        }

        pub(crate) fn module(&mut self, name: &str, text: &str) -> Arc<ProjectEntry> {
            let path = PathBuf::from(format!("/proj/{}.py", name.replace('.', "/")));
            let entry = Arc::new(ProjectEntry::new(
                EntryId::new(self.next),
                EntryKind::SourceModule,
                Some(path),
                name.into(),
                Some(name.into()),
                false,
            ));
            self.next += 1;
            self.table.insert(entry.clone(), None);
            self.reanalyze(&entry, text);
            entry
        }

        pub(crate) fn reanalyze(&mut self, entry: &ProjectEntry, text: &str) {
            let snapshot = self.snapshot(entry, text);
            let file = SyntaxFile::new(text, LanguageVersion::default());
            entry.apply_parse(ParseOutcome {
                content: EntryContent::Source(Arc::new(file)),
                failed: false,
                diagnostics: Vec::new(),
                cookie: AnalysisCookie::of(&[snapshot]),
            });
            let Some((EntryContent::Source(file), version)) = entry.content_for_analysis() else {
                panic!("fixture entry has no source");
            };
            let cx = ModuleContext {
                key: entry.key().clone(),
                module_name: entry.module_name().cloned(),
                is_package: entry.is_package(),
                version,
                resolver: &self.table,
                report_unresolved_imports: false,
            };
            let mut analysis = analyze_module(&file, &cx);
            analysis.set_surface(ExportedSurface::compute(&analysis, &self.table));
            let names = analysis.surface().names().cloned().collect();
            entry.attach_analysis(Arc::new(analysis));
            if let Some(name) = entry.module_name() {
                self.table.index_mut().add_module(name.clone(), names);
            }
        }

        pub(crate) fn snapshot(&self, entry: &ProjectEntry, text: &str) -> TextSnapshot {
            let path = entry.path().map(PathBuf::from).unwrap_or_default();
            TextBuffer::new(path, text).snapshot()
        }
    }
}
