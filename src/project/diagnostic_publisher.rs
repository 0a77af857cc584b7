//! Diagnostics publishing.
//!
//! The engine pushes diagnostics to a host-provided [`DiagnosticSink`]
//! after every analysis. Sinks are called from the analysis thread and must
//! be safe to call from any thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::entry::ProjectEntry;
use crate::hir::{Diagnostic, Severity};

/// Receiver of per-file diagnostics, e.g. an editor's error list.
pub trait DiagnosticSink: Send + Sync {
    fn add_errors(&self, path: &Path, diagnostics: &[Diagnostic]);
    fn add_warnings(&self, path: &Path, diagnostics: &[Diagnostic]);
    fn clear(&self, path: &Path);
    /// Everything for the current round has been reported.
    fn refresh(&self);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn add_errors(&self, _path: &Path, _diagnostics: &[Diagnostic]) {}
    fn add_warnings(&self, _path: &Path, _diagnostics: &[Diagnostic]) {}
    fn clear(&self, _path: &Path) {}
    fn refresh(&self) {}
}

/// In-memory sink, useful for tests and batch tools.
#[derive(Debug, Default)]
pub struct CollectingSink {
    files: Mutex<FxHashMap<PathBuf, Published>>,
    refreshes: AtomicUsize,
}

#[derive(Debug, Default, Clone)]
struct Published {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn errors(&self, path: &Path) -> Vec<Diagnostic> {
        self.files
            .lock()
            .get(path)
            .map(|p| p.errors.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self, path: &Path) -> Vec<Diagnostic> {
        self.files
            .lock()
            .get(path)
            .map(|p| p.warnings.clone())
            .unwrap_or_default()
    }

    /// Paths with at least one published diagnostic.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .files
            .lock()
            .iter()
            .filter(|(_, p)| !p.errors.is_empty() || !p.warnings.is_empty())
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl DiagnosticSink for CollectingSink {
    fn add_errors(&self, path: &Path, diagnostics: &[Diagnostic]) {
        let mut files = self.files.lock();
        let published = files.entry(path.to_path_buf()).or_default();
        published.errors.extend(diagnostics.iter().cloned());
    }

    fn add_warnings(&self, path: &Path, diagnostics: &[Diagnostic]) {
        let mut files = self.files.lock();
        let published = files.entry(path.to_path_buf()).or_default();
        published.warnings.extend(diagnostics.iter().cloned());
    }

    fn clear(&self, path: &Path) {
        self.files.lock().remove(path);
    }

    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Publishes an entry's diagnostics, replacing what was published before.
pub struct DiagnosticPublisher {
    sink: Arc<dyn DiagnosticSink>,
}

impl DiagnosticPublisher {
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Publish syntax and semantic diagnostics of `entry`. Entries without
    /// a path publish nothing.
    pub fn publish(&self, entry: &ProjectEntry) {
        let Some(path) = entry.path() else {
            return;
        };
        let (errors, warnings): (Vec<Diagnostic>, Vec<Diagnostic>) = entry
            .diagnostics()
            .into_iter()
            .partition(|d| d.severity == Severity::Error);
        trace!(
            path = %path.display(),
            errors = errors.len(),
            warnings = warnings.len(),
            "publishing diagnostics"
        );
        self.sink.clear(path);
        if !errors.is_empty() {
            self.sink.add_errors(path, &errors);
        }
        if !warnings.is_empty() {
            self.sink.add_warnings(path, &warnings);
        }
        self.sink.refresh();
    }

    pub fn clear(&self, path: &Path) {
        self.sink.clear(path);
        self.sink.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::entry::{EntryId, EntryKind};

    #[test]
    fn test_collecting_sink_replaces_on_clear() {
        let sink = CollectingSink::new();
        let path = Path::new("/p/a.py");
        sink.add_errors(path, &[Diagnostic::error(0, 0, "bad")]);
        sink.add_warnings(path, &[Diagnostic::warning(1, 0, "meh")]);
        assert_eq!(sink.errors(path).len(), 1);
        assert_eq!(sink.paths(), vec![path.to_path_buf()]);
        sink.clear(path);
        assert!(sink.errors(path).is_empty());
        assert!(sink.paths().is_empty());
    }

    #[test]
    fn test_transient_entries_publish_nothing() {
        let sink = CollectingSink::new();
        let publisher = DiagnosticPublisher::new(sink.clone());
        let entry = ProjectEntry::new(
            EntryId::new(7),
            EntryKind::Transient,
            None,
            "console".into(),
            None,
            false,
        );
        publisher.publish(&entry);
        assert_eq!(sink.refresh_count(), 0);
    }
}
