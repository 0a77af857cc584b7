//! Project entries: the unit of tracked analysis state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use smol_str::SmolStr;

use super::buffer::{BufferId, TextSnapshot};
use crate::hir::{Diagnostic, ModuleAnalysis};
use crate::syntax::{MarkupFile, SyntaxFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u32);

impl EntryId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A source module backed by a file.
    SourceModule,
    /// A markup resource (`*.xaml`) whose named elements form its surface.
    ExternalResource,
    /// A buffer with no file, such as a console session.
    Transient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Unparsed,
    Parsing,
    Parsed,
    /// The last parse had syntax errors; the previous tree is kept.
    ParseFailed,
    Analyzing,
    Analyzed,
}

/// Which text produced the attached tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisCookie {
    /// Read from disk.
    Disk,
    /// Buffer versions, in submission order.
    Snapshots(Vec<(BufferId, u64)>),
}

impl AnalysisCookie {
    pub fn of(snapshots: &[TextSnapshot]) -> Self {
        AnalysisCookie::Snapshots(snapshots.iter().map(|s| (s.buffer(), s.version())).collect())
    }

    /// Whether `snapshot` is the text this cookie was produced from.
    pub fn matches(&self, snapshot: &TextSnapshot) -> bool {
        match self {
            AnalysisCookie::Disk => false,
            AnalysisCookie::Snapshots(versions) => versions
                .iter()
                .any(|&(buffer, version)| buffer == snapshot.buffer() && version == snapshot.version()),
        }
    }
}

/// A parsed tree attached to an entry.
#[derive(Debug, Clone)]
pub enum EntryContent {
    Source(Arc<SyntaxFile>),
    Markup(Arc<MarkupFile>),
}

/// Result of one parse, ready to be attached.
#[derive(Debug)]
pub(crate) struct ParseOutcome {
    pub content: EntryContent,
    pub failed: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub cookie: AnalysisCookie,
}

#[derive(Debug)]
struct EntryState {
    status: EntryStatus,
    /// Bumped on every applied parse.
    version: u64,
    content: Option<EntryContent>,
    /// Version at which `content` was attached.
    content_version: u64,
    cookie: Option<AnalysisCookie>,
    syntax_diagnostics: Vec<Diagnostic>,
    analysis: Option<Arc<ModuleAnalysis>>,
}

/// One module, resource or transient buffer tracked by the engine.
///
/// Identity fields are fixed at creation. The parsed tree, the analysis and
/// the diagnostics are replaced as parses and analyses complete; readers
/// always see a consistent pair of tree and analysis.
#[derive(Debug)]
pub struct ProjectEntry {
    id: EntryId,
    kind: EntryKind,
    path: Option<PathBuf>,
    key: SmolStr,
    module_name: Option<SmolStr>,
    is_package: bool,
    /// Reachable from disk discovery (as opposed to only an open buffer).
    discovered: AtomicBool,
    state: RwLock<EntryState>,
}

impl ProjectEntry {
    pub(crate) fn new(
        id: EntryId,
        kind: EntryKind,
        path: Option<PathBuf>,
        key: SmolStr,
        module_name: Option<SmolStr>,
        is_package: bool,
    ) -> Self {
        Self {
            id,
            kind,
            path,
            key,
            module_name,
            is_package,
            discovered: AtomicBool::new(false),
            state: RwLock::new(EntryState {
                status: EntryStatus::Unparsed,
                version: 0,
                content: None,
                content_version: 0,
                cookie: None,
                syntax_diagnostics: Vec::new(),
                analysis: None,
            }),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Module name, resource file name or anonymous id.
    pub fn key(&self) -> &SmolStr {
        &self.key
    }

    pub fn module_name(&self) -> Option<&SmolStr> {
        self.module_name.as_ref()
    }

    pub fn is_package(&self) -> bool {
        self.is_package
    }

    pub fn status(&self) -> EntryStatus {
        self.state.read().status
    }

    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    pub fn content(&self) -> Option<EntryContent> {
        self.state.read().content.clone()
    }

    pub fn tree(&self) -> Option<Arc<SyntaxFile>> {
        match self.state.read().content.as_ref()? {
            EntryContent::Source(file) => Some(file.clone()),
            EntryContent::Markup(_) => None,
        }
    }

    pub fn cookie(&self) -> Option<AnalysisCookie> {
        self.state.read().cookie.clone()
    }

    pub fn analysis(&self) -> Option<Arc<ModuleAnalysis>> {
        self.state.read().analysis.clone()
    }

    pub fn syntax_diagnostics(&self) -> Vec<Diagnostic> {
        self.state.read().syntax_diagnostics.clone()
    }

    /// Syntax diagnostics of the last parse followed by the semantic
    /// diagnostics of the current analysis.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let state = self.state.read();
        let mut all = state.syntax_diagnostics.clone();
        if let Some(analysis) = &state.analysis {
            all.extend(analysis.diagnostics.iter().cloned());
        }
        all
    }

    /// Whether the attached analysis was computed from `snapshot`.
    pub fn is_current(&self, snapshot: &TextSnapshot) -> bool {
        let state = self.state.read();
        let analyzed = state
            .analysis
            .as_ref()
            .is_some_and(|a| a.version == state.content_version);
        analyzed && state.cookie.as_ref().is_some_and(|c| c.matches(snapshot))
    }

    pub fn is_discovered(&self) -> bool {
        self.discovered.load(Ordering::Acquire)
    }

    pub(crate) fn mark_discovered(&self) {
        self.discovered.store(true, Ordering::Release);
    }

    pub(crate) fn set_status(&self, status: EntryStatus) {
        self.state.write().status = status;
    }

    /// Attach a parse result.
    ///
    /// A failed parse keeps the previous tree when there is one, so queries
    /// keep working on the last good state; only its diagnostics are
    /// replaced.
    pub(crate) fn apply_parse(&self, outcome: ParseOutcome) {
        let mut state = self.state.write();
        state.version += 1;
        state.syntax_diagnostics = outcome.diagnostics;
        if outcome.failed && state.content.is_some() {
            state.status = EntryStatus::ParseFailed;
            return;
        }
        state.content = Some(outcome.content);
        state.content_version = state.version;
        state.cookie = Some(outcome.cookie);
        state.status = if outcome.failed {
            EntryStatus::ParseFailed
        } else {
            EntryStatus::Parsed
        };
    }

    /// The tree to analyze, with the version it was attached at.
    pub(crate) fn content_for_analysis(&self) -> Option<(EntryContent, u64)> {
        let mut state = self.state.write();
        let content = state.content.clone()?;
        state.status = EntryStatus::Analyzing;
        Some((content, state.content_version))
    }

    /// Attach an analysis unless a newer tree arrived meanwhile; returns the
    /// analysis it replaced.
    pub(crate) fn attach_analysis(&self, analysis: Arc<ModuleAnalysis>) -> Option<Arc<ModuleAnalysis>> {
        let mut state = self.state.write();
        if analysis.version == state.content_version && state.status == EntryStatus::Analyzing {
            state.status = EntryStatus::Analyzed;
        }
        state.analysis.replace(analysis)
    }
}
