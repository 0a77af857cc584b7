//! The engine handle.
//!
//! [`Engine`] is what hosts hold on to. Mutations are sent to the analysis
//! actor and return as soon as they are queued; lookups and queries read
//! the most recently published module table without waiting for
//! outstanding work. Entries handed back by `monitor_buffer` and
//! `analyze_file` come from the shared registry, so the caller never waits
//! for the actor to reply.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};
use text_size::TextRange;
use tracing::{debug, error, info, trace};

use super::activity::Activity;
use super::actor::{AnalysisActor, Command, Mailbox, Shared};
use super::buffer::{TextBuffer, TextSnapshot};
use super::config::EngineConfig;
use super::diagnostic_publisher::{DiagnosticPublisher, DiagnosticSink, NullSink};
use super::entry::ProjectEntry;
use super::error::{EngineError, Result};
use super::interpreter::{InterpreterFactory, Subscription};
use super::parse_queue::{ParseCounters, ParseQueue, ParseStats};
use super::registry::EntryRegistry;
use super::table::ModuleTable;
use crate::ide::{Analysis, CompletionItem, ExpressionInfo, ImportSuggestion, SignatureHelp};

/// Identifies one `monitor_buffer` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingHandle(u64);

impl BindingHandle {
    #[cfg(test)]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Incremental analysis of a project and its open buffers.
///
/// Dropping the engine stops the analysis thread and waits for it.
pub struct Engine {
    shared: Arc<Shared>,
    mailbox: Mailbox,
    actor: Option<JoinHandle<()>>,
    next_binding: AtomicU64,
    _database_observer: Subscription,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("entries", &self.shared.view().len())
            .field("pending", &self.shared.activity.pending())
            .finish()
    }
}

impl Engine {
    /// An engine over the bundled standard library, discarding diagnostics.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let factory = InterpreterFactory::standard(config.language_version);
        Self::with_collaborators(config, factory, Arc::new(NullSink))
    }

    pub fn with_collaborators(
        config: EngineConfig,
        factory: Arc<InterpreterFactory>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        let activity = Arc::new(Activity::new());
        let counters = Arc::new(ParseCounters::default());
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mailbox = Mailbox::new(sender, activity.clone());

        let table = ModuleTable::new(factory.database());
        let parser = ParseQueue::new(&config, counters.clone(), activity.clone(), mailbox.clone())?;
        let workers = config.parse_workers;
        let stack_size = config.worker_stack_size;
        let shared = Arc::new(Shared {
            config,
            view: RwLock::new(Arc::new(table.clone())),
            activity,
            counters,
            factory: factory.clone(),
            registry: Mutex::new(EntryRegistry::new()),
        });

        let actor = AnalysisActor::new(
            shared.clone(),
            receiver,
            mailbox.clone(),
            table,
            parser,
            DiagnosticPublisher::new(sink),
        );
        let handle = std::thread::Builder::new()
            .name("serpent-analysis".to_string())
            .stack_size(stack_size)
            .spawn(move || actor.run())
            .map_err(EngineError::Spawn)?;

        let observer = {
            let mailbox = mailbox.clone();
            factory.subscribe(move || {
                if mailbox.send(Command::DatabaseChanged).is_err() {
                    trace!("interpreter change after shutdown ignored");
                }
            })
        };

        info!(workers, version = ?factory.version(), "engine started");
        Ok(Self {
            shared,
            mailbox,
            actor: Some(handle),
            next_binding: AtomicU64::new(1),
            _database_observer: observer,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    pub fn interpreter(&self) -> &Arc<InterpreterFactory> {
        &self.shared.factory
    }

    // ========================================================================
    // BUFFERS
    // ========================================================================

    /// Track `buffer`: its file's entry (or a new anonymous one when it has
    /// no file) is bound to it, and every edit schedules a parse.
    pub fn monitor_buffer(&self, buffer: &TextBuffer) -> Result<BindingHandle> {
        let binding = BindingHandle(self.next_binding.fetch_add(1, Ordering::Relaxed));
        let entry = {
            let mut registry = self.shared.registry.lock();
            let entry = match buffer.path() {
                Some(path) => registry.for_path(path, &self.shared.config),
                None => registry.transient(),
            };
            registry.bind_pending(binding, entry.clone());
            entry
        };
        let sent = self.mailbox.send(Command::MonitorBuffer {
            binding,
            buffer: buffer.clone(),
            entry,
        });
        if sent.is_err() {
            self.shared.registry.lock().settle_binding(binding);
        }
        sent.map(|()| binding)
    }

    /// Bind another buffer to the entry of `binding`; the buffers are parsed
    /// together, in attach order.
    pub fn attach_buffer(&self, binding: BindingHandle, buffer: &TextBuffer) -> Result<()> {
        self.mailbox.send(Command::AttachBuffer {
            binding,
            buffer: buffer.clone(),
        })
    }

    pub fn stop_monitoring(&self, binding: BindingHandle) -> Result<()> {
        self.mailbox.send(Command::StopMonitoring(binding))
    }

    // ========================================================================
    // FILES AND DIRECTORIES
    // ========================================================================

    /// Track a single file. The entry is returned at once; it joins the
    /// published table when the actor gets to the request.
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<Arc<ProjectEntry>> {
        let path = path.as_ref();
        let config = &self.shared.config;
        if !config.is_source_file(path) && !config.is_resource_file(path) {
            return Err(EngineError::UnsupportedFile(path.to_path_buf()));
        }
        let entry = self.shared.entry_for_path(path);
        self.mailbox.send(Command::AnalyzeFile(entry.clone()))?;
        Ok(entry)
    }

    pub fn analyze_directory(&self, dir: impl AsRef<Path>) -> Result<()> {
        self.mailbox
            .send(Command::AnalyzeDirectory(dir.as_ref().to_path_buf()))
    }

    pub fn stop_analyzing_directory(&self, dir: impl AsRef<Path>) -> Result<()> {
        self.mailbox
            .send(Command::StopAnalyzingDirectory(dir.as_ref().to_path_buf()))
    }

    pub fn unload_file(&self, entry: &ProjectEntry) -> Result<()> {
        self.mailbox.send(Command::Unload(entry.id()))
    }

    pub fn file_created(&self, path: impl AsRef<Path>) -> Result<()> {
        self.mailbox
            .send(Command::FileCreated(path.as_ref().to_path_buf()))
    }

    pub fn file_changed(&self, path: impl AsRef<Path>) -> Result<()> {
        self.mailbox
            .send(Command::FileChanged(path.as_ref().to_path_buf()))
    }

    pub fn file_deleted(&self, path: impl AsRef<Path>) -> Result<()> {
        self.mailbox
            .send(Command::FileDeleted(path.as_ref().to_path_buf()))
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    pub fn entry(&self, path: impl AsRef<Path>) -> Option<Arc<ProjectEntry>> {
        let key = self.shared.config.path_key(path.as_ref());
        self.shared.view().entry_by_path_key(&key).cloned()
    }

    pub fn binding_entry(&self, binding: BindingHandle) -> Option<Arc<ProjectEntry>> {
        if let Some(entry) = self.shared.view().binding_entry(binding) {
            return Some(entry.clone());
        }
        self.shared.registry.lock().pending(binding)
    }

    pub fn entries(&self) -> Vec<Arc<ProjectEntry>> {
        self.shared.view().entries()
    }

    /// The published module table.
    pub fn table(&self) -> Arc<ModuleTable> {
        self.shared.view()
    }

    // ========================================================================
    // PROGRESS
    // ========================================================================

    /// Whether commands, parses or analyses are outstanding.
    pub fn is_analyzing(&self) -> bool {
        self.shared.activity.pending() > 0
    }

    /// Block until all outstanding work is done.
    ///
    /// `progress` is called with the amount of outstanding work once per
    /// poll interval, and with zero when done; returning false stops the
    /// wait early. Returns the work left when the wait ended.
    pub fn wait_for_complete_analysis(&self, mut progress: impl FnMut(usize) -> bool) -> usize {
        let poll = self.shared.config.wait_poll_interval;
        let mut left = self.shared.activity.pending();
        loop {
            if left == 0 {
                progress(0);
                return 0;
            }
            if !progress(left) {
                debug!(left, "wait for analysis cancelled");
                return left;
            }
            left = self.shared.activity.wait_idle(poll);
        }
    }

    pub fn parse_stats(&self) -> ParseStats {
        self.shared.counters.snapshot()
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Query façade over the currently published facts.
    pub fn analysis(&self) -> Analysis {
        Analysis::new(self.shared.view())
    }

    pub fn analyze_expression(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> ExpressionInfo {
        self.analysis().analyze_expression(entry, snapshot, range)
    }

    pub fn completions(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> Vec<CompletionItem> {
        self.analysis().completions(entry, snapshot, range)
    }

    pub fn signatures(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> Option<SignatureHelp> {
        self.analysis().signatures(entry, snapshot, range)
    }

    pub fn missing_imports(
        &self,
        entry: &ProjectEntry,
        snapshot: &TextSnapshot,
        range: TextRange,
    ) -> Vec<ImportSuggestion> {
        self.analysis().missing_imports(entry, snapshot, range)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.mailbox.send(Command::Shutdown).is_err() {
            trace!("analysis thread already gone");
        }
        if let Some(handle) = self.actor.take() {
            if handle.join().is_err() {
                error!("analysis thread panicked");
            }
        }
        debug!("engine stopped");
    }
}
