//! The analysis actor.
//!
//! A single thread owns the module table, the buffer bindings, the
//! dependency map and the analysis queue. Every mutation arrives as a
//! [`Command`]; readers only ever see the table published after the last
//! command. Between commands the actor analyzes one queued entry at a time,
//! so pending commands (edits, unloads) are never stuck behind a long
//! analysis backlog.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, error, info, trace, warn};

use super::activity::Activity;
use super::analysis_queue::{AnalysisQueue, Priority};
use super::buffer::{BufferSubscription, TextBuffer};
use super::config::EngineConfig;
use super::diagnostic_publisher::DiagnosticPublisher;
use super::discovery::{discover_directory, is_discoverable, is_within};
use super::engine::BindingHandle;
use super::entry::{EntryContent, EntryId, EntryStatus, ProjectEntry};
use super::error::{EngineError, Result};
use super::interpreter::InterpreterFactory;
use super::parse_queue::{ParseCounters, ParseQueue, ParseSource, panic_message};
use super::registry::EntryRegistry;
use super::table::ModuleTable;
use crate::hir::{ExportedSurface, ModuleAnalysis, ModuleContext, analyze_module};

pub(crate) enum Command {
    AnalyzeFile(Arc<ProjectEntry>),
    AnalyzeDirectory(PathBuf),
    StopAnalyzingDirectory(PathBuf),
    MonitorBuffer {
        binding: BindingHandle,
        buffer: TextBuffer,
        entry: Arc<ProjectEntry>,
    },
    AttachBuffer {
        binding: BindingHandle,
        buffer: TextBuffer,
    },
    StopMonitoring(BindingHandle),
    BufferChanged(BindingHandle),
    Unload(EntryId),
    FileCreated(PathBuf),
    FileChanged(PathBuf),
    FileDeleted(PathBuf),
    /// A parse was attached; analyze the entry.
    Analyze {
        entry: EntryId,
        priority: Priority,
    },
    DatabaseChanged,
    Shutdown,
}

/// Sending half of the actor's channel. Every command in flight counts as
/// outstanding work until the actor has handled it.
#[derive(Clone)]
pub(crate) struct Mailbox {
    sender: Sender<Command>,
    activity: Arc<Activity>,
}

impl Mailbox {
    pub fn new(sender: Sender<Command>, activity: Arc<Activity>) -> Self {
        Self { sender, activity }
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.activity.begin();
        self.sender.send(command).map_err(|_| {
            self.activity.end();
            EngineError::ShutDown
        })
    }
}

/// State shared between the engine handle, the actor and parse workers.
pub(crate) struct Shared {
    pub config: EngineConfig,
    pub view: RwLock<Arc<ModuleTable>>,
    pub activity: Arc<Activity>,
    pub counters: Arc<ParseCounters>,
    pub factory: Arc<InterpreterFactory>,
    pub registry: Mutex<EntryRegistry>,
}

impl Shared {
    pub fn view(&self) -> Arc<ModuleTable> {
        self.view.read().clone()
    }

    /// The entry for `path`, created (but not yet tracked) if needed.
    pub fn entry_for_path(&self, path: &Path) -> Arc<ProjectEntry> {
        self.registry.lock().for_path(path, &self.config)
    }
}

struct BoundBuffers {
    entry: EntryId,
    /// In submission order; parsed as one file.
    buffers: Vec<(TextBuffer, BufferSubscription)>,
}

pub(crate) struct AnalysisActor {
    shared: Arc<Shared>,
    receiver: Receiver<Command>,
    mailbox: Mailbox,
    table: ModuleTable,
    queue: AnalysisQueue,
    parser: ParseQueue,
    publisher: DiagnosticPublisher,
    bindings: FxHashMap<BindingHandle, BoundBuffers>,
    /// Module or resource name -> entries depending on it.
    dependents: FxHashMap<SmolStr, FxHashSet<EntryId>>,
}

impl AnalysisActor {
    pub fn new(
        shared: Arc<Shared>,
        receiver: Receiver<Command>,
        mailbox: Mailbox,
        table: ModuleTable,
        parser: ParseQueue,
        publisher: DiagnosticPublisher,
    ) -> Self {
        Self {
            shared,
            receiver,
            mailbox,
            table,
            queue: AnalysisQueue::new(),
            parser,
            publisher,
            bindings: FxHashMap::default(),
            dependents: FxHashMap::default(),
        }
    }

    pub fn run(mut self) {
        debug!("analysis actor started");
        loop {
            loop {
                match self.receiver.try_recv() {
                    Ok(command) => {
                        if !self.dispatch(command) {
                            return self.stop();
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return self.stop(),
                }
            }

            if let Some(id) = self.queue.pop() {
                self.analyze(id);
                self.shared.activity.end();
                continue;
            }

            match self.receiver.recv() {
                Ok(command) => {
                    if !self.dispatch(command) {
                        return self.stop();
                    }
                }
                Err(_) => return self.stop(),
            }
        }
    }

    fn stop(&mut self) {
        debug!(
            queued = self.queue.len(),
            parsing = self.parser.active_entries(),
            "analysis actor stopped"
        );
    }

    /// Handle one command; returns false on shutdown.
    fn dispatch(&mut self, command: Command) -> bool {
        let running = match command {
            Command::Shutdown => false,
            command => {
                self.handle(command);
                true
            }
        };
        self.shared.activity.end();
        running
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::AnalyzeFile(entry) => self.analyze_file(entry),
            Command::AnalyzeDirectory(dir) => self.analyze_directory(&dir),
            Command::StopAnalyzingDirectory(dir) => self.stop_analyzing_directory(&dir),
            Command::MonitorBuffer {
                binding,
                buffer,
                entry,
            } => self.monitor_buffer(binding, buffer, entry),
            Command::AttachBuffer { binding, buffer } => self.attach_buffer(binding, buffer),
            Command::StopMonitoring(binding) => self.stop_monitoring(binding),
            Command::BufferChanged(binding) => self.parse_bound(binding, Priority::High),
            Command::Unload(id) => {
                self.unload(id);
                self.publish_view();
            }
            Command::FileCreated(path) => self.file_created(&path),
            Command::FileChanged(path) => self.file_changed(&path),
            Command::FileDeleted(path) => self.file_deleted(&path),
            Command::Analyze { entry, priority } => self.enqueue_analysis(entry, priority),
            Command::DatabaseChanged => self.database_changed(),
            Command::Shutdown => {}
        }
    }

    fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    fn publish_view(&self) {
        *self.shared.view.write() = Arc::new(self.table.clone());
    }

    // ========================================================================
    // ENTRIES
    // ========================================================================

    /// Put `entry` in the table unless its path already has a tracked
    /// entry; the flag says whether it was inserted.
    fn track(&mut self, entry: Arc<ProjectEntry>) -> (Arc<ProjectEntry>, bool) {
        let entry = self.shared.registry.lock().adopt(entry, &self.shared.config);
        if self.table.entry(entry.id()).is_some() {
            return (entry, false);
        }
        let path_key = entry.path().map(|p| self.config().path_key(p));
        trace!(entry = entry.id().raw(), key = %entry.key(), "tracking entry");
        self.table.insert(entry.clone(), path_key);
        (entry, true)
    }

    fn entry_for_path(&mut self, path: &Path) -> (Arc<ProjectEntry>, bool) {
        let entry = self.shared.entry_for_path(path);
        self.track(entry)
    }

    /// Track a file found on disk and parse it if it is new.
    fn track_discovered(&mut self, path: &Path) {
        let (entry, created) = self.entry_for_path(path);
        self.mark_discovered(&entry, created);
    }

    fn mark_discovered(&self, entry: &Arc<ProjectEntry>, created: bool) {
        entry.mark_discovered();
        if created {
            self.parse_from_disk(entry, Priority::Normal);
        }
    }

    fn parse_from_disk(&self, entry: &Arc<ProjectEntry>, priority: Priority) {
        let Some(path) = entry.path() else {
            return;
        };
        self.parser.enqueue(
            entry.clone(),
            ParseSource::Disk(path.to_path_buf()),
            priority,
            self.table.database().version(),
        );
    }

    fn analyze_file(&mut self, entry: Arc<ProjectEntry>) {
        let (entry, created) = self.track(entry);
        self.mark_discovered(&entry, created);
        self.publish_view();
    }

    fn analyze_directory(&mut self, dir: &Path) {
        if !self.table.add_root(dir.to_path_buf()) {
            debug!(dir = %dir.display(), "directory already analyzed; rescanning");
        }
        let files = discover_directory(dir, self.config());
        info!(dir = %dir.display(), files = files.len(), "analyzing directory");
        for path in &files {
            self.track_discovered(path);
        }
        self.publish_view();
    }

    fn stop_analyzing_directory(&mut self, dir: &Path) {
        self.table.remove_root(dir);
        let doomed: Vec<EntryId> = self
            .table
            .entries()
            .iter()
            .filter(|e| e.path().is_some_and(|p| is_within(p, dir, self.config())))
            .filter(|e| !self.table.is_bound(e.id()))
            .map(|e| e.id())
            .collect();
        info!(dir = %dir.display(), unloaded = doomed.len(), "stopped analyzing directory");
        for id in doomed {
            self.unload(id);
        }
        self.publish_view();
    }

    /// Forget an entry, clear its diagnostics and refresh its dependents.
    fn unload(&mut self, id: EntryId) {
        self.parser.cancel(id);
        if self.queue.remove(id) {
            self.shared.activity.end();
        }
        let Some(entry) = self.table.remove(id) else {
            return;
        };
        self.shared.registry.lock().forget(&entry, &self.shared.config);
        self.bindings.retain(|_, bound| bound.entry != id);
        for dependents in self.dependents.values_mut() {
            dependents.remove(&id);
        }
        if let Some(path) = entry.path() {
            self.publisher.clear(path);
        }
        let refreshed = self.enqueue_dependents(&entry);
        debug!(entry = id.raw(), key = %entry.key(), refreshed, "unloaded entry");
    }

    // ========================================================================
    // BUFFERS
    // ========================================================================

    fn monitor_buffer(&mut self, binding: BindingHandle, buffer: TextBuffer, entry: Arc<ProjectEntry>) {
        let (entry, _) = self.track(entry);
        self.table.bind(binding, entry.id());
        let subscription = self.subscribe(binding, &buffer);
        self.bindings.insert(
            binding,
            BoundBuffers {
                entry: entry.id(),
                buffers: vec![(buffer, subscription)],
            },
        );
        debug!(binding = binding.raw(), entry = entry.id().raw(), key = %entry.key(), "monitoring buffer");
        self.parse_bound(binding, Priority::High);
        self.publish_view();
        self.shared.registry.lock().settle_binding(binding);
    }

    fn attach_buffer(&mut self, binding: BindingHandle, buffer: TextBuffer) {
        let subscription = self.subscribe(binding, &buffer);
        let Some(bound) = self.bindings.get_mut(&binding) else {
            warn!(binding = binding.raw(), "attach to unknown binding ignored");
            return;
        };
        bound.buffers.push((buffer, subscription));
        self.parse_bound(binding, Priority::High);
    }

    fn subscribe(&self, binding: BindingHandle, buffer: &TextBuffer) -> BufferSubscription {
        let mailbox = self.mailbox.clone();
        buffer.subscribe(move |_| {
            if mailbox.send(Command::BufferChanged(binding)).is_err() {
                trace!(binding = binding.raw(), "edit after shutdown ignored");
            }
        })
    }

    /// Parse the current snapshots of a binding's buffers.
    fn parse_bound(&self, binding: BindingHandle, priority: Priority) {
        let Some(bound) = self.bindings.get(&binding) else {
            return;
        };
        let Some(entry) = self.table.entry(bound.entry) else {
            return;
        };
        let snapshots = bound.buffers.iter().map(|(b, _)| b.snapshot()).collect();
        self.parser.enqueue(
            entry.clone(),
            ParseSource::Snapshots(snapshots),
            priority,
            self.table.database().version(),
        );
    }

    fn stop_monitoring(&mut self, binding: BindingHandle) {
        self.shared.registry.lock().settle_binding(binding);
        let Some(bound) = self.bindings.remove(&binding) else {
            return;
        };
        self.table.unbind(binding);
        let id = bound.entry;
        drop(bound);
        if self.table.is_bound(id) {
            self.publish_view();
            return;
        }
        let Some(entry) = self.table.entry(id).cloned() else {
            return;
        };
        match entry.path() {
            None => self.unload(id),
            Some(path) if !path.exists() => {
                debug!(path = %path.display(), "closed buffer of a deleted file");
                self.unload(id);
            }
            Some(_) if !entry.is_discovered() => self.unload(id),
            // Back to the text on disk.
            Some(_) => self.parse_from_disk(&entry, Priority::Normal),
        }
        self.publish_view();
    }

    // ========================================================================
    // FILE SYSTEM EVENTS
    // ========================================================================

    fn file_created(&mut self, path: &Path) {
        if !is_discoverable(path, self.table.roots(), self.config()) {
            trace!(path = %path.display(), "created file outside analyzed roots");
            return;
        }
        let is_marker = path
            .file_name()
            .is_some_and(|name| name.to_str() == Some(self.config().package_marker.as_str()));
        if is_marker {
            if let Some(dir) = path.parent() {
                for found in discover_directory(dir, self.config()) {
                    self.track_discovered(&found);
                }
            }
        } else if self.config().is_source_file(path) || self.config().is_resource_file(path) {
            self.track_discovered(path);
        }
        self.publish_view();
    }

    fn file_changed(&mut self, path: &Path) {
        let key = self.config().path_key(path);
        let Some(entry) = self.table.entry_by_path_key(&key).cloned() else {
            return;
        };
        if self.table.is_bound(entry.id()) {
            trace!(path = %path.display(), "open buffer owns changed file");
            return;
        }
        self.parse_from_disk(&entry, Priority::Normal);
    }

    fn file_deleted(&mut self, path: &Path) {
        let doomed: Vec<EntryId> = self
            .table
            .entries()
            .iter()
            .filter(|e| e.path().is_some_and(|p| is_within(p, path, self.config())))
            .filter(|e| !self.table.is_bound(e.id()))
            .map(|e| e.id())
            .collect();
        for id in doomed {
            self.unload(id);
        }
        self.publish_view();
    }

    fn database_changed(&mut self) {
        self.table.set_database(self.shared.factory.database());
        self.publish_view();
        let entries = self.table.entries();
        info!(entries = entries.len(), "interpreter changed; re-parsing every entry");
        for entry in entries {
            let binding = self
                .bindings
                .iter()
                .filter(|(_, bound)| bound.entry == entry.id())
                .map(|(binding, _)| *binding)
                .min();
            match binding {
                Some(binding) => self.parse_bound(binding, Priority::Normal),
                None => self.parse_from_disk(&entry, Priority::Normal),
            }
        }
    }

    // ========================================================================
    // ANALYSIS
    // ========================================================================

    fn enqueue_analysis(&mut self, id: EntryId, priority: Priority) {
        if self.table.entry(id).is_none() {
            return;
        }
        if self.queue.push(id, priority) {
            self.shared.activity.begin();
        }
    }

    /// Queue every entry importing `entry`; returns how many were queued.
    fn enqueue_dependents(&mut self, entry: &ProjectEntry) -> usize {
        let mut ids: Vec<EntryId> = std::iter::once(entry.key())
            .chain(entry.module_name())
            .filter_map(|name| self.dependents.get(name))
            .flatten()
            .copied()
            .filter(|id| *id != entry.id())
            .collect();
        ids.sort();
        ids.dedup();
        for id in &ids {
            self.enqueue_analysis(*id, Priority::Normal);
        }
        ids.len()
    }

    fn analyze(&mut self, id: EntryId) {
        let Some(entry) = self.table.entry(id).cloned() else {
            return;
        };
        let Some((content, version)) = entry.content_for_analysis() else {
            return;
        };
        let started = Instant::now();

        let table = &self.table;
        let report_unresolved_imports = self.shared.config.report_unresolved_imports;
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut analysis = match &content {
                EntryContent::Source(file) => {
                    let cx = ModuleContext {
                        key: entry.key().clone(),
                        module_name: entry.module_name().cloned(),
                        is_package: entry.is_package(),
                        version,
                        resolver: table,
                        report_unresolved_imports,
                    };
                    analyze_module(file, &cx)
                }
                EntryContent::Markup(markup) => {
                    ModuleAnalysis::resource(entry.key().clone(), &markup.names(), version, Vec::new())
                }
            };
            let surface = ExportedSurface::compute(&analysis, table);
            analysis.set_surface(surface);
            analysis
        }));
        let analysis = match result {
            Ok(analysis) => Arc::new(analysis),
            Err(panic) => {
                error!(
                    entry = id.raw(),
                    key = %entry.key(),
                    panic = panic_message(&*panic),
                    "analysis panicked; keeping previous facts"
                );
                entry.set_status(EntryStatus::Parsed);
                return;
            }
        };

        let previous = entry.attach_analysis(analysis.clone());
        self.publisher.publish(&entry);
        self.record_dependencies(id, previous.as_deref(), &analysis);

        let changed = previous.as_ref().map(|p| p.surface()) != Some(analysis.surface());
        let mut refreshed = 0;
        if changed {
            if let Some(name) = entry.module_name() {
                let names = analysis.surface().names().cloned().collect();
                self.table.index_mut().add_module(name.clone(), names);
                self.publish_view();
            }
            let within_limit = self
                .config()
                .cross_module_analysis_limit
                .is_none_or(|limit| self.table.len() <= limit);
            if within_limit {
                refreshed = self.enqueue_dependents(&entry);
            } else {
                trace!(entries = self.table.len(), "cross-module refresh skipped");
            }
        }
        debug!(
            entry = id.raw(),
            key = %entry.key(),
            version,
            surface_changed = changed,
            refreshed,
            elapsed_us = started.elapsed().as_micros() as u64,
            "analyzed"
        );
    }

    fn record_dependencies(&mut self, id: EntryId, previous: Option<&ModuleAnalysis>, analysis: &ModuleAnalysis) {
        if let Some(previous) = previous {
            for dependency in previous.dependencies() {
                if let Some(dependents) = self.dependents.get_mut(&dependency) {
                    dependents.remove(&id);
                    if dependents.is_empty() {
                        self.dependents.remove(&dependency);
                    }
                }
            }
        }
        for dependency in analysis.dependencies() {
            self.dependents.entry(dependency).or_default().insert(id);
        }
    }
}

#[cfg(test)]
pub(crate) fn test_mailbox() -> (Mailbox, Receiver<Command>, Arc<Activity>) {
    let activity = Arc::new(Activity::new());
    let (sender, receiver) = crossbeam_channel::unbounded();
    (Mailbox::new(sender, activity.clone()), receiver, activity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_counts_commands() {
        let (mailbox, receiver, activity) = test_mailbox();
        mailbox.send(Command::DatabaseChanged).unwrap();
        mailbox.send(Command::Shutdown).unwrap();
        assert_eq!(activity.pending(), 2);
        assert_eq!(receiver.len(), 2);
    }

    #[test]
    fn test_mailbox_reports_shutdown() {
        let (mailbox, receiver, activity) = test_mailbox();
        drop(receiver);
        assert!(matches!(
            mailbox.send(Command::DatabaseChanged),
            Err(EngineError::ShutDown)
        ));
        assert_eq!(activity.pending(), 0);
    }
}
