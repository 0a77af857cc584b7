//! Parse queue.
//!
//! Parses run on a bounded rayon pool. Each entry has at most one pending
//! request and at most one parse in flight: a new request replaces the
//! pending one and marks the in-flight one as superseded, whose result is
//! then dropped instead of attached.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use super::activity::Activity;
use super::actor::{Command, Mailbox};
use super::analysis_queue::Priority;
use super::buffer::TextSnapshot;
use super::config::EngineConfig;
use super::entry::{
    AnalysisCookie, EntryContent, EntryId, EntryKind, EntryStatus, ParseOutcome, ProjectEntry,
};
use super::error::{EngineError, Result};
use crate::base::LanguageVersion;
use crate::hir::{Diagnostic, Severity, codes};
use crate::syntax::{SyntaxFile, load_file, scan_markup};

/// Where the text to parse comes from.
#[derive(Debug, Clone)]
pub(crate) enum ParseSource {
    /// Buffers bound to the entry, concatenated in order.
    Snapshots(Vec<TextSnapshot>),
    Disk(PathBuf),
}

struct ParseRequest {
    entry: Arc<ProjectEntry>,
    source: ParseSource,
    priority: Priority,
    version: LanguageVersion,
    token: CancellationToken,
}

/// Parse counters since the engine started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub requested: usize,
    pub started: usize,
    pub applied: usize,
    /// Replaced while pending or superseded while running.
    pub discarded: usize,
    pub failed: usize,
    /// Most parses that were ever running at the same time.
    pub peak_running: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ParseCounters {
    requested: AtomicUsize,
    started: AtomicUsize,
    applied: AtomicUsize,
    discarded: AtomicUsize,
    failed: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl ParseCounters {
    pub fn snapshot(&self) -> ParseStats {
        ParseStats {
            requested: self.requested.load(Ordering::SeqCst),
            started: self.started.load(Ordering::SeqCst),
            applied: self.applied.load(Ordering::SeqCst),
            discarded: self.discarded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            peak_running: self.peak_running.load(Ordering::SeqCst),
        }
    }

    fn enter(&self) {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_running.fetch_max(running, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Slot {
    pending: Option<ParseRequest>,
    in_flight: Option<CancellationToken>,
}

struct ParseInner {
    slots: Mutex<FxHashMap<EntryId, Slot>>,
    counters: Arc<ParseCounters>,
    activity: Arc<Activity>,
    mailbox: Mailbox,
    debounce: Duration,
    indentation: Option<Severity>,
}

pub(crate) struct ParseQueue {
    pool: rayon::ThreadPool,
    inner: Arc<ParseInner>,
}

impl ParseQueue {
    pub fn new(
        config: &EngineConfig,
        counters: Arc<ParseCounters>,
        activity: Arc<Activity>,
        mailbox: Mailbox,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parse_workers.max(1))
            .thread_name(|i| format!("serpent-parse-{}", i))
            .stack_size(config.worker_stack_size)
            .build()?;
        Ok(Self {
            pool,
            inner: Arc::new(ParseInner {
                slots: Mutex::new(FxHashMap::default()),
                counters,
                activity,
                mailbox,
                debounce: config.parse_debounce,
                indentation: config.indentation_inconsistency,
            }),
        })
    }

    /// Schedule a parse of `entry`, replacing any request still pending
    /// for it.
    pub fn enqueue(
        &self,
        entry: Arc<ProjectEntry>,
        source: ParseSource,
        priority: Priority,
        version: LanguageVersion,
    ) {
        let inner = &self.inner;
        inner.activity.begin();
        ParseCounters::bump(&inner.counters.requested);
        entry.set_status(EntryStatus::Parsing);

        let id = entry.id();
        let request = ParseRequest {
            entry,
            source,
            priority,
            version,
            token: CancellationToken::new(),
        };
        let start = {
            let mut slots = inner.slots.lock();
            match slots.get_mut(&id) {
                Some(slot) => {
                    if let Some(token) = &slot.in_flight {
                        token.cancel();
                    }
                    if let Some(replaced) = slot.pending.replace(request) {
                        replaced.token.cancel();
                        ParseCounters::bump(&inner.counters.discarded);
                        inner.activity.end();
                        trace!(entry = id.raw(), "replaced pending parse");
                    }
                    false
                }
                None => {
                    slots.insert(
                        id,
                        Slot {
                            pending: Some(request),
                            in_flight: None,
                        },
                    );
                    true
                }
            }
        };
        if start {
            let inner = inner.clone();
            self.pool.spawn(move || inner.drain(id));
        }
    }

    /// Drop pending work for `entry` and supersede its running parse.
    pub fn cancel(&self, entry: EntryId) {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(&entry) else {
            return;
        };
        if let Some(token) = &slot.in_flight {
            token.cancel();
        }
        if let Some(request) = slot.pending.take() {
            request.token.cancel();
            ParseCounters::bump(&self.inner.counters.discarded);
            self.inner.activity.end();
        }
    }

    /// Entries with a pending or running parse.
    pub fn active_entries(&self) -> usize {
        self.inner.slots.lock().len()
    }
}

impl ParseInner {
    /// Run requests for `id` until none is pending.
    fn drain(&self, id: EntryId) {
        let Some(mut request) = self.next_request(id) else {
            return;
        };
        loop {
            self.counters.enter();
            self.run(request);
            self.counters.leave();
            let next = self.next_request(id);
            self.activity.end();
            match next {
                Some(pending) => request = pending,
                None => return,
            }
        }
    }

    /// Take the pending request of `id`, or retire its slot.
    fn next_request(&self, id: EntryId) -> Option<ParseRequest> {
        let mut slots = self.slots.lock();
        let slot = slots.get_mut(&id)?;
        match slot.pending.take() {
            Some(request) => {
                slot.in_flight = Some(request.token.clone());
                Some(request)
            }
            None => {
                slots.remove(&id);
                None
            }
        }
    }

    fn run(&self, request: ParseRequest) {
        let id = request.entry.id();
        if !self.debounce.is_zero() {
            std::thread::sleep(self.debounce);
            if request.token.is_cancelled() {
                ParseCounters::bump(&self.counters.discarded);
                trace!(entry = id.raw(), "parse superseded during debounce");
                return;
            }
        }
        ParseCounters::bump(&self.counters.started);

        let indentation = self.indentation;
        let result = catch_unwind(AssertUnwindSafe(|| parse(&request, indentation)));
        match result {
            Ok(Ok(outcome)) => {
                if request.token.is_cancelled() {
                    ParseCounters::bump(&self.counters.discarded);
                    debug!(entry = id.raw(), "discarding superseded parse");
                    return;
                }
                request.entry.apply_parse(outcome);
                ParseCounters::bump(&self.counters.applied);
                trace!(entry = id.raw(), key = %request.entry.key(), "parse applied");
                let command = Command::Analyze {
                    entry: id,
                    priority: request.priority,
                };
                if self.mailbox.send(command).is_err() {
                    trace!(entry = id.raw(), "engine stopped before analysis");
                }
            }
            Ok(Err(e)) => {
                ParseCounters::bump(&self.counters.failed);
                request.entry.set_status(EntryStatus::ParseFailed);
                warn!(entry = id.raw(), error = %e, "parse dropped");
            }
            Err(panic) => {
                ParseCounters::bump(&self.counters.failed);
                request.entry.set_status(EntryStatus::ParseFailed);
                error!(
                    entry = id.raw(),
                    key = %request.entry.key(),
                    panic = panic_message(&*panic),
                    "parser panicked; keeping previous state"
                );
            }
        }
    }
}

fn parse(request: &ParseRequest, indentation: Option<Severity>) -> Result<ParseOutcome> {
    let loaded: String;
    let (texts, cookie): (Vec<&str>, AnalysisCookie) = match &request.source {
        ParseSource::Snapshots(snapshots) => (
            snapshots.iter().map(TextSnapshot::text).collect(),
            AnalysisCookie::of(snapshots),
        ),
        ParseSource::Disk(path) => {
            loaded = load_file(path).map_err(|source| EngineError::Io {
                path: path.clone(),
                source,
            })?;
            (vec![loaded.as_str()], AnalysisCookie::Disk)
        }
    };

    match request.entry.kind() {
        EntryKind::ExternalResource => {
            let markup = scan_markup(&texts.join("\n"));
            let diagnostics = markup
                .errors
                .iter()
                .filter_map(|e| Diagnostic::from_parse_error(e, Some(Severity::Error)))
                .map(|d| d.with_code(codes::MALFORMED_RESOURCE))
                .collect();
            Ok(ParseOutcome {
                content: EntryContent::Markup(Arc::new(markup)),
                failed: false,
                diagnostics,
                cookie,
            })
        }
        EntryKind::SourceModule | EntryKind::Transient => {
            let mut parts: Vec<SyntaxFile> = texts
                .iter()
                .map(|text| SyntaxFile::new(text, request.version))
                .collect();
            let file = if parts.len() == 1 {
                parts.remove(0)
            } else {
                SyntaxFile::concat(parts)
            };
            let diagnostics = file
                .errors()
                .iter()
                .filter_map(|e| Diagnostic::from_parse_error(e, indentation))
                .collect();
            Ok(ParseOutcome {
                failed: file.has_errors(),
                content: EntryContent::Source(Arc::new(file)),
                diagnostics,
                cookie,
            })
        }
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::TextBuffer;
    use crate::project::actor::test_mailbox;

    fn entry(kind: EntryKind) -> Arc<ProjectEntry> {
        Arc::new(ProjectEntry::new(
            EntryId::new(1),
            kind,
            None,
            "e".into(),
            None,
            false,
        ))
    }

    fn request(entry: Arc<ProjectEntry>, source: ParseSource) -> ParseRequest {
        ParseRequest {
            entry,
            source,
            priority: Priority::Normal,
            version: LanguageVersion::default(),
            token: CancellationToken::new(),
        }
    }

    #[test]
    fn test_parse_concatenates_snapshots() {
        let first = TextBuffer::transient("def f():\n    return 1\n");
        let second = TextBuffer::transient("y = f()\n");
        let source = ParseSource::Snapshots(vec![first.snapshot(), second.snapshot()]);
        let outcome = parse(&request(entry(EntryKind::Transient), source), None).unwrap();
        let EntryContent::Source(file) = outcome.content else {
            panic!("expected source content");
        };
        assert_eq!(file.module().body.len(), 2);
        assert!(!outcome.failed);
        assert!(outcome.cookie.matches(&second.snapshot()));
    }

    #[test]
    fn test_parse_reports_syntax_errors() {
        let buffer = TextBuffer::transient("x = (\n");
        let source = ParseSource::Snapshots(vec![buffer.snapshot()]);
        let outcome = parse(&request(entry(EntryKind::Transient), source), None).unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.diagnostics[0].code.as_deref(), Some(codes::SYNTAX_ERROR));
    }

    #[test]
    fn test_markup_is_scanned_for_names() {
        let buffer = TextBuffer::transient(r#"<Window><Button x:Name="ok"/></Window>"#);
        let source = ParseSource::Snapshots(vec![buffer.snapshot()]);
        let outcome = parse(&request(entry(EntryKind::ExternalResource), source), None).unwrap();
        let EntryContent::Markup(markup) = outcome.content else {
            panic!("expected markup content");
        };
        assert_eq!(markup.names(), vec![smol_str::SmolStr::new("ok")]);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = ParseSource::Disk(dir.path().join("gone.py"));
        let result = parse(&request(entry(EntryKind::SourceModule), source), None);
        assert!(matches!(result, Err(EngineError::Io { .. })));
    }

    #[test]
    fn test_queue_applies_latest_request() {
        let (mailbox, receiver, activity) = test_mailbox();
        let counters = Arc::new(ParseCounters::default());
        let config = EngineConfig::default().with_parse_workers(1);
        let queue = ParseQueue::new(&config, counters.clone(), activity.clone(), mailbox).unwrap();

        let entry = entry(EntryKind::Transient);
        let buffer = TextBuffer::transient("x = 1\n");
        for text in ["x = 1\n", "x = 2\n", "x = 'a'\n"] {
            let snapshot = buffer.set_text(text);
            queue.enqueue(
                entry.clone(),
                ParseSource::Snapshots(vec![snapshot]),
                Priority::High,
                LanguageVersion::default(),
            );
        }
        while activity.wait_idle(Duration::from_millis(50)) > 0 {
            // Analyze commands hold activity until received.
            while let Ok(Command::Analyze { .. }) = receiver.try_recv() {
                activity.end();
            }
        }

        let stats = counters.snapshot();
        assert_eq!(stats.requested, 3);
        assert_eq!(stats.requested, stats.applied + stats.discarded + stats.failed);
        assert!(entry.cookie().unwrap().matches(&buffer.snapshot()));
        assert_eq!(queue.active_entries(), 0);
    }

    #[test]
    fn test_one_parse_per_entry_at_a_time() {
        let (mailbox, receiver, activity) = test_mailbox();
        let counters = Arc::new(ParseCounters::default());
        let config = EngineConfig::default()
            .with_parse_workers(4)
            .with_parse_debounce(Duration::from_millis(3));
        let queue = ParseQueue::new(&config, counters.clone(), activity.clone(), mailbox).unwrap();

        let entry = entry(EntryKind::Transient);
        let buffer = TextBuffer::transient("");
        for i in 0..60 {
            let snapshot = buffer.set_text(&format!("x = {}\n", i));
            queue.enqueue(
                entry.clone(),
                ParseSource::Snapshots(vec![snapshot]),
                Priority::High,
                LanguageVersion::default(),
            );
            if i % 3 == 0 {
                std::thread::sleep(Duration::from_millis(2));
            }
        }
        while activity.wait_idle(Duration::from_millis(50)) > 0 {
            while let Ok(Command::Analyze { .. }) = receiver.try_recv() {
                activity.end();
            }
        }

        let stats = counters.snapshot();
        assert_eq!(stats.peak_running, 1);
        assert!(stats.started >= 1);
        assert_eq!(stats.requested, stats.applied + stats.discarded + stats.failed);
        assert!(entry.cookie().unwrap().matches(&buffer.snapshot()));
    }
}
