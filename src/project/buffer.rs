//! Editor buffers and immutable snapshots of their text.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use text_size::{TextRange, TextSize};

use crate::base::text_utils::clamp_to_boundary;
use crate::base::{LineIndex, Position};

static NEXT_BUFFER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Text of a buffer at one version. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TextSnapshot {
    buffer: BufferId,
    version: u64,
    text: Arc<str>,
    lines: Arc<LineIndex>,
}

impl TextSnapshot {
    fn new(buffer: BufferId, version: u64, text: Arc<str>) -> Self {
        let lines = Arc::new(LineIndex::new(&text));
        Self {
            buffer,
            version,
            text,
            lines,
        }
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> TextSize {
        TextSize::of(&*self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    pub fn position(&self, offset: TextSize) -> Position {
        self.lines.position(offset)
    }

    pub fn offset(&self, position: Position) -> TextSize {
        self.lines.offset(position)
    }

    /// Clamp `range` to the text, rounding both ends down to char boundaries.
    pub fn clamp(&self, range: TextRange) -> TextRange {
        let at = |offset: TextSize| {
            TextSize::new(clamp_to_boundary(&self.text, usize::from(offset)) as u32)
        };
        TextRange::new(at(range.start()), at(range.end()))
    }
}

type Listener = Arc<dyn Fn(&TextSnapshot) + Send + Sync>;

struct BufferInner {
    id: BufferId,
    path: Option<PathBuf>,
    current: RwLock<TextSnapshot>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
}

/// A mutable editor buffer.
///
/// Every edit produces a new [`TextSnapshot`] and notifies subscribers on
/// the editing thread.
#[derive(Clone)]
pub struct TextBuffer {
    inner: Arc<BufferInner>,
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("id", &self.inner.id)
            .field("path", &self.inner.path)
            .field("version", &self.snapshot().version())
            .finish()
    }
}

impl TextBuffer {
    /// A buffer backed by a file.
    pub fn new(path: impl Into<PathBuf>, text: &str) -> Self {
        Self::create(Some(path.into()), text)
    }

    /// A buffer with no file, such as an interactive console.
    pub fn transient(text: &str) -> Self {
        Self::create(None, text)
    }

    fn create(path: Option<PathBuf>, text: &str) -> Self {
        let id = BufferId(NEXT_BUFFER.fetch_add(1, Ordering::Relaxed));
        Self {
            inner: Arc::new(BufferInner {
                id,
                path,
                current: RwLock::new(TextSnapshot::new(id, 0, text.into())),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
            }),
        }
    }

    pub fn id(&self) -> BufferId {
        self.inner.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn snapshot(&self) -> TextSnapshot {
        self.inner.current.read().clone()
    }

    /// Replace the whole text.
    pub fn set_text(&self, text: &str) -> TextSnapshot {
        self.commit(|_| text.to_string())
    }

    /// Replace `range` with `text`.
    pub fn edit(&self, range: TextRange, text: &str) -> TextSnapshot {
        self.commit(|current| {
            let range = current.clamp(range);
            let mut new = String::with_capacity(current.text().len() + text.len());
            new.push_str(&current.text()[..usize::from(range.start())]);
            new.push_str(text);
            new.push_str(&current.text()[usize::from(range.end())..]);
            new
        })
    }

    pub fn insert(&self, offset: TextSize, text: &str) -> TextSnapshot {
        self.edit(TextRange::empty(offset), text)
    }

    fn commit(&self, change: impl FnOnce(&TextSnapshot) -> String) -> TextSnapshot {
        let snapshot = {
            let mut current = self.inner.current.write();
            let text = change(&current);
            *current = TextSnapshot::new(self.inner.id, current.version + 1, text.into());
            current.clone()
        };
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
        snapshot
    }

    /// Call `listener` after every edit until the subscription is dropped.
    pub fn subscribe(&self, listener: impl Fn(&TextSnapshot) + Send + Sync + 'static) -> BufferSubscription {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        BufferSubscription {
            buffer: self.clone(),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

/// Keeps a buffer listener registered.
pub struct BufferSubscription {
    buffer: TextBuffer,
    id: u64,
}

impl Drop for BufferSubscription {
    fn drop(&mut self) {
        self.buffer
            .inner
            .listeners
            .lock()
            .retain(|(id, _)| *id != self.id);
    }
}
