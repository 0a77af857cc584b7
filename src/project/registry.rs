//! Entry identity shared by the engine handle and the analysis actor.
//!
//! Entries are created here, under one lock, so a caller that asks for a
//! file's entry gets the same `Arc` the actor later puts in the table.
//! The table stays the published model; the registry only guarantees that a
//! path never has two live entries and that fresh bindings resolve before
//! the actor has seen them.

use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use uuid::Uuid;

use super::config::EngineConfig;
use super::discovery::module_name;
use super::engine::BindingHandle;
use super::entry::{EntryId, EntryKind, ProjectEntry};
use crate::hir::resource_key;

#[derive(Debug)]
pub(crate) struct EntryRegistry {
    next_id: u32,
    /// Path key (see `EngineConfig::path_key`) -> entry.
    paths: FxHashMap<String, Arc<ProjectEntry>>,
    /// Bindings handed out but not yet published by the actor.
    pending: FxHashMap<BindingHandle, Arc<ProjectEntry>>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            paths: FxHashMap::default(),
            pending: FxHashMap::default(),
        }
    }

    fn next_id(&mut self) -> EntryId {
        let id = EntryId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// The entry for `path`, created if there is none.
    pub fn for_path(&mut self, path: &Path, config: &EngineConfig) -> Arc<ProjectEntry> {
        let key = config.path_key(path);
        if let Some(entry) = self.paths.get(&key) {
            return entry.clone();
        }
        let id = self.next_id();
        let entry = Arc::new(file_entry(id, path, config));
        self.paths.insert(key, entry.clone());
        entry
    }

    /// Register `entry` under its path unless another entry took the path.
    pub fn adopt(&mut self, entry: Arc<ProjectEntry>, config: &EngineConfig) -> Arc<ProjectEntry> {
        let Some(path) = entry.path() else {
            return entry;
        };
        self.paths
            .entry(config.path_key(path))
            .or_insert(entry)
            .clone()
    }

    /// A new entry with no backing file.
    pub fn transient(&mut self) -> Arc<ProjectEntry> {
        let id = self.next_id();
        Arc::new(ProjectEntry::new(
            id,
            EntryKind::Transient,
            None,
            anonymous_key(),
            None,
            false,
        ))
    }

    pub fn forget(&mut self, entry: &ProjectEntry, config: &EngineConfig) {
        if let Some(path) = entry.path() {
            let key = config.path_key(path);
            if self.paths.get(&key).is_some_and(|e| e.id() == entry.id()) {
                self.paths.remove(&key);
            }
        }
    }

    pub fn bind_pending(&mut self, binding: BindingHandle, entry: Arc<ProjectEntry>) {
        self.pending.insert(binding, entry);
    }

    pub fn pending(&self, binding: BindingHandle) -> Option<Arc<ProjectEntry>> {
        self.pending.get(&binding).cloned()
    }

    pub fn settle_binding(&mut self, binding: BindingHandle) {
        self.pending.remove(&binding);
    }
}

fn file_entry(id: EntryId, path: &Path, config: &EngineConfig) -> ProjectEntry {
    if config.is_resource_file(path) {
        let key = resource_key(&path.to_string_lossy());
        return ProjectEntry::new(
            id,
            EntryKind::ExternalResource,
            Some(path.to_path_buf()),
            key,
            None,
            false,
        );
    }
    match module_name(path, config) {
        Some((name, is_package)) => ProjectEntry::new(
            id,
            EntryKind::SourceModule,
            Some(path.to_path_buf()),
            SmolStr::new(&name),
            Some(SmolStr::new(&name)),
            is_package,
        ),
        None => ProjectEntry::new(
            id,
            EntryKind::SourceModule,
            Some(path.to_path_buf()),
            anonymous_key(),
            None,
            false,
        ),
    }
}

pub(crate) fn anonymous_key() -> SmolStr {
    SmolStr::new(format!("<{}>", Uuid::new_v4()))
}
