//! Module table: every tracked entry, by id, path, module name and
//! resource name.
//!
//! The analysis actor owns the only mutable copy. After each mutation it
//! publishes a clone behind an `Arc`, which readers and the analyzer use as
//! their [`ModuleResolver`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::engine::BindingHandle;
use super::entry::{EntryId, EntryKind, ProjectEntry};
use crate::hir::{ExportIndex, ModuleAnalysis, ModuleResolver, ModuleSource, TypeDatabase};

#[derive(Debug, Clone)]
pub struct ModuleTable {
    database: Arc<TypeDatabase>,
    entries: FxHashMap<EntryId, Arc<ProjectEntry>>,
    /// Path key (see `EngineConfig::path_key`) -> entry.
    paths: FxHashMap<String, EntryId>,
    modules: FxHashMap<SmolStr, EntryId>,
    keys: FxHashMap<SmolStr, EntryId>,
    resources: FxHashMap<SmolStr, EntryId>,
    bindings: FxHashMap<BindingHandle, EntryId>,
    roots: Vec<PathBuf>,
    index: Arc<ExportIndex>,
}

impl ModuleTable {
    pub fn new(database: Arc<TypeDatabase>) -> Self {
        let index = Arc::new(ExportIndex::from_database(&database));
        Self {
            database,
            entries: FxHashMap::default(),
            paths: FxHashMap::default(),
            modules: FxHashMap::default(),
            keys: FxHashMap::default(),
            resources: FxHashMap::default(),
            bindings: FxHashMap::default(),
            roots: Vec::new(),
            index,
        }
    }

    pub fn database(&self) -> &Arc<TypeDatabase> {
        &self.database
    }

    pub fn index(&self) -> &ExportIndex {
        &self.index
    }

    pub fn entry(&self, id: EntryId) -> Option<&Arc<ProjectEntry>> {
        self.entries.get(&id)
    }

    pub fn entry_by_path_key(&self, key: &str) -> Option<&Arc<ProjectEntry>> {
        self.paths.get(key).and_then(|id| self.entries.get(id))
    }

    pub fn entry_by_module(&self, name: &str) -> Option<&Arc<ProjectEntry>> {
        self.modules.get(name).and_then(|id| self.entries.get(id))
    }

    pub fn binding_entry(&self, binding: BindingHandle) -> Option<&Arc<ProjectEntry>> {
        self.bindings.get(&binding).and_then(|id| self.entries.get(id))
    }

    /// Entries in id order.
    pub fn entries(&self) -> Vec<Arc<ProjectEntry>> {
        let mut entries: Vec<Arc<ProjectEntry>> = self.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.id());
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First components of every known module name, tracked or external.
    pub fn top_level_modules(&self) -> Vec<SmolStr> {
        let mut names = self.index.top_level_modules();
        names.extend(
            self.modules
                .keys()
                .map(|m| SmolStr::new(m.split('.').next().unwrap_or(m))),
        );
        names.sort();
        names.dedup();
        names
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether any binding still refers to `entry`.
    pub fn is_bound(&self, entry: EntryId) -> bool {
        self.bindings.values().any(|id| *id == entry)
    }

    pub(crate) fn insert(&mut self, entry: Arc<ProjectEntry>, path_key: Option<String>) {
        let id = entry.id();
        if let Some(path_key) = path_key {
            self.paths.insert(path_key, id);
        }
        if let Some(name) = entry.module_name() {
            self.modules.insert(name.clone(), id);
        }
        if entry.kind() == EntryKind::ExternalResource {
            self.resources.insert(entry.key().clone(), id);
        }
        self.keys.insert(entry.key().clone(), id);
        self.entries.insert(id, entry);
    }

    /// Forget `id` everywhere, including its bindings and exports.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<Arc<ProjectEntry>> {
        let entry = self.entries.remove(&id)?;
        self.paths.retain(|_, e| *e != id);
        self.modules.retain(|_, e| *e != id);
        self.keys.retain(|_, e| *e != id);
        self.resources.retain(|_, e| *e != id);
        self.bindings.retain(|_, e| *e != id);
        if let Some(name) = entry.module_name() {
            if self.index.contains(name) && !self.modules.contains_key(name) {
                Arc::make_mut(&mut self.index).remove_module(name);
            }
        }
        Some(entry)
    }

    pub(crate) fn bind(&mut self, binding: BindingHandle, entry: EntryId) {
        self.bindings.insert(binding, entry);
    }

    pub(crate) fn unbind(&mut self, binding: BindingHandle) -> Option<EntryId> {
        self.bindings.remove(&binding)
    }

    /// Add a root; returns false when it is already tracked.
    pub(crate) fn add_root(&mut self, root: PathBuf) -> bool {
        if self.roots.contains(&root) {
            return false;
        }
        self.roots.push(root);
        true
    }

    pub(crate) fn remove_root(&mut self, root: &Path) -> bool {
        let before = self.roots.len();
        self.roots.retain(|r| r != root);
        self.roots.len() != before
    }

    pub(crate) fn index_mut(&mut self) -> &mut ExportIndex {
        Arc::make_mut(&mut self.index)
    }

    /// Switch to a new database and rebuild the index from it plus every
    /// analyzed module.
    pub(crate) fn set_database(&mut self, database: Arc<TypeDatabase>) {
        let mut index = ExportIndex::from_database(&database);
        for entry in self.entries.values() {
            let (Some(name), Some(analysis)) = (entry.module_name(), entry.analysis()) else {
                continue;
            };
            index.add_module(name.clone(), analysis.surface().names().cloned().collect());
        }
        self.database = database;
        self.index = Arc::new(index);
    }
}

impl ModuleResolver for ModuleTable {
    fn database(&self) -> &TypeDatabase {
        &self.database
    }

    fn module(&self, name: &str) -> Option<ModuleSource> {
        if let Some(analysis) = self.entry_by_module(name).and_then(|e| e.analysis()) {
            return Some(ModuleSource::Analyzed(analysis));
        }
        self.database
            .module(name)
            .map(|m| ModuleSource::External(m.clone()))
    }

    fn analysis(&self, key: &str) -> Option<Arc<ModuleAnalysis>> {
        self.keys
            .get(key)
            .and_then(|id| self.entries.get(id))
            .and_then(|e| e.analysis())
    }

    fn resource(&self, file_name: &str) -> Option<Arc<ModuleAnalysis>> {
        self.resources
            .get(file_name)
            .and_then(|id| self.entries.get(id))
            .and_then(|e| e.analysis())
    }

    fn submodules(&self, package: &str) -> Vec<SmolStr> {
        let prefix = format!("{}.", package);
        let mut found = self.index.submodules(package);
        found.extend(
            self.modules
                .keys()
                .filter_map(|name| name.strip_prefix(prefix.as_str()))
                .filter(|rest| !rest.contains('.'))
                .map(SmolStr::new),
        );
        found.sort();
        found.dedup();
        found
    }
}
