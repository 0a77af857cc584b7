//! Project-wide index of exported names.
//!
//! Answers "which modules export `name`?" for missing-import suggestions and
//! "which modules live under `pkg`?" for import completion.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::database::TypeDatabase;

#[derive(Debug, Clone, Default)]
pub struct ExportIndex {
    /// Module name -> exported names.
    by_module: IndexMap<SmolStr, Vec<SmolStr>>,
    /// Exported name -> modules exporting it, sorted.
    by_name: FxHashMap<SmolStr, BTreeSet<SmolStr>>,
}

impl ExportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every module of a type database.
    pub fn from_database(db: &TypeDatabase) -> Self {
        let mut index = Self::new();
        for module in db.modules() {
            if module.name == db.builtins_module() {
                continue;
            }
            let names: Vec<SmolStr> = module
                .member_names()
                .filter(|n| !n.starts_with('_'))
                .cloned()
                .collect();
            index.add_module(module.name.clone(), names);
        }
        index
    }

    /// Add or replace the exports of a module.
    pub fn add_module(&mut self, module: SmolStr, names: Vec<SmolStr>) {
        self.remove_module(&module);
        for name in &names {
            self.by_name
                .entry(name.clone())
                .or_default()
                .insert(module.clone());
        }
        self.by_module.insert(module, names);
    }

    pub fn remove_module(&mut self, module: &str) {
        let Some(names) = self.by_module.shift_remove(module) else {
            return;
        };
        for name in names {
            if let Some(modules) = self.by_name.get_mut(&name) {
                modules.remove(module);
                if modules.is_empty() {
                    self.by_name.remove(&name);
                }
            }
        }
    }

    pub fn contains(&self, module: &str) -> bool {
        self.by_module.contains_key(module)
    }

    pub fn exports(&self, module: &str) -> Option<&[SmolStr]> {
        self.by_module.get(module).map(Vec::as_slice)
    }

    /// Modules exporting `name`, in name order.
    pub fn modules_exporting(&self, name: &str) -> Vec<SmolStr> {
        self.by_name
            .get(name)
            .map(|modules| modules.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// First components of every indexed module name.
    pub fn top_level_modules(&self) -> Vec<SmolStr> {
        let names: BTreeSet<SmolStr> = self
            .by_module
            .keys()
            .map(|m| SmolStr::new(m.split('.').next().unwrap_or(m)))
            .collect();
        names.into_iter().collect()
    }

    /// Direct children of `package`, by their last component.
    pub fn submodules(&self, package: &str) -> Vec<SmolStr> {
        let prefix = format!("{}.", package);
        let names: BTreeSet<SmolStr> = self
            .by_module
            .keys()
            .filter_map(|m| m.strip_prefix(prefix.as_str()))
            .map(|rest| SmolStr::new(rest.split('.').next().unwrap_or(rest)))
            .collect();
        names.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.by_module.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_module.is_empty()
    }
}
