//! Interpreter type database.
//!
//! The database describes everything the engine knows without analyzing
//! source: the builtin namespace for a language version and a set of
//! external modules with their members.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::builtins;
use super::values::{BuiltinType, ClassInfo, FunctionInfo, Value};
use crate::base::LanguageVersion;

/// A module provided by the interpreter rather than by analyzed source.
#[derive(Debug, Clone)]
pub struct ExternalModule {
    pub name: SmolStr,
    pub doc: Option<String>,
    pub members: IndexMap<SmolStr, Vec<Value>>,
}

impl ExternalModule {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            members: IndexMap::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Add a function described by parameter specs (`x`, `n=1`, `*args`).
    pub fn function(mut self, name: &str, params: &[&str], returns: Option<BuiltinType>) -> Self {
        let info = FunctionInfo::external(
            name,
            &[params],
            returns.map(Value::Instance).into_iter().collect(),
        );
        self.members
            .insert(name.into(), vec![Value::Function(Arc::new(info))]);
        self
    }

    /// Add a value of a built-in type.
    pub fn value(mut self, name: &str, ty: BuiltinType) -> Self {
        self.members.insert(name.into(), vec![Value::Instance(ty)]);
        self
    }

    /// Add a class with the given members.
    pub fn class(mut self, name: &str, members: IndexMap<SmolStr, Vec<Value>>) -> Self {
        let class = ClassInfo::external(name, members);
        self.members
            .insert(name.into(), vec![Value::Class(Arc::new(class))]);
        self
    }

    /// Expose a submodule as an attribute.
    pub fn submodule(mut self, name: &str) -> Self {
        let full = format!("{}.{}", self.name, name);
        self.members
            .insert(name.into(), vec![Value::Module(full.into())]);
        self
    }

    pub fn member(&self, name: &str) -> Option<&[Value]> {
        self.members.get(name).map(Vec::as_slice)
    }

    pub fn member_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.members.keys()
    }
}

fn builtins_module_name(version: LanguageVersion) -> &'static str {
    if version.is_legacy() {
        "__builtin__"
    } else {
        "builtins"
    }
}

/// Builtins plus external modules for one interpreter.
#[derive(Debug, Clone)]
pub struct TypeDatabase {
    version: LanguageVersion,
    builtins: IndexMap<SmolStr, Value>,
    modules: FxHashMap<SmolStr, Arc<ExternalModule>>,
}

impl TypeDatabase {
    /// Database with the builtin namespace and its module only.
    pub fn new(version: LanguageVersion) -> Self {
        let builtins = builtins::namespace(version);
        let mut module = ExternalModule::new(builtins_module_name(version));
        for (name, value) in &builtins {
            module.members.insert(name.clone(), vec![value.clone()]);
        }
        let mut modules = FxHashMap::default();
        modules.insert(module.name.clone(), Arc::new(module));
        Self {
            version,
            builtins,
            modules,
        }
    }

    pub fn with_module(mut self, module: ExternalModule) -> Self {
        self.add_module(module);
        self
    }

    pub fn add_module(&mut self, module: ExternalModule) {
        self.modules.insert(module.name.clone(), Arc::new(module));
    }

    pub fn version(&self) -> LanguageVersion {
        self.version
    }

    /// Name under which the builtin namespace is importable.
    pub fn builtins_module(&self) -> &'static str {
        builtins_module_name(self.version)
    }

    pub fn builtin(&self, name: &str) -> Option<&Value> {
        self.builtins.get(name)
    }

    pub fn builtins(&self) -> impl Iterator<Item = (&SmolStr, &Value)> {
        self.builtins.iter()
    }

    pub fn module(&self, name: &str) -> Option<&Arc<ExternalModule>> {
        self.modules.get(name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Arc<ExternalModule>> {
        self.modules.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_module_mirrors_namespace() {
        let db = TypeDatabase::new(LanguageVersion::V3_12);
        let module = db.module("builtins").unwrap();
        assert!(module.member("len").is_some());
        assert!(db.builtin("len").is_some());
        assert!(db.module("__builtin__").is_none());

        let legacy = TypeDatabase::new(LanguageVersion::V2_7);
        assert!(legacy.module("__builtin__").is_some());
    }

    #[test]
    fn test_module_builder() {
        let db = TypeDatabase::new(LanguageVersion::default()).with_module(
            ExternalModule::new("os")
                .function("getcwd", &[], Some(BuiltinType::Str))
                .value("sep", BuiltinType::Str)
                .submodule("path"),
        );
        let os = db.module("os").unwrap();
        assert_eq!(
            os.member("sep").unwrap(),
            &[Value::Instance(BuiltinType::Str)]
        );
        assert_eq!(
            os.member("path").unwrap(),
            &[Value::Module("os.path".into())]
        );
        assert_eq!(os.member_names().count(), 3);
    }
}
