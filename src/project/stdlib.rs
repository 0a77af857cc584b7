//! Bundled description of commonly imported standard-library modules.
//!
//! This is what the default interpreter knows without an environment to
//! introspect. Hosts with a real interpreter replace it through
//! [`InterpreterFactory::replace_database`](super::InterpreterFactory::replace_database).

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::LanguageVersion;
use crate::hir::{BuiltinType, ExternalModule, FunctionInfo, MethodKind, TypeDatabase, Value};

/// Type database with builtins plus `math`, `os`, `os.path`, `sys`, `json`
/// and `collections`.
pub fn standard_database(version: LanguageVersion) -> TypeDatabase {
    use BuiltinType::*;

    let math = ExternalModule::new("math")
        .with_doc("Mathematical functions.")
        .value("pi", Float)
        .value("e", Float)
        .value("inf", Float)
        .function("sqrt", &["x"], Some(Float))
        .function("floor", &["x"], Some(Int))
        .function("ceil", &["x"], Some(Int))
        .function("log", &["x", "base=e"], Some(Float))
        .function("sin", &["x"], Some(Float))
        .function("cos", &["x"], Some(Float))
        .function("pow", &["x", "y"], Some(Float));

    let os = ExternalModule::new("os")
        .with_doc("Miscellaneous operating system interfaces.")
        .submodule("path")
        .value("sep", Str)
        .value("linesep", Str)
        .value("name", Str)
        .value("environ", Dict)
        .function("getcwd", &[], Some(Str))
        .function("listdir", &["path='.'"], Some(List))
        .function("remove", &["path"], Some(NoneType))
        .function("mkdir", &["path", "mode=511"], Some(NoneType))
        .function("getenv", &["key", "default=None"], Some(Str));

    let os_path = ExternalModule::new("os.path")
        .with_doc("Common pathname manipulations.")
        .function("join", &["path", "*paths"], Some(Str))
        .function("exists", &["path"], Some(Bool))
        .function("isdir", &["path"], Some(Bool))
        .function("isfile", &["path"], Some(Bool))
        .function("basename", &["path"], Some(Str))
        .function("dirname", &["path"], Some(Str))
        .function("abspath", &["path"], Some(Str))
        .function("splitext", &["path"], Some(Tuple));

    let sys = ExternalModule::new("sys")
        .with_doc("System-specific parameters and functions.")
        .value("argv", List)
        .value("path", List)
        .value("modules", Dict)
        .value("platform", Str)
        .value("version", Str)
        .value("maxsize", Int)
        .function("exit", &["status=None"], None)
        .function("getrecursionlimit", &[], Some(Int));

    let json = ExternalModule::new("json")
        .with_doc("JSON encoder and decoder.")
        .function("dumps", &["obj", "**kw"], Some(Str))
        .function("loads", &["s", "**kw"], None)
        .function("dump", &["obj", "fp", "**kw"], Some(NoneType))
        .function("load", &["fp", "**kw"], None);

    let collections = ExternalModule::new("collections")
        .with_doc("Container datatypes.")
        .class("OrderedDict", dict_like_members())
        .class("defaultdict", dict_like_members())
        .class("Counter", dict_like_members())
        .class("deque", deque_members())
        .function("namedtuple", &["typename", "field_names"], None);

    TypeDatabase::new(version)
        .with_module(math)
        .with_module(os)
        .with_module(os_path)
        .with_module(sys)
        .with_module(json)
        .with_module(collections)
}

fn method(name: &str, params: &[&str], returns: Option<BuiltinType>) -> (SmolStr, Vec<Value>) {
    let mut specs = vec!["self"];
    specs.extend_from_slice(params);
    let mut info = FunctionInfo::external(
        name,
        &[specs.as_slice()],
        returns.map(Value::Instance).into_iter().collect(),
    );
    info.method = MethodKind::Instance;
    (name.into(), vec![Value::Function(Arc::new(info))])
}

fn dict_like_members() -> IndexMap<SmolStr, Vec<Value>> {
    [
        method("keys", &[], Some(BuiltinType::List)),
        method("values", &[], Some(BuiltinType::List)),
        method("items", &[], Some(BuiltinType::List)),
        method("get", &["key", "default=None"], None),
        method("pop", &["key", "*default"], None),
        method("update", &["*other", "**kw"], Some(BuiltinType::NoneType)),
        method("clear", &[], Some(BuiltinType::NoneType)),
    ]
    .into_iter()
    .collect()
}

fn deque_members() -> IndexMap<SmolStr, Vec<Value>> {
    [
        method("append", &["x"], Some(BuiltinType::NoneType)),
        method("appendleft", &["x"], Some(BuiltinType::NoneType)),
        method("pop", &[], None),
        method("popleft", &[], None),
        method("rotate", &["n=1"], Some(BuiltinType::NoneType)),
        method("clear", &[], Some(BuiltinType::NoneType)),
    ]
    .into_iter()
    .collect()
}
