//! Built-in types and functions.
//!
//! Member tables and call signatures for the built-in types, plus the
//! builtin namespace for each language version.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::values::{BuiltinType, ClassInfo, FunctionInfo, Value};
use crate::base::LanguageVersion;

use BuiltinType::*;

/// What a member of a built-in type is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A method with its result type, `None` when the result is unknown.
    Method(Option<BuiltinType>),
    Property(BuiltinType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinMember {
    pub name: &'static str,
    pub kind: MemberKind,
}

const fn method(name: &'static str, returns: BuiltinType) -> BuiltinMember {
    BuiltinMember {
        name,
        kind: MemberKind::Method(Some(returns)),
    }
}

const fn opaque(name: &'static str) -> BuiltinMember {
    BuiltinMember {
        name,
        kind: MemberKind::Method(None),
    }
}

const fn property(name: &'static str, ty: BuiltinType) -> BuiltinMember {
    BuiltinMember {
        name,
        kind: MemberKind::Property(ty),
    }
}

const INT_MEMBERS: &[BuiltinMember] = &[
    method("as_integer_ratio", Tuple),
    method("bit_count", Int),
    method("bit_length", Int),
    method("conjugate", Int),
    property("denominator", Int),
    method("from_bytes", Int),
    property("imag", Int),
    method("is_integer", Bool),
    property("numerator", Int),
    property("real", Int),
    method("to_bytes", Bytes),
];

const FLOAT_MEMBERS: &[BuiltinMember] = &[
    method("as_integer_ratio", Tuple),
    method("conjugate", Float),
    method("fromhex", Float),
    method("hex", Str),
    property("imag", Float),
    method("is_integer", Bool),
    property("real", Float),
];

const COMPLEX_MEMBERS: &[BuiltinMember] = &[
    method("conjugate", Complex),
    property("imag", Float),
    property("real", Float),
];

const STR_MEMBERS: &[BuiltinMember] = &[
    method("capitalize", Str),
    method("casefold", Str),
    method("center", Str),
    method("count", Int),
    method("encode", Bytes),
    method("endswith", Bool),
    method("expandtabs", Str),
    method("find", Int),
    method("format", Str),
    method("format_map", Str),
    method("index", Int),
    method("isalnum", Bool),
    method("isalpha", Bool),
    method("isascii", Bool),
    method("isdecimal", Bool),
    method("isdigit", Bool),
    method("isidentifier", Bool),
    method("islower", Bool),
    method("isnumeric", Bool),
    method("isprintable", Bool),
    method("isspace", Bool),
    method("istitle", Bool),
    method("isupper", Bool),
    method("join", Str),
    method("ljust", Str),
    method("lower", Str),
    method("lstrip", Str),
    method("maketrans", Dict),
    method("partition", Tuple),
    method("removeprefix", Str),
    method("removesuffix", Str),
    method("replace", Str),
    method("rfind", Int),
    method("rindex", Int),
    method("rjust", Str),
    method("rpartition", Tuple),
    method("rsplit", List),
    method("rstrip", Str),
    method("split", List),
    method("splitlines", List),
    method("startswith", Bool),
    method("strip", Str),
    method("swapcase", Str),
    method("title", Str),
    method("translate", Str),
    method("upper", Str),
    method("zfill", Str),
];

const BYTES_MEMBERS: &[BuiltinMember] = &[
    method("count", Int),
    method("decode", Str),
    method("endswith", Bool),
    method("find", Int),
    method("hex", Str),
    method("join", Bytes),
    method("lower", Bytes),
    method("replace", Bytes),
    method("split", List),
    method("startswith", Bool),
    method("strip", Bytes),
    method("upper", Bytes),
];

const LIST_MEMBERS: &[BuiltinMember] = &[
    method("append", NoneType),
    method("clear", NoneType),
    method("copy", List),
    method("count", Int),
    method("extend", NoneType),
    method("index", Int),
    method("insert", NoneType),
    opaque("pop"),
    method("remove", NoneType),
    method("reverse", NoneType),
    method("sort", NoneType),
];

const TUPLE_MEMBERS: &[BuiltinMember] = &[method("count", Int), method("index", Int)];

const DICT_MEMBERS: &[BuiltinMember] = &[
    method("clear", NoneType),
    method("copy", Dict),
    method("fromkeys", Dict),
    opaque("get"),
    opaque("items"),
    opaque("keys"),
    opaque("pop"),
    method("popitem", Tuple),
    opaque("setdefault"),
    method("update", NoneType),
    opaque("values"),
];

const SET_MEMBERS: &[BuiltinMember] = &[
    method("add", NoneType),
    method("clear", NoneType),
    method("copy", Set),
    method("difference", Set),
    method("discard", NoneType),
    method("intersection", Set),
    method("isdisjoint", Bool),
    method("issubset", Bool),
    method("issuperset", Bool),
    opaque("pop"),
    method("remove", NoneType),
    method("symmetric_difference", Set),
    method("union", Set),
    method("update", NoneType),
];

const RANGE_MEMBERS: &[BuiltinMember] = &[
    method("count", Int),
    method("index", Int),
    property("start", Int),
    property("step", Int),
    property("stop", Int),
];

/// Members of a built-in type.
pub fn members(ty: BuiltinType) -> &'static [BuiltinMember] {
    match ty {
        Int | Bool => INT_MEMBERS,
        Float => FLOAT_MEMBERS,
        Complex => COMPLEX_MEMBERS,
        Str => STR_MEMBERS,
        Bytes => BYTES_MEMBERS,
        List => LIST_MEMBERS,
        Tuple => TUPLE_MEMBERS,
        Dict => DICT_MEMBERS,
        Set => SET_MEMBERS,
        Range => RANGE_MEMBERS,
        Object | NoneType => &[],
    }
}

pub fn member(ty: BuiltinType, name: &str) -> Option<&'static BuiltinMember> {
    members(ty).iter().find(|m| m.name == name)
}

/// Value of a member accessed on an instance.
pub fn member_value(member: &BuiltinMember) -> Value {
    match member.kind {
        MemberKind::Property(ty) => Value::Instance(ty),
        MemberKind::Method(returns) => Value::Function(Arc::new(FunctionInfo::external(
            member.name,
            &[&["*args"]],
            returns.map(Value::Instance).into_iter().collect(),
        ))),
    }
}

/// Constructor signatures of a built-in type.
pub fn type_signatures(ty: BuiltinType) -> &'static [&'static [&'static str]] {
    match ty {
        Object => &[&[]],
        Int => &[&["x=0"], &["x", "base=10"]],
        Float => &[&["x=0.0"]],
        Complex => &[&["real=0", "imag=0"]],
        Str => &[
            &["object=''"],
            &["object=b''", "encoding='utf-8'", "errors='strict'"],
        ],
        Bytes => &[&["source=b''", "encoding='utf-8'", "errors='strict'"]],
        Bool => &[&["x=False"]],
        NoneType => &[&[]],
        List | Tuple | Set => &[&["iterable=()"]],
        Dict => &[&[], &["mapping", "**kwargs"], &["iterable", "**kwargs"]],
        Range => &[&["stop"], &["start", "stop", "step=1"]],
    }
}

/// A built-in function of the builtin namespace.
struct BuiltinFunction {
    name: &'static str,
    overloads: &'static [&'static [&'static str]],
    returns: Option<BuiltinType>,
}

const fn func(
    name: &'static str,
    overloads: &'static [&'static [&'static str]],
    returns: Option<BuiltinType>,
) -> BuiltinFunction {
    BuiltinFunction {
        name,
        overloads,
        returns,
    }
}

const FUNCTIONS: &[BuiltinFunction] = &[
    func("abs", &[&["x"]], None),
    func("all", &[&["iterable"]], Some(Bool)),
    func("any", &[&["iterable"]], Some(Bool)),
    func("callable", &[&["obj"]], Some(Bool)),
    func("chr", &[&["i"]], Some(Str)),
    func("dir", &[&["object=None"]], Some(List)),
    func("divmod", &[&["a", "b"]], Some(Tuple)),
    func("enumerate", &[&["iterable", "start=0"]], None),
    func("filter", &[&["function", "iterable"]], None),
    func("format", &[&["value", "format_spec=''"]], Some(Str)),
    func("getattr", &[&["object", "name", "default=None"]], None),
    func("globals", &[&[]], Some(Dict)),
    func("hasattr", &[&["object", "name"]], Some(Bool)),
    func("hash", &[&["object"]], Some(Int)),
    func("help", &[&["request=None"]], Some(NoneType)),
    func("hex", &[&["x"]], Some(Str)),
    func("id", &[&["object"]], Some(Int)),
    func("input", &[&["prompt=''"]], Some(Str)),
    func("isinstance", &[&["obj", "class_or_tuple"]], Some(Bool)),
    func("issubclass", &[&["cls", "class_or_tuple"]], Some(Bool)),
    func("iter", &[&["object"], &["callable", "sentinel"]], None),
    func("len", &[&["obj"]], Some(Int)),
    func("locals", &[&[]], Some(Dict)),
    func("map", &[&["function", "iterable", "*iterables"]], None),
    func(
        "max",
        &[&["iterable", "key=None"], &["arg1", "arg2", "*args"]],
        None,
    ),
    func(
        "min",
        &[&["iterable", "key=None"], &["arg1", "arg2", "*args"]],
        None,
    ),
    func("next", &[&["iterator", "default=None"]], None),
    func("oct", &[&["x"]], Some(Str)),
    func(
        "open",
        &[&["file", "mode='r'", "buffering=-1", "encoding=None"]],
        None,
    ),
    func("ord", &[&["c"]], Some(Int)),
    func("pow", &[&["base", "exp", "mod=None"]], None),
    func("repr", &[&["obj"]], Some(Str)),
    func("round", &[&["number", "ndigits=None"]], None),
    func("setattr", &[&["obj", "name", "value"]], Some(NoneType)),
    func(
        "sorted",
        &[&["iterable", "key=None", "reverse=False"]],
        Some(List),
    ),
    func("sum", &[&["iterable", "start=0"]], None),
    func("super", &[&["type=None", "object_or_type=None"]], None),
    func("vars", &[&["object=None"]], Some(Dict)),
    func("zip", &[&["*iterables"]], None),
];

const MODERN_FUNCTIONS: &[BuiltinFunction] = &[
    func("ascii", &[&["obj"]], Some(Str)),
    func("exec", &[&["source", "globals=None", "locals=None"]], None),
    func(
        "print",
        &[&["*values", "sep=' '", "end='\\n'", "file=None"]],
        Some(NoneType),
    ),
];

const LEGACY_FUNCTIONS: &[BuiltinFunction] = &[
    func("cmp", &[&["x", "y"]], Some(Int)),
    func(
        "execfile",
        &[&["filename", "globals=None", "locals=None"]],
        Some(NoneType),
    ),
    func("file", &[&["name", "mode='r'", "buffering=-1"]], None),
    func("raw_input", &[&["prompt=''"]], Some(Str)),
    func("reduce", &[&["function", "iterable", "initial=None"]], None),
    func("unichr", &[&["i"]], Some(Str)),
];

const TYPES: &[(&str, BuiltinType)] = &[
    ("bool", Bool),
    ("bytes", Bytes),
    ("complex", Complex),
    ("dict", Dict),
    ("float", Float),
    ("frozenset", Set),
    ("int", Int),
    ("list", List),
    ("object", Object),
    ("range", Range),
    ("set", Set),
    ("str", Str),
    ("tuple", Tuple),
];

const LEGACY_TYPES: &[(&str, BuiltinType)] = &[
    ("basestring", Str),
    ("long", Int),
    ("unicode", Str),
    ("xrange", Range),
];

const EXCEPTIONS: &[&str] = &[
    "ArithmeticError",
    "AssertionError",
    "AttributeError",
    "BaseException",
    "Exception",
    "ImportError",
    "IndexError",
    "KeyError",
    "KeyboardInterrupt",
    "LookupError",
    "NameError",
    "NotImplementedError",
    "OSError",
    "RuntimeError",
    "StopIteration",
    "TypeError",
    "ValueError",
    "ZeroDivisionError",
];

/// The builtin namespace for a language version.
pub fn namespace(version: LanguageVersion) -> IndexMap<SmolStr, Value> {
    let mut names = IndexMap::new();
    let legacy = version.is_legacy();

    let types = TYPES
        .iter()
        .chain(if legacy { LEGACY_TYPES } else { &[] });
    for (name, ty) in types {
        names.insert(SmolStr::new(name), Value::Type(*ty));
    }

    let versioned = if legacy {
        LEGACY_FUNCTIONS
    } else {
        MODERN_FUNCTIONS
    };
    for f in FUNCTIONS.iter().chain(versioned) {
        let returns = f.returns.map(Value::Instance).into_iter().collect();
        names.insert(
            SmolStr::new(f.name),
            Value::Function(Arc::new(FunctionInfo::external(
                f.name,
                f.overloads,
                returns,
            ))),
        );
    }

    let exception_members: IndexMap<SmolStr, Vec<Value>> =
        IndexMap::from([(SmolStr::new("args"), vec![Value::Instance(Tuple)])]);
    let mut base_exception = exception_members.clone();
    base_exception.insert(
        SmolStr::new("with_traceback"),
        vec![Value::Function(Arc::new(FunctionInfo::external(
            "with_traceback",
            &[&["tb"]],
            Vec::new(),
        )))],
    );
    for name in EXCEPTIONS {
        let class = ClassInfo::external(name, base_exception.clone());
        names.insert(SmolStr::new(name), Value::Class(Arc::new(class)));
    }
    if legacy {
        let class = ClassInfo::external("IOError", exception_members);
        names.insert(SmolStr::new("IOError"), Value::Class(Arc::new(class)));
    }

    names.insert(SmolStr::new("None"), Value::Instance(NoneType));
    names.insert(SmolStr::new("True"), Value::Instance(Bool));
    names.insert(SmolStr::new("False"), Value::Instance(Bool));
    names
}
