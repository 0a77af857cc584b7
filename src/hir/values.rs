//! Inferred values.
//!
//! A name evaluates to a *set* of [`Value`]s. An empty set is the unknown
//! value: inference never fails, it only loses precision.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::parser::ParamKind;

/// Built-in types the engine knows the members of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Object,
    Int,
    Float,
    Complex,
    Str,
    Bytes,
    Bool,
    NoneType,
    List,
    Tuple,
    Dict,
    Set,
    Range,
}

impl BuiltinType {
    pub const ALL: &'static [BuiltinType] = &[
        BuiltinType::Object,
        BuiltinType::Int,
        BuiltinType::Float,
        BuiltinType::Complex,
        BuiltinType::Str,
        BuiltinType::Bytes,
        BuiltinType::Bool,
        BuiltinType::NoneType,
        BuiltinType::List,
        BuiltinType::Tuple,
        BuiltinType::Dict,
        BuiltinType::Set,
        BuiltinType::Range,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinType::Object => "object",
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::Complex => "complex",
            BuiltinType::Str => "str",
            BuiltinType::Bytes => "bytes",
            BuiltinType::Bool => "bool",
            BuiltinType::NoneType => "NoneType",
            BuiltinType::List => "list",
            BuiltinType::Tuple => "tuple",
            BuiltinType::Dict => "dict",
            BuiltinType::Set => "set",
            BuiltinType::Range => "range",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            BuiltinType::Int | BuiltinType::Bool | BuiltinType::Float | BuiltinType::Complex
        )
    }

    /// Element type produced by iterating an instance, when it is known.
    pub fn element(self) -> Option<BuiltinType> {
        match self {
            BuiltinType::Str => Some(BuiltinType::Str),
            BuiltinType::Bytes | BuiltinType::Range => Some(BuiltinType::Int),
            _ => None,
        }
    }
}

/// Where the body of a function or class lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    /// Key of the analyzed module (module name or anonymous id).
    pub module: SmolStr,
    /// Dotted path of the scope inside the module, e.g. `Outer.method`.
    pub scope: SmolStr,
}

/// One parameter of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: SmolStr,
    /// Default value as written in source.
    pub default: Option<String>,
    pub kind: ParamKind,
}

impl ParamInfo {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind: ParamKind::Normal,
        }
    }

    /// Parse a compact spec such as `x`, `base=10`, `*args` or `**kwargs`.
    pub fn parse(spec: &str) -> Self {
        if let Some(name) = spec.strip_prefix("**") {
            return Self {
                kind: ParamKind::KwArgs,
                ..Self::new(name)
            };
        }
        if let Some(name) = spec.strip_prefix('*') {
            return Self {
                kind: ParamKind::VarArgs,
                ..Self::new(name)
            };
        }
        match spec.split_once('=') {
            Some((name, default)) => Self {
                default: Some(default.trim().to_string()),
                ..Self::new(name.trim())
            },
            None => Self::new(spec.trim()),
        }
    }

    /// Text shown in signature help.
    pub fn label(&self) -> String {
        match (self.kind, &self.default) {
            (ParamKind::VarArgs, _) => format!("*{}", self.name),
            (ParamKind::KwArgs, _) => format!("**{}", self.name),
            (ParamKind::Normal, Some(default)) => format!("{}={}", self.name, default),
            (ParamKind::Normal, None) => self.name.to_string(),
        }
    }
}

/// One overload of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub params: Vec<ParamInfo>,
}

impl Signature {
    pub fn new(params: Vec<ParamInfo>) -> Self {
        Self { params }
    }

    pub fn from_specs(specs: &[&str]) -> Self {
        Self::new(specs.iter().map(|s| ParamInfo::parse(s)).collect())
    }

    /// Whether the argument at `index` lands on a parameter.
    pub fn covers(&self, index: usize) -> bool {
        let positional = self
            .params
            .iter()
            .filter(|p| p.kind == ParamKind::Normal)
            .count();
        index < positional || self.params.iter().any(|p| p.kind == ParamKind::VarArgs)
    }

    /// Parameter index receiving the argument at `index`.
    pub fn parameter_for(&self, index: usize) -> Option<usize> {
        if index < self.params.len() && self.params[index].kind == ParamKind::Normal {
            return Some(index);
        }
        self.params
            .iter()
            .position(|p| p.kind == ParamKind::VarArgs)
            .filter(|&varargs| index >= varargs)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    /// The signature as seen through an instance: first parameter dropped.
    pub fn bound(&self) -> Signature {
        Signature::new(self.params.iter().skip(1).cloned().collect())
    }

    pub fn label(&self, name: &str) -> String {
        let params: Vec<String> = self.params.iter().map(ParamInfo::label).collect();
        format!("{}({})", name, params.join(", "))
    }
}

/// What calling a function produces.
#[derive(Debug, Clone)]
pub enum Returns {
    /// Fixed result, used for built-ins and database functions.
    Values(Vec<Value>),
    /// Evaluate the `return` statements of a source function.
    Source(SourceRef),
}

/// How a function defined in a class body receives its first argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MethodKind {
    /// Plain function, or a `staticmethod`.
    #[default]
    Function,
    /// Takes the instance first.
    Instance,
    /// `classmethod`: takes the class first.
    Class,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: SmolStr,
    pub doc: Option<String>,
    pub overloads: Vec<Signature>,
    pub returns: Returns,
    pub method: MethodKind,
}

impl FunctionInfo {
    /// Function described by parameter specs with a fixed result.
    pub fn external(name: &str, overloads: &[&[&str]], returns: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            overloads: overloads.iter().map(|s| Signature::from_specs(s)).collect(),
            returns: Returns::Values(returns),
            method: MethodKind::Function,
        }
    }

    /// The method with its first parameter supplied.
    pub fn bound(&self) -> FunctionInfo {
        FunctionInfo {
            overloads: self.overloads.iter().map(Signature::bound).collect(),
            method: MethodKind::Function,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClassBody {
    /// Class defined in an analyzed module.
    Source(SourceRef),
    /// Class described by a type database.
    Members(IndexMap<SmolStr, Vec<Value>>),
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: SmolStr,
    pub doc: Option<String>,
    pub body: ClassBody,
}

impl ClassInfo {
    pub fn external(name: &str, members: IndexMap<SmolStr, Vec<Value>>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            body: ClassBody::Members(members),
        }
    }
}

/// A single inferred value.
#[derive(Debug, Clone)]
pub enum Value {
    /// An instance of a built-in type.
    Instance(BuiltinType),
    /// A built-in type itself, e.g. `int`.
    Type(BuiltinType),
    Function(Arc<FunctionInfo>),
    Class(Arc<ClassInfo>),
    /// An instance of a user or database class.
    Object(Arc<ClassInfo>),
    /// A module, by dotted name.
    Module(SmolStr),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Instance(a), Value::Instance(b)) | (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) | (Value::Object(a), Value::Object(b)) => {
                Arc::ptr_eq(a, b)
            }
            (Value::Module(a), Value::Module(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn doc(&self) -> Option<&str> {
        match self {
            Value::Function(f) => f.doc.as_deref(),
            Value::Class(c) | Value::Object(c) => c.doc.as_deref(),
            _ => None,
        }
    }

    /// Short type description used for hover text and exported surfaces.
    pub fn type_name(&self) -> String {
        match self {
            Value::Instance(t) => t.name().to_string(),
            Value::Type(t) => format!("type {}", t.name()),
            Value::Function(f) => format!("function {}", f.name),
            Value::Class(c) => format!("class {}", c.name),
            Value::Object(c) => c.name.to_string(),
            Value::Module(m) => format!("module {}", m),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// Append `values` to `into`, skipping duplicates.
pub fn union_into(into: &mut Vec<Value>, values: impl IntoIterator<Item = Value>) {
    for value in values {
        if !into.contains(&value) {
            into.push(value);
        }
    }
}

/// Render a value set; the empty set is `unknown`.
pub fn describe(values: &[Value]) -> String {
    if values.is_empty() {
        return "unknown".to_string();
    }
    values
        .iter()
        .map(Value::type_name)
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_spec_parsing() {
        assert_eq!(ParamInfo::parse("base=10").label(), "base=10");
        assert_eq!(ParamInfo::parse("*args").kind, ParamKind::VarArgs);
        assert_eq!(ParamInfo::parse("**kw").label(), "**kw");
        assert_eq!(ParamInfo::parse("x").default, None);
    }

    #[test]
    fn test_signature_coverage() {
        let sig = Signature::from_specs(&["x", "base=10"]);
        assert!(sig.covers(1));
        assert!(!sig.covers(2));
        assert_eq!(sig.label("int"), "int(x, base=10)");

        let variadic = Signature::from_specs(&["sep", "*values", "**kw"]);
        assert!(variadic.covers(7));
        assert_eq!(variadic.parameter_for(5), Some(1));
        assert_eq!(variadic.parameter_for(0), Some(0));
    }

    #[test]
    fn test_bound_signature_drops_self() {
        let sig = Signature::from_specs(&["self", "a"]);
        assert_eq!(sig.bound().label("m"), "m(a)");
    }

    #[test]
    fn test_union_and_describe() {
        let mut values = vec![Value::Instance(BuiltinType::Int)];
        union_into(
            &mut values,
            [
                Value::Instance(BuiltinType::Int),
                Value::Instance(BuiltinType::Str),
            ],
        );
        assert_eq!(describe(&values), "int | str");
        assert_eq!(describe(&[]), "unknown");
    }

    #[test]
    fn test_identity_equality_for_classes() {
        let a = Arc::new(ClassInfo::external("A", IndexMap::new()));
        let b = Arc::new(ClassInfo::external("A", IndexMap::new()));
        assert_eq!(Value::Class(a.clone()), Value::Class(a.clone()));
        assert_ne!(Value::Class(a), Value::Class(b));
    }
}
