//! Lazy, best-effort evaluation of bindings and expressions.
//!
//! Bindings are evaluated on demand and cached in the binding itself. The
//! [`Evaluator`] guards against cycles (`a = b; b = a`, recursive calls,
//! cyclic bases): a cycle or a too deep chain evaluates to the unknown
//! value.

use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::analysis::ModuleAnalysis;
use super::builtins;
use super::database::{ExternalModule, TypeDatabase};
use super::scope::{Binding, BindingSource, BoundSource, ScopeId, ScopeKind};
use super::values::{
    BuiltinType, ClassBody, ClassInfo, FunctionInfo, MethodKind, ParamInfo, Returns, Signature,
    SourceRef, Value, union_into,
};
use crate::parser::{BinOp, Constant, Expr, ExprKind, Parameter, UnaryOp};

const MAX_DEPTH: u32 = 48;

/// Where a module's members come from.
#[derive(Debug, Clone)]
pub enum ModuleSource {
    Analyzed(Arc<ModuleAnalysis>),
    External(Arc<ExternalModule>),
}

/// Access to everything outside the module being evaluated.
pub trait ModuleResolver {
    fn database(&self) -> &TypeDatabase;

    /// Module by dotted name, analyzed project modules first.
    fn module(&self, name: &str) -> Option<ModuleSource>;

    /// Analysis by key (module name or anonymous id).
    fn analysis(&self, key: &str) -> Option<Arc<ModuleAnalysis>>;

    /// Analysis of a markup resource by file name.
    fn resource(&self, _file_name: &str) -> Option<Arc<ModuleAnalysis>> {
        None
    }

    /// Last components of the direct submodules of `package`.
    fn submodules(&self, _package: &str) -> Vec<SmolStr> {
        Vec::new()
    }
}

enum Analyzed<'a> {
    Home(&'a ModuleAnalysis),
    Shared(Arc<ModuleAnalysis>),
}

impl Deref for Analyzed<'_> {
    type Target = ModuleAnalysis;

    fn deref(&self) -> &ModuleAnalysis {
        match self {
            Analyzed::Home(analysis) => analysis,
            Analyzed::Shared(analysis) => analysis,
        }
    }
}

enum Found<'a> {
    Analyzed(Analyzed<'a>),
    External(Arc<ExternalModule>),
}

/// Evaluates values relative to one home module.
pub struct Evaluator<'a> {
    home: &'a ModuleAnalysis,
    resolver: &'a dyn ModuleResolver,
    active: RefCell<FxHashSet<(usize, SmolStr)>>,
    depth: Cell<u32>,
}

impl<'a> Evaluator<'a> {
    pub fn new(home: &'a ModuleAnalysis, resolver: &'a dyn ModuleResolver) -> Self {
        Self {
            home,
            resolver,
            active: RefCell::new(FxHashSet::default()),
            depth: Cell::new(0),
        }
    }

    pub fn home(&self) -> &'a ModuleAnalysis {
        self.home
    }

    pub fn database(&self) -> &'a TypeDatabase {
        self.resolver.database()
    }

    /// Run `f` unless `key` is already being evaluated or the chain is too
    /// deep.
    fn guarded<T>(&self, key: (usize, SmolStr), f: impl FnOnce() -> T) -> Option<T> {
        if self.depth.get() >= MAX_DEPTH || !self.active.borrow_mut().insert(key.clone()) {
            return None;
        }
        self.depth.set(self.depth.get() + 1);
        let result = f();
        self.depth.set(self.depth.get() - 1);
        self.active.borrow_mut().remove(&key);
        Some(result)
    }

    fn analysis_for(&self, key: &str) -> Option<Analyzed<'a>> {
        if self.home.key == key {
            return Some(Analyzed::Home(self.home));
        }
        self.resolver.analysis(key).map(Analyzed::Shared)
    }

    fn find_module(&self, name: &str) -> Option<Found<'a>> {
        if self.home.module_name.as_deref() == Some(name) {
            return Some(Found::Analyzed(Analyzed::Home(self.home)));
        }
        Some(match self.resolver.module(name)? {
            ModuleSource::Analyzed(analysis) => Found::Analyzed(Analyzed::Shared(analysis)),
            ModuleSource::External(module) => Found::External(module),
        })
    }

    pub fn module_exists(&self, name: &str) -> bool {
        self.find_module(name).is_some()
    }

    // ========================================================================
    // NAMES AND BINDINGS
    // ========================================================================

    /// Values of `name` as seen from `scope`, falling back to builtins.
    pub fn name_values(&self, analysis: &ModuleAnalysis, scope: ScopeId, name: &str) -> Vec<Value> {
        match analysis.lookup(scope, name) {
            Some(binding) => self.binding_values(analysis, binding),
            None => self.database().builtin(name).cloned().into_iter().collect(),
        }
    }

    /// Union of the values of every source of `binding`. Cached.
    pub fn binding_values(&self, analysis: &ModuleAnalysis, binding: &Binding) -> Vec<Value> {
        if let Some(values) = binding.values.get() {
            return values.clone();
        }
        let key = (binding as *const Binding as usize, SmolStr::default());
        let computed = self.guarded(key, || {
            let mut values = Vec::new();
            for source in &binding.sources {
                union_into(&mut values, self.source_values(analysis, source));
            }
            values
        });
        match computed {
            Some(values) => binding.values.get_or_init(|| values).clone(),
            None => Vec::new(),
        }
    }

    fn source_values(&self, analysis: &ModuleAnalysis, source: &BoundSource) -> Vec<Value> {
        let scope = source.scope;
        match &source.kind {
            BindingSource::Value(value) => vec![value.clone()],
            BindingSource::Expr(expr) => self.eval(analysis, scope, expr),
            BindingSource::Call(expr) => self.flat_map(self.eval(analysis, scope, expr), |v| {
                self.call(v)
            }),
            BindingSource::Returns(value) => self.call(value),
            BindingSource::Element(expr) => {
                self.flat_map(self.eval(analysis, scope, expr), |v| self.iterate(v))
            }
            BindingSource::Import(module) => {
                if self.module_exists(module) {
                    vec![Value::Module(module.clone())]
                } else {
                    Vec::new()
                }
            }
            BindingSource::ImportFrom { module, name } => self.module_member(module, name),
            BindingSource::Resource(_) => vec![Value::Instance(BuiltinType::Object)],
        }
    }

    fn flat_map(&self, values: Vec<Value>, f: impl Fn(&Value) -> Vec<Value>) -> Vec<Value> {
        let mut out = Vec::new();
        for value in &values {
            union_into(&mut out, f(value));
        }
        out
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    /// Evaluate `expr` in `scope` of `analysis`.
    pub fn eval(&self, analysis: &ModuleAnalysis, scope: ScopeId, expr: &Expr) -> Vec<Value> {
        use BuiltinType::*;
        match &expr.kind {
            ExprKind::Name(id) => self.name_values(analysis, scope, id),
            ExprKind::Constant(constant) => constant_value(constant).into_iter().collect(),
            ExprKind::Attribute { value, attr } => {
                self.flat_map(self.eval(analysis, scope, value), |v| {
                    self.attribute(v, &attr.id)
                })
            }
            ExprKind::Call { func, .. } => {
                self.flat_map(self.eval(analysis, scope, func), |v| self.call(v))
            }
            ExprKind::Subscript { value, index } => {
                let is_slice = matches!(index.kind, ExprKind::Slice { .. });
                self.flat_map(self.eval(analysis, scope, value), |v| {
                    self.subscript(v, is_slice)
                })
            }
            ExprKind::List(_) | ExprKind::ListComp { .. } => vec![Value::Instance(List)],
            ExprKind::Tuple(_) => vec![Value::Instance(Tuple)],
            ExprKind::Set(_) | ExprKind::SetComp { .. } => vec![Value::Instance(Set)],
            ExprKind::Dict(_) | ExprKind::DictComp { .. } => vec![Value::Instance(Dict)],
            ExprKind::BinOp { left, op, right } => {
                let left = self.eval(analysis, scope, left);
                let right = self.eval(analysis, scope, right);
                self.binop(&left, *op, &right)
            }
            ExprKind::UnaryOp {
                op: UnaryOp::Not, ..
            }
            | ExprKind::Compare { .. } => vec![Value::Instance(Bool)],
            ExprKind::UnaryOp { operand, .. } => self
                .eval(analysis, scope, operand)
                .into_iter()
                .filter_map(|v| match v {
                    Value::Instance(Bool) => Some(Value::Instance(Int)),
                    Value::Instance(t) if t.is_numeric() => Some(v),
                    _ => None,
                })
                .collect(),
            ExprKind::BoolOp { values, .. } => {
                let mut out = Vec::new();
                for value in values {
                    union_into(&mut out, self.eval(analysis, scope, value));
                }
                out
            }
            ExprKind::IfExp { body, orelse, .. } => {
                let mut out = self.eval(analysis, scope, body);
                union_into(&mut out, self.eval(analysis, scope, orelse));
                out
            }
            ExprKind::Lambda { params, .. } => vec![Value::Function(Arc::new(FunctionInfo {
                name: "<lambda>".into(),
                doc: None,
                overloads: vec![signature_of(params)],
                returns: Returns::Values(Vec::new()),
                method: MethodKind::Function,
            }))],
            ExprKind::NamedExpr { value, .. } => self.eval(analysis, scope, value),
            ExprKind::Repr(_) => vec![Value::Instance(Str)],
            ExprKind::Slice { .. }
            | ExprKind::GeneratorExp { .. }
            | ExprKind::Starred(_)
            | ExprKind::Yield(_)
            | ExprKind::Await(_) => Vec::new(),
        }
    }

    fn binop(&self, left: &[Value], op: BinOp, right: &[Value]) -> Vec<Value> {
        use BuiltinType::*;
        let instances = |values: &[Value]| -> Vec<BuiltinType> {
            values
                .iter()
                .filter_map(|v| match v {
                    Value::Instance(t) => Some(*t),
                    _ => None,
                })
                .collect()
        };
        let rights = instances(right);
        // Unknown left operand: the right one is the best guess.
        if left.is_empty() {
            return rights.into_iter().map(Value::Instance).collect();
        }
        let legacy = self.database().version().is_legacy();
        let mut out = Vec::new();
        for l in instances(left) {
            let results: Vec<BuiltinType> = if l.is_numeric() {
                if rights.is_empty() {
                    vec![numeric_result(l, l, op, legacy)]
                } else {
                    rights
                        .iter()
                        .filter_map(|&r| {
                            if r.is_numeric() {
                                Some(numeric_result(l, r, op, legacy))
                            } else if op == BinOp::Mult && matches!(r, Str | Bytes | List | Tuple) {
                                Some(r)
                            } else {
                                None
                            }
                        })
                        .collect()
                }
            } else {
                match (l, op) {
                    (Str | Bytes, BinOp::Add | BinOp::Mult | BinOp::Mod)
                    | (List | Tuple, BinOp::Add | BinOp::Mult) => vec![l],
                    (Set, BinOp::BitOr | BinOp::BitAnd | BinOp::BitXor | BinOp::Sub) => vec![l],
                    _ => Vec::new(),
                }
            };
            union_into(&mut out, results.into_iter().map(Value::Instance));
        }
        out
    }

    fn subscript(&self, value: &Value, is_slice: bool) -> Vec<Value> {
        use BuiltinType::*;
        match value {
            Value::Instance(Str) => vec![Value::Instance(Str)],
            Value::Instance(Bytes) if !is_slice => vec![Value::Instance(Int)],
            Value::Instance(Range) if !is_slice => vec![Value::Instance(Int)],
            Value::Instance(t @ (Bytes | List | Tuple | Range)) if is_slice => {
                vec![Value::Instance(*t)]
            }
            Value::Object(class) => self.flat_map(self.class_member(class, "__getitem__", true), |v| {
                self.call(v)
            }),
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // OPERATIONS ON VALUES
    // ========================================================================

    /// Values of attribute `name` of `value`.
    pub fn attribute(&self, value: &Value, name: &str) -> Vec<Value> {
        match value {
            Value::Instance(t) | Value::Type(t) => builtins::member(*t, name)
                .map(builtins::member_value)
                .into_iter()
                .collect(),
            Value::Function(_) => Vec::new(),
            Value::Class(class) => self.class_member(class, name, false),
            Value::Object(class) => self.class_member(class, name, true),
            Value::Module(module) => self.module_member(module, name),
        }
    }

    /// Result of calling `value`.
    pub fn call(&self, value: &Value) -> Vec<Value> {
        match value {
            Value::Type(t) => vec![Value::Instance(*t)],
            Value::Function(function) => match &function.returns {
                Returns::Values(values) => values.clone(),
                Returns::Source(source) => self.function_returns(source),
            },
            Value::Class(class) => vec![Value::Object(class.clone())],
            Value::Object(class) => {
                self.flat_map(self.class_member(class, "__call__", true), |v| self.call(v))
            }
            Value::Instance(_) | Value::Module(_) => Vec::new(),
        }
    }

    /// Values produced by iterating `value`.
    pub fn iterate(&self, value: &Value) -> Vec<Value> {
        match value {
            Value::Instance(t) => t.element().map(Value::Instance).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Call signatures of `value`; classes report their `__init__` without
    /// `self`.
    pub fn signatures(&self, value: &Value) -> Vec<Signature> {
        let overloads = |values: Vec<Value>| -> Vec<Signature> {
            values
                .iter()
                .flat_map(|v| match v {
                    Value::Function(f) => f.overloads.clone(),
                    _ => Vec::new(),
                })
                .collect()
        };
        match value {
            Value::Function(function) => function.overloads.clone(),
            Value::Type(t) => builtins::type_signatures(*t)
                .iter()
                .map(|specs| Signature::from_specs(specs))
                .collect(),
            Value::Class(class) => {
                let init = overloads(self.class_member(class, "__init__", true));
                if init.is_empty() {
                    vec![Signature::default()]
                } else {
                    init
                }
            }
            Value::Object(class) => overloads(self.class_member(class, "__call__", true)),
            Value::Instance(_) | Value::Module(_) => Vec::new(),
        }
    }

    fn function_returns(&self, source: &SourceRef) -> Vec<Value> {
        let Some(analysis) = self.analysis_for(&source.module) else {
            return Vec::new();
        };
        let Some(scope) = analysis.scope_by_name(&source.scope) else {
            return Vec::new();
        };
        if scope.is_generator {
            return Vec::new();
        }
        if scope.returns.is_empty() {
            return vec![Value::Instance(BuiltinType::NoneType)];
        }
        let key = (scope as *const _ as usize, SmolStr::default());
        self.guarded(key, || {
            let mut out = Vec::new();
            for expr in &scope.returns {
                union_into(&mut out, self.eval(&analysis, scope.id, expr));
            }
            out
        })
        .unwrap_or_default()
    }

    // ========================================================================
    // MODULES
    // ========================================================================

    /// Attribute `name` of module `module`; a submodule when nothing else
    /// matches.
    pub fn module_member(&self, module: &str, name: &str) -> Vec<Value> {
        let values = match self.find_module(module) {
            Some(Found::Analyzed(analysis)) => analysis
                .root()
                .binding(name)
                .map(|binding| self.binding_values(&analysis, binding))
                .unwrap_or_default(),
            Some(Found::External(external)) => {
                external.member(name).map(<[Value]>::to_vec).unwrap_or_default()
            }
            None => Vec::new(),
        };
        if !values.is_empty() {
            return values;
        }
        let full = format!("{}.{}", module, name);
        if self.module_exists(&full) {
            vec![Value::Module(full.into())]
        } else {
            Vec::new()
        }
    }

    // ========================================================================
    // CLASSES
    // ========================================================================

    /// Member `name` of `class`, searching bases; methods are bound
    /// according to how the class is accessed.
    pub fn class_member(&self, class: &ClassInfo, name: &str, through_instance: bool) -> Vec<Value> {
        self.lookup_member(class, name, through_instance)
            .into_iter()
            .map(|v| bind_method(v, through_instance))
            .collect()
    }

    fn lookup_member(&self, class: &ClassInfo, name: &str, through_instance: bool) -> Vec<Value> {
        let key = (class as *const ClassInfo as usize, SmolStr::new(name));
        self.guarded(key, || {
            let own = match &class.body {
                ClassBody::Members(members) => members.get(name).cloned().unwrap_or_default(),
                ClassBody::Source(source) => self.source_member(source, name, through_instance),
            };
            if !own.is_empty() {
                return own;
            }
            for base in self.class_bases(class) {
                let inherited = match &base {
                    Value::Class(base) => self.lookup_member(base, name, through_instance),
                    Value::Type(t) => builtins::member(*t, name)
                        .map(builtins::member_value)
                        .into_iter()
                        .collect(),
                    _ => Vec::new(),
                };
                if !inherited.is_empty() {
                    return inherited;
                }
            }
            Vec::new()
        })
        .unwrap_or_default()
    }

    fn source_member(&self, source: &SourceRef, name: &str, through_instance: bool) -> Vec<Value> {
        let Some(analysis) = self.analysis_for(&source.module) else {
            return Vec::new();
        };
        let Some(scope) = analysis.scope_by_name(&source.scope) else {
            return Vec::new();
        };
        let binding = scope.binding(name).or_else(|| {
            through_instance
                .then(|| scope.instance_attribute(name))
                .flatten()
        });
        binding
            .map(|binding| self.binding_values(&analysis, binding))
            .unwrap_or_default()
    }

    /// Evaluated base classes of `class`.
    pub fn class_bases(&self, class: &ClassInfo) -> Vec<Value> {
        let ClassBody::Source(source) = &class.body else {
            return Vec::new();
        };
        let Some(analysis) = self.analysis_for(&source.module) else {
            return Vec::new();
        };
        let Some(scope) = analysis.scope_by_name(&source.scope) else {
            return Vec::new();
        };
        let outer = scope.parent.unwrap_or(ScopeId::ROOT);
        let mut out = Vec::new();
        for base in &scope.bases {
            union_into(&mut out, self.eval(&analysis, outer, base));
        }
        out
    }

    // ========================================================================
    // MEMBER LISTS
    // ========================================================================

    /// All members of `value` by name, as offered after `value.`.
    pub fn members(&self, value: &Value) -> IndexMap<SmolStr, Vec<Value>> {
        let mut out = IndexMap::new();
        match value {
            Value::Instance(t) | Value::Type(t) => {
                for member in builtins::members(*t) {
                    out.insert(
                        SmolStr::new(member.name),
                        vec![builtins::member_value(member)],
                    );
                }
            }
            Value::Function(_) => {}
            Value::Class(class) => self.collect_class_members(class, false, &mut out),
            Value::Object(class) => self.collect_class_members(class, true, &mut out),
            Value::Module(module) => self.collect_module_members(module, &mut out),
        }
        out
    }

    fn collect_class_members(
        &self,
        class: &ClassInfo,
        through_instance: bool,
        out: &mut IndexMap<SmolStr, Vec<Value>>,
    ) {
        let key = (class as *const ClassInfo as usize, SmolStr::new("*"));
        self.guarded(key, || {
            match &class.body {
                ClassBody::Members(members) => {
                    for (name, values) in members {
                        out.entry(name.clone()).or_insert_with(|| {
                            values
                                .iter()
                                .cloned()
                                .map(|v| bind_method(v, through_instance))
                                .collect()
                        });
                    }
                }
                ClassBody::Source(source) => {
                    let Some(analysis) = self.analysis_for(&source.module) else {
                        return;
                    };
                    let Some(scope) = analysis.scope_by_name(&source.scope) else {
                        return;
                    };
                    let attributes = scope
                        .instance_attributes()
                        .filter(|_| through_instance);
                    for binding in scope.bindings().chain(attributes) {
                        if !out.contains_key(&binding.name) {
                            let values = self
                                .binding_values(&analysis, binding)
                                .into_iter()
                                .map(|v| bind_method(v, through_instance))
                                .collect();
                            out.insert(binding.name.clone(), values);
                        }
                    }
                }
            }
            for base in self.class_bases(class) {
                match &base {
                    Value::Class(base) => self.collect_class_members(base, through_instance, out),
                    Value::Type(t) => {
                        for member in builtins::members(*t) {
                            out.entry(SmolStr::new(member.name))
                                .or_insert_with(|| vec![builtins::member_value(member)]);
                        }
                    }
                    _ => {}
                }
            }
        });
    }

    fn collect_module_members(&self, module: &str, out: &mut IndexMap<SmolStr, Vec<Value>>) {
        match self.find_module(module) {
            Some(Found::Analyzed(analysis)) => {
                for binding in analysis.root().bindings() {
                    let values = self.binding_values(&analysis, binding);
                    out.entry(binding.name.clone()).or_insert(values);
                }
            }
            Some(Found::External(external)) => {
                for (name, values) in &external.members {
                    out.entry(name.clone()).or_insert_with(|| values.clone());
                }
            }
            None => {}
        }
        for sub in self.resolver.submodules(module) {
            let full = format!("{}.{}", module, sub);
            out.entry(sub)
                .or_insert_with(|| vec![Value::Module(full.into())]);
        }
    }

    /// Every name visible from `scope`, innermost first, then builtins.
    pub fn visible_names(
        &self,
        analysis: &ModuleAnalysis,
        scope: ScopeId,
    ) -> IndexMap<SmolStr, Vec<Value>> {
        let mut out = IndexMap::new();
        let mut current = Some(scope);
        let mut innermost = true;
        while let Some(id) = current {
            let s = analysis.scope(id);
            if innermost || s.kind != ScopeKind::Class {
                for binding in s.bindings() {
                    if !out.contains_key(&binding.name) {
                        let values = self.binding_values(analysis, binding);
                        out.insert(binding.name.clone(), values);
                    }
                }
            }
            innermost = false;
            current = s.parent;
        }
        for (name, value) in self.database().builtins() {
            out.entry(name.clone())
                .or_insert_with(|| vec![value.clone()]);
        }
        out
    }
}

/// Bind a method to the way its class was accessed.
fn bind_method(value: Value, through_instance: bool) -> Value {
    if let Value::Function(f) = &value {
        let bound = match f.method {
            MethodKind::Class => true,
            MethodKind::Instance => through_instance,
            MethodKind::Function => false,
        };
        if bound {
            return Value::Function(Arc::new(f.bound()));
        }
    }
    value
}

fn constant_value(constant: &Constant) -> Option<Value> {
    let ty = match constant {
        Constant::None => BuiltinType::NoneType,
        Constant::Bool(_) => BuiltinType::Bool,
        Constant::Int(_) => BuiltinType::Int,
        Constant::Float(_) => BuiltinType::Float,
        Constant::Complex(_) => BuiltinType::Complex,
        Constant::Str(_) => BuiltinType::Str,
        Constant::Bytes(_) => BuiltinType::Bytes,
        Constant::Ellipsis => return None,
    };
    Some(Value::Instance(ty))
}

fn numeric_result(left: BuiltinType, right: BuiltinType, op: BinOp, legacy: bool) -> BuiltinType {
    use BuiltinType::*;
    let rank = |t: BuiltinType| match t {
        Complex => 3,
        Float => 2,
        _ => 1,
    };
    let wide = if rank(left) >= rank(right) { left } else { right };
    let wide = if wide == Bool { Int } else { wide };
    if op == BinOp::Div && wide == Int && !legacy {
        Float
    } else {
        wide
    }
}

/// Signature of a parameter list as written.
pub(crate) fn signature_of(params: &[Parameter]) -> Signature {
    Signature::new(
        params
            .iter()
            .map(|p| ParamInfo {
                name: p.name.id.clone(),
                default: p.default.as_ref().map(render_default),
                kind: p.kind,
            })
            .collect(),
    )
}

fn render_default(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Constant(Constant::None) => "None".to_string(),
        ExprKind::Constant(Constant::Bool(b)) => if *b { "True" } else { "False" }.to_string(),
        ExprKind::Constant(Constant::Int(v) | Constant::Float(v) | Constant::Complex(v)) => {
            v.to_string()
        }
        ExprKind::Constant(Constant::Str(s)) => format!("'{}'", s),
        ExprKind::Name(id) => id.to_string(),
        ExprKind::UnaryOp {
            op: UnaryOp::Neg,
            operand,
        } => format!("-{}", render_default(operand)),
        ExprKind::Attribute { value, attr } => format!("{}.{}", render_default(value), attr.id),
        ExprKind::List(items) if items.is_empty() => "[]".to_string(),
        ExprKind::Tuple(items) if items.is_empty() => "()".to_string(),
        ExprKind::Dict(items) if items.is_empty() => "{}".to_string(),
        _ => "...".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::LanguageVersion;

    #[test]
    fn test_numeric_promotion() {
        use BuiltinType::*;
        assert_eq!(numeric_result(Int, Float, BinOp::Add, false), Float);
        assert_eq!(numeric_result(Bool, Bool, BinOp::Add, false), Int);
        assert_eq!(numeric_result(Int, Int, BinOp::Div, false), Float);
        assert_eq!(numeric_result(Int, Int, BinOp::Div, true), Int);
        assert_eq!(numeric_result(Complex, Int, BinOp::Mult, false), Complex);
    }

    #[test]
    fn test_constant_values() {
        assert_eq!(
            constant_value(&Constant::Str("a".into())),
            Some(Value::Instance(BuiltinType::Str))
        );
        assert_eq!(constant_value(&Constant::Ellipsis), None);
    }

    #[test]
    fn test_bind_method_strips_self_through_instance() {
        let method = Arc::new(FunctionInfo {
            method: MethodKind::Instance,
            ..FunctionInfo::external("m", &[&["self", "a"]], Vec::new())
        });
        let Value::Function(bound) = bind_method(Value::Function(method.clone()), true) else {
            panic!("expected a function");
        };
        assert_eq!(bound.overloads[0].label("m"), "m(a)");
        let Value::Function(unbound) = bind_method(Value::Function(method), false) else {
            panic!("expected a function");
        };
        assert_eq!(unbound.overloads[0].label("m"), "m(self, a)");
    }

    #[test]
    fn test_render_default() {
        let parse = |text: &str| crate::parser::parse_expression(text).unwrap();
        assert_eq!(render_default(&parse("-1")), "-1");
        assert_eq!(render_default(&parse("'x'")), "'x'");
        assert_eq!(render_default(&parse("os.sep")), "os.sep");
        assert_eq!(render_default(&parse("f(1)")), "...");
    }

    #[test]
    fn test_builtin_type_calls_produce_instances() {
        let analysis = ModuleAnalysis::empty("m".into(), Some("m".into()), 0);
        let resolver = crate::hir::test_support::StaticResolver::new(TypeDatabase::new(
            LanguageVersion::default(),
        ));
        let eval = Evaluator::new(&analysis, &resolver);
        let expr = crate::parser::parse_expression("int('3') + 1.5").unwrap();
        assert_eq!(
            eval.eval(&analysis, ScopeId::ROOT, &expr),
            vec![Value::Instance(BuiltinType::Float)]
        );
        let expr = crate::parser::parse_expression("str(1).upper()").unwrap();
        assert_eq!(
            eval.eval(&analysis, ScopeId::ROOT, &expr),
            vec![Value::Instance(BuiltinType::Str)]
        );
    }
}
