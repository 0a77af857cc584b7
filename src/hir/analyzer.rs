//! Module analyzer.
//!
//! One pass over a module's tree that builds the scope tree, records every
//! binding with its (lazily evaluated) sources, collects import edges and
//! reports semantic diagnostics.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use text_size::TextRange;

use super::analysis::{ImportEdge, ModuleAnalysis};
use super::diagnostics::DiagnosticCollector;
use super::eval::{ModuleResolver, ModuleSource, signature_of};
use super::scope::{BindingSource, BoundSource, Scope, ScopeId, ScopeKind};
use super::values::{
    BuiltinType, ClassBody, ClassInfo, FunctionInfo, MethodKind, Returns, SourceRef, Value,
};
use crate::base::{LineIndex, Span};
use crate::parser::{
    Alias, ArgKind, ClassDef, Constant, DottedName, Expr, ExprKind, FunctionDef, ParamKind, Stmt,
    StmtKind, walk_expr,
};
use crate::syntax::SyntaxFile;

/// What the analyzer needs to know about the module being analyzed.
pub struct ModuleContext<'a> {
    /// Module name, or the anonymous id of a transient entry.
    pub key: SmolStr,
    pub module_name: Option<SmolStr>,
    pub is_package: bool,
    pub version: u64,
    pub resolver: &'a dyn ModuleResolver,
    pub report_unresolved_imports: bool,
}

/// Analyze a parsed module.
pub fn analyze_module(file: &SyntaxFile, cx: &ModuleContext<'_>) -> ModuleAnalysis {
    let mut analysis = ModuleAnalysis::empty(cx.key.clone(), cx.module_name.clone(), cx.version);
    analysis.is_package = cx.is_package;
    analysis.doc = file.module().docstring().map(str::to_string);
    analysis.scopes[0].span = file.line_index().span(file.module().range);
    analysis.bind_implicit_attributes();

    let mut analyzer = Analyzer {
        cx,
        lines: file.line_index(),
        analysis,
        classes: FxHashMap::default(),
        globals: FxHashMap::default(),
        self_names: FxHashMap::default(),
        diagnostics: DiagnosticCollector::new(),
    };
    analyzer.visit_body(&file.module().body, ScopeId::ROOT);

    let mut analysis = analyzer.analysis;
    analysis.diagnostics = analyzer.diagnostics.take();
    analysis
}

/// Absolute module name of a (possibly relative) import.
///
/// `level` is the number of leading dots. Returns `None` when the import
/// climbs above the top-level package or the importer has no module name.
pub fn resolve_relative(
    module_name: Option<&str>,
    is_package: bool,
    level: u32,
    tail: Option<&str>,
) -> Option<String> {
    if level == 0 {
        return tail.map(str::to_string);
    }
    let mut parts: Vec<&str> = module_name?.split('.').collect();
    if !is_package {
        parts.pop();
    }
    for _ in 1..level {
        parts.pop()?;
    }
    parts.extend(tail);
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

/// Key under which a markup resource is known: its lowercased file name.
pub fn resource_key(file: &str) -> SmolStr {
    let name = file.rsplit(['/', '\\']).next().unwrap_or(file);
    SmolStr::new(name.to_lowercase())
}

struct Analyzer<'a> {
    cx: &'a ModuleContext<'a>,
    lines: &'a LineIndex,
    analysis: ModuleAnalysis,
    classes: FxHashMap<ScopeId, Arc<ClassInfo>>,
    globals: FxHashMap<ScopeId, FxHashSet<SmolStr>>,
    /// Method scope → (name of its instance parameter, class scope).
    self_names: FxHashMap<ScopeId, (SmolStr, ScopeId)>,
    diagnostics: DiagnosticCollector,
}

impl Analyzer<'_> {
    fn span(&self, range: TextRange) -> Span {
        self.lines.span(range)
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.analysis.scopes[id.index()]
    }

    fn bind(&mut self, scope: ScopeId, name: &SmolStr, source: Option<BindingSource>, range: TextRange) {
        self.bind_in(scope, scope, name, source, range);
    }

    /// Bind `name` in `target`, evaluating the source in `eval_scope`.
    fn bind_in(
        &mut self,
        target: ScopeId,
        eval_scope: ScopeId,
        name: &SmolStr,
        source: Option<BindingSource>,
        range: TextRange,
    ) {
        let target = if self.globals.get(&target).is_some_and(|g| g.contains(name)) {
            ScopeId::ROOT
        } else {
            target
        };
        let span = self.span(range);
        let source = source.map(|kind| BoundSource {
            scope: eval_scope,
            kind,
        });
        self.scope_mut(target).bind(name, source, span);
    }

    fn new_scope(&mut self, kind: ScopeKind, name: &SmolStr, parent: ScopeId, range: TextRange) -> ScopeId {
        let parent_name = &self.analysis.scope(parent).qualified_name;
        let qualified_name: SmolStr = if parent_name.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", parent_name, name).into()
        };
        let id = ScopeId::new(self.analysis.scopes.len());
        let span = self.span(range);
        self.analysis.scopes.push(Scope::new(
            id,
            kind,
            name.clone(),
            qualified_name.clone(),
            Some(parent),
            span,
        ));
        self.scope_mut(parent).children.push(id);
        self.analysis.scope_names.insert(qualified_name, id);
        id
    }

    fn source_ref(&self, scope: ScopeId) -> SourceRef {
        SourceRef {
            module: self.cx.key.clone(),
            scope: self.analysis.scope(scope).qualified_name.clone(),
        }
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn visit_body(&mut self, body: &[Stmt], scope: ScopeId) {
        for stmt in body {
            self.visit_stmt(stmt, scope);
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt, scope: ScopeId) {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.effects(expr, scope),
            StmtKind::Assign { targets, value } => {
                self.effects(value, scope);
                for target in targets {
                    self.assign(target, value, scope);
                }
                let declares_all = targets.iter().any(|t| t.as_name() == Some("__all__"));
                if scope == ScopeId::ROOT && declares_all {
                    self.analysis.dunder_all = string_list(value);
                }
            }
            StmtKind::AugAssign { target, op, value } => {
                self.effects(value, scope);
                let combined = Expr::new(
                    ExprKind::BinOp {
                        left: Box::new(target.clone()),
                        op: *op,
                        right: Box::new(value.clone()),
                    },
                    stmt.range,
                );
                self.bind_target(target, Some(BindingSource::Expr(combined)), scope);
                if scope == ScopeId::ROOT && target.as_name() == Some("__all__") {
                    if let (Some(all), Some(extra)) =
                        (self.analysis.dunder_all.as_mut(), string_list(value))
                    {
                        all.extend(extra);
                    }
                }
            }
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => {
                let source = match value {
                    Some(value) => {
                        self.effects(value, scope);
                        BindingSource::Expr(value.clone())
                    }
                    None => BindingSource::Call(annotation.clone()),
                };
                self.bind_target(target, Some(source), scope);
            }
            StmtKind::FunctionDef(def) => self.function(def, stmt.range, scope),
            StmtKind::ClassDef(def) => self.class(def, stmt.range, scope),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.effects(value, scope);
                }
                if self.analysis.scope(scope).kind == ScopeKind::Function {
                    let expr = value.clone().unwrap_or_else(|| {
                        Expr::new(ExprKind::Constant(Constant::None), stmt.range)
                    });
                    self.scope_mut(scope).returns.push(expr);
                } else {
                    let span = self.span(stmt.range);
                    self.diagnostics.return_outside_function(span);
                }
            }
            StmtKind::If { test, body, orelse } | StmtKind::While { test, body, orelse } => {
                self.effects(test, scope);
                self.visit_body(body, scope);
                self.visit_body(orelse, scope);
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            } => {
                self.effects(iter, scope);
                self.bind_target(target, Some(BindingSource::Element(iter.clone())), scope);
                self.visit_body(body, scope);
                self.visit_body(orelse, scope);
            }
            StmtKind::With { items, body } => {
                for item in items {
                    self.effects(&item.context, scope);
                    if let Some(target) = &item.target {
                        let source = BindingSource::Expr(item.context.clone());
                        self.bind_target(target, Some(source), scope);
                    }
                }
                self.visit_body(body, scope);
            }
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                self.visit_body(body, scope);
                for handler in handlers {
                    if let Some(name) = &handler.name {
                        let source = handler.type_.clone().map(BindingSource::Call);
                        self.bind(scope, &name.id, source, name.range);
                    }
                    self.visit_body(&handler.body, scope);
                }
                self.visit_body(orelse, scope);
                self.visit_body(finalbody, scope);
            }
            StmtKind::Import(aliases) => {
                for alias in aliases {
                    self.import(alias, scope);
                }
            }
            StmtKind::ImportFrom {
                module,
                level,
                names,
                star,
            } => self.import_from(module.as_ref(), *level, names, *star, stmt.range, scope),
            StmtKind::Global(names) => {
                let globals = self.globals.entry(scope).or_default();
                globals.extend(names.iter().map(|n| n.id.clone()));
            }
            StmtKind::Del(exprs) | StmtKind::Print(exprs) => {
                for expr in exprs {
                    self.effects(expr, scope);
                }
            }
            StmtKind::Raise(value) => {
                if let Some(value) = value {
                    self.effects(value, scope);
                }
            }
            StmtKind::Assert { test, msg } => {
                self.effects(test, scope);
                if let Some(msg) = msg {
                    self.effects(msg, scope);
                }
            }
            StmtKind::Nonlocal(_) | StmtKind::Pass | StmtKind::Break | StmtKind::Continue => {}
        }
    }

    fn assign(&mut self, target: &Expr, value: &Expr, scope: ScopeId) {
        match (&target.kind, &value.kind) {
            (
                ExprKind::Tuple(targets) | ExprKind::List(targets),
                ExprKind::Tuple(values) | ExprKind::List(values),
            ) if targets.len() == values.len() => {
                for (target, value) in targets.iter().zip(values) {
                    self.assign(target, value, scope);
                }
            }
            _ => self.bind_target(target, Some(BindingSource::Expr(value.clone())), scope),
        }
    }

    fn bind_target(&mut self, target: &Expr, source: Option<BindingSource>, scope: ScopeId) {
        match &target.kind {
            ExprKind::Name(id) => self.bind(scope, id, source, target.range),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                for item in items {
                    let element = match &source {
                        Some(BindingSource::Expr(expr)) => Some(BindingSource::Element(expr.clone())),
                        _ => None,
                    };
                    self.bind_target(item, element, scope);
                }
            }
            ExprKind::Starred(inner) => {
                let list = BindingSource::Value(Value::Instance(BuiltinType::List));
                self.bind_target(inner, Some(list), scope);
            }
            ExprKind::Attribute { value, attr } => {
                let owner = value.as_name().and_then(|name| {
                    self.self_names
                        .get(&scope)
                        .filter(|(self_name, _)| self_name == name)
                        .map(|(_, class)| *class)
                });
                match owner {
                    Some(class) => {
                        let span = self.span(attr.range);
                        let source = source.map(|kind| BoundSource { scope, kind });
                        self.scope_mut(class).bind_attribute(&attr.id, source, span);
                    }
                    None => self.effects(value, scope),
                }
            }
            _ => self.effects(target, scope),
        }
    }

    /// Side effects hidden in expressions: walrus bindings, generators and
    /// markup resources loaded into an instance.
    fn effects(&mut self, expr: &Expr, scope: ScopeId) {
        let mut walrus = Vec::new();
        let mut loads = Vec::new();
        let mut yields = false;
        walk_expr(expr, &mut |e| match &e.kind {
            ExprKind::NamedExpr { target, value } => walrus.push((target, value)),
            ExprKind::Yield(_) => yields = true,
            ExprKind::Call { func, args } => {
                let is_load = match &func.kind {
                    ExprKind::Name(name) => name.as_str() == "LoadComponent",
                    ExprKind::Attribute { attr, .. } => attr.id.as_str() == "LoadComponent",
                    _ => false,
                };
                let positional: Vec<&Expr> = args
                    .iter()
                    .filter_map(|a| match &a.kind {
                        ArgKind::Positional(e) => Some(e),
                        _ => None,
                    })
                    .collect();
                if let (true, [target, file, ..]) = (is_load, positional.as_slice()) {
                    if let ExprKind::Constant(Constant::Str(file)) = &file.kind {
                        loads.push((*target, file.clone(), e.range));
                    }
                }
            }
            _ => {}
        });

        if yields && self.analysis.scope(scope).kind == ScopeKind::Function {
            self.scope_mut(scope).is_generator = true;
        }
        for (target, value) in walrus {
            self.bind(scope, &target.id, Some(BindingSource::Expr((**value).clone())), target.range);
        }
        for (target, file, range) in loads {
            self.load_component(target, &file, range, scope);
        }
    }

    /// `LoadComponent(self, 'Window.xaml')`: the resource's named elements
    /// become instance attributes of the enclosing class.
    fn load_component(&mut self, target: &Expr, file: &str, range: TextRange, scope: ScopeId) {
        let key = resource_key(file);
        if !self.analysis.resources.contains(&key) {
            self.analysis.resources.push(key.clone());
        }
        let class = target.as_name().and_then(|name| {
            self.self_names
                .get(&scope)
                .filter(|(self_name, _)| self_name == name)
                .map(|(_, class)| *class)
        });
        let Some(class) = class else {
            return;
        };
        let Some(resource) = self.cx.resolver.resource(&key) else {
            return;
        };
        let span = self.span(range);
        for name in resource.exported_names() {
            let source = BoundSource {
                scope,
                kind: BindingSource::Resource(name.clone()),
            };
            self.scope_mut(class).bind_attribute(&name, Some(source), span);
        }
    }

    // ========================================================================
    // DEFINITIONS
    // ========================================================================

    fn function(&mut self, def: &FunctionDef, range: TextRange, parent: ScopeId) {
        for decorator in &def.decorators {
            self.effects(decorator, parent);
        }
        let decorated = |name: &str| def.decorators.iter().any(|d| decorator_name(d) == Some(name));
        let in_class = self.analysis.scope(parent).kind == ScopeKind::Class;
        let method = if !in_class || decorated("staticmethod") {
            MethodKind::Function
        } else if decorated("classmethod") {
            MethodKind::Class
        } else {
            MethodKind::Instance
        };

        let id = self.new_scope(ScopeKind::Function, &def.name.id, parent, range);
        let doc = def.docstring().map(str::to_string);
        self.scope_mut(id).doc = doc.clone();

        for (index, param) in def.params.iter().enumerate() {
            if let Some(default) = &param.default {
                self.effects(default, parent);
            }
            let (source, eval_scope) = if index == 0 && method != MethodKind::Function {
                let value = self.classes.get(&parent).map(|class| match method {
                    MethodKind::Class => Value::Class(class.clone()),
                    _ => Value::Object(class.clone()),
                });
                if method == MethodKind::Instance {
                    self.self_names.insert(id, (param.name.id.clone(), parent));
                }
                (value.map(BindingSource::Value), id)
            } else {
                match (param.kind, &param.default, &param.annotation) {
                    (ParamKind::VarArgs, ..) => (
                        Some(BindingSource::Value(Value::Instance(BuiltinType::Tuple))),
                        id,
                    ),
                    (ParamKind::KwArgs, ..) => (
                        Some(BindingSource::Value(Value::Instance(BuiltinType::Dict))),
                        id,
                    ),
                    (ParamKind::Normal, Some(default), _) => {
                        (Some(BindingSource::Expr(default.clone())), parent)
                    }
                    (ParamKind::Normal, None, Some(annotation)) => {
                        (Some(BindingSource::Call(annotation.clone())), parent)
                    }
                    (ParamKind::Normal, None, None) => (None, id),
                }
            };
            self.bind_in(id, eval_scope, &param.name.id, source, param.name.range);
        }

        self.visit_body(&def.body, id);

        let info = FunctionInfo {
            name: def.name.id.clone(),
            doc,
            overloads: vec![signature_of(&def.params)],
            returns: Returns::Source(self.source_ref(id)),
            method,
        };
        let value = Value::Function(Arc::new(info));
        let source = if decorated("property") {
            BindingSource::Returns(value)
        } else {
            BindingSource::Value(value)
        };
        self.bind(parent, &def.name.id, Some(source), def.name.range);
    }

    fn class(&mut self, def: &ClassDef, range: TextRange, parent: ScopeId) {
        for expr in def.bases.iter().chain(&def.decorators) {
            self.effects(expr, parent);
        }
        let id = self.new_scope(ScopeKind::Class, &def.name.id, parent, range);
        let doc = def.docstring().map(str::to_string);
        {
            let scope = self.scope_mut(id);
            scope.doc = doc.clone();
            scope.bases = def.bases.clone();
        }
        let info = Arc::new(ClassInfo {
            name: def.name.id.clone(),
            doc,
            body: ClassBody::Source(self.source_ref(id)),
        });
        self.classes.insert(id, info.clone());

        self.visit_body(&def.body, id);

        let source = BindingSource::Value(Value::Class(info));
        self.bind(parent, &def.name.id, Some(source), def.name.range);
    }

    // ========================================================================
    // IMPORTS
    // ========================================================================

    fn module_known(&self, name: &str) -> bool {
        self.cx.module_name.as_deref() == Some(name) || self.cx.resolver.module(name).is_some()
    }

    fn record_import(&mut self, module: &str, range: TextRange, report: bool) {
        let resolved = self.module_known(module);
        let span = self.span(range);
        if !resolved && report && self.cx.report_unresolved_imports {
            self.diagnostics.unresolved_import(span, module);
        }
        self.analysis.imports.push(ImportEdge {
            module: module.into(),
            span,
            resolved,
        });
    }

    fn import(&mut self, alias: &Alias, scope: ScopeId) {
        let full = alias.name.dotted();
        let parts = &alias.name.parts;
        for end in 1..parts.len() {
            let prefix = parts[..end]
                .iter()
                .map(|p| p.id.as_str())
                .collect::<Vec<_>>()
                .join(".");
            self.record_import(&prefix, alias.range, false);
        }
        self.record_import(&full, alias.range, true);

        match (&alias.asname, alias.name.first()) {
            (Some(asname), _) => {
                let source = BindingSource::Import(full.into());
                self.bind(scope, &asname.id, Some(source), asname.range);
            }
            (None, Some(first)) => {
                let source = BindingSource::Import(first.id.clone());
                self.bind(scope, &first.id, Some(source), first.range);
            }
            (None, None) => {}
        }
    }

    fn import_from(
        &mut self,
        module: Option<&DottedName>,
        level: u32,
        names: &[Alias],
        star: bool,
        range: TextRange,
        scope: ScopeId,
    ) {
        let tail = module.map(DottedName::dotted);
        let base = resolve_relative(
            self.cx.module_name.as_deref(),
            self.cx.is_package,
            level,
            tail.as_deref(),
        );
        let Some(base) = base.map(SmolStr::from) else {
            for alias in names {
                let (name, name_range) = bound_name(alias);
                self.bind(scope, &name, None, name_range);
            }
            return;
        };
        self.record_import(&base, range, true);

        if star {
            for name in self.star_names(&base) {
                let source = BindingSource::ImportFrom {
                    module: base.clone(),
                    name: name.clone(),
                };
                self.bind(scope, &name, Some(source), range);
            }
            return;
        }

        for alias in names {
            let name: SmolStr = alias.name.dotted().into();
            let submodule = SmolStr::from(format!("{}.{}", base, name));
            if self.module_known(&submodule) {
                self.record_import(&submodule, alias.range, false);
            } else {
                self.analysis.submodule_candidates.push(submodule);
            }
            let (bound, bound_range) = bound_name(alias);
            let source = BindingSource::ImportFrom {
                module: base.clone(),
                name,
            };
            self.bind(scope, &bound, Some(source), bound_range);
        }
    }

    /// Names bound by `from module import *`.
    fn star_names(&self, module: &str) -> Vec<SmolStr> {
        match self.cx.resolver.module(module) {
            Some(ModuleSource::Analyzed(analysis)) => analysis.exported_names(),
            Some(ModuleSource::External(external)) => external
                .member_names()
                .filter(|name| !name.starts_with('_'))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

fn bound_name(alias: &Alias) -> (SmolStr, TextRange) {
    match &alias.asname {
        Some(asname) => (asname.id.clone(), asname.range),
        None => (alias.name.dotted().into(), alias.name.range),
    }
}

fn decorator_name(decorator: &Expr) -> Option<&str> {
    match &decorator.kind {
        ExprKind::Name(name) => Some(name.as_str()),
        ExprKind::Attribute { attr, .. } => Some(attr.id.as_str()),
        ExprKind::Call { func, .. } => decorator_name(func),
        _ => None,
    }
}

/// A literal list or tuple of strings, as `__all__` is usually written.
fn string_list(value: &Expr) -> Option<Vec<SmolStr>> {
    let (ExprKind::List(items) | ExprKind::Tuple(items)) = &value.kind else {
        return None;
    };
    items
        .iter()
        .map(|item| match &item.kind {
            ExprKind::Constant(Constant::Str(s)) => Some(SmolStr::new(s)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{LanguageVersion, Position};
    use crate::hir::database::{ExternalModule, TypeDatabase};
    use crate::hir::eval::Evaluator;
    use crate::hir::test_support::StaticResolver;
    use crate::hir::values::describe;

    fn analyze(text: &str, resolver: &StaticResolver) -> ModuleAnalysis {
        analyze_named(text, "m", false, resolver)
    }

    fn analyze_named(
        text: &str,
        name: &str,
        is_package: bool,
        resolver: &StaticResolver,
    ) -> ModuleAnalysis {
        let file = SyntaxFile::new(text, LanguageVersion::default());
        let cx = ModuleContext {
            key: name.into(),
            module_name: Some(name.into()),
            is_package,
            version: 1,
            resolver,
            report_unresolved_imports: true,
        };
        analyze_module(&file, &cx)
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new(
            TypeDatabase::new(LanguageVersion::default()).with_module(
                ExternalModule::new("os")
                    .function("getcwd", &[], Some(BuiltinType::Str))
                    .value("sep", BuiltinType::Str),
            ),
        )
    }

    fn type_of(analysis: &ModuleAnalysis, resolver: &StaticResolver, name: &str) -> String {
        let eval = Evaluator::new(analysis, resolver);
        describe(&eval.name_values(analysis, ScopeId::ROOT, name))
    }

    #[test]
    fn test_module_bindings_and_rebinding() {
        let resolver = resolver();
        let analysis = analyze("x = 1\ny = 'a'\ny = 2.0\n", &resolver);
        assert_eq!(type_of(&analysis, &resolver, "x"), "int");
        assert_eq!(type_of(&analysis, &resolver, "y"), "str | float");
        assert_eq!(analysis.root().binding("y").unwrap().definitions.len(), 2);
    }

    #[test]
    fn test_function_returns_and_signature() {
        let resolver = resolver();
        let analysis = analyze(
            "def f(a, b=1, *rest, **kw):\n    \"\"\"Doc.\"\"\"\n    return b\n\nr = f(0)\n",
            &resolver,
        );
        assert_eq!(type_of(&analysis, &resolver, "r"), "int");
        let scope = analysis.scope_by_name("f").unwrap();
        assert_eq!(scope.doc.as_deref(), Some("Doc."));
        let eval = Evaluator::new(&analysis, &resolver);
        let values = eval.name_values(&analysis, ScopeId::ROOT, "f");
        let sigs = eval.signatures(&values[0]);
        assert_eq!(sigs[0].label("f"), "f(a, b=1, *rest, **kw)");
    }

    #[test]
    fn test_class_instance_attributes_and_methods() {
        let resolver = resolver();
        let text = "\
class Point:
    def __init__(self, x):
        self.x = x
        self.label = 'p'

    def norm(self):
        return 1.0

p = Point(3)
n = p.norm()
l = p.label
";
        let analysis = analyze(text, &resolver);
        assert_eq!(type_of(&analysis, &resolver, "p"), "Point");
        assert_eq!(type_of(&analysis, &resolver, "n"), "float");
        assert_eq!(type_of(&analysis, &resolver, "l"), "str");

        let eval = Evaluator::new(&analysis, &resolver);
        let class = eval.name_values(&analysis, ScopeId::ROOT, "Point");
        assert_eq!(eval.signatures(&class[0])[0].label("Point"), "Point(x)");
        let members = eval.members(&eval.name_values(&analysis, ScopeId::ROOT, "p")[0]);
        assert!(members.contains_key("norm"));
        assert!(members.contains_key("label"));
    }

    #[test]
    fn test_inherited_members() {
        let resolver = resolver();
        let text = "\
class Base:
    def greet(self):
        return 'hi'

class Child(Base):
    pass

g = Child().greet()
";
        let analysis = analyze(text, &resolver);
        assert_eq!(type_of(&analysis, &resolver, "g"), "str");
    }

    #[test]
    fn test_imports_bind_modules_and_members() {
        let resolver = resolver();
        let analysis = analyze(
            "import os\nfrom os import sep as separator\nimport missing.sub\n",
            &resolver,
        );
        assert_eq!(type_of(&analysis, &resolver, "os"), "module os");
        assert_eq!(type_of(&analysis, &resolver, "separator"), "str");
        assert_eq!(type_of(&analysis, &resolver, "missing"), "unknown");

        let unresolved: Vec<_> = analysis
            .imports
            .iter()
            .filter(|i| !i.resolved)
            .map(|i| i.module.as_str())
            .collect();
        assert_eq!(unresolved, vec!["missing", "missing.sub"]);
        assert_eq!(analysis.diagnostics.len(), 1);
        assert!(analysis.diagnostics[0].message.contains("missing.sub"));
    }

    #[test]
    fn test_imported_attribute_is_a_dependency_not_an_import() {
        let resolver = resolver();
        let analysis = analyze("from os import sep\n", &resolver);
        let imports: Vec<_> = analysis
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.resolved))
            .collect();
        assert_eq!(imports, vec![("os", true)]);
        assert!(analysis.dependencies().contains(&SmolStr::new("os.sep")));
        assert!(analysis.diagnostics.is_empty());
    }

    #[test]
    fn test_from_package_import_submodule() {
        let sub = analyze_named("VALUE = 1\n", "pkg.sub", false, &resolver());
        let pkg = analyze_named("", "pkg", true, &resolver());
        let resolver = resolver().with_analysis(pkg).with_analysis(sub);
        let analysis = analyze("from pkg import sub\n", &resolver);
        let imports: Vec<_> = analysis
            .imports
            .iter()
            .map(|i| (i.module.as_str(), i.resolved))
            .collect();
        assert_eq!(imports, vec![("pkg", true), ("pkg.sub", true)]);
    }

    #[test]
    fn test_cross_module_import() {
        let lib = analyze_named("VALUE = 3\n", "lib", false, &resolver());
        let resolver = resolver().with_analysis(lib);
        let analysis = analyze("from lib import *\nv = VALUE\n", &resolver);
        assert_eq!(type_of(&analysis, &resolver, "v"), "int");
        assert!(analysis.dependencies().contains(&SmolStr::new("lib")));
    }

    #[test]
    fn test_return_outside_function_is_an_error() {
        let analysis = analyze("return 1\n", &resolver());
        assert_eq!(analysis.diagnostics.len(), 1);
        assert!(analysis.diagnostics[0].is_error());
    }

    #[test]
    fn test_dunder_all_limits_exports() {
        let analysis = analyze("__all__ = ['a']\n__all__ += ['b']\na = 1\nb = 2\nc = 3\n", &resolver());
        assert_eq!(
            analysis.exported_names(),
            vec![SmolStr::new("a"), SmolStr::new("b")]
        );
    }

    #[test]
    fn test_global_declaration_binds_in_module() {
        let resolver = resolver();
        let analysis = analyze("def f():\n    global g\n    g = 1\n", &resolver);
        assert_eq!(type_of(&analysis, &resolver, "g"), "int");
    }

    #[test]
    fn test_recursive_function_terminates() {
        let resolver = resolver();
        let analysis = analyze(
            "def f(n):\n    if n:\n        return f(n - 1)\n    return 0\n\nr = f(3)\na = b\nb = a\n",
            &resolver,
        );
        assert_eq!(type_of(&analysis, &resolver, "r"), "int");
        assert_eq!(type_of(&analysis, &resolver, "a"), "unknown");
    }

    #[test]
    fn test_scope_at_uses_lines_and_indent() {
        let analysis = analyze(
            "x = 1\ndef f():\n    y = 2\n    return y\n\nz = 3\n",
            &resolver(),
        );
        let f = analysis.scope_by_name("f").unwrap().id;
        assert_eq!(analysis.scope_at(Position::new(2, 4), None), f);
        assert_eq!(analysis.scope_at(Position::new(0, 0), None), ScopeId::ROOT);
        assert_eq!(analysis.scope_at(Position::new(4, 4), Some(4)), f);
        assert_eq!(analysis.scope_at(Position::new(5, 0), Some(0)), ScopeId::ROOT);
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative(Some("pkg.mod"), false, 1, Some("sib")).as_deref(),
            Some("pkg.sib")
        );
        assert_eq!(
            resolve_relative(Some("pkg"), true, 1, Some("sub")).as_deref(),
            Some("pkg.sub")
        );
        assert_eq!(
            resolve_relative(Some("a.b.c"), false, 2, None).as_deref(),
            Some("a")
        );
        assert_eq!(resolve_relative(Some("top"), false, 1, None), None);
        assert_eq!(resolve_relative(None, false, 1, Some("x")), None);
        assert_eq!(
            resolve_relative(None, false, 0, Some("os")).as_deref(),
            Some("os")
        );
    }

    #[test]
    fn test_load_component_adds_resource_names() {
        let window = ModuleAnalysis::resource(
            "main.xaml".into(),
            &[SmolStr::new("okButton")],
            1,
            Vec::new(),
        );
        let resolver = resolver().with_resource(window);
        let text = "\
import wpf

class MyWindow:
    def __init__(self):
        wpf.LoadComponent(self, 'Main.xaml')

w = MyWindow()
";
        let analysis = analyze(text, &resolver);
        assert_eq!(analysis.resources, vec![SmolStr::new("main.xaml")]);
        let eval = Evaluator::new(&analysis, &resolver);
        let w = eval.name_values(&analysis, ScopeId::ROOT, "w");
        assert!(eval.members(&w[0]).contains_key("okButton"));
    }

    #[test]
    fn test_resource_key_uses_file_name() {
        assert_eq!(resource_key("ui/Main.XAML"), "main.xaml");
        assert_eq!(resource_key("C:\\app\\Win.xaml"), "win.xaml");
    }
}
