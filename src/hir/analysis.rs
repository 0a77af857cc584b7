//! Semantic analysis result of one module.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::diagnostics::Diagnostic;
use super::eval::{Evaluator, ModuleResolver};
use super::scope::{Binding, BindingSource, BoundSource, Scope, ScopeId, ScopeKind};
use super::values::{BuiltinType, Value, describe};
use crate::base::constants::IMPLICIT_MODULE_ATTRIBUTES;
use crate::base::{Position, Span};

/// A module the analyzed module depends on through an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    pub module: SmolStr,
    pub span: Span,
    pub resolved: bool,
}

/// Externally visible names of a module with their rendered types.
///
/// Dependents are re-analyzed when this changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedSurface {
    entries: BTreeMap<SmolStr, String>,
}

impl ExportedSurface {
    pub fn compute(analysis: &ModuleAnalysis, resolver: &dyn ModuleResolver) -> Self {
        let eval = Evaluator::new(analysis, resolver);
        let root = analysis.root();
        let entries = analysis
            .exported_names()
            .into_iter()
            .map(|name| {
                let rendered = match root.binding(&name) {
                    Some(binding) => describe(&eval.binding_values(analysis, binding)),
                    None => describe(&[]),
                };
                (name, rendered)
            })
            .collect();
        Self { entries }
    }

    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.entries.keys()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scopes, bindings, imports and diagnostics of one module.
#[derive(Debug)]
pub struct ModuleAnalysis {
    /// Module name, or the anonymous id of a transient entry.
    pub key: SmolStr,
    pub module_name: Option<SmolStr>,
    pub is_package: bool,
    /// Version of the tree this analysis was computed from.
    pub version: u64,
    pub doc: Option<String>,
    pub imports: Vec<ImportEdge>,
    /// `X.name` for every `from X import name`: a submodule only if such a
    /// module shows up, so a dependency but not an import.
    pub(crate) submodule_candidates: Vec<SmolStr>,
    /// Markup resources loaded by this module, by file name.
    pub resources: Vec<SmolStr>,
    pub diagnostics: Vec<Diagnostic>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) scope_names: FxHashMap<SmolStr, ScopeId>,
    pub(crate) dunder_all: Option<Vec<SmolStr>>,
    pub(crate) surface: ExportedSurface,
}

impl ModuleAnalysis {
    pub(crate) fn empty(key: SmolStr, module_name: Option<SmolStr>, version: u64) -> Self {
        let root = Scope::new(
            ScopeId::ROOT,
            ScopeKind::Module,
            module_name.clone().unwrap_or_else(|| key.clone()),
            SmolStr::default(),
            None,
            Span::default(),
        );
        let mut scope_names = FxHashMap::default();
        scope_names.insert(SmolStr::default(), ScopeId::ROOT);
        Self {
            key,
            module_name,
            is_package: false,
            version,
            doc: None,
            imports: Vec::new(),
            submodule_candidates: Vec::new(),
            resources: Vec::new(),
            diagnostics: Vec::new(),
            scopes: vec![root],
            scope_names,
            dunder_all: None,
            surface: ExportedSurface::default(),
        }
    }

    /// Analysis of a markup resource: each named element is a module-level
    /// name.
    pub fn resource(
        key: SmolStr,
        names: &[SmolStr],
        version: u64,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut analysis = Self::empty(key, None, version);
        for name in names {
            let source = BoundSource {
                scope: ScopeId::ROOT,
                kind: BindingSource::Resource(name.clone()),
            };
            analysis.scopes[0].bind(name, Some(source), Span::default());
        }
        analysis.diagnostics = diagnostics;
        analysis.surface = ExportedSurface {
            entries: names
                .iter()
                .map(|n| (n.clone(), "object".to_string()))
                .collect(),
        };
        analysis
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Scope of a class or function by dotted path, e.g. `Outer.method`.
    pub fn scope_by_name(&self, qualified_name: &str) -> Option<&Scope> {
        self.scope_names
            .get(qualified_name)
            .map(|id| self.scope(*id))
    }

    /// Innermost scope enclosing `position`.
    ///
    /// A line past the end of a definition still belongs to it when
    /// `indent` is deeper than the definition's own column, which is the
    /// case while typing at the end of a body.
    pub fn scope_at(&self, position: Position, indent: Option<usize>) -> ScopeId {
        let mut current = ScopeId::ROOT;
        loop {
            let candidate = self
                .scope(current)
                .children
                .iter()
                .map(|id| self.scope(*id))
                .take_while(|child| child.span.start.line < position.line)
                .last();
            match candidate {
                Some(child)
                    if position.line <= child.span.end.line
                        || indent.is_some_and(|i| i > child.span.start.column) =>
                {
                    current = child.id;
                }
                _ => return current,
            }
        }
    }

    /// Public module-level names, or the literal `__all__` when present.
    pub fn exported_names(&self) -> Vec<SmolStr> {
        if let Some(all) = &self.dunder_all {
            return all.clone();
        }
        self.root()
            .bindings()
            .map(|b| &b.name)
            .filter(|name| !name.starts_with('_'))
            .cloned()
            .collect()
    }

    pub fn surface(&self) -> &ExportedSurface {
        &self.surface
    }

    pub fn set_surface(&mut self, surface: ExportedSurface) {
        self.surface = surface;
    }

    /// Module names and resource file names this module depends on.
    pub fn dependencies(&self) -> Vec<SmolStr> {
        let mut deps: Vec<SmolStr> = self
            .imports
            .iter()
            .map(|i| i.module.clone())
            .chain(self.submodule_candidates.iter().cloned())
            .chain(self.resources.iter().cloned())
            .collect();
        deps.sort();
        deps.dedup();
        deps
    }

    /// Binding visible from `scope` under Python's lexical rules: class
    /// bodies are skipped for names used in nested functions.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let mut current = Some(scope);
        let mut innermost = true;
        while let Some(id) = current {
            let scope = self.scope(id);
            if innermost || scope.kind != ScopeKind::Class {
                if let Some(binding) = scope.binding(name) {
                    return Some(binding);
                }
            }
            innermost = false;
            current = scope.parent;
        }
        None
    }

    pub(crate) fn bind_implicit_attributes(&mut self) {
        for name in IMPLICIT_MODULE_ATTRIBUTES {
            let ty = match *name {
                "__path__" => BuiltinType::List,
                "__builtins__" | "__dict__" => BuiltinType::Dict,
                _ => BuiltinType::Str,
            };
            let source = BoundSource {
                scope: ScopeId::ROOT,
                kind: BindingSource::Value(Value::Instance(ty)),
            };
            self.scopes[0].bind(&SmolStr::new(name), Some(source), Span::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_analysis_exports_names() {
        let names = vec![SmolStr::new("okButton"), SmolStr::new("input")];
        let analysis = ModuleAnalysis::resource("Main.xaml".into(), &names, 1, Vec::new());
        assert!(analysis.root().binding("okButton").is_some());
        assert_eq!(analysis.surface().get("input"), Some("object"));
        assert_eq!(analysis.exported_names().len(), 2);
    }

    #[test]
    fn test_exported_names_skip_private() {
        let mut analysis = ModuleAnalysis::empty("m".into(), Some("m".into()), 0);
        analysis.bind_implicit_attributes();
        analysis.scopes[0].bind(&"public".into(), None, Span::default());
        analysis.scopes[0].bind(&"_hidden".into(), None, Span::default());
        assert_eq!(analysis.exported_names(), vec![SmolStr::new("public")]);
        assert!(analysis.lookup(ScopeId::ROOT, "__name__").is_some());

        analysis.dunder_all = Some(vec!["_hidden".into()]);
        assert_eq!(analysis.exported_names(), vec![SmolStr::new("_hidden")]);
    }
}
