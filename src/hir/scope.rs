//! Scope tree and bindings of an analyzed module.

use std::sync::OnceLock;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::values::Value;
use crate::base::Span;
use crate::parser::Expr;

/// Index of a scope inside its module analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

/// How a binding got its value. Evaluated lazily.
#[derive(Debug, Clone)]
pub enum BindingSource {
    /// Known without evaluation: definitions and parameters like `self`.
    Value(Value),
    /// The value of an expression.
    Expr(Expr),
    /// The result of calling what an expression evaluates to.
    Call(Expr),
    /// The result of calling a known value, e.g. a property getter.
    Returns(Value),
    /// An element of an iterable, as bound by `for` and by unpacking.
    Element(Expr),
    /// `import a.b` binds `a`.
    Import(SmolStr),
    /// `from module import name`.
    ImportFrom { module: SmolStr, name: SmolStr },
    /// Named element of a markup resource.
    Resource(SmolStr),
}

/// A source together with the scope it is evaluated in.
#[derive(Debug, Clone)]
pub struct BoundSource {
    pub scope: ScopeId,
    pub kind: BindingSource,
}

/// A name bound in a scope.
#[derive(Debug)]
pub struct Binding {
    pub name: SmolStr,
    pub definitions: Vec<Span>,
    pub(crate) sources: Vec<BoundSource>,
    pub(crate) values: OnceLock<Vec<Value>>,
}

impl Binding {
    pub(crate) fn new(name: SmolStr) -> Self {
        Self {
            name,
            definitions: Vec::new(),
            sources: Vec::new(),
            values: OnceLock::new(),
        }
    }

    pub fn sources(&self) -> &[BoundSource] {
        &self.sources
    }

    /// First place the name is defined.
    pub fn definition(&self) -> Option<Span> {
        self.definitions.first().copied()
    }
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub name: SmolStr,
    /// Dotted path from the module, empty for the module scope.
    pub qualified_name: SmolStr,
    pub parent: Option<ScopeId>,
    /// Lines covered by the defining statement.
    pub span: Span,
    pub doc: Option<String>,
    pub(crate) bindings: IndexMap<SmolStr, Binding>,
    pub(crate) instance_attributes: IndexMap<SmolStr, Binding>,
    pub(crate) bases: Vec<Expr>,
    pub(crate) returns: Vec<Expr>,
    pub(crate) is_generator: bool,
    pub(crate) children: Vec<ScopeId>,
}

impl Scope {
    pub(crate) fn new(
        id: ScopeId,
        kind: ScopeKind,
        name: SmolStr,
        qualified_name: SmolStr,
        parent: Option<ScopeId>,
        span: Span,
    ) -> Self {
        Self {
            id,
            kind,
            name,
            qualified_name,
            parent,
            span,
            doc: None,
            bindings: IndexMap::new(),
            instance_attributes: IndexMap::new(),
            bases: Vec::new(),
            returns: Vec::new(),
            is_generator: false,
            children: Vec::new(),
        }
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    /// Attributes assigned through `self` inside the methods of a class.
    pub fn instance_attribute(&self, name: &str) -> Option<&Binding> {
        self.instance_attributes.get(name)
    }

    pub fn instance_attributes(&self) -> impl Iterator<Item = &Binding> {
        self.instance_attributes.values()
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub(crate) fn bind(&mut self, name: &SmolStr, source: Option<BoundSource>, span: Span) {
        bind_into(&mut self.bindings, name, source, span);
    }

    pub(crate) fn bind_attribute(&mut self, name: &SmolStr, source: Option<BoundSource>, span: Span) {
        bind_into(&mut self.instance_attributes, name, source, span);
    }
}

fn bind_into(
    map: &mut IndexMap<SmolStr, Binding>,
    name: &SmolStr,
    source: Option<BoundSource>,
    span: Span,
) {
    let binding = map
        .entry(name.clone())
        .or_insert_with(|| Binding::new(name.clone()));
    binding.definitions.push(span);
    binding.sources.extend(source);
}
