//! High-level IR (HIR): the semantic model of analyzed modules.
//!
//! ## Key Types
//!
//! - [`ModuleAnalysis`] - scopes, bindings, imports and diagnostics of a module
//! - [`Value`] - one inferred value; a set of them is what a name evaluates to
//! - [`Evaluator`] - lazy evaluation of bindings and expressions
//! - [`ModuleResolver`] - access to other modules and the type database
//! - [`TypeDatabase`] - builtins and external modules of an interpreter
//! - [`ExportIndex`] - project-wide "who exports what"
//!
//! ## Layers
//!
//! ```text
//! SyntaxFile
//!     │
//!     ▼
//! analyze_module(file, cx)   ← scopes + lazy binding sources
//!     │
//!     ▼
//! ModuleAnalysis             ← shared as Arc, values cached on first use
//!     │
//!     ▼
//! Evaluator                  ← names, attributes, calls, signatures
//! ```

mod analysis;
mod analyzer;
mod builtins;
mod database;
mod diagnostics;
mod eval;
mod index;
mod scope;
mod values;

pub use analysis::{ExportedSurface, ImportEdge, ModuleAnalysis};
pub use analyzer::{ModuleContext, analyze_module, resolve_relative, resource_key};
pub use builtins::{BuiltinMember, MemberKind};
pub use database::{ExternalModule, TypeDatabase};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
pub use eval::{Evaluator, ModuleResolver, ModuleSource};
pub use index::ExportIndex;
pub use scope::{Binding, BindingSource, BoundSource, Scope, ScopeId, ScopeKind};
pub use values::{
    BuiltinType, ClassBody, ClassInfo, FunctionInfo, MethodKind, ParamInfo, Returns, Signature,
    SourceRef, Value, describe, union_into,
};
