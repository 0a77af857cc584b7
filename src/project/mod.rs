//! Project orchestration: tracked entries, text buffers, and the pipeline
//! that keeps their facts current.
//!
//! ## Pipeline
//!
//! ```text
//! TextBuffer edit / file event
//!     │
//!     ▼
//! Engine ──Command──▶ AnalysisActor (one thread, owns ModuleTable)
//!                         │            ▲
//!                         ▼            │ Command::Analyze
//!                     ParseQueue (rayon pool, per-entry debounce)
//!                         │
//!                         ▼
//!                     AnalysisQueue (priority order) ──▶ analyze, publish
//! ```
//!
//! Entry identity lives in a small registry shared by the engine and the
//! actor, so requests that hand back an entry return without a round trip.
//!
//! Readers never block on the pipeline: [`Engine::analysis`] hands out the
//! last published [`ModuleTable`] and queries read whatever facts are
//! attached to its entries.

mod activity;
mod actor;
mod analysis_queue;
mod buffer;
mod config;
mod diagnostic_publisher;
pub mod discovery;
mod engine;
mod entry;
mod error;
mod interpreter;
mod parse_queue;
mod registry;
mod stdlib;
mod table;

pub use analysis_queue::Priority;
pub use buffer::{BufferId, BufferSubscription, TextBuffer, TextSnapshot};
pub use config::EngineConfig;
pub use diagnostic_publisher::{CollectingSink, DiagnosticPublisher, DiagnosticSink, NullSink};
pub use engine::{BindingHandle, Engine};
pub use entry::{AnalysisCookie, EntryContent, EntryId, EntryKind, EntryStatus, ProjectEntry};
#[cfg(test)]
pub(crate) use entry::ParseOutcome;
pub use error::{EngineError, Result};
pub use interpreter::{InterpreterFactory, Subscription};
pub use parse_queue::ParseStats;
pub use stdlib::standard_database;
pub use table::ModuleTable;
