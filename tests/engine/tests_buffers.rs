//! Buffers bound to the engine: edits, stale facts, consoles, diagnostics.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use serpent::hir::Diagnostic;
use serpent::project::{DiagnosticSink, InterpreterFactory};
use serpent::{Engine, EntryStatus, LanguageVersion, TextBuffer};

use crate::helpers::project_fixtures::*;

// =============================================================================
// EDITS
// =============================================================================

#[test]
fn test_member_completions_follow_edits() {
    let dir = ProjectDir::new();
    let engine = engine();
    let buffer = TextBuffer::new(dir.file("main.py"), "x = 1\n");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);

    let entry = engine.binding_entry(binding).unwrap();
    let snapshot = buffer.insert(buffer.snapshot().len(), "x.");
    let items = engine.completions(&entry, &snapshot, at_end(snapshot.text()));
    assert!(labels(&items).contains(&"bit_length".to_string()));

    buffer.set_text("x = 'a'\n");
    settle(&engine);
    let snapshot = buffer.insert(buffer.snapshot().len(), "x.");
    settle(&engine);
    let items = engine.completions(&entry, &snapshot, at_end(snapshot.text()));
    let labels = labels(&items);
    assert!(labels.contains(&"upper".to_string()));
    assert!(!labels.contains(&"bit_length".to_string()));
}

#[test]
fn test_binding_entry_is_available_immediately() {
    let engine = engine();
    let buffer = TextBuffer::transient("value = 3\n");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    let entry = engine.binding_entry(binding).unwrap();
    assert!(entry.path().is_none());
    settle(&engine);
    assert_eq!(entry.status(), EntryStatus::Analyzed);
    assert!(entry.is_current(&buffer.snapshot()));
}

#[test]
fn test_deeply_nested_input_is_a_syntax_error() {
    let engine = engine();
    let text = format!("x = {}1{}\ny = 'ok'\n", "(".repeat(5000), ")".repeat(5000));
    let buffer = TextBuffer::transient(&text);
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);

    let entry = engine.binding_entry(binding).unwrap();
    assert_eq!(entry.status(), EntryStatus::Analyzed);
    assert_eq!(entry.syntax_diagnostics().len(), 1);
    let snapshot = buffer.snapshot();
    let info = engine.analyze_expression(&entry, &snapshot, range_of(snapshot.text(), "y"));
    assert_eq!(info.description(), "str");
}

#[test]
fn test_syntax_error_keeps_previous_facts() {
    let dir = ProjectDir::new();
    let engine = engine();
    let buffer = TextBuffer::new(dir.file("main.py"), "x = 1\n");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);
    let entry = engine.binding_entry(binding).unwrap();

    let broken = buffer.set_text("x = 1\ndef (:\n");
    settle(&engine);

    assert!(!entry.syntax_diagnostics().is_empty());
    assert!(!entry.is_current(&broken));
    let info = engine.analyze_expression(&entry, &broken, range_of(broken.text(), "x"));
    assert!(info.analyzed);
    assert_eq!(info.description(), "int");
}

// =============================================================================
// CONSOLES
// =============================================================================

#[test]
fn test_attached_buffers_share_one_module() {
    let engine = engine();
    let history = TextBuffer::transient("x = 1\n");
    let binding = engine.monitor_buffer(&history).unwrap();
    let input = TextBuffer::transient("y = x\n");
    engine.attach_buffer(binding, &input).unwrap();
    settle(&engine);

    let entry = engine.binding_entry(binding).unwrap();
    let snapshot = input.snapshot();
    let info = engine.analyze_expression(&entry, &snapshot, range_of(snapshot.text(), "y"));
    assert_eq!(info.description(), "int");
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

#[test]
fn test_stop_monitoring_clears_diagnostics() {
    let dir = ProjectDir::new();
    let (engine, sink, _factory) = engine_with_sink();
    let path = dir.file("scratch.py");
    let buffer = TextBuffer::new(&path, "def (:\n");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);
    assert!(!sink.errors(&path).is_empty());

    engine.stop_monitoring(binding).unwrap();
    settle(&engine);
    assert!(sink.errors(&path).is_empty());
    assert!(engine.entry(&path).is_none());
    assert_eq!(buffer.listener_count(), 0);
}

#[test]
fn test_stop_monitoring_reverts_to_disk() {
    let dir = ProjectDir::new();
    let path = dir.write("main.py", "x = 1\n");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let buffer = TextBuffer::new(&path, "x = 'edited'\n");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);
    engine.stop_monitoring(binding).unwrap();
    settle(&engine);

    let entry = engine.entry(&path).unwrap();
    let text = "x = 1\n";
    let snapshot = TextBuffer::new(&path, text).snapshot();
    let info = engine.analyze_expression(&entry, &snapshot, range_of(text, "x"));
    assert_eq!(info.description(), "int");
}

// =============================================================================
// NON-BLOCKING REQUESTS
// =============================================================================

/// Holds the analysis thread in `refresh` until the gate is dropped.
struct GateSink {
    entered: Sender<()>,
    gate: Receiver<()>,
}

impl DiagnosticSink for GateSink {
    fn add_errors(&self, _path: &Path, _diagnostics: &[Diagnostic]) {}
    fn add_warnings(&self, _path: &Path, _diagnostics: &[Diagnostic]) {}
    fn clear(&self, _path: &Path) {}
    fn refresh(&self) {
        let _ = self.entered.send(());
        let _ = self.gate.recv();
    }
}

#[test]
fn test_requests_return_while_analysis_is_busy() {
    let dir = ProjectDir::new();
    let first = dir.write("first.py", "x = 1\n");
    let second = dir.write("second.py", "y = 2\n");
    let (entered, entered_rx) = crossbeam_channel::unbounded();
    let (gate_tx, gate) = crossbeam_channel::unbounded::<()>();
    let factory = InterpreterFactory::standard(LanguageVersion::default());
    let engine =
        Engine::with_collaborators(test_config(), factory, Arc::new(GateSink { entered, gate }))
            .unwrap();

    engine.analyze_file(&first).unwrap();
    entered_rx.recv_timeout(Duration::from_secs(10)).unwrap();

    // The analysis thread is parked inside the sink.
    let entry = engine.analyze_file(&second).unwrap();
    assert!(engine.entry(&second).is_none());
    let buffer = TextBuffer::transient("z = 3\n");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    let bound = engine.binding_entry(binding).unwrap();
    assert!(bound.path().is_none());

    drop(gate_tx);
    settle(&engine);
    assert!(Arc::ptr_eq(&entry, &engine.entry(&second).unwrap()));
    assert!(Arc::ptr_eq(&bound, &engine.binding_entry(binding).unwrap()));
    assert_eq!(entry.status(), EntryStatus::Analyzed);
    assert_eq!(bound.status(), EntryStatus::Analyzed);
}
