//! Waiting for analysis and parse accounting.

use std::time::Duration;

use serpent::TextBuffer;
use serpent::project::standard_database;
use serpent::LanguageVersion;

use crate::helpers::project_fixtures::*;

#[test]
fn test_wait_with_nothing_to_do() {
    let engine = engine();
    let mut calls = Vec::new();
    let left = engine.wait_for_complete_analysis(|n| {
        calls.push(n);
        true
    });
    assert_eq!(left, 0);
    assert_eq!(calls, vec![0]);
    assert!(!engine.is_analyzing());
}

#[test]
fn test_wait_stops_when_progress_declines() {
    let engine = engine_with_config(test_config().with_parse_debounce(Duration::from_millis(300)));
    let buffer = TextBuffer::transient("x = 1\n");
    engine.monitor_buffer(&buffer).unwrap();

    let mut calls = 0;
    let left = engine.wait_for_complete_analysis(|_| {
        calls += 1;
        false
    });
    assert!(left > 0);
    assert_eq!(calls, 1);
    assert!(engine.is_analyzing());

    settle(&engine);
    assert!(!engine.is_analyzing());
}

#[test]
fn test_rapid_edits_are_accounted_for() {
    let engine = engine_with_config(test_config().with_parse_debounce(Duration::from_millis(20)));
    let buffer = TextBuffer::transient("");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    for i in 0..20 {
        buffer.set_text(&format!("x = {}\n", i));
    }
    settle(&engine);

    let stats = engine.parse_stats();
    assert_eq!(stats.requested, stats.applied + stats.discarded + stats.failed);
    assert!(stats.applied >= 1);
    // Only one entry, so never more than one parse at a time.
    assert_eq!(stats.peak_running, 1);
    let entry = engine.binding_entry(binding).unwrap();
    assert!(entry.is_current(&buffer.snapshot()));
}

#[test]
fn test_database_replacement_reparses_each_entry_once() {
    let dir = ProjectDir::new();
    dir.write("a.py", "import os\n");
    dir.write("b.py", "x = len('abc')\n");
    let (engine, _sink, factory) = engine_with_sink();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let before = engine.parse_stats().requested;
    factory.replace_database(standard_database(LanguageVersion::default()));
    settle(&engine);
    assert_eq!(engine.parse_stats().requested - before, 2);
    assert!(engine.entries().iter().all(|e| e.analysis().is_some()));
}
