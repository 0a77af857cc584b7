//! Directory analysis, discovery and file system events.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serpent::{EngineError, TextBuffer};
use walkdir::WalkDir;

use crate::helpers::project_fixtures::*;

fn tracked_paths(engine: &serpent::Engine) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = engine
        .entries()
        .iter()
        .filter_map(|e| e.path().map(Path::to_path_buf))
        .collect();
    paths.sort();
    paths
}

/// Source files reachable from `root` through package directories only.
fn expected_sources(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            !e.file_type().is_dir() || e.path() == root || e.path().join("__init__.py").is_file()
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "py"))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}

// =============================================================================
// DISCOVERY
// =============================================================================

#[test]
fn test_directory_discovery_follows_packages() {
    let dir = ProjectDir::new();
    dir.write("main.py", "import pkg.mod\n");
    dir.write("pkg/__init__.py", "");
    dir.write("pkg/mod.py", "VALUE = 1\n");
    dir.write("pkg/sub/__init__.py", "");
    dir.write("pkg/sub/deep.py", "");
    dir.write("nopkg/loose.py", "");
    dir.write("pkg/data/notes.py", "");

    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let tracked = tracked_paths(&engine);
    assert_eq!(tracked, expected_sources(dir.path()));
    assert!(!tracked.contains(&dir.file("nopkg/loose.py")));

    let deep = engine.entry(dir.file("pkg/sub/deep.py")).unwrap();
    assert_eq!(deep.module_name().map(|m| m.as_str()), Some("pkg.sub.deep"));
    let package = engine.entry(dir.file("pkg/__init__.py")).unwrap();
    assert_eq!(package.module_name().map(|m| m.as_str()), Some("pkg"));
    assert!(package.is_package());
}

#[test]
fn test_analyze_file_rejects_unknown_extensions() {
    let dir = ProjectDir::new();
    let path = dir.write("notes.txt", "hello");
    let engine = engine();
    assert!(matches!(
        engine.analyze_file(&path),
        Err(EngineError::UnsupportedFile(p)) if p == path
    ));
}

#[test]
fn test_analyze_file_tracks_single_file() {
    let dir = ProjectDir::new();
    let path = dir.write("script.py", "x = 1\n");
    let engine = engine();
    let entry = engine.analyze_file(&path).unwrap();
    settle(&engine);
    assert_eq!(entry.module_name().map(|m| m.as_str()), Some("script"));
    assert!(entry.analysis().is_some());
    // Same path, same entry.
    let again = engine.analyze_file(&path).unwrap();
    assert!(Arc::ptr_eq(&entry, &again));
}

#[test]
fn test_stop_analyzing_directory_unloads_unbound_entries() {
    let dir = ProjectDir::new();
    let a = dir.write("a.py", "");
    let b = dir.write("b.py", "");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let buffer = TextBuffer::new(&b, "y = 2\n");
    engine.monitor_buffer(&buffer).unwrap();
    engine.stop_analyzing_directory(dir.path()).unwrap();
    settle(&engine);

    assert!(engine.entry(&a).is_none());
    assert!(engine.entry(&b).is_some());
}

// =============================================================================
// FILE EVENTS
// =============================================================================

#[test]
fn test_file_created_and_deleted() {
    let dir = ProjectDir::new();
    dir.write("a.py", "");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let created = dir.write("b.py", "z = 1.5\n");
    engine.file_created(&created).unwrap();
    let outside = dir.write("loose/c.py", "");
    engine.file_created(&outside).unwrap();
    settle(&engine);

    let entry = engine.entry(&created).unwrap();
    assert!(entry.analysis().is_some());
    assert!(engine.entry(&outside).is_none());

    let deleted = dir.remove("b.py");
    engine.file_deleted(&deleted).unwrap();
    settle(&engine);
    assert!(engine.entry(&deleted).is_none());
    assert!(engine.table().entry_by_module("b").is_none());
}

#[test]
fn test_deleting_a_module_reanalyzes_its_importers() {
    let dir = ProjectDir::new();
    dir.write("geometry.py", "SIDES = 4\n");
    let text = "from geometry import SIDES\nsides = SIDES\n";
    let main = dir.write("main.py", text);
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let entry = engine.entry(&main).unwrap();
    let snapshot = TextBuffer::new(&main, text).snapshot();
    let before = entry.analysis().unwrap();
    let info = engine.analyze_expression(&entry, &snapshot, range_of(text, "sides"));
    assert_eq!(info.description(), "int");

    let deleted = dir.remove("geometry.py");
    engine.file_deleted(&deleted).unwrap();
    settle(&engine);

    let after = entry.analysis().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    let info = engine.analyze_expression(&entry, &snapshot, range_of(text, "sides"));
    assert!(info.is_empty());
}

#[test]
fn test_unloading_a_module_reanalyzes_its_importers() {
    let dir = ProjectDir::new();
    let geometry = dir.write("geometry.py", "SIDES = 4\n");
    let main = dir.write("main.py", "import geometry\nsides = geometry.SIDES\n");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let entry = engine.entry(&main).unwrap();
    let before = entry.analysis().unwrap();
    engine.unload_file(&engine.entry(&geometry).unwrap()).unwrap();
    settle(&engine);

    assert!(engine.entry(&geometry).is_none());
    assert!(!Arc::ptr_eq(&before, &entry.analysis().unwrap()));
}

#[test]
fn test_file_changed_reparses_from_disk() {
    let dir = ProjectDir::new();
    let path = dir.write("a.py", "value = 1\n");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let text = "value = 'text'\n";
    dir.write("a.py", text);
    engine.file_changed(&path).unwrap();
    settle(&engine);

    let entry = engine.entry(&path).unwrap();
    let snapshot = TextBuffer::new(&path, text).snapshot();
    let info = engine.analyze_expression(&entry, &snapshot, range_of(text, "value"));
    assert_eq!(info.description(), "str");
}

// =============================================================================
// CROSS-MODULE
// =============================================================================

#[test]
fn test_surface_change_reanalyzes_importers() {
    let dir = ProjectDir::new();
    let a = dir.write("a.py", "VALUE = 1\n");
    let b_text = "from a import VALUE\nx = VALUE\n";
    let b = dir.write("b.py", b_text);
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let importer = engine.entry(&b).unwrap();
    let before = importer.analysis().unwrap();
    let snapshot = TextBuffer::new(&b, b_text).snapshot();
    let info = engine.analyze_expression(&importer, &snapshot, range_of(b_text, "x"));
    assert_eq!(info.description(), "int");

    let buffer = TextBuffer::new(&a, "VALUE = 'changed'\n");
    engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);

    let after = importer.analysis().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    let info = engine.analyze_expression(&importer, &snapshot, range_of(b_text, "x"));
    assert_eq!(info.description(), "str");
}

#[test]
fn test_cross_module_limit_stops_fan_out() {
    let dir = ProjectDir::new();
    let a = dir.write("a.py", "VALUE = 1\n");
    let b = dir.write("b.py", "from a import VALUE\n");
    let engine = engine_with_config(test_config().with_cross_module_analysis_limit(Some(1)));
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let importer = engine.entry(&b).unwrap();
    let before = importer.analysis().unwrap();
    let buffer = TextBuffer::new(&a, "VALUE = 'changed'\n");
    engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);
    assert!(Arc::ptr_eq(&before, &importer.analysis().unwrap()));
}
