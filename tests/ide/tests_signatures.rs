//! Signature help through the engine.

use serpent::{TextBuffer, TextRange, TextSize};

use crate::helpers::project_fixtures::*;

#[test]
fn test_signature_help_for_imported_function() {
    let dir = ProjectDir::new();
    dir.write("geometry.py", "def scale(shape, factor=2, *rest):\n    return shape\n");
    let main = dir.write("main.py", "from geometry import scale\n");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let entry = engine.entry(&main).unwrap();
    let text = "from geometry import scale\nscale(a, ";
    let snapshot = TextBuffer::new(&main, text).snapshot();
    let help = engine.signatures(&entry, &snapshot, at_end(text)).unwrap();
    assert_eq!(help.name, "scale");
    assert_eq!(help.labels(), vec!["scale(shape, factor=2, *rest)".to_string()]);
    assert_eq!(help.argument, 1);
    assert_eq!(help.active_parameter, Some(1));

    let text = "from geometry import scale\nscale(a, b, c, ";
    let snapshot = TextBuffer::new(&main, text).snapshot();
    let help = engine.signatures(&entry, &snapshot, at_end(text)).unwrap();
    assert_eq!(help.active_parameter, Some(2));
}

#[test]
fn test_signature_help_for_builtin_type() {
    let engine = engine();
    let buffer = TextBuffer::transient("n = int(");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);

    let entry = engine.binding_entry(binding).unwrap();
    let snapshot = buffer.snapshot();
    let help = engine.signatures(&entry, &snapshot, at_end(snapshot.text())).unwrap();
    assert_eq!(help.name, "int");
    assert!(!help.signatures.is_empty());
}

#[test]
fn test_cursor_inside_multibyte_character() {
    let engine = engine();
    let source = "def f(a):\n    return a\n";
    let buffer = TextBuffer::transient(source);
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);

    let entry = engine.binding_entry(binding).unwrap();
    let text = format!("{}f(é", source);
    let snapshot = TextBuffer::transient(text.as_str()).snapshot();
    // One byte into `é`
    let cursor = TextSize::of(text.as_str()) - TextSize::new(1);
    let help = engine
        .signatures(&entry, &snapshot, TextRange::empty(cursor))
        .unwrap();
    assert_eq!(help.labels(), vec!["f(a)".to_string()]);
}
