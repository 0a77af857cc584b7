//! Missing-import suggestions through the engine.

use serpent::TextBuffer;

use crate::helpers::project_fixtures::*;

#[test]
fn test_missing_import_found_in_project_and_stdlib() {
    let dir = ProjectDir::new();
    dir.write("tools.py", "def join(parts):\n    return parts\n");
    let main = dir.write("main.py", "");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let entry = engine.entry(&main).unwrap();
    let text = "join";
    let snapshot = TextBuffer::new(&main, text).snapshot();
    let suggestions = engine.missing_imports(&entry, &snapshot, at_end(text));
    let modules: Vec<&str> = suggestions.iter().map(|s| s.module.as_str()).collect();
    assert!(modules.contains(&"tools"));
    assert!(!modules.contains(&"main"));
    assert!(
        suggestions
            .iter()
            .any(|s| s.statement() == "from tools import join")
    );
}

#[test]
fn test_suggestions_disappear_once_defined() {
    let dir = ProjectDir::new();
    dir.write("tools.py", "def helper():\n    pass\n");
    let main = dir.write("main.py", "");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let buffer = TextBuffer::new(&main, "helper");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    settle(&engine);
    let entry = engine.binding_entry(binding).unwrap();
    let snapshot = buffer.snapshot();
    assert_eq!(engine.missing_imports(&entry, &snapshot, at_end(snapshot.text())).len(), 1);

    let snapshot = buffer.set_text("def helper():\n    pass\nhelper");
    settle(&engine);
    assert!(engine.missing_imports(&entry, &snapshot, at_end(snapshot.text())).is_empty());
}
