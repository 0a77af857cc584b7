//! Completion through the engine, across modules.

use serpent::TextBuffer;
use serpent::ide::CompletionKind;

use crate::helpers::project_fixtures::*;

#[test]
fn test_completion_of_project_package_members() {
    let dir = ProjectDir::new();
    dir.write("shapes/__init__.py", "");
    dir.write(
        "shapes/circle.py",
        "PI = 3.14\ndef area(r):\n    \"\"\"Area of a circle.\"\"\"\n    return PI * r * r\n",
    );
    let main = dir.write("main.py", "");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let entry = engine.entry(&main).unwrap();
    let text = "from shapes.circle import ";
    let snapshot = TextBuffer::new(&main, text).snapshot();
    let items = engine.completions(&entry, &snapshot, at_end(text));
    let area = items.iter().find(|i| i.label.as_ref() == "area").unwrap();
    assert_eq!(area.kind, CompletionKind::Function);
    assert_eq!(area.documentation.as_deref(), Some("Area of a circle."));
    assert!(labels(&items).contains(&"PI".to_string()));

    let text = "import shapes.";
    let snapshot = TextBuffer::new(&main, text).snapshot();
    let items = engine.completions(&entry, &snapshot, at_end(text));
    assert_eq!(labels(&items), vec!["circle".to_string()]);
}

#[test]
fn test_completion_on_imported_module_attribute() {
    let dir = ProjectDir::new();
    dir.write("config.py", "DEBUG = False\nNAME = 'app'\n");
    let text = "import config\nconfig.";
    let main = dir.write("main.py", "import config\n");
    let engine = engine();
    engine.analyze_directory(dir.path()).unwrap();
    settle(&engine);

    let entry = engine.entry(&main).unwrap();
    let snapshot = TextBuffer::new(&main, text).snapshot();
    let labels = labels(&engine.completions(&entry, &snapshot, at_end(text)));
    assert!(labels.contains(&"DEBUG".to_string()));
    assert!(labels.contains(&"NAME".to_string()));
}

#[test]
fn test_no_completions_before_analysis_in_comment() {
    let engine = engine();
    let buffer = TextBuffer::transient("# x.");
    let binding = engine.monitor_buffer(&buffer).unwrap();
    let entry = engine.binding_entry(binding).unwrap();
    let snapshot = buffer.snapshot();
    assert!(engine.completions(&entry, &snapshot, at_end(snapshot.text())).is_empty());
    settle(&engine);
}
