//! On-disk project trees and engines configured for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serpent::ide::CompletionItem;
use serpent::project::{CollectingSink, InterpreterFactory};
use serpent::{Engine, EngineConfig, LanguageVersion, TextRange, TextSize};
use tempfile::TempDir;

/// A temporary project directory.
pub struct ProjectDir {
    dir: TempDir,
}

impl ProjectDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Write `text` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.file(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, text).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) -> PathBuf {
        let path = self.file(relative);
        fs::remove_file(&path).unwrap();
        path
    }
}

pub fn test_config() -> EngineConfig {
    EngineConfig::new()
        .with_parse_workers(2)
        .with_wait_poll_interval(Duration::from_millis(10))
        .with_case_insensitive_paths(false)
}

pub fn engine() -> Engine {
    Engine::new(test_config()).unwrap()
}

pub fn engine_with_config(config: EngineConfig) -> Engine {
    Engine::new(config).unwrap()
}

/// Engine publishing into a collecting sink, with its interpreter factory.
pub fn engine_with_sink() -> (Engine, Arc<CollectingSink>, Arc<InterpreterFactory>) {
    let sink = CollectingSink::new();
    let factory = InterpreterFactory::standard(LanguageVersion::default());
    let engine = Engine::with_collaborators(test_config(), factory.clone(), sink.clone()).unwrap();
    (engine, sink, factory)
}

/// Wait until every parse and analysis has finished.
pub fn settle(engine: &Engine) {
    assert_eq!(engine.wait_for_complete_analysis(|_| true), 0);
}

/// Empty range at the end of `text`.
pub fn at_end(text: &str) -> TextRange {
    TextRange::empty(TextSize::of(text))
}

/// Range of the first occurrence of `needle` in `text`.
pub fn range_of(text: &str, needle: &str) -> TextRange {
    let start = text.find(needle).unwrap();
    TextRange::at(TextSize::new(start as u32), TextSize::of(needle))
}

pub fn labels(items: &[CompletionItem]) -> Vec<String> {
    items.iter().map(|i| i.label.to_string()).collect()
}
