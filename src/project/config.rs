//! Engine configuration.
//!
//! Built once by the host and handed to [`Engine::new`](super::Engine::new).
//! Nothing in the engine reads configuration from anywhere else.

use std::path::Path;
use std::time::Duration;

use crate::base::LanguageVersion;
use crate::base::constants::{PACKAGE_MARKER, PY_EXT, PYW_EXT, XAML_EXT};
use crate::hir::Severity;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Threads in the parse pool.
    pub parse_workers: usize,
    /// Delay before a parse starts; edits arriving meanwhile replace it.
    pub parse_debounce: Duration,
    /// How often `wait_for_complete_analysis` reports progress.
    pub wait_poll_interval: Duration,
    /// Version of the default interpreter.
    pub language_version: LanguageVersion,
    pub source_extensions: Vec<String>,
    pub resource_extensions: Vec<String>,
    pub package_marker: String,
    pub case_insensitive_paths: bool,
    /// Severity of mixed tab/space indentation; `None` drops it.
    pub indentation_inconsistency: Option<Severity>,
    pub report_unresolved_imports: bool,
    /// Above this many entries, surface changes no longer re-analyze
    /// dependents.
    pub cross_module_analysis_limit: Option<usize>,
    /// Stack size of parse workers and the analysis thread.
    pub worker_stack_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parse_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            parse_debounce: Duration::ZERO,
            wait_poll_interval: Duration::from_secs(1),
            language_version: LanguageVersion::default(),
            source_extensions: vec![PY_EXT.to_string(), PYW_EXT.to_string()],
            resource_extensions: vec![XAML_EXT.to_string()],
            package_marker: PACKAGE_MARKER.to_string(),
            case_insensitive_paths: cfg!(any(windows, target_os = "macos")),
            indentation_inconsistency: Some(Severity::Warning),
            report_unresolved_imports: false,
            cross_module_analysis_limit: None,
            worker_stack_size: 16 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse_workers(mut self, workers: usize) -> Self {
        self.parse_workers = workers.max(1);
        self
    }

    pub fn with_parse_debounce(mut self, debounce: Duration) -> Self {
        self.parse_debounce = debounce;
        self
    }

    pub fn with_wait_poll_interval(mut self, interval: Duration) -> Self {
        self.wait_poll_interval = interval;
        self
    }

    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = version;
        self
    }

    pub fn with_source_extensions(mut self, extensions: &[&str]) -> Self {
        self.source_extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_resource_extensions(mut self, extensions: &[&str]) -> Self {
        self.resource_extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_package_marker(mut self, marker: impl Into<String>) -> Self {
        self.package_marker = marker.into();
        self
    }

    pub fn with_case_insensitive_paths(mut self, enabled: bool) -> Self {
        self.case_insensitive_paths = enabled;
        self
    }

    pub fn with_indentation_inconsistency(mut self, severity: Option<Severity>) -> Self {
        self.indentation_inconsistency = severity;
        self
    }

    pub fn with_report_unresolved_imports(mut self, enabled: bool) -> Self {
        self.report_unresolved_imports = enabled;
        self
    }

    pub fn with_cross_module_analysis_limit(mut self, limit: Option<usize>) -> Self {
        self.cross_module_analysis_limit = limit;
        self
    }

    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = bytes;
        self
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        has_extension(path, &self.source_extensions)
    }

    pub fn is_resource_file(&self, path: &Path) -> bool {
        has_extension(path, &self.resource_extensions)
    }

    /// Stem of the package marker (`__init__`), which names no module.
    pub fn package_marker_stem(&self) -> &str {
        Path::new(&self.package_marker)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.package_marker)
    }

    /// Key under which a path is stored in the module table.
    pub fn path_key(&self, path: &Path) -> String {
        let key = path.to_string_lossy();
        if self.case_insensitive_paths {
            key.to_lowercase()
        } else {
            key.into_owned()
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.parse_workers >= 1);
        assert_eq!(config.wait_poll_interval, Duration::from_secs(1));
        assert_eq!(config.indentation_inconsistency, Some(Severity::Warning));
        assert!(!config.report_unresolved_imports);
        assert_eq!(config.package_marker_stem(), "__init__");
    }

    #[test]
    fn test_file_classification() {
        let config = EngineConfig::default();
        assert!(config.is_source_file(Path::new("a/b.py")));
        assert!(config.is_source_file(Path::new("a/B.PYW")));
        assert!(!config.is_source_file(Path::new("a/b.txt")));
        assert!(config.is_resource_file(Path::new("ui/Main.xaml")));
    }

    #[test]
    fn test_path_key_case_folding() {
        let path = Path::new("/Proj/Mod.py");
        let folded = EngineConfig::default().with_case_insensitive_paths(true);
        let exact = EngineConfig::default().with_case_insensitive_paths(false);
        assert_eq!(folded.path_key(path), "/proj/mod.py");
        assert_eq!(exact.path_key(path), "/Proj/Mod.py");
    }

    #[test]
    fn test_parse_workers_never_zero() {
        assert_eq!(EngineConfig::new().with_parse_workers(0).parse_workers, 1);
    }
}
