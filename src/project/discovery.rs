//! Discovery of source files under analysis roots, and module naming.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::config::EngineConfig;

/// Source and resource files under `dir`.
///
/// Files directly inside `dir` are always included; a subdirectory is only
/// entered when it contains the package marker. A directory that cannot be
/// read ends that branch.
pub fn discover_directory(dir: &Path, config: &EngineConfig) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect(dir, config, &mut found);
    found.sort();
    found
}

fn collect(dir: &Path, config: &EngineConfig, found: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "directory vanished during discovery");
            return;
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to read directory");
            return;
        }
    };

    let mut packages = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if path.join(&config.package_marker).is_file() {
                packages.push(path);
            }
        } else if config.is_source_file(&path) || config.is_resource_file(&path) {
            found.push(path);
        }
    }
    for package in packages {
        collect(&package, config, found);
    }
}

/// Dotted module name of a source file and whether it names a package.
///
/// The name is the file stem prefixed by every enclosing directory that
/// holds the package marker: `/proj/pkg/mod.py` is `pkg.mod` when
/// `/proj/pkg/__init__.py` exists, and `/proj/pkg/__init__.py` is `pkg`.
pub fn module_name(path: &Path, config: &EngineConfig) -> Option<(String, bool)> {
    let stem = path.file_stem()?.to_str()?;
    let is_package = stem == config.package_marker_stem();
    let mut parts = Vec::new();
    if !is_package {
        parts.push(stem.to_string());
    }
    let mut dir = path.parent();
    while let Some(current) = dir {
        if !current.join(&config.package_marker).is_file() {
            break;
        }
        let Some(name) = current.file_name().and_then(|n| n.to_str()) else {
            break;
        };
        parts.push(name.to_string());
        dir = current.parent();
    }
    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some((parts.join("."), is_package))
}

/// Whether discovery from one of `roots` reaches `path`.
pub fn is_discoverable(path: &Path, roots: &[PathBuf], config: &EngineConfig) -> bool {
    let is_root = |dir: &Path| {
        let key = config.path_key(dir);
        roots.iter().any(|root| config.path_key(root) == key)
    };
    let mut dir = path.parent();
    while let Some(current) = dir {
        if is_root(current) {
            return true;
        }
        if !current.join(&config.package_marker).is_file() {
            return false;
        }
        dir = current.parent();
    }
    false
}

/// Whether `path` lies inside `dir`.
pub fn is_within(path: &Path, dir: &Path, config: &EngineConfig) -> bool {
    if config.case_insensitive_paths {
        let dir = config.path_key(dir);
        let path = config.path_key(path);
        path.strip_prefix(dir.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(std::path::MAIN_SEPARATOR))
    } else {
        path.starts_with(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_discovery_follows_package_markers() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("top.py"));
        touch(&root.join("notes.txt"));
        touch(&root.join("pkg/__init__.py"));
        touch(&root.join("pkg/mod.py"));
        touch(&root.join("pkg/ui.xaml"));
        touch(&root.join("pkg/sub/__init__.py"));
        touch(&root.join("pkg/sub/deep.pyw"));
        touch(&root.join("nopkg/mod.py"));
        touch(&root.join("pkg/plain/hidden.py"));

        let config = EngineConfig::default().with_case_insensitive_paths(false);
        let found: Vec<PathBuf> = discover_directory(root, &config)
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        let expected: Vec<PathBuf> = [
            "pkg/__init__.py",
            "pkg/mod.py",
            "pkg/sub/__init__.py",
            "pkg/sub/deep.pyw",
            "pkg/ui.xaml",
            "top.py",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::default();
        assert!(discover_directory(&dir.path().join("gone"), &config).is_empty());
    }

    #[test]
    fn test_module_names() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("pkg/__init__.py"));
        touch(&root.join("pkg/sub/__init__.py"));
        let config = EngineConfig::default();

        assert_eq!(
            module_name(&root.join("pkg/sub/leaf.py"), &config),
            Some(("pkg.sub.leaf".to_string(), false))
        );
        assert_eq!(
            module_name(&root.join("pkg/__init__.py"), &config),
            Some(("pkg".to_string(), true))
        );
        assert_eq!(
            module_name(&root.join("plain.py"), &config),
            Some(("plain".to_string(), false))
        );
    }

    #[test]
    fn test_discoverable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        touch(&root.join("pkg/__init__.py"));
        fs::create_dir_all(root.join("nopkg")).unwrap();
        let config = EngineConfig::default().with_case_insensitive_paths(false);
        let roots = vec![root.clone()];

        assert!(is_discoverable(&root.join("a.py"), &roots, &config));
        assert!(is_discoverable(&root.join("pkg/b.py"), &roots, &config));
        assert!(!is_discoverable(&root.join("nopkg/c.py"), &roots, &config));
        assert!(is_within(&root.join("pkg/b.py"), &root, &config));
        assert!(!is_within(&root, &root.join("pkg"), &config));
    }
}
