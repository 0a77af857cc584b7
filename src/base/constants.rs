//! Domain constants shared by discovery, parsing and the query layer.

/// Source file extension.
pub const PY_EXT: &str = "py";

/// Windowed source file extension.
pub const PYW_EXT: &str = "pyw";

/// Markup resource extension.
pub const XAML_EXT: &str = "xaml";

/// File whose presence turns a directory into a package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Stem of the package marker, dropped when deriving module names.
pub const PACKAGE_MARKER_STEM: &str = "__init__";

/// Attributes every module has implicitly.
///
/// These are always bound in module scope and never suggested as
/// missing imports.
pub const IMPLICIT_MODULE_ATTRIBUTES: &[&str] = &[
    "__name__",
    "__file__",
    "__doc__",
    "__package__",
    "__path__",
    "__builtins__",
    "__dict__",
];

/// Returns true for dunder-style reserved names.
pub fn is_reserved_name(name: &str) -> bool {
    IMPLICIT_MODULE_ATTRIBUTES.contains(&name)
        || (name.len() > 4 && name.starts_with("__") && name.ends_with("__"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_name("__name__"));
        assert!(is_reserved_name("__version__"));
        assert!(!is_reserved_name("__"));
        assert!(!is_reserved_name("_private"));
        assert!(!is_reserved_name("path"));
    }
}
