use std::fmt;

/// Language level of the interpreter being analyzed against.
///
/// Drives parser switches (the 2.x `print` statement) and the set of
/// built-in names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageVersion {
    pub major: u8,
    pub minor: u8,
}

impl LanguageVersion {
    pub const V2_7: LanguageVersion = LanguageVersion::new(2, 7);
    pub const V3_12: LanguageVersion = LanguageVersion::new(3, 12);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// True for the 2.x line.
    pub fn is_legacy(self) -> bool {
        self.major < 3
    }
}

impl Default for LanguageVersion {
    fn default() -> Self {
        Self::V3_12
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering_and_display() {
        assert!(LanguageVersion::V2_7 < LanguageVersion::V3_12);
        assert!(LanguageVersion::V2_7.is_legacy());
        assert!(!LanguageVersion::default().is_legacy());
        assert_eq!(LanguageVersion::new(3, 8).to_string(), "3.8");
    }
}
