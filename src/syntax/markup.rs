//! Markup resource scanning.
//!
//! Markup files (`*.xaml`) are not parsed as source. The only facts taken
//! from them are the names given to elements through `Name="…"` or
//! `x:Name="…"` attributes.

use crate::base::LineIndex;
use crate::syntax::parser::ParseError;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

/// An element name declared in a markup file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedElement {
    pub name: SmolStr,
    pub range: TextRange,
}

/// Result of scanning a markup file.
#[derive(Debug, Clone, Default)]
pub struct MarkupFile {
    pub elements: Vec<NamedElement>,
    pub errors: Vec<ParseError>,
}

impl MarkupFile {
    /// Distinct element names in document order.
    pub fn names(&self) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = Vec::new();
        for element in &self.elements {
            if !names.contains(&element.name) {
                names.push(element.name.clone());
            }
        }
        names
    }
}

/// Scan markup text for named elements.
pub fn scan_markup(text: &str) -> MarkupFile {
    let lines = LineIndex::new(text);
    let bytes = text.as_bytes();
    let mut file = MarkupFile::default();
    let mut search = 0;

    while let Some(found) = text[search..].find("Name") {
        let start = search + found;
        search = start + "Name".len();
        if !is_name_attribute(bytes, start) {
            continue;
        }

        let mut i = search;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let Some(&quote) = bytes.get(i).filter(|b| **b == b'"' || **b == b'\'') else {
            continue;
        };
        let value_start = i + 1;
        let close = bytes[value_start..]
            .iter()
            .position(|b| *b == quote || *b == b'\n' || *b == b'>')
            .map(|p| value_start + p);

        match close {
            Some(end) if bytes[end] == quote => {
                let value = text[value_start..end].trim();
                if !value.is_empty() {
                    file.elements.push(NamedElement {
                        name: SmolStr::new(value),
                        range: range(value_start, end),
                    });
                }
                search = end + 1;
            }
            other => {
                let end = other.unwrap_or(bytes.len());
                file.errors.push(ParseError::syntax_error(
                    "unterminated attribute value",
                    range(start, end),
                    &lines,
                ));
                search = end;
            }
        }
    }

    file
}

/// `Name` starts an attribute when preceded by whitespace or a namespace
/// prefix such as `x:`.
fn is_name_attribute(bytes: &[u8], start: usize) -> bool {
    let after = bytes.get(start + "Name".len()).copied();
    if after.is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b':') {
        return false;
    }
    match start.checked_sub(1).map(|i| bytes[i]) {
        Some(b) if b.is_ascii_whitespace() => true,
        Some(b':') => {
            let prefix_end = start - 1;
            let prefix_start = bytes[..prefix_end]
                .iter()
                .rposition(|b| !b.is_ascii_alphanumeric())
                .map(|p| p + 1)
                .unwrap_or(0);
            prefix_start < prefix_end
                && prefix_start > 0
                && bytes[prefix_start - 1].is_ascii_whitespace()
        }
        _ => false,
    }
}

fn range(start: usize, end: usize) -> TextRange {
    TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_named_elements() {
        let text = r#"<Window x:Class="App.Main"
        xmlns:x="http://schemas.microsoft.com/winfx/2006/xaml">
    <Button x:Name="okButton" Content="OK"/>
    <TextBox Name='input' />
    <Label DisplayName="ignored" />
</Window>"#;
        let file = scan_markup(text);
        assert!(file.errors.is_empty());
        assert_eq!(file.names(), vec!["okButton", "input"]);
        assert_eq!(&text[file.elements[0].range], "okButton");
    }

    #[test]
    fn test_unterminated_value_is_reported() {
        let file = scan_markup("<Button x:Name=\"broken />\n<Label Name=\"ok\"/>");
        assert_eq!(file.errors.len(), 1);
        assert_eq!(file.errors[0].line(), 0);
        assert_eq!(file.names(), vec!["ok"]);
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let file = scan_markup("<A Name=\"a\"/><B Name=\"a\"/>");
        assert_eq!(file.elements.len(), 2);
        assert_eq!(file.names(), vec!["a"]);
    }
}
