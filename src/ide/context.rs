//! Lexical context of a completion point, decided from the text alone.

use text_size::{TextRange, TextSize};

use crate::base::text_utils::{expression_range, line_prefix, word_before};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexicalContext {
    Comment,
    /// Inside a single-line string literal; holds the text typed after the
    /// opening quote.
    String(String),
    /// A module name after `import` or `from`. `package` is the part before
    /// the last dot, leading dots of a relative import included.
    ModuleName { package: Option<String> },
    /// A name after `from module import`.
    ImportedName { module: String },
    /// Only whitespace before the cursor on its line.
    EmptyLine,
    /// After `target.`.
    Member { target: String },
    Name,
}

enum LineScan {
    Code,
    Comment,
    /// Unterminated string starting at this byte offset.
    String(usize),
}

pub fn lexical_context(text: &str, offset: TextSize) -> LexicalContext {
    let prefix = line_prefix(text, offset);
    match scan_line(prefix) {
        LineScan::Comment => return LexicalContext::Comment,
        LineScan::String(start) => return LexicalContext::String(prefix[start..].to_string()),
        LineScan::Code => {}
    }

    let trimmed = prefix.trim_start();
    if trimmed.is_empty() {
        return LexicalContext::EmptyLine;
    }
    if let Some(context) = import_context(trimmed) {
        return context;
    }

    let word = word_before(text, offset);
    let before = &text[..usize::from(word.start())];
    if before.ends_with('.') {
        let dot = TextSize::new((before.len() - 1) as u32);
        let target = &text[expression_range(text, TextRange::empty(dot))];
        if target.starts_with(|c: char| c.is_alphabetic() || c == '_') {
            return LexicalContext::Member {
                target: target.to_string(),
            };
        }
    }
    LexicalContext::Name
}

fn scan_line(line: &str) -> LineScan {
    let mut open: Option<(char, usize)> = None;
    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        match open {
            Some((quote, _)) => {
                if c == '\\' {
                    chars.next();
                } else if c == quote {
                    open = None;
                }
            }
            None => match c {
                '#' => return LineScan::Comment,
                '\'' | '"' => open = Some((c, i + 1)),
                _ => {}
            },
        }
    }
    match open {
        Some((_, start)) => LineScan::String(start),
        None => LineScan::Code,
    }
}

fn import_context(line: &str) -> Option<LexicalContext> {
    if let Some(rest) = strip_keyword(line, "import") {
        let current = rest.rsplit(',').next().unwrap_or(rest).trim_start();
        if current.contains(char::is_whitespace) {
            // `import a as b`
            return None;
        }
        return Some(module_name_context(current));
    }
    let rest = strip_keyword(line, "from")?;
    match rest.split_once(" import") {
        Some((module, _)) => Some(LexicalContext::ImportedName {
            module: module.trim().to_string(),
        }),
        None if rest.contains(char::is_whitespace) => None,
        None => Some(module_name_context(rest)),
    }
}

fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

fn module_name_context(typed: &str) -> LexicalContext {
    let dots = typed.chars().take_while(|c| *c == '.').count();
    let package = match typed[dots..].rsplit_once('.') {
        Some((package, _)) => Some(format!("{}{}", &typed[..dots], package)),
        None if dots > 0 => Some(typed[..dots].to_string()),
        None => None,
    };
    LexicalContext::ModuleName { package }
}
