//! Text manipulation utilities for working with source code.

use text_size::{TextRange, TextSize};

/// Check if a character is considered part of a word (identifier).
///
/// Uses Unicode Standard Annex #31 rules for identifier characters, which
/// is what the language itself uses for names.
#[inline]
pub fn is_word_character(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

/// Text of the line containing `offset`, up to `offset`.
pub fn line_prefix(text: &str, offset: TextSize) -> &str {
    let end = clamp_to_boundary(text, usize::from(offset));
    let start = text[..end].rfind('\n').map(|i| i + 1).unwrap_or(0);
    &text[start..end]
}

/// Range of the identifier that ends exactly at `offset` (possibly empty).
///
/// This is the part of the text a completion replaces.
pub fn word_before(text: &str, offset: TextSize) -> TextRange {
    let end = clamp_to_boundary(text, usize::from(offset));
    let start = text[..end]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_character(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(end);
    TextRange::new(TextSize::new(start as u32), TextSize::new(end as u32))
}

/// Extend `range` to a complete name or attribute-access expression.
///
/// Walks backward across identifier characters, `.` and balanced `(...)` /
/// `[...]` groups, and forward across identifier characters. A leading `.`
/// is never part of the result.
///
/// # Example
/// ```
/// use serpent::base::text_utils::expression_range;
/// use text_size::{TextRange, TextSize};
///
/// let text = "value = os.path.join(a).upper";
/// let cursor = TextRange::empty(TextSize::new(25));
/// let range = expression_range(text, cursor);
/// assert_eq!(&text[range], "os.path.join(a).upper");
/// ```
pub fn expression_range(text: &str, range: TextRange) -> TextRange {
    let start = clamp_to_boundary(text, usize::from(range.start()));
    let end = clamp_to_boundary(text, usize::from(range.end())).max(start);

    let mut new_start = start;
    let mut depth = 0usize;
    for (i, c) in text[..start].char_indices().rev() {
        if depth > 0 {
            match c {
                ')' | ']' => depth += 1,
                '(' | '[' => {
                    depth -= 1;
                    if depth == 0 {
                        new_start = i;
                    }
                }
                '\n' => break,
                _ => {}
            }
            continue;
        }
        if is_word_character(c) || c == '.' {
            new_start = i;
        } else if c == ')' || c == ']' {
            depth = 1;
        } else {
            break;
        }
    }

    let new_end = end
        + text[end..]
            .char_indices()
            .take_while(|(_, c)| is_word_character(*c))
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);

    while new_start < new_end && text.as_bytes()[new_start] == b'.' {
        new_start += 1;
    }

    TextRange::new(TextSize::new(new_start as u32), TextSize::new(new_end as u32))
}

/// Largest char boundary at or before `offset`, within `text`.
pub(crate) fn clamp_to_boundary(text: &str, mut offset: usize) -> usize {
    offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
