//! Signature help for the call around the cursor.

use text_size::{TextRange, TextSize};

use super::analysis::Located;
use crate::base::text_utils::{clamp_to_boundary, expression_range};
use crate::hir::{Evaluator, Signature};
use crate::project::{ModuleTable, ProjectEntry, TextSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureHelp {
    /// Last component of the callee, used in labels.
    pub name: String,
    /// Every overload of every value the callee evaluates to.
    pub signatures: Vec<Signature>,
    pub active_signature: usize,
    /// `None` when no overload accepts the argument being typed.
    pub active_parameter: Option<usize>,
    /// Zero-based index of the argument being typed.
    pub argument: usize,
}

impl SignatureHelp {
    pub fn labels(&self) -> Vec<String> {
        self.signatures.iter().map(|s| s.label(&self.name)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CallSite {
    pub callee: String,
    pub argument: usize,
    /// Set while typing `name=value`.
    pub keyword: Option<String>,
}

pub(crate) fn signatures(
    table: &ModuleTable,
    entry: &ProjectEntry,
    snapshot: &TextSnapshot,
    range: TextRange,
) -> Option<SignatureHelp> {
    let offset = snapshot.clamp(range).end();
    let call = enclosing_call(snapshot.text(), offset)?;
    let located = Located::find(entry, snapshot, offset)?;

    let eval = Evaluator::new(&located.analysis, table);
    let mut overloads: Vec<Signature> = Vec::new();
    for value in located.evaluate(table, &call.callee) {
        for signature in eval.signatures(&value) {
            if !overloads.contains(&signature) {
                overloads.push(signature);
            }
        }
    }
    if overloads.is_empty() {
        return None;
    }

    let (active_signature, active_parameter) = select_overload(&overloads, &call);
    let name = call
        .callee
        .rsplit('.')
        .next()
        .unwrap_or(&call.callee)
        .to_string();
    Some(SignatureHelp {
        name,
        signatures: overloads,
        active_signature,
        active_parameter,
        argument: call.argument,
    })
}

fn select_overload(overloads: &[Signature], call: &CallSite) -> (usize, Option<usize>) {
    if let Some(keyword) = &call.keyword {
        if let Some(found) = overloads
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.position_of(keyword).map(|p| (i, Some(p))))
        {
            return found;
        }
    }
    if let Some(found) = overloads
        .iter()
        .enumerate()
        .find(|(_, s)| s.covers(call.argument))
        .map(|(i, s)| (i, s.parameter_for(call.argument)))
    {
        return found;
    }
    // Nothing accepts that many arguments; show the longest overload.
    let longest = overloads
        .iter()
        .enumerate()
        .max_by_key(|(i, s)| (s.params.len(), std::cmp::Reverse(*i)))
        .map_or(0, |(i, _)| i);
    (longest, None)
}

/// Innermost unclosed call before `offset`.
pub(crate) fn enclosing_call(text: &str, offset: TextSize) -> Option<CallSite> {
    let text = &text[..clamp_to_boundary(text, usize::from(offset))];
    // (bracket, byte offset, top-level commas seen, last comma offset)
    let mut stack: Vec<(char, usize, usize, usize)> = Vec::new();
    let mut quote: Option<char> = None;
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q || c == '\n' {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '#' => {
                // Skip to end of line
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | '[' | '{' => stack.push((c, i, 0, i)),
            ')' | ']' | '}' => {
                stack.pop();
            }
            ',' => {
                if let Some(top) = stack.last_mut() {
                    top.2 += 1;
                    top.3 = i;
                }
            }
            _ => {}
        }
    }

    let (_, open, argument, last_comma) = stack
        .iter()
        .rev()
        .find(|(bracket, open, ..)| *bracket == '(' && !callee_at(text, *open).is_empty())
        .copied()?;
    let current = &text[last_comma + 1..];
    Some(CallSite {
        callee: callee_at(text, open).to_string(),
        argument,
        keyword: keyword_of(current),
    })
}

fn callee_at(text: &str, paren: usize) -> &str {
    let range = expression_range(text, TextRange::empty(TextSize::new(paren as u32)));
    &text[range]
}

/// `name` when the argument text so far is `name=...`.
fn keyword_of(argument: &str) -> Option<String> {
    let (name, rest) = argument.split_once('=')?;
    if rest.starts_with('=') {
        return None;
    }
    let name = name.trim();
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_alphabetic() || first == '_') || !chars.all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ide::test_support::Fixture;
    use rstest::rstest;

    fn call(text: &str) -> Option<CallSite> {
        enclosing_call(text, TextSize::of(text))
    }

    #[rstest]
    #[case("f(", "f", 0, None)]
    #[case("f(a, ", "f", 1, None)]
    #[case("obj.method(a, [1, 2], ", "obj.method", 2, None)]
    #[case("f(g(1), ", "f", 1, None)]
    #[case("f(g(1, ", "g", 1, None)]
    #[case("f(a, 'x, y', ", "f", 2, None)]
    #[case("f(a, key=", "f", 1, Some("key"))]
    #[case("f(a == ", "f", 0, None)]
    #[case("f(\n  a,  # one, two\n  ", "f", 1, None)]
    fn test_enclosing_call(
        #[case] text: &str,
        #[case] callee: &str,
        #[case] argument: usize,
        #[case] keyword: Option<&str>,
    ) {
        assert_eq!(
            call(text),
            Some(CallSite {
                callee: callee.to_string(),
                argument,
                keyword: keyword.map(str::to_string),
            })
        );
    }

    #[rstest]
    #[case("f(a)")]
    #[case("x = (1, ")]
    #[case("s = 'f(")]
    fn test_no_enclosing_call(#[case] text: &str) {
        assert_eq!(call(text), None);
    }

    #[test]
    fn test_offset_inside_a_character() {
        assert_eq!(
            enclosing_call("f(é", TextSize::new(3)).map(|c| c.callee),
            Some("f".to_string())
        );
    }

    #[test]
    fn test_overload_selection() {
        let overloads = vec![
            Signature::from_specs(&["a"]),
            Signature::from_specs(&["a", "b", "c"]),
        ];
        let at = |argument, keyword: Option<&str>| {
            select_overload(
                &overloads,
                &CallSite {
                    callee: "f".into(),
                    argument,
                    keyword: keyword.map(str::to_string),
                },
            )
        };
        assert_eq!(at(0, None), (0, Some(0)));
        assert_eq!(at(2, None), (1, Some(2)));
        assert_eq!(at(0, Some("c")), (1, Some(2)));
        assert_eq!(at(5, None), (1, None));
    }

    #[test]
    fn test_signature_help_for_user_function() {
        let mut fixture = Fixture::new();
        let source = "def area(width, height=1):\n    return width * height\n";
        let entry = fixture.module("m", source);
        let text = format!("{}area(3, ", source);
        let snapshot = fixture.snapshot(&entry, &text);
        let help = signatures(
            fixture.table(),
            &entry,
            &snapshot,
            TextRange::empty(TextSize::of(text.as_str())),
        )
        .unwrap();
        assert_eq!(help.labels(), vec!["area(width, height=1)"]);
        assert_eq!(help.active_parameter, Some(1));
        assert_eq!(help.argument, 1);
    }

    #[test]
    fn test_unknown_callee_has_no_help() {
        let mut fixture = Fixture::new();
        let entry = fixture.module("m", "");
        let snapshot = fixture.snapshot(&entry, "nothing(");
        assert!(signatures(fixture.table(), &entry, &snapshot, TextRange::empty(8.into())).is_none());
    }
}
