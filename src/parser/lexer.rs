//! Logos-based lexer
//!
//! Fast tokenization using the logos crate. [`Lexer`] yields physical
//! tokens including trivia; [`tokenize`] runs the layout pass that turns
//! them into logical lines with `NEWLINE`, `INDENT` and `DEDENT`.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use text_size::{TextRange, TextSize};

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, TextSize::of(self.text))
    }
}

/// Lexer wrapping the logos-generated tokenizer
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = TextSize::new(self.offset);
        self.offset += text.len() as u32;

        let kind = match logos_token {
            Ok(LogosToken::Ident) => SyntaxKind::from_keyword(text).unwrap_or(SyntaxKind::IDENT),
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR,
        };

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into physical tokens, trivia included
pub fn raw_tokens(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Returns false when a string token runs into the end of its line (or,
/// for triple-quoted strings, the end of the text) without closing.
pub fn is_terminated_string(text: &str) -> bool {
    let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    let bytes = body.as_bytes();
    let Some(&quote) = bytes.first() else {
        return false;
    };
    let triple = [quote; 3];
    if bytes.starts_with(&triple) {
        bytes.len() >= 6 && bytes.ends_with(&triple) && !is_escaped(bytes, bytes.len() - 3)
    } else {
        bytes.len() >= 2 && bytes[bytes.len() - 1] == quote && !is_escaped(bytes, bytes.len() - 1)
    }
}

fn is_escaped(bytes: &[u8], index: usize) -> bool {
    bytes[..index]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count()
        % 2
        == 1
}

/// Scans the body of a string after its opening quote.
fn lex_string(lex: &mut logos::Lexer<'_, LogosToken>) {
    let quote = lex.slice().as_bytes()[lex.slice().len() - 1];
    let rest = lex.remainder().as_bytes();

    if rest.len() >= 2 && rest[0] == quote && rest[1] == quote {
        let mut i = 2;
        while i < rest.len() {
            if rest[i] == b'\\' {
                i += 2;
            } else if rest[i..].starts_with(&[quote; 3]) {
                lex.bump(i + 3);
                return;
            } else {
                i += 1;
            }
        }
        lex.bump(rest.len());
        return;
    }

    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'\\' => i += 2,
            b'\n' | b'\r' => {
                lex.bump(i);
                return;
            }
            c if c == quote => {
                lex.bump(i + 1);
                return;
            }
            _ => i += 1,
        }
    }
    lex.bump(rest.len());
}

/// Logos token enum - maps to SyntaxKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\x0C]+")]
    Whitespace,

    #[regex(r"#[^\r\n]*")]
    Comment,

    #[regex(r"\\\r?\n")]
    LineContinuation,

    #[regex(r"\r\n|\n|\r")]
    LineBreak,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Ident,

    #[regex(r"[0-9][0-9_]*[lL]?")]
    #[regex(r"0[xX][0-9a-fA-F_]+[lL]?")]
    #[regex(r"0[oO][0-7_]+")]
    #[regex(r"0[bB][01_]+")]
    Integer,

    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    Float,

    #[regex(r"([0-9][0-9_]*(\.[0-9_]*)?|\.[0-9][0-9_]*)([eE][+-]?[0-9_]+)?[jJ]")]
    Imaginary,

    #[regex(r#"[rRbBuUfF]{0,2}['"]"#, lex_string)]
    String,

    // =========================================================================
    // PUNCTUATION (longest match wins)
    // =========================================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,
    #[token("@")]
    At,
    #[token("=")]
    Eq,
    #[token(":=")]
    ColonEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("//")]
    SlashSlash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    #[token("<>")]
    BangEq,
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("//=")]
    #[token("%=")]
    #[token("**=")]
    #[token("@=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    AugAssign,
    #[token("`")]
    Backtick,
}

impl From<LogosToken> for SyntaxKind {
    fn from(token: LogosToken) -> Self {
        use LogosToken::*;
        match token {
            Whitespace => SyntaxKind::WHITESPACE,
            Comment => SyntaxKind::COMMENT,
            LineContinuation => SyntaxKind::LINE_CONTINUATION,
            LineBreak => SyntaxKind::LINE_BREAK,
            Ident => SyntaxKind::IDENT,
            Integer => SyntaxKind::INTEGER,
            Float => SyntaxKind::FLOAT,
            Imaginary => SyntaxKind::IMAGINARY,
            String => SyntaxKind::STRING,
            LParen => SyntaxKind::L_PAREN,
            RParen => SyntaxKind::R_PAREN,
            LBracket => SyntaxKind::L_BRACKET,
            RBracket => SyntaxKind::R_BRACKET,
            LBrace => SyntaxKind::L_BRACE,
            RBrace => SyntaxKind::R_BRACE,
            Colon => SyntaxKind::COLON,
            Semicolon => SyntaxKind::SEMICOLON,
            Comma => SyntaxKind::COMMA,
            Dot => SyntaxKind::DOT,
            Ellipsis => SyntaxKind::ELLIPSIS,
            Arrow => SyntaxKind::ARROW,
            At => SyntaxKind::AT,
            Eq => SyntaxKind::EQ,
            ColonEq => SyntaxKind::COLON_EQ,
            Plus => SyntaxKind::PLUS,
            Minus => SyntaxKind::MINUS,
            Star => SyntaxKind::STAR,
            StarStar => SyntaxKind::STAR_STAR,
            Slash => SyntaxKind::SLASH,
            SlashSlash => SyntaxKind::SLASH_SLASH,
            Percent => SyntaxKind::PERCENT,
            Amp => SyntaxKind::AMP,
            Pipe => SyntaxKind::PIPE,
            Caret => SyntaxKind::CARET,
            Tilde => SyntaxKind::TILDE,
            LtLt => SyntaxKind::LT_LT,
            GtGt => SyntaxKind::GT_GT,
            Lt => SyntaxKind::LT,
            Gt => SyntaxKind::GT,
            LtEq => SyntaxKind::LT_EQ,
            GtEq => SyntaxKind::GT_EQ,
            EqEq => SyntaxKind::EQ_EQ,
            BangEq => SyntaxKind::BANG_EQ,
            AugAssign => SyntaxKind::AUG_ASSIGN,
            Backtick => SyntaxKind::BACKTICK,
        }
    }
}

// ============================================================================
// LAYOUT
// ============================================================================

/// A problem found while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub range: TextRange,
}

/// Logical-line token stream handed to the parser.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    /// Significant tokens plus synthetic layout tokens, ending with `EOF`.
    pub tokens: Vec<Token<'a>>,
    pub errors: Vec<LexError>,
    /// Indentation whose meaning depends on the tab width.
    pub inconsistent_indents: Vec<TextRange>,
}

/// Indentation width measured with a tab size of 8 and of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Indent {
    col: u32,
    alt_col: u32,
}

impl Indent {
    fn measure(whitespace: &str) -> Self {
        let mut col = 0;
        let mut alt_col = 0;
        for c in whitespace.chars() {
            match c {
                '\t' => {
                    col = (col / 8 + 1) * 8;
                    alt_col += 1;
                }
                '\x0C' => {
                    col = 0;
                    alt_col = 0;
                }
                _ => {
                    col += 1;
                    alt_col += 1;
                }
            }
        }
        Self { col, alt_col }
    }
}

/// Run the lexer and the layout pass over `input`.
pub fn tokenize(input: &str) -> TokenStream<'_> {
    let raw = raw_tokens(input);
    let mut tokens = Vec::with_capacity(raw.len());
    let mut errors = Vec::new();
    let mut inconsistent_indents = Vec::new();

    let mut indents = vec![Indent { col: 0, alt_col: 0 }];
    let mut depth = 0usize;
    let mut at_line_start = true;
    let mut i = 0;

    while i < raw.len() {
        if at_line_start && depth == 0 {
            let (whitespace, next) = match raw[i].kind {
                SyntaxKind::WHITESPACE => (raw[i].text, i + 1),
                _ => ("", i),
            };
            match raw.get(next).map(|t| t.kind) {
                None => break,
                Some(SyntaxKind::COMMENT) | Some(SyntaxKind::LINE_BREAK) => {
                    // Blank or comment-only lines do not affect indentation.
                    i = next;
                    if raw[i].kind == SyntaxKind::COMMENT {
                        i += 1;
                    }
                    if raw.get(i).map(|t| t.kind) == Some(SyntaxKind::LINE_BREAK) {
                        i += 1;
                    }
                    continue;
                }
                Some(_) => {}
            }

            let offset = raw[next].offset;
            let indent_range = TextRange::new(offset - TextSize::of(whitespace), offset);
            let indent = Indent::measure(whitespace);
            let top = *indents.last().unwrap_or(&Indent { col: 0, alt_col: 0 });

            if indent.col > top.col {
                if indent.alt_col <= top.alt_col {
                    inconsistent_indents.push(indent_range);
                }
                indents.push(indent);
                tokens.push(synthetic(SyntaxKind::INDENT, offset));
            } else if indent.col == top.col {
                if indent.alt_col != top.alt_col {
                    inconsistent_indents.push(indent_range);
                }
            } else {
                while indents.len() > 1 && indents[indents.len() - 1].col > indent.col {
                    indents.pop();
                    tokens.push(synthetic(SyntaxKind::DEDENT, offset));
                }
                let top = indents[indents.len() - 1];
                if top.col != indent.col {
                    errors.push(LexError {
                        message: "unindent does not match any outer indentation level".into(),
                        range: indent_range,
                    });
                } else if top.alt_col != indent.alt_col {
                    inconsistent_indents.push(indent_range);
                }
            }

            at_line_start = false;
            i = next;
            continue;
        }

        let token = &raw[i];
        i += 1;
        match token.kind {
            SyntaxKind::WHITESPACE | SyntaxKind::COMMENT | SyntaxKind::LINE_CONTINUATION => {}
            SyntaxKind::LINE_BREAK => {
                if depth == 0 {
                    tokens.push(Token {
                        kind: SyntaxKind::NEWLINE,
                        text: token.text,
                        offset: token.offset,
                    });
                    at_line_start = true;
                }
            }
            SyntaxKind::ERROR => errors.push(LexError {
                message: format!("invalid character '{}'", token.text),
                range: token.range(),
            }),
            kind => {
                if kind.is_open_bracket() {
                    depth += 1;
                } else if kind.is_close_bracket() {
                    depth = depth.saturating_sub(1);
                } else if kind == SyntaxKind::STRING && !is_terminated_string(token.text) {
                    errors.push(LexError {
                        message: "unterminated string literal".into(),
                        range: token.range(),
                    });
                }
                tokens.push(token.clone());
            }
        }
    }

    let end = TextSize::of(input);
    if !at_line_start || depth > 0 {
        tokens.push(synthetic(SyntaxKind::NEWLINE, end));
    }
    while indents.len() > 1 {
        indents.pop();
        tokens.push(synthetic(SyntaxKind::DEDENT, end));
    }
    tokens.push(synthetic(SyntaxKind::EOF, end));

    TokenStream {
        tokens,
        errors,
        inconsistent_indents,
    }
}

fn synthetic(kind: SyntaxKind, offset: TextSize) -> Token<'static> {
    Token {
        kind,
        text: "",
        offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<SyntaxKind> {
        tokenize(input).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_assignment() {
        let tokens: Vec<_> = Lexer::new("x = 1").collect();
        assert_eq!(tokens.len(), 5); // x, ws, =, ws, 1
        assert_eq!(tokens[0].kind, SyntaxKind::IDENT);
        assert_eq!(tokens[2].kind, SyntaxKind::EQ);
        assert_eq!(tokens[4].kind, SyntaxKind::INTEGER);
    }

    #[test]
    fn test_lex_keywords_and_idents() {
        let tokens = raw_tokens("def print(self): pass");
        assert_eq!(tokens[0].kind, SyntaxKind::DEF_KW);
        assert_eq!(tokens[2].kind, SyntaxKind::IDENT);
        assert_eq!(tokens[4].kind, SyntaxKind::IDENT);
        assert_eq!(tokens.last().map(|t| t.kind), Some(SyntaxKind::PASS_KW));
    }

    #[test]
    fn test_lex_strings() {
        let tokens = raw_tokens(r#"a = r'x\'y' + b"z" + '''multi
line'''"#);
        let strings: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == SyntaxKind::STRING)
            .map(|t| t.text)
            .collect();
        assert_eq!(strings, vec![r"r'x\'y'", r#"b"z""#, "'''multi\nline'''"]);
        assert!(strings.iter().all(|s| is_terminated_string(s)));
    }

    #[test]
    fn test_unterminated_string_stops_at_line_end() {
        let tokens = raw_tokens("s = 'abc\nx = 1");
        let string = tokens.iter().find(|t| t.kind == SyntaxKind::STRING).unwrap();
        assert_eq!(string.text, "'abc");
        assert!(!is_terminated_string(string.text));
        assert_eq!(tokenize("s = 'abc\nx = 1").errors.len(), 1);
    }

    #[test]
    fn test_lex_numbers() {
        let tokens = raw_tokens("1 0x1F 2.5 .5 1e3 3j 10L");
        let kinds: Vec<_> = tokens
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::INTEGER,
                SyntaxKind::INTEGER,
                SyntaxKind::FLOAT,
                SyntaxKind::FLOAT,
                SyntaxKind::FLOAT,
                SyntaxKind::IMAGINARY,
                SyntaxKind::INTEGER,
            ]
        );
    }

    #[test]
    fn test_layout_indent_dedent() {
        let kinds = kinds("if x:\n    y = 1\nz = 2\n");
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::IF_KW,
                SyntaxKind::IDENT,
                SyntaxKind::COLON,
                SyntaxKind::NEWLINE,
                SyntaxKind::INDENT,
                SyntaxKind::IDENT,
                SyntaxKind::EQ,
                SyntaxKind::INTEGER,
                SyntaxKind::NEWLINE,
                SyntaxKind::DEDENT,
                SyntaxKind::IDENT,
                SyntaxKind::EQ,
                SyntaxKind::INTEGER,
                SyntaxKind::NEWLINE,
                SyntaxKind::EOF,
            ]
        );
    }

    #[test]
    fn test_layout_ignores_newlines_in_brackets_and_blank_lines() {
        let kinds = kinds("f(1,\n  2)\n\n   # note\ng()");
        let newlines = kinds.iter().filter(|k| **k == SyntaxKind::NEWLINE).count();
        assert_eq!(newlines, 2);
        assert!(!kinds.contains(&SyntaxKind::INDENT));
    }

    #[test]
    fn test_layout_closes_open_blocks_at_eof() {
        let kinds = kinds("def f():\n    return 1");
        let tail: Vec<_> = kinds.iter().rev().take(3).copied().collect();
        assert_eq!(
            tail,
            vec![SyntaxKind::EOF, SyntaxKind::DEDENT, SyntaxKind::NEWLINE]
        );
    }

    #[test]
    fn test_layout_reports_inconsistent_tabs() {
        let stream = tokenize("if x:\n\ty = 1\n        z = 2\n");
        assert_eq!(stream.inconsistent_indents.len(), 1);
    }

    #[test]
    fn test_layout_reports_bad_dedent() {
        let stream = tokenize("if x:\n    y = 1\n  z = 2\n");
        assert_eq!(stream.errors.len(), 1);
    }

    #[test]
    fn test_invalid_character_is_reported() {
        let stream = tokenize("x = $\n");
        assert_eq!(stream.errors.len(), 1);
        assert!(stream.errors[0].message.contains("invalid character"));
    }
}
