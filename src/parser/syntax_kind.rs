//! Token kinds produced by the lexer.
//!
//! Physical tokens come straight from the logos scanner. The layout pass in
//! [`super::lexer::tokenize`] adds the synthetic `NEWLINE`, `INDENT`,
//! `DEDENT` and `EOF` tokens the parser works with.

/// All token kinds of the source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    WHITESPACE = 0,
    COMMENT,
    LINE_CONTINUATION,
    LINE_BREAK, // physical newline

    // =========================================================================
    // LITERALS
    // =========================================================================
    IDENT,
    INTEGER,
    FLOAT,
    IMAGINARY,
    STRING,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    L_PAREN,     // (
    R_PAREN,     // )
    L_BRACKET,   // [
    R_BRACKET,   // ]
    L_BRACE,     // {
    R_BRACE,     // }
    COLON,       // :
    SEMICOLON,   // ;
    COMMA,       // ,
    DOT,         // .
    ELLIPSIS,    // ...
    ARROW,       // ->
    AT,          // @
    EQ,          // =
    COLON_EQ,    // :=
    PLUS,        // +
    MINUS,       // -
    STAR,        // *
    STAR_STAR,   // **
    SLASH,       // /
    SLASH_SLASH, // //
    PERCENT,     // %
    AMP,         // &
    PIPE,        // |
    CARET,       // ^
    TILDE,       // ~
    LT_LT,       // <<
    GT_GT,       // >>
    LT,          // <
    GT,          // >
    LT_EQ,       // <=
    GT_EQ,       // >=
    EQ_EQ,       // ==
    BANG_EQ,     // != (and the legacy <>)
    AUG_ASSIGN,  // += -= *= /= //= %= **= @= &= |= ^= <<= >>=
    BACKTICK,    // `

    // =========================================================================
    // KEYWORDS
    // =========================================================================
    FALSE_KW,
    NONE_KW,
    TRUE_KW,
    AND_KW,
    AS_KW,
    ASSERT_KW,
    ASYNC_KW,
    AWAIT_KW,
    BREAK_KW,
    CLASS_KW,
    CONTINUE_KW,
    DEF_KW,
    DEL_KW,
    ELIF_KW,
    ELSE_KW,
    EXCEPT_KW,
    FINALLY_KW,
    FOR_KW,
    FROM_KW,
    GLOBAL_KW,
    IF_KW,
    IMPORT_KW,
    IN_KW,
    IS_KW,
    LAMBDA_KW,
    NONLOCAL_KW,
    NOT_KW,
    OR_KW,
    PASS_KW,
    RAISE_KW,
    RETURN_KW,
    TRY_KW,
    WHILE_KW,
    WITH_KW,
    YIELD_KW,

    // =========================================================================
    // LAYOUT (synthetic)
    // =========================================================================
    NEWLINE,
    INDENT,
    DEDENT,
    EOF,

    ERROR,
}

impl SyntaxKind {
    /// Check if this is a trivia token
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::WHITESPACE | Self::COMMENT | Self::LINE_CONTINUATION
        )
    }

    /// Check if this is a keyword
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (Self::FALSE_KW as u16) && (self as u16) <= (Self::YIELD_KW as u16)
    }

    /// Check if this is a punctuation token
    pub fn is_punct(self) -> bool {
        (self as u16) >= (Self::L_PAREN as u16) && (self as u16) <= (Self::BACKTICK as u16)
    }

    /// Check if this is a literal
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            Self::INTEGER | Self::FLOAT | Self::IMAGINARY | Self::STRING
        )
    }

    /// Opening bracket of any flavour
    pub fn is_open_bracket(self) -> bool {
        matches!(self, Self::L_PAREN | Self::L_BRACKET | Self::L_BRACE)
    }

    /// Closing bracket of any flavour
    pub fn is_close_bracket(self) -> bool {
        matches!(self, Self::R_PAREN | Self::R_BRACKET | Self::R_BRACE)
    }

    /// Keyword kind for an identifier, if it is reserved.
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        let kind = match text {
            "False" => Self::FALSE_KW,
            "None" => Self::NONE_KW,
            "True" => Self::TRUE_KW,
            "and" => Self::AND_KW,
            "as" => Self::AS_KW,
            "assert" => Self::ASSERT_KW,
            "async" => Self::ASYNC_KW,
            "await" => Self::AWAIT_KW,
            "break" => Self::BREAK_KW,
            "class" => Self::CLASS_KW,
            "continue" => Self::CONTINUE_KW,
            "def" => Self::DEF_KW,
            "del" => Self::DEL_KW,
            "elif" => Self::ELIF_KW,
            "else" => Self::ELSE_KW,
            "except" => Self::EXCEPT_KW,
            "finally" => Self::FINALLY_KW,
            "for" => Self::FOR_KW,
            "from" => Self::FROM_KW,
            "global" => Self::GLOBAL_KW,
            "if" => Self::IF_KW,
            "import" => Self::IMPORT_KW,
            "in" => Self::IN_KW,
            "is" => Self::IS_KW,
            "lambda" => Self::LAMBDA_KW,
            "nonlocal" => Self::NONLOCAL_KW,
            "not" => Self::NOT_KW,
            "or" => Self::OR_KW,
            "pass" => Self::PASS_KW,
            "raise" => Self::RAISE_KW,
            "return" => Self::RETURN_KW,
            "try" => Self::TRY_KW,
            "while" => Self::WHILE_KW,
            "with" => Self::WITH_KW,
            "yield" => Self::YIELD_KW,
            _ => return None,
        };
        Some(kind)
    }
}

/// Statement keywords offered by name completion.
pub const STATEMENT_KEYWORDS: &[&str] = &[
    "assert", "break", "class", "continue", "def", "del", "for", "from", "global", "if",
    "import", "nonlocal", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Expression keywords offered by name completion.
pub const EXPRESSION_KEYWORDS: &[&str] = &[
    "and", "await", "False", "if", "in", "is", "lambda", "None", "not", "or", "True",
];
