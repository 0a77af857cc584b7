//! Recursive descent parser
//!
//! Builds the owned [`Module`] tree from the logical-line token stream.
//! A syntax error abandons the current statement only: the parser records
//! it and resynchronises at the next logical line.

use super::ast::*;
use super::lexer::{Token, tokenize};
use super::syntax_kind::SyntaxKind;
use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

/// Language-level switches for the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Treat `print` at the start of a statement as the 2.x print statement.
    pub print_statement: bool,
}

/// Parse result containing the tree and any errors
#[derive(Debug, Clone, PartialEq)]
pub struct Parse {
    pub module: Module,
    pub errors: Vec<SyntaxError>,
    /// Lines whose indentation mixes tabs and spaces ambiguously.
    pub inconsistent_indents: Vec<TextRange>,
}

impl Parse {
    /// Check if parsing succeeded without errors
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse source code with default options
pub fn parse(input: &str) -> Parse {
    parse_with_options(input, ParseOptions::default())
}

/// Parse source code
pub fn parse_with_options(input: &str, options: ParseOptions) -> Parse {
    let stream = tokenize(input);
    let mut errors: Vec<SyntaxError> = stream
        .errors
        .into_iter()
        .map(|e| SyntaxError::new(e.message, e.range))
        .collect();

    let mut parser = Parser::new(stream.tokens, options);
    let body = parser.parse_statements(SyntaxKind::EOF);
    errors.append(&mut parser.errors);
    errors.sort_by_key(|e| e.range.start());

    Parse {
        module: Module {
            body,
            range: TextRange::up_to(TextSize::of(input)),
        },
        errors,
        inconsistent_indents: stream.inconsistent_indents,
    }
}

/// Parse a standalone expression (or comma-separated expression list).
///
/// Returns `None` if the text is not exactly one well-formed expression.
pub fn parse_expression(input: &str) -> Option<Expr> {
    let stream = tokenize(input);
    if !stream.errors.is_empty() {
        return None;
    }
    let mut parser = Parser::new(stream.tokens, ParseOptions::default());
    let expr = parser.parse_testlist_star_expr().ok()?;
    parser.eat(SyntaxKind::NEWLINE);
    (parser.at(SyntaxKind::EOF) && parser.errors.is_empty()).then_some(expr)
}

/// Deepest nesting of brackets and unary operators the parser follows
/// before giving up on the statement.
const MAX_NESTING: usize = 64;

/// Deepest nesting of indented blocks.
const MAX_BLOCKS: usize = 100;

/// Marker for an abandoned statement; the error is already recorded.
struct Failed;

type PResult<T> = Result<T, Failed>;

/// The parser state
struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    last_end: TextSize,
    errors: Vec<SyntaxError>,
    options: ParseOptions,
    depth: usize,
    blocks: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>, options: ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            last_end: TextSize::new(0),
            errors: Vec::new(),
            options,
            depth: 0,
            blocks: 0,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> &Token<'a> {
        // The stream always ends with EOF and `bump` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> SyntaxKind {
        self.current().kind
    }

    fn text(&self) -> &'a str {
        self.current().text
    }

    fn nth(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::EOF)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.kind() == kind
    }

    fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.kind())
    }

    fn start(&self) -> TextSize {
        self.current().offset
    }

    fn range_from(&self, start: TextSize) -> TextRange {
        TextRange::new(start, self.last_end.max(start))
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> Token<'a> {
        let token = self.current().clone();
        if token.kind != SyntaxKind::EOF {
            self.pos += 1;
            if !token.text.is_empty() && token.kind != SyntaxKind::NEWLINE {
                self.last_end = token.range().end();
            }
        }
        token
    }

    fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SyntaxKind, what: &str) -> PResult<Token<'a>> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn name(&mut self) -> PResult<Name> {
        let token = self.expect(SyntaxKind::IDENT, "a name")?;
        Ok(Name {
            id: SmolStr::new(token.text),
            range: token.range(),
        })
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    fn report(&mut self, message: impl Into<String>) {
        let token = self.current();
        let range = match token.kind {
            SyntaxKind::NEWLINE | SyntaxKind::EOF | SyntaxKind::INDENT | SyntaxKind::DEDENT => {
                TextRange::empty(self.last_end)
            }
            _ => token.range(),
        };
        self.errors.push(SyntaxError::new(message, range));
    }

    fn error(&mut self, message: impl Into<String>) -> Failed {
        let message = message.into();
        let found = match self.kind() {
            SyntaxKind::NEWLINE => "end of line".to_string(),
            SyntaxKind::EOF => "end of file".to_string(),
            SyntaxKind::INDENT => "indent".to_string(),
            SyntaxKind::DEDENT => "dedent".to_string(),
            _ => format!("'{}'", self.text()),
        };
        self.report(format!("{message}, found {found}"));
        Failed
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            self.report("too deeply nested");
            return Err(Failed);
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Skip the rest of the logical line and the indented block after it.
    fn skip_block(&mut self) {
        while !self.at_any(&[SyntaxKind::NEWLINE, SyntaxKind::EOF]) {
            self.bump();
        }
        if !self.eat(SyntaxKind::NEWLINE) || !self.eat(SyntaxKind::INDENT) {
            return;
        }
        let mut open = 1usize;
        while open > 0 && !self.at(SyntaxKind::EOF) {
            match self.bump().kind {
                SyntaxKind::INDENT => open += 1,
                SyntaxKind::DEDENT => open -= 1,
                _ => {}
            }
        }
    }

    /// Skip the rest of the logical line.
    fn recover(&mut self, start_pos: usize) {
        while !self.at_any(&[SyntaxKind::NEWLINE, SyntaxKind::EOF]) {
            self.bump();
        }
        if !self.eat(SyntaxKind::NEWLINE) && self.pos == start_pos && !self.at(SyntaxKind::EOF) {
            self.bump();
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_statements(&mut self, end: SyntaxKind) -> Vec<Stmt> {
        let mut body = Vec::new();
        // Unexpected indents still open; their statements join `body`.
        let mut stray = 0usize;
        loop {
            match self.kind() {
                SyntaxKind::DEDENT if stray > 0 => {
                    stray -= 1;
                    self.bump();
                }
                k if k == end => break,
                SyntaxKind::EOF => break,
                SyntaxKind::NEWLINE | SyntaxKind::DEDENT => {
                    self.bump();
                }
                SyntaxKind::INDENT => {
                    self.report("unexpected indent");
                    self.bump();
                    stray += 1;
                }
                _ => {
                    let start_pos = self.pos;
                    if self.parse_statement(&mut body).is_err() {
                        self.recover(start_pos);
                    }
                }
            }
        }
        body
    }

    fn parse_statement(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        let stmt = match self.kind() {
            SyntaxKind::IF_KW => self.parse_if()?,
            SyntaxKind::WHILE_KW => self.parse_while()?,
            SyntaxKind::FOR_KW => self.parse_for(self.start())?,
            SyntaxKind::TRY_KW => self.parse_try()?,
            SyntaxKind::WITH_KW => self.parse_with(self.start())?,
            SyntaxKind::DEF_KW => self.parse_function(self.start(), Vec::new(), false)?,
            SyntaxKind::CLASS_KW => self.parse_class(self.start(), Vec::new())?,
            SyntaxKind::AT => self.parse_decorated()?,
            SyntaxKind::ASYNC_KW => self.parse_async()?,
            _ => return self.parse_simple_statement(out),
        };
        out.push(stmt);
        Ok(())
    }

    fn parse_simple_statement(&mut self, out: &mut Vec<Stmt>) -> PResult<()> {
        loop {
            let stmt = self.parse_small_statement()?;
            out.push(stmt);
            if !self.eat(SyntaxKind::SEMICOLON) {
                break;
            }
            if self.at_any(&[SyntaxKind::NEWLINE, SyntaxKind::EOF]) {
                break;
            }
        }
        if !self.eat(SyntaxKind::NEWLINE) && !self.at(SyntaxKind::EOF) {
            return Err(self.error("expected end of statement"));
        }
        Ok(())
    }

    fn parse_small_statement(&mut self) -> PResult<Stmt> {
        let start = self.start();
        let kind = match self.kind() {
            SyntaxKind::PASS_KW => {
                self.bump();
                StmtKind::Pass
            }
            SyntaxKind::BREAK_KW => {
                self.bump();
                StmtKind::Break
            }
            SyntaxKind::CONTINUE_KW => {
                self.bump();
                StmtKind::Continue
            }
            SyntaxKind::RETURN_KW => {
                self.bump();
                let value = if self.at_expression_start() {
                    Some(self.parse_testlist_star_expr()?)
                } else {
                    None
                };
                StmtKind::Return(value)
            }
            SyntaxKind::RAISE_KW => {
                self.bump();
                let mut value = None;
                if self.at_expression_start() {
                    value = Some(self.parse_test()?);
                    if self.eat(SyntaxKind::FROM_KW) {
                        self.parse_test()?;
                    }
                    // 2.x form: raise E, V, T
                    while self.eat(SyntaxKind::COMMA) {
                        self.parse_test()?;
                    }
                }
                StmtKind::Raise(value)
            }
            SyntaxKind::GLOBAL_KW | SyntaxKind::NONLOCAL_KW => {
                let global = self.bump().kind == SyntaxKind::GLOBAL_KW;
                let mut names = vec![self.name()?];
                while self.eat(SyntaxKind::COMMA) {
                    names.push(self.name()?);
                }
                if global {
                    StmtKind::Global(names)
                } else {
                    StmtKind::Nonlocal(names)
                }
            }
            SyntaxKind::DEL_KW => {
                self.bump();
                StmtKind::Del(self.parse_exprlist_items()?)
            }
            SyntaxKind::ASSERT_KW => {
                self.bump();
                let test = self.parse_test()?;
                let msg = if self.eat(SyntaxKind::COMMA) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                StmtKind::Assert { test, msg }
            }
            SyntaxKind::IMPORT_KW => self.parse_import()?,
            SyntaxKind::FROM_KW => self.parse_from_import()?,
            SyntaxKind::IDENT if self.at_print_statement() => self.parse_print()?,
            _ => self.parse_expression_statement()?,
        };
        Ok(Stmt {
            kind,
            range: self.range_from(start),
        })
    }

    fn at_print_statement(&self) -> bool {
        self.options.print_statement
            && self.text() == "print"
            && !matches!(
                self.nth(1),
                SyntaxKind::EQ
                    | SyntaxKind::DOT
                    | SyntaxKind::AUG_ASSIGN
                    | SyntaxKind::L_PAREN
                    | SyntaxKind::L_BRACKET
            )
    }

    fn parse_print(&mut self) -> PResult<StmtKind> {
        self.bump();
        let mut values = Vec::new();
        if self.eat(SyntaxKind::GT_GT) {
            values.push(self.parse_test()?);
            if !self.eat(SyntaxKind::COMMA) {
                return Ok(StmtKind::Print(values));
            }
        }
        while self.at_expression_start() {
            values.push(self.parse_test()?);
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        Ok(StmtKind::Print(values))
    }

    fn parse_expression_statement(&mut self) -> PResult<StmtKind> {
        let first = self.parse_testlist_star_expr()?;
        match self.kind() {
            SyntaxKind::EQ => {
                let mut targets = vec![first];
                let mut value;
                loop {
                    self.bump();
                    value = if self.at(SyntaxKind::YIELD_KW) {
                        self.parse_yield()?
                    } else {
                        self.parse_testlist_star_expr()?
                    };
                    if !self.at(SyntaxKind::EQ) {
                        break;
                    }
                    targets.push(value);
                }
                Ok(StmtKind::Assign { targets, value })
            }
            SyntaxKind::AUG_ASSIGN => {
                let token = self.bump();
                let op = BinOp::from_augmented(token.text).unwrap_or(BinOp::Add);
                let value = if self.at(SyntaxKind::YIELD_KW) {
                    self.parse_yield()?
                } else {
                    self.parse_testlist()?
                };
                Ok(StmtKind::AugAssign {
                    target: first,
                    op,
                    value,
                })
            }
            SyntaxKind::COLON => {
                self.bump();
                let annotation = self.parse_test()?;
                let value = if self.eat(SyntaxKind::EQ) {
                    Some(self.parse_testlist_star_expr()?)
                } else {
                    None
                };
                Ok(StmtKind::AnnAssign {
                    target: first,
                    annotation,
                    value,
                })
            }
            _ => Ok(StmtKind::Expr(first)),
        }
    }

    fn parse_import(&mut self) -> PResult<StmtKind> {
        self.bump();
        let mut aliases = vec![self.parse_dotted_alias()?];
        while self.eat(SyntaxKind::COMMA) {
            aliases.push(self.parse_dotted_alias()?);
        }
        Ok(StmtKind::Import(aliases))
    }

    fn parse_dotted_alias(&mut self) -> PResult<Alias> {
        let start = self.start();
        let name = self.parse_dotted_name()?;
        let asname = if self.eat(SyntaxKind::AS_KW) {
            Some(self.name()?)
        } else {
            None
        };
        Ok(Alias {
            name,
            asname,
            range: self.range_from(start),
        })
    }

    fn parse_dotted_name(&mut self) -> PResult<DottedName> {
        let start = self.start();
        let mut parts = vec![self.name()?];
        while self.eat(SyntaxKind::DOT) {
            parts.push(self.name()?);
        }
        Ok(DottedName {
            parts,
            range: self.range_from(start),
        })
    }

    fn parse_from_import(&mut self) -> PResult<StmtKind> {
        self.bump();
        let mut level = 0;
        loop {
            match self.kind() {
                SyntaxKind::DOT => level += 1,
                SyntaxKind::ELLIPSIS => level += 3,
                _ => break,
            }
            self.bump();
        }
        let module = if self.at(SyntaxKind::IDENT) {
            Some(self.parse_dotted_name()?)
        } else if level == 0 {
            return Err(self.error("expected a module name"));
        } else {
            None
        };
        self.expect(SyntaxKind::IMPORT_KW, "'import'")?;

        if self.eat(SyntaxKind::STAR) {
            return Ok(StmtKind::ImportFrom {
                module,
                level,
                names: Vec::new(),
                star: true,
            });
        }

        let parenthesized = self.eat(SyntaxKind::L_PAREN);
        let mut names = Vec::new();
        loop {
            let start = self.start();
            let name = self.name()?;
            let asname = if self.eat(SyntaxKind::AS_KW) {
                Some(self.name()?)
            } else {
                None
            };
            let range = self.range_from(start);
            names.push(Alias {
                name: DottedName {
                    parts: vec![name],
                    range,
                },
                asname,
                range,
            });
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
            if parenthesized && self.at(SyntaxKind::R_PAREN) {
                break;
            }
        }
        if parenthesized {
            self.expect(SyntaxKind::R_PAREN, "')'")?;
        }
        Ok(StmtKind::ImportFrom {
            module,
            level,
            names,
            star: false,
        })
    }

    // =========================================================================
    // Compound statements
    // =========================================================================

    fn parse_suite(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(SyntaxKind::COLON, "':'")?;
        if self.blocks >= MAX_BLOCKS {
            self.report("too many nested blocks");
            self.skip_block();
            return Ok(Vec::new());
        }
        self.blocks += 1;
        let body = self.parse_block();
        self.blocks -= 1;
        body
    }

    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        if self.eat(SyntaxKind::NEWLINE) {
            if !self.at(SyntaxKind::INDENT) {
                self.report("expected an indented block");
                return Ok(Vec::new());
            }
            self.bump();
            let body = self.parse_statements(SyntaxKind::DEDENT);
            self.eat(SyntaxKind::DEDENT);
            Ok(body)
        } else {
            let mut body = Vec::new();
            self.parse_simple_statement(&mut body)?;
            Ok(body)
        }
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.bump();
        let test = self.parse_namedexpr_test()?;
        let body = self.parse_suite()?;
        let orelse = if self.at(SyntaxKind::ELIF_KW) {
            vec![self.parse_if()?]
        } else if self.eat(SyntaxKind::ELSE_KW) {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        Ok(Stmt {
            kind: StmtKind::If { test, body, orelse },
            range: self.range_from(start),
        })
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.bump();
        let test = self.parse_namedexpr_test()?;
        let body = self.parse_suite()?;
        let orelse = if self.eat(SyntaxKind::ELSE_KW) {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        Ok(Stmt {
            kind: StmtKind::While { test, body, orelse },
            range: self.range_from(start),
        })
    }

    fn parse_for(&mut self, start: TextSize) -> PResult<Stmt> {
        self.expect(SyntaxKind::FOR_KW, "'for'")?;
        let target = self.parse_exprlist()?;
        self.expect(SyntaxKind::IN_KW, "'in'")?;
        let iter = self.parse_testlist()?;
        let body = self.parse_suite()?;
        let orelse = if self.eat(SyntaxKind::ELSE_KW) {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        Ok(Stmt {
            kind: StmtKind::For {
                target,
                iter,
                body,
                orelse,
            },
            range: self.range_from(start),
        })
    }

    fn parse_try(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.bump();
        let body = self.parse_suite()?;
        let mut handlers = Vec::new();
        while self.at(SyntaxKind::EXCEPT_KW) {
            let handler_start = self.start();
            self.bump();
            let mut type_ = None;
            let mut name = None;
            if !self.at(SyntaxKind::COLON) {
                type_ = Some(self.parse_test()?);
                if self.eat(SyntaxKind::AS_KW) || self.eat(SyntaxKind::COMMA) {
                    name = Some(self.name()?);
                }
            }
            let handler_body = self.parse_suite()?;
            handlers.push(ExceptHandler {
                type_,
                name,
                body: handler_body,
                range: self.range_from(handler_start),
            });
        }
        let orelse = if !handlers.is_empty() && self.eat(SyntaxKind::ELSE_KW) {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        let has_finally = self.eat(SyntaxKind::FINALLY_KW);
        let finalbody = if has_finally {
            self.parse_suite()?
        } else {
            Vec::new()
        };
        if handlers.is_empty() && !has_finally {
            self.report("expected 'except' or 'finally' block");
        }
        Ok(Stmt {
            kind: StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            range: self.range_from(start),
        })
    }

    fn parse_with(&mut self, start: TextSize) -> PResult<Stmt> {
        self.expect(SyntaxKind::WITH_KW, "'with'")?;
        let mut items = Vec::new();
        loop {
            let context = self.parse_test()?;
            let target = if self.eat(SyntaxKind::AS_KW) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            items.push(WithItem { context, target });
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        let body = self.parse_suite()?;
        Ok(Stmt {
            kind: StmtKind::With { items, body },
            range: self.range_from(start),
        })
    }

    fn parse_decorated(&mut self) -> PResult<Stmt> {
        let start = self.start();
        let mut decorators = Vec::new();
        while self.eat(SyntaxKind::AT) {
            decorators.push(self.parse_namedexpr_test()?);
            self.expect(SyntaxKind::NEWLINE, "end of line after decorator")?;
        }
        match self.kind() {
            SyntaxKind::DEF_KW => self.parse_function(start, decorators, false),
            SyntaxKind::CLASS_KW => self.parse_class(start, decorators),
            SyntaxKind::ASYNC_KW if self.nth(1) == SyntaxKind::DEF_KW => {
                self.bump();
                self.parse_function(start, decorators, true)
            }
            _ => Err(self.error("expected 'def' or 'class' after decorator")),
        }
    }

    fn parse_async(&mut self) -> PResult<Stmt> {
        let start = self.start();
        self.bump();
        match self.kind() {
            SyntaxKind::DEF_KW => self.parse_function(start, Vec::new(), true),
            SyntaxKind::WITH_KW => self.parse_with(start),
            SyntaxKind::FOR_KW => self.parse_for(start),
            _ => Err(self.error("expected 'def', 'with' or 'for' after 'async'")),
        }
    }

    fn parse_function(
        &mut self,
        start: TextSize,
        decorators: Vec<Expr>,
        is_async: bool,
    ) -> PResult<Stmt> {
        self.expect(SyntaxKind::DEF_KW, "'def'")?;
        let name = self.name()?;
        self.expect(SyntaxKind::L_PAREN, "'('")?;
        let params = self.parse_parameters(SyntaxKind::R_PAREN, true)?;
        self.expect(SyntaxKind::R_PAREN, "')'")?;
        let returns = if self.eat(SyntaxKind::ARROW) {
            Some(self.parse_test()?)
        } else {
            None
        };
        let body = self.parse_suite()?;
        Ok(Stmt {
            kind: StmtKind::FunctionDef(Box::new(FunctionDef {
                name,
                params,
                returns,
                body,
                decorators,
                is_async,
            })),
            range: self.range_from(start),
        })
    }

    fn parse_parameters(&mut self, end: SyntaxKind, annotations: bool) -> PResult<Vec<Parameter>> {
        let mut params = Vec::new();
        while !self.at(end) {
            let kind = if self.eat(SyntaxKind::STAR_STAR) {
                ParamKind::KwArgs
            } else if self.eat(SyntaxKind::STAR) {
                if self.at_any(&[SyntaxKind::COMMA, end]) {
                    // bare `*` marks keyword-only parameters
                    if !self.eat(SyntaxKind::COMMA) {
                        break;
                    }
                    continue;
                }
                ParamKind::VarArgs
            } else if self.eat(SyntaxKind::SLASH) {
                // positional-only marker
                if !self.eat(SyntaxKind::COMMA) {
                    break;
                }
                continue;
            } else {
                ParamKind::Normal
            };
            let name = self.name()?;
            let annotation = if annotations && self.eat(SyntaxKind::COLON) {
                Some(self.parse_test()?)
            } else {
                None
            };
            let default = if kind == ParamKind::Normal && self.eat(SyntaxKind::EQ) {
                Some(self.parse_test()?)
            } else {
                None
            };
            params.push(Parameter {
                name,
                kind,
                annotation,
                default,
            });
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_class(&mut self, start: TextSize, decorators: Vec<Expr>) -> PResult<Stmt> {
        self.expect(SyntaxKind::CLASS_KW, "'class'")?;
        let name = self.name()?;
        let mut bases = Vec::new();
        let mut keywords = Vec::new();
        if self.eat(SyntaxKind::L_PAREN) {
            for arg in self.parse_arguments()? {
                match arg.kind {
                    ArgKind::Positional(expr) | ArgKind::Star(expr) => bases.push(expr),
                    ArgKind::Keyword { name, value } => keywords.push((name, value)),
                    ArgKind::DoubleStar(_) => {}
                }
            }
        }
        let body = self.parse_suite()?;
        Ok(Stmt {
            kind: StmtKind::ClassDef(Box::new(ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            })),
            range: self.range_from(start),
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn at_expression_start(&self) -> bool {
        matches!(
            self.kind(),
            SyntaxKind::IDENT
                | SyntaxKind::INTEGER
                | SyntaxKind::FLOAT
                | SyntaxKind::IMAGINARY
                | SyntaxKind::STRING
                | SyntaxKind::L_PAREN
                | SyntaxKind::L_BRACKET
                | SyntaxKind::L_BRACE
                | SyntaxKind::MINUS
                | SyntaxKind::PLUS
                | SyntaxKind::TILDE
                | SyntaxKind::NOT_KW
                | SyntaxKind::LAMBDA_KW
                | SyntaxKind::NONE_KW
                | SyntaxKind::TRUE_KW
                | SyntaxKind::FALSE_KW
                | SyntaxKind::ELLIPSIS
                | SyntaxKind::STAR
                | SyntaxKind::AWAIT_KW
                | SyntaxKind::BACKTICK
        )
    }

    /// `test (',' test)* [',']`, a tuple when a comma is present.
    fn parse_testlist(&mut self) -> PResult<Expr> {
        self.parse_sequence(|p| p.parse_test())
    }

    /// Like [`Self::parse_testlist`] but also accepts `*expr` items.
    fn parse_testlist_star_expr(&mut self) -> PResult<Expr> {
        self.parse_sequence(|p| p.parse_test_or_star())
    }

    /// Targets of `for` and `del`: no comparisons, so `in` stays unconsumed.
    fn parse_exprlist(&mut self) -> PResult<Expr> {
        self.parse_sequence(|p| p.parse_star_or_expr())
    }

    fn parse_exprlist_items(&mut self) -> PResult<Vec<Expr>> {
        let mut items = vec![self.parse_star_or_expr()?];
        while self.eat(SyntaxKind::COMMA) && self.at_expression_start() {
            items.push(self.parse_star_or_expr()?);
        }
        Ok(items)
    }

    fn parse_sequence(&mut self, mut item: impl FnMut(&mut Self) -> PResult<Expr>) -> PResult<Expr> {
        let start = self.start();
        let first = item(self)?;
        if !self.at(SyntaxKind::COMMA) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(SyntaxKind::COMMA) {
            if !self.at_expression_start() {
                break;
            }
            items.push(item(self)?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), self.range_from(start)))
    }

    fn parse_test_or_star(&mut self) -> PResult<Expr> {
        if self.at(SyntaxKind::STAR) {
            self.parse_star_or_expr()
        } else {
            self.parse_test()
        }
    }

    fn parse_star_or_expr(&mut self) -> PResult<Expr> {
        let start = self.start();
        if self.eat(SyntaxKind::STAR) {
            let value = self.parse_expr()?;
            return Ok(Expr::new(
                ExprKind::Starred(Box::new(value)),
                self.range_from(start),
            ));
        }
        self.parse_expr()
    }

    fn parse_namedexpr_test(&mut self) -> PResult<Expr> {
        if self.at(SyntaxKind::IDENT) && self.nth(1) == SyntaxKind::COLON_EQ {
            let start = self.start();
            let target = self.name()?;
            self.bump();
            let value = self.parse_test()?;
            return Ok(Expr::new(
                ExprKind::NamedExpr {
                    target,
                    value: Box::new(value),
                },
                self.range_from(start),
            ));
        }
        self.parse_test()
    }

    fn parse_test(&mut self) -> PResult<Expr> {
        if self.at(SyntaxKind::LAMBDA_KW) {
            return self.parse_lambda();
        }
        let start = self.start();
        let body = self.parse_or_test()?;
        if !self.eat(SyntaxKind::IF_KW) {
            return Ok(body);
        }
        let test = self.parse_or_test()?;
        self.expect(SyntaxKind::ELSE_KW, "'else'")?;
        let orelse = self.nested(Self::parse_test)?;
        Ok(Expr::new(
            ExprKind::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
            self.range_from(start),
        ))
    }

    fn parse_lambda(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.bump();
        let params = self.parse_parameters(SyntaxKind::COLON, false)?;
        self.expect(SyntaxKind::COLON, "':'")?;
        let body = self.nested(Self::parse_test)?;
        Ok(Expr::new(
            ExprKind::Lambda {
                params,
                body: Box::new(body),
            },
            self.range_from(start),
        ))
    }

    fn parse_or_test(&mut self) -> PResult<Expr> {
        self.parse_bool_chain(SyntaxKind::OR_KW, BoolOp::Or, |p| p.parse_and_test())
    }

    fn parse_and_test(&mut self) -> PResult<Expr> {
        self.parse_bool_chain(SyntaxKind::AND_KW, BoolOp::And, |p| p.parse_not_test())
    }

    fn parse_bool_chain(
        &mut self,
        keyword: SyntaxKind,
        op: BoolOp,
        mut operand: impl FnMut(&mut Self) -> PResult<Expr>,
    ) -> PResult<Expr> {
        let start = self.start();
        let first = operand(self)?;
        if !self.at(keyword) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(keyword) {
            values.push(operand(self)?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp { op, values },
            self.range_from(start),
        ))
    }

    fn parse_not_test(&mut self) -> PResult<Expr> {
        let start = self.start();
        if self.eat(SyntaxKind::NOT_KW) {
            let operand = self.nested(Self::parse_not_test)?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                self.range_from(start),
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> PResult<Expr> {
        let start = self.start();
        let left = self.parse_expr()?;
        let mut comparisons = Vec::new();
        loop {
            let op = match self.kind() {
                SyntaxKind::LT => CmpOp::Lt,
                SyntaxKind::GT => CmpOp::Gt,
                SyntaxKind::EQ_EQ => CmpOp::Eq,
                SyntaxKind::GT_EQ => CmpOp::GtE,
                SyntaxKind::LT_EQ => CmpOp::LtE,
                SyntaxKind::BANG_EQ => CmpOp::NotEq,
                SyntaxKind::IN_KW => CmpOp::In,
                SyntaxKind::NOT_KW if self.nth(1) == SyntaxKind::IN_KW => {
                    self.bump();
                    CmpOp::NotIn
                }
                SyntaxKind::IS_KW if self.nth(1) == SyntaxKind::NOT_KW => {
                    self.bump();
                    CmpOp::IsNot
                }
                SyntaxKind::IS_KW => CmpOp::Is,
                _ => break,
            };
            self.bump();
            comparisons.push((op, self.parse_expr()?));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                comparisons,
            },
            self.range_from(start),
        ))
    }

    fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, level: usize) -> PResult<Expr> {
        const LEVELS: &[&[(SyntaxKind, BinOp)]] = &[
            &[(SyntaxKind::PIPE, BinOp::BitOr)],
            &[(SyntaxKind::CARET, BinOp::BitXor)],
            &[(SyntaxKind::AMP, BinOp::BitAnd)],
            &[
                (SyntaxKind::LT_LT, BinOp::LShift),
                (SyntaxKind::GT_GT, BinOp::RShift),
            ],
            &[(SyntaxKind::PLUS, BinOp::Add), (SyntaxKind::MINUS, BinOp::Sub)],
            &[
                (SyntaxKind::STAR, BinOp::Mult),
                (SyntaxKind::SLASH, BinOp::Div),
                (SyntaxKind::SLASH_SLASH, BinOp::FloorDiv),
                (SyntaxKind::PERCENT, BinOp::Mod),
                (SyntaxKind::AT, BinOp::MatMult),
            ],
        ];

        let Some(ops) = LEVELS.get(level) else {
            return self.parse_factor();
        };
        let start = self.start();
        let mut left = self.parse_binary(level + 1)?;
        while let Some(&(_, op)) = ops.iter().find(|(kind, _)| self.at(*kind)) {
            self.bump();
            let right = self.parse_binary(level + 1)?;
            left = Expr::new(
                ExprKind::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                self.range_from(start),
            );
        }
        Ok(left)
    }

    /// Every bracketed atom is reached through here, so this is where
    /// bracket nesting is counted.
    fn parse_factor(&mut self) -> PResult<Expr> {
        self.nested(Self::parse_unary)
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        let start = self.start();
        let op = match self.kind() {
            SyntaxKind::PLUS => UnaryOp::Pos,
            SyntaxKind::MINUS => UnaryOp::Neg,
            SyntaxKind::TILDE => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.bump();
        let operand = self.parse_factor()?;
        Ok(Expr::new(
            ExprKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            self.range_from(start),
        ))
    }

    fn parse_power(&mut self) -> PResult<Expr> {
        let start = self.start();
        let awaited = self.eat(SyntaxKind::AWAIT_KW);
        let mut base = self.parse_atom_expr()?;
        if awaited {
            base = Expr::new(ExprKind::Await(Box::new(base)), self.range_from(start));
        }
        if !self.eat(SyntaxKind::STAR_STAR) {
            return Ok(base);
        }
        let exponent = self.parse_factor()?;
        Ok(Expr::new(
            ExprKind::BinOp {
                left: Box::new(base),
                op: BinOp::Pow,
                right: Box::new(exponent),
            },
            self.range_from(start),
        ))
    }

    fn parse_atom_expr(&mut self) -> PResult<Expr> {
        let start = self.start();
        let mut expr = self.parse_atom()?;
        loop {
            let kind = match self.kind() {
                SyntaxKind::L_PAREN => {
                    self.bump();
                    let args = self.parse_arguments()?;
                    ExprKind::Call {
                        func: Box::new(expr),
                        args,
                    }
                }
                SyntaxKind::L_BRACKET => {
                    self.bump();
                    let index = self.parse_subscripts()?;
                    self.expect(SyntaxKind::R_BRACKET, "']'")?;
                    ExprKind::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                SyntaxKind::DOT => {
                    self.bump();
                    let attr = self.name()?;
                    ExprKind::Attribute {
                        value: Box::new(expr),
                        attr,
                    }
                }
                _ => return Ok(expr),
            };
            expr = Expr::new(kind, self.range_from(start));
        }
    }

    /// Arguments after an opening `(`, consuming the closing `)`.
    fn parse_arguments(&mut self) -> PResult<Vec<Arg>> {
        let mut args = Vec::new();
        while !self.at(SyntaxKind::R_PAREN) {
            let start = self.start();
            let kind = if self.eat(SyntaxKind::STAR_STAR) {
                ArgKind::DoubleStar(self.parse_test()?)
            } else if self.eat(SyntaxKind::STAR) {
                ArgKind::Star(self.parse_test()?)
            } else if self.at(SyntaxKind::IDENT) && self.nth(1) == SyntaxKind::EQ {
                let name = self.name()?;
                self.bump();
                ArgKind::Keyword {
                    name,
                    value: self.parse_test()?,
                }
            } else {
                let value = self.parse_namedexpr_test()?;
                if self.at_comprehension() {
                    let generators = self.parse_comprehension_clauses()?;
                    ArgKind::Positional(Expr::new(
                        ExprKind::GeneratorExp {
                            elt: Box::new(value),
                            generators,
                        },
                        self.range_from(start),
                    ))
                } else {
                    ArgKind::Positional(value)
                }
            };
            args.push(Arg {
                kind,
                range: self.range_from(start),
            });
            if !self.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        self.expect(SyntaxKind::R_PAREN, "')'")?;
        Ok(args)
    }

    fn parse_subscripts(&mut self) -> PResult<Expr> {
        let start = self.start();
        let first = self.parse_subscript()?;
        if !self.at(SyntaxKind::COMMA) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(SyntaxKind::COMMA) {
            if self.at(SyntaxKind::R_BRACKET) {
                break;
            }
            items.push(self.parse_subscript()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), self.range_from(start)))
    }

    fn parse_subscript(&mut self) -> PResult<Expr> {
        let start = self.start();
        let lower = if self.at(SyntaxKind::COLON) {
            None
        } else {
            let value = self.parse_test_or_star()?;
            if !self.at(SyntaxKind::COLON) {
                return Ok(value);
            }
            Some(Box::new(value))
        };
        self.bump();
        let slice_end = [SyntaxKind::COLON, SyntaxKind::COMMA, SyntaxKind::R_BRACKET];
        let upper = if self.at_any(&slice_end) {
            None
        } else {
            Some(Box::new(self.parse_test()?))
        };
        let step = if self.eat(SyntaxKind::COLON) && !self.at_any(&slice_end) {
            Some(Box::new(self.parse_test()?))
        } else {
            None
        };
        Ok(Expr::new(
            ExprKind::Slice { lower, upper, step },
            self.range_from(start),
        ))
    }

    fn at_comprehension(&self) -> bool {
        self.at(SyntaxKind::FOR_KW)
            || (self.at(SyntaxKind::ASYNC_KW) && self.nth(1) == SyntaxKind::FOR_KW)
    }

    fn parse_comprehension_clauses(&mut self) -> PResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        while self.at_comprehension() {
            self.eat(SyntaxKind::ASYNC_KW);
            self.bump();
            let target = self.parse_exprlist()?;
            self.expect(SyntaxKind::IN_KW, "'in'")?;
            let iter = self.parse_or_test()?;
            let mut ifs = Vec::new();
            while self.eat(SyntaxKind::IF_KW) {
                ifs.push(self.parse_or_test()?);
            }
            generators.push(Comprehension { target, iter, ifs });
        }
        Ok(generators)
    }

    fn parse_yield(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.expect(SyntaxKind::YIELD_KW, "'yield'")?;
        let value = if self.eat(SyntaxKind::FROM_KW) {
            Some(Box::new(self.parse_test()?))
        } else if self.at_expression_start() {
            Some(Box::new(self.parse_testlist_star_expr()?))
        } else {
            None
        };
        Ok(Expr::new(ExprKind::Yield(value), self.range_from(start)))
    }

    fn parse_atom(&mut self) -> PResult<Expr> {
        let start = self.start();
        let kind = match self.kind() {
            SyntaxKind::IDENT => ExprKind::Name(SmolStr::new(self.bump().text)),
            SyntaxKind::INTEGER => ExprKind::Constant(Constant::Int(self.bump().text.into())),
            SyntaxKind::FLOAT => ExprKind::Constant(Constant::Float(self.bump().text.into())),
            SyntaxKind::IMAGINARY => {
                ExprKind::Constant(Constant::Complex(self.bump().text.into()))
            }
            SyntaxKind::STRING => self.parse_strings(),
            SyntaxKind::NONE_KW => {
                self.bump();
                ExprKind::Constant(Constant::None)
            }
            SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => {
                let value = self.bump().kind == SyntaxKind::TRUE_KW;
                ExprKind::Constant(Constant::Bool(value))
            }
            SyntaxKind::ELLIPSIS => {
                self.bump();
                ExprKind::Constant(Constant::Ellipsis)
            }
            SyntaxKind::BACKTICK => {
                self.bump();
                let value = self.parse_testlist()?;
                self.expect(SyntaxKind::BACKTICK, "'`'")?;
                ExprKind::Repr(Box::new(value))
            }
            SyntaxKind::L_PAREN => return self.parse_paren(),
            SyntaxKind::L_BRACKET => self.parse_list()?,
            SyntaxKind::L_BRACE => self.parse_brace()?,
            _ => return Err(self.error("expected an expression")),
        };
        Ok(Expr::new(kind, self.range_from(start)))
    }

    fn parse_strings(&mut self) -> ExprKind {
        let mut value = String::new();
        let mut bytes = false;
        while self.at(SyntaxKind::STRING) {
            let token = self.bump();
            let (is_bytes, body) = string_body(token.text);
            bytes |= is_bytes;
            value.push_str(body);
        }
        if bytes {
            ExprKind::Constant(Constant::Bytes(value))
        } else {
            ExprKind::Constant(Constant::Str(value))
        }
    }

    fn parse_paren(&mut self) -> PResult<Expr> {
        let start = self.start();
        self.bump();
        if self.eat(SyntaxKind::R_PAREN) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), self.range_from(start)));
        }
        if self.at(SyntaxKind::YIELD_KW) {
            let value = self.parse_yield()?;
            self.expect(SyntaxKind::R_PAREN, "')'")?;
            return Ok(value);
        }
        let first = if self.at(SyntaxKind::STAR) {
            self.parse_star_or_expr()?
        } else {
            self.parse_namedexpr_test()?
        };
        let expr = if self.at_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            ExprKind::GeneratorExp {
                elt: Box::new(first),
                generators,
            }
        } else if self.at(SyntaxKind::COMMA) {
            let mut items = vec![first];
            while self.eat(SyntaxKind::COMMA) {
                if self.at(SyntaxKind::R_PAREN) {
                    break;
                }
                items.push(self.parse_test_or_star()?);
            }
            ExprKind::Tuple(items)
        } else {
            self.expect(SyntaxKind::R_PAREN, "')'")?;
            return Ok(first);
        };
        self.expect(SyntaxKind::R_PAREN, "')'")?;
        Ok(Expr::new(expr, self.range_from(start)))
    }

    fn parse_list(&mut self) -> PResult<ExprKind> {
        self.bump();
        if self.eat(SyntaxKind::R_BRACKET) {
            return Ok(ExprKind::List(Vec::new()));
        }
        let first = self.parse_test_or_star()?;
        if self.at_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(SyntaxKind::R_BRACKET, "']'")?;
            return Ok(ExprKind::ListComp {
                elt: Box::new(first),
                generators,
            });
        }
        let items = self.parse_items_after(first, SyntaxKind::R_BRACKET)?;
        self.expect(SyntaxKind::R_BRACKET, "']'")?;
        Ok(ExprKind::List(items))
    }

    fn parse_brace(&mut self) -> PResult<ExprKind> {
        self.bump();
        if self.eat(SyntaxKind::R_BRACE) {
            return Ok(ExprKind::Dict(Vec::new()));
        }

        if self.eat(SyntaxKind::STAR_STAR) {
            return self.parse_dict_after(None);
        }
        let first = self.parse_test_or_star()?;
        if self.at(SyntaxKind::COLON) {
            return self.parse_dict_after(Some(first));
        }
        self.parse_set_after(first)
    }

    fn parse_dict_after(&mut self, first_key: Option<Expr>) -> PResult<ExprKind> {
        let first_value = if first_key.is_some() {
            self.bump();
            self.parse_test()?
        } else {
            self.parse_expr()?
        };
        if self.at_comprehension() {
            if let Some(key) = first_key {
                let generators = self.parse_comprehension_clauses()?;
                self.expect(SyntaxKind::R_BRACE, "'}'")?;
                return Ok(ExprKind::DictComp {
                    key: Box::new(key),
                    value: Box::new(first_value),
                    generators,
                });
            }
        }
        let mut entries = vec![(first_key, first_value)];
        while self.eat(SyntaxKind::COMMA) {
            if self.at(SyntaxKind::R_BRACE) {
                break;
            }
            if self.eat(SyntaxKind::STAR_STAR) {
                entries.push((None, self.parse_expr()?));
            } else {
                let key = self.parse_test()?;
                self.expect(SyntaxKind::COLON, "':'")?;
                entries.push((Some(key), self.parse_test()?));
            }
        }
        self.expect(SyntaxKind::R_BRACE, "'}'")?;
        Ok(ExprKind::Dict(entries))
    }

    fn parse_set_after(&mut self, first: Expr) -> PResult<ExprKind> {
        if self.at_comprehension() {
            let generators = self.parse_comprehension_clauses()?;
            self.expect(SyntaxKind::R_BRACE, "'}'")?;
            return Ok(ExprKind::SetComp {
                elt: Box::new(first),
                generators,
            });
        }
        let items = self.parse_items_after(first, SyntaxKind::R_BRACE)?;
        self.expect(SyntaxKind::R_BRACE, "'}'")?;
        Ok(ExprKind::Set(items))
    }

    fn parse_items_after(&mut self, first: Expr, close: SyntaxKind) -> PResult<Vec<Expr>> {
        let mut items = vec![first];
        while self.eat(SyntaxKind::COMMA) {
            if self.at(close) {
                break;
            }
            items.push(self.parse_test_or_star()?);
        }
        Ok(items)
    }
}

/// Strip prefix letters and quotes from a string token.
///
/// Returns whether the literal is a bytes literal, and its raw body.
fn string_body(text: &str) -> (bool, &str) {
    let prefix_len = text
        .find(|c: char| c == '\'' || c == '"')
        .unwrap_or(text.len());
    let bytes = text[..prefix_len].contains(['b', 'B']);
    let quoted = &text[prefix_len..];
    let quote_len = if quoted.starts_with("'''") || quoted.starts_with("\"\"\"") {
        3
    } else {
        1.min(quoted.len())
    };
    let inner = &quoted[quote_len..];
    let closing = &quoted[..quote_len];
    let body = if inner.len() >= quote_len && inner.ends_with(closing) && !closing.is_empty() {
        &inner[..inner.len() - quote_len]
    } else {
        inner
    };
    (bytes, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Module {
        let parse = parse(input);
        assert!(parse.ok(), "unexpected errors: {:?}", parse.errors);
        parse.module
    }

    #[test]
    fn test_parse_assignment() {
        let module = parse_ok("x = 1\n");
        assert_eq!(module.body.len(), 1);
        let StmtKind::Assign { targets, value } = &module.body[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(targets[0].as_name(), Some("x"));
        assert!(matches!(value.kind, ExprKind::Constant(Constant::Int(_))));
    }

    #[test]
    fn test_parse_chained_assignment() {
        let module = parse_ok("a = b = 'text'");
        let StmtKind::Assign { targets, value } = &module.body[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(targets.len(), 2);
        assert_eq!(value.kind, ExprKind::Constant(Constant::Str("text".into())));
    }

    #[test]
    fn test_parse_function_with_docstring_and_params() {
        let module = parse_ok(
            "def area(width, height=2, *rest, **options):\n    \"\"\"Compute.\"\"\"\n    return width * height\n",
        );
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected function");
        };
        assert_eq!(def.name.id, "area");
        assert_eq!(def.params.len(), 4);
        assert!(def.params[1].default.is_some());
        assert_eq!(def.params[2].kind, ParamKind::VarArgs);
        assert_eq!(def.params[3].kind, ParamKind::KwArgs);
        assert_eq!(def.docstring(), Some("Compute."));
        assert_eq!(def.body.len(), 2);
    }

    #[test]
    fn test_parse_class_with_methods() {
        let module = parse_ok(
            "class Point(Base):\n    def __init__(self, x):\n        self.x = x\n\n    def norm(self):\n        return abs(self.x)\n",
        );
        let StmtKind::ClassDef(class) = &module.body[0].kind else {
            panic!("expected class");
        };
        assert_eq!(class.name.id, "Point");
        assert_eq!(class.bases.len(), 1);
        assert_eq!(class.body.len(), 2);
    }

    #[test]
    fn test_parse_imports() {
        let module = parse_ok("import os.path as p, sys\nfrom ..pkg import (a, b as c,)\nfrom m import *\n");
        let StmtKind::Import(aliases) = &module.body[0].kind else {
            panic!("expected import");
        };
        assert_eq!(aliases[0].name.dotted(), "os.path");
        assert_eq!(aliases[0].asname.as_ref().map(|n| n.id.as_str()), Some("p"));
        let StmtKind::ImportFrom {
            module: from,
            level,
            names,
            star,
        } = &module.body[1].kind
        else {
            panic!("expected from-import");
        };
        assert_eq!(from.as_ref().map(|m| m.dotted()), Some("pkg".to_string()));
        assert_eq!(*level, 2);
        assert_eq!(names.len(), 2);
        assert!(!star);
        assert!(matches!(
            module.body[2].kind,
            StmtKind::ImportFrom { star: true, .. }
        ));
    }

    #[test]
    fn test_parse_compound_statements() {
        let module = parse_ok(
            "if a:\n    pass\nelif b:\n    pass\nelse:\n    pass\nfor i in range(3):\n    continue\nwhile x: break\ntry:\n    f()\nexcept ValueError as e:\n    raise\nfinally:\n    g()\nwith open(p) as fh, lock:\n    pass\n",
        );
        assert_eq!(module.body.len(), 5);
        let StmtKind::If { orelse, .. } = &module.body[0].kind else {
            panic!("expected if");
        };
        assert!(matches!(orelse[0].kind, StmtKind::If { .. }));
    }

    #[test]
    fn test_parse_expressions() {
        let module = parse_ok(
            "y = [i * 2 for i in xs if i] + list({k: v for k, v in d.items()})\nz = lambda a, b=1: a if b else not a\nw = x[1:2, ::3]\nv = f(*args, key=1, **kw)\n",
        );
        assert_eq!(module.body.len(), 4);
    }

    #[test]
    fn test_error_recovery_keeps_following_statements() {
        let parse = parse("x = 1\ny = (\nz = 3\n");
        assert!(!parse.ok());
        // `y = (` swallows the next line (inside brackets); x survives
        assert!(
            parse
                .module
                .body
                .iter()
                .any(|s| matches!(&s.kind, StmtKind::Assign { targets, .. } if targets[0].as_name() == Some("x")))
        );
    }

    #[test]
    fn test_error_recovery_at_line_level() {
        let parse = parse("a = 1\nb = = 2\nc = 3\n");
        assert_eq!(parse.errors.len(), 1);
        assert_eq!(parse.module.body.len(), 2);
    }

    #[test]
    fn test_trailing_dot_is_an_error() {
        let parse = parse("x = 1\nx.");
        assert!(!parse.ok());
        assert_eq!(parse.module.body.len(), 1);
    }

    #[test]
    fn test_unexpected_indent_is_reported() {
        let parse = parse("x = 1\n    y = 2\n");
        assert_eq!(parse.errors.len(), 1);
        assert!(parse.errors[0].message.contains("unexpected indent"));
        assert_eq!(parse.module.body.len(), 2);
    }

    #[test]
    fn test_deep_brackets_fail_the_statement_only() {
        let deep = format!("x = {}1{}\ny = 2\n", "(".repeat(1000), ")".repeat(1000));
        let parse = parse(&deep);
        assert_eq!(parse.errors.len(), 1);
        assert!(parse.errors[0].message.contains("too deeply nested"));
        assert_eq!(parse.module.body.len(), 1);
        let y = TextSize::of(deep.as_str()) - TextSize::new(6);
        assert_eq!(parse.module.body[0].range.start(), y);
    }

    #[test]
    fn test_nesting_below_the_limit_parses() {
        let depth = MAX_NESTING / 2;
        parse_ok(&format!("x = {}[1]{}\n", "(".repeat(depth), ")".repeat(depth)));
        let unary = format!("x = {}1\nflag = {}y\n", "-".repeat(1000), "not ".repeat(1000));
        let parse = parse(&unary);
        assert_eq!(parse.errors.len(), 2);
        assert!(parse_expression(&format!("{}1{}", "[".repeat(500), "]".repeat(500))).is_none());
    }

    #[test]
    fn test_deep_blocks_are_skipped() {
        let mut text = String::new();
        for level in 0..MAX_BLOCKS + 50 {
            text.push_str(&"    ".repeat(level));
            text.push_str("if x:\n");
        }
        text.push_str(&"    ".repeat(MAX_BLOCKS + 50));
        text.push_str("pass\nz = 1\n");
        let parse = parse(&text);
        assert_eq!(parse.errors.len(), 1);
        assert!(parse.errors[0].message.contains("too many nested blocks"));
        assert_eq!(parse.module.body.len(), 2);
        assert!(matches!(&parse.module.body[1].kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn test_missing_block_is_reported() {
        let parse = parse("def f():\nx = 1\n");
        assert!(parse.errors.iter().any(|e| e.message.contains("indented block")));
    }

    #[test]
    fn test_print_statement_option() {
        let options = ParseOptions {
            print_statement: true,
        };
        let parse = parse_with_options("print 'a', b\n", options);
        assert!(parse.ok());
        assert!(matches!(parse.module.body[0].kind, StmtKind::Print(ref v) if v.len() == 2));
        assert!(!super::parse("print 'a', b\n").ok());
    }

    #[test]
    fn test_parse_expression_text() {
        let expr = parse_expression("os.path.join(a).upper").unwrap();
        assert!(matches!(expr.kind, ExprKind::Attribute { .. }));
        assert!(parse_expression("x.").is_none());
        assert!(parse_expression("a b").is_none());
    }

    #[test]
    fn test_string_body() {
        assert_eq!(string_body("'abc'"), (false, "abc"));
        assert_eq!(string_body("b\"\"\"x\"\"\""), (true, "x"));
        assert_eq!(string_body("'open"), (false, "open"));
        assert_eq!(string_body("r''"), (false, ""));
    }

    #[test]
    fn test_ranges_cover_statement() {
        let text = "value = compute(1, 2)\n";
        let module = parse_ok(text);
        assert_eq!(&text[module.body[0].range], "value = compute(1, 2)");
    }
}
