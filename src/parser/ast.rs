//! Owned syntax tree.
//!
//! Every node carries the [`TextRange`] it was parsed from. Ranges of a
//! composite module (several buffers concatenated) are relative to the
//! buffer each statement came from.

use smol_str::SmolStr;
use text_size::TextRange;

/// A parsed module: the top-level statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

impl Module {
    /// Docstring of the module, if its first statement is a string literal.
    pub fn docstring(&self) -> Option<&str> {
        docstring(&self.body)
    }

    /// Concatenate several modules into one composite tree.
    pub fn concat(parts: impl IntoIterator<Item = Module>) -> Module {
        let mut body = Vec::new();
        let mut range: Option<TextRange> = None;
        for part in parts {
            range = Some(match range {
                Some(r) => r.cover(part.range),
                None => part.range,
            });
            body.extend(part.body);
        }
        Module {
            body,
            range: range.unwrap_or_default(),
        }
    }
}

/// An identifier with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub id: SmolStr,
    pub range: TextRange,
}

/// `a.b.c` as written in imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedName {
    pub parts: Vec<Name>,
    pub range: TextRange,
}

impl DottedName {
    pub fn dotted(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn first(&self) -> Option<&Name> {
        self.parts.first()
    }
}

/// `name [as asname]` in an import statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: DottedName,
    pub asname: Option<Name>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    FunctionDef(Box<FunctionDef>),
    ClassDef(Box<ClassDef>),
    Return(Option<Expr>),
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    Import(Vec<Alias>),
    ImportFrom {
        module: Option<DottedName>,
        level: u32,
        names: Vec<Alias>,
        star: bool,
    },
    Global(Vec<Name>),
    Nonlocal(Vec<Name>),
    Del(Vec<Expr>),
    Raise(Option<Expr>),
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Print(Vec<Expr>),
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Name,
    pub params: Vec<Parameter>,
    pub returns: Option<Expr>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub is_async: bool,
}

impl FunctionDef {
    pub fn docstring(&self) -> Option<&str> {
        docstring(&self.body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Normal,
    /// `*args`
    VarArgs,
    /// `**kwargs`
    KwArgs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Name,
    pub kind: ParamKind,
    pub annotation: Option<Expr>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: Name,
    pub bases: Vec<Expr>,
    pub keywords: Vec<(Name, Expr)>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
}

impl ClassDef {
    pub fn docstring(&self) -> Option<&str> {
        docstring(&self.body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub type_: Option<Expr>,
    pub name: Option<Name>,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: TextRange,
}

impl Expr {
    pub fn new(kind: ExprKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    /// The bare name, if this is a name expression.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Name(SmolStr),
    Constant(Constant),
    Attribute {
        value: Box<Expr>,
        attr: Name,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Arg>,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    /// A `None` key is a `**mapping` entry.
    Dict(Vec<(Option<Expr>, Expr)>),
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        comparisons: Vec<(CmpOp, Expr)>,
    },
    Lambda {
        params: Vec<Parameter>,
        body: Box<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    NamedExpr {
        target: Name,
        value: Box<Expr>,
    },
    Starred(Box<Expr>),
    Yield(Option<Box<Expr>>),
    Await(Box<Expr>),
    /// Backquoted repr from 2.x.
    Repr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    Int(SmolStr),
    Float(SmolStr),
    Complex(SmolStr),
    /// Concatenated string literal; the value has prefixes and quotes removed.
    Str(String),
    Bytes(String),
    Ellipsis,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub kind: ArgKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgKind {
    Positional(Expr),
    Keyword { name: Name, value: Expr },
    Star(Expr),
    DoubleStar(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
}

impl BinOp {
    /// Operator for an augmented assignment token such as `+=`.
    pub fn from_augmented(text: &str) -> Option<BinOp> {
        let op = match text.strip_suffix('=')? {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mult,
            "@" => BinOp::MatMult,
            "/" => BinOp::Div,
            "//" => BinOp::FloorDiv,
            "%" => BinOp::Mod,
            "**" => BinOp::Pow,
            "<<" => BinOp::LShift,
            ">>" => BinOp::RShift,
            "|" => BinOp::BitOr,
            "^" => BinOp::BitXor,
            "&" => BinOp::BitAnd,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Pos,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

fn docstring(body: &[Stmt]) -> Option<&str> {
    match body.first().map(|s| &s.kind) {
        Some(StmtKind::Expr(Expr {
            kind: ExprKind::Constant(Constant::Str(doc)),
            ..
        })) => Some(doc.as_str()),
        _ => None,
    }
}

/// Visit `expr` and every expression nested inside it, parents first.
pub fn walk_expr<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::Name(_) | ExprKind::Constant(_) => {}
        ExprKind::Attribute { value, .. }
        | ExprKind::Starred(value)
        | ExprKind::Await(value)
        | ExprKind::Repr(value)
        | ExprKind::NamedExpr { value, .. }
        | ExprKind::UnaryOp { operand: value, .. } => walk_expr(value, f),
        ExprKind::Yield(value) => {
            if let Some(value) = value {
                walk_expr(value, f);
            }
        }
        ExprKind::Call { func, args } => {
            walk_expr(func, f);
            for arg in args {
                match &arg.kind {
                    ArgKind::Positional(e)
                    | ArgKind::Star(e)
                    | ArgKind::DoubleStar(e)
                    | ArgKind::Keyword { value: e, .. } => walk_expr(e, f),
                }
            }
        }
        ExprKind::Subscript { value, index } => {
            walk_expr(value, f);
            walk_expr(index, f);
        }
        ExprKind::Slice { lower, upper, step } => {
            for part in [lower, upper, step].into_iter().flatten() {
                walk_expr(part, f);
            }
        }
        ExprKind::List(items) | ExprKind::Tuple(items) | ExprKind::Set(items) => {
            for item in items {
                walk_expr(item, f);
            }
        }
        ExprKind::BoolOp { values, .. } => {
            for value in values {
                walk_expr(value, f);
            }
        }
        ExprKind::Dict(entries) => {
            for (key, value) in entries {
                if let Some(key) = key {
                    walk_expr(key, f);
                }
                walk_expr(value, f);
            }
        }
        ExprKind::ListComp { elt, generators }
        | ExprKind::SetComp { elt, generators }
        | ExprKind::GeneratorExp { elt, generators } => {
            walk_expr(elt, f);
            walk_generators(generators, f);
        }
        ExprKind::DictComp {
            key,
            value,
            generators,
        } => {
            walk_expr(key, f);
            walk_expr(value, f);
            walk_generators(generators, f);
        }
        ExprKind::BinOp { left, right, .. } => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        ExprKind::Compare { left, comparisons } => {
            walk_expr(left, f);
            for (_, right) in comparisons {
                walk_expr(right, f);
            }
        }
        ExprKind::Lambda { body, .. } => walk_expr(body, f),
        ExprKind::IfExp { test, body, orelse } => {
            walk_expr(test, f);
            walk_expr(body, f);
            walk_expr(orelse, f);
        }
    }
}

fn walk_generators<'a>(generators: &'a [Comprehension], f: &mut impl FnMut(&'a Expr)) {
    for generator in generators {
        walk_expr(&generator.target, f);
        walk_expr(&generator.iter, f);
        for test in &generator.ifs {
            walk_expr(test, f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextSize;

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::new(start), TextSize::new(end))
    }

    fn pass(start: u32) -> Stmt {
        Stmt {
            kind: StmtKind::Pass,
            range: range(start, start + 4),
        }
    }

    #[test]
    fn test_concat_keeps_statement_order() {
        let a = Module {
            body: vec![pass(0)],
            range: range(0, 4),
        };
        let b = Module {
            body: vec![pass(0), pass(5)],
            range: range(0, 9),
        };
        let merged = Module::concat([a, b]);
        assert_eq!(merged.body.len(), 3);
        assert_eq!(merged.range, range(0, 9));
    }

    #[test]
    fn test_augmented_operator() {
        assert_eq!(BinOp::from_augmented("+="), Some(BinOp::Add));
        assert_eq!(BinOp::from_augmented("//="), Some(BinOp::FloorDiv));
        assert_eq!(BinOp::from_augmented(">>="), Some(BinOp::RShift));
        assert_eq!(BinOp::from_augmented("=="), None);
    }

    #[test]
    fn test_dotted_name() {
        let name = DottedName {
            parts: vec![
                Name {
                    id: "os".into(),
                    range: range(0, 2),
                },
                Name {
                    id: "path".into(),
                    range: range(3, 7),
                },
            ],
            range: range(0, 7),
        };
        assert_eq!(name.dotted(), "os.path");
    }
    #[test]
    fn test_walk_expr_visits_nested_calls() {
        let call = |name: &str, args: Vec<Expr>| Expr {
            kind: ExprKind::Call {
                func: Box::new(Expr::new(ExprKind::Name(name.into()), range(0, 1))),
                args: args
                    .into_iter()
                    .map(|e| Arg {
                        kind: ArgKind::Positional(e),
                        range: range(0, 1),
                    })
                    .collect(),
            },
            range: range(0, 1),
        };
        let expr = call("outer", vec![call("inner", Vec::new())]);
        let mut names = Vec::new();
        walk_expr(&expr, &mut |e| {
            if let Some(name) = e.as_name() {
                names.push(name.to_string());
            }
        });
        assert_eq!(names, vec!["outer", "inner"]);
    }
}
