use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::operators::{BinOpKind, UnaryOp};
use crate::value::{string_repr, Value};

/// A sequence of statements: a module body, function body, or clause body.
pub type Block = Vec<Node>;

/// Literal values produced by the parser.
///
/// Detached from the runtime `Value` type so the AST stays free of shared
/// runtime state; literals are converted on every evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Const {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(String),
}

impl Const {
    /// Converts the literal into its runtime counterpart.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::None => Value::None,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(i.clone()),
            Self::Float(v) => Value::Float(*v),
            Self::Str(s) => Value::Str(s.as_str().into()),
        }
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(&string_repr(s)),
        }
    }
}

/// Expression AST nodes consumed by the evaluator.
#[derive(Debug, Clone)]
pub enum Expr {
    Constant(Const),
    Name(String),
    /// Evaluates the inner expression, binds it to the name, and yields it.
    As {
        value: Box<Expr>,
        binding: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOpKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    SliceDef {
        start: Box<Expr>,
        stop: Box<Expr>,
        stride: Box<Expr>,
    },
    ListDef(Vec<Expr>),
    TupleDef(Vec<Expr>),
    TernOp {
        test: Box<Expr>,
        truthy: Box<Expr>,
        falsy: Box<Expr>,
    },
    /// The `*` of a glob import; only meaningful inside `ImportFrom`.
    Glob,
    /// A module reference in an import; only meaningful inside imports.
    RelativeImport {
        level: usize,
        path: String,
    },
    Lambda,
    Yield,
    YieldFrom,
}

fn join(items: &[Expr]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(c) => write!(f, "{c}"),
            Self::Name(name) => f.write_str(name),
            Self::As { value, binding } => write!(f, "{value} as {binding}"),
            Self::Unary {
                op: op @ UnaryOp::Not,
                operand,
            } => write!(f, "{op} {operand}"),
            Self::Unary { op, operand } => write!(f, "{op}{operand}"),
            Self::Binary { op, left, right } => write!(f, "{left} {op} {right}"),
            Self::Call { func, args } => write!(f, "{func}({})", join(args)),
            Self::Attribute { value, attr } => write!(f, "{value}.{attr}"),
            Self::Subscript { value, index } => write!(f, "{value}[{index}]"),
            Self::SliceDef { start, stop, stride } => write!(f, "{start}:{stop}:{stride}"),
            Self::ListDef(items) => write!(f, "[{}]", join(items)),
            Self::TupleDef(items) => {
                if items.len() == 1 {
                    write!(f, "({},)", items[0])
                } else {
                    write!(f, "({})", join(items))
                }
            }
            Self::TernOp { test, truthy, falsy } => write!(f, "{truthy} if {test} else {falsy}"),
            Self::Glob => f.write_str("*"),
            Self::RelativeImport { level, path } => {
                write!(f, "{}{path}", ".".repeat(*level))
            }
            Self::Lambda => f.write_str("lambda"),
            Self::Yield => f.write_str("yield"),
            Self::YieldFrom => f.write_str("yield from"),
        }
    }
}

/// One `cond: block` arm of an `if` statement.
#[derive(Debug, Clone)]
pub struct IfClause {
    pub test: Expr,
    pub body: Block,
}

/// One `except Class as name:` arm of a `try` statement.
#[derive(Debug, Clone)]
pub struct ExceptClause {
    pub class: Expr,
    pub name: Option<String>,
    pub body: Block,
}

/// Statement AST nodes.
#[derive(Debug, Clone)]
pub enum Node {
    Expression(Expr),
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        clauses: Vec<IfClause>,
        or_else: Block,
    },
    While {
        test: Expr,
        body: Block,
        or_else: Block,
    },
    Try {
        body: Block,
        handlers: Vec<ExceptClause>,
        or_else: Block,
        finally: Block,
    },
    Raise {
        exc: Expr,
        cause: Option<Expr>,
    },
    /// Bare `raise`: rethrows the active exception.
    Reraise,
    Return(Option<Expr>),
    Break,
    Continue,
    Pass,
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Del(Expr),
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Rc<Block>,
    },
    ClassDef {
        name: String,
        bases: Vec<Expr>,
        body: Block,
    },
    Import(Vec<Expr>),
    ImportFrom {
        source: Expr,
        names: Vec<Expr>,
    },
    For,
    With,
    Global,
    Nonlocal,
}

impl fmt::Display for Node {
    /// Single-line rendering used by statement tracing; nested blocks are
    /// elided as `...`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(e) => write!(f, "{e}"),
            Self::Assign { target, value } => write!(f, "{target} = {value}"),
            Self::If { clauses, .. } => match clauses.first() {
                Some(clause) => write!(f, "if {}: ...", clause.test),
                None => f.write_str("if ..."),
            },
            Self::While { test, .. } => write!(f, "while {test}: ..."),
            Self::Try { .. } => f.write_str("try: ..."),
            Self::Raise { exc, cause: None } => write!(f, "raise {exc}"),
            Self::Raise {
                exc,
                cause: Some(cause),
            } => write!(f, "raise {exc} from {cause}"),
            Self::Reraise => f.write_str("raise"),
            Self::Return(None) => f.write_str("return"),
            Self::Return(Some(e)) => write!(f, "return {e}"),
            Self::Break => f.write_str("break"),
            Self::Continue => f.write_str("continue"),
            Self::Pass => f.write_str("pass"),
            Self::Assert { test, msg: None } => write!(f, "assert {test}"),
            Self::Assert { test, msg: Some(msg) } => write!(f, "assert {test}, {msg}"),
            Self::Del(target) => write!(f, "del {target}"),
            Self::FunctionDef { name, params, .. } => {
                write!(f, "def {name}({}): ...", params.join(", "))
            }
            Self::ClassDef { name, bases, .. } => {
                if bases.is_empty() {
                    write!(f, "class {name}: ...")
                } else {
                    write!(f, "class {name}({}): ...", join(bases))
                }
            }
            Self::Import(items) => write!(f, "import {}", join(items)),
            Self::ImportFrom { source, names } => {
                write!(f, "from {source} import {}", join(names))
            }
            Self::For => f.write_str("for ..."),
            Self::With => f.write_str("with ..."),
            Self::Global => f.write_str("global ..."),
            Self::Nonlocal => f.write_str("nonlocal ..."),
        }
    }
}
