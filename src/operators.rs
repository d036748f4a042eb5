use std::fmt;

use strum::Display;

/// Arithmetic operators.
///
/// Uses strum `Display` derive with per-variant serialization for operator symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ArithOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mult,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "//")]
    FloorDiv,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "**")]
    Pow,
}

/// Bitwise operators. Both operands must be integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BitOp {
    #[strum(serialize = "&")]
    And,
    #[strum(serialize = "|")]
    Or,
    #[strum(serialize = "^")]
    Xor,
    #[strum(serialize = "<<")]
    LShift,
    #[strum(serialize = ">>")]
    RShift,
}

/// Short-circuiting boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BoolOp {
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

/// Comparison operators. Defined separately since these always return a bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CmpOp {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    LtE,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    GtE,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UnaryOp {
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "+")]
    Pos,
    #[strum(serialize = "-")]
    Neg,
    #[strum(serialize = "~")]
    Invert,
}

/// The operator slot of a binary expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Arith(ArithOp),
    Bit(BitOp),
    Bool(BoolOp),
    Cmp(CmpOp),
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arith(op) => write!(f, "{op}"),
            Self::Bit(op) => write!(f, "{op}"),
            Self::Bool(op) => write!(f, "{op}"),
            Self::Cmp(op) => write!(f, "{op}"),
        }
    }
}
