#![allow(dead_code)]

use std::rc::Rc;

use krait::{
    ArithOp, BinOpKind, BitOp, BoolOp, CmpOp, CollectStringPrint, Const, ExceptClause, Expr,
    IfClause, Interpreter, MapLoader, Node, RunError, UnaryOp,
};

/// Runs a program that is expected to succeed, returning its stdout.
pub fn run_ok(code: &[Node]) -> String {
    let mut interp = Interpreter::new(MapLoader::new(), CollectStringPrint::new());
    if let Err(err) = interp.run("test.py", code) {
        panic!("program failed: {err}\noutput so far:\n{}", interp.writer().output());
    }
    interp.into_writer().into_output()
}

/// Runs a program that is expected to fail, returning stdout and the error.
pub fn run_err(code: &[Node]) -> (String, RunError) {
    let mut interp = Interpreter::new(MapLoader::new(), CollectStringPrint::new());
    let err = interp.run("test.py", code).expect_err("program should fail");
    (interp.into_writer().into_output(), err)
}

/// Like `run_ok` with preloaded importable modules.
pub fn run_with_modules(loader: MapLoader, code: &[Node]) -> String {
    let mut interp = Interpreter::new(loader, CollectStringPrint::new());
    if let Err(err) = interp.run("test.py", code) {
        panic!("program failed: {err}\noutput so far:\n{}", interp.writer().output());
    }
    interp.into_writer().into_output()
}

/// The `ClassName: message` summary of an unhandled exception.
pub fn summary(err: &RunError) -> String {
    match err {
        RunError::Exc(raised) => raised.summary(),
        RunError::Internal(msg) => panic!("unexpected internal error: {msg}"),
    }
}

// expression builders

pub fn int(i: i64) -> Expr {
    Expr::Constant(Const::Int(i.into()))
}

pub fn float(v: f64) -> Expr {
    Expr::Constant(Const::Float(v))
}

pub fn str_(s: &str) -> Expr {
    Expr::Constant(Const::Str(s.to_string()))
}

pub fn bool_(b: bool) -> Expr {
    Expr::Constant(Const::Bool(b))
}

pub fn none() -> Expr {
    Expr::Constant(Const::None)
}

pub fn name(n: &str) -> Expr {
    Expr::Name(n.to_string())
}

pub fn bin(op: BinOpKind, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn add(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Arith(ArithOp::Add), l, r)
}

pub fn sub(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Arith(ArithOp::Sub), l, r)
}

pub fn mul(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Arith(ArithOp::Mult), l, r)
}

pub fn div(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Arith(ArithOp::Div), l, r)
}

pub fn floordiv(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Arith(ArithOp::FloorDiv), l, r)
}

pub fn modulo(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Arith(ArithOp::Mod), l, r)
}

pub fn pow_(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Arith(ArithOp::Pow), l, r)
}

pub fn bit(op: BitOp, l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Bit(op), l, r)
}

pub fn cmp(op: CmpOp, l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Cmp(op), l, r)
}

pub fn eq(l: Expr, r: Expr) -> Expr {
    cmp(CmpOp::Eq, l, r)
}

pub fn lt(l: Expr, r: Expr) -> Expr {
    cmp(CmpOp::Lt, l, r)
}

pub fn le(l: Expr, r: Expr) -> Expr {
    cmp(CmpOp::LtE, l, r)
}

pub fn and_(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Bool(BoolOp::And), l, r)
}

pub fn or_(l: Expr, r: Expr) -> Expr {
    bin(BinOpKind::Bool(BoolOp::Or), l, r)
}

pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

pub fn not_(e: Expr) -> Expr {
    unary(UnaryOp::Not, e)
}

pub fn neg(e: Expr) -> Expr {
    unary(UnaryOp::Neg, e)
}

pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        func: Box::new(func),
        args,
    }
}

pub fn call_name(func: &str, args: Vec<Expr>) -> Expr {
    call(name(func), args)
}

pub fn attr(value: Expr, attribute: &str) -> Expr {
    Expr::Attribute {
        value: Box::new(value),
        attr: attribute.to_string(),
    }
}

pub fn subscript(value: Expr, index: Expr) -> Expr {
    Expr::Subscript {
        value: Box::new(value),
        index: Box::new(index),
    }
}

pub fn list(items: Vec<Expr>) -> Expr {
    Expr::ListDef(items)
}

pub fn tuple(items: Vec<Expr>) -> Expr {
    Expr::TupleDef(items)
}

pub fn ternary(test: Expr, truthy: Expr, falsy: Expr) -> Expr {
    Expr::TernOp {
        test: Box::new(test),
        truthy: Box::new(truthy),
        falsy: Box::new(falsy),
    }
}

pub fn as_(value: Expr, binding: &str) -> Expr {
    Expr::As {
        value: Box::new(value),
        binding: Box::new(name(binding)),
    }
}

// statement builders

pub fn expr(e: Expr) -> Node {
    Node::Expression(e)
}

pub fn print1(e: Expr) -> Node {
    expr(call_name("print", vec![e]))
}

pub fn assign(target: &str, value: Expr) -> Node {
    Node::Assign {
        target: name(target),
        value,
    }
}

pub fn assign_attr(object: Expr, attribute: &str, value: Expr) -> Node {
    Node::Assign {
        target: attr(object, attribute),
        value,
    }
}

pub fn ret(e: Expr) -> Node {
    Node::Return(Some(e))
}

pub fn def(func_name: &str, params: &[&str], body: Vec<Node>) -> Node {
    Node::FunctionDef {
        name: func_name.to_string(),
        params: params.iter().map(|p| (*p).to_string()).collect(),
        body: Rc::new(body),
    }
}

pub fn class(class_name: &str, bases: Vec<Expr>, body: Vec<Node>) -> Node {
    Node::ClassDef {
        name: class_name.to_string(),
        bases,
        body,
    }
}

pub fn if_(test: Expr, body: Vec<Node>) -> Node {
    Node::If {
        clauses: vec![IfClause { test, body }],
        or_else: vec![],
    }
}

pub fn if_else(test: Expr, body: Vec<Node>, or_else: Vec<Node>) -> Node {
    Node::If {
        clauses: vec![IfClause { test, body }],
        or_else,
    }
}

pub fn while_(test: Expr, body: Vec<Node>) -> Node {
    Node::While {
        test,
        body,
        or_else: vec![],
    }
}

pub fn while_else(test: Expr, body: Vec<Node>, or_else: Vec<Node>) -> Node {
    Node::While { test, body, or_else }
}

pub fn except(class_name: &str, bind: Option<&str>, body: Vec<Node>) -> ExceptClause {
    ExceptClause {
        class: name(class_name),
        name: bind.map(str::to_string),
        body,
    }
}

pub fn try_except(body: Vec<Node>, handlers: Vec<ExceptClause>) -> Node {
    Node::Try {
        body,
        handlers,
        or_else: vec![],
        finally: vec![],
    }
}

pub fn try_full(
    body: Vec<Node>,
    handlers: Vec<ExceptClause>,
    or_else: Vec<Node>,
    finally: Vec<Node>,
) -> Node {
    Node::Try {
        body,
        handlers,
        or_else,
        finally,
    }
}

/// `raise ClassName("message")`
pub fn raise(class_name: &str, message: &str) -> Node {
    Node::Raise {
        exc: call_name(class_name, vec![str_(message)]),
        cause: None,
    }
}

pub fn raise_expr(e: Expr) -> Node {
    Node::Raise { exc: e, cause: None }
}
