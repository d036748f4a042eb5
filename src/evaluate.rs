use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::exceptions::{exc_err, ExcType, RunResult};
use crate::executor::Interpreter;
use crate::expressions::Expr;
use crate::io::PrintWriter;
use crate::modules::ModuleLoader;
use crate::operators::{ArithOp, BinOpKind, BoolOp, CmpOp, UnaryOp};
use crate::value::{SliceValue, Value};

impl<L: ModuleLoader, W: PrintWriter> Interpreter<L, W> {
    /// Reduces an expression to a value against the current scope.
    pub(crate) fn evaluate(&mut self, expr: &Expr) -> RunResult<Value> {
        match expr {
            Expr::Constant(c) => Ok(c.to_value()),
            Expr::Name(name) => match self.current_scope().lookup(name) {
                Some(value) => Ok(value),
                None => exc_err!(self, ExcType::NameError; "name '{name}' is not defined"),
            },
            Expr::As { value, binding } => {
                let value = self.evaluate(value)?;
                let Expr::Name(name) = binding.as_ref() else {
                    return exc_err!(self, ExcType::SystemError; "can only bind to a name");
                };
                self.current_scope().bind(name.clone(), value.clone());
                Ok(value)
            }
            Expr::Unary { op, operand } => self.unary_op(*op, operand),
            Expr::Binary { op, left, right } => self.binary_op(*op, left, right),
            Expr::Call { func, args } => self.eval_call(func, args),
            Expr::Attribute { value, attr } => {
                let target = self.evaluate(value)?;
                match target.get_attr(attr) {
                    Some(value) => Ok(value),
                    None => exc_err!(self, ExcType::AttributeError;
                        "'{}' object has no attribute '{attr}'", target.py_type()),
                }
            }
            Expr::Subscript { value, index } => self.subscript(value, index),
            Expr::SliceDef { start, stop, stride } => {
                let start = self.evaluate(start)?;
                let stop = self.evaluate(stop)?;
                let stride = self.evaluate(stride)?;
                Ok(Value::Slice(Rc::new(SliceValue { start, stop, stride })))
            }
            Expr::ListDef(items) => {
                let values = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<RunResult<Vec<_>>>()?;
                Ok(Value::List(Rc::new(RefCell::new(values))))
            }
            Expr::TupleDef(items) => {
                let values = items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<RunResult<Vec<_>>>()?;
                Ok(Value::Tuple(values.into()))
            }
            Expr::TernOp { test, truthy, falsy } => {
                if self.evaluate(test)?.py_bool() {
                    self.evaluate(truthy)
                } else {
                    self.evaluate(falsy)
                }
            }
            Expr::Glob | Expr::RelativeImport { .. } => {
                exc_err!(self, ExcType::NotImplementedError; "import expressions are only valid in import statements")
            }
            Expr::Lambda => {
                exc_err!(self, ExcType::NotImplementedError; "lambda expressions are not supported")
            }
            Expr::Yield | Expr::YieldFrom => {
                exc_err!(self, ExcType::NotImplementedError; "generators are not supported")
            }
        }
    }

    fn unary_op(&mut self, op: UnaryOp, operand: &Expr) -> RunResult<Value> {
        let value = self.evaluate(operand)?;
        let result = match (op, &value) {
            (UnaryOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
            (UnaryOp::Pos, Value::Int(_) | Value::Float(_)) => Some(value.clone()),
            (UnaryOp::Neg, Value::Int(i)) => Some(Value::Int(-i)),
            (UnaryOp::Neg, Value::Float(v)) => Some(Value::Float(-v)),
            (UnaryOp::Invert, Value::Int(i)) => Some(Value::Int(-(i + BigInt::from(1)))),
            _ => None,
        };
        match result {
            Some(value) => Ok(value),
            None => exc_err!(self, ExcType::SystemError;
                "bad operand type for unary {op}: '{}'", value.py_type()),
        }
    }

    /// Binary dispatch. Boolean operators short-circuit and are handled
    /// before operand evaluation; everything else evaluates left then right.
    fn binary_op(&mut self, op: BinOpKind, left: &Expr, right: &Expr) -> RunResult<Value> {
        if let BinOpKind::Bool(bool_op) = op {
            return self.bool_op(bool_op, left, right);
        }
        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;
        match op {
            BinOpKind::Arith(arith) => self.arith_op(arith, l, r),
            BinOpKind::Bit(bit) => match l.py_bitwise(&r, bit) {
                Ok(Some(value)) => Ok(value),
                Ok(None) => self.operand_type_error(op, &l, &r),
                Err(err) => exc_err!(self, ExcType::SystemError; "{}", err.message()),
            },
            BinOpKind::Cmp(cmp) => self.cmp_op(cmp, &l, &r),
            BinOpKind::Bool(_) => unreachable!("boolean operators short-circuit above"),
        }
    }

    fn arith_op(&mut self, op: ArithOp, l: Value, r: Value) -> RunResult<Value> {
        let outcome = match op {
            ArithOp::Add => Ok(l.py_add(&r)),
            ArithOp::Sub => Ok(l.py_sub(&r)),
            ArithOp::Mult => l.py_mult(&r),
            ArithOp::Div => Ok(l.py_div(&r)),
            ArithOp::FloorDiv => l.py_floordiv(&r),
            ArithOp::Mod => l.py_mod(&r),
            ArithOp::Pow => Ok(l.py_pow(&r)),
        };
        match outcome {
            Ok(Some(value)) => Ok(value),
            Ok(None) => self.operand_type_error(BinOpKind::Arith(op), &l, &r),
            Err(err) => exc_err!(self, ExcType::SystemError; "{}", err.message()),
        }
    }

    fn operand_type_error(&mut self, op: BinOpKind, l: &Value, r: &Value) -> RunResult<Value> {
        exc_err!(self, ExcType::SystemError;
            "unsupported operand type(s) for {op}: '{}' and '{}'", l.py_type(), r.py_type())
    }

    fn cmp_op(&mut self, op: CmpOp, l: &Value, r: &Value) -> RunResult<Value> {
        let result = match op {
            CmpOp::Eq => l.py_eq(r),
            CmpOp::NotEq => l.py_eq(r).map(|eq| !eq),
            _ => l.py_cmp(r).map(|ordering| match op {
                CmpOp::Lt => ordering == Ordering::Less,
                CmpOp::LtE => ordering != Ordering::Greater,
                CmpOp::Gt => ordering == Ordering::Greater,
                CmpOp::GtE => ordering != Ordering::Less,
                CmpOp::Eq | CmpOp::NotEq => unreachable!("handled above"),
            }),
        };
        match result {
            Some(b) => Ok(Value::Bool(b)),
            None => exc_err!(self, ExcType::SystemError;
                "'{op}' not supported between instances of '{}' and '{}'", l.py_type(), r.py_type()),
        }
    }

    /// `and`/`or` return the selected operand unchanged; the unselected side
    /// is never evaluated.
    fn bool_op(&mut self, op: BoolOp, left: &Expr, right: &Expr) -> RunResult<Value> {
        let l = self.evaluate(left)?;
        let truthy = l.py_bool();
        match op {
            BoolOp::Or if truthy => Ok(l),
            BoolOp::And if !truthy => Ok(l),
            _ => self.evaluate(right),
        }
    }

    fn subscript(&mut self, value: &Expr, index: &Expr) -> RunResult<Value> {
        use num_traits::ToPrimitive;

        let container = self.evaluate(value)?;
        let idx = self.evaluate(index)?;
        match (&container, &idx) {
            (Value::List(items), Value::Int(i)) => {
                let item = i.to_usize().and_then(|i| items.borrow().get(i).cloned());
                match item {
                    Some(value) => Ok(value),
                    None => exc_err!(self, ExcType::IndexError; "list index out of range"),
                }
            }
            (Value::Tuple(items), Value::Int(i)) => {
                match i.to_usize().and_then(|i| items.get(i).cloned()) {
                    Some(value) => Ok(value),
                    None => exc_err!(self, ExcType::IndexError; "tuple index out of range"),
                }
            }
            (Value::Str(s), Value::Int(i)) => {
                match i.to_usize().and_then(|i| s.chars().nth(i)) {
                    Some(c) => Ok(Value::Str(c.to_string().into())),
                    None => exc_err!(self, ExcType::IndexError; "string index out of range"),
                }
            }
            (Value::List(_) | Value::Tuple(_) | Value::Str(_), _) => {
                exc_err!(self, ExcType::TypeError;
                    "{} indices must be integers, not '{}'", container.py_type(), idx.py_type())
            }
            _ => exc_err!(self, ExcType::TypeError;
                "'{}' object is not subscriptable", container.py_type()),
        }
    }

    /// Calls evaluate the callee (and, for attribute callees, the receiver)
    /// exactly once, then the arguments left to right.
    fn eval_call(&mut self, func: &Expr, args: &[Expr]) -> RunResult<Value> {
        let (callee, mut values) = match func {
            Expr::Attribute { value, attr } => {
                let receiver = self.evaluate(value)?;
                let Some(callee) = receiver.get_attr(attr) else {
                    return exc_err!(self, ExcType::AttributeError;
                        "'{}' object has no attribute '{attr}'", receiver.py_type());
                };
                // instances get the receiver prepended; module attributes do not
                if matches!(receiver, Value::Object(_)) {
                    (callee, vec![receiver])
                } else {
                    (callee, Vec::new())
                }
            }
            _ => (self.evaluate(func)?, Vec::new()),
        };
        for arg in args {
            values.push(self.evaluate(arg)?);
        }
        self.call_value(callee, values)
    }
}
