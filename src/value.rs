use std::borrow::Cow;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::builtins::Builtins;
use crate::function::FunctionDef;
use crate::namespace::AttrDict;
use crate::operators::BitOp;

/// A user-defined (or builtin exception) class.
///
/// `dict` is shared mutably: the class body executes into it, and later
/// attribute writes through any alias are visible to all instances.
#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Value>,
    pub dict: AttrDict,
}

impl ClassDef {
    /// Looks up `name` on this class or, failing that, its bases in
    /// left-to-right depth-first order. First match wins.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.dict.get(name).or_else(|| {
            self.bases.iter().find_map(|base| match base {
                Value::Class(class) => class.lookup(name),
                _ => None,
            })
        })
    }
}

/// An instance of a user-defined class.
#[derive(Debug)]
pub struct ObjectData {
    pub class: Value,
    pub dict: AttrDict,
}

/// A loaded module. The dict aliases the module's top-level scope.
#[derive(Debug)]
pub struct ModuleData {
    pub name: String,
    pub path: String,
    pub dict: AttrDict,
}

/// A three-value slice record. Unused positions hold `None`.
#[derive(Debug)]
pub struct SliceValue {
    pub start: Value,
    pub stop: Value,
    pub stride: Value,
}

/// Primary value type representing runtime objects.
///
/// Immediate values (Int, Bool, None, Float) are stored inline; everything
/// else sits behind an `Rc`, so cloning a `Value` is always cheap and clones
/// of a `List`, `Class`, `Object` or `Module` alias the same underlying
/// state.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(Rc<str>),
    Tuple(Rc<[Value]>),
    List(Rc<RefCell<Vec<Value>>>),
    Slice(Rc<SliceValue>),
    Class(Rc<ClassDef>),
    Object(Rc<ObjectData>),
    Function(Rc<FunctionDef>),
    Builtin(Builtins),
    Module(Rc<ModuleData>),
}

/// Failure modes of the numeric protocol that are not type mismatches.
///
/// The evaluation site converts these into `SystemError` exceptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumericError {
    ZeroDivision,
    NegativeShift,
    ShiftTooLarge,
    RepeatTooLarge,
}

impl NumericError {
    pub(crate) fn message(self) -> &'static str {
        match self {
            Self::ZeroDivision => "integer division or modulo by zero",
            Self::NegativeShift => "negative shift count",
            Self::ShiftTooLarge => "shift count too large",
            Self::RepeatTooLarge => "repeat count too large",
        }
    }
}

fn big_to_f64(i: &BigInt) -> f64 {
    i.to_f64().unwrap_or_else(|| {
        if i.is_negative() {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }
    })
}

fn fmt_float(v: f64) -> String {
    let mut s = v.to_string();
    if v.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Renders a string the way the language quotes it: single quotes unless the
/// content contains one (and no double quote).
pub(crate) fn string_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn repeat_count(n: &BigInt) -> Result<usize, NumericError> {
    if n.is_negative() {
        return Ok(0);
    }
    n.to_usize().ok_or(NumericError::RepeatTooLarge)
}

impl Value {
    /// Allocates a fresh instance of `class` with an empty attribute dict.
    #[must_use]
    pub fn new_object(class: &Value) -> Value {
        Value::Object(Rc::new(ObjectData {
            class: class.clone(),
            dict: AttrDict::new(),
        }))
    }

    /// The canonical type name, used in error messages.
    #[must_use]
    pub fn py_type(&self) -> Cow<'static, str> {
        match self {
            Self::None => "NoneType".into(),
            Self::Bool(_) => "bool".into(),
            Self::Int(_) => "int".into(),
            Self::Float(_) => "float".into(),
            Self::Str(_) => "str".into(),
            Self::Tuple(_) => "tuple".into(),
            Self::List(_) => "list".into(),
            Self::Slice(_) => "slice".into(),
            Self::Class(_) => "type".into(),
            Self::Object(data) => match &data.class {
                Value::Class(class) => class.name.clone().into(),
                _ => "object".into(),
            },
            Self::Function(_) => "function".into(),
            Self::Builtin(_) => "builtin_function_or_method".into(),
            Self::Module(_) => "module".into(),
        }
    }

    /// Truthiness: false for `None`, `False`, zero, and empty
    /// string/tuple/list; true otherwise.
    #[must_use]
    pub fn py_bool(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => !i.is_zero(),
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::List(items) => !items.borrow().is_empty(),
            _ => true,
        }
    }

    /// Best-effort textual form, used by `print`, `str` and error messages.
    #[must_use]
    pub fn py_str(&self) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            _ => self.py_repr(),
        }
    }

    /// The quoted/structured form, used inside containers and by `repr`.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut out = String::new();
        let mut seen = Vec::new();
        self.repr_into(&mut out, &mut seen);
        out
    }

    fn repr_into(&self, out: &mut String, seen: &mut Vec<usize>) {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(i) => out.push_str(&i.to_string()),
            Self::Float(v) => out.push_str(&fmt_float(*v)),
            Self::Str(s) => out.push_str(&string_repr(s)),
            Self::Tuple(items) => {
                let id = items.as_ptr() as usize;
                if seen.contains(&id) {
                    out.push_str("(...)");
                    return;
                }
                seen.push(id);
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, seen);
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
                seen.pop();
            }
            Self::List(items) => {
                let id = Rc::as_ptr(items) as usize;
                if seen.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(id);
                // snapshot so the borrow is not held while recursing
                let snapshot = items.borrow().clone();
                out.push('[');
                for (i, item) in snapshot.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, seen);
                }
                out.push(']');
                seen.pop();
            }
            Self::Slice(slice) => {
                out.push_str("slice(");
                slice.start.repr_into(out, seen);
                out.push_str(", ");
                slice.stop.repr_into(out, seen);
                out.push_str(", ");
                slice.stride.repr_into(out, seen);
                out.push(')');
            }
            Self::Class(class) => {
                out.push_str("<class '");
                out.push_str(&class.name);
                out.push_str("'>");
            }
            Self::Object(_) => {
                out.push('<');
                out.push_str(&self.py_type());
                out.push_str(" object>");
            }
            Self::Function(func) => {
                out.push_str("<function ");
                out.push_str(&func.name);
                out.push('>');
            }
            Self::Builtin(builtin) => {
                out.push_str("<built-in function ");
                out.push_str(&builtin.to_string());
                out.push('>');
            }
            Self::Module(module) => {
                out.push_str("<module '");
                out.push_str(&module.name);
                out.push_str("'>");
            }
        }
    }

    /// Number of elements for the sized types, `None` otherwise.
    #[must_use]
    pub fn py_len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::Tuple(items) => Some(items.len()),
            Self::List(items) => Some(items.borrow().len()),
            _ => None,
        }
    }

    /// The class of an instance; `None` for every non-instance value.
    #[must_use]
    pub fn class_of(&self) -> Option<Value> {
        match self {
            Self::Object(data) => Some(data.class.clone()),
            _ => None,
        }
    }

    /// Subclass test between two class values: reflexive, then
    /// left-to-right depth-first over the bases.
    #[must_use]
    pub fn is_subclass(&self, base: &Value) -> bool {
        match (self, base) {
            (Self::Class(class), Self::Class(target)) => class_is_subclass(class, target),
            _ => false,
        }
    }

    /// Attribute lookup. Instances consult their own dict, then the class
    /// chain; classes their dict and bases; modules their dict. Every other
    /// value has no attributes.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        match self {
            Self::Object(data) => data.dict.get(name).or_else(|| match &data.class {
                Value::Class(class) => class.lookup(name),
                _ => None,
            }),
            Self::Class(class) => class.lookup(name),
            Self::Module(module) => module.dict.get(name),
            _ => None,
        }
    }

    /// Writes an attribute into the target's dict. Returns false for values
    /// that reject attribute assignment.
    #[must_use]
    pub fn set_attr(&self, name: &str, value: Value) -> bool {
        match self {
            Self::Object(data) => {
                data.dict.set(name, value);
                true
            }
            Self::Class(class) => {
                class.dict.set(name, value);
                true
            }
            Self::Module(module) => {
                module.dict.set(name, value);
                true
            }
            _ => false,
        }
    }

    /// The `message` attribute of an exception instance, stringified.
    #[must_use]
    pub fn exception_message(&self) -> Option<String> {
        match self.get_attr("message") {
            Some(Value::None) | None => None,
            Some(msg) => Some(msg.py_str()),
        }
    }

    pub(crate) fn py_add(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a + b)),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a + b)),
            (Self::Int(a), Self::Float(b)) => Some(Self::Float(big_to_f64(a) + b)),
            (Self::Float(a), Self::Int(b)) => Some(Self::Float(a + big_to_f64(b))),
            (Self::Str(a), Self::Str(b)) => Some(Self::Str(format!("{a}{b}").into())),
            _ => None,
        }
    }

    pub(crate) fn py_sub(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Int(a - b)),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a - b)),
            (Self::Int(a), Self::Float(b)) => Some(Self::Float(big_to_f64(a) - b)),
            (Self::Float(a), Self::Int(b)) => Some(Self::Float(a - big_to_f64(b))),
            _ => None,
        }
    }

    pub(crate) fn py_mult(&self, other: &Value) -> Result<Option<Value>, NumericError> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Ok(Some(Self::Int(a * b))),
            (Self::Float(a), Self::Float(b)) => Ok(Some(Self::Float(a * b))),
            (Self::Int(a), Self::Float(b)) => Ok(Some(Self::Float(big_to_f64(a) * b))),
            (Self::Float(a), Self::Int(b)) => Ok(Some(Self::Float(a * big_to_f64(b)))),
            // string repetition, factor taken from the Int operand
            (Self::Str(s), Self::Int(n)) | (Self::Int(n), Self::Str(s)) => {
                let count = repeat_count(n)?;
                Ok(Some(Self::Str(s.repeat(count).into())))
            }
            _ => Ok(None),
        }
    }

    /// True division: always a float.
    pub(crate) fn py_div(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(Self::Float(big_to_f64(a) / big_to_f64(b))),
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a / b)),
            (Self::Int(a), Self::Float(b)) => Some(Self::Float(big_to_f64(a) / b)),
            (Self::Float(a), Self::Int(b)) => Some(Self::Float(a / big_to_f64(b))),
            _ => None,
        }
    }

    pub(crate) fn py_floordiv(&self, other: &Value) -> Result<Option<Value>, NumericError> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                if b.is_zero() {
                    Err(NumericError::ZeroDivision)
                } else {
                    Ok(Some(Self::Int(a.div_floor(b))))
                }
            }
            (Self::Float(a), Self::Float(b)) => Ok(Some(Self::Float((a / b).floor()))),
            (Self::Int(a), Self::Float(b)) => Ok(Some(Self::Float((big_to_f64(a) / b).floor()))),
            (Self::Float(a), Self::Int(b)) => Ok(Some(Self::Float((a / big_to_f64(b)).floor()))),
            _ => Ok(None),
        }
    }

    /// Modulo with the divisor's sign, for floats `a - b * floor(a / b)`.
    pub(crate) fn py_mod(&self, other: &Value) -> Result<Option<Value>, NumericError> {
        fn float_mod(a: f64, b: f64) -> f64 {
            a - b * (a / b).floor()
        }
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                if b.is_zero() {
                    Err(NumericError::ZeroDivision)
                } else {
                    Ok(Some(Self::Int(a.mod_floor(b))))
                }
            }
            (Self::Float(a), Self::Float(b)) => Ok(Some(Self::Float(float_mod(*a, *b)))),
            (Self::Int(a), Self::Float(b)) => Ok(Some(Self::Float(float_mod(big_to_f64(a), *b)))),
            (Self::Float(a), Self::Int(b)) => Ok(Some(Self::Float(float_mod(*a, big_to_f64(b))))),
            _ => Ok(None),
        }
    }

    /// Exponentiation: Int base and non-negative Int exponent stay Int,
    /// everything else goes through float `powf`.
    pub(crate) fn py_pow(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => {
                if b.is_negative() {
                    Some(Self::Float(big_to_f64(a).powf(big_to_f64(b))))
                } else if let Some(exp) = b.to_usize() {
                    Some(Self::Int(num_traits::pow(a.clone(), exp)))
                } else {
                    Some(Self::Float(big_to_f64(a).powf(big_to_f64(b))))
                }
            }
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(a.powf(*b))),
            (Self::Int(a), Self::Float(b)) => Some(Self::Float(big_to_f64(a).powf(*b))),
            (Self::Float(a), Self::Int(b)) => Some(Self::Float(a.powf(big_to_f64(b)))),
            _ => None,
        }
    }

    /// Bitwise operations require two integers; the shift count is taken as
    /// a machine integer.
    pub(crate) fn py_bitwise(&self, other: &Value, op: BitOp) -> Result<Option<Value>, NumericError> {
        let (Self::Int(a), Self::Int(b)) = (self, other) else {
            return Ok(None);
        };
        let result = match op {
            BitOp::And => a & b,
            BitOp::Or => a | b,
            BitOp::Xor => a ^ b,
            BitOp::LShift => {
                if b.is_negative() {
                    return Err(NumericError::NegativeShift);
                }
                let count = b.to_u32().ok_or(NumericError::ShiftTooLarge)?;
                a.clone() << count
            }
            BitOp::RShift => {
                if b.is_negative() {
                    return Err(NumericError::NegativeShift);
                }
                match b.to_usize() {
                    Some(count) => a.clone() >> count,
                    // shifting out every bit leaves the sign
                    None if a.is_negative() => BigInt::from(-1),
                    None => BigInt::from(0),
                }
            }
        };
        Ok(Some(Self::Int(result)))
    }

    /// Equality where defined: numbers (cross-promoted), strings, bools, and
    /// `None`-aware comparison. `None` for unsupported combinations.
    #[allow(clippy::float_cmp)]
    pub(crate) fn py_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Self::None, Self::None) => Some(true),
            (Self::None, _) | (_, Self::None) => Some(false),
            (Self::Int(a), Self::Int(b)) => Some(a == b),
            (Self::Float(a), Self::Float(b)) => Some(a == b),
            (Self::Int(a), Self::Float(b)) => Some(big_to_f64(a) == *b),
            (Self::Float(a), Self::Int(b)) => Some(*a == big_to_f64(b)),
            (Self::Str(a), Self::Str(b)) => Some(a == b),
            (Self::Bool(a), Self::Bool(b)) => Some(a == b),
            _ => None,
        }
    }

    /// Ordering where defined: numbers (cross-promoted), strings
    /// lexicographically, bools with `False < True`.
    pub(crate) fn py_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Int(a), Self::Float(b)) => big_to_f64(a).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&big_to_f64(b)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn class_is_subclass(class: &Rc<ClassDef>, target: &Rc<ClassDef>) -> bool {
    if Rc::ptr_eq(class, target) {
        return true;
    }
    class
        .bases
        .iter()
        .any(|base| matches!(base, Value::Class(parent) if class_is_subclass(parent, target)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Int(i.into())
    }

    fn class(name: &str, bases: Vec<Value>) -> Value {
        Value::Class(Rc::new(ClassDef {
            name: name.to_string(),
            bases,
            dict: AttrDict::new(),
        }))
    }

    #[test]
    fn truthiness_table() {
        assert!(!Value::None.py_bool());
        assert!(!Value::Bool(false).py_bool());
        assert!(!int(0).py_bool());
        assert!(!Value::Float(0.0).py_bool());
        assert!(!Value::Str("".into()).py_bool());
        assert!(!Value::List(Rc::new(RefCell::new(vec![]))).py_bool());
        assert!(Value::Bool(true).py_bool());
        assert!(int(-3).py_bool());
        assert!(Value::Str("x".into()).py_bool());
    }

    #[test]
    fn int_float_addition_promotes() {
        let result = int(2).py_add(&Value::Float(0.5)).unwrap();
        assert!(matches!(result, Value::Float(v) if v == 2.5));
    }

    #[test]
    fn true_division_yields_float() {
        let result = int(1).py_div(&int(2)).unwrap();
        assert!(matches!(result, Value::Float(v) if v == 0.5));
        let floored = int(1).py_floordiv(&int(2)).unwrap().unwrap();
        assert!(matches!(floored, Value::Int(i) if i == 0.into()));
    }

    #[test]
    fn floor_division_rounds_down() {
        let result = int(-7).py_floordiv(&int(2)).unwrap().unwrap();
        assert!(matches!(result, Value::Int(i) if i == (-4).into()));
        let modulo = int(-7).py_mod(&int(2)).unwrap().unwrap();
        assert!(matches!(modulo, Value::Int(i) if i == 1.into()));
    }

    #[test]
    fn string_repetition_both_sides() {
        let ab = Value::Str("ab".into());
        let twice = ab.py_mult(&int(2)).unwrap().unwrap();
        assert!(matches!(&twice, Value::Str(s) if &**s == "abab"));
        let swapped = int(2).py_mult(&ab).unwrap().unwrap();
        assert!(matches!(&swapped, Value::Str(s) if &**s == "abab"));
        let negative = ab.py_mult(&int(-1)).unwrap().unwrap();
        assert!(matches!(&negative, Value::Str(s) if s.is_empty()));
    }

    #[test]
    fn subclass_is_reflexive_and_depth_first() {
        let base = class("Base", vec![]);
        let left = class("Left", vec![base.clone()]);
        let right = class("Right", vec![]);
        let child = class("Child", vec![left.clone(), right.clone()]);
        assert!(child.is_subclass(&child));
        assert!(child.is_subclass(&left));
        assert!(child.is_subclass(&base));
        assert!(child.is_subclass(&right));
        assert!(!base.is_subclass(&child));
        assert!(!int(1).is_subclass(&base));
    }

    #[test]
    fn class_lookup_first_match_wins() {
        let grandparent = AttrDict::new();
        grandparent.set("x", int(1));
        let gp = Value::Class(Rc::new(ClassDef {
            name: "GP".into(),
            bases: vec![],
            dict: grandparent,
        }));
        let left = Value::Class(Rc::new(ClassDef {
            name: "L".into(),
            bases: vec![gp],
            dict: AttrDict::new(),
        }));
        let right_dict = AttrDict::new();
        right_dict.set("x", int(2));
        let right = Value::Class(Rc::new(ClassDef {
            name: "R".into(),
            bases: vec![],
            dict: right_dict,
        }));
        let Value::Class(child) = class("C", vec![left, right]) else {
            unreachable!()
        };
        // depth-first through the left branch finds the grandparent's binding
        assert!(matches!(child.lookup("x"), Some(Value::Int(i)) if i == 1.into()));
    }

    #[test]
    fn repr_handles_nesting_and_cycles() {
        let inner = Value::List(Rc::new(RefCell::new(vec![int(1), int(2)])));
        let tuple: Value = Value::Tuple(vec![inner.clone(), Value::Str("a".into())].into());
        assert_eq!(tuple.py_repr(), "([1, 2], 'a')");

        let cyclic = Rc::new(RefCell::new(vec![int(0)]));
        cyclic.borrow_mut().push(Value::List(cyclic.clone()));
        assert_eq!(Value::List(cyclic).py_repr(), "[0, [...]]");
    }

    #[test]
    fn none_aware_equality() {
        assert_eq!(Value::None.py_eq(&Value::None), Some(true));
        assert_eq!(int(1).py_eq(&Value::None), Some(false));
        assert_eq!(Value::None.py_eq(&int(1)), Some(false));
        assert_eq!(int(1).py_eq(&Value::Float(1.0)), Some(true));
        assert!(int(1).py_eq(&Value::Str("1".into())).is_none());
    }
}
