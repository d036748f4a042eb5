use std::rc::Rc;

use ahash::AHashMap;
use strum::{Display, IntoEnumIterator};

use crate::exceptions::{exc_err, ExcType, RunResult};
use crate::executor::Interpreter;
use crate::io::PrintWriter;
use crate::modules::ModuleLoader;
use crate::namespace::AttrDict;
use crate::value::{ClassDef, Value};

/// Enumerates every interpreter-native builtin function.
///
/// Uses the strum `Display` derive; variants serialize to their script-level
/// names (e.g. `Print` -> "print"). `ExcInit` is the shared constructor body
/// seeded into the builtin exception classes as `__init__`; it is not bound
/// as a top-level name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Builtins {
    Print,
    Str,
    Repr,
    Len,
    Pow,
    #[strum(serialize = "__init__")]
    ExcInit,
}

impl Builtins {
    /// Executes the builtin with the provided positional arguments.
    pub(crate) fn call<L: ModuleLoader, W: PrintWriter>(
        self,
        interp: &mut Interpreter<L, W>,
        args: Vec<Value>,
    ) -> RunResult<Value> {
        match self {
            Self::Print => {
                for (i, value) in args.iter().enumerate() {
                    if i > 0 {
                        interp.writer.stdout_push(' ');
                    }
                    interp.writer.stdout_write(&value.py_str());
                }
                interp.writer.stdout_push('\n');
                Ok(Value::None)
            }
            Self::Str => {
                let value = one_arg(interp, "str", args)?;
                Ok(Value::Str(value.py_str().into()))
            }
            Self::Repr => {
                let value = one_arg(interp, "repr", args)?;
                Ok(Value::Str(value.py_repr().into()))
            }
            Self::Len => {
                let value = one_arg(interp, "len", args)?;
                match value.py_len() {
                    Some(len) => Ok(Value::Int(len.into())),
                    None => {
                        exc_err!(interp, ExcType::TypeError; "object of type '{}' has no len()", value.py_type())
                    }
                }
            }
            Self::Pow => {
                let (base, exp) = two_args(interp, "pow", args)?;
                match base.py_pow(&exp) {
                    Some(result) => Ok(result),
                    None => {
                        exc_err!(interp, ExcType::SystemError;
                            "unsupported operand type(s) for **: '{}' and '{}'", base.py_type(), exp.py_type())
                    }
                }
            }
            Self::ExcInit => exception_init(interp, args),
        }
    }
}

fn one_arg<L: ModuleLoader, W: PrintWriter>(
    interp: &mut Interpreter<L, W>,
    name: &str,
    args: Vec<Value>,
) -> RunResult<Value> {
    match <[Value; 1]>::try_from(args) {
        Ok([value]) => Ok(value),
        Err(args) => {
            exc_err!(interp, ExcType::TypeError; "{name}() takes exactly one argument ({} given)", args.len())
        }
    }
}

fn two_args<L: ModuleLoader, W: PrintWriter>(
    interp: &mut Interpreter<L, W>,
    name: &str,
    args: Vec<Value>,
) -> RunResult<(Value, Value)> {
    match <[Value; 2]>::try_from(args) {
        Ok([first, second]) => Ok((first, second)),
        Err(args) => {
            exc_err!(interp, ExcType::TypeError; "{name}() takes exactly 2 arguments ({} given)", args.len())
        }
    }
}

/// `__init__` for the builtin exception classes: stores the optional message
/// argument on the instance.
fn exception_init<L: ModuleLoader, W: PrintWriter>(
    interp: &mut Interpreter<L, W>,
    args: Vec<Value>,
) -> RunResult<Value> {
    let mut args = args.into_iter();
    let Some(instance) = args.next() else {
        return exc_err!(interp, ExcType::TypeError; "__init__() takes exactly 2 arguments (0 given)");
    };
    let message = args.next().unwrap_or(Value::None);
    let extra = args.count();
    if extra > 0 {
        return exc_err!(interp, ExcType::TypeError; "__init__() takes exactly 2 arguments ({} given)", extra + 2);
    }
    if !instance.set_attr("message", message) {
        return exc_err!(interp, ExcType::TypeError;
            "'__init__' requires an exception instance, not '{}'", instance.py_type());
    }
    Ok(Value::None)
}

/// The canonical builtin exception classes, kept separately from the builtin
/// namespace so `raise_error` still works when a script shadows a class name.
#[derive(Debug)]
pub(crate) struct ExcClasses(AHashMap<ExcType, Value>);

impl ExcClasses {
    pub(crate) fn get(&self, kind: ExcType) -> Value {
        self.0
            .get(&kind)
            .cloned()
            .expect("every exception type is seeded at startup")
    }
}

/// Builds the builtin namespace dict: one entry per builtin function plus a
/// class value per exception type, with `BaseException` at the root of the
/// hierarchy.
pub(crate) fn builtin_namespace() -> (AttrDict, ExcClasses) {
    let dict = AttrDict::new();
    for builtin in [
        Builtins::Print,
        Builtins::Str,
        Builtins::Repr,
        Builtins::Len,
        Builtins::Pow,
    ] {
        dict.set(builtin.to_string(), Value::Builtin(builtin));
    }

    let base_dict = AttrDict::new();
    base_dict.set("__init__", Value::Builtin(Builtins::ExcInit));
    let base = Value::Class(Rc::new(ClassDef {
        name: ExcType::BaseException.name().to_string(),
        bases: vec![],
        dict: base_dict,
    }));

    let mut classes = AHashMap::new();
    dict.set(ExcType::BaseException.name(), base.clone());
    classes.insert(ExcType::BaseException, base.clone());
    for kind in ExcType::iter() {
        if kind == ExcType::BaseException {
            continue;
        }
        let class = Value::Class(Rc::new(ClassDef {
            name: kind.name().to_string(),
            bases: vec![base.clone()],
            dict: AttrDict::new(),
        }));
        dict.set(kind.name(), class.clone());
        classes.insert(kind, class);
    }
    (dict, ExcClasses(classes))
}
