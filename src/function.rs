use std::rc::Rc;

use crate::exceptions::{exc_err, ExcType, RunResult};
use crate::executor::Interpreter;
use crate::expressions::Block;
use crate::io::PrintWriter;
use crate::modules::ModuleLoader;
use crate::namespace::{AttrDict, Frame, Scope};
use crate::run_frame::FrameExit;
use crate::value::{ClassDef, Value};

/// A user-defined function.
///
/// Carries no captured environment: free names resolve against whatever
/// scope is active at call time, so a function body sees the caller's module
/// globals. Parameters are positional-only.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
}

impl<L: ModuleLoader, W: PrintWriter> Interpreter<L, W> {
    /// Uniform invocation across classes, builtins and user functions.
    pub(crate) fn call_value(&mut self, callee: Value, args: Vec<Value>) -> RunResult<Value> {
        match callee {
            Value::Class(class) => self.construct(&class, args),
            Value::Builtin(builtin) => builtin.call(self, args),
            Value::Function(function) => self.call_function(&function, args),
            other => {
                exc_err!(self, ExcType::SystemError; "don't know how to call {}", other.py_repr())
            }
        }
    }

    /// Calls a user function: exact arity, parameters bound by name into a
    /// fresh local dict, a frame pushed for the duration and restored on
    /// every path. Falling off the end returns `None`.
    fn call_function(&mut self, function: &Rc<FunctionDef>, args: Vec<Value>) -> RunResult<Value> {
        if args.len() != function.params.len() {
            return exc_err!(self, ExcType::TypeError;
                "{}() takes exactly {} arguments ({} given)",
                function.name, function.params.len(), args.len());
        }
        let local = AttrDict::new();
        for (param, value) in function.params.iter().zip(args) {
            local.set(param.clone(), value);
        }
        let caller = self.current_scope();
        let scope = Scope::function_scope(local, caller.module, caller.builtin);
        let depth = self.frames.len();
        self.frames.push(Frame::new(function.name.as_str(), scope));
        let result = self.execute_block(&function.body);
        self.frames.truncate(depth);
        match result? {
            None => Ok(Value::None),
            Some(FrameExit::Return(value)) => Ok(value),
            Some(FrameExit::Break) => {
                exc_err!(self, ExcType::SyntaxError; "'break' outside loop")
            }
            Some(FrameExit::Continue) => {
                exc_err!(self, ExcType::SyntaxError; "'continue' outside loop")
            }
        }
    }

    /// Class call: allocate the instance, run `__init__` from the class
    /// chain if present, and return the instance regardless of what
    /// `__init__` returned.
    fn construct(&mut self, class: &Rc<ClassDef>, args: Vec<Value>) -> RunResult<Value> {
        let class_value = Value::Class(class.clone());
        let instance = Value::new_object(&class_value);
        if let Some(init) = class.lookup("__init__") {
            let mut init_args = Vec::with_capacity(args.len() + 1);
            init_args.push(instance.clone());
            init_args.extend(args);
            self.call_value(init, init_args)?;
        }
        Ok(instance)
    }
}
