use std::rc::Rc;

use crate::exceptions::{exc_err, ExcType, Raised, RunError, RunResult};
use crate::executor::Interpreter;
use crate::expressions::{ExceptClause, Expr, IfClause, Node};
use crate::function::FunctionDef;
use crate::io::PrintWriter;
use crate::modules::ModuleLoader;
use crate::namespace::{ActiveScope, AttrDict};
use crate::value::{ClassDef, Value};

/// How a block stopped early. `Raised` travels in the error channel of
/// [`RunResult`], so together these cover every non-local exit.
#[derive(Debug)]
pub(crate) enum FrameExit {
    Return(Value),
    Break,
    Continue,
}

impl<L: ModuleLoader, W: PrintWriter> Interpreter<L, W> {
    /// Executes statements in sequence until one exits the block.
    pub(crate) fn execute_block(&mut self, nodes: &[Node]) -> RunResult<Option<FrameExit>> {
        for node in nodes {
            if self.trace {
                eprintln!("*** Evaluating: {node}");
            }
            if let Some(exit) = self.execute_node(node)? {
                return Ok(Some(exit));
            }
        }
        Ok(None)
    }

    fn execute_node(&mut self, node: &Node) -> RunResult<Option<FrameExit>> {
        match node {
            Node::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(None)
            }
            Node::Assign { target, value } => self.assign(target, value),
            Node::If { clauses, or_else } => self.if_(clauses, or_else),
            Node::While { test, body, or_else } => self.while_(test, body, or_else),
            Node::Try {
                body,
                handlers,
                or_else,
                finally,
            } => self.try_(body, handlers, or_else, finally),
            Node::Raise { exc, .. } => self.raise(exc),
            Node::Reraise => self.reraise(),
            Node::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };
                Ok(Some(FrameExit::Return(value)))
            }
            Node::Break => Ok(Some(FrameExit::Break)),
            Node::Continue => Ok(Some(FrameExit::Continue)),
            Node::Pass => Ok(None),
            Node::Assert { test, msg } => self.assert_(test, msg.as_ref()),
            Node::Del(target) => self.delete(target),
            Node::FunctionDef { name, params, body } => {
                let function = Value::Function(Rc::new(FunctionDef {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                }));
                self.current_scope().bind(name.clone(), function);
                Ok(None)
            }
            Node::ClassDef { name, bases, body } => self.class_def(name, bases, body),
            Node::Import(items) => self.import(items),
            Node::ImportFrom { source, names } => self.import_from(source, names),
            Node::For => {
                exc_err!(self, ExcType::NotImplementedError; "'for' statements are not supported")
            }
            Node::With => {
                exc_err!(self, ExcType::NotImplementedError; "'with' statements are not supported")
            }
            Node::Global => {
                exc_err!(self, ExcType::NotImplementedError; "'global' declarations are not supported")
            }
            Node::Nonlocal => {
                exc_err!(self, ExcType::NotImplementedError; "'nonlocal' declarations are not supported")
            }
        }
    }

    /// Converts a stray exit at a non-function, non-loop boundary into the
    /// runtime `SyntaxError` the default control-flow handlers raise.
    pub(crate) fn reject_exit(&mut self, exit: Option<FrameExit>) -> RunResult<()> {
        match exit {
            None => Ok(()),
            Some(FrameExit::Return(_)) => {
                Err(self.raise_error(ExcType::SyntaxError, "'return' outside function".to_string()))
            }
            Some(FrameExit::Break) => {
                Err(self.raise_error(ExcType::SyntaxError, "'break' outside loop".to_string()))
            }
            Some(FrameExit::Continue) => {
                Err(self.raise_error(ExcType::SyntaxError, "'continue' outside loop".to_string()))
            }
        }
    }

    fn assign(&mut self, target: &Expr, value: &Expr) -> RunResult<Option<FrameExit>> {
        match target {
            Expr::Name(name) => {
                let value = self.evaluate(value)?;
                self.current_scope().bind(name.clone(), value);
                Ok(None)
            }
            Expr::Attribute { value: target, attr } => {
                let receiver = self.evaluate(target)?;
                let value = self.evaluate(value)?;
                if receiver.set_attr(attr, value) {
                    Ok(None)
                } else {
                    exc_err!(self, ExcType::AttributeError;
                        "'{}' object has no attribute '{attr}'", receiver.py_type())
                }
            }
            _ => exc_err!(self, ExcType::SyntaxError; "invalid assignment target"),
        }
    }

    fn delete(&mut self, target: &Expr) -> RunResult<Option<FrameExit>> {
        let Expr::Name(name) = target else {
            return exc_err!(self, ExcType::SyntaxError; "invalid delete target");
        };
        if self.current_scope().unbind(name) {
            Ok(None)
        } else {
            exc_err!(self, ExcType::NameError; "name '{name}' is not defined")
        }
    }

    fn assert_(&mut self, test: &Expr, msg: Option<&Expr>) -> RunResult<Option<FrameExit>> {
        if self.evaluate(test)?.py_bool() {
            return Ok(None);
        }
        let message = match msg {
            Some(expr) => self.evaluate(expr)?.py_str(),
            None => String::new(),
        };
        Err(self.raise_error(ExcType::AssertionError, message))
    }

    fn raise(&mut self, exc: &Expr) -> RunResult<Option<FrameExit>> {
        let value = self.evaluate(exc)?;
        let base = self.exc_classes.get(ExcType::BaseException);
        let is_exception = value.class_of().is_some_and(|class| class.is_subclass(&base));
        if !is_exception {
            return exc_err!(self, ExcType::TypeError; "exceptions must derive from BaseException");
        }
        Err(self.raise_value(value))
    }

    fn reraise(&mut self) -> RunResult<Option<FrameExit>> {
        if matches!(self.current_exception, Value::None) {
            return exc_err!(self, ExcType::RuntimeError; "No active exception to reraise");
        }
        let value = self.current_exception.clone();
        Err(Raised::new(value, self.frame_names()).into())
    }

    fn if_(&mut self, clauses: &[IfClause], or_else: &[Node]) -> RunResult<Option<FrameExit>> {
        for clause in clauses {
            if self.evaluate(&clause.test)?.py_bool() {
                return self.execute_block(&clause.body);
            }
        }
        self.execute_block(or_else)
    }

    /// Each loop consumes its own break/continue, so exits from a nested
    /// loop body never leak into the enclosing one. The `else` block runs
    /// when the condition goes falsy and may itself break or continue the
    /// loop.
    fn while_(&mut self, test: &Expr, body: &[Node], or_else: &[Node]) -> RunResult<Option<FrameExit>> {
        loop {
            if self.evaluate(test)?.py_bool() {
                match self.execute_block(body)? {
                    None | Some(FrameExit::Continue) => {}
                    Some(FrameExit::Break) => break,
                    Some(exit @ FrameExit::Return(_)) => return Ok(Some(exit)),
                }
            } else {
                match self.execute_block(or_else)? {
                    None | Some(FrameExit::Break) => break,
                    Some(FrameExit::Continue) => {}
                    Some(exit @ FrameExit::Return(_)) => return Ok(Some(exit)),
                }
            }
        }
        Ok(None)
    }

    /// The `try` machinery. The frame depth is snapshotted at entry and
    /// restored on the exception path; the `finally` block runs exactly once
    /// on every way out, and its own exits supersede the pending outcome.
    fn try_(
        &mut self,
        body: &[Node],
        handlers: &[ExceptClause],
        or_else: &[Node],
        finally: &[Node],
    ) -> RunResult<Option<FrameExit>> {
        let depth = self.frames.len();
        let outcome = match self.execute_block(body) {
            // no exception: the else block runs, unprotected by our handlers
            Ok(None) => self.execute_block(or_else),
            Ok(exit) => Ok(exit),
            Err(RunError::Exc(raised)) => {
                self.frames.truncate(depth);
                self.handle_except(raised, handlers)
            }
            Err(internal) => {
                self.frames.truncate(depth);
                Err(internal)
            }
        };
        match self.execute_block(finally)? {
            Some(exit) => Ok(Some(exit)),
            None => outcome,
        }
    }

    /// Clause search: first clause whose class the exception's class is a
    /// subclass of wins; at most one handler body runs. While it runs,
    /// `current_exception` is set for bare `raise`.
    fn handle_except(
        &mut self,
        raised: Raised,
        handlers: &[ExceptClause],
    ) -> RunResult<Option<FrameExit>> {
        let Some(exc_class) = raised.value.class_of() else {
            return Err(raised.into());
        };
        for handler in handlers {
            let class_value = self.evaluate(&handler.class)?;
            if !matches!(class_value, Value::Class(_)) {
                return exc_err!(self, ExcType::TypeError;
                    "catching classes that do not inherit from BaseException is not allowed");
            }
            if exc_class.is_subclass(&class_value) {
                if let Some(name) = &handler.name {
                    self.current_scope().bind(name.clone(), raised.value.clone());
                }
                let saved = std::mem::replace(&mut self.current_exception, raised.value.clone());
                let result = self.execute_block(&handler.body);
                self.current_exception = saved;
                return result;
            }
        }
        Err(raised.into())
    }

    /// Class bodies execute with the frame's local dict swapped for the
    /// future class dict; the surrounding scope is restored on every path.
    fn class_def(&mut self, name: &str, bases: &[Expr], body: &[Node]) -> RunResult<Option<FrameExit>> {
        let base_values = bases
            .iter()
            .map(|base| self.evaluate(base))
            .collect::<RunResult<Vec<_>>>()?;
        let class_dict = AttrDict::new();
        let saved_scope = self.current_scope();
        {
            let frame = self.frames.last_mut().expect("frame stack is never empty");
            frame.scope.local = class_dict.clone();
            frame.scope.active = ActiveScope::Local;
        }
        let result = self.execute_block(body);
        self.frames.last_mut().expect("frame stack is never empty").scope = saved_scope;
        self.reject_exit(result?)?;
        let class = Value::Class(Rc::new(ClassDef {
            name: name.to_string(),
            bases: base_values,
            dict: class_dict,
        }));
        self.current_scope().bind(name.to_string(), class);
        Ok(None)
    }

    fn import(&mut self, items: &[Expr]) -> RunResult<Option<FrameExit>> {
        for item in items {
            let (path, alias) = match item {
                Expr::Name(path) => (path.clone(), path.clone()),
                Expr::As { value, binding } => match (value.as_ref(), binding.as_ref()) {
                    (Expr::Name(path), Expr::Name(alias)) => (path.clone(), alias.clone()),
                    _ => return exc_err!(self, ExcType::SystemError; "malformed import item"),
                },
                _ => return exc_err!(self, ExcType::SystemError; "malformed import item"),
            };
            let module = self.import_module(&path)?;
            self.current_scope().bind(alias, module);
        }
        Ok(None)
    }

    /// Glob import: copy every binding of the module's dict into the current
    /// scope. Selective imports are not supported.
    fn import_from(&mut self, source: &Expr, names: &[Expr]) -> RunResult<Option<FrameExit>> {
        let path = match source {
            Expr::RelativeImport { path, .. } | Expr::Name(path) => path.clone(),
            _ => return exc_err!(self, ExcType::SystemError; "malformed import source"),
        };
        if names.is_empty() || !names.iter().all(|name| matches!(name, Expr::Glob)) {
            return exc_err!(self, ExcType::NotImplementedError; "only glob imports are supported");
        }
        let module = self.import_module(&path)?;
        let Value::Module(data) = &module else {
            return Err(RunError::Internal("module cache holds a non-module value".into()));
        };
        let dict = data.dict.clone();
        self.current_scope().bind_all(&dict);
        Ok(None)
    }
}
