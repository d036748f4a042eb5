use std::process::ExitCode;
use std::rc::Rc;

use ahash::AHashMap;

use crate::builtins::{builtin_namespace, ExcClasses};
use crate::exceptions::{exc_err, ExcType, Raised, RunError, RunResult};
use crate::expressions::Node;
use crate::io::{PrintWriter, StdPrint};
use crate::modules::{MapLoader, ModuleLoader};
use crate::namespace::{AttrDict, Frame, Scope};
use crate::value::{ModuleData, Value};

/// The tree-walking evaluator and all of its process-wide state: the frame
/// stack, the module cache, the in-flight exception for bare `raise`, and
/// the canonical builtin exception classes.
///
/// Generic over the module loader (where imports come from) and the print
/// writer (where stdout goes), so embedders and tests can substitute both.
pub struct Interpreter<L, W> {
    pub(crate) frames: Vec<Frame>,
    pub(crate) modules: AHashMap<String, Value>,
    pub(crate) current_module: Value,
    pub(crate) current_exception: Value,
    pub(crate) exc_classes: ExcClasses,
    pub(crate) builtins: AttrDict,
    pub(crate) loader: L,
    pub(crate) writer: W,
    pub(crate) trace: bool,
}

impl<L: ModuleLoader, W: PrintWriter> Interpreter<L, W> {
    /// Creates an interpreter with an empty entry module. Statement tracing
    /// is enabled when the `TRACE` environment variable is set to anything.
    pub fn new(loader: L, writer: W) -> Self {
        let (builtins, exc_classes) = builtin_namespace();
        let main_dict = AttrDict::new();
        let current_module = Value::Module(Rc::new(ModuleData {
            name: "__main__".to_string(),
            path: "<main>".to_string(),
            dict: main_dict.clone(),
        }));
        let scope = Scope::module_scope(main_dict, builtins.clone());
        Self {
            frames: vec![Frame::new("<module>", scope)],
            modules: AHashMap::new(),
            current_module,
            current_exception: Value::None,
            exc_classes,
            builtins,
            loader,
            writer,
            trace: std::env::var_os("TRACE").is_some(),
        }
    }

    /// Overrides the `TRACE` environment variable.
    pub fn set_trace(&mut self, trace: bool) {
        self.trace = trace;
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Evaluates a parsed module body as the entry module.
    ///
    /// A fresh module (registered in the cache under `path`) becomes the
    /// root frame's scope; `return`, `break` and `continue` escaping to
    /// module level raise `SyntaxError`.
    pub fn run(&mut self, path: &str, code: &[Node]) -> RunResult<()> {
        let dict = AttrDict::new();
        let module = Value::Module(Rc::new(ModuleData {
            name: "__main__".to_string(),
            path: path.to_string(),
            dict: dict.clone(),
        }));
        self.modules.insert(path.to_string(), module.clone());
        self.current_module = module;
        self.frames = vec![Frame::new("<module>", Scope::module_scope(dict, self.builtins.clone()))];
        let exit = self.execute_block(code)?;
        self.reject_exit(exit)
    }

    /// The scope of the topmost frame. Cheap: every tier is a shared handle.
    pub(crate) fn current_scope(&self) -> Scope {
        self.frames
            .last()
            .expect("frame stack is never empty")
            .scope
            .clone()
    }

    pub(crate) fn frame_names(&self) -> Vec<Rc<str>> {
        self.frames.iter().map(|frame| frame.name.clone()).collect()
    }

    /// Constructs and raises a language-level exception on behalf of the
    /// evaluator.
    ///
    /// The class is resolved by name through the current scope chain, so a
    /// script that shadows `TypeError` sees its own class; the canonical
    /// class is the fallback. The instance bypasses `__init__` but carries
    /// the same observable `message` attribute.
    pub(crate) fn raise_error(&mut self, kind: ExcType, message: String) -> RunError {
        let class = match self.current_scope().lookup(kind.name()) {
            Some(class @ Value::Class(_)) => class,
            _ => self.exc_classes.get(kind),
        };
        let instance = Value::new_object(&class);
        let _ = instance.set_attr("message", Value::Str(message.into()));
        self.raise_value(instance)
    }

    /// The shared raise path: writes the exception's message line to stdout
    /// (observable, kept for compatibility with the original diagnostics),
    /// then returns the in-flight error.
    pub(crate) fn raise_value(&mut self, value: Value) -> RunError {
        let line = value.exception_message().unwrap_or_else(|| value.py_str());
        self.writer.stdout_write(&line);
        self.writer.stdout_push('\n');
        Raised::new(value, self.frame_names()).into()
    }

    /// Returns the module for `path`, loading and evaluating it on first
    /// use. Re-imports yield the same module value.
    pub(crate) fn import_module(&mut self, path: &str) -> RunResult<Value> {
        if let Some(module) = self.modules.get(path) {
            return Ok(module.clone());
        }
        let block = match self.loader.load(path) {
            Ok(block) => block,
            Err(err) => return exc_err!(self, ExcType::SystemError; "{err}"),
        };
        let dict = AttrDict::new();
        let module = Value::Module(Rc::new(ModuleData {
            name: path.to_string(),
            path: path.to_string(),
            dict: dict.clone(),
        }));
        // registered before evaluation so cyclic imports see the module
        self.modules.insert(path.to_string(), module.clone());
        let saved_module = std::mem::replace(&mut self.current_module, module.clone());
        let depth = self.frames.len();
        self.frames.push(Frame::new(
            "<module>",
            Scope::module_scope(dict, self.builtins.clone()),
        ));
        let result = self.execute_block(&block);
        self.frames.truncate(depth);
        self.current_module = saved_module;
        self.reject_exit(result?)?;
        Ok(module)
    }
}

/// Driver entry point: evaluates a parsed module with stdout printing and no
/// import sources. When the default exception handler fires the traceback is
/// written to stderr and the exit code is non-zero.
pub fn interpret(path: &str, code: &[Node]) -> ExitCode {
    let mut interp = Interpreter::new(MapLoader::new(), StdPrint);
    match interp.run(path, code) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
