use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use strum::{Display, EnumIter, IntoStaticStr};

use crate::value::Value;

/// Exception types the interpreter itself can raise.
///
/// Uses strum derives for automatic `Display` and `Into<&'static str>`
/// implementations; the string representation matches the variant name
/// exactly (e.g. `TypeError` -> "TypeError"). Each variant also exists as a
/// class value in the builtin namespace so scripts can catch and subclass
/// them; `EnumIter` drives that seeding.
#[allow(clippy::enum_variant_names)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum ExcType {
    BaseException,
    TypeError,
    NameError,
    AttributeError,
    SyntaxError,
    RuntimeError,
    AssertionError,
    NotImplementedError,
    SystemError,
    IndexError,
}

impl ExcType {
    /// The class name, matching what `Name("TypeError")` resolves to.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// An exception in flight: the exception value plus the names of the frames
/// that were active when it was raised, outermost first.
#[derive(Debug, Clone)]
pub struct Raised {
    pub value: Value,
    pub(crate) frames: Vec<Rc<str>>,
}

impl Raised {
    pub(crate) fn new(value: Value, frames: Vec<Rc<str>>) -> Self {
        Self { value, frames }
    }

    /// Returns the exception formatted as the language displays it to the
    /// user: `ClassName: message`, or just `ClassName` with no message.
    #[must_use]
    pub fn summary(&self) -> String {
        let class_name = match self.value.class_of() {
            Some(Value::Class(class)) => class.name.clone(),
            _ => self.value.py_type().into_owned(),
        };
        match self.value.exception_message() {
            Some(msg) if !msg.is_empty() => format!("{class_name}: {msg}"),
            _ => class_name,
        }
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Traceback (most recent call last):")?;
        for frame in &self.frames {
            writeln!(f, "  in {frame}")?;
        }
        f.write_str(&self.summary())
    }
}

/// Runtime error types that can occur during execution.
///
/// `Exc` is an exception raised by the interpreted program (or by the
/// evaluator on its behalf); `Internal` marks states the evaluator cannot
/// express as a language exception and indicates an interpreter bug.
#[derive(Debug)]
pub enum RunError {
    Exc(Raised),
    Internal(Cow<'static, str>),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exc(raised) => write!(f, "{raised}"),
            Self::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl From<Raised> for RunError {
    fn from(raised: Raised) -> Self {
        Self::Exc(raised)
    }
}

/// Result type for runtime operations.
pub type RunResult<T> = Result<T, RunError>;

/// Raises a language-level exception from inside the evaluator.
///
/// Expands to an `Err` carrying the constructed exception, so it can be
/// returned directly: `return exc_err!(self, ExcType::TypeError; "...")`.
macro_rules! exc_err {
    ($interp:expr, $exc_type:expr; $($fmt_args:tt)*) => {
        Err($interp.raise_error($exc_type, format!($($fmt_args)*)))
    };
}
pub(crate) use exc_err;
