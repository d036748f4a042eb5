#![doc = include_str!("../README.md")]
mod builtins;
mod evaluate;
mod exceptions;
mod executor;
mod expressions;
mod function;
mod io;
mod modules;
mod namespace;
mod operators;
mod run_frame;
mod value;

pub use crate::{
    builtins::Builtins,
    exceptions::{ExcType, Raised, RunError, RunResult},
    executor::{interpret, Interpreter},
    expressions::{Block, Const, ExceptClause, Expr, IfClause, Node},
    function::FunctionDef,
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    modules::{DiskLoader, LoadError, MapLoader, ModuleLoader},
    namespace::{ActiveScope, AttrDict, Frame, Scope},
    operators::{ArithOp, BinOpKind, BitOp, BoolOp, CmpOp, UnaryOp},
    value::{ClassDef, ModuleData, ObjectData, SliceValue, Value},
};
