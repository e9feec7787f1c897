//! Function representations for both execution backends.

use std::fmt;
use std::rc::Rc;

use super::environment::Env;
use super::value::Value;
use crate::ast::{BlockStatement, Identifier};
use crate::compiler::Instructions;
use crate::error::RuntimeError;

/// A function value created by the tree-walking evaluator.
///
/// It closes over the environment it was created in.
#[derive(Clone)]
pub struct Function {
    /// The parameter names
    pub parameters: Vec<Identifier>,
    /// The function body
    pub body: BlockStatement,
    /// The defining environment
    pub env: Env,
}

impl Function {
    /// Returns the arity (number of parameters).
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

// The environment may contain this function, so it is left out.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        write!(f, "fn({}) {{\n{}\n}}", params.join(", "), self.body)
    }
}

/// A native (Rust) function.
pub type NativeFunction = fn(&[Value]) -> Result<Value, RuntimeError>;

/// A builtin function: a name and its native implementation.
#[derive(Clone, Copy)]
pub struct Builtin {
    /// The name the builtin is bound to
    pub name: &'static str,
    /// The implementation
    pub func: NativeFunction,
}

impl Builtin {
    /// Calls the builtin.
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// A function body compiled to bytecode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFunction {
    /// The function's own instruction stream
    pub instructions: Instructions,
    /// Local slots to reserve, parameters included
    pub num_locals: usize,
    /// Declared parameter count
    pub num_parameters: usize,
}

/// A compiled function paired with the values it captured.
#[derive(Debug, Clone)]
pub struct Closure {
    /// The function being closed over
    pub func: Rc<CompiledFunction>,
    /// Captured values, in the compiler's free-symbol order
    pub free: Vec<Value>,
}

impl Closure {
    /// Wraps a function that captures nothing.
    pub fn new(func: Rc<CompiledFunction>) -> Self {
        Self {
            func,
            free: Vec::new(),
        }
    }
}
