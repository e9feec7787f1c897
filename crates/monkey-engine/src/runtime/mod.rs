//! Monkey runtime types: values, functions, environments and operators.

pub mod environment;
pub mod function;
pub mod operators;
pub mod value;

pub use environment::{Env, Environment};
pub use function::{Builtin, Closure, CompiledFunction, Function, NativeFunction};
pub use value::{HashKey, HashPair, Value, ValueType};
