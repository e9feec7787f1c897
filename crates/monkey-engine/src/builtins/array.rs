//! Array builtins.
//!
//! Arrays are immutable: `rest` and `push` return new arrays and leave
//! their argument untouched.

use std::rc::Rc;

use super::check_arity;
use crate::error::RuntimeError;
use crate::runtime::value::Value;

fn array_arg<'a>(name: &str, value: &'a Value) -> Result<&'a Rc<Vec<Value>>, RuntimeError> {
    match value {
        Value::Array(elements) => Ok(elements),
        other => Err(RuntimeError::Builtin(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        ))),
    }
}

/// first - the first element, or null for an empty array
pub fn first(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity(args, 1)?;
    let elements = array_arg("first", &args[0])?;
    Ok(elements.first().cloned().unwrap_or(Value::Null))
}

/// last - the last element, or null for an empty array
pub fn last(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity(args, 1)?;
    let elements = array_arg("last", &args[0])?;
    Ok(elements.last().cloned().unwrap_or(Value::Null))
}

/// rest - every element but the first, or null for an empty array
pub fn rest(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity(args, 1)?;
    let elements = array_arg("rest", &args[0])?;
    if elements.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::array(elements[1..].to_vec()))
}

/// push - a copy of the array with one element appended
pub fn push(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity(args, 2)?;
    let elements = array_arg("push", &args[0])?;
    let mut extended = Vec::with_capacity(elements.len() + 1);
    extended.extend(elements.iter().cloned());
    extended.push(args[1].clone());
    Ok(Value::array(extended))
}
