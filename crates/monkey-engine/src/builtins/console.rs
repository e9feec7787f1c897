//! Output builtins.

use crate::error::RuntimeError;
use crate::runtime::value::Value;

/// puts - prints each argument on its own line to stdout
pub fn puts(args: &[Value]) -> Result<Value, RuntimeError> {
    for arg in args {
        println!("{}", arg);
    }
    Ok(Value::Null)
}
