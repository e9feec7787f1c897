//! Builtin functions.
//!
//! The registry order is fixed: a builtin's position in [`BUILTINS`] is the
//! operand of `OpGetBuiltin`, and the compiler seeds its global symbol table
//! from the same slice.

pub mod array;
pub mod console;

use crate::error::RuntimeError;
use crate::runtime::function::Builtin;
use crate::runtime::value::Value;

/// Every builtin, in index order.
pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "len",
        func: len,
    },
    Builtin {
        name: "puts",
        func: console::puts,
    },
    Builtin {
        name: "first",
        func: array::first,
    },
    Builtin {
        name: "last",
        func: array::last,
    },
    Builtin {
        name: "rest",
        func: array::rest,
    },
    Builtin {
        name: "push",
        func: array::push,
    },
];

/// Looks a builtin up by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name).copied()
}

/// Looks a builtin up by registry index.
pub fn get(index: usize) -> Option<Builtin> {
    BUILTINS.get(index).copied()
}

pub(crate) fn check_arity(args: &[Value], want: usize) -> Result<(), RuntimeError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(RuntimeError::Builtin(format!(
            "wrong number of arguments. got={}, want={}",
            args.len(),
            want
        )))
    }
}

/// len - character count of a string or element count of an array
pub fn len(args: &[Value]) -> Result<Value, RuntimeError> {
    check_arity(args, 1)?;
    let count = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(elements) => elements.len(),
        other => {
            return Err(RuntimeError::Builtin(format!(
                "argument to `len` not supported, got {}",
                other.type_name()
            )));
        }
    };
    Ok(Value::Integer(count as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        lookup(name).expect("builtin exists").call(args)
    }

    fn ints(values: &[i64]) -> Value {
        Value::array(values.iter().copied().map(Value::Integer).collect())
    }

    #[test]
    fn test_registry_order() {
        let names: Vec<&str> = BUILTINS.iter().map(|b| b.name).collect();
        assert_eq!(names, ["len", "puts", "first", "last", "rest", "push"]);
        assert_eq!(get(5).map(|b| b.name), Some("push"));
        assert!(get(6).is_none());
    }

    #[test]
    fn test_len() {
        assert_eq!(call("len", &[Value::string("")]), Ok(Value::Integer(0)));
        assert_eq!(call("len", &[Value::string("four")]), Ok(Value::Integer(4)));
        assert_eq!(call("len", &[Value::string("héllo")]), Ok(Value::Integer(5)));
        assert_eq!(call("len", &[ints(&[1, 2, 3])]), Ok(Value::Integer(3)));
        assert_eq!(
            call("len", &[Value::Integer(1)]).unwrap_err().to_string(),
            "argument to `len` not supported, got INTEGER"
        );
        assert_eq!(
            call("len", &[Value::string("one"), Value::string("two")])
                .unwrap_err()
                .to_string(),
            "wrong number of arguments. got=2, want=1"
        );
    }

    #[test]
    fn test_array_builtins() {
        assert_eq!(call("first", &[ints(&[1, 2, 3])]), Ok(Value::Integer(1)));
        assert_eq!(call("first", &[ints(&[])]), Ok(Value::Null));
        assert_eq!(call("last", &[ints(&[1, 2, 3])]), Ok(Value::Integer(3)));
        assert_eq!(call("last", &[ints(&[])]), Ok(Value::Null));
        assert_eq!(call("rest", &[ints(&[1, 2, 3])]), Ok(ints(&[2, 3])));
        assert_eq!(call("rest", &[ints(&[])]), Ok(Value::Null));
        assert_eq!(call("push", &[ints(&[]), Value::Integer(1)]), Ok(ints(&[1])));
        assert_eq!(
            call("first", &[Value::Integer(1)]).unwrap_err().to_string(),
            "argument to `first` must be ARRAY, got INTEGER"
        );
    }

    #[test]
    fn test_push_leaves_original_untouched() {
        let original = ints(&[1]);
        let pushed = call("push", &[original.clone(), Value::Integer(2)]);
        assert_eq!(pushed, Ok(ints(&[1, 2])));
        assert_eq!(original, ints(&[1]));
    }

    #[test]
    fn test_puts_returns_null() {
        assert_eq!(call("puts", &[Value::string("hello")]), Ok(Value::Null));
    }
}
