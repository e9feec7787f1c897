//! Operator semantics shared by the VM and the tree-walking evaluator.
//!
//! Both backends route every arithmetic, comparison, prefix and index
//! operation through these functions, so they produce the same values and
//! the same error messages.

use std::fmt;
use std::rc::Rc;

use super::value::Value;
use crate::error::RuntimeError;

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `>`; `a < b` is evaluated as `b > a`
    GreaterThan,
}

impl BinaryOp {
    /// Returns the operator's source text.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    /// `!`
    Not,
    /// `-`
    Negate,
}

impl PrefixOp {
    /// Returns the operator's source text.
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Not => "!",
            PrefixOp::Negate => "-",
        }
    }
}

/// Applies a binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => integer_binary(op, *l, *r),
        (Value::String(l), Value::String(r)) => string_binary(op, l, r, left, right),
        _ => match op {
            BinaryOp::Equal => Ok(Value::Boolean(values_equal(left, right))),
            BinaryOp::NotEqual => Ok(Value::Boolean(!values_equal(left, right))),
            _ if left.value_type() != right.value_type() => Err(RuntimeError::TypeMismatch {
                left: left.type_name(),
                operator: op.symbol().to_string(),
                right: right.type_name(),
            }),
            _ => Err(unknown_infix(op, left, right)),
        },
    }
}

fn integer_binary(op: BinaryOp, l: i64, r: i64) -> Result<Value, RuntimeError> {
    let value = match op {
        BinaryOp::Add => Value::Integer(l.wrapping_add(r)),
        BinaryOp::Sub => Value::Integer(l.wrapping_sub(r)),
        BinaryOp::Mul => Value::Integer(l.wrapping_mul(r)),
        BinaryOp::Div => {
            if r == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Value::Integer(l.wrapping_div(r))
        }
        BinaryOp::Equal => Value::Boolean(l == r),
        BinaryOp::NotEqual => Value::Boolean(l != r),
        BinaryOp::GreaterThan => Value::Boolean(l > r),
    };
    Ok(value)
}

fn string_binary(
    op: BinaryOp,
    l: &str,
    r: &str,
    left: &Value,
    right: &Value,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => {
            let mut joined = String::with_capacity(l.len() + r.len());
            joined.push_str(l);
            joined.push_str(r);
            Ok(Value::String(Rc::from(joined)))
        }
        BinaryOp::Equal => Ok(Value::Boolean(l == r)),
        BinaryOp::NotEqual => Ok(Value::Boolean(l != r)),
        _ => Err(unknown_infix(op, left, right)),
    }
}

fn unknown_infix(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnknownInfixOperator {
        left: left.type_name(),
        operator: op.symbol().to_string(),
        right: right.type_name(),
    }
}

/// The language's `==`: scalars by value, heap values by identity.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
        (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
        (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Applies a prefix operator.
pub fn prefix(op: PrefixOp, right: &Value) -> Result<Value, RuntimeError> {
    match (op, right) {
        (PrefixOp::Not, value) => Ok(Value::Boolean(!value.is_truthy())),
        (PrefixOp::Negate, Value::Integer(n)) => Ok(Value::Integer(n.wrapping_neg())),
        (PrefixOp::Negate, other) => Err(RuntimeError::UnknownPrefixOperator {
            operator: op.symbol().to_string(),
            operand: other.type_name(),
        }),
    }
}

/// Evaluates `left[index]`.
pub fn index(left: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match (left, index) {
        (Value::Array(elements), Value::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or(Value::Null)),
        (Value::Hash(pairs), key) => {
            let key = key.hash_key()?;
            Ok(pairs
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Value::Null))
        }
        (other, _) => Err(RuntimeError::IndexNotSupported(other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic() {
        let cases = [
            (BinaryOp::Add, 7, 3, Value::Integer(10)),
            (BinaryOp::Sub, 7, 3, Value::Integer(4)),
            (BinaryOp::Mul, 7, 3, Value::Integer(21)),
            (BinaryOp::Div, 7, 3, Value::Integer(2)),
            (BinaryOp::Div, -7, 2, Value::Integer(-3)),
            (BinaryOp::GreaterThan, 7, 3, Value::Boolean(true)),
            (BinaryOp::GreaterThan, 3, 7, Value::Boolean(false)),
            (BinaryOp::Equal, 3, 3, Value::Boolean(true)),
            (BinaryOp::NotEqual, 3, 3, Value::Boolean(false)),
        ];
        for (op, l, r, expected) in cases {
            let result = binary(op, &Value::Integer(l), &Value::Integer(r));
            assert_eq!(result, Ok(expected), "{} {} {}", l, op, r);
        }
    }

    #[test]
    fn test_overflow_wraps() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::Integer(i64::MAX), &Value::Integer(1)),
            Ok(Value::Integer(i64::MIN))
        );
        assert_eq!(
            prefix(PrefixOp::Negate, &Value::Integer(i64::MIN)),
            Ok(Value::Integer(i64::MIN))
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            binary(BinaryOp::Div, &Value::Integer(1), &Value::Integer(0)),
            Err(RuntimeError::DivisionByZero)
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::string("mon"), &Value::string("key")),
            Ok(Value::string("monkey"))
        );
        assert_eq!(
            binary(BinaryOp::Equal, &Value::string("a"), &Value::string("a")),
            Ok(Value::Boolean(true))
        );
        let err = binary(BinaryOp::Sub, &Value::string("a"), &Value::string("b")).unwrap_err();
        assert_eq!(err.to_string(), "unknown operator: STRING - STRING");
    }

    #[test]
    fn test_mismatched_types() {
        let err = binary(BinaryOp::Add, &Value::Integer(5), &Value::Boolean(true)).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: INTEGER + BOOLEAN");
        let err = binary(BinaryOp::Add, &Value::Boolean(true), &Value::Boolean(false)).unwrap_err();
        assert_eq!(err.to_string(), "unknown operator: BOOLEAN + BOOLEAN");
        assert_eq!(
            binary(BinaryOp::Equal, &Value::Integer(1), &Value::Boolean(true)),
            Ok(Value::Boolean(false))
        );
    }

    #[test]
    fn test_heap_values_compare_by_identity() {
        let array = Value::array(vec![Value::Integer(1)]);
        assert!(values_equal(&array, &array.clone()));
        assert!(!values_equal(&array, &Value::array(vec![Value::Integer(1)])));
    }

    #[test]
    fn test_prefix() {
        assert_eq!(prefix(PrefixOp::Not, &Value::Integer(5)), Ok(Value::Boolean(false)));
        assert_eq!(prefix(PrefixOp::Not, &Value::Null), Ok(Value::Boolean(true)));
        let err = prefix(PrefixOp::Negate, &Value::Boolean(true)).unwrap_err();
        assert_eq!(err.to_string(), "unknown operator: -BOOLEAN");
    }

    #[test]
    fn test_index() {
        let array = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(index(&array, &Value::Integer(1)), Ok(Value::Integer(2)));
        assert_eq!(index(&array, &Value::Integer(2)), Ok(Value::Null));
        assert_eq!(index(&array, &Value::Integer(-1)), Ok(Value::Null));

        let hash = Value::hash([(Value::string("a"), Value::Integer(5))]).expect("hashable");
        assert_eq!(index(&hash, &Value::string("a")), Ok(Value::Integer(5)));
        assert_eq!(index(&hash, &Value::string("b")), Ok(Value::Null));
        assert_eq!(
            index(&hash, &Value::array(vec![])),
            Err(RuntimeError::UnusableHashKey("ARRAY"))
        );
        assert_eq!(
            index(&Value::Integer(1), &Value::Integer(0)),
            Err(RuntimeError::IndexNotSupported("INTEGER"))
        );
    }
}
