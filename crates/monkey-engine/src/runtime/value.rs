//! Monkey value representation.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::function::{Builtin, Closure, CompiledFunction, Function};
use crate::error::RuntimeError;

/// A Monkey value.
///
/// Scalars are stored inline. Strings, arrays, hashes and functions are
/// reference counted, so cloning a value never copies its contents.
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// Boolean value
    Boolean(bool),
    /// null
    Null,
    /// Immutable string
    String(Rc<str>),
    /// Immutable array
    Array(Rc<Vec<Value>>),
    /// Immutable hash, ordered by key
    Hash(Rc<BTreeMap<HashKey, HashPair>>),
    /// A function created by the tree-walking evaluator
    Function(Rc<Function>),
    /// A native builtin function
    Builtin(Builtin),
    /// A compiled function body, as stored in the constant pool
    CompiledFunction(Rc<CompiledFunction>),
    /// A compiled function together with its captured values
    Closure(Rc<Closure>),
}

/// The type tag of a value, used for dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Integer
    Integer,
    /// Boolean
    Boolean,
    /// null
    Null,
    /// String
    String,
    /// Array
    Array,
    /// Hash
    Hash,
    /// Evaluator function
    Function,
    /// Builtin function
    Builtin,
    /// Compiled function
    CompiledFunction,
    /// Closure
    Closure,
}

impl ValueType {
    /// Returns the upper-case name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Integer => "INTEGER",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Null => "NULL",
            ValueType::String => "STRING",
            ValueType::Array => "ARRAY",
            ValueType::Hash => "HASH",
            ValueType::Function => "FUNCTION",
            ValueType::Builtin => "BUILTIN",
            ValueType::CompiledFunction => "COMPILED_FUNCTION",
            ValueType::Closure => "CLOSURE",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value usable as a hash key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKey {
    /// Integer key
    Integer(i64),
    /// Boolean key
    Boolean(bool),
    /// String key
    String(Rc<str>),
}

/// An entry of a hash: the original key value and the mapped value.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    /// The key as it was written
    pub key: Value,
    /// The mapped value
    pub value: Value,
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    /// Creates an array value.
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(elements))
    }

    /// Builds a hash from key/value pairs. Later duplicates win.
    pub fn hash(pairs: impl IntoIterator<Item = (Value, Value)>) -> Result<Self, RuntimeError> {
        let mut map = BTreeMap::new();
        for (key, value) in pairs {
            map.insert(key.hash_key()?, HashPair { key, value });
        }
        Ok(Value::Hash(Rc::new(map)))
    }

    /// Returns this value's type tag.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Null => ValueType::Null,
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Hash(_) => ValueType::Hash,
            Value::Function(_) => ValueType::Function,
            Value::Builtin(_) => ValueType::Builtin,
            Value::CompiledFunction(_) => ValueType::CompiledFunction,
            Value::Closure(_) => ValueType::Closure,
        }
    }

    /// Returns the type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        self.value_type().name()
    }

    /// Returns true unless the value is `false` or `null`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Null)
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to a hash key.
    pub fn hash_key(&self) -> Result<HashKey, RuntimeError> {
        match self {
            Value::Integer(n) => Ok(HashKey::Integer(*n)),
            Value::Boolean(b) => Ok(HashKey::Boolean(*b)),
            Value::String(s) => Ok(HashKey::String(Rc::clone(s))),
            other => Err(RuntimeError::UnusableHashKey(other.type_name())),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

/// Structural equality, used by tests and by hash comparison.
///
/// This is not the language's `==`: see [`crate::runtime::operators`] for
/// that, which compares heap values by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(elements) => {
                let items: Vec<String> = elements.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Hash(pairs) => {
                let items: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::Function(func) => write!(f, "{}", func),
            Value::Builtin(_) => write!(f, "builtin function"),
            Value::CompiledFunction(func) => write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func)),
            Value::Closure(closure) => write!(f, "Closure[{:p}]", Rc::as_ptr(closure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_hash_keys() {
        assert_eq!(Value::string("name").hash_key(), Value::string("name").hash_key());
        assert_ne!(Value::Integer(1).hash_key(), Value::Boolean(true).hash_key());
        assert_eq!(
            Value::array(vec![]).hash_key(),
            Err(RuntimeError::UnusableHashKey("ARRAY"))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(-3).to_string(), "-3");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(
            Value::array(vec![Value::Integer(1), Value::string("a")]).to_string(),
            "[1, a]"
        );
        let hash = Value::hash([
            (Value::Integer(2), Value::Boolean(true)),
            (Value::Integer(1), Value::Null),
        ])
        .expect("hashable keys");
        assert_eq!(hash.to_string(), "{1: null, 2: true}");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Integer(1).type_name(), "INTEGER");
        assert_eq!(Value::string("").type_name(), "STRING");
        assert_eq!(ValueType::CompiledFunction.to_string(), "COMPILED_FUNCTION");
    }
}
