//! Lexical environments for the tree-walking evaluator.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::value::Value;

/// A shared, mutable environment handle.
pub type Env = Rc<RefCell<Environment>>;

/// A lexical environment for variable bindings.
#[derive(Debug, Default)]
pub struct Environment {
    /// The bindings in this environment
    store: FxHashMap<String, Value>,
    /// The outer (parent) environment
    outer: Option<Env>,
}

impl Environment {
    /// Creates a new global environment.
    pub fn new() -> Env {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Creates a new environment enclosed by `outer`.
    pub fn new_enclosed(outer: &Env) -> Env {
        Rc::new(RefCell::new(Self {
            store: FxHashMap::default(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Looks a name up, walking outwards through enclosing environments.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.store.get(name) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.borrow().get(name)),
        }
    }

    /// Binds a name in this environment, shadowing any outer binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.store.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosed_lookup_and_shadowing() {
        let global = Environment::new();
        global.borrow_mut().set("a", Value::Integer(1));
        global.borrow_mut().set("b", Value::Integer(2));

        let inner = Environment::new_enclosed(&global);
        inner.borrow_mut().set("b", Value::Integer(20));

        assert_eq!(inner.borrow().get("a"), Some(Value::Integer(1)));
        assert_eq!(inner.borrow().get("b"), Some(Value::Integer(20)));
        assert_eq!(global.borrow().get("b"), Some(Value::Integer(2)));
        assert_eq!(inner.borrow().get("c"), None);
    }
}
