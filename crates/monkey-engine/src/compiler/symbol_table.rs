//! Compile-time scope resolution.
//!
//! A [`SymbolTable`] maps names to storage locations. Each function literal
//! gets its own table enclosing the one it is defined in; the child takes
//! ownership of the enclosing table while the body compiles and hands it
//! back afterwards.
//!
//! Resolving a name that lives in an enclosing *function* scope captures it:
//! the enclosing symbol is appended to [`SymbolTable::free_symbols`] and the
//! name is redefined locally as [`SymbolScope::Free`]. Capture repeats at
//! every level between the definition and the use.

use rustc_hash::FxHashMap;

/// Where a symbol's value lives at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolScope {
    /// Slot in the VM's global array
    Global,
    /// Slot relative to the current frame's base pointer
    Local,
    /// Captured value of the current closure
    Free,
    /// Entry of the builtin registry
    Builtin,
    /// The function currently being defined (self reference)
    Function,
}

/// A resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    /// The name
    pub name: String,
    /// Where the value lives
    pub scope: SymbolScope,
    /// Index within that scope
    pub index: usize,
}

impl Symbol {
    /// Creates a new symbol.
    pub fn new(name: impl Into<String>, scope: SymbolScope, index: usize) -> Self {
        Self {
            name: name.into(),
            scope,
            index,
        }
    }
}

/// A chain of name stores, innermost first.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    store: FxHashMap<String, Symbol>,
    num_definitions: usize,
    /// Enclosing-scope symbols captured by this scope, in capture order
    pub free_symbols: Vec<Symbol>,
    outer: Option<Box<SymbolTable>>,
}

impl SymbolTable {
    /// Creates an empty global table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table enclosed by `outer`.
    pub fn new_enclosed(outer: SymbolTable) -> Self {
        Self {
            outer: Some(Box::new(outer)),
            ..Self::default()
        }
    }

    /// Returns the enclosing table, if any.
    pub fn outer(&self) -> Option<&SymbolTable> {
        self.outer.as_deref()
    }

    /// Returns the enclosing table mutably, if any.
    pub fn outer_mut(&mut self) -> Option<&mut SymbolTable> {
        self.outer.as_deref_mut()
    }

    /// Consumes this table and returns the enclosing one.
    pub fn into_outer(self) -> Option<SymbolTable> {
        self.outer.map(|outer| *outer)
    }

    /// Number of `define` calls in this scope; the local slot count of a
    /// function body.
    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    /// Defines `name` at the next index of this scope.
    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol::new(name, scope, self.num_definitions);
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    /// Defines a builtin at its registry index.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol::new(name, SymbolScope::Builtin, index);
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Defines the name of the function whose body this table belongs to.
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol::new(name, SymbolScope::Function, 0);
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        let symbol = Symbol::new(
            original.name.clone(),
            SymbolScope::Free,
            self.free_symbols.len(),
        );
        self.free_symbols.push(original);
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Resolves `name`, capturing it if it lives in an enclosing function.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let symbol = self.outer.as_mut()?.resolve(name)?;
        match symbol.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(symbol),
            SymbolScope::Local | SymbolScope::Free | SymbolScope::Function => {
                Some(self.define_free(symbol))
            }
        }
    }
}
