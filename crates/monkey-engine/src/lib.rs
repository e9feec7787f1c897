// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # monkey-engine
//!
//! A bytecode compiler and stack-based virtual machine for the Monkey
//! language, with a tree-walking evaluator as a second backend.
//!
//! ## Overview
//!
//! This crate provides a complete Monkey execution environment including:
//! - Lexer and Pratt parser
//! - Bytecode compiler with closure capture
//! - Virtual machine with call frames and a fixed operand stack
//! - Tree-walking evaluator sharing the VM's operator semantics
//! - Builtin functions (`len`, `puts`, `first`, `last`, `rest`, `push`)
//!
//! ## Quick Start
//!
//! ```rust
//! use monkey_engine::{Engine, Value};
//!
//! let mut engine = Engine::new();
//! engine.eval("let add = fn(a, b) { a + b };")?;
//! let result = engine.eval("add(1, 2)")?;
//! assert_eq!(result, Value::Integer(3));
//! # Ok::<(), monkey_engine::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod vm;

use std::fmt;

use tracing::debug;

// Re-exports for convenience
pub use compiler::{Bytecode, Compiler};
pub use error::{CompileError, CompileErrors, Error, ParseErrors, Result, RuntimeError};
pub use runtime::value::Value;
pub use vm::Vm;

use ast::{Program, Statement};
use compiler::SymbolTable;
use parser::Parser;
use runtime::environment::{Env, Environment};

/// Which execution strategy an [`Engine`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Compile to bytecode and run it on the virtual machine
    #[default]
    Vm,
    /// Walk the syntax tree directly
    TreeWalker,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Vm => write!(f, "vm"),
            Backend::TreeWalker => write!(f, "eval"),
        }
    }
}

/// The main Monkey engine instance.
///
/// An engine is a session: bindings made by one [`Engine::eval`] call are
/// visible to the next. Each backend keeps its own session state, so
/// switching backends starts from that backend's bindings.
pub struct Engine {
    backend: Backend,
    /// Global symbols of the compiled session, builtins included
    symbol_table: SymbolTable,
    /// Constant pool of the compiled session
    constants: Vec<Value>,
    /// Global slots of the compiled session
    globals: Vec<Value>,
    /// Environment of the tree-walking session
    env: Env,
}

impl Engine {
    /// Creates a new engine using the VM backend.
    pub fn new() -> Self {
        Self::with_backend(Backend::Vm)
    }

    /// Creates a new engine using the given backend.
    pub fn with_backend(backend: Backend) -> Self {
        let (symbol_table, constants) = Compiler::new().into_state();
        Self {
            backend,
            symbol_table,
            constants,
            globals: Vec::new(),
            env: Environment::new(),
        }
    }

    /// Returns the active backend.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Switches backend. Session state of both backends is kept.
    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
    }

    /// Evaluates Monkey source code and returns the result.
    ///
    /// The result is the value of the last expression statement, the value
    /// of a top-level `return`, or null when the program ends with a `let`.
    ///
    /// # Errors
    ///
    /// Returns every syntax error of the input, every independent top-level
    /// compile error, or the runtime error that stopped execution. A compile
    /// failure leaves the session unchanged.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let program = Parser::new(source).parse_program()?;
        debug!(backend = %self.backend, statements = program.statements.len(), "evaluating");

        match self.backend {
            Backend::TreeWalker => Ok(evaluator::eval_program(&program, &self.env)?),
            Backend::Vm => self.run_compiled(&program),
        }
    }

    /// Compiles source code against the current session without running it
    /// or changing the session.
    pub fn compile(&self, source: &str) -> Result<Bytecode> {
        let program = Parser::new(source).parse_program()?;
        let (bytecode, _, _) = self.compile_program(&program)?;
        Ok(bytecode)
    }

    fn run_compiled(&mut self, program: &Program) -> Result<Value> {
        let (bytecode, symbol_table, constants) = self.compile_program(program)?;
        self.symbol_table = symbol_table;
        self.constants = constants;

        let mut vm = Vm::new_with_globals(bytecode, std::mem::take(&mut self.globals));
        if let Err(error) = vm.run() {
            self.globals = vm.into_globals();
            return Err(error.into());
        }

        let ends_with_expression = matches!(program.statements.last(), Some(Statement::Expression(_)));
        let result = if vm.returned() || ends_with_expression {
            vm.last_popped().clone()
        } else {
            Value::Null
        };
        self.globals = vm.into_globals();
        Ok(result)
    }

    fn compile_program(&self, program: &Program) -> Result<(Bytecode, SymbolTable, Vec<Value>)> {
        let mut compiler = Compiler::new_with_state(self.symbol_table.clone(), self.constants.clone());
        match compiler.compile(program) {
            Ok(()) => {
                let bytecode = compiler.bytecode();
                let (symbol_table, constants) = compiler.into_state();
                Ok((bytecode, symbol_table, constants))
            }
            Err(first) => Err(Error::Compile(self.collect_compile_errors(program, first))),
        }
    }

    /// Compiles each top-level statement on its own to report every
    /// independent error, not just the first.
    fn collect_compile_errors(&self, program: &Program, first: CompileError) -> CompileErrors {
        let mut symbols = self.symbol_table.clone();
        let mut errors = Vec::new();

        for statement in &program.statements {
            let single = Program {
                statements: vec![statement.clone()],
            };
            let mut compiler = Compiler::new_with_state(symbols.clone(), Vec::new());
            match compiler.compile(&single) {
                Ok(()) => symbols = compiler.into_state().0,
                Err(error) => {
                    errors.push(error);
                    // Later statements may use the name; keep them from
                    // reporting it as undefined.
                    if let Statement::Let(stmt) = statement {
                        symbols.define(&stmt.name.name);
                    }
                }
            }
        }

        if errors.is_empty() {
            errors.push(first);
        }
        CompileErrors(errors)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
