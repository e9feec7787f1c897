//! Code generation from AST to bytecode.
//!
//! The [`Compiler`] walks a [`Program`] and emits instructions into a stack
//! of [`CompilationScope`]s, one per function body being compiled, with the
//! main program at the bottom. Name resolution goes through a
//! [`SymbolTable`] chain that grows and shrinks in step with the scopes.
//!
//! Statement and expression lowering live in `statements.rs` and
//! `expressions.rs`.

mod expressions;
mod scope;
mod statements;


pub use scope::{CompilationScope, EmittedInstruction};

use tracing::debug;

use crate::ast::Program;
use crate::builtins::BUILTINS;
use crate::compiler::bytecode::{Bytecode, Opcode, make, operand_fits};
use crate::compiler::symbol_table::{Symbol, SymbolScope, SymbolTable};
use crate::error::CompileError;
use crate::runtime::value::Value;

/// Placeholder operand for jumps whose target is not known yet.
const PLACEHOLDER: usize = 9999;

/// Compiles AST to bytecode.
pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a compiler whose global table knows every builtin.
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(index, builtin.name);
        }
        Self::new_with_state(symbol_table, Vec::new())
    }

    /// Creates a compiler that continues from an earlier session's global
    /// symbol table and constant pool.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Self {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::new()],
        }
    }

    /// Compiles a program, stopping at the first error.
    pub fn compile(&mut self, program: &Program) -> Result<(), CompileError> {
        let constants_before = self.constants.len();
        for statement in &program.statements {
            if let Err(error) = self.compile_statement(statement) {
                while self.scopes.len() > 1 {
                    self.leave_scope();
                }
                return Err(error);
            }
        }
        debug!(
            statements = program.statements.len(),
            bytes = self.current_scope().instructions.len(),
            new_constants = self.constants.len() - constants_before,
            "compiled program"
        );
        Ok(())
    }

    /// Returns the compiled main program and constant pool.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_scope().instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    /// Consumes the compiler, returning the state a later compile can
    /// continue from.
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    /// Returns the active symbol table.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    fn current_scope(&self) -> &CompilationScope {
        // The main scope is never popped.
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_scope_mut(&mut self) -> &mut CompilationScope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn current_position(&self) -> usize {
        self.current_scope().instructions.len()
    }

    /// Encodes and appends an instruction, returning its offset.
    fn emit(&mut self, op: Opcode, operands: &[usize]) -> Result<usize, CompileError> {
        for (&operand, &width) in operands.iter().zip(op.operand_widths()) {
            if !operand_fits(width, operand) {
                return Err(CompileError::MalformedLiteral(format!(
                    "{} operand {} does not fit in {} byte(s)",
                    op.name(),
                    operand,
                    width
                )));
            }
        }
        let instruction = make(op, operands);
        Ok(self.current_scope_mut().add(op, &instruction))
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Back-patches the operand of the instruction at `position`.
    fn change_operand(&mut self, position: usize, operand: usize) -> Result<(), CompileError> {
        let scope = self.current_scope_mut();
        let byte = scope.instructions.as_bytes()[position];
        let Some(op) = Opcode::from_byte(byte) else {
            return Err(CompileError::MalformedLiteral(format!(
                "cannot patch unknown opcode {}",
                byte
            )));
        };
        if !operand_fits(2, operand) {
            return Err(CompileError::MalformedLiteral(format!(
                "jump target {} does not fit in 2 byte(s)",
                operand
            )));
        }
        scope.instructions.replace(position, &make(op, &[operand]));
        Ok(())
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> CompilationScope {
        let scope = self.scopes.pop().unwrap_or_default();
        let inner = std::mem::take(&mut self.symbol_table);
        self.symbol_table = inner.into_outer().unwrap_or_default();
        scope
    }

    fn load_symbol(&mut self, symbol: &Symbol) -> Result<usize, CompileError> {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Opcode::CurrentClosure, &[]),
        }
    }
}
