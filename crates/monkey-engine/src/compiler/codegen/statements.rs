//! Statement compilation.
//!
//! Statements leave the operand stack as they found it.
//!
//! | Statement | Emits |
//! |-----------|-------|
//! | `let x = v;` | `v`, `OpSetGlobal` / `OpSetLocal` |
//! | `return v;` | `v`, `OpReturnValue` |
//! | `expr;` | `expr`, `OpPop` |
//!
//! A `let` defines its name *after* compiling the value, so the value sees
//! the previous binding of the same name. A function literal refers to
//! itself through its own name instead (see `SymbolScope::Function`).

use super::Compiler;
use crate::ast::{BlockStatement, Statement};
use crate::compiler::bytecode::Opcode;
use crate::compiler::symbol_table::SymbolScope;
use crate::error::CompileError;

impl Compiler {
    pub(super) fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Let(stmt) => {
                self.compile_expression(&stmt.value)?;
                let symbol = self.symbol_table.define(&stmt.name.name);
                let op = if symbol.scope == SymbolScope::Global {
                    Opcode::SetGlobal
                } else {
                    Opcode::SetLocal
                };
                self.emit(op, &[symbol.index])?;
            }
            Statement::Return(stmt) => {
                self.compile_expression(&stmt.value)?;
                self.emit(Opcode::ReturnValue, &[])?;
            }
            Statement::Expression(stmt) => {
                self.compile_expression(&stmt.expression)?;
                self.emit(Opcode::Pop, &[])?;
            }
        }
        Ok(())
    }

    pub(super) fn compile_block(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// Compiles a block used as a value: its last expression statement's
    /// value stays on the stack, and a block without one yields null.
    pub(super) fn compile_block_value(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        self.compile_block(block)?;
        if !self.current_scope_mut().remove_last_pop() {
            self.emit(Opcode::Null, &[])?;
        }
        Ok(())
    }
}
