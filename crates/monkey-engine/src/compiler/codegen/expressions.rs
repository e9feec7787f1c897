//! Expression compilation.
//!
//! Every expression leaves exactly one value on the operand stack.
//!
//! ## Conditionals
//!
//! ```text
//! if (cond) { then } else { other }
//!
//!   [cond]
//!   OpJumpNotTruthy -> else_label
//!   [then]
//!   OpJump -> end_label
//! else_label:
//!   [other]            (OpNull without an else branch)
//! end_label:
//! ```
//!
//! Both jump operands are emitted as placeholders and patched once the
//! target offset is known.
//!
//! ## Function literals
//!
//! The body compiles in a fresh scope. Afterwards the enclosing scope loads
//! every captured value in `free_symbols` order and emits
//! `OpClosure <constant> <count>`.

use std::rc::Rc;

use tracing::trace;

use super::{Compiler, PLACEHOLDER};
use crate::ast::{Expression, FunctionLiteral, IfExpression};
use crate::compiler::bytecode::Opcode;
use crate::error::CompileError;
use crate::lexer::TokenKind;
use crate::runtime::function::CompiledFunction;
use crate::runtime::value::Value;

impl Compiler {
    pub(super) fn compile_expression(&mut self, expression: &Expression) -> Result<(), CompileError> {
        match expression {
            Expression::Integer(value) => {
                let index = self.add_constant(Value::Integer(*value));
                self.emit(Opcode::Constant, &[index])?;
            }
            Expression::String(value) => {
                let index = self.add_constant(Value::string(value));
                self.emit(Opcode::Constant, &[index])?;
            }
            Expression::Boolean(true) => {
                self.emit(Opcode::True, &[])?;
            }
            Expression::Boolean(false) => {
                self.emit(Opcode::False, &[])?;
            }
            Expression::Identifier(ident) => {
                let symbol = self
                    .symbol_table
                    .resolve(&ident.name)
                    .ok_or_else(|| CompileError::UndefinedVariable(ident.name.clone()))?;
                self.load_symbol(&symbol)?;
            }
            Expression::Prefix(prefix) => {
                self.compile_expression(&prefix.right)?;
                let op = match prefix.operator {
                    TokenKind::Bang => Opcode::Bang,
                    TokenKind::Minus => Opcode::Minus,
                    ref other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
                self.emit(op, &[])?;
            }
            Expression::Infix(infix) => {
                if infix.operator == TokenKind::Lt {
                    self.compile_expression(&infix.right)?;
                    self.compile_expression(&infix.left)?;
                    self.emit(Opcode::GreaterThan, &[])?;
                    return Ok(());
                }

                self.compile_expression(&infix.left)?;
                self.compile_expression(&infix.right)?;
                let op = match infix.operator {
                    TokenKind::Plus => Opcode::Add,
                    TokenKind::Minus => Opcode::Sub,
                    TokenKind::Asterisk => Opcode::Mul,
                    TokenKind::Slash => Opcode::Div,
                    TokenKind::Gt => Opcode::GreaterThan,
                    TokenKind::Eq => Opcode::Equal,
                    TokenKind::NotEq => Opcode::NotEqual,
                    ref other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
                self.emit(op, &[])?;
            }
            Expression::If(if_expr) => self.compile_if(if_expr)?,
            Expression::Function(func) => self.compile_function_literal(func)?,
            Expression::Call(call) => {
                self.compile_expression(&call.function)?;
                for argument in &call.arguments {
                    self.compile_expression(argument)?;
                }
                self.emit(Opcode::Call, &[call.arguments.len()])?;
            }
            Expression::Array(array) => {
                for element in &array.elements {
                    self.compile_expression(element)?;
                }
                self.emit(Opcode::Array, &[array.elements.len()])?;
            }
            Expression::Hash(hash) => {
                for (key, value) in &hash.pairs {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Opcode::Hash, &[hash.pairs.len() * 2])?;
            }
            Expression::Index(index) => {
                self.compile_expression(&index.left)?;
                self.compile_expression(&index.index)?;
                self.emit(Opcode::Index, &[])?;
            }
        }
        Ok(())
    }

    fn compile_if(&mut self, if_expr: &IfExpression) -> Result<(), CompileError> {
        self.compile_expression(&if_expr.condition)?;
        let jump_not_truthy = self.emit(Opcode::JumpNotTruthy, &[PLACEHOLDER])?;

        self.compile_block_value(&if_expr.consequence)?;
        let jump = self.emit(Opcode::Jump, &[PLACEHOLDER])?;

        let after_consequence = self.current_position();
        self.change_operand(jump_not_truthy, after_consequence)?;

        match &if_expr.alternative {
            Some(alternative) => self.compile_block_value(alternative)?,
            None => {
                self.emit(Opcode::Null, &[])?;
            }
        }

        let after_alternative = self.current_position();
        self.change_operand(jump, after_alternative)
    }

    fn compile_function_literal(&mut self, func: &FunctionLiteral) -> Result<(), CompileError> {
        if func.parameters.len() > u8::MAX as usize {
            return Err(CompileError::MalformedLiteral(format!(
                "function has {} parameters, at most {} are allowed",
                func.parameters.len(),
                u8::MAX
            )));
        }

        self.enter_scope();
        if let Some(name) = &func.name {
            self.symbol_table.define_function_name(name);
        }
        for parameter in &func.parameters {
            self.symbol_table.define(&parameter.name);
        }

        self.compile_block(&func.body)?;
        let scope = self.current_scope_mut();
        if !scope.replace_last_pop_with_return() && !scope.last_is(Opcode::ReturnValue) {
            self.emit(Opcode::Return, &[])?;
        }

        let free_symbols = self.symbol_table.free_symbols.clone();
        let num_locals = self.symbol_table.num_definitions();
        let instructions = self.leave_scope().instructions;

        for symbol in &free_symbols {
            self.load_symbol(symbol)?;
        }

        let compiled = CompiledFunction {
            instructions,
            num_locals,
            num_parameters: func.parameters.len(),
        };
        let index = self.add_constant(Value::CompiledFunction(Rc::new(compiled)));
        trace!(
            name = func.name.as_deref().unwrap_or("<anonymous>"),
            constant = index,
            free = free_symbols.len(),
            "emitted closure"
        );
        self.emit(Opcode::Closure, &[index, free_symbols.len()])?;
        Ok(())
    }
}
