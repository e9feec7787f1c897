//! Bytecode compiler for Monkey.
//!
//! Transforms AST into bytecode that can be executed by the VM.
//!
//! # Module Structure
//!
//! - `bytecode`: Opcodes, instruction encoding and disassembly
//! - `symbol_table`: Compile-time name resolution and closure capture
//! - `codegen`: Code generation from AST
//!   - `codegen::scope`: Per-function instruction buffers

pub mod bytecode;
pub mod codegen;
pub mod symbol_table;

pub use bytecode::{Bytecode, Instructions, Opcode, make, read_operands};
pub use codegen::Compiler;
pub use symbol_table::{Symbol, SymbolScope, SymbolTable};
