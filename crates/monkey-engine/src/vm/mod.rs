//! The bytecode virtual machine.
//!
//! This module contains the VM that executes compiled bytecode.
//!
//! ## Structure
//!
//! - `interpreter` - Fetch/decode/execute loop, operand stack and globals
//! - `frame` - Call frames (closure, instruction pointer, base pointer)

mod frame;
mod interpreter;

// Re-export public API
pub use frame::Frame;
pub use interpreter::{GLOBALS_SIZE, MAX_FRAMES, STACK_SIZE, Vm};
