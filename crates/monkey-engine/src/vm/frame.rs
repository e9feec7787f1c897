//! Call frames.

use std::rc::Rc;

use crate::compiler::bytecode::{Instructions, read_u8, read_u16};
use crate::runtime::function::Closure;

/// One active function call.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The closure being executed
    pub closure: Rc<Closure>,
    /// Offset of the instruction being executed; -1 before the first one
    pub ip: isize,
    /// Stack index of the first local slot
    pub base_pointer: usize,
}

impl Frame {
    /// Creates a frame positioned before the closure's first instruction.
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: -1,
            base_pointer,
        }
    }

    /// The instructions of the executing function.
    pub fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }

    /// Advances to the next opcode byte, or returns `None` past the end.
    pub fn next_byte(&mut self) -> Option<u8> {
        self.ip += 1;
        let ip = usize::try_from(self.ip).ok()?;
        self.instructions().as_bytes().get(ip).copied()
    }

    /// Reads a two-byte operand following the current position.
    pub fn read_u16(&mut self) -> usize {
        let operand = read_u16(self.instructions().as_bytes(), (self.ip + 1) as usize);
        self.ip += 2;
        operand as usize
    }

    /// Reads a one-byte operand following the current position.
    pub fn read_u8(&mut self) -> usize {
        let operand = read_u8(self.instructions().as_bytes(), (self.ip + 1) as usize);
        self.ip += 1;
        operand as usize
    }

    /// Continues execution at `position`.
    pub fn jump_to(&mut self, position: usize) {
        self.ip = position as isize - 1;
    }
}
