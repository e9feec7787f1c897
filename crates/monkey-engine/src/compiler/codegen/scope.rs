//! Per-function instruction buffers.

use crate::compiler::bytecode::{Instructions, Opcode};

/// An instruction that was emitted, remembered so the compiler can inspect
/// or rewrite the tail of the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmittedInstruction {
    /// The opcode
    pub opcode: Opcode,
    /// Offset of the opcode byte
    pub position: usize,
}

/// The instruction buffer of one function body (or the main program).
#[derive(Debug, Clone, Default)]
pub struct CompilationScope {
    /// Instructions emitted so far
    pub instructions: Instructions,
    /// The most recently emitted instruction
    pub last_instruction: Option<EmittedInstruction>,
    /// The instruction emitted before that
    pub previous_instruction: Option<EmittedInstruction>,
}

impl CompilationScope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an encoded instruction and returns its offset.
    pub fn add(&mut self, opcode: Opcode, instruction: &[u8]) -> usize {
        let position = self.instructions.push(instruction);
        self.previous_instruction = self.last_instruction;
        self.last_instruction = Some(EmittedInstruction { opcode, position });
        position
    }

    /// Returns true if the last emitted instruction is `opcode`.
    pub fn last_is(&self, opcode: Opcode) -> bool {
        self.last_instruction.is_some_and(|last| last.opcode == opcode)
    }

    /// Removes the trailing `OpPop`, if there is one.
    pub fn remove_last_pop(&mut self) -> bool {
        match self.last_instruction {
            Some(last) if last.opcode == Opcode::Pop => {
                self.instructions.truncate(last.position);
                self.last_instruction = self.previous_instruction.take();
                true
            }
            _ => false,
        }
    }

    /// Rewrites the trailing `OpPop` in place as `OpReturnValue`.
    pub fn replace_last_pop_with_return(&mut self) -> bool {
        match self.last_instruction.as_mut() {
            Some(last) if last.opcode == Opcode::Pop => {
                self.instructions
                    .replace(last.position, &[Opcode::ReturnValue as u8]);
                last.opcode = Opcode::ReturnValue;
                true
            }
            _ => false,
        }
    }
}
