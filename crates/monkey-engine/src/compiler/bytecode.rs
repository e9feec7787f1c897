//! Bytecode definitions.
//!
//! An instruction is one opcode byte followed by its operands. Operand
//! widths are fixed per opcode (see [`Opcode::operand_widths`]) and are
//! encoded big-endian.

use std::fmt;

use crate::runtime::value::Value;

/// A compiled program: the main instruction stream and its constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    /// The instructions of the top-level program
    pub instructions: Instructions,
    /// The constant pool
    pub constants: Vec<Value>,
}

impl Bytecode {
    /// Renders the main program followed by every compiled function in the
    /// constant pool. Same as the `Display` output.
    pub fn disassemble(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== main ==")?;
        write!(f, "{}", self.instructions)?;
        for (index, constant) in self.constants.iter().enumerate() {
            match constant {
                Value::CompiledFunction(func) => {
                    writeln!(
                        f,
                        "== constant {} (fn, {} params, {} locals) ==",
                        index, func.num_parameters, func.num_locals
                    )?;
                    write!(f, "{}", func.instructions)?;
                }
                Value::String(s) => writeln!(f, "== constant {}: {:?}", index, s)?,
                other => writeln!(f, "== constant {}: {}", index, other)?,
            }
        }
        Ok(())
    }
}

/// A raw instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions(pub Vec<u8>);

impl Instructions {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the stream is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Appends one encoded instruction and returns its offset.
    pub fn push(&mut self, instruction: &[u8]) -> usize {
        let position = self.0.len();
        self.0.extend_from_slice(instruction);
        position
    }

    /// Overwrites the bytes at `position` with `instruction`.
    pub fn replace(&mut self, position: usize, instruction: &[u8]) {
        self.0[position..position + instruction.len()].copy_from_slice(instruction);
    }

    /// Drops everything from `position` on.
    pub fn truncate(&mut self, position: usize) {
        self.0.truncate(position);
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl FromIterator<Vec<u8>> for Instructions {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self(iter.into_iter().flatten().collect())
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;
        while offset < self.0.len() {
            let byte = self.0[offset];
            let Some(op) = Opcode::from_byte(byte) else {
                writeln!(f, "ERROR: unknown opcode {}", byte)?;
                offset += 1;
                continue;
            };
            let (operands, read) = read_operands(op, &self.0[offset + 1..]);
            write!(f, "{:04} {}", offset, op.name())?;
            for operand in operands {
                write!(f, " {}", operand)?;
            }
            writeln!(f)?;
            offset += 1 + read;
        }
        Ok(())
    }
}

/// Operation codes for the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    // Stack operations
    /// Push a constant onto the stack
    Constant,
    /// Pop the top value
    Pop,
    /// Push true
    True,
    /// Push false
    False,
    /// Push null
    Null,

    // Arithmetic operations
    /// Add top two values
    Add,
    /// Subtract
    Sub,
    /// Multiply
    Mul,
    /// Divide
    Div,

    // Comparison operations
    /// Equal (==)
    Equal,
    /// Not equal (!=)
    NotEqual,
    /// Greater than (`<` is compiled with its operands swapped)
    GreaterThan,

    // Prefix operations
    /// Negate (unary minus)
    Minus,
    /// Logical NOT
    Bang,

    // Control flow
    /// Jump if the popped value is falsy
    JumpNotTruthy,
    /// Unconditional jump
    Jump,

    // Variable operations
    /// Load a global
    GetGlobal,
    /// Store to a global
    SetGlobal,
    /// Load a local
    GetLocal,
    /// Store to a local
    SetLocal,
    /// Load a builtin
    GetBuiltin,
    /// Load a captured value of the current closure
    GetFree,
    /// Load the executing closure itself
    CurrentClosure,

    // Collections
    /// Build an array from the top N values
    Array,
    /// Build a hash from the top N values (N = 2 × pairs)
    Hash,
    /// Index into an array or hash
    Index,

    // Function operations
    /// Call a function with N arguments
    Call,
    /// Return the top value from the current function
    ReturnValue,
    /// Return null from the current function
    Return,
    /// Create a closure from a constant and N captured values
    Closure,
}

impl Opcode {
    const ALL: [Opcode; 30] = [
        Opcode::Constant,
        Opcode::Pop,
        Opcode::True,
        Opcode::False,
        Opcode::Null,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Equal,
        Opcode::NotEqual,
        Opcode::GreaterThan,
        Opcode::Minus,
        Opcode::Bang,
        Opcode::JumpNotTruthy,
        Opcode::Jump,
        Opcode::GetGlobal,
        Opcode::SetGlobal,
        Opcode::GetLocal,
        Opcode::SetLocal,
        Opcode::GetBuiltin,
        Opcode::GetFree,
        Opcode::CurrentClosure,
        Opcode::Array,
        Opcode::Hash,
        Opcode::Index,
        Opcode::Call,
        Opcode::ReturnValue,
        Opcode::Return,
        Opcode::Closure,
    ];

    /// Decodes an opcode byte.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Returns the width in bytes of each operand.
    pub fn operand_widths(self) -> &'static [usize] {
        match self {
            Opcode::Constant
            | Opcode::JumpNotTruthy
            | Opcode::Jump
            | Opcode::GetGlobal
            | Opcode::SetGlobal
            | Opcode::Array
            | Opcode::Hash => &[2],
            Opcode::GetLocal
            | Opcode::SetLocal
            | Opcode::GetBuiltin
            | Opcode::GetFree
            | Opcode::Call => &[1],
            Opcode::Closure => &[2, 1],
            _ => &[],
        }
    }

    /// Returns the name used in disassembly.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Constant => "OpConstant",
            Opcode::Pop => "OpPop",
            Opcode::True => "OpTrue",
            Opcode::False => "OpFalse",
            Opcode::Null => "OpNull",
            Opcode::Add => "OpAdd",
            Opcode::Sub => "OpSub",
            Opcode::Mul => "OpMul",
            Opcode::Div => "OpDiv",
            Opcode::Equal => "OpEqual",
            Opcode::NotEqual => "OpNotEqual",
            Opcode::GreaterThan => "OpGreaterThan",
            Opcode::Minus => "OpMinus",
            Opcode::Bang => "OpBang",
            Opcode::JumpNotTruthy => "OpJumpNotTruthy",
            Opcode::Jump => "OpJump",
            Opcode::GetGlobal => "OpGetGlobal",
            Opcode::SetGlobal => "OpSetGlobal",
            Opcode::GetLocal => "OpGetLocal",
            Opcode::SetLocal => "OpSetLocal",
            Opcode::GetBuiltin => "OpGetBuiltin",
            Opcode::GetFree => "OpGetFree",
            Opcode::CurrentClosure => "OpCurrentClosure",
            Opcode::Array => "OpArray",
            Opcode::Hash => "OpHash",
            Opcode::Index => "OpIndex",
            Opcode::Call => "OpCall",
            Opcode::ReturnValue => "OpReturnValue",
            Opcode::Return => "OpReturn",
            Opcode::Closure => "OpClosure",
        }
    }
}

/// Returns true if `value` fits in an operand of `width` bytes.
pub fn operand_fits(width: usize, value: usize) -> bool {
    match width {
        1 => value <= u8::MAX as usize,
        2 => value <= u16::MAX as usize,
        _ => false,
    }
}

/// Encodes one instruction.
///
/// Operands are truncated to their width; callers check them with
/// [`operand_fits`] first.
pub fn make(op: Opcode, operands: &[usize]) -> Vec<u8> {
    let widths = op.operand_widths();
    let mut instruction = Vec::with_capacity(1 + widths.iter().sum::<usize>());
    instruction.push(op as u8);
    for (&operand, &width) in operands.iter().zip(widths) {
        match width {
            2 => instruction.extend_from_slice(&(operand as u16).to_be_bytes()),
            1 => instruction.push(operand as u8),
            _ => {}
        }
    }
    instruction
}

/// Decodes the operands of `op` from the bytes following the opcode.
///
/// Returns the operands and the number of bytes read.
pub fn read_operands(op: Opcode, bytes: &[u8]) -> (Vec<usize>, usize) {
    let mut operands = Vec::with_capacity(op.operand_widths().len());
    let mut offset = 0;
    for &width in op.operand_widths() {
        match width {
            2 => operands.push(read_u16(bytes, offset) as usize),
            1 => operands.push(read_u8(bytes, offset) as usize),
            _ => {}
        }
        offset += width;
    }
    (operands, offset)
}

/// Reads a big-endian u16 at `offset`, treating missing bytes as zero.
pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    let hi = bytes.get(offset).copied().unwrap_or(0);
    let lo = bytes.get(offset + 1).copied().unwrap_or(0);
    u16::from_be_bytes([hi, lo])
}

/// Reads a u8 at `offset`, treating a missing byte as zero.
pub fn read_u8(bytes: &[u8], offset: usize) -> u8 {
    bytes.get(offset).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make() {
        assert_eq!(make(Opcode::Constant, &[65534]), vec![Opcode::Constant as u8, 255, 254]);
        assert_eq!(make(Opcode::Add, &[]), vec![Opcode::Add as u8]);
        assert_eq!(make(Opcode::GetLocal, &[255]), vec![Opcode::GetLocal as u8, 255]);
        assert_eq!(
            make(Opcode::Closure, &[65534, 255]),
            vec![Opcode::Closure as u8, 255, 254, 255]
        );
    }

    #[test]
    fn test_opcode_bytes_round_trip() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_byte(op as u8), Some(op));
        }
        assert_eq!(Opcode::from_byte(Opcode::ALL.len() as u8), None);
    }

    #[test]
    fn test_read_operands_at_width_limits() {
        for op in Opcode::ALL {
            let widths = op.operand_widths();
            let limits: [Vec<usize>; 2] = [
                widths.iter().map(|_| 0).collect(),
                widths
                    .iter()
                    .map(|&w| if w == 2 { u16::MAX as usize } else { u8::MAX as usize })
                    .collect(),
            ];
            for operands in limits {
                let instruction = make(op, &operands);
                let (read, bytes_read) = read_operands(op, &instruction[1..]);
                assert_eq!(read, operands, "{}", op.name());
                assert_eq!(bytes_read, instruction.len() - 1, "{}", op.name());
            }
        }
    }

    #[test]
    fn test_operand_fits() {
        assert!(operand_fits(1, 255));
        assert!(!operand_fits(1, 256));
        assert!(operand_fits(2, 65535));
        assert!(!operand_fits(2, 65536));
    }

    #[test]
    fn test_instructions_display() {
        let instructions: Instructions = vec![
            make(Opcode::Add, &[]),
            make(Opcode::GetLocal, &[1]),
            make(Opcode::Constant, &[2]),
            make(Opcode::Constant, &[65535]),
            make(Opcode::Closure, &[65535, 255]),
        ]
        .into_iter()
        .collect();

        let expected = "0000 OpAdd\n\
                        0001 OpGetLocal 1\n\
                        0003 OpConstant 2\n\
                        0006 OpConstant 65535\n\
                        0009 OpClosure 65535 255\n";
        assert_eq!(instructions.to_string(), expected);
    }

    #[test]
    fn test_display_reports_unknown_opcode() {
        let instructions = Instructions::from(vec![250, Opcode::Pop as u8]);
        assert_eq!(instructions.to_string(), "ERROR: unknown opcode 250\n0001 OpPop\n");
    }

    #[test]
    fn test_bytecode_display() {
        let bytecode = Bytecode {
            instructions: Instructions::from(make(Opcode::Constant, &[0])),
            constants: vec![Value::Integer(5), Value::string("hi")],
        };
        let expected = "== main ==\n\
                        0000 OpConstant 0\n\
                        == constant 0: 5\n\
                        == constant 1: \"hi\"\n";
        assert_eq!(bytecode.to_string(), expected);
        assert_eq!(bytecode.disassemble(), expected);
    }
}
