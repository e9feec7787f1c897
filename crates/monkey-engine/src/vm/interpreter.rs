//! The bytecode interpreter.

use std::mem;
use std::rc::Rc;

use tracing::{debug, trace};

use super::frame::Frame;
use crate::builtins;
use crate::compiler::{Bytecode, Opcode};
use crate::error::RuntimeError;
use crate::runtime::function::{Closure, CompiledFunction};
use crate::runtime::operators::{self, BinaryOp, PrefixOp};
use crate::runtime::value::Value;

/// Operand stack capacity.
pub const STACK_SIZE: usize = 2048;
/// Number of global slots.
pub const GLOBALS_SIZE: usize = 65536;
/// Maximum call depth, the main program included.
pub const MAX_FRAMES: usize = 1024;

/// The Monkey virtual machine.
pub struct Vm {
    constants: Vec<Value>,
    stack: Vec<Value>,
    /// Next free stack slot; `stack[sp - 1]` is the top
    sp: usize,
    globals: Vec<Value>,
    /// The executing frame
    frame: Frame,
    /// Suspended callers, outermost first
    frames: Vec<Frame>,
    returned: bool,
}

impl Vm {
    /// Creates a VM for `bytecode` with fresh globals.
    pub fn new(bytecode: Bytecode) -> Self {
        Self::new_with_globals(bytecode, vec![Value::Null; GLOBALS_SIZE])
    }

    /// Creates a VM that continues with the globals of an earlier run.
    pub fn new_with_globals(bytecode: Bytecode, mut globals: Vec<Value>) -> Self {
        if globals.len() < GLOBALS_SIZE {
            globals.resize(GLOBALS_SIZE, Value::Null);
        }
        let main = CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        };
        let main_closure = Rc::new(Closure::new(Rc::new(main)));
        Self {
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals,
            frame: Frame::new(main_closure, 0),
            frames: Vec::new(),
            returned: false,
        }
    }

    /// Returns the value most recently popped off the stack.
    ///
    /// After a run this is the value of the program's last expression
    /// statement. After a failed run it is unspecified.
    pub fn last_popped(&self) -> &Value {
        &self.stack[self.sp.min(STACK_SIZE - 1)]
    }

    /// Returns true if the main program ended with a top-level `return`.
    pub fn returned(&self) -> bool {
        self.returned
    }

    /// Consumes the VM, returning its globals for a later run.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    /// Runs the program to completion.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        debug!(
            bytes = self.frame.instructions().len(),
            constants = self.constants.len(),
            "vm run started"
        );

        loop {
            let Some(byte) = self.frame.next_byte() else {
                if self.frames.is_empty() {
                    break;
                }
                self.return_from_call(Value::Null)?;
                continue;
            };
            let op = Opcode::from_byte(byte).ok_or(RuntimeError::UnknownOpcode(byte))?;

            match op {
                Opcode::Constant => {
                    let index = self.frame.read_u16();
                    self.push(self.constants[index].clone())?;
                }
                Opcode::Pop => {
                    self.pop();
                }
                Opcode::True => self.push(Value::Boolean(true))?,
                Opcode::False => self.push(Value::Boolean(false))?,
                Opcode::Null => self.push(Value::Null)?,

                Opcode::Add => self.binary(BinaryOp::Add)?,
                Opcode::Sub => self.binary(BinaryOp::Sub)?,
                Opcode::Mul => self.binary(BinaryOp::Mul)?,
                Opcode::Div => self.binary(BinaryOp::Div)?,
                Opcode::Equal => self.binary(BinaryOp::Equal)?,
                Opcode::NotEqual => self.binary(BinaryOp::NotEqual)?,
                Opcode::GreaterThan => self.binary(BinaryOp::GreaterThan)?,

                Opcode::Minus => self.prefix(PrefixOp::Negate)?,
                Opcode::Bang => self.prefix(PrefixOp::Not)?,

                Opcode::Jump => {
                    let position = self.frame.read_u16();
                    self.frame.jump_to(position);
                }
                Opcode::JumpNotTruthy => {
                    let position = self.frame.read_u16();
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.frame.jump_to(position);
                    }
                }

                Opcode::SetGlobal => {
                    let index = self.frame.read_u16();
                    self.globals[index] = self.pop();
                }
                Opcode::GetGlobal => {
                    let index = self.frame.read_u16();
                    self.push(self.globals[index].clone())?;
                }
                Opcode::SetLocal => {
                    let index = self.frame.read_u8();
                    let slot = self.frame.base_pointer + index;
                    self.stack[slot] = self.pop();
                }
                Opcode::GetLocal => {
                    let index = self.frame.read_u8();
                    let slot = self.frame.base_pointer + index;
                    self.push(self.stack[slot].clone())?;
                }
                Opcode::GetBuiltin => {
                    let index = self.frame.read_u8();
                    let builtin = builtins::get(index).ok_or(RuntimeError::UnknownBuiltin(index))?;
                    self.push(Value::Builtin(builtin))?;
                }
                Opcode::GetFree => {
                    let index = self.frame.read_u8();
                    let value = self.frame.closure.free[index].clone();
                    self.push(value)?;
                }
                Opcode::CurrentClosure => {
                    let closure = Rc::clone(&self.frame.closure);
                    self.push(Value::Closure(closure))?;
                }

                Opcode::Array => {
                    let count = self.frame.read_u16();
                    let elements = self.stack[self.sp - count..self.sp].to_vec();
                    self.sp -= count;
                    self.push(Value::array(elements))?;
                }
                Opcode::Hash => {
                    let count = self.frame.read_u16();
                    let hash = Value::hash(
                        self.stack[self.sp - count..self.sp]
                            .chunks(2)
                            .map(|pair| (pair[0].clone(), pair[1].clone())),
                    )?;
                    self.sp -= count;
                    self.push(hash)?;
                }
                Opcode::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    self.push(operators::index(&left, &index)?)?;
                }

                Opcode::Call => {
                    let argc = self.frame.read_u8();
                    self.call(argc)?;
                }
                Opcode::ReturnValue => {
                    let value = self.pop();
                    if self.frames.is_empty() {
                        // `pop` left the value at `stack[sp]`, where
                        // `last_popped` finds it.
                        self.returned = true;
                        break;
                    }
                    self.return_from_call(value)?;
                }
                Opcode::Return => {
                    if self.frames.is_empty() {
                        self.push(Value::Null)?;
                        self.pop();
                        self.returned = true;
                        break;
                    }
                    self.return_from_call(Value::Null)?;
                }
                Opcode::Closure => {
                    let index = self.frame.read_u16();
                    let free_count = self.frame.read_u8();
                    self.push_closure(index, free_count)?;
                }
            }
        }

        debug!(sp = self.sp, "vm run finished");
        Ok(())
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.sp >= STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Value {
        self.sp = self.sp.saturating_sub(1);
        self.stack[self.sp].clone()
    }

    fn binary(&mut self, op: BinaryOp) -> Result<(), RuntimeError> {
        let right = self.pop();
        let left = self.pop();
        self.push(operators::binary(op, &left, &right)?)
    }

    fn prefix(&mut self, op: PrefixOp) -> Result<(), RuntimeError> {
        let operand = self.pop();
        self.push(operators::prefix(op, &operand)?)
    }

    fn call(&mut self, argc: usize) -> Result<(), RuntimeError> {
        let callee = self.stack[self.sp - 1 - argc].clone();
        match callee {
            Value::Closure(closure) => self.call_closure(closure, argc),
            Value::Builtin(builtin) => {
                let result = builtin.call(&self.stack[self.sp - argc..self.sp])?;
                self.sp -= argc + 1;
                self.push(result)
            }
            other => Err(RuntimeError::NotCallable(other.type_name())),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, argc: usize) -> Result<(), RuntimeError> {
        if argc != closure.func.num_parameters {
            return Err(RuntimeError::WrongArgumentCount {
                want: closure.func.num_parameters,
                got: argc,
            });
        }
        if self.frames.len() + 2 > MAX_FRAMES {
            return Err(RuntimeError::StackOverflow);
        }

        let base_pointer = self.sp - argc;
        let sp = base_pointer + closure.func.num_locals;
        if sp >= STACK_SIZE {
            return Err(RuntimeError::StackOverflow);
        }

        trace!(depth = self.frames.len() + 1, base_pointer, "push frame");
        let caller = mem::replace(&mut self.frame, Frame::new(closure, base_pointer));
        self.frames.push(caller);
        self.sp = sp;
        Ok(())
    }

    fn return_from_call(&mut self, value: Value) -> Result<(), RuntimeError> {
        let base_pointer = self.frame.base_pointer;
        if let Some(caller) = self.frames.pop() {
            self.frame = caller;
        }
        trace!(depth = self.frames.len(), "pop frame");
        // Drops the callee along with its arguments and locals.
        self.sp = base_pointer - 1;
        self.push(value)
    }

    fn push_closure(&mut self, index: usize, free_count: usize) -> Result<(), RuntimeError> {
        let func = match &self.constants[index] {
            Value::CompiledFunction(func) => Rc::clone(func),
            other => return Err(RuntimeError::NotCallable(other.type_name())),
        };
        let free = self.stack[self.sp - free_count..self.sp].to_vec();
        self.sp -= free_count;
        self.push(Value::Closure(Rc::new(Closure { func, free })))
    }
}
