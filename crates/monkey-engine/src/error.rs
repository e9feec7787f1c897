//! Error types for every stage of the pipeline.

use std::fmt;

use thiserror::Error;

use crate::lexer::{Span, TokenKind};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while evaluating Monkey source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The source did not parse
    #[error("{0}")]
    Parse(#[from] ParseErrors),

    /// The program did not compile
    #[error("{0}")]
    Compile(#[from] CompileErrors),

    /// Execution failed
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

/// A single syntax error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A specific token was required next
    #[error("expected next token to be {expected}, got {found} instead")]
    UnexpectedToken {
        /// What the parser wanted
        expected: String,
        /// What it found
        found: TokenKind,
        /// Where it found it
        span: Span,
    },

    /// The token cannot start an expression
    #[error("no prefix parse function for {token} found")]
    NoPrefixParse {
        /// The offending token
        token: TokenKind,
        /// Where it was found
        span: Span,
    },

    /// An integer literal does not fit in 64 bits
    #[error("could not parse {literal} as integer")]
    InvalidInteger {
        /// The literal source text
        literal: String,
        /// Where it was found
        span: Span,
    },
}

/// All syntax errors found in one parse.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseErrors(pub Vec<ParseError>);

impl ParseErrors {
    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the errors in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.0.iter()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("\n"))
    }
}

impl std::error::Error for ParseErrors {}

/// A compile-time error. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// An identifier that no enclosing scope defines
    #[error("undefined variable {0}")]
    UndefinedVariable(String),

    /// An operator token the instruction set has no opcode for
    #[error("unknown operator {0}")]
    UnknownOperator(String),

    /// A literal (or parameter list) whose size does not fit its operand
    #[error("malformed literal: {0}")]
    MalformedLiteral(String),
}

/// Every independent top-level compile error of one input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompileErrors(pub Vec<CompileError>);

impl CompileErrors {
    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the errors in statement order.
    pub fn iter(&self) -> std::slice::Iter<'_, CompileError> {
        self.0.iter()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("\n"))
    }
}

impl std::error::Error for CompileErrors {}

impl From<CompileError> for CompileErrors {
    fn from(error: CompileError) -> Self {
        CompileErrors(vec![error])
    }
}

impl From<CompileError> for Error {
    fn from(error: CompileError) -> Self {
        Error::Compile(error.into())
    }
}

/// An execution error, shared by the VM and the tree-walking evaluator so
/// both report identical messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Operands of different types
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        /// Left operand type
        left: &'static str,
        /// Operator text
        operator: String,
        /// Right operand type
        right: &'static str,
    },

    /// A binary operator the operand types do not support
    #[error("unknown operator: {left} {operator} {right}")]
    UnknownInfixOperator {
        /// Left operand type
        left: &'static str,
        /// Operator text
        operator: String,
        /// Right operand type
        right: &'static str,
    },

    /// A prefix operator the operand type does not support
    #[error("unknown operator: {operator}{operand}")]
    UnknownPrefixOperator {
        /// Operator text
        operator: String,
        /// Operand type
        operand: &'static str,
    },

    /// Name lookup failed (tree-walking evaluator only)
    #[error("identifier not found: {0}")]
    IdentifierNotFound(String),

    /// Indexing a value that is neither an array nor a hash
    #[error("index operator not supported: {0}")]
    IndexNotSupported(&'static str),

    /// Using an unhashable value as a hash key
    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),

    /// Calling something that is not a function
    #[error("not a function: {0}")]
    NotCallable(&'static str),

    /// Argument count does not match the function's parameters
    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongArgumentCount {
        /// Declared parameter count
        want: usize,
        /// Supplied argument count
        got: usize,
    },

    /// A builtin rejected its arguments
    #[error("{0}")]
    Builtin(String),

    /// Integer division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Operand stack or call stack exhausted
    #[error("stack overflow")]
    StackOverflow,

    /// The instruction stream contains a byte that is not an opcode
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// A builtin operand past the end of the registry
    #[error("unknown builtin {0}")]
    UnknownBuiltin(usize),
}
