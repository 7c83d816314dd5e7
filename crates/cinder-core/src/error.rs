//! Cinder Error Types
//!
//! Defines the two error taxonomies of the engine: compile-time diagnostics,
//! which are collected while parsing continues, and runtime errors, which
//! abort the running program.

use std::fmt;
use std::io;

use thiserror::Error;

/// Failures detected while executing bytecode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    // Type errors
    #[error("Operand must be a number.")]
    OperandNotNumber,
    #[error("Operands must be numbers.")]
    OperandsNotNumbers,
    #[error("Operands must be two numbers or two strings.")]
    OperandsNotAddable,

    // Name resolution
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),

    // Resource limits
    #[error("Stack overflow.")]
    StackOverflow,

    // Malformed bytecode; the compiler never produces these
    #[error("Stack underflow.")]
    StackUnderflow,
    #[error("Invalid opcode: 0x{0:02X}.")]
    InvalidOpcode(u8),
    #[error("Invalid constant index: {0}.")]
    InvalidConstant(usize),
    #[error("Invalid stack slot: {0}.")]
    InvalidSlot(usize),
    #[error("Unexpected end of bytecode.")]
    BytecodeTooShort,
}

/// Where in the source a compile diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// At a concrete token.
    At(String),
    /// At the end of input.
    AtEnd,
    /// Scanner errors carry their own message and no lexeme.
    Unlocated,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::At(lexeme) => write!(f, " at '{}'", lexeme),
            Location::AtEnd => write!(f, " at end"),
            Location::Unlocated => Ok(()),
        }
    }
}

/// A single compile error report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct Diagnostic {
    pub line: u32,
    pub location: Location,
    pub message: String,
}

/// Top-level error type of the engine.
#[derive(Debug, Error)]
pub enum CinderError {
    #[error("compilation failed with {} error(s)", .0.len())]
    Compile(Vec<Diagnostic>),

    #[error("{error}\n[line {line}] in script")]
    Runtime { error: RuntimeError, line: u32 },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type CinderResult<T> = Result<T, CinderError>;
