//! Cinder - Core Library
//!
//! Single-pass bytecode compiler and stack virtual machine for a small,
//! dynamically typed scripting language.

pub mod bytecode;
pub mod compiler;
pub mod config;
pub mod error;
pub mod vm;

// Re-export commonly used types
pub use bytecode::{Chunk, OpCode};
pub use compiler::compile;
pub use config::VmConfig;
pub use error::{CinderError, CinderResult, Diagnostic, RuntimeError};
pub use vm::{Heap, InterpretResult, Value, VirtualMachine};
