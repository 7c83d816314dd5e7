//! Bytecode Chunk
//!
//! An append-only instruction stream with a parallel source-line table and
//! a constant pool. Constant operands are a single byte, so a chunk holds at
//! most 256 constants.

use crate::vm::value::Value;

use super::opcode::OpCode;

/// Maximum number of constants addressable by a one-byte operand
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

/// A compiled unit of bytecode
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    code: Vec<u8>,
    lines: Vec<u32>,
    constants: Vec<Value>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte produced by `line`
    pub fn write(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write(op as u8, line);
    }

    /// Append a constant and return its index, or `None` once the pool is full
    pub fn add_constant(&mut self, value: Value) -> Option<u8> {
        if self.constants.len() >= MAX_CONSTANTS {
            return None;
        }
        self.constants.push(value);
        u8::try_from(self.constants.len() - 1).ok()
    }

    /// Overwrite a big-endian u16 operand at `offset`
    pub(crate) fn patch_u16(&mut self, offset: usize, value: u16) {
        let [high, low] = value.to_be_bytes();
        self.code[offset] = high;
        self.code[offset + 1] = low;
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    /// Source line of the byte at `offset`
    pub fn line_at(&self, offset: usize) -> u32 {
        self.lines.get(offset).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}
