//! Bytecode Opcode Definitions
//!
//! Defines the raw opcode set for Cinder bytecode.
//! This file contains no execution semantics.

/// Bytecode opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    // Constants and literals
    Constant = 0x00,
    Nil      = 0x01,
    True     = 0x02,
    False    = 0x03,

    // Stack
    Pop = 0x04,

    // Variables
    GetLocal     = 0x10,
    SetLocal     = 0x11,
    GetGlobal    = 0x12,
    DefineGlobal = 0x13,
    SetGlobal    = 0x14,

    // Comparison
    Equal   = 0x20,
    Greater = 0x21,
    Less    = 0x22,

    // Arithmetic and logic
    Add      = 0x30,
    Subtract = 0x31,
    Multiply = 0x32,
    Divide   = 0x33,
    Not      = 0x34,
    Negate   = 0x35,

    // Output
    Print = 0x40,

    // Control flow
    Jump        = 0x50,
    JumpIfFalse = 0x51,
    Loop        = 0x52,
    Return      = 0x53,
}

impl OpCode {
    /// Convert raw byte to opcode
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(OpCode::Constant),
            0x01 => Some(OpCode::Nil),
            0x02 => Some(OpCode::True),
            0x03 => Some(OpCode::False),

            0x04 => Some(OpCode::Pop),

            0x10 => Some(OpCode::GetLocal),
            0x11 => Some(OpCode::SetLocal),
            0x12 => Some(OpCode::GetGlobal),
            0x13 => Some(OpCode::DefineGlobal),
            0x14 => Some(OpCode::SetGlobal),

            0x20 => Some(OpCode::Equal),
            0x21 => Some(OpCode::Greater),
            0x22 => Some(OpCode::Less),

            0x30 => Some(OpCode::Add),
            0x31 => Some(OpCode::Subtract),
            0x32 => Some(OpCode::Multiply),
            0x33 => Some(OpCode::Divide),
            0x34 => Some(OpCode::Not),
            0x35 => Some(OpCode::Negate),

            0x40 => Some(OpCode::Print),

            0x50 => Some(OpCode::Jump),
            0x51 => Some(OpCode::JumpIfFalse),
            0x52 => Some(OpCode::Loop),
            0x53 => Some(OpCode::Return),

            _ => None,
        }
    }

    /// Name used by the disassembler
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Pop => "OP_POP",
            OpCode::GetLocal => "OP_GET_LOCAL",
            OpCode::SetLocal => "OP_SET_LOCAL",
            OpCode::GetGlobal => "OP_GET_GLOBAL",
            OpCode::DefineGlobal => "OP_DEFINE_GLOBAL",
            OpCode::SetGlobal => "OP_SET_GLOBAL",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Print => "OP_PRINT",
            OpCode::Jump => "OP_JUMP",
            OpCode::JumpIfFalse => "OP_JUMP_IF_FALSE",
            OpCode::Loop => "OP_LOOP",
            OpCode::Return => "OP_RETURN",
        }
    }

    /// Number of operand bytes following the opcode
    pub fn operand_len(self) -> usize {
        match self {
            OpCode::Constant
            | OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetGlobal
            | OpCode::DefineGlobal
            | OpCode::SetGlobal => 1,

            OpCode::Jump | OpCode::JumpIfFalse | OpCode::Loop => 2,

            _ => 0,
        }
    }
}
