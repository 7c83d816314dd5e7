//! Bytecode Disassembler
//!
//! Human-readable listing of a chunk, one line per instruction. Diagnostic
//! only; execution never depends on it.

use std::fmt::Write;

use crate::vm::memory::Heap;

use super::chunk::Chunk;
use super::opcode::OpCode;

/// Render the whole chunk under a `== name ==` header
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", name);

    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, heap, offset, &mut out);
    }
    out
}

/// Render the instruction at `offset`; returns the offset of the next one
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize, out: &mut String) -> usize {
    let _ = write!(out, "{:04} ", offset);
    let Some(byte) = operand(chunk, offset) else {
        let _ = writeln!(out, "<end of chunk>");
        return chunk.len();
    };

    if offset > 0 && chunk.line_at(offset) == chunk.line_at(offset - 1) {
        out.push_str("   | ");
    } else {
        let _ = write!(out, "{:4} ", chunk.line_at(offset));
    }

    let Some(op) = OpCode::from_u8(byte) else {
        let _ = writeln!(out, "Unknown opcode {}", byte);
        return offset + 1;
    };

    let next = offset + 1 + op.operand_len();
    if next > chunk.len() {
        let _ = writeln!(out, "{} <truncated>", op.mnemonic());
        return chunk.len();
    }

    match op {
        OpCode::Constant | OpCode::GetGlobal | OpCode::DefineGlobal | OpCode::SetGlobal => {
            constant_instruction(op, chunk, heap, offset, out)
        }
        OpCode::GetLocal | OpCode::SetLocal => {
            let _ = writeln!(out, "{:<16} {:4}", op.mnemonic(), chunk.code()[offset + 1]);
        }
        OpCode::Jump | OpCode::JumpIfFalse => jump_instruction(op, 1, chunk, offset, out),
        OpCode::Loop => jump_instruction(op, -1, chunk, offset, out),
        _ => {
            let _ = writeln!(out, "{}", op.mnemonic());
        }
    }
    next
}

fn operand(chunk: &Chunk, offset: usize) -> Option<u8> {
    chunk.code().get(offset).copied()
}

/// Operands of `op` at `offset` are known to be in bounds
fn constant_instruction(op: OpCode, chunk: &Chunk, heap: &Heap, offset: usize, out: &mut String) {
    let index = chunk.code()[offset + 1];
    match chunk.constant(index as usize) {
        Some(value) => {
            let _ = writeln!(out, "{:<16} {:4} '{}'", op.mnemonic(), index, value.display(heap));
        }
        None => {
            let _ = writeln!(out, "{:<16} {:4} <invalid>", op.mnemonic(), index);
        }
    }
}

fn jump_instruction(op: OpCode, sign: i64, chunk: &Chunk, offset: usize, out: &mut String) {
    let code = chunk.code();
    let jump = i64::from(u16::from_be_bytes([code[offset + 1], code[offset + 2]]));
    let target = offset as i64 + 3 + sign * jump;
    let _ = writeln!(out, "{:<16} {:4} -> {}", op.mnemonic(), offset, target);
}
