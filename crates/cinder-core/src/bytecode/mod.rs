pub mod chunk;
pub mod disassembler;
pub mod opcode;

pub use chunk::Chunk;
pub use opcode::OpCode;
