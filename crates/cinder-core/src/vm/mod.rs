pub mod memory;
pub mod object;
pub mod stack;
pub mod table;
pub mod value;
pub mod vm;

pub use memory::Heap;
pub use object::{ObjRef, StrRef};
pub use table::Table;
pub use value::Value;
pub use vm::{InterpretResult, VirtualMachine};
