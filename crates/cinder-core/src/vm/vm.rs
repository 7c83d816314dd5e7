//! Virtual Machine Core
//!
//! Defines the Cinder virtual machine and its fetch-decode-execute loop.
//! A VM is idle until `interpret` compiles a program into a fresh chunk,
//! loads it and runs it to `RETURN` or to the first runtime error.

use std::io::{self, Write};

use crate::bytecode::disassembler::{disassemble_chunk, disassemble_instruction};
use crate::bytecode::{Chunk, OpCode};
use crate::compiler;
use crate::config::VmConfig;
use crate::error::{CinderError, CinderResult, RuntimeError};

use super::memory::Heap;
use super::object::StrRef;
use super::stack::Stack;
use super::table::Table;
use super::value::Value;

/// Outcome of interpreting one program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

impl InterpretResult {
    /// Process exit status, following sysexits
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretResult::Ok => 0,
            InterpretResult::CompileError => 65,
            InterpretResult::RuntimeError => 70,
        }
    }
}

/// Cinder Virtual Machine
#[derive(Debug)]
pub struct VirtualMachine {
    config: VmConfig,
    stack: Stack,
    globals: Table,
    heap: Heap,

    chunk: Chunk,
    ip: usize,
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl VirtualMachine {
    /// Create a new VM instance
    pub fn new(config: VmConfig) -> Self {
        VirtualMachine {
            stack: Stack::new(config.max_stack_size),
            globals: Table::new(),
            heap: Heap::new(),
            chunk: Chunk::new(),
            ip: 0,
            config,
        }
    }

    /// Compile and run `source`, writing program output to stdout and
    /// diagnostics to stderr
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let stdout = io::stdout();
        let stderr = io::stderr();
        self.interpret_with(source, &mut stdout.lock(), &mut stderr.lock())
    }

    /// Compile and run `source` against caller-supplied output streams
    pub fn interpret_with<W: Write, E: Write>(
        &mut self,
        source: &str,
        out: &mut W,
        err: &mut E,
    ) -> InterpretResult {
        let result = self.compile(source).and_then(|chunk| {
            self.load(chunk);
            self.run(out)
        });

        match result {
            Ok(()) => InterpretResult::Ok,
            Err(CinderError::Compile(diagnostics)) => {
                for diagnostic in &diagnostics {
                    let _ = writeln!(err, "{}", diagnostic);
                }
                InterpretResult::CompileError
            }
            Err(error @ CinderError::Runtime { .. }) => {
                let _ = writeln!(err, "{}", error);
                InterpretResult::RuntimeError
            }
            Err(error @ CinderError::Io(_)) => {
                let _ = writeln!(err, "{}", error);
                InterpretResult::RuntimeError
            }
        }
    }

    /// Compile `source` against this VM's heap without running it
    pub fn compile(&mut self, source: &str) -> CinderResult<Chunk> {
        let chunk = compiler::compile(source, &mut self.heap)?;
        if self.config.print_code {
            tracing::debug!("\n{}", disassemble_chunk(&chunk, &self.heap, "code"));
        }
        Ok(chunk)
    }

    /// Make `chunk` the program to execute
    pub fn load(&mut self, chunk: Chunk) {
        self.chunk = chunk;
        self.ip = 0;
        self.stack.clear();
    }

    /// Execute the loaded chunk until `RETURN` or a runtime error
    pub fn run<W: Write>(&mut self, out: &mut W) -> CinderResult<()> {
        loop {
            if self.config.trace_execution {
                self.trace_step();
            }

            let instruction_start = self.ip;
            match self.step(out) {
                Ok(true) => continue,
                Ok(false) => return Ok(()),
                Err(StepError::Runtime(error)) => {
                    let line = self.chunk.line_at(instruction_start);
                    tracing::debug!(line, %error, "runtime error");
                    self.stack.clear();
                    return Err(CinderError::Runtime { error, line });
                }
                Err(StepError::Io(error)) => {
                    self.stack.clear();
                    return Err(CinderError::Io(error));
                }
            }
        }
    }

    /// Execute one instruction; returns false once the chunk has returned
    fn step<W: Write>(&mut self, out: &mut W) -> Result<bool, StepError> {
        let byte = self.read_byte()?;
        let op = OpCode::from_u8(byte).ok_or(RuntimeError::InvalidOpcode(byte))?;

        match op {
            OpCode::Constant => {
                let constant = self.read_constant()?;
                self.stack.push(constant)?;
            }
            OpCode::Nil => self.stack.push(Value::Nil)?,
            OpCode::True => self.stack.push(Value::Bool(true))?,
            OpCode::False => self.stack.push(Value::Bool(false))?,
            OpCode::Pop => {
                self.stack.pop()?;
            }

            // Variables
            OpCode::GetLocal => {
                let slot = self.read_byte()? as usize;
                let value = self.stack.get(slot)?;
                self.stack.push(value)?;
            }
            OpCode::SetLocal => {
                let slot = self.read_byte()? as usize;
                let value = self.stack.peek(0)?;
                self.stack.set(slot, value)?;
            }
            OpCode::GetGlobal => {
                let name = self.read_string()?;
                let value = self
                    .globals
                    .get(name)
                    .ok_or_else(|| self.undefined_variable(name))?;
                self.stack.push(value)?;
            }
            OpCode::DefineGlobal => {
                let name = self.read_string()?;
                let value = self.stack.peek(0)?;
                self.globals.set(name, value);
                self.stack.pop()?;
            }
            OpCode::SetGlobal => {
                let name = self.read_string()?;
                let value = self.stack.peek(0)?;
                if self.globals.set(name, value) {
                    // Assignment never creates a global
                    self.globals.delete(name);
                    return Err(self.undefined_variable(name).into());
                }
            }

            // Comparison
            OpCode::Equal => {
                let b = self.stack.pop()?;
                let a = self.stack.pop()?;
                self.stack.push(Value::Bool(a == b))?;
            }
            OpCode::Greater => self.binary_number_op(|a, b| Value::Bool(a > b))?,
            OpCode::Less => self.binary_number_op(|a, b| Value::Bool(a < b))?,

            // Arithmetic
            OpCode::Add => self.add()?,
            OpCode::Subtract => self.binary_number_op(|a, b| Value::Number(a - b))?,
            OpCode::Multiply => self.binary_number_op(|a, b| Value::Number(a * b))?,
            OpCode::Divide => self.binary_number_op(|a, b| Value::Number(a / b))?,
            OpCode::Not => {
                let value = self.stack.pop()?;
                self.stack.push(Value::Bool(value.is_falsey()))?;
            }
            OpCode::Negate => {
                let n = self
                    .stack
                    .peek(0)?
                    .as_number()
                    .ok_or(RuntimeError::OperandNotNumber)?;
                self.stack.pop()?;
                self.stack.push(Value::Number(-n))?;
            }

            OpCode::Print => {
                let value = self.stack.pop()?;
                writeln!(out, "{}", value.display(&self.heap)).map_err(StepError::Io)?;
            }

            // Control flow
            OpCode::Jump => {
                let offset = self.read_u16()? as usize;
                self.ip += offset;
            }
            OpCode::JumpIfFalse => {
                let offset = self.read_u16()? as usize;
                if self.stack.peek(0)?.is_falsey() {
                    self.ip += offset;
                }
            }
            OpCode::Loop => {
                let offset = self.read_u16()? as usize;
                self.ip = self
                    .ip
                    .checked_sub(offset)
                    .ok_or(RuntimeError::BytecodeTooShort)?;
            }
            OpCode::Return => return Ok(false),
        }

        Ok(true)
    }

    /// Pop two numbers, push `op(a, b)`
    fn binary_number_op(&mut self, op: impl Fn(f64, f64) -> Value) -> Result<(), RuntimeError> {
        let a = self.stack.peek(1)?.as_number();
        let b = self.stack.peek(0)?.as_number();
        let (Some(a), Some(b)) = (a, b) else {
            return Err(RuntimeError::OperandsNotNumbers);
        };
        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(op(a, b))
    }

    /// Numeric addition or string concatenation
    fn add(&mut self) -> Result<(), RuntimeError> {
        let b = self.stack.peek(0)?;
        let a = self.stack.peek(1)?;

        let result = match (a, b) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            _ => match (a.as_string(), b.as_string()) {
                (Some(a), Some(b)) => {
                    let left = self.heap.string(a);
                    let right = self.heap.string(b);
                    let mut joined = String::with_capacity(left.len() + right.len());
                    joined.push_str(left);
                    joined.push_str(right);
                    Value::string(self.heap.take_string(joined))
                }
                _ => return Err(RuntimeError::OperandsNotAddable),
            },
        };

        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push(result)
    }

    fn undefined_variable(&self, name: StrRef) -> RuntimeError {
        RuntimeError::UndefinedVariable(self.heap.string(name).to_string())
    }

    /// Read next byte from instruction stream
    fn read_byte(&mut self) -> Result<u8, RuntimeError> {
        let byte = self
            .chunk
            .code()
            .get(self.ip)
            .copied()
            .ok_or(RuntimeError::BytecodeTooShort)?;
        self.ip += 1;
        Ok(byte)
    }

    /// Read a big-endian u16 operand
    fn read_u16(&mut self) -> Result<u16, RuntimeError> {
        let high = self.read_byte()?;
        let low = self.read_byte()?;
        Ok(u16::from_be_bytes([high, low]))
    }

    fn read_constant(&mut self) -> Result<Value, RuntimeError> {
        let index = self.read_byte()? as usize;
        self.chunk
            .constant(index)
            .ok_or(RuntimeError::InvalidConstant(index))
    }

    fn read_string(&mut self) -> Result<StrRef, RuntimeError> {
        let index = self.read_byte()? as usize;
        self.chunk
            .constant(index)
            .and_then(|value| value.as_string())
            .ok_or(RuntimeError::InvalidConstant(index))
    }

    fn trace_step(&self) {
        let mut line = String::from("          ");
        for value in self.stack.as_slice() {
            line.push_str(&format!("[ {} ]", value.display(&self.heap)));
        }
        if self.ip < self.chunk.len() {
            line.push('\n');
            disassemble_instruction(&self.chunk, &self.heap, self.ip, &mut line);
        }
        tracing::trace!("{}", line.trim_end());
    }

    /// Look up a global by name
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals
            .iter()
            .find_map(|(key, value)| (self.heap.string(key) == name).then_some(value))
    }

    pub fn stack_size(&self) -> usize {
        self.stack.size()
    }
}

/// Failure inside a single step, before it is tagged with a source line
enum StepError {
    Runtime(RuntimeError),
    Io(io::Error),
}

impl From<RuntimeError> for StepError {
    fn from(error: RuntimeError) -> Self {
        StepError::Runtime(error)
    }
}
