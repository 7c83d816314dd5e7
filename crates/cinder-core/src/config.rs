//! Cinder Configuration
//!
//! Defines runtime limits and diagnostic switches for the virtual machine.
//! Configuration specifies constraints only; enforcement is handled by the VM.

/// VM Configuration
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Maximum operand stack depth; exceeding it is a runtime error
    pub max_stack_size: usize,

    /// Log every executed instruction together with the operand stack
    pub trace_execution: bool,

    /// Log the disassembly of every successfully compiled chunk
    pub print_code: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            max_stack_size: 1024,
            trace_execution: false,
            print_code: false,
        }
    }
}

impl VmConfig {
    /// Create a new configuration with default limits
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn with_trace_execution(mut self, enabled: bool) -> Self {
        self.trace_execution = enabled;
        self
    }

    pub fn with_print_code(mut self, enabled: bool) -> Self {
        self.print_code = enabled;
        self
    }
}
