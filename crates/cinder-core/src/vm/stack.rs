//! VM Stack Implementation
//!
//! Bounds-checked operand stack. Local variables live in slots addressed
//! from the bottom; temporaries are pushed above them.

use crate::error::RuntimeError;
use super::value::Value;

/// VM operand stack
#[derive(Debug)]
pub struct Stack {
    values: Vec<Value>,
    max_size: usize,
}

impl Stack {
    /// Create new stack with maximum size
    pub fn new(max_size: usize) -> Self {
        Stack {
            values: Vec::with_capacity(max_size.min(256)),
            max_size,
        }
    }

    /// Push value onto stack
    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.values.len() >= self.max_size {
            return Err(RuntimeError::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop value from stack
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Look `distance` values down from the top without removing (0 = top)
    pub fn peek(&self, distance: usize) -> Result<Value, RuntimeError> {
        self.values
            .len()
            .checked_sub(distance + 1)
            .map(|index| self.values[index])
            .ok_or(RuntimeError::StackUnderflow)
    }

    /// Read an absolute slot
    pub fn get(&self, slot: usize) -> Result<Value, RuntimeError> {
        self.values
            .get(slot)
            .copied()
            .ok_or(RuntimeError::InvalidSlot(slot))
    }

    /// Overwrite an absolute slot
    pub fn set(&mut self, slot: usize, value: Value) -> Result<(), RuntimeError> {
        let target = self
            .values
            .get_mut(slot)
            .ok_or(RuntimeError::InvalidSlot(slot))?;
        *target = value;
        Ok(())
    }

    /// Get current stack size
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Check if stack is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clear stack
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Values from bottom to top
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_beyond_capacity_overflows() {
        let mut stack = Stack::new(2);
        stack.push(Value::Nil).unwrap();
        stack.push(Value::Nil).unwrap();
        assert_eq!(stack.push(Value::Nil), Err(RuntimeError::StackOverflow));
        assert_eq!(stack.size(), 2);
    }

    #[test]
    fn peek_counts_down_from_top() {
        let mut stack = Stack::new(8);
        stack.push(Value::Number(1.0)).unwrap();
        stack.push(Value::Number(2.0)).unwrap();
        assert_eq!(stack.peek(0), Ok(Value::Number(2.0)));
        assert_eq!(stack.peek(1), Ok(Value::Number(1.0)));
        assert_eq!(stack.peek(2), Err(RuntimeError::StackUnderflow));
    }

    #[test]
    fn slots_are_addressed_from_bottom() {
        let mut stack = Stack::new(8);
        stack.push(Value::Number(1.0)).unwrap();
        stack.push(Value::Number(2.0)).unwrap();
        stack.set(0, Value::Bool(true)).unwrap();
        assert_eq!(stack.get(0), Ok(Value::Bool(true)));
        assert_eq!(stack.get(5), Err(RuntimeError::InvalidSlot(5)));
        assert_eq!(stack.pop(), Ok(Value::Number(2.0)));
        stack.clear();
        assert_eq!(stack.pop(), Err(RuntimeError::StackUnderflow));
    }
}
