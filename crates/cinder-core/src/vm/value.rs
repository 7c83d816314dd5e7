//! Runtime Value Representation
//!
//! Defines the tagged values manipulated by the Cinder virtual machine.

use std::fmt;

use super::memory::Heap;
use super::object::{ObjRef, StrRef};

/// Runtime value
///
/// Equality is structural: same variant and equal payload. Object payloads
/// compare by handle, which is content equality for interned strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Absence of a value
    Nil,

    /// Boolean value
    Bool(bool),

    /// Numeric value (IEEE 754)
    Number(f64),

    /// Reference into the heap registry
    Obj(ObjRef),
}

impl Value {
    pub fn string(r: StrRef) -> Self {
        Value::Obj(ObjRef::String(r))
    }

    /// `nil` and `false` are falsey; everything else is truthy
    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<StrRef> {
        match self {
            Value::Obj(ObjRef::String(s)) => Some(*s),
            _ => None,
        }
    }

    /// Canonical textual rendering; strings are resolved through `heap`
    pub fn display<'a>(&self, heap: &'a Heap) -> ValueDisplay<'a> {
        ValueDisplay { value: *self, heap }
    }
}

/// `Display` adapter pairing a value with the heap that owns its objects
pub struct ValueDisplay<'a> {
    value: Value,
    heap: &'a Heap,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(n)),
            Value::Obj(ObjRef::String(s)) => write!(f, "{}", self.heap.string(s)),
        }
    }
}

/// Significant digits of the general number format
const GENERAL_PRECISION: i32 = 6;

/// Render a number like C's `%g`: six significant digits, trailing zeros
/// dropped, exponent form outside `1e-4 <= |n| < 1e6`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return if n.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Rounding to the target precision decides the exponent, so 999999.5
    // becomes 1e+06 rather than 999999.
    let sci = format!("{:.*e}", (GENERAL_PRECISION - 1) as usize, n);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= GENERAL_PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_fraction_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (GENERAL_PRECISION - 1 - exponent) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, n)).to_string()
    }
}

fn strip_fraction_zeros(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_nil_and_false_are_falsey() {
        assert!(Value::Nil.is_falsey());
        assert!(Value::Bool(false).is_falsey());
        assert!(!Value::Bool(true).is_falsey());
        assert!(!Value::Number(0.0).is_falsey());
    }

    #[test]
    fn equality_requires_matching_tags() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Number(0.0), Value::Bool(false));
        assert_eq!(Value::Number(1.5), Value::Number(1.5));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn numbers_use_general_format() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(1.2), "1.2");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(100.0), "100");
        assert_eq!(format_number(123456.0), "123456");
        assert_eq!(format_number(1234567.0), "1.23457e+06");
        assert_eq!(format_number(1e6), "1e+06");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(2.5e-10), "2.5e-10");
        assert_eq!(format_number(1e100), "1e+100");
        assert_eq!(format_number(3.14159265), "3.14159");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "-0");
        assert_eq!(format_number(f64::INFINITY), "inf");
        assert_eq!(format_number(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_number(f64::NAN), "nan");
    }
}
