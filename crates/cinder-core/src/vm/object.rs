//! Heap Object Model
//!
//! Heap records owned by the VM's object registry, and the typed handles
//! values use to refer to them.

/// FNV-1a offset basis (32-bit)
const FNV_OFFSET_BASIS: u32 = 2_166_136_261;

/// FNV-1a prime (32-bit)
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a over the raw bytes of a string
pub fn hash_string(chars: &str) -> u32 {
    chars.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Handle to an interned string.
///
/// Carries the string's cached hash so tables can probe without reaching
/// into the heap. Two handles are equal iff they name the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrRef {
    index: u32,
    hash: u32,
}

impl StrRef {
    pub(crate) fn new(index: u32, hash: u32) -> Self {
        StrRef { index, hash }
    }

    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn hash(self) -> u32 {
        self.hash
    }
}

/// Typed reference to any heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjRef {
    String(StrRef),
}

/// Immutable interned string
#[derive(Debug)]
pub struct ObjString {
    chars: Box<str>,
}

impl ObjString {
    pub(crate) fn new(chars: Box<str>) -> Self {
        ObjString { chars }
    }

    pub fn as_str(&self) -> &str {
        &self.chars
    }
}

/// A heap record in the registry
#[derive(Debug)]
pub enum Obj {
    String(ObjString),
}

impl Obj {
    pub fn as_string(&self) -> Option<&ObjString> {
        match self {
            Obj::String(s) => Some(s),
        }
    }
}
