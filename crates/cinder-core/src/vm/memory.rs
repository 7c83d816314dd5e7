//! VM Memory Model
//!
//! The heap is the object registry: an arena owning every object allocated
//! while compiling or running a program, plus the intern set that keeps
//! string contents unique. Everything is freed together when the heap goes.

use super::object::{hash_string, Obj, ObjString, StrRef};
use super::table::Table;
use super::value::Value;

/// Object registry and string interner
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Obj>,
    strings: Table,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a copy of `chars`
    pub fn copy_string(&mut self, chars: &str) -> StrRef {
        let hash = hash_string(chars);
        if let Some(interned) = self.strings.find_string(chars, hash, &self.objects) {
            return interned;
        }
        self.allocate_string(chars.into(), hash)
    }

    /// Intern `chars`, taking ownership of the buffer. The buffer is
    /// dropped when an equal string is already interned.
    pub fn take_string(&mut self, chars: String) -> StrRef {
        let hash = hash_string(&chars);
        if let Some(interned) = self.strings.find_string(&chars, hash, &self.objects) {
            return interned;
        }
        self.allocate_string(chars.into_boxed_str(), hash)
    }

    fn allocate_string(&mut self, chars: Box<str>, hash: u32) -> StrRef {
        let index = u32::try_from(self.objects.len()).unwrap_or(u32::MAX);
        let handle = StrRef::new(index, hash);
        self.objects.push(Obj::String(ObjString::new(chars)));
        self.strings.set(handle, Value::Nil);
        handle
    }

    /// Contents of an interned string
    pub fn string(&self, handle: StrRef) -> &str {
        self.objects
            .get(handle.index())
            .and_then(Obj::as_string)
            .map_or("", ObjString::as_str)
    }

    /// Number of live objects in the registry
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Release every object at once
    pub fn free_objects(&mut self) {
        tracing::trace!(objects = self.objects.len(), "freeing heap objects");
        self.objects.clear();
        self.strings = Table::new();
    }
}

impl Drop for Heap {
    fn drop(&mut self) {
        self.free_objects();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_and_take_intern_to_same_object() {
        let mut heap = Heap::new();
        let copied = heap.copy_string("hello");
        let taken = heap.take_string(String::from("hello"));
        assert_eq!(copied, taken);
        assert_eq!(heap.object_count(), 1);
        assert_eq!(heap.string(copied), "hello");
    }

    #[test]
    fn interning_survives_intern_table_growth() {
        let mut heap = Heap::new();
        let first = heap.copy_string("needle");
        for i in 0..200 {
            heap.copy_string(&format!("hay{}", i));
        }
        let again = heap.take_string("needle".to_string());
        assert_eq!(first, again);
        assert_eq!(Value::string(first), Value::string(again));
        assert_eq!(heap.object_count(), 201);
    }

    #[test]
    fn distinct_contents_get_distinct_objects() {
        let mut heap = Heap::new();
        let a = heap.copy_string("a");
        let b = heap.copy_string("b");
        let empty = heap.copy_string("");
        assert_ne!(a, b);
        assert_eq!(heap.string(empty), "");
        assert_eq!(heap.object_count(), 3);
    }

    #[test]
    fn free_objects_empties_registry() {
        let mut heap = Heap::new();
        heap.copy_string("x");
        heap.free_objects();
        assert_eq!(heap.object_count(), 0);
        let x = heap.copy_string("x");
        assert_eq!(heap.string(x), "x");
    }
}
