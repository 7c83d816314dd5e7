//! Open-Addressing Hash Table
//!
//! Maps interned strings to values with linear probing. Keys compare by
//! handle identity; only `find_string` compares contents, because it runs
//! before the candidate string exists.
//!
//! A slot with no key is empty when its value is `nil` and a tombstone
//! when its value is `true`. Probes stop at empty slots and walk past
//! tombstones, so deleting never breaks a probe chain.

use super::object::{Obj, StrRef};
use super::value::Value;

/// Resize once live entries plus tombstones would exceed this fraction
const TABLE_MAX_LOAD: f64 = 0.75;

/// Smallest non-zero capacity
const MIN_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy)]
struct Entry {
    key: Option<StrRef>,
    value: Value,
}

impl Entry {
    const EMPTY: Entry = Entry { key: None, value: Value::Nil };
    const TOMBSTONE: Entry = Entry { key: None, value: Value::Bool(true) };

    fn is_empty(&self) -> bool {
        self.key.is_none() && self.value == Value::Nil
    }
}

/// String-keyed hash table
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<Entry>,
    /// Live entries plus tombstones
    count: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupied slots, tombstones included
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Look up `key`
    pub fn get(&self, key: StrRef) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        let entry = &self.entries[find_entry(&self.entries, key)];
        entry.key.map(|_| entry.value)
    }

    /// Insert or overwrite `key`; returns true if the key was not present
    pub fn set(&mut self, key: StrRef, value: Value) -> bool {
        if (self.count + 1) as f64 > self.entries.len() as f64 * TABLE_MAX_LOAD {
            let capacity = (self.entries.len() * 2).max(MIN_CAPACITY);
            self.adjust_capacity(capacity);
        }

        let index = find_entry(&self.entries, key);
        let entry = &mut self.entries[index];
        let is_new_key = entry.key.is_none();
        // Reusing a tombstone does not change the count
        if entry.is_empty() {
            self.count += 1;
        }

        entry.key = Some(key);
        entry.value = value;
        is_new_key
    }

    /// Remove `key`, leaving a tombstone; returns true if it was present
    pub fn delete(&mut self, key: StrRef) -> bool {
        if self.count == 0 {
            return false;
        }

        let index = find_entry(&self.entries, key);
        if self.entries[index].key.is_none() {
            return false;
        }
        self.entries[index] = Entry::TOMBSTONE;
        true
    }

    /// Copy every live entry of `self` into `to`
    pub fn add_all(&self, to: &mut Table) {
        for entry in &self.entries {
            if let Some(key) = entry.key {
                to.set(key, entry.value);
            }
        }
    }

    /// Iterate over live entries
    pub fn iter(&self) -> impl Iterator<Item = (StrRef, Value)> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.key.map(|key| (key, entry.value)))
    }

    /// Find a key whose contents equal `chars`. Used only for interning.
    pub fn find_string(&self, chars: &str, hash: u32, objects: &[Obj]) -> Option<StrRef> {
        if self.count == 0 {
            return None;
        }

        let capacity = self.entries.len();
        let mut index = hash as usize % capacity;
        loop {
            let entry = &self.entries[index];
            match entry.key {
                None if entry.value == Value::Nil => return None,
                None => {}
                Some(key) => {
                    let matches = key.hash() == hash
                        && objects
                            .get(key.index())
                            .and_then(Obj::as_string)
                            .is_some_and(|s| s.as_str() == chars);
                    if matches {
                        return Some(key);
                    }
                }
            }
            index = (index + 1) % capacity;
        }
    }

    fn adjust_capacity(&mut self, capacity: usize) {
        tracing::trace!(from = self.entries.len(), to = capacity, "resizing table");

        let mut entries = vec![Entry::EMPTY; capacity];
        self.count = 0;
        for entry in &self.entries {
            let Some(key) = entry.key else { continue };
            let dest = find_entry(&entries, key);
            entries[dest] = *entry;
            self.count += 1;
        }
        self.entries = entries;
    }
}

/// Index of the slot holding `key`, or of the slot an insertion should use:
/// the first tombstone passed, else the empty slot that ended the probe.
fn find_entry(entries: &[Entry], key: StrRef) -> usize {
    let capacity = entries.len();
    let mut index = key.hash() as usize % capacity;
    let mut tombstone = None;

    loop {
        let entry = &entries[index];
        match entry.key {
            None if entry.value == Value::Nil => return tombstone.unwrap_or(index),
            None => {
                tombstone.get_or_insert(index);
            }
            Some(k) if k == key => return index,
            Some(_) => {}
        }
        index = (index + 1) % capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(index: u32, hash: u32) -> StrRef {
        StrRef::new(index, hash)
    }

    #[test]
    fn get_on_empty_table_misses() {
        let table = Table::new();
        assert_eq!(table.get(key(0, 1)), None);
        assert_eq!(table.capacity(), 0);
    }

    #[test]
    fn set_reports_new_keys_and_overwrites() {
        let mut table = Table::new();
        let a = key(0, 7);
        assert!(table.set(a, Value::Number(1.0)));
        assert!(!table.set(a, Value::Number(2.0)));
        assert_eq!(table.get(a), Some(Value::Number(2.0)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.capacity(), 8);
    }

    #[test]
    fn colliding_keys_probe_linearly() {
        let mut table = Table::new();
        // Same hash, different identities
        let a = key(0, 3);
        let b = key(1, 3);
        let c = key(2, 3);
        table.set(a, Value::Number(1.0));
        table.set(b, Value::Number(2.0));
        table.set(c, Value::Number(3.0));

        assert_eq!(table.get(a), Some(Value::Number(1.0)));
        assert_eq!(table.get(b), Some(Value::Number(2.0)));
        assert_eq!(table.get(c), Some(Value::Number(3.0)));
    }

    #[test]
    fn delete_leaves_tombstone_that_keeps_probe_chain() {
        let mut table = Table::new();
        let a = key(0, 3);
        let b = key(1, 3);
        table.set(a, Value::Nil);
        table.set(b, Value::Bool(false));

        assert!(table.delete(a));
        assert!(!table.delete(a));
        assert_eq!(table.get(a), None);
        // b sits after the tombstone in the same chain
        assert_eq!(table.get(b), Some(Value::Bool(false)));
        // Tombstones still count as occupied
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn reinserting_deleted_key_reuses_its_tombstone() {
        let mut table = Table::new();
        let a = key(0, 5);
        table.set(a, Value::Number(1.0));
        let before = table.len();
        for _ in 0..10 {
            table.delete(a);
            assert!(table.set(a, Value::Number(2.0)));
        }
        assert_eq!(table.len(), before);
        assert_eq!(table.get(a), Some(Value::Number(2.0)));
    }

    #[test]
    fn resize_keeps_live_entries_and_drops_tombstones() {
        let mut table = Table::new();
        let keys: Vec<StrRef> = (0..20).map(|i| key(i, i.wrapping_mul(2_654_435_761))).collect();
        for (i, k) in keys.iter().enumerate() {
            table.set(*k, Value::Number(i as f64));
        }
        for k in keys.iter().step_by(2) {
            table.delete(*k);
        }
        for i in 20..40 {
            table.set(key(i, i), Value::Nil);
        }

        for (i, k) in keys.iter().enumerate() {
            let expected = if i % 2 == 0 { None } else { Some(Value::Number(i as f64)) };
            assert_eq!(table.get(*k), expected);
        }
        assert!(table.capacity() >= 32);
        assert_eq!(table.iter().count(), 30);
    }

    #[test]
    fn add_all_copies_live_entries() {
        let mut from = Table::new();
        let a = key(0, 1);
        let b = key(1, 2);
        from.set(a, Value::Number(1.0));
        from.set(b, Value::Number(2.0));
        from.delete(a);

        let mut to = Table::new();
        from.add_all(&mut to);
        assert_eq!(to.get(a), None);
        assert_eq!(to.get(b), Some(Value::Number(2.0)));
    }
}
