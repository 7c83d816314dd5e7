use std::collections::HashMap;

use cinder_core::vm::{Heap, StrRef, Table, Value};
use proptest::prelude::*;

const KEYS: [&str; 12] = [
    "a", "b", "c", "d", "e", "f", "alpha", "beta", "gamma", "delta", "x1", "x2",
];

#[derive(Debug, Clone)]
enum Op {
    Set(usize, f64),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..KEYS.len(), -1e6f64..1e6).prop_map(|(key, value)| Op::Set(key, value)),
        1 => (0..KEYS.len()).prop_map(Op::Delete),
    ]
}

fn interned_keys(heap: &mut Heap) -> Vec<StrRef> {
    KEYS.iter().map(|key| heap.copy_string(key)).collect()
}

proptest! {
    #[test]
    fn table_agrees_with_hashmap(ops in prop::collection::vec(op(), 0..200)) {
        let mut heap = Heap::new();
        let keys = interned_keys(&mut heap);
        let mut table = Table::new();
        let mut model: HashMap<usize, f64> = HashMap::new();

        for op in ops {
            match op {
                Op::Set(key, value) => {
                    let was_new = table.set(keys[key], Value::Number(value));
                    prop_assert_eq!(was_new, model.insert(key, value).is_none());
                }
                Op::Delete(key) => {
                    prop_assert_eq!(table.delete(keys[key]), model.remove(&key).is_some());
                }
            }
        }

        for (index, key) in keys.iter().enumerate() {
            prop_assert_eq!(table.get(*key), model.get(&index).copied().map(Value::Number));
        }
        prop_assert_eq!(table.iter().count(), model.len());
    }

    #[test]
    fn tombstone_then_reinsert_keeps_live_count(
        present in prop::collection::btree_set(0..KEYS.len(), 1..KEYS.len()),
        value in -1e3f64..1e3,
    ) {
        let mut heap = Heap::new();
        let keys = interned_keys(&mut heap);
        let mut table = Table::new();
        for &key in &present {
            table.set(keys[key], Value::Number(value));
        }
        let live = table.iter().count();

        for &key in &present {
            prop_assert!(table.delete(keys[key]));
            prop_assert!(table.set(keys[key], Value::Bool(true)));
            prop_assert_eq!(table.iter().count(), live);
            prop_assert_eq!(table.get(keys[key]), Some(Value::Bool(true)));
        }
    }
}
