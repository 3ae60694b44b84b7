//! Property-based test generators using proptest.

use proptest::prelude::*;

/// One engine operation for state-machine tests.
#[derive(Debug, Clone)]
pub enum Op {
    /// Insert or overwrite a key.
    Put(Vec<u8>, Vec<u8>),
    /// Overwrite an existing key (NotFound tolerated).
    Update(Vec<u8>, Vec<u8>),
    /// Delete a key (NotFound tolerated).
    Remove(Vec<u8>),
}

/// Strategy for keys drawn from a small universe, so operation sequences
/// actually collide and exercise overwrite/delete paths.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    (0u32..100).prop_map(|i| format!("key_{i:03}").into_bytes())
}

/// Strategy for values: arbitrary short byte strings, empty included.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for a single operation.
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (key_strategy(), value_strategy()).prop_map(|(k, v)| Op::Put(k, v)),
        1 => (key_strategy(), value_strategy()).prop_map(|(k, v)| Op::Update(k, v)),
        2 => key_strategy().prop_map(Op::Remove),
    ]
}

/// Strategy for a sequence of up to `max_len` operations.
pub fn op_sequence_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 0..max_len)
}

impl Op {
    /// Applies the operation to an engine and a reference model,
    /// asserting that both agree on the outcome.
    ///
    /// # Panics
    ///
    /// Panics if the engine and model disagree, or on an engine error
    /// other than the tolerated `NotFound`.
    pub fn apply(
        &self,
        engine: &mut emberdb_core::Engine,
        model: &mut std::collections::BTreeMap<Vec<u8>, Vec<u8>>,
    ) {
        match self {
            Self::Put(key, value) => {
                engine.put(key.clone(), value.clone()).expect("put failed");
                model.insert(key.clone(), value.clone());
            }
            Self::Update(key, value) => {
                let updated = engine.update(key.clone(), value.clone()).is_ok();
                assert_eq!(updated, model.contains_key(key), "update presence mismatch");
                if updated {
                    model.insert(key.clone(), value.clone());
                }
            }
            Self::Remove(key) => {
                let removed = engine.remove(key).is_ok();
                assert_eq!(removed, model.remove(key).is_some(), "remove presence mismatch");
            }
        }
    }
}
