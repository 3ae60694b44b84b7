//! Randomized state-machine properties: the engine must behave exactly
//! like a sorted reference map, before and after crash recovery, with or
//! without interleaved checkpoints.

use emberdb_testkit::{op_sequence_strategy, Op, TestEngine};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn model_pairs(model: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<(Vec<u8>, Vec<u8>)> {
    model.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn engine_matches_reference_model(ops in op_sequence_strategy(200)) {
        let mut fixture = TestEngine::ephemeral();
        let mut model = BTreeMap::new();

        for op in &ops {
            op.apply(&mut fixture.engine, &mut model);
        }

        prop_assert_eq!(fixture.contents(), model_pairs(&model));
        prop_assert_eq!(fixture.engine.len(), model.len());
    }

    #[test]
    fn recovery_reproduces_the_model(ops in op_sequence_strategy(150)) {
        let mut fixture = TestEngine::durable();
        let mut model = BTreeMap::new();

        for op in &ops {
            op.apply(&mut fixture.engine, &mut model);
        }
        fixture.engine.flush_wal().unwrap();

        let fixture = fixture.reopen();
        prop_assert_eq!(fixture.contents(), model_pairs(&model));
    }

    #[test]
    fn recovery_is_idempotent(ops in op_sequence_strategy(100)) {
        let mut fixture = TestEngine::durable();
        let mut model = BTreeMap::new();

        for op in &ops {
            op.apply(&mut fixture.engine, &mut model);
        }
        fixture.engine.flush_wal().unwrap();

        let fixture = fixture.reopen();
        let first = fixture.contents();
        let fixture = fixture.reopen();
        let second = fixture.contents();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, model_pairs(&model));
    }

    #[test]
    fn checkpoints_are_transparent(
        ops in op_sequence_strategy(120),
        checkpoint_every in 10usize..40,
    ) {
        let mut plain = TestEngine::durable();
        let mut checkpointed = TestEngine::durable();
        let mut model = BTreeMap::new();

        for (i, op) in ops.iter().enumerate() {
            op.apply(&mut plain.engine, &mut model);

            // Replay the same op against the checkpointing twin; the
            // model already advanced, so apply directly.
            match op {
                Op::Put(k, v) => checkpointed.engine.put(k.clone(), v.clone()).unwrap(),
                Op::Update(k, v) => {
                    let _ = checkpointed.engine.update(k.clone(), v.clone());
                }
                Op::Remove(k) => {
                    let _ = checkpointed.engine.remove(k);
                }
            }
            if i % checkpoint_every == checkpoint_every - 1 {
                checkpointed.engine.create_checkpoint().unwrap();
            }
        }
        plain.engine.flush_wal().unwrap();
        checkpointed.engine.flush_wal().unwrap();

        let plain = plain.reopen();
        let checkpointed = checkpointed.reopen();

        prop_assert_eq!(plain.contents(), checkpointed.contents());
        prop_assert_eq!(plain.contents(), model_pairs(&model));
    }

    #[test]
    fn repeated_puts_keep_the_last_value(
        values in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 1..20),
    ) {
        let mut fixture = TestEngine::durable();
        for value in &values {
            fixture.engine.put(b"hot".to_vec(), value.clone()).unwrap();
        }
        fixture.engine.flush_wal().unwrap();

        let last = values.last().unwrap().clone();
        prop_assert_eq!(fixture.engine.get(b"hot"), Some(last.clone()));

        let fixture = fixture.reopen();
        prop_assert_eq!(fixture.engine.get(b"hot"), Some(last));
        prop_assert_eq!(fixture.engine.len(), 1);
    }
}
