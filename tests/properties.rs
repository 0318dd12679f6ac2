//! Property tests for the snapshot protocol.

use model_stream::{Model, StateMap, StateSnapshot, Value};
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

const FIELDS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

fn model_with(initial: &[i64]) -> Model {
    let mut source = serde_json::Map::new();
    for (name, value) in FIELDS.iter().zip(initial) {
        source.insert(name.to_string(), json!(value));
    }
    Model::transform_value(Value::Object(source)).unwrap()
}

fn collect(model: &Model) -> Arc<Mutex<Vec<StateSnapshot>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    model
        .state()
        .unwrap()
        .subscribe(move |s| sink.lock().push(s.clone()));
    seen
}

proptest! {
    #[test]
    fn prop_snapshots_chain_and_track_writes(
        initial in prop::collection::vec(any::<i64>(), 4),
        writes in prop::collection::vec((0usize..4, any::<i64>()), 0..50),
    ) {
        let model = model_with(&initial);
        let seen = collect(&model);

        // Shadow state: what every field should hold after each write.
        let mut expected: StateMap = FIELDS
            .iter()
            .zip(&initial)
            .map(|(name, v)| (name.to_string(), json!(v)))
            .collect();

        for (index, value) in &writes {
            let name = FIELDS[*index];
            model.set(name, *value).unwrap();
            expected.insert(name.to_string(), json!(value));
        }

        let snapshots = seen.lock();
        prop_assert_eq!(snapshots.len(), writes.len() + 1);

        prop_assert!(snapshots[0].previous.values().all(|v| v.is_null()));
        for pair in snapshots.windows(2) {
            prop_assert_eq!(&pair[1].previous, &pair[0].next);
        }
        for (snapshot, (index, value)) in snapshots.iter().skip(1).zip(&writes) {
            prop_assert_eq!(&snapshot.next[FIELDS[*index]], &json!(value));
        }
        if let Some(last) = snapshots.last() {
            prop_assert_eq!(&last.next, &expected);
            prop_assert_eq!(&model.values(), &expected);
        }
    }

    #[test]
    fn prop_snapshot_keys_are_field_order(
        initial in prop::collection::vec(any::<i64>(), 4),
    ) {
        let model = model_with(&initial);
        let seen = collect(&model);

        let snapshots = seen.lock();
        let keys: Vec<&str> = snapshots[0].next.keys().map(|k| k.as_str()).collect();
        prop_assert_eq!(keys, FIELDS.to_vec());
    }
}
