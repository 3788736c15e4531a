//! Benchmark utilities.

use rand::Rng;
use tabula_core::{BatchOp, RecordStore, StoreConfig};
use tabula_value::{fields, Value};
use tokio::runtime::Runtime;

/// Generate `count` random records with ids `0..count`, an `age` in
/// `18..80` and a `city` drawn from `cities` names.
pub fn random_records(count: usize, cities: usize) -> Vec<Value> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|id| {
            Value::Map(fields([
                ("id", Value::from(id)),
                ("age", Value::from(rng.gen_range(18i64..80))),
                ("city", Value::from(format!("city-{}", rng.gen_range(0..cities.max(1))))),
            ]))
        })
        .collect()
}

/// Build a store keyed by `id` and load `records` into it.
pub fn build_store(rt: &Runtime, config: StoreConfig, records: Vec<Value>) -> RecordStore {
    let store = RecordStore::new(config.key("id")).unwrap();
    rt.block_on(store.batch(BatchOp::Set, records, false)).unwrap();
    store
}
