//! Joining two stores on a shared field.

use crate::store::record_store::RecordStore;
use crate::types::RecordSnapshot;
use std::collections::{BTreeSet, HashMap};
use tabula_value::{Fields, Value};

/// Which side's unmatched records survive a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    /// Only matched pairs.
    #[default]
    Inner,
    /// Every record of the left store.
    Left,
    /// Every record of the right store.
    Right,
}

struct Side<'a> {
    name: &'a str,
    records: Vec<RecordSnapshot>,
    columns: BTreeSet<String>,
}

impl<'a> Side<'a> {
    fn of(store: &'a RecordStore) -> Self {
        let records = store.inner.state.read().snapshot_live();
        let columns = records
            .iter()
            .flat_map(|record| record.fields.keys().cloned())
            .collect();
        Self {
            name: store.name(),
            records,
            columns,
        }
    }

    fn write(&self, row: &mut Fields, record: Option<&RecordSnapshot>) {
        for column in &self.columns {
            let value = record.map_or(Value::Null, |r| r.field(column).clone());
            row.insert(format!("{}_{column}", self.name), value);
        }
    }
}

impl RecordStore {
    /// Joins this store with `other` on equal values of `field`.
    ///
    /// Output fields are named `"<store name>_<field>"`. Rows are ordered by
    /// the driving store's positions (the left store, or `other` for
    /// [`JoinKind::Right`]), then by the matched store's positions. Fields of
    /// a missing counterpart are `Null`. Records whose join field is null
    /// never match.
    pub fn join(&self, other: &RecordStore, field: &str, kind: JoinKind) -> Vec<Fields> {
        let left = Side::of(self);
        let right = Side::of(other);
        let (driver, lookup) = match kind {
            JoinKind::Right => (&right, &left),
            JoinKind::Inner | JoinKind::Left => (&left, &right),
        };

        let mut buckets: HashMap<String, Vec<&RecordSnapshot>> = HashMap::new();
        for record in &lookup.records {
            let value = record.field(field);
            if !value.is_null() {
                buckets.entry(value.bucket_key()).or_default().push(record);
            }
        }

        let mut rows = Vec::new();
        for record in &driver.records {
            let value = record.field(field);
            let matches = if value.is_null() {
                None
            } else {
                buckets.get(&value.bucket_key())
            };

            match matches {
                Some(matched) => {
                    for other in matched {
                        let mut row = Fields::new();
                        driver.write(&mut row, Some(record));
                        lookup.write(&mut row, Some(other));
                        rows.push(row);
                    }
                }
                None if kind != JoinKind::Inner => {
                    let mut row = Fields::new();
                    driver.write(&mut row, Some(record));
                    lookup.write(&mut row, None);
                    rows.push(row);
                }
                None => {}
            }
        }
        tracing::debug!(
            left = %left.name,
            right = %right.name,
            field,
            ?kind,
            rows = rows.len(),
            "join"
        );
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::types::SetOptions;
    use tabula_value::fields;

    async fn stores() -> (RecordStore, RecordStore) {
        let config = |name: &str, key: &str| StoreConfig::new().name(name).key(key).use_workers(false);
        let people = RecordStore::new(config("people", "id")).unwrap();
        let pets = RecordStore::new(config("pets", "name")).unwrap();
        for (id, city) in [(1, "Oslo"), (2, "Lima")] {
            people
                .set(None, fields([("id", Value::from(id)), ("city", Value::from(city))]), SetOptions::new())
                .await
                .unwrap();
        }
        for (name, owner) in [("Rex", 1), ("Tom", 3), ("Kit", 1)] {
            let data = fields([("name", Value::from(name)), ("id", Value::from(owner))]);
            pets.set(None, data, SetOptions::new()).await.unwrap();
        }
        (people, pets)
    }

    fn column<'a>(rows: &'a [Fields], name: &str) -> Vec<&'a Value> {
        rows.iter().map(|row| &row[name]).collect()
    }

    #[tokio::test]
    async fn inner_join_pairs_matches() {
        let (people, pets) = stores().await;
        let rows = people.join(&pets, "id", JoinKind::Inner);

        assert_eq!(rows.len(), 2);
        assert_eq!(
            column(&rows, "pets_name"),
            vec![&Value::from("Rex"), &Value::from("Kit")]
        );
        assert_eq!(rows[0]["people_city"], Value::from("Oslo"));
    }

    #[tokio::test]
    async fn left_join_keeps_unmatched_driver_rows() {
        let (people, pets) = stores().await;
        let rows = people.join(&pets, "id", JoinKind::Left);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2]["people_city"], Value::from("Lima"));
        assert_eq!(rows[2]["pets_name"], Value::Null);
        assert_eq!(rows[2]["pets_id"], Value::Null);
    }

    #[tokio::test]
    async fn right_join_drives_from_other_store() {
        let (people, pets) = stores().await;
        let rows = people.join(&pets, "id", JoinKind::Right);

        assert_eq!(column(&rows, "pets_name").len(), 3);
        assert_eq!(rows[1]["pets_name"], Value::from("Tom"));
        assert_eq!(rows[1]["people_city"], Value::Null);
    }
}
