//! Bucket-and-recurse multi-key sort.

use crate::sort::order::{Direction, SortKey};
use crate::sort::OrderBy;
use crate::types::RecordSnapshot;
use std::collections::HashMap;
use tabula_value::Value;

/// Sorts `records` by `order`.
///
/// Records are bucketed by the normalised value of the first key's field
/// (numbers in canonical form, text case-folded), buckets are ordered by
/// [`Value::sort_cmp`] on their normalised form (reversed for descending
/// keys), and multi-member buckets recurse on the remaining keys. Records
/// still tied after the last key keep ascending position order.
pub fn bucket_sort(records: Vec<RecordSnapshot>, order: &OrderBy) -> Vec<RecordSnapshot> {
    if records.is_empty() {
        return records;
    }
    sort_level(records, order.keys())
}

fn sort_level(mut records: Vec<RecordSnapshot>, keys: &[SortKey]) -> Vec<RecordSnapshot> {
    let Some((key, rest)) = keys.split_first() else {
        records.sort_by_key(|record| record.position);
        return records;
    };
    if records.len() < 2 {
        return records;
    }

    let mut seen: Vec<(String, Value)> = Vec::new();
    let mut buckets: HashMap<String, Vec<RecordSnapshot>> = HashMap::new();
    for record in records {
        let bucket = normalise(record.field(&key.field));
        if !buckets.contains_key(&bucket) {
            seen.push((bucket.clone(), Value::Text(bucket.clone())));
        }
        buckets.entry(bucket).or_default().push(record);
    }

    seen.sort_by(|(_, a), (_, b)| a.sort_cmp(b));
    if key.direction == Direction::Desc {
        seen.reverse();
    }

    let mut sorted = Vec::new();
    for (bucket, _) in seen {
        let Some(members) = buckets.remove(&bucket) else {
            continue;
        };
        sorted.extend(sort_level(members, rest));
    }
    sorted
}

/// Bucket key for sorting: numeric values in canonical form, anything else
/// lower-cased.
fn normalise(value: &Value) -> String {
    match value.as_number() {
        Some(_) => value.bucket_key(),
        None => value.key_string().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::{fields, Fields};

    fn snapshots(rows: Vec<Fields>) -> Vec<RecordSnapshot> {
        rows.into_iter()
            .enumerate()
            .map(|(position, fields)| RecordSnapshot {
                key: position.to_string(),
                position,
                fields,
            })
            .collect()
    }

    fn field_of(records: &[RecordSnapshot], field: &str) -> Vec<String> {
        records
            .iter()
            .map(|r| r.field(field).key_string())
            .collect()
    }

    #[test]
    fn ties_keep_position_order() {
        let records = snapshots(vec![fields([("a", 1), ("b", 2)]), fields([("a", 1), ("b", 1)])]);
        let sorted = bucket_sort(records, &OrderBy::parse("a").unwrap());
        assert_eq!(field_of(&sorted, "b"), vec!["2", "1"]);
    }

    #[test]
    fn second_key_descending() {
        let records = snapshots(vec![fields([("a", 1), ("b", 1)]), fields([("a", 1), ("b", 2)])]);
        let sorted = bucket_sort(records, &OrderBy::parse("a, b desc").unwrap());
        assert_eq!(field_of(&sorted, "b"), vec!["2", "1"]);
    }

    #[test]
    fn age_then_id_descending() {
        let records = snapshots(vec![
            fields([("id", 1), ("age", 30)]),
            fields([("id", 2), ("age", 25)]),
            fields([("id", 3), ("age", 25)]),
        ]);
        let sorted = bucket_sort(records, &OrderBy::parse("age, id desc").unwrap());
        assert_eq!(field_of(&sorted, "id"), vec!["3", "2", "1"]);
    }

    #[test]
    fn numbers_sort_numerically() {
        let records = snapshots(vec![
            fields([("n", 10)]),
            fields([("n", 9)]),
            fields([("n", 100)]),
        ]);
        let sorted = bucket_sort(records, &OrderBy::parse("n").unwrap());
        assert_eq!(field_of(&sorted, "n"), vec!["9", "10", "100"]);

        let sorted = bucket_sort(sorted, &OrderBy::parse("n desc").unwrap());
        assert_eq!(field_of(&sorted, "n"), vec!["100", "10", "9"]);
    }

    #[test]
    fn numbers_and_text_in_one_field() {
        let rows = (0..120)
            .map(|i: i64| {
                if i % 2 == 0 {
                    fields([("v", Value::from(i * 7 % 53))])
                } else {
                    fields([("v", Value::from(format!("{}a", i * 3 % 41)))])
                }
            })
            .collect();
        let sorted = bucket_sort(snapshots(rows), &OrderBy::parse("v").unwrap());
        assert_eq!(sorted.len(), 120);

        let values: Vec<&Value> = sorted.iter().map(|r| r.field("v")).collect();
        let split = values.iter().position(|v| v.as_number().is_none()).unwrap();
        assert!(values[..split].windows(2).all(|w| w[0].sort_cmp(w[1]).is_le()));
        assert!(values[split..].iter().all(|v| v.as_number().is_none()));
        assert!(values[split..].windows(2).all(|w| w[0].key_string() <= w[1].key_string()));
    }

    #[test]
    fn numeric_text_and_case_share_buckets() {
        let records = snapshots(vec![
            fields([("n", Value::from("Bob")), ("i", 0.into())]),
            fields([("n", Value::from("25.0")), ("i", 1.into())]),
            fields([("n", Value::from("ada")), ("i", 2.into())]),
            fields([("n", Value::from(25)), ("i", 3.into())]),
            fields([("n", Value::from("BOB")), ("i", 4.into())]),
        ]);
        let sorted = bucket_sort(records, &OrderBy::parse("n").unwrap());
        assert_eq!(field_of(&sorted, "i"), vec!["1", "3", "2", "0", "4"]);
    }

    #[test]
    fn missing_fields_bucket_as_null() {
        let records = snapshots(vec![
            fields([("name", "b")]),
            Fields::new(),
            fields([("name", "a")]),
        ]);
        let sorted = bucket_sort(records, &OrderBy::parse("name").unwrap());
        assert_eq!(field_of(&sorted, "name"), vec!["a", "b", "null"]);
    }

    #[test]
    fn empty_input() {
        assert!(bucket_sort(Vec::new(), &OrderBy::parse("a").unwrap()).is_empty());
    }
}
