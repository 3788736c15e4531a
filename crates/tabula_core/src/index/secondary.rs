//! Composite secondary index.

use std::collections::HashMap;
use tabula_value::{Fields, Value};

/// Separator between field names in a signature and between values in a
/// bucket value.
pub const SEPARATOR: char = '|';

/// A secondary index over one or more fields.
///
/// Maps a bucket value (the key strings of the indexed fields, joined by
/// `|` in signature order) to the ascending positions of the records that
/// share it. Empty buckets are removed as soon as their last position
/// leaves.
///
/// # Example
///
/// ```rust,ignore
/// let mut index = SecondaryIndex::new(vec!["age".into()]);
/// index.insert("25", 1);
/// index.insert("25", 2);
/// assert_eq!(index.lookup("25"), &[1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryIndex {
    /// Canonical (sorted, deduplicated) field names.
    fields: Vec<String>,
    signature: String,
    buckets: HashMap<String, Vec<usize>>,
    /// Total positions across all buckets.
    count: usize,
}

impl SecondaryIndex {
    /// Creates an empty index. `fields` must already be canonical.
    pub fn new(fields: Vec<String>) -> Self {
        let signature = signature_of(&fields);
        Self {
            fields,
            signature,
            buckets: HashMap::new(),
            count: 0,
        }
    }

    /// Field names joined by `|`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Indexed fields in canonical order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Computes the bucket a record with `data` falls into.
    ///
    /// Missing fields contribute `null`.
    pub fn bucket_value(&self, data: &Fields) -> String {
        bucket_value_of(&self.fields, |field| data.get(field))
    }

    /// Adds `position` to `bucket`, keeping the bucket sorted.
    ///
    /// Returns false if the position was already present.
    pub fn insert(&mut self, bucket: &str, position: usize) -> bool {
        let positions = self.buckets.entry(bucket.to_string()).or_default();
        match positions.binary_search(&position) {
            Ok(_) => false,
            Err(at) => {
                positions.insert(at, position);
                self.count += 1;
                true
            }
        }
    }

    /// Removes `position` from `bucket`, dropping the bucket when it empties.
    pub fn remove(&mut self, bucket: &str, position: usize) -> bool {
        let Some(positions) = self.buckets.get_mut(bucket) else {
            return false;
        };
        let Ok(at) = positions.binary_search(&position) else {
            return false;
        };
        positions.remove(at);
        self.count -= 1;
        if positions.is_empty() {
            self.buckets.remove(bucket);
        }
        true
    }

    /// Moves an entry from `from` to `to` within `bucket`.
    pub fn reposition(&mut self, bucket: &str, from: usize, to: usize) -> bool {
        if !self.remove(bucket, from) {
            return false;
        }
        self.insert(bucket, to)
    }

    /// Positions in `bucket`, ascending. Empty when the bucket is absent.
    pub fn lookup(&self, bucket: &str) -> &[usize] {
        self.buckets.get(bucket).map_or(&[], Vec::as_slice)
    }

    /// Returns true if `bucket` holds `position`.
    pub fn contains(&self, bucket: &str, position: usize) -> bool {
        self.lookup(bucket).binary_search(&position).is_ok()
    }

    /// Iterates over `(bucket_value, positions)`.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[usize])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total positions held.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the index holds no positions.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drops every bucket but keeps the declaration.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.count = 0;
    }

    /// An empty index with the same declaration.
    pub fn empty_like(&self) -> Self {
        Self::new(self.fields.clone())
    }
}

/// Joins canonical field names into a signature.
pub fn signature_of<S: AsRef<str>>(fields: &[S]) -> String {
    let mut signature = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            signature.push(SEPARATOR);
        }
        signature.push_str(field.as_ref());
    }
    signature
}

/// Joins the bucket keys of `fields` (looked up through `value_of`) into a
/// bucket value. Missing values contribute `null`.
pub fn bucket_value_of<'a, S, F>(fields: &[S], mut value_of: F) -> String
where
    S: AsRef<str>,
    F: FnMut(&str) -> Option<&'a Value>,
{
    let mut bucket = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            bucket.push(SEPARATOR);
        }
        match value_of(field.as_ref()) {
            Some(value) => push_component(&mut bucket, &value.bucket_key()),
            None => bucket.push_str("null"),
        }
    }
    bucket
}

/// Appends one bucket component, escaping backslashes and the separator so
/// that distinct component lists never join to the same bucket value.
pub fn push_component(bucket: &mut String, component: &str) {
    for c in component.chars() {
        if c == SEPARATOR || c == '\\' {
            bucket.push('\\');
        }
        bucket.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::fields;

    fn age_index() -> SecondaryIndex {
        SecondaryIndex::new(vec!["age".into()])
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = age_index();
        assert!(index.insert("25", 2));
        assert!(index.insert("25", 1));
        assert!(!index.insert("25", 1));

        assert_eq!(index.lookup("25"), &[1, 2]);
        assert_eq!(index.len(), 2);
        assert!(index.lookup("30").is_empty());
    }

    #[test]
    fn remove_deletes_empty_bucket() {
        let mut index = age_index();
        index.insert("25", 0);
        assert!(index.remove("25", 0));
        assert!(!index.remove("25", 0));
        assert_eq!(index.bucket_count(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn reposition_keeps_order() {
        let mut index = age_index();
        index.insert("25", 1);
        index.insert("25", 3);
        assert!(index.reposition("25", 3, 2));
        assert_eq!(index.lookup("25"), &[1, 2]);
    }

    #[test]
    fn composite_bucket_value() {
        let index = SecondaryIndex::new(vec!["age".into(), "name".into()]);
        assert_eq!(index.signature(), "age|name");

        let data = fields([("name", tabula_value::Value::from("Ada")), ("age", 36.into())]);
        assert_eq!(index.bucket_value(&data), "36|Ada");

        let partial = fields([("age", 36)]);
        assert_eq!(index.bucket_value(&partial), "36|null");
    }

    #[test]
    fn numeric_and_text_share_bucket() {
        let index = age_index();
        assert_eq!(
            index.bucket_value(&fields([("age", 25)])),
            index.bucket_value(&fields([("age", "25")]))
        );
        assert_eq!(index.bucket_value(&fields([("age", "25.0")])), "25");
    }

    #[test]
    fn separator_in_values_is_escaped() {
        let index = SecondaryIndex::new(vec!["a".into(), "b".into()]);
        let left = index.bucket_value(&fields([("a", "x|y"), ("b", "z")]));
        let right = index.bucket_value(&fields([("a", "x"), ("b", "y|z")]));
        assert_ne!(left, right);
        assert_eq!(left, r"x\|y|z");

        let slash = index.bucket_value(&fields([("a", r"x\"), ("b", "z")]));
        assert_eq!(slash, r"x\\|z");
    }
}
