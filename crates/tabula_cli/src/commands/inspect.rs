//! Inspect command implementation.

use super::{CliResult, Format};
use serde::Serialize;
use std::collections::HashSet;
use tabula_core::index::{bucket_value_of, SEPARATOR};
use tabula_core::{RecordStore, Selector, StatsSnapshot};

/// Record set inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store name.
    pub name: String,
    /// Number of records.
    pub records: usize,
    /// Store revision after loading.
    pub revision: u64,
    /// Declared index signatures with their bucket counts.
    pub indexes: Vec<IndexStats>,
    /// Index consistency problems, empty when consistent.
    pub problems: Vec<String>,
    /// Distinct field names across all records.
    pub fields: Vec<String>,
}

/// Statistics for a single secondary index.
#[derive(Debug, Serialize)]
pub struct IndexStats {
    /// Index signature.
    pub signature: String,
    /// Number of distinct bucket values.
    pub buckets: usize,
}

/// Collects the inspection result for `store`.
pub fn inspect(store: &RecordStore) -> CliResult<InspectResult> {
    let records = store.get(&Selector::All)?;
    let mut fields: Vec<String> = records
        .iter()
        .flat_map(|record| record.fields.keys().cloned())
        .collect();
    fields.sort();
    fields.dedup();

    let indexes = store
        .indexes()
        .into_iter()
        .map(|signature| {
            let indexed: Vec<&str> = signature.split(SEPARATOR).collect();
            let buckets = records
                .iter()
                .map(|record| bucket_value_of(&indexed, |field| record.fields.get(field)))
                .collect::<HashSet<_>>()
                .len();
            IndexStats { signature, buckets }
        })
        .collect();

    Ok(InspectResult {
        name: store.name().to_string(),
        records: store.len(),
        revision: store.revision(),
        indexes,
        problems: store.verify(),
        fields,
    })
}

/// Runs the inspect command.
pub fn run(store: &RecordStore, format: Format) -> CliResult<()> {
    let result = inspect(store)?;
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        Format::Text => print_text_output(&result, &store.stats()),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult, stats: &StatsSnapshot) {
    println!("Tabula Record Set Inspection");
    println!("============================");
    println!();
    println!("Name:     {}", result.name);
    println!("Records:  {}", result.records);
    println!("Revision: {}", result.revision);
    println!("Fields:   {}", result.fields.join(", "));
    println!();
    println!("Indexes:");
    if result.indexes.is_empty() {
        println!("  (none)");
    }
    for index in &result.indexes {
        println!("  {} ({} buckets)", index.signature, index.buckets);
    }
    println!();
    println!("Operations:");
    println!("  Writes:    {}", stats.writes);
    println!("  Reindexes: {}", stats.reindexes);
    println!();
    if result.problems.is_empty() {
        println!("Consistency: OK");
    } else {
        println!("Consistency: {} problems", result.problems.len());
        for problem in &result.problems {
            println!("  - {problem}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::StoreConfig;
    use tabula_value::Value;

    #[tokio::test]
    async fn inspect_reports_indexes() {
        let store = RecordStore::new(
            StoreConfig::new().name("people").index(["age"]).use_workers(false),
        )
        .unwrap();
        store
            .load(Value::from(serde_json::json!([
                {"id": 1, "age": 30},
                {"id": 2, "age": 25, "city": "Oslo"}
            ])))
            .await
            .unwrap();

        let result = inspect(&store).unwrap();
        assert_eq!(result.records, 2);
        assert_eq!(result.fields, vec!["age", "city", "id"]);
        assert_eq!(result.indexes[0].signature, "age");
        assert_eq!(result.indexes[0].buckets, 2);
        assert!(result.problems.is_empty());
        run(&store, Format::Text).unwrap();
    }
}
