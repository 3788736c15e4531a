//! Save and restore commands.

use super::{print_records, CliResult, Format, LoadOptions};
use std::path::Path;
use tabula_core::{RecordStore, Selector};
use tabula_storage::FileBackend;

/// Saves `store` into `dir` under the store's name.
pub fn save(store: &RecordStore, dir: &Path) -> CliResult<()> {
    let backend = FileBackend::open(dir)?;
    store.save(&backend)?;
    println!(
        "Saved {} records as {:?} in {}",
        store.len(),
        store.name(),
        dir.display()
    );
    Ok(())
}

/// Restores the snapshot `name` from `dir` and prints its records.
pub fn restore(options: &LoadOptions, dir: &Path, name: &str, format: Format) -> CliResult<()> {
    let backend = FileBackend::open(dir)?;
    let store = RecordStore::new(options.config(name))?;
    if !store.restore(&backend)? {
        return Err(format!("No snapshot {name:?} found in {}", dir.display()).into());
    }
    print_records(&store.get(&Selector::All)?, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_value::Value;

    #[tokio::test]
    async fn save_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoadOptions {
            key: Some("id".into()),
            ..LoadOptions::default()
        };
        let store = RecordStore::new(options.config("people")).unwrap();
        store
            .load(Value::from(serde_json::json!([{"id": 1}, {"id": 2}])))
            .await
            .unwrap();

        save(&store, dir.path()).unwrap();
        restore(&options, dir.path(), "people", Format::Text).unwrap();
        assert!(restore(&options, dir.path(), "missing", Format::Text).is_err());
    }
}
