//! CLI command implementations.

pub mod inspect;
pub mod query;
pub mod snapshot;

use std::path::PathBuf;
use tabula_core::{RecordSnapshot, RecordStore, StoreConfig};
use tabula_value::{fields_to_json, from_json_str};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Output format shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One line per record.
    Text,
    /// A pretty-printed JSON array.
    Json,
}

impl Format {
    /// Parses `text` or `json`.
    pub fn parse(format: &str) -> CliResult<Self> {
        match format {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format {other:?} (expected text or json)").into()),
        }
    }
}

/// How to build a store from the command line.
#[derive(Debug, Default)]
pub struct LoadOptions {
    /// JSON record file.
    pub file: Option<PathBuf>,
    /// Primary-key field.
    pub key: Option<String>,
    /// Comma-separated index declarations.
    pub indexes: Vec<String>,
    /// Path to the records inside the file.
    pub source: Option<String>,
}

impl LoadOptions {
    /// Store configuration without records.
    pub fn config(&self, name: &str) -> StoreConfig {
        let mut config = StoreConfig::new().name(name);
        if let Some(key) = &self.key {
            config = config.key(key);
        }
        if let Some(source) = &self.source {
            config = config.source(source);
        }
        for index in &self.indexes {
            config = config.index(index.split(',').map(str::trim));
        }
        config
    }

    /// Builds a store and loads the record file into it.
    pub async fn open(&self, name: &str) -> CliResult<RecordStore> {
        let path = self
            .file
            .as_ref()
            .ok_or("Record file required (--file)")?;
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;

        let store = RecordStore::new(self.config(name))?;
        let keys = store.load(from_json_str(&text)?).await?;
        tracing::info!(file = %path.display(), records = keys.len(), "records loaded");
        Ok(store)
    }
}

/// Prints records in `format`.
pub fn print_records(records: &[RecordSnapshot], format: Format) -> CliResult<()> {
    match format {
        Format::Json => {
            let rows: Vec<serde_json::Value> =
                records.iter().map(|r| fields_to_json(&r.fields)).collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Format::Text => {
            for record in records {
                println!(
                    "[{}] {}: {}",
                    record.position,
                    record.key,
                    fields_to_json(&record.fields)
                );
            }
            println!("({} records)", records.len());
        }
    }
    Ok(())
}
