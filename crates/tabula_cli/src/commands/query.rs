//! Get, select, sort and unique commands.

use super::{print_records, CliResult, Format};
use tabula_core::{sort::OrderBy, RecordStore, Selector, Where};

fn parse_where(query: &str) -> CliResult<Where> {
    let json: serde_json::Value =
        serde_json::from_str(query).map_err(|e| format!("where clause is not JSON: {e}"))?;
    Ok(Where::from_json(&json)?)
}

/// Runs the get command. `range` is `(start, count)`.
pub fn get(
    store: &RecordStore,
    selector: &str,
    range: Option<(usize, usize)>,
    format: Format,
) -> CliResult<()> {
    let selector = match range {
        Some((start, count)) => Selector::Range { start, count },
        None => Selector::parse(selector)?,
    };
    print_records(&store.get(&selector)?, format)
}

/// Runs the select command.
pub async fn select(store: &RecordStore, query: &str, format: Format) -> CliResult<()> {
    let records = store.select(&parse_where(query)?).await?;
    print_records(&records, format)
}

/// Runs the sort command.
pub async fn sort(
    store: &RecordStore,
    order: &str,
    query: Option<&str>,
    format: Format,
) -> CliResult<()> {
    let order = OrderBy::parse(order)?;
    let query = query.map(parse_where).transpose()?;
    let records = store.sort(&order, false, query.as_ref()).await?;
    print_records(&records, format)
}

/// Runs the unique command.
pub fn unique(store: &RecordStore, field: &str, format: Format) -> CliResult<()> {
    let values = store.unique(field);
    match format {
        Format::Json => {
            let json: Vec<serde_json::Value> = values.iter().map(serde_json::Value::from).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Format::Text => {
            for value in &values {
                println!("{}", value.key_string());
            }
            println!("({} distinct values of {field})", values.len());
        }
    }
    Ok(())
}
