//! Viewing and exporting the knowledge store.
//!
//! `qdesk show` prints the schema and records for a quick look;
//! `qdesk export` writes the whole store as JSON or CSV, to a file or to
//! stdout for piping.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;

use query_desk_core::{Record, RecordStore};

use crate::config::Config;
use crate::persist::{load_store, StoreFile};

/// Serialize records as CSV, header from `columns`.
pub fn to_csv(columns: &[String], records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or("")))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV output: {}", e))
}

/// Export the store. If `output` is `Some`, writes to that file path.
/// Otherwise writes to stdout.
pub fn run_export(config: &Config, format: &str, output: Option<&Path>) -> Result<()> {
    let store = load_store(config)?;

    let bytes = match format {
        "json" => {
            let file = StoreFile {
                columns: store.columns(),
                records: store.all(),
            };
            let mut json = serde_json::to_vec_pretty(&file)?;
            json.push(b'\n');
            json
        }
        "csv" => to_csv(&store.columns().unwrap_or_default(), &store.all())?,
        other => bail!("Unknown export format: {}. Use json or csv.", other),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            eprintln!("Exported {} records to {}", store.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

/// `qdesk show`: print columns and up to `limit` records.
pub fn run_show(config: &Config, limit: Option<usize>) -> Result<()> {
    let store = load_store(config)?;
    let records = store.all();

    match store.columns() {
        Some(columns) => println!("columns: {}", columns.join(", ")),
        None => println!("columns: (none yet)"),
    }
    println!("records: {}", records.len());

    for (i, record) in records.iter().take(limit.unwrap_or(usize::MAX)).enumerate() {
        println!();
        println!("#{}", i);
        for (column, value) in record.iter() {
            println!("  {}: {}", column, value);
        }
    }
    Ok(())
}
