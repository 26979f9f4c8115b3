//! Tabular dataset loading: CSV or JSON rows become records whose columns
//! become the store schema.

use anyhow::{bail, Context, Result};
use std::path::Path;

use query_desk_core::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(DatasetFormat::Csv),
            "json" => Some(DatasetFormat::Json),
            _ => None,
        }
    }
}

pub fn load_dataset(path: &Path) -> Result<Vec<Record>> {
    let format = DatasetFormat::for_path(path)
        .ok_or_else(|| anyhow::anyhow!("Not a dataset file: {}", path.display()))?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    let records = match format {
        DatasetFormat::Csv => parse_csv(&bytes),
        DatasetFormat::Json => parse_json(&bytes),
    }
    .with_context(|| format!("Failed to parse dataset: {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = records.len(), "dataset loaded");
    Ok(records)
}

/// Header row gives the columns; every following row is one record.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    check_headers(&headers)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), v.to_string()))
                .collect(),
        );
    }
    Ok(records)
}

/// A JSON array of flat objects. Scalars are stringified, `null` becomes "".
pub fn parse_json(bytes: &[u8]) -> Result<Vec<Record>> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        _ => bail!("expected a JSON array of objects"),
    };

    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.into_iter().enumerate() {
        let serde_json::Value::Object(fields) = row else {
            bail!("row {} is not a JSON object", i);
        };
        let mut record = Record::new();
        for (column, value) in fields {
            let text = match value {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => bail!("row {} column '{}' is not a scalar", i, column),
            };
            record = record.with(column, text);
        }
        records.push(record);
    }
    Ok(records)
}

fn check_headers(headers: &[String]) -> Result<()> {
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }
    let mut seen = std::collections::HashSet::new();
    for h in headers {
        if h.is_empty() {
            bail!("CSV header contains an empty column name");
        }
        if !seen.insert(h.as_str()) {
            bail!("CSV header repeats column '{}'", h);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_follow_header_order() {
        let csv = "User,Mood,Response\nu1,sad,\"Sending a hug, friend\"\nu2,happy,Great!\n";
        let records = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].column_names(), vec!["User", "Mood", "Response"]);
        assert_eq!(records[0].get("Response"), Some("Sending a hug, friend"));
        assert_eq!(records[1].get("Mood"), Some("happy"));
    }

    #[test]
    fn csv_header_only_is_empty_dataset() {
        assert!(parse_csv(b"Question,Response\n").unwrap().is_empty());
    }

    #[test]
    fn csv_ragged_rows_are_rejected() {
        assert!(parse_csv(b"a,b\n1,2,3\n").is_err());
    }

    #[test]
    fn csv_duplicate_header_is_rejected() {
        let err = parse_csv(b"a,a\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("repeats"));
    }

    #[test]
    fn json_rows_are_stringified() {
        let json = r#"[{"Question":"fever","Severity":3,"Urgent":false,"Note":null}]"#;
        let records = parse_json(json.as_bytes()).unwrap();
        assert_eq!(records[0].get("Severity"), Some("3"));
        assert_eq!(records[0].get("Urgent"), Some("false"));
        assert_eq!(records[0].get("Note"), Some(""));
    }

    #[test]
    fn json_nested_values_are_rejected() {
        assert!(parse_json(br#"[{"a":{"b":1}}]"#).is_err());
        assert!(parse_json(br#"{"a":1}"#).is_err());
        assert!(parse_json(br#"[1]"#).is_err());
    }

    #[test]
    fn format_by_extension() {
        assert_eq!(
            DatasetFormat::for_path(Path::new("x/chatbot_dataset.CSV")),
            Some(DatasetFormat::Csv)
        );
        assert_eq!(
            DatasetFormat::for_path(Path::new("rows.json")),
            Some(DatasetFormat::Json)
        );
        assert_eq!(DatasetFormat::for_path(Path::new("cv.pdf")), None);
    }
}
