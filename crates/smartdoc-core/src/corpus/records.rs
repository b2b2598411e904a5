//! Structured field records on disk (CSV or JSON).
//!
//! Each record holds `Filename`, an optional `Text`, and one value per
//! field. Empty cells and the literal `"None"` mean "not found".

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{CorpusError, Result};
use crate::models::document::{FieldRecord, FieldValues, FILENAME_KEY, TEXT_KEY};

/// Load records, choosing the format by file extension (`.csv` or JSON).
pub fn load_records(path: &Path) -> Result<Vec<FieldRecord>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let records = if is_csv { load_csv(path)? } else { load_json(path)? };
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<FieldRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let mut filename = None;
        let mut text = None;
        let mut fields = FieldValues::new();

        for (header, value) in headers.iter().zip(row.iter()) {
            match header {
                FILENAME_KEY => filename = Some(value.trim().to_string()).filter(|f| !f.is_empty()),
                TEXT_KEY => text = Some(value.to_string()).filter(|t| !t.trim().is_empty()),
                _ => fields.insert(header, Some(value.to_string())),
            }
        }

        let filename = filename.ok_or(CorpusError::MissingFilename(i))?;
        records.push(FieldRecord::new(filename, text, fields));
    }

    Ok(records)
}

fn load_json(path: &Path) -> Result<Vec<FieldRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_reader(reader)?;
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.into_iter().enumerate() {
        let mut filename = None;
        let mut text = None;
        let mut fields = FieldValues::new();

        for (key, value) in row {
            let value = value_to_string(value);
            match key.as_str() {
                FILENAME_KEY => filename = value.filter(|f| !f.trim().is_empty()),
                TEXT_KEY => text = value.filter(|t| !t.trim().is_empty()),
                _ => fields.insert(key, value),
            }
        }

        let filename = filename.ok_or(CorpusError::MissingFilename(i))?;
        records.push(FieldRecord::new(filename, text, fields));
    }

    Ok(records)
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Write records as a pretty JSON array, `Text` included when present.
pub fn write_records_json(path: &Path, records: &[FieldRecord]) -> Result<()> {
    ensure_parent(path)?;
    let rows: Vec<Value> = records.iter().map(FieldRecord::to_json).collect();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writer.flush()?;
    Ok(())
}

/// Write a CSV summary: one column per field (sorted) plus `Filename`.
/// Absent values are written as `None`.
pub fn write_records_csv(path: &Path, records: &[FieldRecord]) -> Result<()> {
    ensure_parent(path)?;
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields.iter().map(|(field, _)| field))
        .collect();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns.iter().copied().chain(std::iter::once(FILENAME_KEY)))?;

    for record in records {
        let row = columns
            .iter()
            .map(|c| record.fields.get(c).unwrap_or("None"))
            .chain(std::iter::once(record.filename.as_str()));
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmartdocError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> Vec<FieldRecord> {
        vec![
            FieldRecord::new(
                "inv_1.pdf",
                Some("Invoice No: INV-1".into()),
                [("Invoice Number", Some("INV-1")), ("IBAN", None)].into_iter().collect(),
            ),
            FieldRecord::new("inv_2.pdf", None, [("Invoice Number", Some("INV-2"))].into_iter().collect()),
        ]
    }

    #[test]
    fn test_json_records_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        write_records_json(&path, &sample()).unwrap();

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_csv_summary_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");
        write_records_csv(&path, &sample()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().next(), Some("IBAN,Invoice Number,Filename"));
        assert_eq!(written.lines().nth(1), Some("None,INV-1,inv_1.pdf"));

        let loaded = load_records(&path).unwrap();
        assert_eq!(loaded[0].filename, "inv_1.pdf");
        assert_eq!(loaded[0].text, None);
        assert_eq!(loaded[0].fields.get("IBAN"), None);
        assert_eq!(loaded[1].fields.get("Invoice Number"), Some("INV-2"));
    }

    #[test]
    fn test_missing_filename_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, r#"[{"Filename": "a.pdf"}, {"Invoice Number": "X"}]"#).unwrap();

        assert!(matches!(
            load_records(&path),
            Err(SmartdocError::Corpus(CorpusError::MissingFilename(1)))
        ));
    }
}
