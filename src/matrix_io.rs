//! Delimited (CSV) input/output for count matrices, scored matrices, and
//! upstream structured-record files. The window key is the row index, in
//! `%Y-%m-%d %H:%M:%S` form, matching the upstream tabular outputs.

use crate::anomalies::ScoredMatrix;
use crate::error::{Error, Result};
use crate::features::{EventCountMatrix, LogRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use ndarray::Array2;
use std::path::Path;

const WINDOW_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SCORE_COLUMN: &str = "AnomalyScore";
const FLAG_COLUMN: &str = "IsAnomaly";

fn parse_window_key(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, WINDOW_KEY_FORMAT)
        .map_err(|e| Error::Parse(format!("window key `{raw}`: {e}")))?;
    Ok(naive.and_utc())
}

fn format_window_key(key: &DateTime<Utc>) -> String {
    key.format(WINDOW_KEY_FORMAT).to_string()
}

/// Read an event count matrix: header `Window,<template>...`, one row per
/// window with integer counts.
pub fn read_count_matrix(path: &Path) -> Result<EventCountMatrix> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(Error::EmptyMatrix);
    }
    let templates: Vec<String> = headers.iter().skip(1).map(String::from).collect();

    let mut window_keys = Vec::new();
    let mut values: Vec<u64> = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let key = record
            .get(0)
            .ok_or(Error::MissingField("Window"))?;
        window_keys.push(parse_window_key(key)?);
        for (col, cell) in record.iter().skip(1).enumerate() {
            let count: u64 = cell.trim().parse().map_err(|_| {
                Error::Parse(format!(
                    "row {row}, column `{}`: `{cell}` is not a non-negative integer",
                    templates[col]
                ))
            })?;
            values.push(count);
        }
    }
    if window_keys.is_empty() {
        return Err(Error::EmptyMatrix);
    }

    let counts = Array2::from_shape_vec((window_keys.len(), templates.len()), values)
        .map_err(|e| Error::Parse(format!("ragged count matrix: {e}")))?;
    EventCountMatrix::from_parts(window_keys, templates, counts)
}

/// Write a scored matrix: the count columns plus `AnomalyScore` and
/// `IsAnomaly`, row order preserved. Scores use Rust's shortest round-trip
/// float formatting, so reading the file back is lossless.
pub fn write_scored_matrix(path: &Path, scored: &ScoredMatrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let matrix = &scored.matrix;

    let mut header = vec!["Window".to_string()];
    header.extend(matrix.templates().iter().cloned());
    header.push(SCORE_COLUMN.to_string());
    header.push(FLAG_COLUMN.to_string());
    writer.write_record(&header)?;

    for (row, key) in matrix.window_keys().iter().enumerate() {
        let mut fields = vec![format_window_key(key)];
        for count in matrix.counts().row(row) {
            fields.push(count.to_string());
        }
        fields.push(scored.anomaly_scores[row].to_string());
        fields.push(scored.is_anomaly[row].to_string());
        writer.write_record(&fields)?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), windows = matrix.n_windows(), "wrote scored matrix");
    Ok(())
}

/// Read back a scored matrix written by [`write_scored_matrix`].
pub fn read_scored_matrix(path: &Path) -> Result<(EventCountMatrix, Vec<f64>, Vec<bool>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns: Vec<&str> = headers.iter().collect();
    if columns.len() < 3
        || columns[columns.len() - 2] != SCORE_COLUMN
        || columns[columns.len() - 1] != FLAG_COLUMN
    {
        return Err(Error::Parse(format!(
            "expected trailing `{SCORE_COLUMN},{FLAG_COLUMN}` columns"
        )));
    }
    let templates: Vec<String> = columns[1..columns.len() - 2]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut window_keys = Vec::new();
    let mut values: Vec<u64> = Vec::new();
    let mut scores = Vec::new();
    let mut flags = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let expect = templates.len() + 3;
        if record.len() != expect {
            return Err(Error::Parse(format!(
                "row {row}: expected {expect} fields, found {}",
                record.len()
            )));
        }
        window_keys.push(parse_window_key(&record[0])?);
        for col in 0..templates.len() {
            let cell = &record[col + 1];
            values.push(cell.trim().parse().map_err(|_| {
                Error::Parse(format!("row {row}: count `{cell}` is not an integer"))
            })?);
        }
        let score_cell = &record[templates.len() + 1];
        scores.push(score_cell.trim().parse().map_err(|_| {
            Error::Parse(format!("row {row}: score `{score_cell}` is not a float"))
        })?);
        let flag_cell = &record[templates.len() + 2];
        flags.push(flag_cell.trim().parse().map_err(|_| {
            Error::Parse(format!("row {row}: flag `{flag_cell}` is not a bool"))
        })?);
    }
    if window_keys.is_empty() {
        return Err(Error::EmptyMatrix);
    }

    let counts = Array2::from_shape_vec((window_keys.len(), templates.len()), values)
        .map_err(|e| Error::Parse(format!("ragged scored matrix: {e}")))?;
    let matrix = EventCountMatrix::from_parts(window_keys, templates, counts)?;
    Ok((matrix, scores, flags))
}

/// Read structured log records produced by the upstream parsing stage.
/// Requires `Time` and `EventTemplate` columns; any other columns are kept in
/// the record's field map. `timestamp_format` is a strftime pattern, e.g.
/// `%a %b %d %H:%M:%S %Y` for Apache-style times.
pub fn read_structured_records(path: &Path, timestamp_format: &str) -> Result<Vec<LogRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let time_col = headers
        .iter()
        .position(|h| h == "Time")
        .ok_or(Error::MissingField("Time"))?;
    let template_col = headers
        .iter()
        .position(|h| h == "EventTemplate")
        .ok_or(Error::MissingField("EventTemplate"))?;

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw_ts = record.get(time_col).ok_or(Error::MissingField("Time"))?;
        let ts = NaiveDateTime::parse_from_str(raw_ts, timestamp_format)
            .map_err(|e| Error::Parse(format!("timestamp `{raw_ts}`: {e}")))?
            .and_utc();
        let template = record
            .get(template_col)
            .ok_or(Error::MissingField("EventTemplate"))?;
        if template.is_empty() {
            return Err(Error::MissingField("EventTemplate"));
        }
        let mut log_record = LogRecord::new(ts, template);
        for (col, cell) in record.iter().enumerate() {
            if col != time_col && col != template_col {
                log_record
                    .fields
                    .insert(headers[col].to_string(), cell.to_string());
            }
        }
        records.push(log_record);
    }
    tracing::debug!(path = %path.display(), records = records.len(), "read structured records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_count_matrix_basic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Window,E1,E2").unwrap();
        writeln!(f, "2024-01-01 00:00:00,3,0").unwrap();
        writeln!(f, "2024-01-01 00:05:00,1,2").unwrap();
        drop(f);

        let m = read_count_matrix(&path).unwrap();
        assert_eq!(m.n_windows(), 2);
        assert_eq!(m.templates(), &["E1", "E2"]);
        assert_eq!(m.counts()[[0, 0]], 3);
        assert_eq!(m.counts()[[1, 1]], 2);
        assert_eq!(
            m.window_keys()[1] - m.window_keys()[0],
            chrono::Duration::minutes(5)
        );
    }

    #[test]
    fn read_count_matrix_rejects_bad_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Window,E1").unwrap();
        writeln!(f, "2024-01-01 00:00:00,-3").unwrap();
        drop(f);
        assert!(matches!(read_count_matrix(&path), Err(Error::Parse(_))));
    }

    #[test]
    fn read_count_matrix_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counts.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Window,E1").unwrap();
        drop(f);
        assert!(matches!(read_count_matrix(&path), Err(Error::EmptyMatrix)));
    }

    #[test]
    fn structured_records_keep_extra_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("structured.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "LineId,Time,Level,EventTemplate").unwrap();
        writeln!(f, "1,2024-03-01 10:00:01,notice,server started").unwrap();
        writeln!(f, "2,2024-03-01 10:00:02,error,connection to <*> failed").unwrap();
        drop(f);

        let records = read_structured_records(&path, "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_template, "server started");
        assert_eq!(records[1].fields["Level"], "error");
        assert!(records[0].ts < records[1].ts);
    }

    #[test]
    fn structured_records_require_template_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("structured.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Time,Message").unwrap();
        writeln!(f, "2024-03-01 10:00:01,hello").unwrap();
        drop(f);
        match read_structured_records(&path, "%Y-%m-%d %H:%M:%S") {
            Err(Error::MissingField(field)) => assert_eq!(field, "EventTemplate"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }
}
