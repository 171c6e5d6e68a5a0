//! Output formatting and persistence for reports and record exports.
//!
//! Supports pretty-printing, JSON files (gzip when the path ends in `.gz`),
//! and CSV record exports.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::record::Record;
use csv::WriterBuilder;

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let file = create(path)?;
    let json = serde_json::to_vec_pretty(value)?;

    if path.ends_with(".gz") {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        writer.write_all(&json)?;
        writer.flush()?;
    }

    debug!(path, bytes = json.len(), "Wrote JSON output");
    Ok(())
}

/// Writes `records` as CSV with a header row, replacing any existing file.
pub fn write_records_csv(path: &str, records: &[&Record]) -> Result<()> {
    let file = create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    debug!(path, rows = records.len(), "Wrote CSV export");
    Ok(())
}

fn create(path: &str) -> Result<File> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("Failed to create {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_dataset;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&sample_records());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&sample_records()).unwrap();
    }

    #[test]
    fn test_write_json_creates_file() {
        let path = temp_path("scoreboard_test_output.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &sample_records()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["facility"], "SLC");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_json_gzip_reads_back() {
        let path = temp_path("scoreboard_test_output.json.gz");
        let _ = fs::remove_file(&path);

        let records = sample_records();
        write_json(&path, &records).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        assert_eq!(parse_dataset(&bytes).unwrap(), records);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_records_csv_header_and_rows() {
        let path = temp_path("scoreboard_test_export.csv");
        let _ = fs::remove_file(&path);

        let records = sample_records();
        let view: Vec<&Record> = records.iter().collect();
        write_records_csv(&path, &view).unwrap();
        write_records_csv(&path, &view).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("class_date,facility"));

        assert_eq!(parse_dataset(content.as_bytes()).unwrap(), records);

        fs::remove_file(&path).unwrap();
    }

    // Helper functions for tests
    fn sample_records() -> Vec<Record> {
        vec![
            Record {
                class_date: "2024-11-01".to_string(),
                facility: "SLC".to_string(),
                instructor_name: "Ana".to_string(),
                class_name: "Spin".to_string(),
                session_guid: Some("s1".to_string()),
                total_attendees: Some(7),
                total_bookings: Some(9),
                greatgrandparent_category: Some("Fitness".to_string()),
                ..Default::default()
            },
            Record {
                class_date: "2024-11-02".to_string(),
                instructor_name: "Ben".to_string(),
                class_name: "Yoga".to_string(),
                total_bookings: Some(3),
                ..Default::default()
            },
        ]
    }
}
