//! Payload decoding for class exports.
//!
//! Exports arrive as a JSON array of row objects, the same array gzip
//! compressed, or a CSV file with a header row.

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use serde_json::{Map, Value};
use std::io::Read;
use tracing::{debug, info};

use crate::fetch::{BasicClient, fetch_bytes};
use crate::record::{Dataset, Record};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Decodes raw payload bytes into records, sniffing the format.
///
/// # Errors
///
/// Returns an error if the gzip stream is corrupt or the payload is neither
/// a JSON array nor CSV with a header row.
pub fn parse_dataset(bytes: &[u8]) -> Result<Vec<Record>> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decoded)
            .context("Failed to decompress gzip payload")?;
        debug!(compressed = bytes.len(), decompressed = decoded.len(), "Inflated payload");
        return parse_dataset(&decoded);
    }

    let start = bytes.iter().position(|b| !b.is_ascii_whitespace());
    match start.map(|i| bytes[i]) {
        Some(b'[') => parse_json(bytes),
        Some(_) => parse_csv(bytes),
        None => Ok(Vec::new()),
    }
}

fn parse_json(bytes: &[u8]) -> Result<Vec<Record>> {
    let records: Vec<Record> =
        serde_json::from_slice(bytes).context("Failed to parse JSON records")?;
    Ok(records)
}

/// Every cell is handed to the record deserializer as text, so identifiers
/// such as `007` keep their leading zeros. Short rows leave the missing
/// trailing columns at their defaults.
fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let fields = result.with_context(|| format!("Failed to read CSV row {}", row + 1))?;
        let object: Map<String, Value> = headers
            .iter()
            .zip(fields.iter())
            .map(|(header, field)| (header.to_string(), Value::String(field.to_string())))
            .collect();
        let record: Record = serde_json::from_value(Value::Object(object))
            .with_context(|| format!("Failed to parse CSV row {}", row + 1))?;
        records.push(record);
    }

    Ok(records)
}

/// Reads a payload from an HTTP(S) URL or a local path.
pub async fn read_source(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source)
            .await
            .with_context(|| format!("Failed to fetch {source}"))
    } else {
        std::fs::read(source).with_context(|| format!("Failed to read {source}"))
    }
}

/// Loads and deduplicates the dataset behind `source`.
///
/// # Errors
///
/// Fails when the source cannot be read or decoded, or holds no records.
#[tracing::instrument]
pub async fn load_dataset(source: &str) -> Result<Dataset> {
    let bytes = read_source(source).await?;
    let records = parse_dataset(&bytes)?;
    if records.is_empty() {
        bail!("No data found in {source}");
    }

    let dataset = Dataset::from_records(records);
    info!(source, records = dataset.len(), "Loaded dataset");
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_parse_json_array() {
        let records = parse_dataset(SAMPLE_JSON.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].class_date, "2024-11-01T09:00:00");
        assert_eq!(records[0].total_attendees, Some(8));
        assert_eq!(records[1].total_attendees, None);
        assert_eq!(records[1].total_bookings, Some(4));
        assert!(records[1].is_virtual());
    }

    #[test]
    fn test_parse_gzip_json() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SAMPLE_JSON.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let records = parse_dataset(&compressed).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].instructor_name, "Ana");
    }

    #[test]
    fn test_parse_csv() {
        let csv = "class_date,facility,instructor_name,class_name,total_attendees,total_bookings,greatgrandparent_category\n\
                   2024-11-01,SLC,Ana,Spin,7,9,Fitness\n\
                   2024-11-02,,Ben,Yoga,,3,\n";

        let records = parse_dataset(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total_attendees, Some(7));
        assert_eq!(records[0].great_grandparent(), Some("Fitness"));
        assert_eq!(records[1].total_attendees, None);
        assert_eq!(records[1].greatgrandparent_category, None);
        assert!(records[1].is_virtual());
    }

    #[test]
    fn test_parse_csv_keeps_zero_padded_identifiers() {
        let csv = "facility,session_guid,guid,class_name,total_attendees\n\
                   007,00123,0042,12345678901234567890123,4\n\
                   7,123,42,1e3,5\n";

        let records = parse_dataset(csv.as_bytes()).unwrap();

        assert_eq!(records[0].facility, "007");
        assert_eq!(records[0].session_guid.as_deref(), Some("00123"));
        assert_eq!(records[0].guid.as_deref(), Some("0042"));
        assert_eq!(records[0].class_name, "12345678901234567890123");
        assert_eq!(records[0].total_attendees, Some(4));
        assert_eq!(records[1].facility, "7");
        assert_eq!(records[1].session_guid.as_deref(), Some("123"));
        assert_eq!(records[1].class_name, "1e3");

        let dataset = Dataset::from_records(records);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_parse_csv_short_row_uses_defaults() {
        let csv = "class_date,facility,total_attendees,total_bookings\n2024-11-01,SLC\n";

        let records = parse_dataset(csv.as_bytes()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].facility, "SLC");
        assert_eq!(records[0].total_attendees, None);
        assert_eq!(records[0].total_bookings, None);
    }

    #[test]
    fn test_parse_empty_payload() {
        assert!(parse_dataset(b"").unwrap().is_empty());
        assert!(parse_dataset(b"  \n").unwrap().is_empty());
        assert!(parse_dataset(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_json_fails() {
        let err = parse_dataset(b"[{\"class_date\": ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON records"));
    }

    #[test]
    fn test_corrupt_gzip_fails() {
        let result = parse_dataset(&[0x1f, 0x8b, 0x00, 0x01, 0x02]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_dataset_from_file_dedupes() {
        let path = std::env::temp_dir().join("scoreboard_parser_load.json");
        std::fs::write(
            &path,
            r#"[{"session_guid": "a", "total_attendees": 3},
                {"session_guid": "a", "total_attendees": 3},
                {"total_attendees": 1}]"#,
        )
        .unwrap();

        let dataset = load_dataset(path.to_str().unwrap()).await.unwrap();
        assert_eq!(dataset.len(), 2);

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_load_empty_dataset_fails() {
        let path = std::env::temp_dir().join("scoreboard_parser_empty.json");
        std::fs::write(&path, "[]").unwrap();

        let err = load_dataset(path.to_str().unwrap()).await.unwrap_err();
        assert!(err.to_string().contains("No data found"));

        std::fs::remove_file(path).ok();
    }

    // Helper functions for tests
    const SAMPLE_JSON: &str = r#"[
        {"class_date": "2024-11-01T09:00:00", "facility": "SLC", "instructor_name": "Ana",
         "class_name": "Spin", "total_attendees": "8", "total_bookings": 10},
        {"class_date": "2024-11-02", "facility": "", "instructor_name": "Ben",
         "class_name": "Yoga", "total_attendees": "", "total_bookings": 4.0}
    ]"#;
}
