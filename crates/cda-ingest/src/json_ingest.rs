//! Entity-table ingestion.
//!
//! CDA entity extracts arrive as JSON arrays of objects (`subject.json`,
//! `diagnosis.json`, ...); newline-delimited variants of the same tables are
//! accepted as well. Subject rows are filtered to human species while
//! loading, matching the upstream extract convention.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use cda_model::SourceRecord;

use crate::error::{IngestError, Result};

/// Species values that pass the human filter.
const HUMAN_SPECIES: [&str; 2] = ["Human", "Homo sapiens"];

/// Read one entity table into source records.
pub fn read_entity_table(path: &Path) -> Result<Vec<SourceRecord>> {
    let text = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        parse_array(path, &text)
    } else {
        parse_lines(path, &text)
    }
}

/// Read the subject table, dropping non-human rows.
///
/// Returns the retained records and the number filtered out.
pub fn read_subject_table(path: &Path) -> Result<(Vec<SourceRecord>, u64)> {
    let records = read_entity_table(path)?;
    let total = records.len();
    let retained: Vec<SourceRecord> = records
        .into_iter()
        .filter(|record| match record.text("species") {
            Some(species) => HUMAN_SPECIES.contains(&species),
            None => true,
        })
        .collect();
    let filtered = (total - retained.len()) as u64;
    if filtered > 0 {
        warn!(filtered, "dropped non-human subject rows");
    }
    Ok((retained, filtered))
}

fn parse_array(path: &Path, text: &str) -> Result<Vec<SourceRecord>> {
    let values: Vec<Value> = serde_json::from_str(text).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    values
        .into_iter()
        .map(|value| {
            SourceRecord::try_from(value).map_err(|e| IngestError::MalformedRecord {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
        })
        .collect()
}

fn parse_lines(path: &Path, text: &str) -> Result<Vec<SourceRecord>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<SourceRecord>(line).map_err(|source| IngestError::Json {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(content.as_bytes()).expect("write fixture");
        file
    }

    #[test]
    fn reads_json_array_tables() {
        let file = write_fixture(r#"[{"id": "s1"}, {"id": "s2"}]"#);
        let records = read_entity_table(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("id"), Some("s1"));
    }

    #[test]
    fn reads_ndjson_tables() {
        let file = write_fixture("{\"id\": \"s1\"}\n\n{\"id\": \"s2\"}\n");
        let records = read_entity_table(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn subject_table_drops_non_human_rows() {
        let file = write_fixture(
            r#"[{"id": "s1", "species": "Homo sapiens"},
                {"id": "s2", "species": "Mus musculus"},
                {"id": "s3"}]"#,
        );
        let (records, filtered) = read_subject_table(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(filtered, 1);
    }

    #[test]
    fn malformed_json_is_a_structural_error() {
        let file = write_fixture("{not json");
        assert!(read_entity_table(file.path()).is_err());
    }
}
