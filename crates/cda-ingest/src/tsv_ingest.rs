//! Association and lookup tables.
//!
//! The aggregator ships entity relationships as tab-delimited two-column
//! tables (`subject_researchsubject.tsv`, `file_subject.tsv`, ...). Rows with
//! a blank half are dropped; tables are read in file order.

use std::path::Path;

use crate::error::{IngestError, Result};

/// Read a two-column association table, returning `(left, right)` id pairs.
pub fn read_pairs(path: &Path, left: &str, right: &str) -> Result<Vec<(String, String)>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)
        .map_err(|source| IngestError::Tsv {
            path: path.to_path_buf(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| IngestError::Tsv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let left_idx = column_index(&headers, left, path)?;
    let right_idx = column_index(&headers, right, path)?;

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Tsv {
            path: path.to_path_buf(),
            source,
        })?;
        let left_value = record.get(left_idx).unwrap_or("").trim();
        let right_value = record.get(right_idx).unwrap_or("").trim();
        if left_value.is_empty() || right_value.is_empty() {
            continue;
        }
        pairs.push((left_value.to_string(), right_value.to_string()));
    }
    Ok(pairs)
}

fn column_index(headers: &csv::StringRecord, column: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_pairs_and_skips_blank_halves() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "subject_id\tresearchsubject_id").unwrap();
        writeln!(file, "s1\tr1").unwrap();
        writeln!(file, "s2\t").unwrap();
        writeln!(file, "s3\tr3").unwrap();
        let pairs = read_pairs(file.path(), "subject_id", "researchsubject_id").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("s1".to_string(), "r1".to_string()),
                ("s3".to_string(), "r3".to_string())
            ]
        );
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a\tb").unwrap();
        writeln!(file, "1\t2").unwrap();
        let err = read_pairs(file.path(), "subject_id", "b").unwrap_err();
        assert!(err.to_string().contains("subject_id"));
    }
}
