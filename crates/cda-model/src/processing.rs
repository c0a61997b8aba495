use std::collections::BTreeMap;

/// One record excluded from the graph, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SkippedRecord {
    /// Source table the record came from (e.g. `diagnosis`).
    pub table: String,
    /// Best-effort record label, usually the source `id` field.
    pub record: String,
    pub reason: String,
}

/// One field whose value could not be normalized; the record proceeded.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldWarning {
    pub table: String,
    pub record: String,
    pub field: String,
    pub value: String,
    pub detail: String,
}

/// What one pipeline run did: processed counts per source table, skipped
/// records with reasons, and field-level warnings. Silent data loss is not an
/// option — every excluded record appears here.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunReport {
    pub processed: BTreeMap<String, u64>,
    pub skipped: Vec<SkippedRecord>,
    pub warnings: Vec<FieldWarning>,
    /// Number of subjects retained after sampling, when sampling applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampled_subjects: Option<usize>,
    /// True when the run stopped early at a cancellation boundary.
    #[serde(default)]
    pub cancelled: bool,
}

impl RunReport {
    pub fn record_processed(&mut self, table: &str) {
        *self.processed.entry(table.to_string()).or_insert(0) += 1;
    }

    pub fn skip(
        &mut self,
        table: impl Into<String>,
        record: impl Into<String>,
        reason: impl Into<String>,
    ) {
        self.skipped.push(SkippedRecord {
            table: table.into(),
            record: record.into(),
            reason: reason.into(),
        });
    }

    pub fn skipped_in(&self, table: &str) -> usize {
        self.skipped.iter().filter(|s| s.table == table).count()
    }

    pub fn merge(&mut self, other: RunReport) {
        for (table, count) in other.processed {
            *self.processed.entry(table).or_insert(0) += count;
        }
        self.skipped.extend(other.skipped);
        self.warnings.extend(other.warnings);
    }
}
