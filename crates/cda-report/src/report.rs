//! The machine-readable validation report.

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use cda_model::{RunReport, ValidationSummary};

use crate::error::{ReportError, Result};

/// Render the `{"summary": {<kind>: <count>, ...}}` report.
///
/// `generated_at` is the one intentionally timestamped field; everything
/// else is a pure function of the summary. The dangling list only appears
/// when there is something to report.
pub fn validation_report(
    summary: &ValidationSummary,
    run: Option<&RunReport>,
    generated_at: DateTime<Utc>,
) -> Value {
    let mut counts = Map::new();
    for (kind, count) in &summary.counts {
        counts.insert(kind.as_str().to_string(), json!(count));
    }
    let mut out = Map::new();
    out.insert("summary".to_string(), Value::Object(counts));
    if summary.has_dangling() {
        out.insert(
            "dangling".to_string(),
            serde_json::to_value(&summary.dangling).unwrap_or(Value::Null),
        );
    }
    if let Some(run) = run {
        out.insert(
            "run".to_string(),
            serde_json::to_value(run).unwrap_or(Value::Null),
        );
    }
    out.insert(
        "generated_at".to_string(),
        json!(generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    Value::Object(out)
}

/// Write the validation report, stamped at emission time.
pub fn write_validation_report(
    summary: &ValidationSummary,
    run: Option<&RunReport>,
    path: &Path,
) -> Result<()> {
    let report = validation_report(summary, run, Utc::now());
    let rendered = serde_json::to_string_pretty(&report).map_err(|source| ReportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, rendered).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cda_model::{DanglingReference, ResourceId, ResourceKind};
    use chrono::TimeZone;

    #[test]
    fn clean_summary_renders_counts_only() {
        let mut summary = ValidationSummary::default();
        summary.counts.insert(ResourceKind::Patient, 2);
        summary.counts.insert(ResourceKind::Condition, 1);
        let stamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let report = validation_report(&summary, None, stamp);
        assert_eq!(report["summary"]["Patient"], json!(2));
        assert_eq!(report["summary"]["Condition"], json!(1));
        assert!(report.get("dangling").is_none());
        assert_eq!(report["generated_at"], json!("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn dangling_findings_appear_on_failure() {
        let mut summary = ValidationSummary::default();
        summary.counts.insert(ResourceKind::Condition, 1);
        summary.dangling.push(DanglingReference {
            source_kind: ResourceKind::Condition,
            source_id: ResourceId::from_sha256([1; 32]),
            slot: "subject".to_string(),
            target_kind: ResourceKind::Patient,
            target_id: Some(ResourceId::from_sha256([2; 32])),
            reason: "Patient not present in graph".to_string(),
        });
        let stamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let report = validation_report(&summary, None, stamp);
        assert_eq!(report["dangling"].as_array().unwrap().len(), 1);
    }
}
