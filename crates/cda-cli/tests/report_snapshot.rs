//! Snapshot of the machine-readable validation report shape.

use chrono::{TimeZone, Utc};

use cda_model::{ResourceKind, ValidationSummary};
use cda_report::validation_report;

#[test]
fn report_shape_is_stable() {
    let mut summary = ValidationSummary::default();
    summary.counts.insert(ResourceKind::Patient, 2);
    summary.counts.insert(ResourceKind::Condition, 1);
    let stamp = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let report = validation_report(&summary, None, stamp);
    let rendered = serde_json::to_string_pretty(&report).unwrap();
    insta::assert_snapshot!(rendered, @r#"
{
  "generated_at": "2026-01-01T00:00:00Z",
  "summary": {
    "Condition": 1,
    "Patient": 2
  }
}
"#);
}
