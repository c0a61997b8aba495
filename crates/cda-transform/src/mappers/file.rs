//! File rows map to a DocumentReference plus a Group of the file's subjects.

use serde_json::{Value, json};

use cda_model::{IdentifierEntry, ResourceKind, SourceRecord, TargetResource, TransformError};

use crate::ids::{mint_id, systems};
use crate::mappers::{Mapped, keys, require_id};
use crate::vocab;

pub fn map_file(
    record: &SourceRecord,
    subject_ids: &[&str],
    specimen_ids: &[&str],
) -> Result<Vec<Mapped>, TransformError> {
    let file_id = require_id(record, ResourceKind::DocumentReference, "file")?;
    let key = keys::document_reference(file_id);
    let id = mint_id(ResourceKind::DocumentReference, &key)?;
    let mut document =
        TargetResource::new(ResourceKind::DocumentReference, id, vec![(&key).into()]);
    document.set_text("status", "current");
    if let Some(data_type) = record.text("data_type") {
        document.set_field("type", vocab::concept_text(data_type));
    }
    if let Some(category) = record.text("data_category") {
        document.set_field("category", Value::Array(vec![vocab::concept_text(category)]));
    }
    if let Some(accession) = record.text("dbgap_accession_number") {
        document.push_identifier(IdentifierEntry::secondary(systems::DBGAP, accession));
    }

    let mut attachment = serde_json::Map::new();
    if let Some(uri) = record.text("drs_uri") {
        attachment.insert("url".to_string(), json!(uri));
    }
    if let Some(label) = record.text("label") {
        attachment.insert("title".to_string(), json!(label));
    }
    if let Some(format) = record.text("file_format") {
        attachment.insert("contentType".to_string(), json!(format));
    }
    if let Some(size) = record.integer("byte_size") {
        attachment.insert("size".to_string(), json!(size));
    }
    if let Some(checksum) = record.text("checksum") {
        attachment.insert("hash".to_string(), json!(checksum));
    }
    if !attachment.is_empty() {
        document.set_field(
            "content",
            Value::Array(vec![json!({ "attachment": Value::Object(attachment) })]),
        );
    }

    if let Some(subject_id) = subject_ids.first() {
        document.request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));
    }
    for specimen_id in specimen_ids {
        document.request_reference(
            "specimen",
            ResourceKind::Specimen,
            keys::specimen(specimen_id),
        );
    }

    let mut out = vec![Mapped::new(document)];
    if !subject_ids.is_empty() {
        let group_key = keys::group(file_id);
        let group_id = mint_id(ResourceKind::Group, &group_key)?;
        let mut group =
            TargetResource::new(ResourceKind::Group, group_id, vec![(&group_key).into()]);
        group.set_text("type", "person");
        group.set_field("actual", Value::Bool(true));
        group.set_field("quantity", json!(subject_ids.len()));
        for subject_id in subject_ids {
            group.request_reference("member", ResourceKind::Patient, keys::patient(subject_id));
        }
        out.push(Mapped::new(group));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> SourceRecord {
        SourceRecord::try_from(value).unwrap()
    }

    #[test]
    fn file_with_subjects_yields_document_and_group() {
        let mapped = map_file(
            &record(json!({
                "id": "f1",
                "label": "sample.bam",
                "data_category": "Sequencing Reads",
                "drs_uri": "drs://example/f1",
                "byte_size": 1024,
            })),
            &["s1", "s2"],
            &["sp1"],
        )
        .unwrap();
        assert_eq!(mapped.len(), 2);
        let document = &mapped[0].resource;
        assert_eq!(document.kind(), ResourceKind::DocumentReference);
        assert!(document.reference("subject").is_some());
        assert_eq!(
            document
                .references()
                .iter()
                .filter(|slot| slot.slot == "specimen")
                .count(),
            1
        );
        let group = &mapped[1].resource;
        assert_eq!(group.kind(), ResourceKind::Group);
        assert_eq!(
            group
                .references()
                .iter()
                .filter(|slot| slot.slot == "member")
                .count(),
            2
        );
    }

    #[test]
    fn orphan_file_has_no_group() {
        let mapped = map_file(&record(json!({"id": "f2"})), &[], &[]).unwrap();
        assert_eq!(mapped.len(), 1);
    }
}
