//! Specimen rows map to a Specimen, a BodyStructure for the anatomical
//! site, and a source-material Observation focused on the Specimen.

use cda_model::{ResourceKind, SourceRecord, TargetResource, TransformError};

use crate::ids::mint_id;
use crate::mappers::{Mapped, keys, require_id};
use crate::vocab;

pub fn map_specimen(record: &SourceRecord) -> Result<Vec<Mapped>, TransformError> {
    let specimen_id = require_id(record, ResourceKind::Specimen, "specimen")?;
    let key = keys::specimen(specimen_id);
    let id = mint_id(ResourceKind::Specimen, &key)?;
    let mut specimen = TargetResource::new(ResourceKind::Specimen, id, vec![(&key).into()]);

    if let Some(material) = record.text("source_material_type") {
        specimen.set_field("type", vocab::concept_text(material));
    }
    if let Some(specimen_type) = record.text("specimen_type") {
        specimen.set_field("collection", vocab::concept_text(specimen_type));
    }
    if let Some(days) = record.integer("days_to_collection") {
        specimen.set_field("collectedDay", vocab::days_quantity(days));
    }
    let subject_id = record.text("derived_from_subject");
    if let Some(subject_id) = subject_id {
        specimen.request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));
    }
    if let Some(parent) = record.text("derived_from_specimen") {
        specimen.request_reference("parent", ResourceKind::Specimen, keys::specimen(parent));
    }

    let mut out = vec![Mapped::new(specimen)];

    if let Some(site) = record.text("anatomical_site") {
        let body_key = keys::body_structure(specimen_id);
        let body_id = mint_id(ResourceKind::BodyStructure, &body_key)?;
        let mut body =
            TargetResource::new(ResourceKind::BodyStructure, body_id, vec![(&body_key).into()]);
        body.set_field("includedStructure", vocab::concept_text(site));
        if let Some(subject_id) = subject_id {
            body.request_reference("patient", ResourceKind::Patient, keys::patient(subject_id));
        }
        out.push(Mapped::new(body));
    }

    if let Some(material) = record.text("source_material_type") {
        let obs_key = keys::observation("specimen_observation", specimen_id, material);
        let obs_id = mint_id(ResourceKind::Observation, &obs_key)?;
        let mut observation =
            TargetResource::new(ResourceKind::Observation, obs_id, vec![(&obs_key).into()]);
        observation.set_text("status", "final");
        observation.set_field("code", vocab::concept_text("Source material type"));
        observation.set_text("valueString", material);
        if let Some(subject_id) = subject_id {
            observation.request_reference(
                "subject",
                ResourceKind::Patient,
                keys::patient(subject_id),
            );
        }
        observation.request_reference("focus", ResourceKind::Specimen, keys::specimen(specimen_id));
        out.push(Mapped::new(observation));
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
    fn full_specimen_yields_family_of_three() {
        let mapped = map_specimen(&record(json!({
            "id": "sp1",
            "derived_from_subject": "s1",
            "anatomical_site": "Breast",
            "source_material_type": "Primary Tumor",
        })))
        .unwrap();
        assert_eq!(mapped.len(), 3);
        assert_eq!(mapped[0].resource.kind(), ResourceKind::Specimen);
        assert_eq!(mapped[1].resource.kind(), ResourceKind::BodyStructure);
        assert_eq!(mapped[2].resource.kind(), ResourceKind::Observation);
        assert_eq!(
            mapped[2].resource.reference("focus").unwrap().target,
            ResourceKind::Specimen
        );
    }

    #[test]
    fn derived_specimen_references_parent() {
        let mapped = map_specimen(&record(json!({
            "id": "sp2",
            "derived_from_subject": "s1",
            "derived_from_specimen": "sp1",
        })))
        .unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(
            mapped[0].resource.reference("parent").unwrap().target,
            ResourceKind::Specimen
        );
    }

    #[test]
    fn specimen_without_id_is_skipped() {
        assert!(map_specimen(&record(json!({"anatomical_site": "Lung"}))).is_err());
    }
}
