//! Diagnosis rows map to a Condition plus a stage Observation.

use cda_model::{ResourceKind, SourceRecord, TargetResource, TransformError};

use crate::ids::mint_id;
use crate::mappers::{Mapped, keys};
use crate::vocab;

const ICD_O_3: &str = "http://terminology.hl7.org/CodeSystem/icd-o-3";

pub fn map_diagnosis(
    record: &SourceRecord,
    subject_id: &str,
    research_subject_id: &str,
) -> Result<Vec<Mapped>, TransformError> {
    // Extracts from some upstream programs carry row ids, others only the
    // diagnosis code; either identifies the condition for this subject.
    let diagnosis_ref = record
        .text("id")
        .or_else(|| record.text("primary_diagnosis"))
        .ok_or_else(|| {
            TransformError::invalid_key(
                ResourceKind::Condition,
                "diagnosis record has neither id nor primary diagnosis",
            )
        })?;
    let key = keys::condition(subject_id, diagnosis_ref);
    let id = mint_id(ResourceKind::Condition, &key)?;
    let mut condition = Mapped::new(TargetResource::new(
        ResourceKind::Condition,
        id,
        vec![(&key).into()],
    ));

    if let Some(diagnosis) = record.text("primary_diagnosis") {
        condition
            .resource
            .set_field("code", vocab::concept_text(diagnosis));
    }
    if let Some(morphology) = record.text("morphology") {
        condition.resource.set_field(
            "morphology",
            vocab::codeable_concept(ICD_O_3, morphology, morphology),
        );
    }
    if let Some(days) = record.integer("age_at_diagnosis") {
        condition
            .resource
            .set_field("onsetAge", vocab::days_quantity(days));
    }
    if let Some(grade) = record.text("grade") {
        condition
            .resource
            .set_field("grade", vocab::concept_text(grade));
    }

    let raw_stage = record
        .text("pathologic_stage")
        .or_else(|| record.text("clinical_stage"));
    let mut stage_display = None;
    if let Some(raw) = raw_stage {
        match vocab::normalize_stage(raw) {
            Ok(display) => {
                condition
                    .resource
                    .set_field("stage", serde_json::json!({ "summary": vocab::concept_text(&display) }));
                stage_display = Some(display);
            }
            Err(warning) => condition.warn(warning),
        }
    }

    condition
        .resource
        .request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));
    condition.resource.request_reference(
        "researchSubject",
        ResourceKind::ResearchSubject,
        keys::research_subject(research_subject_id),
    );

    let mut out = vec![condition];
    if let Some(display) = stage_display {
        out.push(stage_observation(subject_id, diagnosis_ref, &key, &display)?);
    }
    Ok(out)
}

/// A normalized stage also surfaces as an Observation focused on the
/// Condition, so stage queries do not need to unpack condition internals.
fn stage_observation(
    subject_id: &str,
    diagnosis_ref: &str,
    condition_key: &cda_model::NaturalKey,
    display: &str,
) -> Result<Mapped, TransformError> {
    let key = keys::observation("diagnosis_observation", diagnosis_ref, display);
    let id = mint_id(ResourceKind::Observation, &key)?;
    let mut resource = TargetResource::new(ResourceKind::Observation, id, vec![(&key).into()]);
    resource.set_text("status", "final");
    resource.set_field("code", vocab::concept_text("Pathologic stage"));
    resource.set_text("valueString", display);
    resource.request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));
    resource.request_reference("focus", ResourceKind::Condition, condition_key.clone());
    Ok(Mapped::new(resource))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> SourceRecord {
        SourceRecord::try_from(value).unwrap()
    }

    #[test]
    fn diagnosis_with_stage_yields_condition_and_observation() {
        let mapped = map_diagnosis(
            &record(json!({
                "id": "d1",
                "primary_diagnosis": "Infiltrating duct carcinoma",
                "pathologic_stage": "Stage IIB",
                "age_at_diagnosis": 18250,
            })),
            "s1",
            "r1",
        )
        .unwrap();
        assert_eq!(mapped.len(), 2);
        let condition = &mapped[0].resource;
        assert_eq!(condition.kind(), ResourceKind::Condition);
        assert!(condition.field("stage").is_some());
        assert_eq!(
            condition.reference("researchSubject").unwrap().target,
            ResourceKind::ResearchSubject
        );
        assert_eq!(
            mapped[1].resource.reference("focus").unwrap().target,
            ResourceKind::Condition
        );
    }

    #[test]
    fn unrecognized_stage_downgrades_to_warning() {
        let mapped = map_diagnosis(
            &record(json!({"id": "d1", "pathologic_stage": "Not Reported"})),
            "s1",
            "r1",
        )
        .unwrap();
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].warnings.len(), 1);
        assert!(mapped[0].resource.field("stage").is_none());
    }

    #[test]
    fn code_only_diagnosis_keys_on_subject_and_code() {
        let mapped = map_diagnosis(&record(json!({"primary_diagnosis": "C50"})), "S1", "r1").unwrap();
        let expected = mint_id(ResourceKind::Condition, &keys::condition("S1", "C50")).unwrap();
        assert_eq!(mapped[0].resource.id(), expected);
    }

    #[test]
    fn empty_diagnosis_is_skipped() {
        assert!(map_diagnosis(&record(json!({"grade": "G2"})), "s1", "r1").is_err());
    }
}
