//! Subject rows map to a Patient plus death/birth-offset observations.

use serde_json::{Value, json};

use cda_model::{ResourceKind, SourceRecord, TargetResource, TransformError};

use crate::ids::mint_id;
use crate::mappers::{Mapped, keys, require_id};
use crate::vocab;

const BIRTHSEX_URL: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-birthsex";
const RACE_URL: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-race";
const ETHNICITY_URL: &str = "http://hl7.org/fhir/us/core/StructureDefinition/us-core-ethnicity";

pub fn map_subject(record: &SourceRecord) -> Result<Vec<Mapped>, TransformError> {
    let subject_id = require_id(record, ResourceKind::Patient, "subject")?;
    let key = keys::patient(subject_id);
    let id = mint_id(ResourceKind::Patient, &key)?;
    let mut patient = Mapped::new(TargetResource::new(
        ResourceKind::Patient,
        id,
        vec![(&key).into()],
    ));

    let mut extensions: Vec<Value> = Vec::new();
    if let Some(sex) = record.text("sex") {
        match vocab::normalize_sex(sex) {
            Ok(code) => extensions.push(json!({ "url": BIRTHSEX_URL, "valueCode": code })),
            Err(warning) => patient.warn(warning),
        }
    }
    if let Some(race) = record.text("race") {
        extensions.push(json!({ "url": RACE_URL, "valueString": vocab::normalize_race(race) }));
    }
    if let Some(ethnicity) = record.text("ethnicity") {
        extensions.push(json!({
            "url": ETHNICITY_URL,
            "valueString": vocab::normalize_ethnicity(ethnicity),
        }));
    }
    if !extensions.is_empty() {
        patient.resource.set_field("extension", Value::Array(extensions));
    }
    if let Some(vital) = record.text("vital_status") {
        match vocab::normalize_vital_status(vital) {
            Ok(deceased) => patient.resource.set_field("deceasedBoolean", Value::Bool(deceased)),
            Err(warning) => patient.warn(warning),
        }
    }

    let mut mapped = vec![patient];
    mapped.extend(subject_observations(record, subject_id)?);
    Ok(mapped)
}

/// Death and birth-offset fields each become an Observation focused on the
/// Patient.
fn subject_observations(
    record: &SourceRecord,
    subject_id: &str,
) -> Result<Vec<Mapped>, TransformError> {
    let mut out = Vec::new();
    if let Some(cause) = record.text("cause_of_death") {
        let mut observation = observation_for(subject_id, "cause_of_death", cause, "Cause of death")?;
        observation
            .resource
            .set_text("valueString", cause);
        out.push(observation);
    }
    if let Some(days) = record.integer("days_to_death") {
        let raw = days.to_string();
        let mut observation = observation_for(subject_id, "days_to_death", &raw, "Days to death")?;
        observation
            .resource
            .set_field("valueQuantity", vocab::days_quantity(days));
        out.push(observation);
    }
    if let Some(days) = record.integer("days_to_birth") {
        let raw = days.to_string();
        let mut observation = observation_for(subject_id, "days_to_birth", &raw, "Days to birth")?;
        observation
            .resource
            .set_field("valueQuantity", vocab::days_quantity(days));
        out.push(observation);
    }
    Ok(out)
}

fn observation_for(
    subject_id: &str,
    field: &str,
    raw: &str,
    display: &str,
) -> Result<Mapped, TransformError> {
    let key = keys::observation(field, subject_id, raw);
    let id = mint_id(ResourceKind::Observation, &key)?;
    let mut resource = TargetResource::new(ResourceKind::Observation, id, vec![(&key).into()]);
    resource.set_text("status", "final");
    resource.set_field("code", vocab::concept_text(display));
    resource.request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));
    resource.request_reference("focus", ResourceKind::Patient, keys::patient(subject_id));
    Ok(Mapped::new(resource))
}
