//! Treatment rows expand into the medication sub-hierarchy.
//!
//! One treatment with a therapeutic agent yields a MedicationAdministration
//! referencing a Medication, whose ingredient references a Substance, whose
//! definition references a SubstanceDefinition — always in that order, and
//! always the same set for the same source key. Agent-less treatments yield
//! the administration alone.

use serde_json::json;

use cda_model::{ResourceKind, SourceRecord, TargetResource, TransformError};

use crate::ids::mint_id;
use crate::mappers::{Mapped, keys, require_id};
use crate::vocab;

pub fn map_treatment(
    record: &SourceRecord,
    subject_id: &str,
) -> Result<Vec<Mapped>, TransformError> {
    let treatment_id = require_id(record, ResourceKind::MedicationAdministration, "treatment")?;
    let key = keys::medication_administration(treatment_id, subject_id);
    let id = mint_id(ResourceKind::MedicationAdministration, &key)?;
    let mut administration = TargetResource::new(
        ResourceKind::MedicationAdministration,
        id,
        vec![(&key).into()],
    );
    administration.set_text("status", "completed");
    if let Some(treatment_type) = record.text("treatment_type") {
        administration.set_field("category", vocab::concept_text(treatment_type));
    }
    if let Some(outcome) = record.text("treatment_outcome") {
        administration.set_field("outcome", vocab::concept_text(outcome));
    }
    if let Some(site) = record.text("treatment_anatomic_site") {
        administration.set_field("bodySite", vocab::concept_text(site));
    }
    let start = record.integer("days_to_treatment_start");
    let end = record.integer("days_to_treatment_end");
    if start.is_some() || end.is_some() {
        administration.set_field(
            "occurrencePeriod",
            json!({ "startDay": start, "endDay": end }),
        );
    }
    if let Some(cycles) = record.integer("number_of_cycles") {
        administration.set_field("cycles", json!(cycles));
    }
    administration.request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));

    let Some(agent) = record.text("therapeutic_agent") else {
        return Ok(vec![Mapped::new(administration)]);
    };
    administration.request_reference(
        "medication",
        ResourceKind::Medication,
        keys::medication(agent),
    );

    let medication_key = keys::medication(agent);
    let medication_id = mint_id(ResourceKind::Medication, &medication_key)?;
    let mut medication = TargetResource::new(
        ResourceKind::Medication,
        medication_id,
        vec![(&medication_key).into()],
    );
    medication.set_field("code", vocab::concept_text(agent));
    medication.request_reference("ingredient", ResourceKind::Substance, keys::substance(agent));

    let substance_key = keys::substance(agent);
    let substance_id = mint_id(ResourceKind::Substance, &substance_key)?;
    let mut substance = TargetResource::new(
        ResourceKind::Substance,
        substance_id,
        vec![(&substance_key).into()],
    );
    substance.set_field("code", vocab::concept_text(agent));
    substance.request_reference(
        "definition",
        ResourceKind::SubstanceDefinition,
        keys::substance_definition(agent),
    );

    let definition_key = keys::substance_definition(agent);
    let definition_id = mint_id(ResourceKind::SubstanceDefinition, &definition_key)?;
    let mut definition = TargetResource::new(
        ResourceKind::SubstanceDefinition,
        definition_id,
        vec![(&definition_key).into()],
    );
    definition.set_text("name", agent);

    Ok(vec![
        Mapped::new(administration),
        Mapped::new(medication),
        Mapped::new(substance),
        Mapped::new(definition),
    ])
}
