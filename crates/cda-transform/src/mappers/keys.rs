//! Natural-key composition, one constructor per resource kind.
//!
//! This is the single catalog of which source fields feed identity minting;
//! mappers use it when creating resources and the resolver reuses it (via
//! the keys carried on slots) when rewriting references. Medication,
//! Substance and SubstanceDefinition deliberately share the therapeutic
//! agent as their key — kind domain separation keeps them distinct.

use cda_model::NaturalKey;

use crate::ids::systems::system;

pub fn patient(subject_id: &str) -> NaturalKey {
    NaturalKey::single(system("subject_id"), subject_id)
}

pub fn research_subject(research_subject_id: &str) -> NaturalKey {
    NaturalKey::single(system("researchsubject_id"), research_subject_id)
}

pub fn research_study(project: &str) -> NaturalKey {
    NaturalKey::single(system("research_study"), project)
}

pub fn specimen(specimen_id: &str) -> NaturalKey {
    NaturalKey::single(system("specimen_id"), specimen_id)
}

pub fn body_structure(specimen_id: &str) -> NaturalKey {
    NaturalKey::single(system("specimen_body_structure"), specimen_id)
}

/// Conditions key on subject plus the diagnosis identifier (the record id
/// when the extract carries one, else the primary diagnosis code).
pub fn condition(subject_id: &str, diagnosis_ref: &str) -> NaturalKey {
    NaturalKey::new(system("diagnosis_id"), [subject_id, diagnosis_ref])
}

/// Observations key on the field they were derived from, the focus id, and
/// the raw value, so repeated values for one focus stay distinct per field.
pub fn observation(field: &str, focus_id: &str, raw: &str) -> NaturalKey {
    NaturalKey::new(system(field), [focus_id, raw])
}

pub fn medication(agent: &str) -> NaturalKey {
    NaturalKey::single(system("therapeutic_agent"), agent)
}

pub fn substance(agent: &str) -> NaturalKey {
    NaturalKey::single(system("therapeutic_agent"), agent)
}

pub fn substance_definition(agent: &str) -> NaturalKey {
    NaturalKey::single(system("therapeutic_agent"), agent)
}

pub fn medication_administration(treatment_id: &str, subject_id: &str) -> NaturalKey {
    NaturalKey::new(system("treatment_id"), [treatment_id, subject_id])
}

pub fn document_reference(file_id: &str) -> NaturalKey {
    NaturalKey::single(system("file_id"), file_id)
}

pub fn group(file_id: &str) -> NaturalKey {
    NaturalKey::single(system("file_group"), file_id)
}
