//! Somatic mutation rows map to genomic Observations on the Patient.

use serde_json::{Value, json};

use cda_model::{ResourceKind, SourceRecord, TargetResource, TransformError};

use crate::ids::mint_id;
use crate::mappers::{Mapped, keys, require_id};
use crate::vocab;

const LOINC: &str = "http://loinc.org";

pub fn map_mutation(record: &SourceRecord, subject_id: &str) -> Result<Mapped, TransformError> {
    let mutation_id = require_id(record, ResourceKind::Observation, "mutation")?;
    let key = keys::observation("mutation", subject_id, mutation_id);
    let id = mint_id(ResourceKind::Observation, &key)?;
    let mut resource = TargetResource::new(ResourceKind::Observation, id, vec![(&key).into()]);
    resource.set_text("status", "final");
    resource.set_field(
        "code",
        vocab::codeable_concept(LOINC, "69548-6", "Genetic variant assessment"),
    );

    let mut components: Vec<Value> = Vec::new();
    for (field, display) in [
        ("hugo_symbol", "Gene studied"),
        ("chromosome", "Chromosome"),
        ("variant_type", "Variant type"),
        ("variant_class", "Variant class"),
        ("reference_allele", "Reference allele"),
        ("mutation_status", "Mutation status"),
    ] {
        if let Some(value) = record.text(field) {
            components.push(json!({
                "code": vocab::concept_text(display),
                "valueString": value,
            }));
        }
    }
    if !components.is_empty() {
        resource.set_field("component", Value::Array(components));
    }

    resource.request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));
    resource.request_reference("focus", ResourceKind::Patient, keys::patient(subject_id));
    Ok(Mapped::new(resource))
}
