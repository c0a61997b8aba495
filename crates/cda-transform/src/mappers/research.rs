//! Research subject and study mapping.
//!
//! Every subject↔project association yields a ResearchStudy; dbGaP
//! accessions from the lookup tables attach as secondary identifiers, and a
//! project whose name carries a known program prefix also yields the
//! program-level ResearchStudy, wired through `partOf`.

use cda_ingest::TableIndex;
use cda_model::{IdentifierEntry, ResourceKind, SourceRecord, TargetResource, TransformError};

use crate::ids::{mint_id, systems};
use crate::mappers::{Mapped, keys, require_id};
use crate::vocab;

pub fn map_research_subject(
    record: &SourceRecord,
    subject_id: &str,
) -> Result<Mapped, TransformError> {
    let research_subject_id = require_id(record, ResourceKind::ResearchSubject, "researchsubject")?;
    let key = keys::research_subject(research_subject_id);
    let id = mint_id(ResourceKind::ResearchSubject, &key)?;
    let mut resource = TargetResource::new(ResourceKind::ResearchSubject, id, vec![(&key).into()]);
    resource.set_text("status", "active");
    if let Some(condition) = record.text("primary_diagnosis_condition") {
        resource.set_field("condition", vocab::concept_text(condition));
    }
    if let Some(site) = record.text("primary_diagnosis_site") {
        resource.set_field("site", vocab::concept_text(site));
    }
    resource.request_reference("subject", ResourceKind::Patient, keys::patient(subject_id));
    if let Some(project) = record.text("member_of_research_project") {
        resource.request_reference(
            "study",
            ResourceKind::ResearchStudy,
            keys::research_study(project),
        );
    }
    Ok(Mapped::new(resource))
}

pub fn map_project(
    name: &str,
    research_subject: Option<&SourceRecord>,
    index: &TableIndex<'_>,
) -> Result<Vec<Mapped>, TransformError> {
    let key = keys::research_study(name);
    let id = mint_id(ResourceKind::ResearchStudy, &key)?;
    let mut study = TargetResource::new(ResourceKind::ResearchStudy, id, vec![(&key).into()]);
    study.set_text("name", name);
    study.set_text("status", "active");
    if let Some(condition) = research_subject.and_then(|rs| rs.text("primary_diagnosis_condition"))
    {
        study.set_field("condition", vocab::concept_text(condition));
    }
    if let Some(accession) = index.project_dbgap(name) {
        study.push_identifier(IdentifierEntry::secondary(systems::DBGAP, accession));
    }

    let mut out = Vec::new();
    if let Some((program, accession)) = index.program_dbgap_for(name) {
        let program_key = keys::research_study(program);
        let program_id = mint_id(ResourceKind::ResearchStudy, &program_key)?;
        let mut program_study = TargetResource::new(
            ResourceKind::ResearchStudy,
            program_id,
            vec![(&program_key).into()],
        );
        program_study.set_text("name", program);
        program_study.set_text("status", "active");
        program_study.push_identifier(IdentifierEntry::secondary(systems::DBGAP, accession));
        study.request_reference("partOf", ResourceKind::ResearchStudy, program_key);
        out.push(Mapped::new(program_study));
    }
    out.insert(0, Mapped::new(study));
    Ok(out)
}
