//! Per-kind resource mappers.
//!
//! One source entity maps to one or more target resources; the entity forms
//! a closed set, so dispatch is an exhaustive `match` rather than a runtime
//! registry. Mappers are pure — record in, resources plus warnings out —
//! and attach unresolved reference slots for the resolver to rewrite later.

pub mod condition;
pub mod file;
pub mod keys;
pub mod mutation;
pub mod patient;
pub mod research;
pub mod specimen;
pub mod treatment;

use cda_ingest::TableIndex;
use cda_model::{ResourceKind, SourceRecord, TargetResource, TransformError};

/// One mapped resource together with the field-level warnings its mapping
/// produced. Warnings never abort a record; they surface in the run report.
#[derive(Debug)]
pub struct Mapped {
    pub resource: TargetResource,
    pub warnings: Vec<TransformError>,
}

impl Mapped {
    pub fn new(resource: TargetResource) -> Self {
        Self {
            resource,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: TransformError) {
        self.warnings.push(warning);
    }
}

/// A source record paired with the join context its mapping needs.
#[derive(Debug, Clone, Copy)]
pub enum SourceEntity<'a> {
    Subject(&'a SourceRecord),
    ResearchSubject {
        record: &'a SourceRecord,
        subject_id: &'a str,
    },
    Project {
        name: &'a str,
        research_subject: Option<&'a SourceRecord>,
    },
    Diagnosis {
        record: &'a SourceRecord,
        subject_id: &'a str,
        research_subject_id: &'a str,
    },
    Treatment {
        record: &'a SourceRecord,
        subject_id: &'a str,
    },
    Specimen(&'a SourceRecord),
    File {
        record: &'a SourceRecord,
        subject_ids: &'a [&'a str],
        specimen_ids: &'a [&'a str],
    },
    Mutation {
        record: &'a SourceRecord,
        subject_id: &'a str,
    },
}

/// Map one source entity into its target resources.
///
/// An `InvalidKey` error means the primary record cannot be identified and
/// must be skipped; everything else is carried as per-resource warnings.
pub fn map_entity(
    entity: SourceEntity<'_>,
    index: &TableIndex<'_>,
) -> Result<Vec<Mapped>, TransformError> {
    match entity {
        SourceEntity::Subject(record) => patient::map_subject(record),
        SourceEntity::ResearchSubject { record, subject_id } => {
            research::map_research_subject(record, subject_id).map(|mapped| vec![mapped])
        }
        SourceEntity::Project {
            name,
            research_subject,
        } => research::map_project(name, research_subject, index),
        SourceEntity::Diagnosis {
            record,
            subject_id,
            research_subject_id,
        } => condition::map_diagnosis(record, subject_id, research_subject_id),
        SourceEntity::Treatment { record, subject_id } => {
            treatment::map_treatment(record, subject_id)
        }
        SourceEntity::Specimen(record) => specimen::map_specimen(record),
        SourceEntity::File {
            record,
            subject_ids,
            specimen_ids,
        } => file::map_file(record, subject_ids, specimen_ids),
        SourceEntity::Mutation { record, subject_id } => {
            mutation::map_mutation(record, subject_id).map(|mapped| vec![mapped])
        }
    }
}

/// Required `id` field of a primary record, or the `InvalidKey` that skips it.
pub(crate) fn require_id<'a>(
    record: &'a SourceRecord,
    kind: ResourceKind,
    table: &str,
) -> Result<&'a str, TransformError> {
    record
        .text("id")
        .ok_or_else(|| TransformError::invalid_key(kind, format!("{table} record has no id")))
}
