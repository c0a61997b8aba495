//! The transformation pipeline.
//!
//! Orchestrates mapping across resource kinds: subjects are traversed in
//! minted-identifier order (not source row order, so sampling is stable for
//! a fixed seed), each subject's dependent records fan out through the
//! per-kind mappers, and the accumulated graph is resolved once after the
//! whole batch has mapped. Per-record failures skip that record and are
//! reported; only structural input problems abort a run, and those surface
//! upstream in ingest.

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::{info, warn};

use cda_ingest::{CdaTables, TableIndex};
use cda_model::{
    CancelToken, FieldWarning, ResourceGraph, ResourceId, ResourceKind, RunReport, SourceRecord,
    TargetResource, TransformError, TransformOptions,
};

use crate::mappers::{Mapped, SourceEntity, keys, map_entity};
use crate::resolver;
use crate::sampling;

pub struct TransformationPipeline<'a> {
    tables: &'a CdaTables,
    options: TransformOptions,
    cancel: CancelToken,
}

impl<'a> TransformationPipeline<'a> {
    pub fn new(tables: &'a CdaTables, options: TransformOptions) -> Self {
        Self {
            tables,
            options: options.normalized(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Map every eligible record, then resolve the complete graph.
    pub fn run(&self) -> (ResourceGraph, RunReport) {
        let index = self.tables.index();
        let mut report = RunReport::default();
        let mut graph = ResourceGraph::new();

        let mut ordered: Vec<(ResourceId, &SourceRecord)> = Vec::new();
        for subject in &self.tables.subjects {
            let Some(subject_id) = subject.text("id") else {
                warn!("skipping subject record without id");
                report.skip("subject", "<missing id>", "subject record has no id");
                continue;
            };
            match crate::ids::mint_id(ResourceKind::Patient, &keys::patient(subject_id)) {
                Ok(id) => ordered.push((id, subject)),
                Err(error) => {
                    warn!(subject = subject_id, %error, "skipping subject record");
                    report.skip("subject", subject_id, error.to_string());
                }
            }
        }
        ordered.sort_by_key(|(id, _)| *id);

        if let Some(n) = self.options.sample_size {
            if n < ordered.len() {
                let picked = sampling::sample_indices(ordered.len(), n, self.options.seed);
                let selected: Vec<_> = picked.iter().map(|&i| ordered[i]).collect();
                ordered = selected;
                report.sampled_subjects = Some(ordered.len());
            }
        }

        info!(subjects = ordered.len(), "mapping phase started");
        let results: Vec<(Vec<TargetResource>, RunReport)> = ordered
            .par_iter()
            .map(|(_, subject)| {
                if self.cancel.is_cancelled() {
                    return (Vec::new(), RunReport::default());
                }
                self.map_subject_tree(subject, &index)
            })
            .collect();
        for (resources, partial) in results {
            report.merge(partial);
            graph.extend(resources);
        }

        if self.options.include_files && !self.cancel.is_cancelled() {
            self.map_orphan_files(&index, &mut graph, &mut report);
        }
        report_structural_orphans(self.tables, &index, &self.options, &mut report);

        if self.cancel.is_cancelled() {
            report.cancelled = true;
            info!("run cancelled before resolution");
            return (graph, report);
        }

        // Barrier: mapping for the whole batch is complete from here on.
        let resolution = resolver::resolve(&mut graph);
        info!(
            resources = graph.len(),
            resolved = resolution.resolved,
            failed = resolution.failed,
            "resolution phase finished"
        );
        (graph, report)
    }

    /// Map one subject and everything reachable from it.
    fn map_subject_tree(
        &self,
        subject: &SourceRecord,
        index: &TableIndex<'_>,
    ) -> (Vec<TargetResource>, RunReport) {
        let mut out = Vec::new();
        let mut report = RunReport::default();
        let Some(subject_id) = subject.text("id") else {
            return (out, report);
        };

        match map_entity(SourceEntity::Subject(subject), index) {
            Ok(mapped) => collect(&mut out, &mut report, "subject", subject_id, mapped),
            Err(error) => {
                warn!(subject = subject_id, %error, "skipping subject record");
                report.skip("subject", subject_id, error.to_string());
                return (out, report);
            }
        }

        let research_subject_ids = index.research_subjects_of(subject_id);
        let first_research_subject = research_subject_ids
            .first()
            .and_then(|id| index.research_subject(id));
        for &project in index.projects_of(subject_id) {
            match map_entity(
                SourceEntity::Project {
                    name: project,
                    research_subject: first_research_subject,
                },
                index,
            ) {
                Ok(mapped) => collect(&mut out, &mut report, "subject_project", project, mapped),
                Err(error) => report.skip("subject_project", project, error.to_string()),
            }
        }

        for &research_subject_id in research_subject_ids {
            let Some(research_subject) = index.research_subject(research_subject_id) else {
                report.skip(
                    "researchsubject",
                    research_subject_id,
                    "association references a missing researchsubject row",
                );
                continue;
            };
            match map_entity(
                SourceEntity::ResearchSubject {
                    record: research_subject,
                    subject_id,
                },
                index,
            ) {
                Ok(mapped) => collect(
                    &mut out,
                    &mut report,
                    "researchsubject",
                    research_subject_id,
                    mapped,
                ),
                Err(error) => {
                    report.skip("researchsubject", research_subject_id, error.to_string());
                    continue;
                }
            }

            if self.options.include_condition {
                let mut mapped_diagnoses = 0usize;
                for &diagnosis_id in index.diagnoses_of(research_subject_id) {
                    if self
                        .options
                        .diagnosis_limit
                        .is_some_and(|limit| mapped_diagnoses >= limit)
                    {
                        break;
                    }
                    let Some(diagnosis) = index.diagnosis(diagnosis_id) else {
                        report.skip(
                            "diagnosis",
                            diagnosis_id,
                            "association references a missing diagnosis row",
                        );
                        continue;
                    };
                    match map_entity(
                        SourceEntity::Diagnosis {
                            record: diagnosis,
                            subject_id,
                            research_subject_id,
                        },
                        index,
                    ) {
                        Ok(mapped) => {
                            mapped_diagnoses += 1;
                            collect(&mut out, &mut report, "diagnosis", diagnosis_id, mapped);
                        }
                        Err(error) => {
                            warn!(diagnosis = diagnosis_id, %error, "skipping diagnosis record");
                            report.skip("diagnosis", diagnosis_id, error.to_string());
                        }
                    }
                }
            }

            if self.options.include_treatment {
                for &treatment_id in index.treatments_of(research_subject_id) {
                    let Some(treatment) = index.treatment(treatment_id) else {
                        report.skip(
                            "treatment",
                            treatment_id,
                            "association references a missing treatment row",
                        );
                        continue;
                    };
                    match map_entity(
                        SourceEntity::Treatment {
                            record: treatment,
                            subject_id,
                        },
                        index,
                    ) {
                        Ok(mapped) => {
                            collect(&mut out, &mut report, "treatment", treatment_id, mapped);
                        }
                        Err(error) => {
                            report.skip("treatment", treatment_id, error.to_string());
                        }
                    }
                }
            }
        }

        for &specimen_id in index.specimens_of_subject(subject_id) {
            let Some(specimen) = index.specimen(specimen_id) else {
                continue;
            };
            match map_entity(SourceEntity::Specimen(specimen), index) {
                Ok(mapped) => collect(&mut out, &mut report, "specimen", specimen_id, mapped),
                Err(error) => report.skip("specimen", specimen_id, error.to_string()),
            }
        }

        if self.options.include_files {
            let mut mapped_files = 0usize;
            for &file_id in index.files_of(subject_id) {
                if self
                    .options
                    .file_limit
                    .is_some_and(|limit| mapped_files >= limit)
                {
                    break;
                }
                let Some(file) = index.file(file_id) else {
                    report.skip("file", file_id, "association references a missing file row");
                    continue;
                };
                // One subject owns the file mapping: the first associated
                // subject that exists. Others see the same file and move on.
                let subjects: Vec<&str> = index
                    .subjects_of_file(file_id)
                    .iter()
                    .copied()
                    .filter(|id| index.subject(id).is_some())
                    .collect();
                if subjects.first() != Some(&subject_id) {
                    continue;
                }
                let specimens = index.specimens_of_file(file_id);
                match map_entity(
                    SourceEntity::File {
                        record: file,
                        subject_ids: &subjects,
                        specimen_ids: specimens,
                    },
                    index,
                ) {
                    Ok(mapped) => {
                        mapped_files += 1;
                        collect(&mut out, &mut report, "file", file_id, mapped);
                    }
                    Err(error) => report.skip("file", file_id, error.to_string()),
                }
            }
        }

        if self.options.include_mutation {
            for &mutation_id in index.mutations_of(subject_id) {
                let Some(mutation) = index.mutation(mutation_id) else {
                    report.skip(
                        "mutation",
                        mutation_id,
                        "association references a missing mutation row",
                    );
                    continue;
                };
                match map_entity(
                    SourceEntity::Mutation {
                        record: mutation,
                        subject_id,
                    },
                    index,
                ) {
                    Ok(mapped) => collect(&mut out, &mut report, "mutation", mutation_id, mapped),
                    Err(error) => report.skip("mutation", mutation_id, error.to_string()),
                }
            }
        }

        (out, report)
    }

    /// Files with no surviving subject association still emit a
    /// DocumentReference (without a Group).
    fn map_orphan_files(
        &self,
        index: &TableIndex<'_>,
        graph: &mut ResourceGraph,
        report: &mut RunReport,
    ) {
        for file in &self.tables.files {
            let Some(file_id) = file.text("id") else {
                report.skip("file", "<missing id>", "file record has no id");
                continue;
            };
            let has_subject = index
                .subjects_of_file(file_id)
                .iter()
                .any(|id| index.subject(id).is_some());
            if has_subject {
                continue;
            }
            let specimens = index.specimens_of_file(file_id);
            match map_entity(
                SourceEntity::File {
                    record: file,
                    subject_ids: &[],
                    specimen_ids: specimens,
                },
                index,
            ) {
                Ok(mapped) => {
                    let mut out = Vec::new();
                    collect(&mut out, report, "file", file_id, mapped);
                    graph.extend(out);
                }
                Err(error) => report.skip("file", file_id, error.to_string()),
            }
        }
    }
}

/// Move mapped resources into the output list, folding their warnings into
/// the report.
fn collect(
    out: &mut Vec<TargetResource>,
    report: &mut RunReport,
    table: &str,
    record_label: &str,
    mapped: Vec<Mapped>,
) {
    report.record_processed(table);
    for item in mapped {
        for warning in &item.warnings {
            if let TransformError::FieldMapping {
                field,
                value,
                detail,
            } = warning
            {
                warn!(table, record = record_label, field, value, "field value skipped");
                report.warnings.push(FieldWarning {
                    table: table.to_string(),
                    record: record_label.to_string(),
                    field: field.clone(),
                    value: value.clone(),
                    detail: detail.clone(),
                });
            }
        }
        out.push(item.resource);
    }
}

/// Rows no association can ever reach are reported as skips; without this
/// they would vanish without a trace.
fn report_structural_orphans(
    tables: &CdaTables,
    index: &TableIndex<'_>,
    options: &TransformOptions,
    report: &mut RunReport,
) {
    let associated_research_subjects: BTreeSet<&str> = tables
        .subject_research_subjects
        .iter()
        .map(|(_, rs)| rs.as_str())
        .collect();
    for research_subject in &tables.research_subjects {
        match research_subject.text("id") {
            Some(id) if !associated_research_subjects.contains(id) => {
                report.skip("researchsubject", id, "no subject association");
            }
            None => report.skip(
                "researchsubject",
                "<missing id>",
                "researchsubject record has no id",
            ),
            _ => {}
        }
    }

    for specimen in &tables.specimens {
        let Some(id) = specimen.text("id") else {
            report.skip("specimen", "<missing id>", "specimen record has no id");
            continue;
        };
        match specimen.text("derived_from_subject") {
            None => report.skip("specimen", id, "no derived_from_subject"),
            Some(subject_id) if index.subject(subject_id).is_none() => {
                report.skip("specimen", id, format!("unknown subject `{subject_id}`"));
            }
            _ => {}
        }
    }

    if options.include_condition {
        let associated: BTreeSet<&str> = tables
            .research_subject_diagnoses
            .iter()
            .map(|(_, d)| d.as_str())
            .collect();
        for diagnosis in &tables.diagnoses {
            match diagnosis.text("id") {
                Some(id) if !associated.contains(id) => {
                    report.skip("diagnosis", id, "no researchsubject association");
                }
                None => report.skip("diagnosis", "<missing id>", "diagnosis record has no id"),
                _ => {}
            }
        }
    }

    if options.include_treatment {
        let associated: BTreeSet<&str> = tables
            .research_subject_treatments
            .iter()
            .map(|(_, t)| t.as_str())
            .collect();
        for treatment in &tables.treatments {
            match treatment.text("id") {
                Some(id) if !associated.contains(id) => {
                    report.skip("treatment", id, "no researchsubject association");
                }
                None => report.skip("treatment", "<missing id>", "treatment record has no id"),
                _ => {}
            }
        }
    }

    if options.include_mutation {
        let associated: BTreeSet<&str> = tables
            .subject_mutations
            .iter()
            .map(|(_, m)| m.as_str())
            .collect();
        for mutation in &tables.mutations {
            match mutation.text("id") {
                Some(id) if !associated.contains(id) => {
                    report.skip("mutation", id, "no subject association");
                }
                None => report.skip("mutation", "<missing id>", "mutation record has no id"),
                _ => {}
            }
        }
    }
}
