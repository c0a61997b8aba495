//! The in-memory form of one CDA extract.

use std::collections::BTreeMap;

use cda_model::SourceRecord;

/// Every entity table and association table of one extract.
///
/// Entity rows are kept in file order; associations are `(left, right)` id
/// pairs named after their table. Construct directly in tests or through
/// [`crate::discovery::load_raw_dir`].
#[derive(Debug, Default, Clone)]
pub struct CdaTables {
    pub subjects: Vec<SourceRecord>,
    pub research_subjects: Vec<SourceRecord>,
    pub diagnoses: Vec<SourceRecord>,
    pub treatments: Vec<SourceRecord>,
    pub specimens: Vec<SourceRecord>,
    pub files: Vec<SourceRecord>,
    pub mutations: Vec<SourceRecord>,

    /// `(subject_id, researchsubject_id)`
    pub subject_research_subjects: Vec<(String, String)>,
    /// `(researchsubject_id, diagnosis_id)`
    pub research_subject_diagnoses: Vec<(String, String)>,
    /// `(researchsubject_id, treatment_id)`
    pub research_subject_treatments: Vec<(String, String)>,
    /// `(subject_id, associated_project)`
    pub subject_projects: Vec<(String, String)>,
    /// `(file_id, subject_id)`
    pub file_subjects: Vec<(String, String)>,
    /// `(file_id, specimen_id)`
    pub file_specimens: Vec<(String, String)>,
    /// `(subject_id, mutation_id)`
    pub subject_mutations: Vec<(String, String)>,

    /// project id -> dbGaP study accession
    pub project_dbgap: Vec<(String, String)>,
    /// program name -> dbGaP study accession
    pub program_dbgap: Vec<(String, String)>,
}

impl CdaTables {
    /// Build the borrow-only lookup index the pipeline traverses with.
    pub fn index(&self) -> TableIndex<'_> {
        TableIndex::new(self)
    }
}

fn by_id(records: &[SourceRecord]) -> BTreeMap<&str, &SourceRecord> {
    records
        .iter()
        .filter_map(|record| record.text("id").map(|id| (id, record)))
        .collect()
}

fn grouped<'a>(pairs: &'a [(String, String)]) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut out: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (left, right) in pairs {
        out.entry(left.as_str()).or_default().push(right.as_str());
    }
    out
}

fn grouped_inverse<'a>(pairs: &'a [(String, String)]) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut out: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (left, right) in pairs {
        out.entry(right.as_str()).or_default().push(left.as_str());
    }
    out
}

/// Borrowed lookup structures over a [`CdaTables`].
pub struct TableIndex<'a> {
    subjects: BTreeMap<&'a str, &'a SourceRecord>,
    research_subjects: BTreeMap<&'a str, &'a SourceRecord>,
    diagnoses: BTreeMap<&'a str, &'a SourceRecord>,
    treatments: BTreeMap<&'a str, &'a SourceRecord>,
    specimens: BTreeMap<&'a str, &'a SourceRecord>,
    files: BTreeMap<&'a str, &'a SourceRecord>,
    mutations: BTreeMap<&'a str, &'a SourceRecord>,

    research_subjects_of_subject: BTreeMap<&'a str, Vec<&'a str>>,
    diagnoses_of_research_subject: BTreeMap<&'a str, Vec<&'a str>>,
    treatments_of_research_subject: BTreeMap<&'a str, Vec<&'a str>>,
    projects_of_subject: BTreeMap<&'a str, Vec<&'a str>>,
    subjects_of_file: BTreeMap<&'a str, Vec<&'a str>>,
    specimens_of_file: BTreeMap<&'a str, Vec<&'a str>>,
    files_of_subject: BTreeMap<&'a str, Vec<&'a str>>,
    mutations_of_subject: BTreeMap<&'a str, Vec<&'a str>>,
    specimens_of_subject: BTreeMap<&'a str, Vec<&'a str>>,

    project_dbgap: BTreeMap<&'a str, &'a str>,
    program_dbgap: BTreeMap<&'a str, &'a str>,
}

impl<'a> TableIndex<'a> {
    fn new(tables: &'a CdaTables) -> Self {
        let mut specimens_of_subject: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for specimen in &tables.specimens {
            let (Some(id), Some(subject)) =
                (specimen.text("id"), specimen.text("derived_from_subject"))
            else {
                continue;
            };
            specimens_of_subject.entry(subject).or_default().push(id);
        }

        Self {
            subjects: by_id(&tables.subjects),
            research_subjects: by_id(&tables.research_subjects),
            diagnoses: by_id(&tables.diagnoses),
            treatments: by_id(&tables.treatments),
            specimens: by_id(&tables.specimens),
            files: by_id(&tables.files),
            mutations: by_id(&tables.mutations),
            research_subjects_of_subject: grouped(&tables.subject_research_subjects),
            diagnoses_of_research_subject: grouped(&tables.research_subject_diagnoses),
            treatments_of_research_subject: grouped(&tables.research_subject_treatments),
            projects_of_subject: grouped(&tables.subject_projects),
            subjects_of_file: grouped(&tables.file_subjects),
            specimens_of_file: grouped(&tables.file_specimens),
            files_of_subject: grouped_inverse(&tables.file_subjects),
            mutations_of_subject: grouped(&tables.subject_mutations),
            specimens_of_subject,
            project_dbgap: tables
                .project_dbgap
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            program_dbgap: tables
                .program_dbgap
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        }
    }

    pub fn subject(&self, id: &str) -> Option<&'a SourceRecord> {
        self.subjects.get(id).copied()
    }

    pub fn research_subject(&self, id: &str) -> Option<&'a SourceRecord> {
        self.research_subjects.get(id).copied()
    }

    pub fn diagnosis(&self, id: &str) -> Option<&'a SourceRecord> {
        self.diagnoses.get(id).copied()
    }

    pub fn treatment(&self, id: &str) -> Option<&'a SourceRecord> {
        self.treatments.get(id).copied()
    }

    pub fn specimen(&self, id: &str) -> Option<&'a SourceRecord> {
        self.specimens.get(id).copied()
    }

    pub fn file(&self, id: &str) -> Option<&'a SourceRecord> {
        self.files.get(id).copied()
    }

    pub fn mutation(&self, id: &str) -> Option<&'a SourceRecord> {
        self.mutations.get(id).copied()
    }

    pub fn research_subjects_of(&self, subject_id: &str) -> &[&'a str] {
        lookup(&self.research_subjects_of_subject, subject_id)
    }

    pub fn diagnoses_of(&self, research_subject_id: &str) -> &[&'a str] {
        lookup(&self.diagnoses_of_research_subject, research_subject_id)
    }

    pub fn treatments_of(&self, research_subject_id: &str) -> &[&'a str] {
        lookup(&self.treatments_of_research_subject, research_subject_id)
    }

    pub fn projects_of(&self, subject_id: &str) -> &[&'a str] {
        lookup(&self.projects_of_subject, subject_id)
    }

    pub fn subjects_of_file(&self, file_id: &str) -> &[&'a str] {
        lookup(&self.subjects_of_file, file_id)
    }

    pub fn specimens_of_file(&self, file_id: &str) -> &[&'a str] {
        lookup(&self.specimens_of_file, file_id)
    }

    pub fn files_of(&self, subject_id: &str) -> &[&'a str] {
        lookup(&self.files_of_subject, subject_id)
    }

    pub fn mutations_of(&self, subject_id: &str) -> &[&'a str] {
        lookup(&self.mutations_of_subject, subject_id)
    }

    pub fn specimens_of_subject(&self, subject_id: &str) -> &[&'a str] {
        lookup(&self.specimens_of_subject, subject_id)
    }

    pub fn project_dbgap(&self, project: &str) -> Option<&'a str> {
        self.project_dbgap.get(project).copied()
    }

    /// Accession of the program a project belongs to, matched by the
    /// program-name prefix convention of aggregator project ids
    /// (e.g. `TCGA-BRCA` belongs to program `TCGA`).
    pub fn program_dbgap_for(&self, project: &str) -> Option<(&'a str, &'a str)> {
        self.program_dbgap
            .iter()
            .find(|(program, _)| project.starts_with(**program))
            .map(|(program, accession)| (*program, *accession))
    }
}

fn lookup<'m, 'a>(map: &'m BTreeMap<&'a str, Vec<&'a str>>, key: &str) -> &'m [&'a str] {
    map.get(key).map_or(&[], Vec::as_slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> SourceRecord {
        SourceRecord::try_from(value).unwrap()
    }

    #[test]
    fn index_joins_subjects_to_dependents() {
        let tables = CdaTables {
            subjects: vec![record(json!({"id": "s1"}))],
            research_subjects: vec![record(json!({"id": "r1"}))],
            specimens: vec![record(json!({"id": "sp1", "derived_from_subject": "s1"}))],
            subject_research_subjects: vec![("s1".to_string(), "r1".to_string())],
            ..CdaTables::default()
        };
        let index = tables.index();
        assert!(index.subject("s1").is_some());
        assert_eq!(index.research_subjects_of("s1"), ["r1"]);
        assert_eq!(index.specimens_of_subject("s1"), ["sp1"]);
        assert!(index.research_subjects_of("s2").is_empty());
    }

    #[test]
    fn program_lookup_matches_project_prefix() {
        let tables = CdaTables {
            program_dbgap: vec![("TCGA".to_string(), "phs000178".to_string())],
            ..CdaTables::default()
        };
        let index = tables.index();
        assert_eq!(
            index.program_dbgap_for("TCGA-BRCA"),
            Some(("TCGA", "phs000178"))
        );
        assert_eq!(index.program_dbgap_for("MMRF-COMMPASS"), None);
    }
}
