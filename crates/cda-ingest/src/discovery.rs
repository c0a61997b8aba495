//! Raw-extract directory layout and loading.
//!
//! A raw extract directory holds entity tables at the top level, association
//! tables under `association_tables/`, and dbGaP lookups under
//! `lookup_tables/`. Only the subject table is required; everything else
//! loads as empty when absent.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::json_ingest::{read_entity_table, read_subject_table};
use crate::tables::CdaTables;
use crate::tsv_ingest::read_pairs;

/// Row counts per loaded table, plus subjects dropped by the species filter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub loaded: BTreeMap<String, u64>,
    pub filtered_subjects: u64,
}

/// Load a raw extract directory into memory.
pub fn load_raw_dir(root: &Path) -> Result<(CdaTables, IngestStats)> {
    let mut stats = IngestStats::default();
    let mut tables = CdaTables::default();

    let subject_path = root.join("subject.json");
    if !subject_path.is_file() {
        return Err(IngestError::MissingTable { path: subject_path });
    }
    let (subjects, filtered) = read_subject_table(&subject_path)?;
    stats.filtered_subjects = filtered;
    stats
        .loaded
        .insert("subject".to_string(), subjects.len() as u64);
    tables.subjects = subjects;

    tables.research_subjects = entity(root, "researchsubject", &mut stats)?;
    tables.diagnoses = entity(root, "diagnosis", &mut stats)?;
    tables.treatments = entity(root, "treatment", &mut stats)?;
    tables.specimens = entity(root, "specimen", &mut stats)?;
    tables.files = entity(root, "file", &mut stats)?;
    tables.mutations = entity(root, "mutation", &mut stats)?;

    let assoc = root.join("association_tables");
    tables.subject_research_subjects = association(
        &assoc.join("subject_researchsubject.tsv"),
        "subject_id",
        "researchsubject_id",
        &mut stats,
    )?;
    tables.research_subject_diagnoses = association(
        &assoc.join("researchsubject_diagnosis.tsv"),
        "researchsubject_id",
        "diagnosis_id",
        &mut stats,
    )?;
    tables.research_subject_treatments = association(
        &assoc.join("researchsubject_treatment.tsv"),
        "researchsubject_id",
        "treatment_id",
        &mut stats,
    )?;
    tables.subject_projects = association(
        &assoc.join("subject_associated_project.tsv"),
        "subject_id",
        "associated_project",
        &mut stats,
    )?;
    tables.file_subjects = association(
        &assoc.join("file_subject.tsv"),
        "file_id",
        "subject_id",
        &mut stats,
    )?;
    tables.file_specimens = association(
        &assoc.join("file_specimen.tsv"),
        "file_id",
        "specimen_id",
        &mut stats,
    )?;
    tables.subject_mutations = association(
        &assoc.join("subject_mutation.tsv"),
        "subject_id",
        "mutation_id",
        &mut stats,
    )?;

    let lookups = root.join("lookup_tables");
    tables.project_dbgap = association(
        &lookups.join("project_dbgap.tsv"),
        "project_id",
        "dbgap_study_accession",
        &mut stats,
    )?;
    tables.program_dbgap = association(
        &lookups.join("gdc_program_dbgap.tsv"),
        "program",
        "dbgap_study_accession",
        &mut stats,
    )?;

    info!(
        subjects = tables.subjects.len(),
        tables = stats.loaded.len(),
        "loaded raw extract"
    );
    Ok((tables, stats))
}

fn entity(
    root: &Path,
    name: &str,
    stats: &mut IngestStats,
) -> Result<Vec<cda_model::SourceRecord>> {
    let path = root.join(format!("{name}.json"));
    if !path.is_file() {
        debug!(table = name, "entity table absent, loading as empty");
        return Ok(Vec::new());
    }
    let records = read_entity_table(&path)?;
    stats.loaded.insert(name.to_string(), records.len() as u64);
    Ok(records)
}

fn association(
    path: &Path,
    left: &str,
    right: &str,
    stats: &mut IngestStats,
) -> Result<Vec<(String, String)>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let pairs = read_pairs(path, left, right)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("association")
        .to_string();
    stats.loaded.insert(name, pairs.len() as u64);
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_minimal_extract() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("subject.json"),
            r#"[{"id": "s1", "species": "Homo sapiens"}]"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join("association_tables")).unwrap();
        fs::write(
            dir.path().join("association_tables/subject_researchsubject.tsv"),
            "subject_id\tresearchsubject_id\ns1\tr1\n",
        )
        .unwrap();

        let (tables, stats) = load_raw_dir(dir.path()).unwrap();
        assert_eq!(tables.subjects.len(), 1);
        assert_eq!(
            tables.subject_research_subjects,
            vec![("s1".to_string(), "r1".to_string())]
        );
        assert_eq!(stats.loaded["subject"], 1);
        assert!(tables.diagnoses.is_empty());
    }

    #[test]
    fn missing_subject_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_raw_dir(dir.path()),
            Err(IngestError::MissingTable { .. })
        ));
    }
}
