//! Whole-workflow tests: raw extract on disk, transform, emit, read back,
//! validate.

use std::fs;
use std::path::Path;

use cda_ingest::load_raw_dir;
use cda_model::{ResourceKind, TransformOptions};
use cda_report::{read_graph, write_graph};
use cda_transform::TransformationPipeline;
use cda_validate::validate;

fn write_fixture_extract(root: &Path) {
    fs::write(
        root.join("subject.json"),
        r#"[
            {"id": "S1", "species": "Homo sapiens", "sex": "female", "vital_status": "Alive"},
            {"id": "S2", "species": "Homo sapiens", "sex": "male", "vital_status": "Dead",
             "cause_of_death": "metastasis"},
            {"id": "S3", "species": "Mus musculus"}
        ]"#,
    )
    .unwrap();
    fs::write(
        root.join("researchsubject.json"),
        r#"[{"id": "r1", "member_of_research_project": "TCGA-BRCA",
             "primary_diagnosis_condition": "Breast Carcinoma"}]"#,
    )
    .unwrap();
    fs::write(
        root.join("diagnosis.json"),
        r#"[{"id": "d1", "primary_diagnosis": "Infiltrating duct carcinoma",
             "pathologic_stage": "Stage IIB", "age_at_diagnosis": 18250}]"#,
    )
    .unwrap();
    fs::write(
        root.join("treatment.json"),
        r#"[{"id": "t1", "treatment_type": "Chemotherapy", "therapeutic_agent": "Cisplatin"}]"#,
    )
    .unwrap();
    fs::write(
        root.join("specimen.json"),
        r#"[{"id": "sp1", "derived_from_subject": "S1", "anatomical_site": "Breast",
             "source_material_type": "Primary Tumor"}]"#,
    )
    .unwrap();

    let assoc = root.join("association_tables");
    fs::create_dir(&assoc).unwrap();
    fs::write(
        assoc.join("subject_researchsubject.tsv"),
        "subject_id\tresearchsubject_id\nS1\tr1\n",
    )
    .unwrap();
    fs::write(
        assoc.join("researchsubject_diagnosis.tsv"),
        "researchsubject_id\tdiagnosis_id\nr1\td1\n",
    )
    .unwrap();
    fs::write(
        assoc.join("researchsubject_treatment.tsv"),
        "researchsubject_id\ttreatment_id\nr1\tt1\n",
    )
    .unwrap();
    fs::write(
        assoc.join("subject_associated_project.tsv"),
        "subject_id\tassociated_project\nS1\tTCGA-BRCA\n",
    )
    .unwrap();
}

#[test]
fn transform_emit_and_validate_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_extract(dir.path());

    let (tables, stats) = load_raw_dir(dir.path()).unwrap();
    assert_eq!(stats.filtered_subjects, 1);

    let (graph, report) =
        TransformationPipeline::new(&tables, TransformOptions::default()).run();
    assert!(report.skipped.is_empty());
    assert_eq!(graph.kind_len(ResourceKind::Patient), 2);
    assert_eq!(graph.kind_len(ResourceKind::ResearchSubject), 1);
    assert_eq!(graph.kind_len(ResourceKind::ResearchStudy), 1);
    assert_eq!(graph.kind_len(ResourceKind::Condition), 1);
    assert_eq!(graph.kind_len(ResourceKind::Specimen), 1);
    assert_eq!(graph.kind_len(ResourceKind::BodyStructure), 1);
    // cause-of-death, specimen material, and condition stage observations
    assert_eq!(graph.kind_len(ResourceKind::Observation), 3);
    assert_eq!(graph.kind_len(ResourceKind::MedicationAdministration), 1);

    let meta = dir.path().join("META");
    write_graph(&graph, &meta).unwrap();
    assert!(meta.join("Patient.ndjson").is_file());
    assert!(meta.join("Condition.ndjson").is_file());

    let reread = read_graph(&meta).unwrap();
    let summary = validate(&reread);
    assert_eq!(summary.counts[&ResourceKind::Patient], 2);
    assert!(!summary.has_dangling());
}

#[test]
fn missing_patient_file_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture_extract(dir.path());
    let (tables, _) = load_raw_dir(dir.path()).unwrap();
    let (graph, _) = TransformationPipeline::new(&tables, TransformOptions::default()).run();

    let meta = dir.path().join("META");
    write_graph(&graph, &meta).unwrap();
    fs::remove_file(meta.join("Patient.ndjson")).unwrap();

    let reread = read_graph(&meta).unwrap();
    let summary = validate(&reread);
    assert!(summary.has_dangling());
    assert!(
        summary
            .dangling
            .iter()
            .all(|finding| finding.target_kind == ResourceKind::Patient)
    );
}
