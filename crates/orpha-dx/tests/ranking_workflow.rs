use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use orpha_dx::diagnosis::{
    ComputationMode, DiagnosisError, DiagnosisRequest, DiagnosisService, RankingConfig,
};
use orpha_dx::knowledge::{CsvFileStore, DataSourceKind};

fn service() -> DiagnosisService<CsvFileStore> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/clinical_signs_sample.csv");
    DiagnosisService::new(
        Arc::new(CsvFileStore::new(DataSourceKind::Primary, path)),
        RankingConfig::default(),
    )
}

fn request(present: &[&str], absent: &[&str], mode: ComputationMode) -> DiagnosisRequest {
    DiagnosisRequest {
        present_symptoms: present.iter().map(|s| s.to_string()).collect(),
        absent_symptoms: absent.iter().map(|s| s.to_string()).collect(),
        top_n: 5,
        computation_mode: mode,
    }
}

#[test]
fn seizure_results_only_cite_seizure() {
    let service = service();

    for mode in [ComputationMode::Fast, ComputationMode::True] {
        let ranking = service
            .diagnose(request(&["Seizure"], &[], mode))
            .expect("diagnosis succeeds");

        assert!(!ranking.results.is_empty());
        assert!(ranking.results.len() <= 5);
        for candidate in &ranking.results {
            assert_eq!(candidate.matching_symptoms, vec!["Seizure".to_string()]);
            assert!((0.0..=1.0).contains(&candidate.probability));
        }
    }
}

#[test]
fn both_modes_agree_on_the_strongest_match() {
    let service = service();

    let fast = service
        .diagnose(request(&["Cataract", "Myopia"], &[], ComputationMode::Fast))
        .expect("fast diagnosis");
    let bayes = service
        .diagnose(request(&["Cataract", "Myopia"], &[], ComputationMode::True))
        .expect("true diagnosis");

    assert_eq!(fast.results[0].orpha_code, "166024");
    assert_eq!(bayes.results[0].orpha_code, "166024");
    let posterior_total: f64 = bayes.results.iter().map(|c| c.probability).sum();
    assert!(posterior_total <= 1.0 + 1e-9);
}

#[test]
fn mixed_known_and_unknown_symptoms_are_reported() {
    let service = service();

    let ranking = service
        .diagnose(request(
            &["Ataxia", "Hypotonia"],
            &["Sneezing"],
            ComputationMode::Fast,
        ))
        .expect("diagnosis succeeds");

    assert_eq!(ranking.input_symptoms, vec!["Ataxia".to_string()]);
    assert_eq!(ranking.unrecognized_symptoms, vec!["Hypotonia".to_string()]);
    let codes: BTreeSet<&str> = ranking
        .results
        .iter()
        .map(|candidate| candidate.orpha_code.as_str())
        .collect();
    assert_eq!(codes, BTreeSet::from(["33069", "72"]));
}

#[test]
fn unknown_symptoms_alone_are_rejected() {
    let service = service();

    match service.diagnose(request(&["Hypotonia"], &[], ComputationMode::True)) {
        Err(DiagnosisError::NoValidSymptoms { unrecognized }) => {
            assert_eq!(unrecognized, vec!["Hypotonia".to_string()]);
        }
        other => panic!("expected no valid symptoms, got {other:?}"),
    }
}
