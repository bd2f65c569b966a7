use super::common::*;
use crate::diagnosis::{
    ComputationMode, DiagnosisError, ListingParams, QueryError, RankingConfig,
};
use crate::knowledge::{DataSourceKind, StoreError};

#[test]
fn seizure_query_returns_only_matching_disorders() {
    let service = build_service(RankingConfig::default());

    let ranking = service
        .diagnose(request(&["Seizure"], &[], 5, ComputationMode::Fast))
        .expect("diagnosis succeeds");

    assert!(!ranking.results.is_empty());
    assert!(ranking.results.len() <= 5);
    for candidate in &ranking.results {
        assert_eq!(candidate.matching_symptoms, strings(&["Seizure"]));
    }
    assert!(ranking.processing_time_ms >= 0.0);
}

#[test]
fn unrecognized_symptoms_only_raise_no_valid_symptoms() {
    let service = build_service(RankingConfig::default());

    match service.diagnose(request(&["Hiccups", "Sneezing"], &[], 5, ComputationMode::True)) {
        Err(DiagnosisError::NoValidSymptoms { unrecognized }) => {
            assert_eq!(unrecognized, strings(&["Hiccups", "Sneezing"]));
        }
        other => panic!("expected no valid symptoms, got {other:?}"),
    }
}

#[test]
fn empty_present_list_is_rejected_before_ranking() {
    let service = build_service(RankingConfig::default());

    match service.diagnose(request(&[], &["Fever"], 5, ComputationMode::Fast)) {
        Err(DiagnosisError::InvalidQuery(QueryError::NoPresentSymptoms)) => {}
        other => panic!("expected invalid query, got {other:?}"),
    }
}

#[test]
fn empty_store_surfaces_as_unavailable() {
    let service = empty_service();

    match service.diagnose(request(&["Seizure"], &[], 5, ComputationMode::Fast)) {
        Err(DiagnosisError::StoreUnavailable(StoreError::Empty {
            kind: DataSourceKind::Cached,
        })) => {}
        other => panic!("expected store unavailable, got {other:?}"),
    }
}

#[test]
fn present_wins_when_symptom_is_also_absent() {
    let service = build_service(RankingConfig::default());

    let ranking = service
        .diagnose(request(&["Fever"], &["Fever"], 5, ComputationMode::Fast))
        .expect("diagnosis succeeds");

    assert_eq!(ranking.results.len(), 1);
    assert_close(ranking.results[0].probability, 0.55);
}

#[test]
fn symptom_listing_filters_case_insensitively() {
    let service = build_service(RankingConfig::default());

    let listing = service
        .symptoms(&ListingParams {
            search: Some("IA".to_string()),
            limit: Some(1),
        })
        .expect("listing succeeds");

    assert_eq!(listing.symptoms, strings(&["Ataxia"]));
    assert_eq!(listing.filtered_count, 2);
    assert_eq!(listing.total_available, 7);
    assert_eq!(listing.search_term.as_deref(), Some("IA"));
}

#[test]
fn symptom_listing_rejects_oversized_limits() {
    let service = build_service(RankingConfig::default());

    match service.symptoms(&ListingParams {
        search: None,
        limit: Some(ListingParams::MAX_LIMIT + 1),
    }) {
        Err(DiagnosisError::InvalidQuery(QueryError::LimitOutOfRange { value, .. })) => {
            assert_eq!(value, 10_001);
        }
        other => panic!("expected limit error, got {other:?}"),
    }
}

#[test]
fn disease_listing_is_sorted_by_name() {
    let service = build_service(RankingConfig::default());

    let listing = service
        .diseases(&ListingParams {
            search: Some("syndrome".to_string()),
            limit: Some(2),
        })
        .expect("listing succeeds");

    let names: Vec<&str> = listing
        .diseases
        .iter()
        .map(|summary| summary.disorder_name.as_str())
        .collect();
    assert_eq!(names, vec!["Angelman syndrome", "Dravet syndrome"]);
    assert_eq!(listing.diseases[0].symptom_count, 3);
    assert_eq!(listing.filtered_count, 5);
    assert_eq!(listing.total_available, 5);
}

#[test]
fn info_reports_table_statistics() {
    let service = build_service(RankingConfig::default());

    let info = service.info().expect("info succeeds");

    assert_eq!(info.total_diseases, 5);
    assert_eq!(info.total_symptoms, 7);
    assert_eq!(info.total_associations, 12);
    assert_eq!(info.data_source, DataSourceKind::Primary);
    assert_eq!(info.source, "fixture");
    assert_eq!(info.status, "operational");
}
