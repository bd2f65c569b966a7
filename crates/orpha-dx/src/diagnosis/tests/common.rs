use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::diagnosis::{
    diagnosis_router, ComputationMode, DiagnosisQuery, DiagnosisRequest, DiagnosisService,
    RankingConfig, ResolvedQuery,
};
use crate::knowledge::{AssociationTable, DataSourceKind, FrequencyCategory, InMemoryStore};

/// Five disorders with overlapping neurological and ocular signs.
///
/// Canonical ids follow insertion order: Marfan 0, Nance-Horan 1, Dravet 2,
/// Angelman 3, Rett 4. Twelve associations in total.
pub(super) fn clinical_table() -> AssociationTable {
    use crate::knowledge::FrequencyCategory::*;

    let rows: [(&str, &str, &str, FrequencyCategory); 12] = [
        ("558", "Marfan syndrome", "Arachnodactyly", VeryFrequent),
        ("558", "Marfan syndrome", "Myopia", Frequent),
        ("558", "Marfan syndrome", "Seizure", Occasional),
        ("166024", "Nance-Horan syndrome", "Cataract", VeryFrequent),
        ("166024", "Nance-Horan syndrome", "Myopia", Occasional),
        ("33069", "Dravet syndrome", "Seizure", VeryFrequent),
        ("33069", "Dravet syndrome", "Ataxia", Frequent),
        ("33069", "Dravet syndrome", "Fever", Frequent),
        ("72", "Angelman syndrome", "Seizure", Frequent),
        ("72", "Angelman syndrome", "Ataxia", VeryFrequent),
        ("72", "Angelman syndrome", "Microcephaly", Excluded),
        ("778", "Rett syndrome", "Microcephaly", Unknown),
    ];

    let mut builder = AssociationTable::builder("fixture");
    for (code, name, symptom, frequency) in rows {
        builder.insert(code, name, symptom, frequency);
    }
    builder.build()
}

pub(super) fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub(super) fn request(
    present: &[&str],
    absent: &[&str],
    top_n: usize,
    mode: ComputationMode,
) -> DiagnosisRequest {
    DiagnosisRequest {
        present_symptoms: strings(present),
        absent_symptoms: strings(absent),
        top_n,
        computation_mode: mode,
    }
}

pub(super) fn resolved(
    table: &AssociationTable,
    present: &[&str],
    absent: &[&str],
    top_n: usize,
    mode: ComputationMode,
) -> ResolvedQuery {
    DiagnosisQuery::from_request(request(present, absent, top_n, mode))
        .expect("valid query")
        .resolve(table)
}

pub(super) fn build_service(config: RankingConfig) -> DiagnosisService<InMemoryStore> {
    let store = Arc::new(InMemoryStore::with_table(
        DataSourceKind::Primary,
        clinical_table(),
    ));
    DiagnosisService::new(store, config)
}

pub(super) fn empty_service() -> DiagnosisService<InMemoryStore> {
    DiagnosisService::new(
        Arc::new(InMemoryStore::new(DataSourceKind::Cached)),
        RankingConfig::default(),
    )
}

pub(super) fn router_with_service(service: DiagnosisService<InMemoryStore>) -> axum::Router {
    diagnosis_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
