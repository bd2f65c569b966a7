use super::common::*;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::diagnosis::{ComputationMode, RankingConfig};
use crate::knowledge::InMemoryStore;

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&payload).expect("serialize payload"),
        ))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn diagnose_route_returns_ranked_results() {
    let router = router_with_service(build_service(RankingConfig::default()));

    let response = router
        .oneshot(post_json(
            "/diagnose",
            json!({ "present_symptoms": ["Seizure", "Ataxia"], "top_n": 2 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["computation_mode"], json!("fast"));
    assert_eq!(payload["input_symptoms"], json!(["Seizure", "Ataxia"]));
    assert_eq!(payload["total_diseases_evaluated"], json!(3));
    assert!(payload.get("unrecognized_symptoms").is_none());

    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["orpha_code"], json!("33069"));
    assert!(results[0].get("disorder_id").is_none());
    assert!(results[0].get("confidence_score").is_some());
}

#[tokio::test]
async fn diagnose_handler_reports_unrecognized_symptoms() {
    let service = Arc::new(build_service(RankingConfig::default()));

    let response = crate::diagnosis::router::diagnose_handler::<InMemoryStore>(
        State(service),
        axum::Json(request(&["Hiccups"], &[], 5, ComputationMode::Fast)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["unrecognized_symptoms"], json!(["Hiccups"]));
    assert_eq!(payload["results"], json!([]));
    assert_eq!(payload["total_diseases_evaluated"], json!(0));
}

#[tokio::test]
async fn diagnose_handler_rejects_out_of_range_top_n() {
    let service = Arc::new(build_service(RankingConfig::default()));

    let response = crate::diagnosis::router::diagnose_handler::<InMemoryStore>(
        State(service),
        axum::Json(request(&["Seizure"], &[], 0, ComputationMode::Fast)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        json!("top_n must be between 1 and 50, got 0")
    );
}

#[tokio::test]
async fn diagnose_handler_returns_service_unavailable_without_data() {
    let service = Arc::new(empty_service());

    let response = crate::diagnosis::router::diagnose_handler::<InMemoryStore>(
        State(service),
        axum::Json(request(&["Seizure"], &[], 5, ComputationMode::Fast)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn diagnose_route_returns_gateway_timeout_past_deadline() {
    let router = router_with_service(build_service(RankingConfig {
        true_mode_deadline_ms: Some(0),
        ..RankingConfig::default()
    }));

    let response = router
        .oneshot(post_json(
            "/diagnose",
            json!({ "present_symptoms": ["Seizure"], "computation_mode": "true" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn symptoms_route_applies_search_and_limit() {
    let router = router_with_service(build_service(RankingConfig::default()));

    let response = router
        .oneshot(get("/symptoms?search=ia&limit=1"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["symptoms"], json!(["Ataxia"]));
    assert_eq!(payload["filtered_count"], json!(2));
    assert_eq!(payload["total_available"], json!(7));
    assert_eq!(payload["search_term"], json!("ia"));
}

#[tokio::test]
async fn symptoms_route_rejects_oversized_limit() {
    let router = router_with_service(build_service(RankingConfig::default()));

    let response = router
        .oneshot(get("/symptoms?limit=20000"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn diseases_route_lists_summaries() {
    let router = router_with_service(build_service(RankingConfig::default()));

    let response = router
        .oneshot(get("/diseases?search=rett"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["diseases"],
        json!([{ "disorder_name": "Rett syndrome", "orpha_code": "778", "symptom_count": 1 }])
    );
}

#[tokio::test]
async fn info_route_names_the_serving_source() {
    let router = router_with_service(build_service(RankingConfig::default()));

    let response = router.oneshot(get("/info")).await.expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data_source"], json!("primary"));
    assert_eq!(payload["total_associations"], json!(12));
    assert_eq!(payload["api_version"], json!(env!("CARGO_PKG_VERSION")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn lazy_csv_loads_do_not_stall_the_worker() {
    use crate::diagnosis::DiagnosisService;
    use crate::knowledge::{CsvFileStore, DataSourceKind};

    let store = Arc::new(CsvFileStore::new(
        DataSourceKind::Primary,
        concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/clinical_signs_sample.csv"
        ),
    ));
    let router = crate::diagnosis::diagnosis_router(Arc::new(DiagnosisService::new(
        store,
        RankingConfig::default(),
    )));

    let (diagnose, symptoms) = tokio::join!(
        router.clone().oneshot(post_json(
            "/diagnose",
            json!({ "present_symptoms": ["Seizure"], "computation_mode": "true" }),
        )),
        router.oneshot(get("/symptoms?search=my")),
    );

    let diagnose = diagnose.expect("route executes");
    assert_eq!(diagnose.status(), StatusCode::OK);
    let payload = read_json_body(diagnose).await;
    assert_eq!(payload["results"][0]["orpha_code"], json!("33069"));

    let symptoms = symptoms.expect("route executes");
    assert_eq!(symptoms.status(), StatusCode::OK);
    let payload = read_json_body(symptoms).await;
    assert_eq!(payload["symptoms"], json!(["Microcephaly", "Myopia"]));
}
