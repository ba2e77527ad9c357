//! HTTP round trips through the full router.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use segment_insights::db::LocalRepository;
use segment_insights::http::{create_router, AppState};
use support::{reference_json, survey_json};

fn app() -> Router {
    create_router(AppState::new(Arc::new(LocalRepository::new())))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn upload(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/datasets",
        Some(json!({
            "name": "survey",
            "rows": survey_json(),
            "reference": reference_json(),
            "catalog": {"AGE": "Age band", "SEX": "Gender"},
            "groups": {"demographics": ["AGE", "SEX"]}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["dataset_id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["repository"], "connected");
}

#[tokio::test]
async fn test_dataset_lifecycle() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = send(&app, Method::GET, "/v1/datasets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["datasets"][0]["row_count"], 5);
    assert_eq!(body["datasets"][0]["dropped_rows"], 2);
    assert_eq!(body["datasets"][0]["models"], json!(["Accord", "Civic", "Pilot"]));

    // Same content again is deduplicated.
    assert_eq!(upload(&app).await, id);

    let (status, _) = send(&app, Method::DELETE, &format!("/v1/datasets/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, &format!("/v1/datasets/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body["details"].as_str().unwrap().contains("delete_dataset"));
}

#[tokio::test]
async fn test_upload_without_valid_rows_is_bad_request() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/v1/datasets",
        Some(json!({"name": "bad", "rows": [{"model": "A"}, 7]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/v1/market/solve",
        Some(json!({"metric": "velocity", "target": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_non_numeric_dataset_id_is_json_error() {
    let app = app();
    let (status, body) = send(&app, Method::DELETE, "/v1/datasets/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/datasets/1.5/summaries",
        Some(json!({"fields": ["AGE"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn test_summaries_by_field_group() {
    let app = app();
    let id = upload(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/summaries"),
        Some(json!({"field_group": "demographics"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fields: Vec<&str> = body["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["AGE", "SEX"]);
}

#[tokio::test]
async fn test_segment_view_scopes() {
    let app = app();
    let id = upload(&app).await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/segment-view"),
        Some(json!({
            "filters": {"models": ["Civic"], "state": "CA"},
            "field_group": "demographics",
            "attitude_fields": ["STATE_ENJOY"],
            "locks": {"histogram": true}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let sizes = &body["scope_sizes"];
    assert_eq!(sizes["population"], 5);
    assert_eq!(sizes["scatter"], 3);
    assert_eq!(sizes["map"], 3);
    assert_eq!(sizes["breakdowns"], 2);
    assert_eq!(sizes["histogram"], 5);

    assert_eq!(body["state_map"]["counts"]["California"], 2);
    assert_eq!(body["state_map"]["counts"]["Texas"], 1);

    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[1]["display_name"], "Gender");
    assert_eq!(sections[1]["section"]["mode"], "categorical");
    let labels: Vec<&str> = sections[1]["section"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["Female", "Male"]);

    assert_eq!(body["price_histogram"]["total_valid"], 4);
    assert_eq!(body["attitudes"][0]["pct_agree"], 50.0);
}

#[tokio::test]
async fn test_panel_endpoints() {
    let app = app();
    let id = upload(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/summaries"),
        Some(json!({"filters": {"cluster": 1}, "fields": ["FIN_MONTHLY_PAYMENT"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scope_size"], 2);
    assert_eq!(body["sections"][0]["section"]["mode"], "numeric");
    assert_eq!(body["sections"][0]["section"]["average"], 400.0);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/price-histogram"),
        Some(json!({"by_cluster": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["histogram"]["total_valid"], 4);
    assert_eq!(body["histogram"]["bins"][0]["label"], "Under $30k");
    assert_eq!(body["by_cluster"]["2"]["total_valid"], 2);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/v1/datasets/{id}/state-map"),
        Some(json!({"filters": {"state": "Texas"}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scope_size"], 5);
    assert_eq!(body["total"], 5);
    assert_eq!(body["max_pct"], 40.0);

    let (status, _) = send(&app, Method::POST, "/v1/datasets/99/state-map", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_market_endpoints() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/market/derive",
        Some(json!({"price": 50, "base_price": 50, "base_demand": 10000,
                    "elasticity": -1.2, "vcpu": 20, "fixed_cost": 120000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kpis"]["profit"], 180000.0);
    assert!((body["profit_maximizing_price"].as_f64().unwrap() - 120.0).abs() < 1e-9);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/market/solve",
        Some(json!({"metric": "demand", "target": 10000, "state": {"price": 80}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!((body["state"]["price"].as_f64().unwrap() - 50.0).abs() < 1e-9);
    assert_eq!(body["state"]["vcpu"], 20.0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/market/solve",
        Some(json!({"metric": "profit", "target": 150000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!((body["achieved"].as_f64().unwrap() - 150000.0).abs() < 1e-3);
}
