//! HTTP API tests against the in-memory store

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hops_server::{create_app, AppState, Config, MemoryStore};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    create_app(AppState::new(Arc::new(MemoryStore::new()), Config::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_intake(app: &Router, total: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/intakes",
        Some(json!({
            "source": "Wanjiru Farm",
            "produce": "French beans",
            "total_gross_weight_kg": total,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

// ============================================================================
// Health & stateless reconciliation
// ============================================================================

#[tokio::test]
async fn health_reports_memory_storage() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["storage_status"], "connected");
}

#[tokio::test]
async fn reconcile_endpoint_reports_shortfall() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/reconcile",
        Some(json!({
            "total_kg": "1200",
            "grade_weights": [
                { "grade": "A", "weight_kg": "850" },
                { "grade": "B", "weight_kg": "300" },
                { "grade": "Rejected", "weight_kg": "30" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sum"], "1180");
    assert_eq!(body["remainder"], "20");
    assert_eq!(body["balanced"], false);
    assert_eq!(body["status"], "short");
}

#[tokio::test]
async fn reconcile_endpoint_accepts_tolerance_override() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/reconcile",
        Some(json!({
            "total_kg": "1200",
            "grade_weights": [{ "grade": "A", "weight_kg": "1199" }],
            "tolerance_kg": "2"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balanced"], true);
}

#[tokio::test]
async fn reconcile_endpoint_rejects_zero_tolerance() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/reconcile",
        Some(json!({ "total_kg": "10", "grade_weights": [], "tolerance_kg": "0" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "tolerance_kg");
}

// ============================================================================
// Intakes
// ============================================================================

#[tokio::test]
async fn create_and_fetch_intake() {
    let app = app();
    let id = create_intake(&app, "1200").await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/intakes/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["source"], "Wanjiru Farm");
}

#[tokio::test]
async fn negative_gross_weight_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/intakes",
        Some(json!({ "source": "Wanjiru Farm", "total_gross_weight_kg": "-5" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "total_gross_weight_kg");
}

#[tokio::test]
async fn gross_weight_outside_stored_precision_is_rejected() {
    let app = app();
    for total in ["0.0004", "100000000000"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/intakes",
            Some(json!({ "source": "Wanjiru Farm", "total_gross_weight_kg": total })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "total {}", total);
        assert_eq!(body["error"]["field"], "total_gross_weight_kg");
    }

    create_intake(&app, "99999999999.999").await;
}

#[tokio::test]
async fn list_intakes_is_paginated() {
    let app = app();
    for _ in 0..3 {
        create_intake(&app, "100").await;
    }

    let (status, body) = send(&app, "GET", "/api/v1/intakes?page=1&per_page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
}

#[tokio::test]
async fn unknown_intake_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/intakes/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// ============================================================================
// Sorting
// ============================================================================

#[tokio::test]
async fn preview_flags_invalid_entries() {
    let app = app();
    let id = create_intake(&app, "1200").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/intakes/{}/sorting/preview", id),
        Some(json!({
            "entries": [
                { "grade": "A", "weight": "850" },
                { "grade": "B", "weight": "three hundred" },
                { "grade": "Rejected" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sum"], "850");
    assert_eq!(body["invalid_grades"], json!(["B"]));
    assert_eq!(body["can_submit"], false);
}

#[tokio::test]
async fn empty_preview_uses_standard_grades() {
    let app = app();
    let id = create_intake(&app, "1200").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/intakes/{}/sorting/preview", id),
        Some(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grades"], json!(["A", "B", "Rejected"]));
    assert_eq!(body["sum"], "0");
    assert_eq!(body["status"], "short");
    assert_eq!(body["can_submit"], false);
}

#[tokio::test]
async fn balanced_allocation_is_recorded_once() {
    let app = app();
    let id = create_intake(&app, "1200").await;
    let allocation = json!({
        "grade_weights": [
            { "grade": "A", "weight_kg": "850" },
            { "grade": "B", "weight_kg": "300" },
            { "grade": "Rejected", "weight_kg": "49.5" }
        ],
        "sorted_by": "QC Station 2"
    });

    let uri = format!("/api/v1/intakes/{}/sorting", id);
    let (status, body) = send(&app, "POST", &uri, Some(allocation.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["remainder_kg"], "0.5");

    let (status, body) = send(&app, "GET", &format!("/api/v1/intakes/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sorted");

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["grade_weights"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, "POST", &uri, Some(allocation)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");
}

#[tokio::test]
async fn unbalanced_allocation_is_rejected_with_details() {
    let app = app();
    let id = create_intake(&app, "1200").await;
    let uri = format!("/api/v1/intakes/{}/sorting", id);

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({
            "grade_weights": [
                { "grade": "A", "weight_kg": "850" },
                { "grade": "B", "weight_kg": "300" },
                { "grade": "Rejected", "weight_kg": "49" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "UNBALANCED_ALLOCATION");
    assert_eq!(body["error"]["details"]["remainder"], "1");
    assert_eq!(body["error"]["details"]["balanced"], false);

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_grade_labels_are_rejected() {
    let app = app();
    let id = create_intake(&app, "100").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/intakes/{}/sorting", id),
        Some(json!({
            "grade_weights": [
                { "grade": "A", "weight_kg": "50" },
                { "grade": "a", "weight_kg": "50" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "grade_weights");
}

#[tokio::test]
async fn sub_gram_grade_weight_is_rejected() {
    let app = app();
    let id = create_intake(&app, "10").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/v1/intakes/{}/sorting", id),
        Some(json!({
            "grade_weights": [
                { "grade": "A", "weight_kg": "9.9996" },
                { "grade": "B", "weight_kg": "0.0004" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "grade_weights");
}
