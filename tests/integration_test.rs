//! Integration tests for the trip fundraising API
//!
//! These tests verify the entire application stack including:
//! - HTTP routing
//! - Request/response handling
//! - Database operations
//! - Error handling

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

use tripfund::config::Config;
use tripfund::database::{init_db, AppState};
use tripfund::route::create_app;

/// Helper function to create a test application with a temporary database
fn setup_test_app() -> (Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_db.path().to_str().unwrap();

    let db = init_db(db_path).expect("Failed to initialize test database");
    let state = AppState::new(db, Config::default());

    (create_app(state), temp_db)
}

/// Helper function to parse response body as JSON
async fn response_json(body: Body) -> Value {
    let bytes = body
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

async fn send(app: &Router, method: &str, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let body = match payload {
        Some(payload) => Body::from(payload.to_string()),
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, response_json(response.into_body()).await)
}

fn trip_payload(max_participants: u32) -> Value {
    json!({
        "name": "Summer Beach Trip",
        "goal_amount": 5000,
        "max_participants": max_participants,
        "details": "Join us for a weekend in Ibiza!",
        "deadline": "2099-06-01",
        "creator_id": "user123"
    })
}

/// Creates a trip and returns its join code
async fn create_trip(app: &Router, max_participants: u32) -> String {
    let (status, body) = send(app, "POST", "/api/trips", Some(trip_payload(max_participants))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["trip"]["code"].as_str().unwrap().to_string()
}

fn expense_payload(title: &str, amount: f64, category: &str) -> Value {
    json!({
        "title": title,
        "amount": amount,
        "paid_by": "Sophia",
        "paid_on": "2026-10-13",
        "category": category,
        "notes": "Ocean View Resort"
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _temp_db) = setup_test_app();

    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_trip_success() {
    let (app, _temp_db) = setup_test_app();

    let (status, body) = send(&app, "POST", "/api/trips", Some(trip_payload(4))).await;

    assert_eq!(status, StatusCode::CREATED);
    let code = body["trip"]["code"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert_eq!(body["trip"]["name"], "Summer Beach Trip");
    assert_eq!(body["trip"]["goal_amount"].as_f64(), Some(5000.0));
    assert_eq!(body["trip"]["max_participants"], 4);
    assert_eq!(body["trip"]["deadline"], "2099-06-01");
    assert_eq!(body["trip"]["creator_id"], "user123");
    assert_eq!(
        body["share_url"],
        format!("http://localhost:8080/trip/{}", code)
    );
    assert_eq!(body["total_committed"].as_f64(), Some(0.0));
    assert_eq!(body["num_participants"], 0);
    assert_eq!(body["progress_percentage"], 0);
    assert_eq!(body["is_full"], false);
    assert_eq!(body["deadline_passed"], false);
}

#[tokio::test]
async fn test_create_trip_generates_distinct_codes() {
    let (app, _temp_db) = setup_test_app();

    let first = create_trip(&app, 4).await;
    let second = create_trip(&app, 4).await;

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_create_trip_invalid_goal() {
    let (app, _temp_db) = setup_test_app();
    let mut payload = trip_payload(4);
    payload["goal_amount"] = json!(0);

    let (status, body) = send(&app, "POST", "/api/trips", Some(payload)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_create_trip_invalid_deadline() {
    let (app, _temp_db) = setup_test_app();
    let mut payload = trip_payload(4);
    payload["deadline"] = json!("next summer");

    let (status, body) = send(&app, "POST", "/api/trips", Some(payload)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_join_trip_by_code() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/join",
        Some(json!({ "code": format!("  {}  ", code.to_uppercase()) })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trip"]["code"], code);
}

#[tokio::test]
async fn test_join_trip_unknown_code() {
    let (app, _temp_db) = setup_test_app();

    let (status, body) = send(&app, "POST", "/api/join", Some(json!({ "code": "zzzzzz" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_join_trip_empty_code() {
    let (app, _temp_db) = setup_test_app();

    let (status, _) = send(&app, "POST", "/api/join", Some(json!({ "code": "   " }))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_trip_not_found() {
    let (app, _temp_db) = setup_test_app();

    let (status, body) = send(&app, "GET", "/api/trips/nonexistent", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Trip 'nonexistent' not found");
}

#[tokio::test]
async fn test_commitments_update_progress() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}/commitments", code);

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "name": "Sophia", "amount": 1250 }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);
    assert_eq!(body["commitment"]["name"], "Sophia");

    let (status, _) = send(&app, "POST", &uri, Some(json!({ "name": "Grace", "amount": 1250 }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", &format!("/api/trips/{}", code), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_committed"].as_f64(), Some(2500.0));
    assert_eq!(body["num_participants"], 2);
    assert_eq!(body["progress_percentage"], 50);
    assert_eq!(body["participants_percentage"], 50);
    assert_eq!(body["remaining_amount"].as_f64(), Some(2500.0));
    assert_eq!(body["trip"]["commitments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_commitment_resubmission_updates_amount() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 2).await;
    let uri = format!("/api/trips/{}/commitments", code);

    let (_, first) = send(&app, "POST", &uri, Some(json!({ "name": "Alice", "amount": 100 }))).await;
    let (status, second) = send(&app, "POST", &uri, Some(json!({ "name": "Alice", "amount": 150 }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(second["commitment"]["id"], first["commitment"]["id"]);
    assert_eq!(second["commitment"]["created_at"], first["commitment"]["created_at"]);

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["name"], "Alice");
    assert_eq!(body["data"][0]["amount"].as_f64(), Some(150.0));
}

#[tokio::test]
async fn test_commitment_rejected_when_trip_full() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 2).await;
    let uri = format!("/api/trips/{}/commitments", code);

    send(&app, "POST", &uri, Some(json!({ "name": "Alice", "amount": 100 }))).await;
    send(&app, "POST", &uri, Some(json!({ "name": "Bob", "amount": 200 }))).await;

    let (status, body) = send(&app, "POST", &uri, Some(json!({ "name": "Carol", "amount": 300 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "capacity_error");

    let (_, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(body["count"], 2);

    let (_, trip) = send(&app, "GET", &format!("/api/trips/{}", code), None).await;
    assert_eq!(trip["is_full"], true);
    assert_eq!(trip["total_committed"].as_f64(), Some(300.0));
}

#[tokio::test]
async fn test_commitment_invalid_amount() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 2).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/trips/{}/commitments", code),
        Some(json!({ "name": "Alice", "amount": -5 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_commitment_unknown_trip() {
    let (app, _temp_db) = setup_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/trips/nonexistent/commitments",
        Some(json!({ "name": "Alice", "amount": 100 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_and_list_expenses() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}/expenses", code);

    let (status, hotel) = send(&app, "POST", &uri, Some(expense_payload("Hotel Booking", 1200.0, "Accommodation"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(hotel["title"], "Hotel Booking");
    assert_eq!(hotel["category"], "Accommodation");
    assert_eq!(hotel["paid_on"], "2026-10-13");
    assert_eq!(hotel["notes"], "Ocean View Resort");

    send(&app, "POST", &uri, Some(expense_payload("Restaurant Dinner", 180.5, "Food"))).await;

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["total"].as_f64(), Some(1380.5));
    assert_eq!(body["data"][0]["title"], "Hotel Booking");
    assert_eq!(body["data"][1]["title"], "Restaurant Dinner");

    let (_, trip) = send(&app, "GET", &format!("/api/trips/{}", code), None).await;
    assert_eq!(trip["total_expenses"].as_f64(), Some(1380.5));
}

#[tokio::test]
async fn test_add_expense_unknown_category() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}/expenses", code);

    let (status, body) = send(&app, "POST", &uri, Some(expense_payload("Beach day", 50.0, "Vacation"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");

    let (_, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_add_expense_missing_payer() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let mut payload = expense_payload("Taxi", 45.0, "Transportation");
    payload["paid_by"] = json!("");

    let (status, _) = send(&app, "POST", &format!("/api/trips/{}/expenses", code), Some(payload)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_expense() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}/expenses", code);

    let (_, hotel) = send(&app, "POST", &uri, Some(expense_payload("Hotel Booking", 1200.0, "Accommodation"))).await;
    send(&app, "POST", &uri, Some(expense_payload("Taxi", 45.0, "Transportation"))).await;
    let id = hotel["id"].as_u64().unwrap();

    let (status, body) = send(&app, "DELETE", &format!("{}/{}", uri, id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);
    assert_eq!(body["expense_id"], id);

    let (_, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "Taxi");
}

#[tokio::test]
async fn test_delete_missing_expense_is_noop() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}/expenses", code);
    send(&app, "POST", &uri, Some(expense_payload("Taxi", 45.0, "Transportation"))).await;

    let (status, body) = send(&app, "DELETE", &format!("{}/9999", uri), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], false);

    let (_, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_delete_expense_unknown_trip() {
    let (app, _temp_db) = setup_test_app();

    let (status, _) = send(&app, "DELETE", "/api/trips/nonexistent/expenses/1", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_trip_details() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}", code);

    let (status, body) = send(
        &app,
        "PATCH",
        &uri,
        Some(json!({ "name": "Winter Trip", "goal_amount": 8000, "deadline": "2099-12-24" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trip"]["name"], "Winter Trip");
    assert_eq!(body["trip"]["goal_amount"].as_f64(), Some(8000.0));
    assert_eq!(body["trip"]["deadline"], "2099-12-24");
    assert_eq!(body["trip"]["details"], "Join us for a weekend in Ibiza!");
    assert_eq!(body["trip"]["code"], code);
}

#[tokio::test]
async fn test_update_trip_cap_below_participants() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let commitments = format!("/api/trips/{}/commitments", code);
    send(&app, "POST", &commitments, Some(json!({ "name": "Alice", "amount": 100 }))).await;
    send(&app, "POST", &commitments, Some(json!({ "name": "Bob", "amount": 100 }))).await;

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/trips/{}", code),
        Some(json!({ "max_participants": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = send(&app, "GET", &format!("/api/trips/{}", code), None).await;
    assert_eq!(body["trip"]["max_participants"], 4);
}

#[tokio::test]
async fn test_update_trip_not_found() {
    let (app, _temp_db) = setup_test_app();

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/trips/nonexistent",
        Some(json!({ "name": "Renamed" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_trip_cascades_to_expenses() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let other = create_trip(&app, 4).await;
    let expenses = format!("/api/trips/{}/expenses", code);
    send(&app, "POST", &expenses, Some(expense_payload("Hotel Booking", 1200.0, "Accommodation"))).await;
    send(&app, "POST", &expenses, Some(expense_payload("Taxi", 45.0, "Transportation"))).await;
    send(
        &app,
        "POST",
        &format!("/api/trips/{}/expenses", other),
        Some(expense_payload("Groceries", 60.0, "Food")),
    )
    .await;

    let (status, body) = send(&app, "DELETE", &format!("/api/trips/{}", code), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_code"], code);
    assert_eq!(body["removed_expenses"], 2);

    let (status, _) = send(&app, "GET", &format!("/api/trips/{}", code), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &expenses, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", &format!("/api/trips/{}/expenses", other), None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_delete_trip_not_found() {
    let (app, _temp_db) = setup_test_app();

    let (status, _) = send(&app, "DELETE", "/api/trips/nonexistent", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Creates a trip whose goal is a single cent and returns its join code
async fn create_one_cent_trip(app: &Router) -> String {
    let mut payload = trip_payload(4);
    payload["goal_amount"] = json!(0.01);

    let (status, body) = send(app, "POST", "/api/trips", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    body["trip"]["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_commitment_above_limit_is_rejected() {
    let (app, _temp_db) = setup_test_app();
    let code = create_one_cent_trip(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/trips/{}/commitments", code),
        Some(json!({ "name": "Whale", "amount": 1e18 })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");

    // Nothing was stored, so the trip still reads fine
    let (status, trip) = send(&app, "GET", &format!("/api/trips/{}", code), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["num_participants"], 0);
}

#[tokio::test]
async fn test_largest_commitment_keeps_trip_readable() {
    let (app, _temp_db) = setup_test_app();
    let code = create_one_cent_trip(&app).await;
    let trip_uri = format!("/api/trips/{}", code);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/commitments", trip_uri),
        Some(json!({ "name": "Whale", "amount": 1_000_000_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, trip) = send(&app, "GET", &trip_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["progress_percentage"].as_i64(), Some(10_000_000_000_000));
    assert_eq!(trip["remaining_amount"].as_f64(), Some(0.0));

    let (status, _) = send(&app, "POST", "/api/join", Some(json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, trip) = send(&app, "PATCH", &trip_uri, Some(json!({ "goal_amount": 0.02 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trip["progress_percentage"].as_i64(), Some(5_000_000_000_000));
}

#[tokio::test]
async fn test_add_expense_above_limit_is_rejected() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}/expenses", code);

    let (status, body) = send(&app, "POST", &uri, Some(expense_payload("Yacht", 5e28, "Activities"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");

    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_add_expense_without_paid_by_field() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;
    let uri = format!("/api/trips/{}/expenses", code);
    let mut payload = expense_payload("Taxi", 45.0, "Transportation");
    payload.as_object_mut().unwrap().remove("paid_by");

    let (status, body) = send(&app, "POST", &uri, Some(payload)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
    assert!(body["error"].as_str().unwrap().contains("paid_by"));
}

#[tokio::test]
async fn test_commitment_non_numeric_amount() {
    let (app, _temp_db) = setup_test_app();
    let code = create_trip(&app, 4).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/trips/{}/commitments", code),
        Some(json!({ "name": "Alice", "amount": "abc" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (app, _temp_db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/trips")
                .header("content-type", "application/json")
                .body(Body::from("{\"name\": \"Summer"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response.into_body()).await;
    assert_eq!(body["code"], "validation_error");
}
