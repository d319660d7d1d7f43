//! HTTP request handlers for the trip fundraising API
//!
//! This module maps the JSON API onto the trip service:
//! - Creating and joining trips by their share code
//! - Submitting commitments toward the fundraising goal
//! - Recording and deleting shared expenses
//! - Editing or deleting a trip
//!
//! Handlers normalize the join code from the path, stamp the current time
//! and turn [`TripError`]s into JSON error responses. Request bodies are read
//! through [`ApiJson`], so malformed JSON gets the same error body as any
//! other validation failure.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::aggregate::total_expenses;
use crate::database::AppState;
use crate::error::TripError;
use crate::extract::ApiJson;
use crate::model::{
    CommitmentResponse, CommitmentSubmission, ExpenseDraft, ExpenseListResponse, JoinRequest,
    TripDraft, TripPatch, TripResponse,
};
use crate::service;
use crate::trip::normalize_code;

/// Reads the trip and its figures and attaches the share link
fn trip_response(state: &AppState, code: &str) -> Result<TripResponse, TripError> {
    let (trip, summary) = service::trip_summary(&state.db, code, Utc::now())?;
    Ok(TripResponse {
        share_url: state.config.share_url(&trip.code),
        trip,
        summary,
    })
}

/// Creates a new trip
///
/// This handler:
/// 1. Validates the draft (name, goal, participant cap, deadline)
/// 2. Allocates an unused random join code
/// 3. Stores the trip with no commitments yet
/// 4. Returns the trip with its share link and zeroed figures
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Summer Beach Trip",
///   "goal_amount": 5000,
///   "max_participants": 4,
///   "details": "A weekend in Ibiza",
///   "deadline": "2026-12-01"
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - Trip created, with its generated join code
/// - **422 Unprocessable Entity** - Missing name, goal out of range, bad cap or bad date
pub async fn create_trip(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<TripDraft>,
) -> Result<impl IntoResponse, TripError> {
    let trip = service::create_trip(&state.db, &draft, state.config.code_length, Utc::now())?;
    let response = trip_response(&state, &trip.code)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Looks a trip up by the code a participant typed in
///
/// Codes are matched case-insensitively, ignoring surrounding whitespace.
///
/// # Request Body
///
/// ```json
/// { "code": "K3X9QA" }
/// ```
///
/// # Response
///
/// - **200 OK** - Trip details and funding figures
/// - **404 Not Found** - No trip uses this code
/// - **422 Unprocessable Entity** - Empty code
pub async fn join_trip(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<JoinRequest>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&request.code);
    if code.is_empty() {
        return Err(TripError::validation("code is required"));
    }

    Ok(Json(trip_response(&state, &code)?))
}

/// Returns a trip with its totals, progress and days remaining
///
/// # Path Parameters
///
/// - `code` - The trip's join code
///
/// # Response
///
/// - **200 OK** - Trip details and funding figures
/// - **404 Not Found** - Unknown trip code
pub async fn get_trip(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    Ok(Json(trip_response(&state, &code)?))
}

/// Edits trip details; only the fields present in the body change
///
/// # Request Body
///
/// ```json
/// { "goal_amount": 6000, "deadline": "2026-12-15" }
/// ```
///
/// # Response
///
/// - **200 OK** - Updated trip
/// - **404 Not Found** - Unknown trip code
/// - **422 Unprocessable Entity** - Invalid value, or a cap below the current participant count
pub async fn update_trip(
    Path(code): Path<String>,
    State(state): State<AppState>,
    ApiJson(patch): ApiJson<TripPatch>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    service::update_trip_details(&state.db, &code, &patch)?;

    Ok(Json(trip_response(&state, &code)?))
}

/// Deletes a trip and every expense recorded for it
///
/// # Response
///
/// - **200 OK** - Trip deleted, with the number of expenses removed alongside it
/// - **404 Not Found** - Unknown trip code
pub async fn delete_trip(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    let removed_expenses = service::delete_trip(&state.db, &code)?;

    Ok(Json(json!({
        "message": "Trip deleted successfully",
        "deleted_code": code,
        "removed_expenses": removed_expenses
    })))
}

pub async fn list_commitments(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    let commitments = service::list_commitments(&state.db, &code)?;

    Ok(Json(json!({
        "count": commitments.len(),
        "data": commitments
    })))
}

/// Commits an amount toward the trip goal
///
/// Submitting again under the same name replaces that person's amount.
///
/// # Request Body
///
/// ```json
/// { "name": "Alice", "amount": 150 }
/// ```
///
/// # Response
///
/// - **201 Created** - New participant added
/// - **200 OK** - Existing commitment updated
/// - **409 Conflict** - Trip is full and the name is not already committed
/// - **422 Unprocessable Entity** - Empty name, or amount not positive, above the limit or finer than cents
pub async fn submit_commitment(
    Path(code): Path<String>,
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<CommitmentSubmission>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    let (commitment, created) =
        service::submit_commitment(&state.db, &code, &submission, Utc::now())?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CommitmentResponse { commitment, created })))
}

/// Lists a trip's expenses in the order they were added, with their total
pub async fn list_expenses(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    let expenses = service::list_expenses(&state.db, &code)?;

    Ok(Json(ExpenseListResponse {
        total: total_expenses(&expenses)?,
        count: expenses.len(),
        data: expenses,
    }))
}

/// Records a shared expense
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Hotel Booking",
///   "amount": 1200,
///   "paid_by": "Sophia",
///   "paid_on": "2026-10-13",
///   "category": "Accommodation",
///   "notes": "2 nights at Ocean View Resort"
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - Expense stored
/// - **404 Not Found** - Unknown trip code
/// - **422 Unprocessable Entity** - Missing field, bad amount, bad date or unknown category
pub async fn add_expense(
    Path(code): Path<String>,
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<ExpenseDraft>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    let expense = service::add_expense(&state.db, &code, &draft, Utc::now())?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// Deletes an expense
///
/// Deleting an id that does not exist succeeds with `"deleted": false`,
/// so retries are harmless. An unknown trip code is still a 404.
///
/// # Path Parameters
///
/// - `code` - The trip's join code
/// - `id` - The expense id returned when it was added
pub async fn delete_expense(
    Path((code, id)): Path<(String, u64)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, TripError> {
    let code = normalize_code(&code);
    let deleted = service::delete_expense(&state.db, &code, id)?;

    Ok(Json(json!({
        "deleted": deleted,
        "expense_id": id
    })))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
