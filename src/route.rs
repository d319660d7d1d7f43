//! Route definitions for the trip fundraising API
//!
//! This module maps every HTTP route to its handler and attaches the
//! shared application state.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::database::AppState;
use crate::handler::{
    add_expense, create_trip, delete_expense, delete_trip, get_trip, health, join_trip,
    list_commitments, list_expenses, submit_commitment, update_trip,
};

/// Creates the application router
///
/// # Route Definitions
///
/// - `GET /health` - Liveness check
/// - `POST /api/trips` - Creates a trip
/// - `POST /api/join` - Finds a trip by its join code
/// - `GET|PATCH|DELETE /api/trips/{code}` - Reads, edits or deletes a trip
/// - `GET|POST /api/trips/{code}/commitments` - Lists or submits commitments
/// - `GET|POST /api/trips/{code}/expenses` - Lists or adds expenses
/// - `DELETE /api/trips/{code}/expenses/{id}` - Deletes an expense
///
/// # Example Usage
///
/// ```no_run
/// # use tripfund::config::Config;
/// # use tripfund::database::{init_db, AppState};
/// # use tripfund::route::create_app;
/// # let db = init_db("data.db").unwrap();
/// let state = AppState::new(db, Config::default());
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/trips", post(create_trip))
        .route("/join", post(join_trip))
        .route(
            "/trips/{code}",
            get(get_trip).patch(update_trip).delete(delete_trip),
        )
        .route(
            "/trips/{code}/commitments",
            get(list_commitments).post(submit_commitment),
        )
        .route(
            "/trips/{code}/expenses",
            get(list_expenses).post(add_expense),
        )
        .route("/trips/{code}/expenses/{id}", delete(delete_expense));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .with_state(state)
}
