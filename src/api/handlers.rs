//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, EventQuery, EventRecord, StateResponse};

/// Returns the replayed state.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(state.snapshot.clone())
}

/// Returns parsed log events, optionally filtered by index range.
///
/// `GET /events` → 200 + `Vec<EventRecord>` JSON
/// `GET /events?from=N&to=M` → filtered range (inclusive)
/// `GET /events?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<EventRecord> = state
        .events
        .iter()
        .filter(|r| r.index >= from && r.index <= to)
        .cloned()
        .collect();

    Ok(Json(records))
}
