//! REST API over a replayed session.
//!
//! Provides two GET endpoints:
//! - `/state`: clock, cursor, devices and links where playback stopped
//! - `/events`: parsed log events with optional index range filtering

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::sim::session::SimulationSession;
pub use types::{EventRecord, StateResponse};

/// Immutable application state shared across all request handlers.
///
/// Captured once after the replay completes and wrapped in `Arc`; no locks
/// needed since all data is read-only.
pub struct AppState {
    pub snapshot: StateResponse,
    pub events: Vec<EventRecord>,
}

impl AppState {
    /// Snapshots `session` and parses its whole log.
    pub fn from_session(session: &SimulationSession) -> Self {
        Self {
            snapshot: StateResponse::from(session),
            events: session
                .log()
                .events()
                .enumerate()
                .map(|(index, event)| EventRecord { index, event })
                .collect(),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/events", get(handlers::get_events))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
