//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use lpdm_replay::api::{AppState, router};
use lpdm_replay::sim::render::NullRenderer;
use lpdm_replay::sim::scheduler::EventScheduler;

/// Replays the fixture log to completion and returns the API state.
fn build_api_state() -> Arc<AppState> {
    let mut session = common::session();
    let mut scheduler = EventScheduler::default();
    scheduler.start(&mut session);
    scheduler.run_until_idle(&mut session, &mut NullRenderer);
    Arc::new(AppState::from_session(&session))
}

async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
    let app = router(build_api_state());
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn state_reflects_full_replay() {
    let (status, json) = get("/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["clock"], "0 02:00:00");
    assert_eq!(json["elapsed_seconds"], 7200);
    assert_eq!(json["scrub_position"], 1.0);
    assert_eq!(json["cursor"]["next_event_index"], 13);

    let devices = json["devices"].as_array().unwrap();
    assert_eq!(devices.len(), 6);
    let gc = devices.iter().find(|d| d["id"] == "gc_1").unwrap();
    assert_eq!(gc["state"]["type"], "controller");
    assert_eq!(gc["state"]["state_of_charge"], 0.75);
    assert_eq!(gc["position"]["x"], 300.0);

    let links = json["links"].as_array().unwrap();
    assert_eq!(links.len(), 5);
}

#[tokio::test]
async fn events_include_sentinel_for_corrupted_line() {
    let (status, json) = get("/events?from=11&to=11").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["index"], 11);
    assert_eq!(rows[0]["second"], 0);
    assert_eq!(rows[0]["kind"], "");
}

#[tokio::test]
async fn events_rejects_inverted_range() {
    let (status, json) = get("/events?from=4&to=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some_and(|e| e.contains("from")));
}
