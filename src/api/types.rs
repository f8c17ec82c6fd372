//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::sim::event::Event;
use crate::sim::session::{PlaybackCursor, SimulationSession};
use crate::sim::state::{Device, Link};

/// Replayed state at the point playback stopped.
///
/// Non-numeric values written through from the log serialize as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct StateResponse {
    pub system_id: u64,
    pub log_id: String,
    pub log_name: String,
    /// Timeline clock, `D HH:MM:SS`.
    pub clock: String,
    pub elapsed_seconds: u64,
    pub cursor: PlaybackCursor,
    /// Fraction of the timeline played, in `[0, 1]`.
    pub scrub_position: f64,
    pub devices: Vec<Device>,
    pub links: Vec<Link>,
}

impl From<&SimulationSession> for StateResponse {
    fn from(s: &SimulationSession) -> Self {
        Self {
            system_id: s.system().id,
            log_id: s.log().id.clone(),
            log_name: s.log().name.clone(),
            clock: s.clock.to_string(),
            elapsed_seconds: s.clock.elapsed,
            cursor: s.cursor,
            scrub_position: s.scrub_position(),
            devices: s.model.devices().cloned().collect(),
            links: s.model.links().cloned().collect(),
        }
    }
}

/// One parsed log line with its position in the log.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub index: usize,
    #[serde(flatten)]
    pub event: Event,
}

/// Optional range query parameters for the events endpoint.
#[derive(Debug, Deserialize)]
pub struct EventQuery {
    /// First log index (inclusive).
    pub from: Option<usize>,
    /// Last log index (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
