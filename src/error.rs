//! Error types for loading and replaying simulations.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while building a session or writing its outputs.
///
/// Playback itself never returns these; see [`crate::sim::dispatch::DispatchError`].
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Inconsistencies in a system description.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("device \"{0}\" is declared more than once")]
    DuplicateDevice(String),

    #[error("device \"{from}\" links to unknown device \"{to}\"")]
    UnknownLinkTarget { from: String, to: String },
}
