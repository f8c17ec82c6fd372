//! Replay engine for recorded LPDM energy-simulation logs.
//!
//! A [`sim::session::SimulationSession`] pairs a [`topology::System`] with
//! one of its logs; an [`sim::scheduler::EventScheduler`] steps through the
//! log and applies each event to the session's state model.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
pub mod io;
/// Log parsing, state model, dispatch and playback scheduling.
pub mod sim;
pub mod topology;
#[cfg(feature = "tui")]
pub mod tui;
