//! Everything one playback session owns.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::clock::TimelineClock;
use super::event::Event;
use super::log::SimulationLog;
use super::state::StateModel;
use crate::error::{ReplayError, TopologyError};
use crate::topology::System;

/// Position of playback within the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlaybackCursor {
    /// Index of the next log line to dispatch.
    pub next_event_index: usize,
    /// Mirrors the clock's elapsed seconds.
    pub current_second: u64,
    /// Second of the last timed event in the log.
    pub last_second: u64,
    /// Cleared to cancel any pending tick.
    pub running: bool,
    /// Set while fast-seeking; notifications are withheld.
    pub display_suppressed: bool,
}

/// A system, one of its recorded logs, and the replayed state.
///
/// Passed by reference to the scheduler and dispatcher; there is no
/// ambient playback state.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    system: System,
    log: SimulationLog,
    pub model: StateModel,
    pub clock: TimelineClock,
    pub cursor: PlaybackCursor,
}

impl SimulationSession {
    /// Seeds the state model from `system` and positions the clock at the
    /// first event.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] if the system wiring is inconsistent.
    pub fn new(system: System, log: SimulationLog) -> Result<Self, TopologyError> {
        let model = StateModel::from_system(&system)?;
        let mut session = Self {
            system,
            log,
            model,
            clock: TimelineClock::default(),
            cursor: PlaybackCursor::default(),
        };
        session.rewind();
        Ok(session)
    }

    /// Loads a system description and a log file and pairs them.
    ///
    /// # Errors
    ///
    /// Returns a [`ReplayError`] if either file cannot be read or parsed,
    /// or if the system wiring is inconsistent.
    pub fn load(system_path: &Path, log_path: &Path) -> Result<Self, ReplayError> {
        let system = System::from_json_file(system_path)?;
        let log = SimulationLog::from_path(log_path)?;
        if !log.system_id.is_empty() && log.system_id != system.id.to_string() {
            warn!(
                log = %log.system_id,
                system = system.id,
                "log was recorded against another system"
            );
        }
        info!(system = %system.name, log = %log.name, events = log.len(), "loaded");
        Ok(Self::new(system, log)?)
    }

    /// Returns state, clock and cursor to the start of the log.
    ///
    /// The `running` flag is left alone; the scheduler owns it.
    pub fn rewind(&mut self) {
        self.model.reset();
        let first = self.log.first_second();
        self.clock = TimelineClock::at(first);
        self.cursor = PlaybackCursor {
            next_event_index: 0,
            current_second: first,
            last_second: self.log.last_second(),
            running: self.cursor.running,
            display_suppressed: false,
        };
    }

    /// Advances clock and cursor together.
    pub(crate) fn advance_clock(&mut self, seconds: u64) {
        self.clock.advance(seconds);
        self.cursor.current_second = self.clock.elapsed;
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn log(&self) -> &SimulationLog {
        &self.log
    }

    /// Total number of log lines.
    pub fn total_events(&self) -> usize {
        self.log.len()
    }

    /// The event the cursor points at, if any remain.
    pub fn next_event(&self) -> Option<Event> {
        self.log.event(self.cursor.next_event_index)
    }

    /// Fraction of the timeline already played, in `[0, 1]`.
    ///
    /// A log without timed events reports 0.
    pub fn scrub_position(&self) -> f64 {
        if self.cursor.last_second == 0 {
            return 0.0;
        }
        (self.cursor.current_second as f64 / self.cursor.last_second as f64).clamp(0.0, 1.0)
    }

    /// `true` once every log line has been dispatched.
    pub fn is_finished(&self) -> bool {
        self.cursor.next_event_index >= self.log.len()
    }
}
