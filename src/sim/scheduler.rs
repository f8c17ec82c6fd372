//! Cooperative playback loop.
//!
//! The scheduler never sleeps or spawns. Each [`EventScheduler::tick`]
//! either dispatches the next due event or advances the clock towards it,
//! then tells the host how long to wait before the next tick. Hosts (the
//! headless runner, the terminal UI) own the timer.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, trace, warn};

use super::dispatch::{DispatchError, DispatchOutcome, dispatch};
use super::event::Event;
use super::render::Renderer;
use super::session::SimulationSession;
use crate::config::PlaybackConfig;

/// Every this many dispatched events, a suppressed fast-seek still emits
/// one notification.
pub const DEFAULT_REFRESH_INTERVAL: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Stopped,
    Running,
    Paused,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// The event at `index` was dispatched.
    Dispatched {
        index: usize,
        event: Event,
        result: Result<DispatchOutcome, DispatchError>,
        /// Notification forced through while the display is suppressed.
        forced_refresh: bool,
    },
    /// The clock moved forward by `seconds`.
    Advanced { seconds: u64 },
    /// A fast-seek reached its target and the display was refreshed.
    SeekCompleted { resumed: bool },
    /// The end of the log was reached.
    Finished,
    /// Playback is not running; a stale continuation fired.
    Inactive,
}

/// A tick and the continuation the host should schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub tick: Tick,
    /// Delay before the next tick; `None` when nothing further is scheduled.
    pub next: Option<Duration>,
}

impl TickReport {
    fn new(tick: Tick, next: Option<Duration>) -> Self {
        Self { tick, next }
    }
}

/// Playback state machine: `Stopped`, `Running`, `Paused`.
#[derive(Debug, Clone)]
pub struct EventScheduler {
    state: PlaybackState,
    seconds_per_step: u64,
    step_delay: Duration,
    refresh_interval: usize,
    /// End index of an in-flight fast-seek.
    seek_target: Option<usize>,
    resume_after_seek: bool,
    reverse: bool,
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

impl EventScheduler {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            state: PlaybackState::Stopped,
            seconds_per_step: config.seconds_per_step.max(1),
            step_delay: config.step_delay(),
            refresh_interval: config.refresh_interval.max(1),
            seek_target: None,
            resume_after_seek: false,
            reverse: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn seconds_per_step(&self) -> u64 {
        self.seconds_per_step
    }

    pub fn set_seconds_per_step(&mut self, seconds: u64) {
        self.seconds_per_step = seconds.max(1);
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    pub fn set_step_delay(&mut self, delay: Duration) {
        self.step_delay = delay;
    }

    /// Sets the delay from a 0–100 speed slider: `1000 - 10 * percent` ms.
    pub fn set_speed_percent(&mut self, percent: u8) {
        let percent = u64::from(percent.min(100));
        self.step_delay = Duration::from_millis(1000 - percent * 10);
    }

    /// Flips the playback direction flag.
    ///
    /// Stepping ignores it; playback always runs forward.
    pub fn toggle_reverse(&mut self) {
        self.reverse = !self.reverse;
        info!(reverse = self.reverse, "direction toggled");
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// Target index of the fast-seek in progress, if any.
    pub fn seek_target(&self) -> Option<usize> {
        self.seek_target
    }

    fn set_state(&mut self, session: &mut SimulationSession, state: PlaybackState) {
        self.state = state;
        session.cursor.running = state == PlaybackState::Running;
    }

    /// Stopped/Paused → Running. The host should schedule a tick now.
    ///
    /// Starting while a seek is still pending finishes the seek and keeps
    /// playing from the target.
    pub fn start(&mut self, session: &mut SimulationSession) {
        if self.state != PlaybackState::Running {
            if self.seek_target.is_some() {
                self.resume_after_seek = true;
            }
            info!(index = session.cursor.next_event_index, "playback started");
            self.set_state(session, PlaybackState::Running);
        }
    }

    /// Running → Paused, with one full refresh.
    pub fn pause(&mut self, session: &mut SimulationSession, renderer: &mut dyn Renderer) {
        if self.state == PlaybackState::Running {
            renderer.refresh_all(&session.model);
            self.set_state(session, PlaybackState::Paused);
            info!(clock = %session.clock, "playback paused");
        }
    }

    /// Any → Stopped. State, clock and cursor return to the first event.
    pub fn stop(&mut self, session: &mut SimulationSession, renderer: &mut dyn Renderer) {
        self.set_state(session, PlaybackState::Stopped);
        self.seek_target = None;
        self.resume_after_seek = false;
        session.rewind();
        renderer.refresh_all(&session.model);
        info!("playback stopped");
    }

    /// Arms a fast-seek to `fraction` of the log and returns the target index.
    ///
    /// Seeking backwards rewinds first: state is cumulative, so the only way
    /// to reach an earlier point is to replay from the start. Subsequent
    /// ticks run without delay or notifications until the target is reached.
    pub fn scrub(&mut self, fraction: f64, session: &mut SimulationSession) -> usize {
        let total = session.total_events();
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let target = ((fraction * total as f64).round() as usize).min(total);

        if target < session.cursor.next_event_index {
            info!(target, from = session.cursor.next_event_index, "seeking backwards");
            session.rewind();
        } else {
            info!(target, from = session.cursor.next_event_index, "seeking forwards");
        }
        if self.seek_target.is_none() {
            self.resume_after_seek = self.state == PlaybackState::Running;
        }
        self.seek_target = Some(target);
        session.cursor.display_suppressed = true;
        self.set_state(session, PlaybackState::Running);
        target
    }

    /// Seeks to `fraction` of the log and replays until the target is
    /// reached. Returns the target index.
    pub fn seek(
        &mut self,
        fraction: f64,
        session: &mut SimulationSession,
        renderer: &mut dyn Renderer,
    ) -> usize {
        let target = self.scrub(fraction, session);
        while session.cursor.display_suppressed {
            if self.tick(session, renderer).next.is_none() {
                break;
            }
        }
        target
    }

    /// Runs one scheduling step.
    pub fn tick(
        &mut self,
        session: &mut SimulationSession,
        renderer: &mut dyn Renderer,
    ) -> TickReport {
        if !session.cursor.running {
            return TickReport::new(Tick::Inactive, None);
        }

        let end = self.seek_target.unwrap_or(session.total_events());
        let index = session.cursor.next_event_index;
        let next = if index < end { session.next_event() } else { None };
        let Some(event) = next else {
            return self.reach_end(session, renderer);
        };

        let current = session.cursor.current_second;
        if event.second <= current {
            if event.second < current && !event.is_sentinel() {
                warn!(index, second = event.second, current, "event is behind the clock");
            }
            return self.dispatch_next(index, event, session, renderer);
        }

        let seconds = (event.second - current).min(self.seconds_per_step);
        session.advance_clock(seconds);
        trace!(seconds, clock = %session.clock, "clock advanced");
        let delay = if session.cursor.display_suppressed {
            Duration::ZERO
        } else {
            self.step_delay
        };
        TickReport::new(Tick::Advanced { seconds }, Some(delay))
    }

    fn dispatch_next(
        &mut self,
        index: usize,
        event: Event,
        session: &mut SimulationSession,
        renderer: &mut dyn Renderer,
    ) -> TickReport {
        let suppressed = session.cursor.display_suppressed;
        let result = if suppressed {
            dispatch(&event, &mut session.model, None)
        } else {
            renderer.event_dispatched(&event);
            dispatch(&event, &mut session.model, Some(renderer))
        };
        session.cursor.next_event_index = index + 1;

        if let Err(err) = &result {
            warn!(index, line = %event.format(), %err, "event not applied");
        }

        let forced_refresh =
            suppressed && session.cursor.next_event_index % self.refresh_interval == 0;
        if forced_refresh {
            if let Ok(outcome) = &result {
                notify(renderer, session, outcome);
            }
        }

        TickReport::new(
            Tick::Dispatched {
                index,
                event,
                result,
                forced_refresh,
            },
            Some(Duration::ZERO),
        )
    }

    fn reach_end(
        &mut self,
        session: &mut SimulationSession,
        renderer: &mut dyn Renderer,
    ) -> TickReport {
        if session.cursor.display_suppressed {
            session.cursor.display_suppressed = false;
            self.seek_target = None;
            renderer.refresh_all(&session.model);
            let resumed = self.resume_after_seek;
            self.resume_after_seek = false;
            info!(index = session.cursor.next_event_index, clock = %session.clock, resumed, "seek complete");
            if resumed {
                return TickReport::new(Tick::SeekCompleted { resumed }, Some(Duration::ZERO));
            }
            self.set_state(session, PlaybackState::Paused);
            return TickReport::new(Tick::SeekCompleted { resumed }, None);
        }

        self.set_state(session, PlaybackState::Paused);
        info!(clock = %session.clock, events = session.total_events(), "end of log");
        TickReport::new(Tick::Finished, None)
    }

    /// Ticks until no continuation is scheduled, calling `wait` with each
    /// requested delay. Returns the number of ticks run.
    pub fn drive(
        &mut self,
        session: &mut SimulationSession,
        renderer: &mut dyn Renderer,
        mut wait: impl FnMut(Duration),
        mut observe: impl FnMut(&Tick),
    ) -> usize {
        let mut ticks = 0;
        loop {
            let report = self.tick(session, renderer);
            ticks += 1;
            observe(&report.tick);
            match report.next {
                Some(delay) => wait(delay),
                None => return ticks,
            }
        }
    }

    /// Ticks back-to-back, ignoring delays, until playback goes idle.
    pub fn run_until_idle(
        &mut self,
        session: &mut SimulationSession,
        renderer: &mut dyn Renderer,
    ) -> usize {
        self.drive(session, renderer, |_| {}, |_| {})
    }
}

fn notify(renderer: &mut dyn Renderer, session: &SimulationSession, outcome: &DispatchOutcome) {
    match outcome {
        DispatchOutcome::Device(id) => renderer.device_changed(&session.model, id),
        DispatchOutcome::Link { source, target } => {
            renderer.link_changed(&session.model, source, target);
        }
        DispatchOutcome::Transient { .. } | DispatchOutcome::Ignored => {}
    }
}
