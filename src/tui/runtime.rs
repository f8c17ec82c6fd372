//! Playback host and TUI application state.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::{PlaybackConfig, STEP_SIZES};
use crate::sim::event::Event;
use crate::sim::render::Renderer;
use crate::sim::scheduler::{EventScheduler, PlaybackState, Tick};
use crate::sim::session::SimulationSession;
use crate::sim::state::StateModel;
use crate::sim::timeline::EventDensity;

/// Maximum number of entries kept in the event and message logs.
const MAX_LOG: usize = 200;

/// Tick delay options in milliseconds (slowest → fastest).
const SPEED_LEVELS_MS: [u64; 6] = [1000, 500, 250, 100, 20, 0];

/// Upper bound on back-to-back zero-delay ticks between two frames.
const MAX_TICKS_PER_FRAME: usize = 2_000;

/// Poll timeout while nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Fraction of the log moved by one seek key press.
pub const SEEK_STEP: f64 = 0.05;

/// Renderer that keeps what the terminal view highlights.
#[derive(Debug, Default)]
pub struct TuiRenderer {
    /// Most recent dispatched events, newest last.
    pub events: VecDeque<String>,
    /// Most recent price messages, newest last.
    pub messages: VecDeque<String>,
    /// Device written by the latest notification.
    pub last_device: Option<String>,
    /// Link written by the latest notification.
    pub last_link: Option<(String, String)>,
    /// Number of full refreshes received.
    pub refreshes: usize,
}

fn push_capped(log: &mut VecDeque<String>, entry: String) {
    if log.len() >= MAX_LOG {
        log.pop_front();
    }
    log.push_back(entry);
}

impl Renderer for TuiRenderer {
    fn device_changed(&mut self, _model: &StateModel, device_id: &str) {
        self.last_device = Some(device_id.to_string());
    }

    fn link_changed(&mut self, _model: &StateModel, a: &str, b: &str) {
        self.last_link = Some((a.to_string(), b.to_string()));
    }

    fn transient_message(&mut self, source: &str, target: &str, value: &str) {
        push_capped(&mut self.messages, format!("{source} -> {target}: {value}"));
    }

    fn event_dispatched(&mut self, event: &Event) {
        push_capped(&mut self.events, event.to_string());
    }

    fn refresh_all(&mut self, _model: &StateModel) {
        self.refreshes += 1;
        self.last_device = None;
        self.last_link = None;
    }
}

/// TUI application state.
pub struct App {
    pub session: SimulationSession,
    pub scheduler: EventScheduler,
    pub renderer: TuiRenderer,
    /// Per-hour event counts for the timeline strip.
    pub density: EventDensity,
    /// When the next scheduler tick is due; `None` when nothing is scheduled.
    pub next_tick: Option<Instant>,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    /// Current index into [`STEP_SIZES`].
    pub step_idx: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
}

impl App {
    pub fn new(session: SimulationSession, config: &PlaybackConfig) -> Self {
        let scheduler = EventScheduler::new(config);
        let delay_ms = config.step_delay().as_millis() as u64;
        let speed_idx = SPEED_LEVELS_MS
            .iter()
            .position(|&ms| ms <= delay_ms)
            .unwrap_or(SPEED_LEVELS_MS.len() - 1);
        let step_idx = STEP_SIZES
            .iter()
            .position(|&s| s >= scheduler.seconds_per_step())
            .unwrap_or(STEP_SIZES.len() - 1);
        let density = EventDensity::from_log(session.log());
        Self {
            session,
            scheduler,
            renderer: TuiRenderer::default(),
            density,
            next_tick: None,
            speed_idx,
            step_idx,
            quit: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    /// Play/pause.
    pub fn toggle_play(&mut self) {
        if self.scheduler.state() == PlaybackState::Running {
            self.scheduler.pause(&mut self.session, &mut self.renderer);
            self.next_tick = None;
        } else {
            self.scheduler.start(&mut self.session);
            self.next_tick = Some(Instant::now());
        }
    }

    pub fn stop(&mut self) {
        self.scheduler.stop(&mut self.session, &mut self.renderer);
        self.renderer.events.clear();
        self.renderer.messages.clear();
        self.next_tick = None;
    }

    /// Shorter delay between clock steps.
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
        self.apply_speed();
    }

    /// Longer delay between clock steps.
    pub fn speed_down(&mut self) {
        if self.speed_idx > 0 {
            self.speed_idx -= 1;
        }
        self.apply_speed();
    }

    fn apply_speed(&mut self) {
        self.scheduler
            .set_step_delay(Duration::from_millis(SPEED_LEVELS_MS[self.speed_idx]));
    }

    /// Cycles through the offered clock step sizes.
    pub fn cycle_step_size(&mut self) {
        self.step_idx = (self.step_idx + 1) % STEP_SIZES.len();
        self.scheduler.set_seconds_per_step(STEP_SIZES[self.step_idx]);
    }

    pub fn toggle_reverse(&mut self) {
        self.scheduler.toggle_reverse();
    }

    /// Fraction of log lines already dispatched.
    pub fn event_fraction(&self) -> f64 {
        let total = self.session.total_events();
        if total == 0 {
            return 0.0;
        }
        self.session.cursor.next_event_index as f64 / total as f64
    }

    /// Seeks relative to the current position.
    pub fn seek_by(&mut self, delta: f64) {
        self.seek_to(self.event_fraction() + delta);
    }

    /// Arms a fast-seek; subsequent pumps replay towards the target.
    pub fn seek_to(&mut self, fraction: f64) {
        self.scheduler.scrub(fraction, &mut self.session);
        self.next_tick = Some(Instant::now());
    }

    /// How long the event loop may block waiting for input.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        self.next_tick
            .map_or(IDLE_POLL, |due| due.saturating_duration_since(now))
    }

    /// Runs every tick that is due at `now`.
    ///
    /// Zero-delay continuations (same-second events, fast-seek) are run
    /// back-to-back up to a per-frame budget so input stays responsive.
    pub fn pump(&mut self, now: Instant) {
        let Some(due) = self.next_tick else {
            return;
        };
        if now < due {
            return;
        }
        for _ in 0..MAX_TICKS_PER_FRAME {
            let report = self.scheduler.tick(&mut self.session, &mut self.renderer);
            let forced = matches!(
                report.tick,
                Tick::Dispatched {
                    forced_refresh: true,
                    ..
                }
            );
            match report.next {
                Some(delay) if delay.is_zero() && !forced => continue,
                Some(delay) => {
                    self.next_tick = Some(now + delay);
                    return;
                }
                None => {
                    self.next_tick = None;
                    return;
                }
            }
        }
        self.next_tick = Some(now);
    }

    /// Header label for the playback state.
    pub fn state_label(&self) -> &'static str {
        let running = self.scheduler.state() == PlaybackState::Running;
        if self.session.cursor.display_suppressed && running {
            "SEEKING"
        } else if self.session.is_finished() {
            "DONE"
        } else {
            match self.scheduler.state() {
                PlaybackState::Running => "RUNNING",
                PlaybackState::Paused => "PAUSED",
                PlaybackState::Stopped => "STOPPED",
            }
        }
    }

    /// Current delay between clock steps in milliseconds.
    pub fn step_delay_ms(&self) -> u128 {
        self.scheduler.step_delay().as_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::log::SimulationLog;
    use crate::topology::System;

    fn app(n: usize) -> App {
        let system = System::from_json_str(
            r#"{ "config": { "devices": {
                "pvs": [ { "device_id": "pv_1", "grid_controller_id": "gc_1" } ],
                "grid_controllers": [ { "device_id": "gc_1" } ]
            } } }"#,
        )
        .expect("fixture should parse");
        let lines = (0..n).map(|i| {
            if i % 2 == 0 {
                format!("0 00:00:00; {i}; pv_1; power_msg; -{i}; POWER to gc_1")
            } else {
                format!("0 00:00:00; {i}; gc_1; price_msg_out; 0.1; PRICE to pv_1")
            }
        });
        let log = SimulationLog::from_lines("1.1", "1", "t", lines);
        let session = SimulationSession::new(system, log).expect("fixture topology is valid");
        App::new(session, &PlaybackConfig::default())
    }

    fn pump_until_idle(app: &mut App) {
        let mut now = Instant::now();
        while let Some(due) = app.next_tick {
            now = now.max(due);
            app.pump(now);
        }
    }

    #[test]
    fn play_runs_to_end() {
        let mut app = app(10);
        assert_eq!(app.state_label(), "STOPPED");
        app.toggle_play();
        assert_eq!(app.state(), PlaybackState::Running);
        pump_until_idle(&mut app);
        assert!(app.session.is_finished());
        assert_eq!(app.state_label(), "DONE");
        assert_eq!(app.renderer.events.len(), 10);
        assert_eq!(app.renderer.messages.len(), 5);
    }

    #[test]
    fn pause_cancels_pending_tick() {
        let mut app = app(10);
        app.toggle_play();
        app.pump(Instant::now());
        app.toggle_play();
        assert_eq!(app.state(), PlaybackState::Paused);
        assert!(app.next_tick.is_none());
        assert_eq!(app.renderer.refreshes, 1);
    }

    #[test]
    fn play_after_pausing_a_seek_keeps_playing() {
        let mut app = app(40);
        app.seek_to(0.5);
        app.toggle_play();
        assert_eq!(app.state(), PlaybackState::Paused);
        assert_eq!(app.state_label(), "PAUSED");

        app.toggle_play();
        assert_eq!(app.state_label(), "SEEKING");
        pump_until_idle(&mut app);
        assert_eq!(app.session.cursor.next_event_index, 40);
        assert_eq!(app.state_label(), "DONE");
        // events after the seek target are played with display enabled
        assert_eq!(app.renderer.events.len(), 20);
    }

    #[test]
    fn stop_clears_logs() {
        let mut app = app(6);
        app.toggle_play();
        pump_until_idle(&mut app);
        app.stop();
        assert_eq!(app.session.cursor.next_event_index, 0);
        assert!(app.renderer.events.is_empty());
        assert_eq!(app.state_label(), "STOPPED");
    }

    #[test]
    fn seek_keys_move_by_fraction() {
        let mut app = app(40);
        app.seek_to(0.5);
        assert_eq!(app.state_label(), "SEEKING");
        pump_until_idle(&mut app);
        assert_eq!(app.session.cursor.next_event_index, 20);
        assert_eq!(app.state(), PlaybackState::Paused);
        // suppressed dispatches never reach the event log
        assert!(app.renderer.events.is_empty());

        app.seek_by(-SEEK_STEP);
        pump_until_idle(&mut app);
        assert_eq!(app.session.cursor.next_event_index, 18);
    }

    #[test]
    fn speed_controls_stay_in_bounds() {
        let mut app = app(1);
        for _ in 0..10 {
            app.speed_down();
        }
        assert_eq!(app.speed_idx, 0);
        assert_eq!(app.step_delay_ms(), 1000);
        for _ in 0..10 {
            app.speed_up();
        }
        assert_eq!(app.speed_idx, SPEED_LEVELS_MS.len() - 1);
        assert_eq!(app.step_delay_ms(), 0);
    }

    #[test]
    fn step_size_cycles() {
        let mut app = app(1);
        assert_eq!(STEP_SIZES[app.step_idx], 60);
        for expected in [600, 3600, 1, 10, 60] {
            app.cycle_step_size();
            assert_eq!(app.scheduler.seconds_per_step(), expected);
        }
    }

    #[test]
    fn event_log_is_capped() {
        let mut r = TuiRenderer::default();
        for i in 0..(MAX_LOG + 5) {
            push_capped(&mut r.events, i.to_string());
        }
        assert_eq!(r.events.len(), MAX_LOG);
        assert_eq!(r.events.front().map(String::as_str), Some("5"));
    }
}
