use std::fmt;

use serde::Serialize;

const SECS_PER_MIN: u64 = 60;
const MINS_PER_HOUR: u64 = 60;
const HOURS_PER_DAY: u64 = 24;

/// Virtual playback clock.
///
/// Tracks elapsed simulation seconds together with their decomposition into
/// days, hours, minutes and seconds. The decomposition is always exact:
/// `elapsed == ((days * 24 + hours) * 60 + minutes) * 60 + seconds`.
///
/// # Examples
///
/// ```
/// use lpdm_replay::sim::clock::TimelineClock;
///
/// let mut clock = TimelineClock::default();
/// clock.advance(90_061);
/// assert_eq!((clock.days, clock.hours, clock.minutes, clock.seconds), (1, 1, 1, 1));
/// assert_eq!(clock.to_string(), "1 01:01:01");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimelineClock {
    /// Total elapsed simulation seconds.
    pub elapsed: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimelineClock {
    /// Creates a clock positioned at `elapsed` seconds.
    pub fn at(elapsed: u64) -> Self {
        let mut clock = Self::default();
        clock.set(elapsed);
        clock
    }

    /// Advances the clock by `delta` seconds.
    pub fn advance(&mut self, delta: u64) {
        self.set(self.elapsed.saturating_add(delta));
    }

    /// Moves the clock to `elapsed` seconds and recomputes the carry fields.
    pub fn set(&mut self, elapsed: u64) {
        self.elapsed = elapsed;
        self.seconds = elapsed % SECS_PER_MIN;
        let total_minutes = elapsed / SECS_PER_MIN;
        self.minutes = total_minutes % MINS_PER_HOUR;
        let total_hours = total_minutes / MINS_PER_HOUR;
        self.hours = total_hours % HOURS_PER_DAY;
        self.days = total_hours / HOURS_PER_DAY;
    }
}

impl fmt::Display for TimelineClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}
