//! Per-hour event counts for the timeline overview.

use serde::Serialize;

use super::log::SimulationLog;

const SECONDS_PER_HOUR: u64 = 3600;

/// Upper bound on the number of slots, whatever the log length.
pub const MAX_SLOTS: u64 = 1000;

/// Number of power and price events falling in each slot of the timeline.
///
/// A slot is one simulated hour, widened to a whole number of hours when
/// the log spans more than [`MAX_SLOTS`] hours.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventDensity {
    pub slot_seconds: u64,
    pub power_per_slot: Vec<u64>,
    pub price_per_slot: Vec<u64>,
}

impl EventDensity {
    /// Buckets every event of `log` by the slot of its second.
    ///
    /// Malformed lines are skipped. Both series run up to and including the
    /// slot of the last timed event.
    pub fn from_log(log: &SimulationLog) -> Self {
        let hours = log.last_second() / SECONDS_PER_HOUR + 1;
        let slot_seconds = SECONDS_PER_HOUR * hours.div_ceil(MAX_SLOTS);
        let slots = (log.last_second() / slot_seconds + 1) as usize;
        let mut density = Self {
            slot_seconds,
            power_per_slot: vec![0; slots],
            price_per_slot: vec![0; slots],
        };
        for event in log.events().filter(|e| !e.is_sentinel()) {
            let slot = (event.second / slot_seconds) as usize;
            if slot >= slots {
                continue;
            }
            if event.kind.is_power() {
                density.power_per_slot[slot] += 1;
            } else if event.kind.is_price_message() {
                density.price_per_slot[slot] += 1;
            }
        }
        density
    }

    pub fn slots(&self) -> usize {
        self.power_per_slot.len()
    }

    /// Largest single-slot count across both series.
    pub fn peak(&self) -> u64 {
        self.power_per_slot
            .iter()
            .chain(&self.price_per_slot)
            .copied()
            .max()
            .unwrap_or(0)
    }
}
