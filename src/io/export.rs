//! CSV export of the dispatch trace.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::ReplayError;
use crate::sim::clock::TimelineClock;
use crate::sim::scheduler::Tick;

/// Column header for the dispatch trace.
const HEADER: &[&str] = &[
    "index",
    "second",
    "clock",
    "device",
    "event_type",
    "value",
    "outcome",
];

/// One dispatched event as written to the trace.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub index: usize,
    pub second: u64,
    /// Timeline clock at dispatch, `D HH:MM:SS`.
    pub clock: String,
    pub device: String,
    pub event_type: String,
    pub value: String,
    /// What the event changed, or why it was not applied.
    pub outcome: String,
}

impl TraceRow {
    /// Builds a row from a dispatch tick; other ticks yield `None`.
    pub fn from_tick(tick: &Tick, clock: &TimelineClock) -> Option<Self> {
        let Tick::Dispatched {
            index,
            event,
            result,
            ..
        } = tick
        else {
            return None;
        };
        let outcome = match result {
            Ok(outcome) => outcome.describe(),
            Err(err) => format!("error: {err}"),
        };
        Some(Self {
            index: *index,
            second: event.second,
            clock: clock.to_string(),
            device: event.device_id.clone(),
            event_type: event.kind.to_string(),
            value: event.value.clone(),
            outcome,
        })
    }
}

/// Exports the trace to a CSV file at the given path.
///
/// # Errors
///
/// Returns [`ReplayError::Io`] if the file cannot be created and
/// [`ReplayError::Csv`] if writing fails.
pub fn export_trace_csv(rows: &[TraceRow], path: &Path) -> Result<(), ReplayError> {
    let file = File::create(path)?;
    write_trace_csv(rows, io::BufWriter::new(file))
}

/// Writes the trace as CSV to any writer.
///
/// # Errors
///
/// Returns [`ReplayError::Csv`] if writing fails.
pub fn write_trace_csv(rows: &[TraceRow], writer: impl Write) -> Result<(), ReplayError> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;

    for r in rows {
        wtr.write_record(&[
            r.index.to_string(),
            r.second.to_string(),
            r.clock.clone(),
            r.device.clone(),
            r.event_type.clone(),
            r.value.clone(),
            r.outcome.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
