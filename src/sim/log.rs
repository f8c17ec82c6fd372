//! Recorded simulation logs.
//!
//! Lines are kept raw and parsed one at a time on access.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::event::{Event, parse_line};
use crate::error::ReplayError;

/// One recorded run of the simulator against a [`crate::topology::System`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationLog {
    #[serde(default, deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "id_string")]
    pub system_id: String,
    #[serde(default)]
    pub name: String,
    /// Raw log lines in recorded order.
    #[serde(rename = "events", default)]
    lines: Vec<String>,
}

impl SimulationLog {
    /// Builds a log from plain text, one event per line.
    ///
    /// Empty lines are dropped, as the upload path of the recorder does.
    pub fn from_text(id: &str, system_id: &str, name: &str, text: &str) -> Self {
        Self::from_lines(id, system_id, name, text.lines().map(str::to_string))
    }

    /// Builds a log from raw lines, dropping empty ones.
    pub fn from_lines(
        id: &str,
        system_id: &str,
        name: &str,
        lines: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            system_id: system_id.to_string(),
            name: name.to_string(),
            lines: lines.into_iter().filter(|l| !l.is_empty()).collect(),
        }
    }

    /// Loads a log file.
    ///
    /// A `.json` file is read as a stored simulation
    /// (`{id, systemId, name, events}`); anything else as plain text.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if the file cannot be read and
    /// [`ReplayError::Json`] for a malformed JSON simulation.
    pub fn from_path(path: &Path) -> Result<Self, ReplayError> {
        let content = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            let mut log: Self = serde_json::from_str(&content)?;
            log.lines.retain(|l| !l.is_empty());
            Ok(log)
        } else {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Self::from_text(&name, "", &name, &content))
        }
    }

    /// Number of log lines, malformed ones included.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Raw line at `index`.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Parses the event at `index`; `None` past the end of the log.
    pub fn event(&self, index: usize) -> Option<Event> {
        self.line(index).map(parse_line)
    }

    /// Iterates over all events, parsing lazily.
    pub fn events(&self) -> impl Iterator<Item = Event> + '_ {
        self.lines.iter().map(|l| parse_line(l))
    }

    /// Second of the first event; playback starts here.
    pub fn first_second(&self) -> u64 {
        self.event(0).map_or(0, |e| e.second)
    }

    /// Second of the last event with a non-zero second, scanning backwards
    /// past trailing malformed lines. Zero when there is none.
    pub fn last_second(&self) -> u64 {
        self.lines
            .iter()
            .rev()
            .map(|l| parse_line(l).second)
            .find(|&s| s != 0)
            .unwrap_or(0)
    }
}

/// Accepts ids stored either as JSON numbers or strings.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u64),
        Text(String),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Number(n) => n.to_string(),
        Id::Text(s) => s,
    })
}
