//! System description: devices by category, their wiring, and the saved
//! diagram layout.
//!
//! The JSON shape matches what the simulation front end stores:
//!
//! ```json
//! {
//!   "id": 1,
//!   "name": "house",
//!   "config": { "devices": { "pvs": [...], "utility_meters": [...],
//!                            "grid_controllers": [...], "euds": [...] } },
//!   "layout": { "pv_1": { "x": 100, "y": 30, "links": { "gc_1": { "vertices": [] } } } }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// A simulated system: the topology the log was recorded against.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct System {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub config: SystemConfig,
    /// Keyed by device id. Unknown keys (e.g. a stray `links` entry) are
    /// tolerated and simply never looked up.
    #[serde(default)]
    pub layout: HashMap<String, DeviceLayout>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub devices: DeviceSections,
}

/// Device lists grouped by category.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceSections {
    /// Power sources (photovoltaic arrays).
    #[serde(default)]
    pub pvs: Vec<DeviceConfig>,
    #[serde(default)]
    pub utility_meters: Vec<DeviceConfig>,
    #[serde(default)]
    pub grid_controllers: Vec<DeviceConfig>,
    /// End-use devices.
    #[serde(default)]
    pub euds: Vec<DeviceConfig>,
}

/// Per-device configuration fields the replay engine needs.
///
/// The simulator's own parameters are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub device_id: String,
    /// Explicit link target.
    #[serde(default)]
    pub grid_controller_id: Option<String>,
    /// End-use device sub-kind, e.g. `"air_conditioner"` or `"light"`.
    #[serde(default)]
    pub eud_type: Option<String>,
    /// Devices wired to a grid controller.
    #[serde(default)]
    pub connected_devices: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceLayout {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Routing waypoints for links drawn from this device, keyed by peer id.
    #[serde(default)]
    pub links: HashMap<String, LinkLayout>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LinkLayout {
    #[serde(default)]
    pub vertices: Vec<Point>,
}

impl System {
    /// Reads a system description from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if the file cannot be read and
    /// [`ReplayError::Json`] if it is not a valid system description.
    pub fn from_json_file(path: &Path) -> Result<Self, ReplayError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses a system description from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Json`] on malformed input.
    pub fn from_json_str(s: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Saved diagram position of a device.
    pub fn position(&self, device_id: &str) -> Option<Point> {
        self.layout.get(device_id).map(|l| Point { x: l.x, y: l.y })
    }

    /// Saved waypoints for the link between `a` and `b`, looked up from
    /// either end.
    pub fn waypoints(&self, a: &str, b: &str) -> Vec<Point> {
        let from = |x: &str, y: &str| {
            self.layout
                .get(x)
                .and_then(|l| l.links.get(y))
                .map(|ll| ll.vertices.clone())
        };
        from(a, b).or_else(|| from(b, a)).unwrap_or_default()
    }

    /// Grid controller whose `connected_devices` lists `device_id`.
    pub fn controller_of(&self, device_id: &str) -> Option<&str> {
        self.config
            .devices
            .grid_controllers
            .iter()
            .find(|gc| gc.connected_devices.iter().any(|d| d == device_id))
            .map(|gc| gc.device_id.as_str())
    }
}
