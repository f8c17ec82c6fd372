//! Cumulative device and link state reconstructed from the log.
//!
//! Links live in one arena owned by [`StateModel`]; each device keeps only
//! the [`LinkId`] of every link it participates in, so both ends of a wire
//! always observe the same [`LinkState`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::TopologyError;
use crate::topology::{DeviceConfig, Point, System};

/// Device category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    PowerSource,
    UtilityMeter,
    GridController,
    EndUse(EndUseKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndUseKind {
    AirConditioner,
    Light,
    FixedConsumption,
    Other(String),
}

impl EndUseKind {
    fn from_config(raw: Option<&str>) -> Self {
        match raw {
            Some("air_conditioner") => Self::AirConditioner,
            Some("light") => Self::Light,
            Some("fixed_consumption") => Self::FixedConsumption,
            other => Self::Other(other.unwrap_or_default().to_string()),
        }
    }
}

impl DeviceKind {
    /// Short human-readable label.
    pub fn label(&self) -> &str {
        match self {
            Self::PowerSource => "pv",
            Self::UtilityMeter => "utility meter",
            Self::GridController => "grid controller",
            Self::EndUse(EndUseKind::AirConditioner) => "air conditioner",
            Self::EndUse(EndUseKind::Light) => "light",
            Self::EndUse(EndUseKind::FixedConsumption) => "fixed consumption",
            Self::EndUse(EndUseKind::Other(_)) => "eud",
        }
    }
}

/// Kind-specific device state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceState {
    Controller { state_of_charge: f64 },
    AirConditioner { compressor_on: bool, set_point: f64 },
    Light { brightness: f64 },
    Empty,
}

impl DeviceState {
    /// Initial state for a device of `kind`.
    pub fn initial(kind: &DeviceKind) -> Self {
        match kind {
            DeviceKind::GridController => Self::Controller {
                state_of_charge: 0.0,
            },
            DeviceKind::EndUse(EndUseKind::AirConditioner) => Self::AirConditioner {
                compressor_on: false,
                set_point: 0.0,
            },
            DeviceKind::EndUse(EndUseKind::Light) => Self::Light { brightness: 0.0 },
            _ => Self::Empty,
        }
    }
}

/// Index of a link in the [`StateModel`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LinkId(usize);

/// Power-flow state shared by the two devices a link connects.
///
/// The sign of `power` gives the direction; negative values were reported
/// by the sending device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LinkState {
    pub power: f64,
    pub requested_power: f64,
    pub allocated_power: f64,
}

/// A wire between two devices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    /// Endpoints in the order the topology declared them.
    pub endpoints: (String, String),
    pub state: LinkState,
    /// Device that sourced the most recent power message, if any.
    pub power_source: Option<String>,
    pub waypoints: Vec<Point>,
}

impl Link {
    /// The endpoint opposite `device_id`.
    pub fn peer_of(&self, device_id: &str) -> &str {
        if self.endpoints.0 == device_id {
            &self.endpoints.1
        } else {
            &self.endpoints.0
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b) = &self.endpoints;
        let (from, to) = match self.power_source.as_deref() {
            Some(src) if src == b => (b, a),
            _ => (a, b),
        };
        write!(
            f,
            "{from} -> {to}: power={:.0}W request={:.0}W allocate={:.0}W",
            self.state.power, self.state.requested_power, self.state.allocated_power
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub kind: DeviceKind,
    pub state: DeviceState,
    /// Last price the device reported; any device kind may carry one.
    pub price: f64,
    pub position: Option<Point>,
    /// Peer device id → link in the arena.
    links: BTreeMap<String, LinkId>,
}

impl Device {
    fn new(config: &DeviceConfig, kind: DeviceKind, position: Option<Point>) -> Self {
        Self {
            id: config.device_id.clone(),
            state: DeviceState::initial(&kind),
            price: 0.0,
            kind,
            position,
            links: BTreeMap::new(),
        }
    }

    /// Link to `peer`, if the two are wired.
    pub fn link_to(&self, peer: &str) -> Option<LinkId> {
        self.links.get(peer).copied()
    }

    /// Kind-specific state followed by the price, e.g. `soc=0.750 price=0.100`.
    pub fn summary(&self) -> String {
        match &self.state {
            DeviceState::Empty => format!("price={:.3}", self.price),
            state => format!("{state} price={:.3}", self.price),
        }
    }

    /// Ids of all wired peers.
    pub fn peers(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.id, self.kind.label(), self.summary())
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller { state_of_charge } => write!(f, "soc={state_of_charge:.3}"),
            Self::AirConditioner {
                compressor_on,
                set_point,
            } => write!(
                f,
                "compressor={} set_point={set_point:.3}",
                if *compressor_on { "on" } else { "off" }
            ),
            Self::Light { brightness } => write!(f, "brightness={brightness:.3}"),
            Self::Empty => Ok(()),
        }
    }
}

/// All device and link state of one playback session.
///
/// Mutated only by [`crate::sim::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct StateModel {
    devices: BTreeMap<String, Device>,
    links: Vec<Link>,
}

impl StateModel {
    /// Builds the initial model from a system description.
    ///
    /// Wiring follows the recorder's rules: power sources and utility
    /// meters link to their controller, the controller links to each
    /// end-use device, and controllers link to connected devices whose id
    /// starts with `gc`. A pair is only ever linked once.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] for duplicate device ids or links to
    /// devices the system does not declare.
    pub fn from_system(system: &System) -> Result<Self, TopologyError> {
        let sections = &system.config.devices;
        let mut model = Self {
            devices: BTreeMap::new(),
            links: Vec::new(),
        };

        let categories: [(&[DeviceConfig], fn(&DeviceConfig) -> DeviceKind); 4] = [
            (sections.pvs.as_slice(), |_| DeviceKind::PowerSource),
            (sections.utility_meters.as_slice(), |_| DeviceKind::UtilityMeter),
            (sections.grid_controllers.as_slice(), |_| DeviceKind::GridController),
            (sections.euds.as_slice(), |c| {
                DeviceKind::EndUse(EndUseKind::from_config(c.eud_type.as_deref()))
            }),
        ];
        for (configs, kind_of) in categories {
            for config in configs {
                let position = system.position(&config.device_id);
                let device = Device::new(config, kind_of(config), position);
                if model.devices.insert(device.id.clone(), device).is_some() {
                    return Err(TopologyError::DuplicateDevice(config.device_id.clone()));
                }
            }
        }

        let controller_for = |c: &DeviceConfig| {
            c.grid_controller_id
                .clone()
                .or_else(|| system.controller_of(&c.device_id).map(str::to_string))
        };
        for config in sections.pvs.iter().chain(&sections.utility_meters) {
            if let Some(gc) = controller_for(config) {
                model.connect(system, &config.device_id, &gc)?;
            }
        }
        for config in &sections.euds {
            if let Some(gc) = controller_for(config) {
                model.connect(system, &gc, &config.device_id)?;
            }
        }
        for gc in &sections.grid_controllers {
            for peer in gc.connected_devices.iter().filter(|d| is_controller_id(d)) {
                model.connect(system, &gc.device_id, peer)?;
            }
        }

        Ok(model)
    }

    fn connect(&mut self, system: &System, a: &str, b: &str) -> Result<LinkId, TopologyError> {
        for (from, to) in [(b, a), (a, b)] {
            if !self.devices.contains_key(to) {
                return Err(TopologyError::UnknownLinkTarget {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }
        if let Some(id) = self.link_between(a, b) {
            return Ok(id);
        }

        let id = LinkId(self.links.len());
        self.links.push(Link {
            endpoints: (a.to_string(), b.to_string()),
            state: LinkState::default(),
            power_source: None,
            waypoints: system.waypoints(a, b),
        });
        for (end, peer) in [(a, b), (b, a)] {
            if let Some(device) = self.devices.get_mut(end) {
                device.links.insert(peer.to_string(), id);
            }
        }
        Ok(id)
    }

    /// Restores every device and link to its initial state, keeping wiring.
    pub fn reset(&mut self) {
        for device in self.devices.values_mut() {
            device.state = DeviceState::initial(&device.kind);
            device.price = 0.0;
        }
        for link in &mut self.links {
            link.state = LinkState::default();
            link.power_source = None;
        }
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.get(id)
    }

    pub(crate) fn device_mut(&mut self, id: &str) -> Option<&mut Device> {
        self.devices.get_mut(id)
    }

    /// Devices in id order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    pub(crate) fn link_mut(&mut self, id: LinkId) -> Option<&mut Link> {
        self.links.get_mut(id.0)
    }

    /// Links in creation order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.iter()
    }

    /// The link joining `a` and `b`, in either order.
    pub fn link_between(&self, a: &str, b: &str) -> Option<LinkId> {
        self.devices.get(a).and_then(|d| d.link_to(b))
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Controller ids carry a `gc` prefix before the first underscore.
fn is_controller_id(id: &str) -> bool {
    id.split('_').next() == Some("gc")
}
