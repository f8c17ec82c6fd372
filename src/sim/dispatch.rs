//! Applies parsed events to the state model.
//!
//! Each event kind writes exactly one device or link field and, when a
//! renderer is supplied, emits one notification for the written entity.
//! Passing `None` for the renderer is how the scheduler suppresses display.

use thiserror::Error;
use tracing::debug;

use super::event::{Event, EventKind};
use super::render::Renderer;
use super::state::{Device, DeviceState, LinkId, StateModel};

/// What a dispatched event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A device's state was written.
    Device(String),
    /// A link field was written; `source` is the sending device.
    Link { source: String, target: String },
    /// A price message was animated; no state changed.
    Transient { source: String, target: String },
    /// The event kind has no effect.
    Ignored,
}

impl DispatchOutcome {
    /// Compact label for traces.
    pub fn describe(&self) -> String {
        match self {
            Self::Device(id) => format!("device {id}"),
            Self::Link { source, target } => format!("link {source}->{target}"),
            Self::Transient { source, target } => format!("message {source}->{target}"),
            Self::Ignored => "ignored".to_string(),
        }
    }
}

/// Reasons an event could not be applied. Nothing is written in any case.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unknown device \"{0}\"")]
    UnknownDevice(String),

    #[error("devices \"{0}\" and \"{1}\" are not linked")]
    NotLinked(String, String),

    #[error("{kind} event has no counterpart device in action \"{action}\"")]
    MissingCounterpart { kind: String, action: String },

    #[error("device \"{device}\" has no {field} field")]
    FieldNotApplicable { device: String, field: &'static str },
}

#[derive(Debug, Clone, Copy)]
enum DeviceField {
    StateOfCharge(f64),
    Price(f64),
    Brightness(f64),
    SetPoint(f64),
    Compressor(bool),
}

impl DeviceField {
    fn name(self) -> &'static str {
        match self {
            Self::StateOfCharge(_) => "state of charge",
            Self::Price(_) => "price",
            Self::Brightness(_) => "brightness",
            Self::SetPoint(_) => "set point",
            Self::Compressor(_) => "compressor",
        }
    }

    /// Writes the field into `device`; `false` if its kind has no such field.
    fn write(self, device: &mut Device) -> bool {
        match (self, &mut device.state) {
            (Self::Price(v), _) => device.price = v,
            (Self::StateOfCharge(v), DeviceState::Controller { state_of_charge }) => {
                *state_of_charge = v;
            }
            (Self::Brightness(v), DeviceState::Light { brightness }) => *brightness = v,
            (Self::SetPoint(v), DeviceState::AirConditioner { set_point, .. }) => *set_point = v,
            (Self::Compressor(on), DeviceState::AirConditioner { compressor_on, .. }) => {
                *compressor_on = on;
            }
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum LinkField {
    Requested,
    Allocated,
}

/// Applies `event` to `model`.
///
/// # Errors
///
/// Returns a [`DispatchError`] when the event references devices or links
/// the topology does not have. The model is left untouched in that case.
pub fn dispatch(
    event: &Event,
    model: &mut StateModel,
    renderer: Option<&mut dyn Renderer>,
) -> Result<DispatchOutcome, DispatchError> {
    let value = event.numeric_value();
    match &event.kind {
        EventKind::PowerMsg | EventKind::PowerOut => apply_power(event, model, renderer),
        EventKind::BatterySoc => {
            write_device(event, model, renderer, DeviceField::StateOfCharge(value))
        }
        EventKind::Price => write_device(event, model, renderer, DeviceField::Price(value)),
        EventKind::Brightness => {
            write_device(event, model, renderer, DeviceField::Brightness(value))
        }
        EventKind::SetPoint => write_device(event, model, renderer, DeviceField::SetPoint(value)),
        EventKind::CompressorOnOff => {
            let on = switch_value(&event.value);
            write_device(event, model, renderer, DeviceField::Compressor(on))
        }
        EventKind::RequestOut => write_link(event, model, renderer, LinkField::Requested),
        EventKind::AllocateMsg => write_link(event, model, renderer, LinkField::Allocated),
        EventKind::PriceMsgIn | EventKind::PriceMsgOut => animate_price(event, model, renderer),
        EventKind::PriceMessage | EventKind::Unrecognized(_) => {
            debug!(kind = %event.kind, device = %event.device_id, "no dispatch effect");
            Ok(DispatchOutcome::Ignored)
        }
    }
}

/// Rounds half-way values towards positive infinity.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn switch_value(raw: &str) -> bool {
    match raw {
        "on" | "true" => true,
        other => other.parse::<f64>().is_ok_and(|v| v != 0.0),
    }
}

fn counterpart<'a>(
    event: &'a Event,
    pick: fn(&Event) -> Option<&str>,
) -> Result<&'a str, DispatchError> {
    pick(event).ok_or_else(|| DispatchError::MissingCounterpart {
        kind: event.kind.to_string(),
        action: event.action.clone(),
    })
}

fn link_id(model: &StateModel, a: &str, b: &str) -> Result<LinkId, DispatchError> {
    for id in [a, b] {
        if model.device(id).is_none() {
            return Err(DispatchError::UnknownDevice(id.to_string()));
        }
    }
    model
        .link_between(a, b)
        .ok_or_else(|| DispatchError::NotLinked(a.to_string(), b.to_string()))
}

fn write_device(
    event: &Event,
    model: &mut StateModel,
    renderer: Option<&mut dyn Renderer>,
    field: DeviceField,
) -> Result<DispatchOutcome, DispatchError> {
    let id = event.device_id.as_str();
    let device = model
        .device_mut(id)
        .ok_or_else(|| DispatchError::UnknownDevice(id.to_string()))?;
    if !field.write(device) {
        return Err(DispatchError::FieldNotApplicable {
            device: id.to_string(),
            field: field.name(),
        });
    }
    debug!(device = id, field = field.name(), "device updated");
    if let Some(r) = renderer {
        r.device_changed(model, id);
    }
    Ok(DispatchOutcome::Device(id.to_string()))
}

fn apply_power(
    event: &Event,
    model: &mut StateModel,
    renderer: Option<&mut dyn Renderer>,
) -> Result<DispatchOutcome, DispatchError> {
    let other = counterpart(event, Event::addressed_device)?;
    let power = round_half_up(event.numeric_value());
    let (source, target) = if power < 0.0 {
        (event.device_id.as_str(), other)
    } else {
        (other, event.device_id.as_str())
    };

    let id = link_id(model, source, target)?;
    if let Some(link) = model.link_mut(id) {
        link.state.power = power;
        link.power_source = Some(source.to_string());
    }
    debug!(source, target, power, "link power updated");
    if let Some(r) = renderer {
        r.link_changed(model, source, target);
    }
    Ok(DispatchOutcome::Link {
        source: source.to_string(),
        target: target.to_string(),
    })
}

fn write_link(
    event: &Event,
    model: &mut StateModel,
    renderer: Option<&mut dyn Renderer>,
    field: LinkField,
) -> Result<DispatchOutcome, DispatchError> {
    let source = event.device_id.as_str();
    let target = counterpart(event, Event::addressed_device)?;
    let value = event.numeric_value();

    let id = link_id(model, source, target)?;
    if let Some(link) = model.link_mut(id) {
        match field {
            LinkField::Requested => link.state.requested_power = value,
            LinkField::Allocated => link.state.allocated_power = value,
        }
    }
    debug!(source, target, ?field, value, "link flow updated");
    if let Some(r) = renderer {
        r.link_changed(model, source, target);
    }
    Ok(DispatchOutcome::Link {
        source: source.to_string(),
        target: target.to_string(),
    })
}

fn animate_price(
    event: &Event,
    model: &StateModel,
    renderer: Option<&mut dyn Renderer>,
) -> Result<DispatchOutcome, DispatchError> {
    let other = counterpart(event, Event::trailing_device)?;
    let (source, target) = if event.kind == EventKind::PriceMsgIn {
        (other, event.device_id.as_str())
    } else {
        (event.device_id.as_str(), other)
    };

    link_id(model, source, target)?;
    if let Some(r) = renderer {
        r.transient_message(source, target, &event.value);
    }
    Ok(DispatchOutcome::Transient {
        source: source.to_string(),
        target: target.to_string(),
    })
}
