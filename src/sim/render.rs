//! Notification contract between the replay core and whatever draws it.

use super::event::Event;
use super::state::StateModel;

/// Receives state-change notifications from the dispatcher and scheduler.
///
/// Every callback gets read access to the model so implementations can
/// pull the fields they display.
pub trait Renderer {
    /// A device's kind-specific state was written.
    fn device_changed(&mut self, model: &StateModel, device_id: &str);

    /// The link between `a` and `b` was written.
    fn link_changed(&mut self, model: &StateModel, a: &str, b: &str);

    /// A price message travelled from `source` to `target`.
    fn transient_message(&mut self, source: &str, target: &str, value: &str);

    /// An event was dispatched while the display is enabled.
    fn event_dispatched(&mut self, _event: &Event) {}

    /// Redraws every device and link.
    fn refresh_all(&mut self, model: &StateModel) {
        for link in model.links() {
            self.link_changed(model, &link.endpoints.0, &link.endpoints.1);
        }
        for device in model.devices() {
            self.device_changed(model, &device.id);
        }
    }
}

/// Discards every notification.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn device_changed(&mut self, _model: &StateModel, _device_id: &str) {}
    fn link_changed(&mut self, _model: &StateModel, _a: &str, _b: &str) {}
    fn transient_message(&mut self, _source: &str, _target: &str, _value: &str) {}
}

/// A single notification as seen by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Device(String),
    Link(String, String),
    Transient {
        source: String,
        target: String,
        value: String,
    },
    Event(String),
    RefreshAll,
}

/// Records notifications in order.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub notifications: Vec<Notification>,
}

impl RecordingRenderer {
    /// Removes and returns everything recorded so far.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn refresh_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|n| matches!(n, Notification::RefreshAll))
            .count()
    }
}

impl Renderer for RecordingRenderer {
    fn device_changed(&mut self, _model: &StateModel, device_id: &str) {
        self.notifications
            .push(Notification::Device(device_id.to_string()));
    }

    fn link_changed(&mut self, _model: &StateModel, a: &str, b: &str) {
        self.notifications
            .push(Notification::Link(a.to_string(), b.to_string()));
    }

    fn transient_message(&mut self, source: &str, target: &str, value: &str) {
        self.notifications.push(Notification::Transient {
            source: source.to_string(),
            target: target.to_string(),
            value: value.to_string(),
        });
    }

    fn event_dispatched(&mut self, event: &Event) {
        self.notifications.push(Notification::Event(event.format()));
    }

    fn refresh_all(&mut self, _model: &StateModel) {
        self.notifications.push(Notification::RefreshAll);
    }
}
