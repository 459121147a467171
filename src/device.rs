use serde::Deserialize;

/// What a device can do, and therefore how its state payloads are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// On/off only.
    Power,
    /// On/off plus an RGB color.
    Color,
}

/// Static description of one controllable endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub kind: DeviceKind,
    pub state_topic: String,
    pub command_topic: String,
}

impl Device {
    /// A device using the `{prefix}/{id}/state` and `{prefix}/{id}/set` topics.
    pub fn new(prefix: &str, id: &str, name: &str, kind: DeviceKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            state_topic: state_topic(prefix, id),
            command_topic: command_topic(prefix, id),
        }
    }

    pub fn supports_color(&self) -> bool {
        self.kind == DeviceKind::Color
    }
}

pub fn state_topic(prefix: &str, id: &str) -> String {
    format!("{prefix}/{id}/state")
}

pub fn command_topic(prefix: &str, id: &str) -> String {
    format!("{prefix}/{id}/set")
}

/// The two relays and, optionally, the RGB strip.
pub fn builtin_profile(prefix: &str, with_strip: bool) -> Vec<Device> {
    let mut devices = vec![
        Device::new(prefix, "relay1", "Relay 1", DeviceKind::Power),
        Device::new(prefix, "relay2", "Relay 2", DeviceKind::Power),
    ];
    if with_strip {
        devices.push(Device::new(prefix, "strip", "LED Strip", DeviceKind::Color));
    }
    devices
}
