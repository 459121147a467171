
use std::fmt;

use crate::color::{NamedColor, RgbColor};
use crate::device::DeviceKind;

const PAYLOAD_ON: &str = "ON";
const PAYLOAD_OFF: &str = "OFF";

/// Connection as seen by the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        *self == Self::Connected
    }

    /// Text for the connection indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Connected => "MQTT Server Connected",
            Self::Disconnected => "MQTT Server Disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Last known state of one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceState {
    pub power: bool,
    /// Only ever set for color-capable devices.
    pub color: Option<RgbColor>,
}

impl DeviceState {
    /// Applies an update, returning whether anything changed.
    pub fn apply(&mut self, update: StateUpdate) -> bool {
        let before = *self;
        match update {
            StateUpdate::Power(on) => self.power = on,
            StateUpdate::Color(color) => self.color = Some(color),
        }
        *self != before
    }
}

/// A single change read from a state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateUpdate {
    Power(bool),
    Color(RgbColor),
}

impl StateUpdate {
    /// Reads a state payload for a device of the given kind.
    ///
    /// Power-only devices accept every payload: exactly `"ON"` is on,
    /// anything else is off. Color devices return `None` for payloads they
    /// cannot interpret, leaving the mirror untouched.
    pub fn parse(kind: DeviceKind, payload: &str) -> Option<Self> {
        match kind {
            DeviceKind::Power => Some(Self::Power(payload == PAYLOAD_ON)),
            DeviceKind::Color => match payload {
                PAYLOAD_ON => Some(Self::Power(true)),
                PAYLOAD_OFF => Some(Self::Power(false)),
                p if p.starts_with("rgb:") => RgbColor::from_payload(p).ok().map(Self::Color),
                p => p.parse::<NamedColor>().ok().map(|c| Self::Color(c.rgb())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_devices_only_accept_literal_on() {
        assert_eq!(
            StateUpdate::parse(DeviceKind::Power, "ON"),
            Some(StateUpdate::Power(true))
        );
        for payload in ["", "1", "true", "on", "On", "OFF", "TOGGLE", " ON"] {
            assert_eq!(
                StateUpdate::parse(DeviceKind::Power, payload),
                Some(StateUpdate::Power(false)),
                "payload {payload:?}"
            );
        }
    }

    #[test]
    fn color_devices_read_power_and_color() {
        assert_eq!(
            StateUpdate::parse(DeviceKind::Color, "OFF"),
            Some(StateUpdate::Power(false))
        );
        assert_eq!(
            StateUpdate::parse(DeviceKind::Color, "rgb:255,165,0"),
            Some(StateUpdate::Color(RgbColor::new(255, 165, 0)))
        );
        assert_eq!(
            StateUpdate::parse(DeviceKind::Color, "magenta"),
            Some(StateUpdate::Color(RgbColor::new(255, 0, 255)))
        );
    }

    #[test]
    fn color_devices_ignore_unreadable_payloads() {
        for payload in ["rgb:300,0,0", "rgb:1,2", "orange", "", "true"] {
            assert_eq!(
                StateUpdate::parse(DeviceKind::Color, payload),
                None,
                "payload {payload:?}"
            );
        }
    }

    #[test]
    fn power_update_keeps_color() {
        let mut state = DeviceState {
            power: false,
            color: Some(RgbColor::new(1, 2, 3)),
        };
        assert!(state.apply(StateUpdate::Power(true)));
        assert_eq!(state.color, Some(RgbColor::new(1, 2, 3)));
        assert!(!state.apply(StateUpdate::Power(true)));
    }

    #[test]
    fn connection_labels() {
        assert_eq!(ConnectionState::default(), ConnectionState::Connecting);
        assert_eq!(
            ConnectionState::Disconnected.to_string(),
            "MQTT Server Disconnected"
        );
        assert!(ConnectionState::Connected.is_connected());
    }
}
