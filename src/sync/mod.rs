pub mod synchronizer;

use crate::color::{NamedColor, RgbColor};
use crate::mqtt::TransportEvent;

pub use synchronizer::Synchronizer;

/// Everything the dispatch loop reacts to, funneled through one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Transport(TransportEvent),
    Intent(Intent),
    /// Re-render the connection indicator and every mirror.
    Snapshot,
}

impl From<TransportEvent> for Input {
    fn from(event: TransportEvent) -> Self {
        Self::Transport(event)
    }
}

impl From<Intent> for Input {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}

/// A user request addressed to one device by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Toggle(String),
    SetPower(String, bool),
    SetColor(String, RgbColor),
    SetNamedColor(String, NamedColor),
}

impl Intent {
    pub fn device_id(&self) -> &str {
        match self {
            Self::Toggle(id)
            | Self::SetPower(id, _)
            | Self::SetColor(id, _)
            | Self::SetNamedColor(id, _) => id,
        }
    }
}

/// Power payloads sent on a command topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerCommand {
    On,
    Off,
    Toggle,
}

impl PowerCommand {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Toggle => "TOGGLE",
        }
    }
}

impl From<bool> for PowerCommand {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}
