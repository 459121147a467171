use thiserror::Error;

/// Failures reported by the MQTT transport. None of them are fatal: the
/// event loop keeps reconnecting and the synchronizer only reflects them in
/// the connection state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to connect to broker: {0}")]
    ConnectFailure(String),

    #[error("connection to broker dropped: {0}")]
    Dropped(String),

    #[error("subscription failed: {0}")]
    SubscriptionFailure(String),

    #[error("failed to queue publish: {0}")]
    Publish(String),
}

/// Reasons a user intent could not be turned into a published command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    #[error("device {0} does not support color")]
    ColorUnsupported(String),

    #[error("not connected to broker")]
    NotConnected,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("not an rgb payload: {0:?}")]
    NotRgb(String),

    #[error("unknown color name: {0}")]
    UnknownName(String),

    #[error("expected 3 color components, got {0}")]
    ComponentCount(usize),

    #[error("invalid color component: {0:?}")]
    InvalidComponent(String),

    #[error("color component {0} is out of range [0, 255]")]
    OutOfRange(u32),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("device profile {path}: {message}")]
    Devices { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to access preferences file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse preferences file: {0}")]
    Json(#[from] serde_json::Error),
}
