pub mod client;

use crate::error::TransportError;

/// Something the transport observed, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Reconnecting,
    Disconnected,
    Error(TransportError),
    Message { topic: String, payload: String },
}

/// Outbound half of the transport: both calls only queue a request and
/// never wait on the network.
pub trait Transport {
    /// Results arrive later as SUBACKs; rejections surface as
    /// [`TransportError::SubscriptionFailure`] events.
    fn subscribe(&self, topics: &[String]) -> Result<(), TransportError>;

    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError>;
}
