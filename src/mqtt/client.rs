use std::time::Duration;

use rumqttc::{
    AsyncClient, Event, EventLoop, Incoming, MqttOptions, Outgoing, QoS, SubscribeFilter,
    SubscribeReasonCode,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::MqttConfig;
use crate::error::TransportError;
use crate::sync::Input;

use super::{Transport, TransportEvent};

const REQUEST_CAPACITY: usize = 100;

pub struct MqttClient {
    client: AsyncClient,
    eventloop: EventLoop,
    reconnect_interval: Duration,
}

/// Cloneable request side of the client, handed to the synchronizer.
#[derive(Clone)]
pub struct MqttHandle {
    client: AsyncClient,
}

impl MqttClient {
    pub fn new(config: &MqttConfig) -> Self {
        let mut mqttopts =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        mqttopts.set_keep_alive(Duration::from_secs(30));
        mqttopts.set_clean_session(true);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            mqttopts.set_credentials(user, pass);
        }

        let (client, mut eventloop) = AsyncClient::new(mqttopts, REQUEST_CAPACITY);
        eventloop
            .network_options
            .set_connection_timeout(timeout_secs(config.connect_timeout));

        Self {
            client,
            eventloop,
            reconnect_interval: config.reconnect_interval,
        }
    }

    pub fn handle(&self) -> MqttHandle {
        MqttHandle {
            client: self.client.clone(),
        }
    }

    /// Run the MQTT event loop, forwarding connection changes and incoming
    /// publishes to `input_tx`. Polling again after an error reconnects, so
    /// the loop waits `reconnect_interval` between attempts. Returns once a
    /// requested disconnect has been sent or the receiver is gone.
    pub async fn run(mut self, input_tx: mpsc::Sender<Input>) {
        let mut connected = false;

        loop {
            let event = match self.eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    info!("Disconnected from MQTT broker");
                    let _ = input_tx.send(TransportEvent::Disconnected.into()).await;
                    return;
                }
                Ok(event) => to_transport_event(&event, &mut connected),
                Err(e) => {
                    let err = connection_error(&e, &mut connected);
                    error!("MQTT connection error: {}. Reconnecting in {:?}", e, self.reconnect_interval);

                    if input_tx.send(TransportEvent::Error(err).into()).await.is_err() {
                        break;
                    }
                    tokio::time::sleep(self.reconnect_interval).await;
                    Some(TransportEvent::Reconnecting)
                }
            };

            if let Some(event) = event {
                if input_tx.send(event.into()).await.is_err() {
                    break;
                }
            }
        }
        warn!("Input channel closed, stopping MQTT event loop");
    }
}

/// Map one event loop notification; `connected` tracks whether a ConnAck
/// has been seen since the last failure.
fn to_transport_event(event: &Event, connected: &mut bool) -> Option<TransportEvent> {
    match event {
        Event::Incoming(Incoming::ConnAck(_)) => {
            info!("Connected to MQTT broker");
            *connected = true;
            Some(TransportEvent::Connected)
        }
        Event::Incoming(Incoming::Publish(publish)) => {
            let payload = String::from_utf8_lossy(&publish.payload).to_string();
            debug!("Received {}: {}", publish.topic, payload);
            Some(TransportEvent::Message {
                topic: publish.topic.clone(),
                payload,
            })
        }
        Event::Incoming(Incoming::SubAck(suback)) => {
            let rejected = suback
                .return_codes
                .iter()
                .filter(|code| matches!(code, SubscribeReasonCode::Failure))
                .count();
            (rejected > 0).then(|| {
                TransportEvent::Error(TransportError::SubscriptionFailure(format!(
                    "broker rejected {rejected} of {} topics",
                    suback.return_codes.len()
                )))
            })
        }
        Event::Incoming(Incoming::Disconnect) => {
            warn!("Broker closed the session");
            *connected = false;
            Some(TransportEvent::Disconnected)
        }
        _ => None,
    }
}

/// A failure before the first ConnAck is a connect failure; after it, a drop.
fn connection_error(e: &impl std::fmt::Display, connected: &mut bool) -> TransportError {
    let err = if *connected {
        TransportError::Dropped(e.to_string())
    } else {
        TransportError::ConnectFailure(e.to_string())
    };
    *connected = false;
    err
}

impl MqttHandle {
    /// Queue a DISCONNECT; the event loop exits once it is sent.
    pub fn disconnect(&self) -> Result<(), TransportError> {
        self.client
            .try_disconnect()
            .map_err(|e| TransportError::Publish(e.to_string()))
    }
}

impl Transport for MqttHandle {
    fn subscribe(&self, topics: &[String]) -> Result<(), TransportError> {
        let filters = topics
            .iter()
            .map(|topic| SubscribeFilter::new(topic.clone(), QoS::AtMostOnce));
        self.client
            .try_subscribe_many(filters)
            .map_err(|e| TransportError::SubscriptionFailure(e.to_string()))
    }

    fn publish(&self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map_err(|e| TransportError::Publish(e.to_string()))
    }
}

/// rumqttc takes the connection timeout in whole seconds.
fn timeout_secs(timeout: Duration) -> u64 {
    timeout.as_millis().div_ceil(1000).max(1) as u64
}
