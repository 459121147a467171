use chrono::{DateTime, Local};
use tracing::{debug, error, info, warn};

use crate::config::CommandProfile;
use crate::device::Device;
use crate::error::{CommandError, TransportError};
use crate::mqtt::{Transport, TransportEvent};
use crate::render::Render;
use crate::state::{ConnectionState, DeviceState, StateUpdate};

use super::{Input, Intent, PowerCommand};

/// Mirrors the state of every configured device and turns user intents into
/// commands.
///
/// Mirrors change only when the device reports its state; issuing a command
/// never touches them. Connection state follows transport events alone.
pub struct Synchronizer<T, R> {
    devices: Vec<Device>,
    // Parallel to `devices`.
    mirrors: Vec<DeviceState>,
    // When each device last reported, accepted or not changed.
    reported_at: Vec<Option<DateTime<Local>>>,
    clock: Box<dyn FnMut() -> DateTime<Local>>,
    connection: ConnectionState,
    profile: CommandProfile,
    transport: T,
    renderer: R,
}

impl<T: Transport, R: Render> Synchronizer<T, R> {
    pub fn new(devices: Vec<Device>, profile: CommandProfile, transport: T, renderer: R) -> Self {
        let mirrors = vec![DeviceState::default(); devices.len()];
        let reported_at = vec![None; devices.len()];
        Self {
            devices,
            mirrors,
            reported_at,
            clock: Box::new(Local::now),
            connection: ConnectionState::default(),
            profile,
            transport,
            renderer,
        }
    }

    #[cfg(test)]
    fn with_clock(mut self, clock: impl FnMut() -> DateTime<Local> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Handle one input to completion.
    pub fn dispatch(&mut self, input: Input) {
        match input {
            Input::Transport(event) => self.handle_transport(event),
            Input::Intent(intent) => {
                if let Err(e) = self.handle_intent(intent) {
                    warn!("Command rejected: {}", e);
                }
            }
            Input::Snapshot => self.render_all(),
        }
    }

    fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                if self.connection.is_connected() {
                    debug!("Connect event while already connected, not resubscribing");
                    return;
                }
                self.set_connection(ConnectionState::Connected);
                self.subscribe_all();
            }
            TransportEvent::Reconnecting => {
                if self.connection.is_connected() {
                    self.set_connection(ConnectionState::Disconnected);
                }
                self.set_connection(ConnectionState::Connecting);
            }
            TransportEvent::Disconnected => {
                self.set_connection(ConnectionState::Disconnected);
            }
            TransportEvent::Error(TransportError::SubscriptionFailure(reason)) => {
                // The session itself is still up; mirrors stay stale until the
                // next reconnect resubscribes.
                error!("Subscription failed: {}", reason);
            }
            TransportEvent::Error(e) => {
                warn!("Transport error: {}", e);
                self.set_connection(ConnectionState::Disconnected);
            }
            TransportEvent::Message { topic, payload } => {
                self.handle_message(&topic, &payload);
            }
        }
    }

    fn handle_message(&mut self, topic: &str, payload: &str) {
        let Some(idx) = self.devices.iter().position(|d| d.state_topic == topic) else {
            debug!("Ignoring message on unknown topic {}", topic);
            return;
        };
        let device = &self.devices[idx];

        let Some(update) = StateUpdate::parse(device.kind, payload) else {
            debug!("Ignoring unreadable payload for {}: {:?}", device.id, payload);
            return;
        };

        let reported_at = (self.clock)();
        self.reported_at[idx] = Some(reported_at);

        let mirror = &mut self.mirrors[idx];
        if mirror.apply(update) {
            info!("{} is now {:?}", device.id, mirror);
        } else {
            debug!("{} unchanged by {:?}", device.id, payload);
        }
        self.renderer.device(device, mirror, Some(reported_at));
    }

    fn handle_intent(&mut self, intent: Intent) -> Result<(), CommandError> {
        let idx = self
            .devices
            .iter()
            .position(|d| d.id == intent.device_id())
            .ok_or_else(|| CommandError::UnknownDevice(intent.device_id().to_string()))?;
        let device = &self.devices[idx];

        let payload = match intent {
            Intent::Toggle(_) => match self.profile {
                CommandProfile::Toggle => PowerCommand::Toggle,
                CommandProfile::Explicit => PowerCommand::from(!self.mirrors[idx].power),
            }
            .as_str()
            .to_string(),
            Intent::SetPower(_, on) => PowerCommand::from(on).as_str().to_string(),
            Intent::SetColor(_, color) if device.supports_color() => color.to_payload(),
            Intent::SetNamedColor(_, name) if device.supports_color() => name.as_str().to_string(),
            Intent::SetColor(..) | Intent::SetNamedColor(..) => {
                return Err(CommandError::ColorUnsupported(device.id.clone()));
            }
        };

        // The client would buffer the publish until the next connect.
        if !self.connection.is_connected() {
            return Err(CommandError::NotConnected);
        }

        info!("Publishing {}: {}", device.command_topic, payload);
        self.transport.publish(&device.command_topic, &payload)?;
        Ok(())
    }

    fn subscribe_all(&mut self) {
        let topics: Vec<String> = self.devices.iter().map(|d| d.state_topic.clone()).collect();
        info!("Subscribing to {} state topics", topics.len());
        if let Err(e) = self.transport.subscribe(&topics) {
            error!("Failed to subscribe to state topics: {}", e);
        }
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if self.connection == state {
            return;
        }
        info!("Connection: {:?} -> {:?}", self.connection, state);
        self.connection = state;
        self.renderer.connection(state);
    }

    fn render_all(&mut self) {
        self.renderer.connection(self.connection);
        for ((device, mirror), reported_at) in
            self.devices.iter().zip(&self.mirrors).zip(&self.reported_at)
        {
            self.renderer.device(device, mirror, *reported_at);
        }
    }
}
