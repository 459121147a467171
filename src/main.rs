mod color;
mod config;
mod console;
mod device;
mod error;
mod mqtt;
mod preferences;
mod render;
mod state;
mod sync;

use std::time::Duration;

use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::mqtt::client::MqttClient;
use crate::preferences::PreferenceStore;
use crate::render::ConsoleRenderer;
use crate::sync::{Input, Synchronizer};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting relay-dashboard (mqtt={}:{}, devices={}, commands={:?})",
        config.mqtt.broker_host,
        config.mqtt.broker_port,
        config.devices.len(),
        config.command_profile,
    );

    for device in &config.devices {
        info!(
            "  Device: {} ({}, {:?}) state={} command={}",
            device.name, device.id, device.kind, device.state_topic, device.command_topic,
        );
    }
    info!(
        "State topics (prefix {}): {}",
        config.mqtt.topic_prefix,
        config.state_topics().join(", ")
    );

    let preferences = match PreferenceStore::load(&config.preferences_file) {
        Ok(p) => p,
        Err(e) => {
            warn!("{}; using default preferences", e);
            PreferenceStore::with_defaults(&config.preferences_file)
        }
    };
    info!(
        "Theme: {} (from {})",
        preferences.theme().as_str(),
        preferences.path().display()
    );

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to register SIGTERM handler: {}", e);
            std::process::exit(1);
        }
    };

    // Transport events and console intents share one channel
    let (input_tx, mut input_rx) = mpsc::channel::<Input>(100);

    let mqtt_client = MqttClient::new(&config.mqtt);
    let mqtt_handle = mqtt_client.handle();
    let mut mqtt_task = tokio::spawn(mqtt_client.run(input_tx.clone()));
    let console_task = tokio::spawn(console::run(input_tx, preferences));

    let mut synchronizer = Synchronizer::new(
        config.devices.clone(),
        config.command_profile,
        mqtt_handle.clone(),
        ConsoleRenderer::new(std::io::stdout()),
    );
    synchronizer.dispatch(Input::Snapshot);

    // Dispatch loop: every input runs to completion before the next
    loop {
        tokio::select! {
            Some(input) = input_rx.recv() => {
                synchronizer.dispatch(input);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    // Cleanup
    console_task.abort();
    if let Err(e) = mqtt_handle.disconnect() {
        warn!("Failed to request MQTT disconnect: {}", e);
    }
    if tokio::time::timeout(Duration::from_millis(500), &mut mqtt_task)
        .await
        .is_err()
    {
        mqtt_task.abort();
    }
    info!("relay-dashboard stopped");
}
