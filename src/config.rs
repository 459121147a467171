use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::device::{self, Device, DeviceKind};
use crate::error::ConfigError;

const DEFAULT_MQTT_PORT: u16 = 1883;

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt: MqttConfig,
    pub command_profile: CommandProfile,
    pub devices: Vec<Device>,
    pub preferences_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic_prefix: String,
    pub client_id: String,
    pub connect_timeout: Duration,
    pub reconnect_interval: Duration,
}

/// How a toggle intent is sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandProfile {
    /// `ON`/`OFF` computed from the mirrored state.
    Explicit,
    /// A literal `TOGGLE`, resolved by the firmware.
    Toggle,
}

impl std::str::FromStr for CommandProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "explicit" => Ok(Self::Explicit),
            "toggle" => Ok(Self::Toggle),
            other => Err(format!("unknown command profile '{other}' (expected explicit or toggle)")),
        }
    }
}

// Serde struct for the optional device profile table
#[derive(Deserialize)]
struct RawDevice {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    kind: Option<DeviceKind>,
    #[serde(default)]
    state_topic: Option<String>,
    #[serde(default)]
    command_topic: Option<String>,
}

/// Variable lookup; `env::var` in production, a map in tests.
trait Lookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> Lookup for F {
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

fn env_required(vars: &impl Lookup, key: &'static str) -> Result<String, ConfigError> {
    env_optional(vars, key).ok_or(ConfigError::Missing(key))
}

fn env_optional(vars: &impl Lookup, key: &str) -> Option<String> {
    vars.get(key).filter(|v| !v.is_empty())
}

fn env_or_default<T: std::str::FromStr>(
    vars: &impl Lookup,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env_optional(vars, key) {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    fn from_lookup(vars: &impl Lookup) -> Result<Self, ConfigError> {
        let broker_url = env_required(vars, "MQTT_BROKER_URL")?;
        let (broker_host, broker_port) = parse_broker_url(&broker_url)?;
        let topic_prefix = env_or_default(vars, "MQTT_TOPIC_PREFIX", "home".to_string())?;

        let devices = match env_optional(vars, "DEVICES_FILE") {
            Some(path) => load_devices(&path, &topic_prefix)?,
            None => device::builtin_profile(
                &topic_prefix,
                env_or_default(vars, "STRIP_ENABLED", true)?,
            ),
        };

        let config = Self {
            mqtt: MqttConfig {
                broker_host,
                broker_port,
                username: env_optional(vars, "MQTT_USERNAME"),
                password: env_optional(vars, "MQTT_PASSWORD"),
                topic_prefix,
                client_id: env_or_default(vars, "MQTT_CLIENT_ID", "relay-dashboard".to_string())?,
                connect_timeout: Duration::from_millis(env_or_default(
                    vars,
                    "MQTT_CONNECT_TIMEOUT_MS",
                    4000u64,
                )?),
                reconnect_interval: Duration::from_millis(env_or_default(
                    vars,
                    "MQTT_RECONNECT_INTERVAL_MS",
                    4000u64,
                )?),
            },
            command_profile: env_or_default(vars, "COMMAND_PROFILE", CommandProfile::Explicit)?,
            devices,
            preferences_file: PathBuf::from(env_or_default(
                vars,
                "PREFERENCES_FILE",
                "preferences.json".to_string(),
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "MQTT_CONNECT_TIMEOUT_MS",
                message: "must be > 0".into(),
            });
        }
        if self.mqtt.reconnect_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "MQTT_RECONNECT_INTERVAL_MS",
                message: "must be > 0".into(),
            });
        }
        if self.mqtt.username.is_some() != self.mqtt.password.is_some() {
            return Err(ConfigError::Invalid {
                key: "MQTT_USERNAME",
                message: "username and password must be set together".into(),
            });
        }
        if self.devices.is_empty() {
            return Err(ConfigError::Invalid {
                key: "DEVICES_FILE",
                message: "no devices configured".into(),
            });
        }
        Ok(())
    }

    /// State topics the synchronizer subscribes to on every connect.
    pub fn state_topics(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.state_topic.clone()).collect()
    }
}

/// Split `mqtt://host[:port]` (or `tcp://`) into host and port.
fn parse_broker_url(url: &str) -> Result<(String, u16), ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: "MQTT_BROKER_URL",
        message,
    };

    let rest = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .ok_or_else(|| invalid(format!("unsupported scheme in '{url}' (expected mqtt:// or tcp://)")))?;
    let authority = rest.trim_end_matches('/');

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| invalid(format!("invalid port '{port}': {e}")))?;
            (host, port)
        }
        None => (authority, DEFAULT_MQTT_PORT),
    };
    if host.is_empty() || host.contains('/') {
        return Err(invalid(format!("invalid host in '{url}'")));
    }
    Ok((host.to_string(), port))
}

fn load_devices(path: &str, prefix: &str) -> Result<Vec<Device>, ConfigError> {
    let err = |message: String| ConfigError::Devices {
        path: path.to_string(),
        message,
    };

    let content = std::fs::read_to_string(path).map_err(|e| err(format!("failed to read: {e}")))?;
    let raw_devices: Vec<RawDevice> =
        serde_json::from_str(&content).map_err(|e| err(format!("failed to parse: {e}")))?;

    let mut ids = HashSet::new();
    let mut state_topics = HashSet::new();
    let mut devices = Vec::with_capacity(raw_devices.len());

    for raw in raw_devices {
        let id = raw.id.unwrap_or_else(|| sanitize_topic_name(&raw.name));
        if id.is_empty() {
            return Err(err(format!("device '{}' has no usable id", raw.name)));
        }
        let device = Device {
            state_topic: raw
                .state_topic
                .unwrap_or_else(|| device::state_topic(prefix, &id)),
            command_topic: raw
                .command_topic
                .unwrap_or_else(|| device::command_topic(prefix, &id)),
            kind: raw.kind.unwrap_or(DeviceKind::Power),
            name: raw.name,
            id,
        };
        if !ids.insert(device.id.clone()) {
            return Err(err(format!("duplicate device id '{}'", device.id)));
        }
        if !state_topics.insert(device.state_topic.clone()) {
            return Err(err(format!("duplicate state topic '{}'", device.state_topic)));
        }
        devices.push(device);
    }
    Ok(devices)
}

/// Convert a device name into a safe MQTT topic segment.
/// "Desk Lamp" → "desk_lamp"
fn sanitize_topic_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_with_only_broker_url() {
        let config = Config::from_lookup(&lookup(&[("MQTT_BROKER_URL", "mqtt://broker.local")])).unwrap();
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.mqtt.connect_timeout, Duration::from_millis(4000));
        assert_eq!(config.mqtt.reconnect_interval, Duration::from_millis(4000));
        assert_eq!(config.command_profile, CommandProfile::Explicit);
        assert_eq!(
            config.state_topics(),
            vec!["home/relay1/state", "home/relay2/state", "home/strip/state"]
        );
        assert_eq!(config.preferences_file, PathBuf::from("preferences.json"));
    }

    #[test]
    fn broker_url_is_required() {
        let err = Config::from_lookup(&lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("MQTT_BROKER_URL")));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(&lookup(&[
            ("MQTT_BROKER_URL", "tcp://10.0.0.5:8883/"),
            ("MQTT_USERNAME", "dash"),
            ("MQTT_PASSWORD", "secret"),
            ("MQTT_TOPIC_PREFIX", "lab"),
            ("COMMAND_PROFILE", "TOGGLE"),
            ("STRIP_ENABLED", "false"),
            ("MQTT_RECONNECT_INTERVAL_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(config.mqtt.broker_host, "10.0.0.5");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.mqtt.username.as_deref(), Some("dash"));
        assert_eq!(config.command_profile, CommandProfile::Toggle);
        assert_eq!(config.mqtt.reconnect_interval, Duration::from_millis(250));
        assert_eq!(config.state_topics(), vec!["lab/relay1/state", "lab/relay2/state"]);
    }

    #[test]
    fn rejects_bad_values() {
        let cases: &[&[(&str, &str)]] = &[
            &[("MQTT_BROKER_URL", "ws://broker:9001")],
            &[("MQTT_BROKER_URL", "mqtt://:1883")],
            &[("MQTT_BROKER_URL", "mqtt://broker:notaport")],
            &[("MQTT_BROKER_URL", "mqtt://broker"), ("COMMAND_PROFILE", "maybe")],
            &[("MQTT_BROKER_URL", "mqtt://broker"), ("MQTT_CONNECT_TIMEOUT_MS", "0")],
            &[("MQTT_BROKER_URL", "mqtt://broker"), ("MQTT_USERNAME", "only-user")],
        ];
        for case in cases {
            assert!(Config::from_lookup(&lookup(case)).is_err(), "{case:?}");
        }
    }

    #[test]
    fn loads_device_profile_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "Desk Lamp"}},
                {{"id": "porch", "name": "Porch Strip", "kind": "color",
                  "state_topic": "porch/light/status"}}
            ]"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = Config::from_lookup(&lookup(&[
            ("MQTT_BROKER_URL", "mqtt://broker"),
            ("DEVICES_FILE", path.as_str()),
        ]))
        .unwrap();

        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].id, "desk_lamp");
        assert_eq!(config.devices[0].kind, DeviceKind::Power);
        assert_eq!(config.devices[0].command_topic, "home/desk_lamp/set");
        assert_eq!(config.devices[1].state_topic, "porch/light/status");
        assert_eq!(config.devices[1].command_topic, "home/porch/set");
        assert!(config.devices[1].supports_color());
    }

    #[test]
    fn rejects_duplicate_devices() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "a"}}, {{"id": "a", "name": "other"}}]"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let err = Config::from_lookup(&lookup(&[
            ("MQTT_BROKER_URL", "mqtt://broker"),
            ("DEVICES_FILE", path.as_str()),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Devices { .. }));
    }

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_topic_name("Desk Lamp"), "desk_lamp");
        assert_eq!(sanitize_topic_name("  Strip #2 "), "strip__2");
    }
}
