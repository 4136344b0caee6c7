//! Environment configuration for the bridge node.

use eyre::{Result, WrapErr, ensure};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Runtime configuration, read from environment variables.
///
/// Key names are the field names uppercased (`MQTT_BROKER_HOST`, `BUS_CID`,
/// ...); every key has a default matching the bus's standard deployment, so
/// the node starts with no environment at all.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// MQTT broker host.
    #[serde(default = "default_broker_host")]
    pub mqtt_broker_host: String,

    /// MQTT broker port.
    #[serde(default = "default_broker_port")]
    pub mqtt_broker_port: u16,

    /// MQTT client id; derived from the process id when unset.
    #[serde(default)]
    pub mqtt_client_id: Option<String>,

    /// Broker transport; only `tcp` is supported.
    #[serde(default = "default_transport")]
    pub mqtt_transport: String,

    /// Enable TLS on the broker link.
    #[serde(default)]
    pub mqtt_tls: bool,

    /// CA certificate (PEM) for the TLS broker link.
    #[serde(default)]
    pub mqtt_tls_ca: Option<PathBuf>,

    /// Broker username.
    #[serde(default)]
    pub mqtt_user: Option<String>,

    /// Broker password.
    #[serde(default)]
    pub mqtt_password: Option<String>,

    /// Topic the combined fixes are published on.
    #[serde(default = "default_base_topic")]
    pub mqtt_base_topic: String,

    /// Broker keep-alive interval, e.g. `30s`.
    #[serde(with = "humantime_serde", default = "default_keep_alive")]
    pub mqtt_keep_alive: Duration,

    /// Bus channel id; selects the multicast group to join.
    #[serde(default = "default_bus_cid")]
    pub bus_cid: u8,

    /// Bus message id carrying position readings.
    #[serde(default = "default_position_id")]
    pub bus_position_id: u32,

    /// Bus message id carrying heading readings.
    #[serde(default = "default_heading_id")]
    pub bus_heading_id: u32,

    /// Bus message id carrying ground-speed readings.
    #[serde(default = "default_ground_speed_id")]
    pub bus_ground_speed_id: u32,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Read and validate the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let config: Config =
            envy::from_env().wrap_err("failed to read configuration from the environment")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.mqtt_base_topic.is_empty(),
            "MQTT_BASE_TOPIC cannot be empty"
        );
        ensure!(self.mqtt_broker_port != 0, "MQTT_BROKER_PORT cannot be zero");
        ensure!(
            self.mqtt_transport == "tcp",
            "unsupported MQTT_TRANSPORT '{}', only 'tcp' is available",
            self.mqtt_transport
        );
        ensure!(
            !self.mqtt_tls || self.mqtt_tls_ca.is_some(),
            "MQTT_TLS requires MQTT_TLS_CA to point at the broker CA certificate"
        );
        ensure!(
            !self.mqtt_keep_alive.is_zero(),
            "MQTT_KEEP_ALIVE cannot be zero"
        );

        let ids = [
            self.bus_position_id,
            self.bus_heading_id,
            self.bus_ground_speed_id,
        ];
        ensure!(
            ids[0] != ids[1] && ids[0] != ids[2] && ids[1] != ids[2],
            "bus message ids must be distinct, got {ids:?}"
        );

        Ok(())
    }
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_transport() -> String {
    "tcp".to_string()
}

fn default_base_topic() -> String {
    "CROWSNEST/SEAHORSE/GNSS/0/JSON".to_string()
}

fn default_keep_alive() -> Duration {
    Duration::from_secs(30)
}

fn default_bus_cid() -> u8 {
    65
}

fn default_position_id() -> u32 {
    19
}

fn default_heading_id() -> u32 {
    1051
}

fn default_ground_speed_id() -> u32 {
    1046
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(vars: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::from_iter(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_defaults_with_empty_environment() {
        let config = parse(&[]).unwrap();
        config.validate().unwrap();

        assert_eq!(config.mqtt_broker_host, "localhost");
        assert_eq!(config.mqtt_broker_port, 1883);
        assert_eq!(config.mqtt_base_topic, "CROWSNEST/SEAHORSE/GNSS/0/JSON");
        assert_eq!(config.mqtt_keep_alive, Duration::from_secs(30));
        assert!(!config.mqtt_tls);
        assert_eq!(config.bus_cid, 65);
        assert_eq!(
            (
                config.bus_position_id,
                config.bus_heading_id,
                config.bus_ground_speed_id
            ),
            (19, 1051, 1046)
        );
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_full_override_set() {
        let config = parse(&[
            ("MQTT_BROKER_HOST", "broker.example.com"),
            ("MQTT_BROKER_PORT", "8883"),
            ("MQTT_CLIENT_ID", "bridge-1"),
            ("MQTT_TLS", "true"),
            ("MQTT_TLS_CA", "/etc/ssl/bus-ca.pem"),
            ("MQTT_USER", "nav"),
            ("MQTT_PASSWORD", "secret"),
            ("MQTT_BASE_TOPIC", "FLEET/VESSEL/GNSS/1/JSON"),
            ("MQTT_KEEP_ALIVE", "1m"),
            ("BUS_CID", "111"),
            ("BUS_POSITION_ID", "20"),
            ("BUS_HEADING_ID", "21"),
            ("BUS_GROUND_SPEED_ID", "22"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.mqtt_broker_host, "broker.example.com");
        assert_eq!(config.mqtt_broker_port, 8883);
        assert_eq!(config.mqtt_client_id.as_deref(), Some("bridge-1"));
        assert!(config.mqtt_tls);
        assert_eq!(config.mqtt_keep_alive, Duration::from_secs(60));
        assert_eq!(config.bus_cid, 111);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_rejects_non_tcp_transport() {
        let config = parse(&[("MQTT_TRANSPORT", "websocket")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_tls_without_ca() {
        let config = parse(&[("MQTT_TLS", "true")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_message_ids() {
        let config = parse(&[("BUS_HEADING_ID", "19")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_topic() {
        let config = parse(&[("MQTT_BASE_TOPIC", "")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unparsable_port() {
        assert!(parse(&[("MQTT_BROKER_PORT", "not-a-port")]).is_err());
    }
}
