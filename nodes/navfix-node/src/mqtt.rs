//! MQTT sink: client setup, the broker event loop, and the publish loop.

use crate::config::Config;
use eyre::{Result, WrapErr, bail};
use navfix_core::OutputEnvelope;
use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration, Transport,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Delay before polling the broker link again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the client's internal request queue.
const REQUEST_QUEUE_CAPACITY: usize = 10;

/// A single envelope that could not be handed to the broker.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize the envelope")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to hand the envelope to the broker")]
    Send(#[from] rumqttc::ClientError),
}

/// Build the MQTT client from configuration.
///
/// The connection itself is established lazily by [`drive`]; only reading
/// the CA certificate can fail here.
pub fn connect(config: &Config) -> Result<(AsyncClient, EventLoop)> {
    let mut options = MqttOptions::new(
        client_id(config),
        &config.mqtt_broker_host,
        config.mqtt_broker_port,
    );
    options.set_keep_alive(config.mqtt_keep_alive);

    if let (Some(user), Some(password)) = (&config.mqtt_user, &config.mqtt_password) {
        options.set_credentials(user, password);
    }

    if config.mqtt_tls {
        let Some(ca_path) = &config.mqtt_tls_ca else {
            bail!("MQTT_TLS is set but MQTT_TLS_CA is missing");
        };
        let ca = std::fs::read(ca_path).wrap_err_with(|| {
            format!(
                "failed to read the broker CA certificate at {}",
                ca_path.display()
            )
        })?;
        options.set_transport(Transport::Tls(TlsConfiguration::Simple {
            ca,
            alpn: None,
            client_auth: None,
        }));
    }

    Ok(AsyncClient::new(options, REQUEST_QUEUE_CAPACITY))
}

/// Drive the broker event loop.
///
/// Connection errors are logged and the link re-polled after a short
/// delay; delivery stays at-most-once regardless of link state.
pub async fn drive(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => info!("connected to the MQTT broker"),
            Ok(_) => {}
            Err(err) => {
                warn!(cause = %err, "MQTT connection error");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Publish every envelope arriving on `envelopes` to `topic`.
///
/// At-most-once: a failed publish is logged and the envelope dropped, no
/// retry, nothing published in its place.
pub async fn publish_envelopes(
    client: AsyncClient,
    topic: String,
    envelopes: flume::Receiver<OutputEnvelope>,
) {
    while let Ok(envelope) = envelopes.recv_async().await {
        if let Err(err) = publish_one(&client, &topic, &envelope).await {
            warn!(cause = %err, "dropping an envelope the broker did not take");
        }
    }
    debug!("envelope channel closed, stopping the publisher");
}

async fn publish_one(
    client: &AsyncClient,
    topic: &str,
    envelope: &OutputEnvelope,
) -> Result<(), PublishError> {
    let payload = serde_json::to_vec(envelope)?;
    debug!(topic, bytes = payload.len(), "publishing a fix envelope");
    client
        .publish(topic, QoS::AtMostOnce, false, payload)
        .await?;
    Ok(())
}

/// The configured client id, or one derived from the process id so that
/// parallel bridges do not evict each other's sessions.
fn client_id(config: &Config) -> String {
    config
        .mqtt_client_id
        .clone()
        .unwrap_or_else(|| format!("navfix-{}", std::process::id()))
}
