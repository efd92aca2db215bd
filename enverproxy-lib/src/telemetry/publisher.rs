//! MQTT telemetry publishing: spec.md §4.4.
//!
//! Grounded on the `rumqttc` usage in the corpus's EG4/thin-edge bridge
//! examples rather than invented from scratch — no repo in the teacher
//! itself publishes MQTT, so this is an enrichment pulled from
//! `other_examples/`.

use async_trait::async_trait;
use rumqttc::{AsyncClient, ClientError, Event, MqttOptions, Packet, QoS};
use tracing::{debug, warn};

use crate::config::Config;

/// Abstraction over "publish a telemetry payload somewhere", so
/// `Session` doesn't depend on `rumqttc` types directly and tests can
/// substitute a recording stub.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: String, payload: String) -> Result<(), PublishError>;
}

#[derive(Debug, thiserror::Error)]
#[error("mqtt publish failed: {0}")]
pub struct PublishError(#[from] ClientError);

/// `Publisher` backed by a live `rumqttc` client. The event loop is drained
/// on a background task for the client's whole lifetime, which is the
/// pattern `rumqttc` itself documents: `AsyncClient::publish` only enqueues
/// the packet, nothing is sent until `EventLoop::poll` is driven.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Connect to the broker named in `config` and spawn the background
    /// poll loop. QoS 0, no retain: spec.md §4.4 asks for fire-and-forget
    /// delivery, matching the device's own one-way telemetry stream.
    pub fn connect(config: &Config) -> Self {
        let (host, port) = config.mqtt_addr();
        let mut options = MqttOptions::new("enverproxy", host, port);
        options.set_credentials(config.mqtt_user.clone(), config.mqtt_password.clone());
        options.set_keep_alive(std::time::Duration::from_secs(30));

        let (client, mut event_loop) = AsyncClient::new(options, 64);

        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        debug!("connected to mqtt broker");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "mqtt event loop error, retrying");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self { client }
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: String, payload: String) -> Result<(), PublishError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(PublishError)
    }
}
