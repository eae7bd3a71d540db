//! [`IrBackend`] that forwards transmissions to an emitter bridge over MQTT.
//!
//! The bridge firmware owns the LED. The pin topic is retained so a bridge
//! that reconnects picks up the last configured pin.

use async_trait::async_trait;
use irremote_core::{encoded_topic, pin_topic, raw_topic, status_topic, BackendError, IrBackend, ProtocolFamily};
use rumqttc::{ClientError, QoS};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::{BridgeEvent, MqttService};

#[derive(Debug, Serialize, PartialEq)]
pub struct RawPayload<'a> {
    pub frequencia: u8,
    pub dados: &'a [u16],
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EncodedPayload {
    pub protocolo: ProtocolFamily,
    pub address: u16,
    pub function: u16,
    pub repeat: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle: Option<bool>,
}

#[derive(Clone)]
pub struct MqttEmitter {
    mqtt: MqttService,
    emitter_id: String,
}

impl MqttEmitter {
    pub fn new(mqtt: MqttService, emitter_id: impl Into<String>) -> Self {
        Self { mqtt, emitter_id: emitter_id.into() }
    }

    /// Subscribes to the bridge's status topic and logs whatever it reports.
    pub async fn watch_status(&self) -> Result<JoinHandle<()>, BackendError> {
        let mut events = self.mqtt.events();
        let topic = status_topic(&self.emitter_id);
        self.mqtt
            .subscribe(&topic, QoS::AtMostOnce)
            .await
            .map_err(transport)?;

        Ok(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(BridgeEvent::Publish { topic: t, payload }) if t == topic => {
                        debug!(status = %String::from_utf8_lossy(&payload), "emitter bridge status");
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => debug!(skipped = n, "status watcher lagged"),
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }

    async fn send(&self, topic: &str, retain: bool, payload: Vec<u8>) -> Result<(), BackendError> {
        if !self.mqtt.is_ready() {
            return Err(BackendError::Unavailable);
        }
        debug!(topic, bytes = payload.len(), "publishing to emitter bridge");
        self.mqtt
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(transport)
    }
}

fn transport(err: ClientError) -> BackendError {
    BackendError::Transport(err.to_string())
}

#[async_trait]
impl IrBackend for MqttEmitter {
    async fn configure_output_pin(&self, pin: u8) -> Result<(), BackendError> {
        self.send(&pin_topic(&self.emitter_id), true, pin.to_string().into_bytes()).await
    }

    async fn transmit_raw(&self, pulses: &[u16], frequency_khz: u8) -> Result<(), BackendError> {
        let body = serde_json::to_vec(&RawPayload { frequencia: frequency_khz, dados: pulses })?;
        self.send(&raw_topic(&self.emitter_id), false, body).await
    }

    async fn transmit_encoded(
        &self,
        family: ProtocolFamily,
        address: u16,
        function: u16,
        repeat: u8,
        toggle: Option<bool>,
    ) -> Result<(), BackendError> {
        let body = serde_json::to_vec(&EncodedPayload { protocolo: family, address, function, repeat, toggle })?;
        self.send(&encoded_topic(&self.emitter_id), false, body).await
    }

    fn is_ready(&self) -> bool {
        self.mqtt.is_ready()
    }

    fn name(&self) -> &'static str {
        "mqtt"
    }
}
