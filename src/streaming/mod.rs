//! Streaming module - telemetry/event publication and the cloud transport

mod mqtt;
mod payload;

pub use mqtt::*;
pub use payload::*;

use std::sync::Arc;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::commands::NodeInput;
use crate::config::CloudConfig;
use crate::core::Clock;
use crate::detection::{ProximityLevel, StatusLevel};
use crate::sensors::Reading;

/// Transport faults
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound half of a cloud session
#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Opens a cloud session.
///
/// Inbound command payloads must be forwarded to `inbox` as
/// [`NodeInput::Remote`] from whatever task the transport delivers them on.
#[async_trait]
pub trait CloudConnector: Send + Sync {
    async fn connect(
        &self,
        config: &CloudConfig,
        inbox: mpsc::Sender<NodeInput>,
    ) -> Result<Arc<dyn Transport>, TransportError>;
}

/// Topics used by the publisher
#[derive(Debug, Clone)]
pub struct Topics {
    pub telemetry: String,
    pub events: String,
}

impl From<&CloudConfig> for Topics {
    fn from(config: &CloudConfig) -> Self {
        Self {
            telemetry: config.telemetry_topic.clone(),
            events: config.events_topic.clone(),
        }
    }
}

/// Builds payloads and hands them to the transport.
///
/// Every failure is logged and reported as `false`; nothing propagates.
pub struct TelemetryPublisher {
    transport: Arc<dyn Transport>,
    topics: Topics,
    device_id: String,
    clock: Arc<dyn Clock>,
}

impl TelemetryPublisher {
    pub fn new(
        transport: Arc<dyn Transport>,
        topics: Topics,
        device_id: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            topics,
            device_id: device_id.to_string(),
            clock,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Publish a telemetry snapshot; `true` only if the transport accepted it
    pub async fn publish(
        &self,
        reading: &Reading,
        status: StatusLevel,
        proximity: ProximityLevel,
    ) -> bool {
        let now = self.clock.now_ms();
        let payload = TelemetryPayload::new(&self.device_id, reading, status, proximity, now);
        match self.send(&self.topics.telemetry, &payload).await {
            Ok(()) => {
                debug!("Published telemetry: {} {}", status, proximity);
                true
            }
            Err(e) => {
                warn!("Publish error: {}", e);
                false
            }
        }
    }

    /// Publish an event notice; same contract as [`publish`](Self::publish)
    pub async fn publish_event(
        &self,
        severity: Severity,
        message: &str,
        reading: &Reading,
    ) -> bool {
        let now = self.clock.now_ms();
        let event = EventPayload::new(&self.device_id, severity, message, reading, now);
        match self.send(&self.topics.events, &event).await {
            Ok(()) => {
                debug!("Published {} event: {}", severity, message);
                true
            }
            Err(e) => {
                warn!("Event publish error: {}", e);
                false
            }
        }
    }

    async fn send<T: Serialize>(&self, topic: &str, payload: &T) -> Result<(), TransportError> {
        let json = serde_json::to_vec(payload)?;
        self.transport.publish(topic, json).await
    }
}
