// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Main node engine - connection bring-up and the fixed-period loop

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::{Clock, NodeExit, NodeState, RunState};
use crate::alerts::{chirps, AlertDispatcher, AlertOutput, AlertProfile};
use crate::commands::{Button, CommandHandler, NodeInput, SystemControl};
use crate::config::Config;
use crate::detection::{classify, ProximityLevel, StatusLevel};
use crate::display::{DashboardFrame, Display, LinkStatus};
use crate::network::{connect_with_retry, Credentials, NetworkLink};
use crate::sensors::{Reading, SensorHardware, SensorReader};
use crate::streaming::{CloudConnector, Severity, TelemetryPublisher, Topics};

/// Capacity of the input channel shared by the transport and the buttons
const INBOX_CAPACITY: usize = 32;

/// Everything the engine talks to outside itself
pub struct Collaborators {
    pub hardware: Box<dyn SensorHardware>,
    pub display: Box<dyn Display>,
    pub alerts: Box<dyn AlertOutput>,
    pub network: Box<dyn NetworkLink>,
    pub cloud: Arc<dyn CloudConnector>,
    pub system: Arc<dyn SystemControl>,
    pub clock: Arc<dyn Clock>,
}

/// Outcome of one loop iteration
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub reading: Reading,
    pub status: StatusLevel,
    pub proximity: ProximityLevel,
    /// An alarm event was accepted by the transport
    pub event_published: bool,
    /// Telemetry was accepted by the transport
    pub telemetry_published: bool,
}

/// The sensor node
pub struct Engine {
    config: Arc<Config>,
    reader: SensorReader,
    alerts: AlertDispatcher,
    display: Box<dyn Display>,
    network: Box<dyn NetworkLink>,
    cloud: Arc<dyn CloudConnector>,
    system: Arc<dyn SystemControl>,
    clock: Arc<dyn Clock>,
    publisher: Option<TelemetryPublisher>,
    state: RunState,
    node_state: NodeState,
    links: LinkStatus,
    inbox_tx: mpsc::Sender<NodeInput>,
    inbox: mpsc::Receiver<NodeInput>,
}

impl Engine {
    pub fn new(config: Config, parts: Collaborators) -> Self {
        let config = Arc::new(config);
        let reader = SensorReader::new(parts.hardware, config.sensors.clone());
        let alerts = AlertDispatcher::new(parts.alerts, AlertProfile::default())
            .muted(config.alerts.muted);
        let (inbox_tx, inbox) = mpsc::channel(INBOX_CAPACITY);

        Self {
            config,
            reader,
            alerts,
            display: parts.display,
            network: parts.network,
            cloud: parts.cloud,
            system: parts.system,
            clock: parts.clock,
            publisher: None,
            state: RunState::default(),
            node_state: NodeState::Init,
            links: LinkStatus::default(),
            inbox_tx,
            inbox,
        }
    }

    /// Sender for button presses and other local input
    pub fn inputs(&self) -> mpsc::Sender<NodeInput> {
        self.inbox_tx.clone()
    }

    pub fn node_state(&self) -> NodeState {
        self.node_state
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn links(&self) -> LinkStatus {
        self.links
    }

    /// Bring up the network and, if that works, the cloud session.
    ///
    /// Returns [`NodeState::Online`] or [`NodeState::Offline`]. A failed cloud
    /// session still counts as online; it is not retried.
    pub async fn start(&mut self) -> NodeState {
        info!("Starting node {}", self.config.node.device_id);
        self.node_state = NodeState::Connecting;

        if self.config.network.offline {
            info!("Network disabled by configuration, running offline");
            self.node_state = NodeState::Offline;
            return self.node_state;
        }

        self.display.show_status("Connecting WiFi...");
        let credentials = Credentials::from(&self.config.network);
        let attempts = self.config.network.connect_attempts;
        let delay = Duration::from_millis(self.config.network.connect_retry_delay_ms);

        let display = &mut self.display;
        let associated = connect_with_retry(
            self.network.as_mut(),
            &credentials,
            attempts,
            delay,
            |n| display.show_status(&format!("WiFi... {}", n)),
        )
        .await;

        self.links.wifi = associated;
        if !associated {
            self.display.show_status("WiFi FAILED");
            self.node_state = NodeState::Offline;
            return self.node_state;
        }

        self.node_state = NodeState::Online;
        self.connect_cloud().await;
        self.node_state
    }

    async fn connect_cloud(&mut self) {
        if !self.config.cloud.enabled {
            info!("Cloud disabled by configuration");
            return;
        }

        self.display.show_status("Connecting cloud...");
        match self.cloud.connect(&self.config.cloud, self.inbox_tx.clone()).await {
            Ok(transport) => {
                let publisher = TelemetryPublisher::new(
                    transport,
                    Topics::from(&self.config.cloud),
                    &self.config.node.device_id,
                    self.clock.clone(),
                );
                self.links.cloud = true;
                self.display.show_status("CONNECTED");
                publisher
                    .publish_event(Severity::Info, "Device connected", &self.reader.current())
                    .await;
                self.publisher = Some(publisher);
            }
            Err(e) => {
                warn!("Cloud connect error: {}", e);
                self.links.cloud = false;
                self.display.show_status("CLOUD ERROR");
            }
        }
    }

    /// Run until a fatal error or a restart request
    pub async fn run(&mut self) -> Result<NodeExit> {
        if self.start().await == NodeState::Offline {
            return self.run_offline().await;
        }

        self.node_state = NodeState::Running;
        info!("Node running");
        let tick = Duration::from_millis(self.config.node.tick_ms);

        loop {
            if let Err(e) = self.tick().await {
                return Err(self.fatal(e));
            }

            if self.system.restart_requested() {
                info!("Restart requested, leaving main loop");
                return Ok(NodeExit::Restart);
            }

            tokio::time::sleep(tick).await;
        }
    }

    /// Display-only loop used when the network never came up
    async fn run_offline(&mut self) -> Result<NodeExit> {
        info!("Running in offline mode");
        let tick = Duration::from_millis(self.config.node.offline_tick_ms);

        loop {
            if let Err(e) = self.offline_tick().await {
                return Err(self.fatal(e));
            }
            tokio::time::sleep(tick).await;
        }
    }

    /// Read and render without alerts or publishing
    pub async fn offline_tick(&mut self) -> Result<Reading> {
        let (reading, status, proximity) = self.sample().await;
        self.render(&reading, status, proximity)?;
        Ok(reading)
    }

    /// One iteration of the main loop
    pub async fn tick(&mut self) -> Result<TickReport> {
        while let Ok(input) = self.inbox.try_recv() {
            self.apply_input(input).await?;
        }

        let (reading, status, proximity) = self.sample().await;
        self.render(&reading, status, proximity)?;

        let event_published = self.check_thresholds(&reading, status).await;

        let mut telemetry_published = false;
        let now = self.clock.now_ms();
        let interval = self.config.node.publish_interval_ms;
        if self.state.auto_publish && self.state.publish_due(now, interval) {
            if let Some(publisher) = &self.publisher {
                if publisher.publish(&reading, status, proximity).await {
                    self.state.last_publish_ts = now;
                    telemetry_published = true;
                }
            }
        }

        Ok(TickReport {
            reading,
            status,
            proximity,
            event_published,
            telemetry_published,
        })
    }

    async fn sample(&mut self) -> (Reading, StatusLevel, ProximityLevel) {
        let reading = self.reader.read(self.clock.now_ms()).await;
        let (status, proximity) = classify(&reading, &self.config.thresholds);
        (reading, status, proximity)
    }

    fn render(
        &mut self,
        reading: &Reading,
        status: StatusLevel,
        proximity: ProximityLevel,
    ) -> Result<()> {
        let frame = DashboardFrame::new(
            *reading,
            status,
            proximity,
            &self.config.thresholds,
            self.links,
            !self.state.auto_publish,
        );
        self.display.render(&frame).context("dashboard render failed")
    }

    /// Local alert plus an event notice when the cloud is up
    async fn check_thresholds(&mut self, reading: &Reading, status: StatusLevel) -> bool {
        let (severity, message) = match status {
            StatusLevel::Running => return false,
            StatusLevel::Warning => (Severity::Warning, "Warning threshold exceeded".to_string()),
            StatusLevel::Critical => (
                Severity::Critical,
                format!(
                    "Critical threshold exceeded - Temp:{:.1}C Vib:{:.2}g Dist:{:.0}cm",
                    reading.temperature, reading.vibration, reading.distance
                ),
            ),
        };

        self.alerts.dispatch(status).await;

        match &self.publisher {
            Some(publisher) => publisher.publish_event(severity, &message, reading).await,
            None => false,
        }
    }

    async fn apply_input(&mut self, input: NodeInput) -> Result<()> {
        match input {
            NodeInput::Remote(raw) => {
                let mut handler = CommandHandler::new(&mut self.alerts, self.system.as_ref());
                self.state = handler.handle(&raw, self.state).await;
            }
            NodeInput::Button(Button::A) => {
                self.state.auto_publish = !self.state.auto_publish;
                if self.state.auto_publish {
                    info!("Publishing resumed");
                    self.alerts.chirp(chirps::RESUME);
                } else {
                    info!("Publishing paused");
                    self.alerts.chirp(chirps::PAUSE);
                }
            }
            NodeInput::Button(Button::B) => {
                self.alerts.chirp(chirps::REFRESH);
                let (reading, status, proximity) = self.sample().await;
                self.render(&reading, status, proximity)?;
                if let Some(publisher) = &self.publisher {
                    publisher.publish(&reading, status, proximity).await;
                }
            }
            NodeInput::Button(Button::C) => {
                self.alerts.dispatch(StatusLevel::Warning).await;
                if let Some(publisher) = &self.publisher {
                    let reading = self.reader.current();
                    publisher
                        .publish_event(Severity::Info, "Manual alert test triggered", &reading)
                        .await;
                }
            }
        }
        Ok(())
    }

    fn fatal(&mut self, e: anyhow::Error) -> anyhow::Error {
        self.node_state = NodeState::Fatal;
        error!("Fatal error: {:#}", e);
        self.display.show_fatal(&format!("{:#}", e));
        e
    }
}
