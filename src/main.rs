// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Aegis One - industrial sensor node
//!
//! Host build of the node firmware. Runs the engine against the simulated
//! sensor board, logs the dashboard and talks MQTT to the configured broker.
//!
//! Front-panel buttons are mapped to stdin: type `a`, `b` or `c` and Enter.

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use aegis_node::alerts::LogAlertOutput;
use aegis_node::commands::{Button, NodeInput, RestartSignal};
use aegis_node::core::SystemClock;
use aegis_node::display::ConsoleDisplay;
use aegis_node::network::HostNetwork;
use aegis_node::sensors::SimulatedBoard;
use aegis_node::streaming::MqttConnector;
use aegis_node::{Collaborators, Config, Engine, NodeExit, NAME, VERSION};

/// Aegis One - industrial sensor node
#[derive(Parser, Debug)]
#[command(name = "aegis-node")]
#[command(author = "bad-antics")]
#[command(version = VERSION)]
#[command(about = "Sensor node: thresholds, local alerts and MQTT telemetry")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Override the device identifier
    #[arg(long)]
    device_id: Option<String>,

    /// MQTT broker address
    #[arg(long)]
    broker: Option<String>,

    /// Skip network bring-up and run the offline loop
    #[arg(long)]
    offline: bool,

    /// Demo mode with simulated sensors
    #[arg(long)]
    demo: bool,
}

/// Where stdin button presses go; swapped on every restart
type ButtonTarget = Arc<Mutex<Option<mpsc::Sender<NodeInput>>>>;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🛡️ {} v{}", NAME, VERSION);

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)
        .with_context(|| format!("loading configuration from {:?}", config_path))?;

    // Override with command line args
    if args.demo {
        config.node.demo_mode = true;
    }
    if args.offline {
        config.network.offline = true;
    }
    if let Some(device_id) = args.device_id {
        config.node.device_id = device_id;
    }
    if let Some(broker) = args.broker {
        config.cloud.enabled = true;
        config.cloud.broker = broker;
    }
    config.validate().context("invalid configuration")?;

    info!("Configuration loaded from {:?}", config_path);
    info!("Device: {}", config.node.device_id);
    info!("Demo mode: {}", config.node.demo_mode);

    if !config.node.demo_mode {
        anyhow::bail!("No sensor hardware driver on this host. Enable demo mode or use --demo");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(supervise(config))
}

/// Run the engine, rebuilding it whenever a restart is requested
async fn supervise(config: Config) -> Result<()> {
    let buttons: ButtonTarget = Arc::new(Mutex::new(None));
    tokio::spawn(read_buttons(buttons.clone()));

    let mut boots = 0u32;
    loop {
        boots += 1;
        if boots > 1 {
            info!("Restarting node (boot {})", boots);
        }

        let mut engine = Engine::new(config.clone(), collaborators(&config));
        *buttons.lock() = Some(engine.inputs());

        let exit = tokio::select! {
            exit = engine.run() => exit?,
            signal = tokio::signal::ctrl_c() => {
                signal.context("waiting for shutdown signal")?;
                info!("Shutdown signal received");
                break;
            }
        };

        match exit {
            NodeExit::Restart => continue,
        }
    }

    info!("{} shutdown complete", NAME);
    Ok(())
}

fn collaborators(config: &Config) -> Collaborators {
    Collaborators {
        hardware: Box::new(SimulatedBoard::new(config.sensors.simulated_fault_rate)),
        display: Box::new(ConsoleDisplay::new()),
        alerts: Box::new(LogAlertOutput),
        network: Box::new(HostNetwork),
        cloud: Arc::new(MqttConnector),
        system: Arc::new(RestartSignal::new()),
        clock: Arc::new(SystemClock),
    }
}

/// Map stdin lines `a`, `b`, `c` to button presses
async fn read_buttons(target: ButtonTarget) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("stdin closed, buttons disabled");
                return;
            }
            Err(e) => {
                warn!("stdin error: {}", e);
                return;
            }
        };

        let button = match line.trim().to_ascii_lowercase().as_str() {
            "a" => Button::A,
            "b" => Button::B,
            "c" => Button::C,
            "" => continue,
            other => {
                warn!("Unknown button {:?} (use a, b or c)", other);
                continue;
            }
        };

        let sender = target.lock().clone();
        if let Some(sender) = sender {
            if sender.send(NodeInput::Button(button)).await.is_err() {
                debug!("Engine gone, dropping button {:?}", button);
            }
        }
    }
}
