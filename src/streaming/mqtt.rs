// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! MQTT cloud session

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{CloudConnector, Transport, TransportError};
use crate::commands::NodeInput;
use crate::config::CloudConfig;

/// Publishing half of an MQTT session.
///
/// Owns the session task; dropping the transport closes the connection.
pub struct MqttTransport {
    client: AsyncClient,
    session: JoinHandle<()>,
}

#[async_trait]
impl Transport for MqttTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))
    }
}

impl Drop for MqttTransport {
    fn drop(&mut self) {
        debug!("MQTT transport dropped, closing session");
        self.session.abort();
    }
}

/// Opens MQTT sessions with `rumqttc`
#[derive(Debug, Default)]
pub struct MqttConnector;

impl MqttConnector {
    fn options(config: &CloudConfig) -> MqttOptions {
        let mut options = MqttOptions::new(&config.client_id, &config.broker, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        if config.use_tls {
            options.set_transport(rumqttc::Transport::tls_with_default_config());
        }

        options
    }

    async fn await_connack(eventloop: &mut EventLoop) -> Result<(), TransportError> {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => return Ok(()),
                Ok(_) => {}
                Err(e) => return Err(TransportError::Connect(e.to_string())),
            }
        }
    }
}

#[async_trait]
impl CloudConnector for MqttConnector {
    async fn connect(
        &self,
        config: &CloudConfig,
        inbox: mpsc::Sender<NodeInput>,
    ) -> Result<Arc<dyn Transport>, TransportError> {
        let (client, mut eventloop) = AsyncClient::new(Self::options(config), 100);

        client
            .subscribe(&config.commands_topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::Subscribe(e.to_string()))?;

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        match tokio::time::timeout(timeout, Self::await_connack(&mut eventloop)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportError::Connect(format!(
                    "no CONNACK from {}:{} within {:?}",
                    config.broker, config.port, timeout
                )))
            }
        }

        info!("MQTT connected to {}:{}", config.broker, config.port);
        info!("Subscribed to MQTT topic: {}", config.commands_topic);

        let session = tokio::spawn(drive_session(
            eventloop,
            client.clone(),
            config.commands_topic.clone(),
            inbox,
            Duration::from_millis(config.reconnect_delay_ms),
        ));

        Ok(Arc::new(MqttTransport { client, session }))
    }
}

/// Poll the event loop after the first CONNACK.
///
/// Re-subscribes to the commands topic on every reconnect and forwards its
/// publishes to `inbox`. Returns once the inbox is closed.
async fn drive_session(
    mut eventloop: EventLoop,
    client: AsyncClient,
    commands_topic: String,
    inbox: mpsc::Sender<NodeInput>,
    reconnect_delay: Duration,
) {
    loop {
        let event = tokio::select! {
            _ = inbox.closed() => {
                debug!("Command inbox closed, stopping MQTT event loop");
                return;
            }
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("MQTT reconnected, subscribing to {}", commands_topic);
                if let Err(e) = client.try_subscribe(&commands_topic, QoS::AtLeastOnce) {
                    warn!("Resubscribe failed: {}", e);
                }
            }
            Ok(Event::Incoming(Packet::Publish(msg))) => {
                debug!("MQTT received: {:?}", msg.topic);
                if msg.topic == commands_topic
                    && inbox.send(NodeInput::Remote(msg.payload.to_vec())).await.is_err()
                {
                    debug!("Command inbox closed, stopping MQTT event loop");
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT error: {:?}", e);
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_options_carry_identity_and_keep_alive() {
        let config = CloudConfig::default();
        let options = MqttConnector::options(&config);

        assert_eq!(options.client_id(), "AegisOne_M5_01");
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_unreachable_broker_fails_to_connect() {
        let config = CloudConfig {
            broker: "127.0.0.1".into(),
            // reserved port, nothing listens here
            port: 9,
            connect_timeout_ms: 2000,
            ..CloudConfig::default()
        };
        let (tx, _rx) = mpsc::channel(1);

        let result = MqttConnector.connect(&config, tx).await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
    }

    const CONNECT: u8 = 1;
    const SUBSCRIBE: u8 = 8;
    const CONNACK: [u8; 4] = [0x20, 0x02, 0x00, 0x00];

    fn local_config(port: u16) -> CloudConfig {
        CloudConfig {
            broker: "127.0.0.1".into(),
            port,
            keep_alive_secs: 5,
            connect_timeout_ms: 2000,
            reconnect_delay_ms: 50,
            ..CloudConfig::default()
        }
    }

    /// One MQTT packet as (type, body); `None` once the peer hangs up
    async fn read_packet(stream: &mut TcpStream) -> Option<(u8, Vec<u8>)> {
        let mut header = [0u8; 1];
        stream.read_exact(&mut header).await.ok()?;

        let mut len = 0usize;
        let mut shift = 0;
        loop {
            let mut byte = [0u8; 1];
            stream.read_exact(&mut byte).await.ok()?;
            len |= ((byte[0] & 0x7f) as usize) << shift;
            if byte[0] & 0x80 == 0 {
                break;
            }
            shift += 7;
        }

        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await.ok()?;
        Some((header[0] >> 4, body))
    }

    /// Broker side of connect plus the commands subscription
    async fn accept_session(stream: &mut TcpStream) {
        let (kind, _) = read_packet(stream).await.unwrap();
        assert_eq!(kind, CONNECT);
        stream.write_all(&CONNACK).await.unwrap();

        loop {
            let (kind, body) = read_packet(stream).await.unwrap();
            if kind == SUBSCRIBE {
                stream.write_all(&[0x90, 0x03, body[0], body[1], 0x01]).await.unwrap();
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_dropping_transport_closes_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let broker = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            accept_session(&mut stream).await;
            stream
        });

        let (tx, rx) = mpsc::channel(4);
        let transport = MqttConnector.connect(&local_config(port), tx).await.unwrap();
        let mut stream = broker.await.unwrap();

        // what the supervisor does when it rebuilds the engine
        drop(transport);
        drop(rx);

        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            while read_packet(&mut stream).await.is_some() {}
        })
        .await;
        assert!(closed.is_ok(), "session still open after the transport was dropped");
    }

    #[tokio::test]
    async fn test_closed_inbox_ends_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let broker = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            accept_session(&mut stream).await;
            stream
        });

        let (tx, rx) = mpsc::channel(4);
        let _transport = MqttConnector.connect(&local_config(port), tx).await.unwrap();
        let mut stream = broker.await.unwrap();

        drop(rx);

        let closed = tokio::time::timeout(Duration::from_secs(2), async {
            while read_packet(&mut stream).await.is_some() {}
        })
        .await;
        assert!(closed.is_ok(), "session still open after the inbox closed");
    }

    #[tokio::test]
    async fn test_resubscribes_after_reconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let broker = tokio::spawn(async move {
            let (mut first, _) = listener.accept().await.unwrap();
            accept_session(&mut first).await;
            drop(first);

            let (mut second, _) = listener.accept().await.unwrap();
            let (kind, _) = read_packet(&mut second).await.unwrap();
            assert_eq!(kind, CONNECT);
            second.write_all(&CONNACK).await.unwrap();

            loop {
                match read_packet(&mut second).await {
                    Some((SUBSCRIBE, body)) => return body,
                    Some(_) => continue,
                    None => panic!("connection closed before resubscribing"),
                }
            }
        });

        let (tx, _rx) = mpsc::channel(4);
        let _transport = MqttConnector.connect(&local_config(port), tx).await.unwrap();

        let body = tokio::time::timeout(Duration::from_secs(5), broker)
            .await
            .expect("no SUBSCRIBE after reconnect")
            .unwrap();
        let topic = b"aegisone/commands";
        assert!(body.windows(topic.len()).any(|w| w == topic));
    }
}
