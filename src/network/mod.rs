// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Network association

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;

/// WiFi credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub password: String,
}

impl From<&NetworkConfig> for Credentials {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            ssid: config.ssid.clone(),
            password: config.password.clone(),
        }
    }
}

/// Link-layer association (WiFi station or equivalent)
#[async_trait]
pub trait NetworkLink: Send {
    /// Start associating; completion is observed through `is_associated`
    async fn associate(&mut self, credentials: &Credentials);

    fn is_associated(&self) -> bool;
}

/// The host OS owns the network; treat it as always associated
#[derive(Debug, Default)]
pub struct HostNetwork;

#[async_trait]
impl NetworkLink for HostNetwork {
    async fn associate(&mut self, credentials: &Credentials) {
        debug!("Host network in use, ignoring SSID {:?}", credentials.ssid);
    }

    fn is_associated(&self) -> bool {
        true
    }
}

/// Associate and poll up to `attempts` times, `delay` apart.
///
/// `on_retry` is called with the attempt number before each wait.
pub async fn connect_with_retry<F>(
    link: &mut dyn NetworkLink,
    credentials: &Credentials,
    attempts: u32,
    delay: Duration,
    mut on_retry: F,
) -> bool
where
    F: FnMut(u32) + Send,
{
    info!("Connecting to network {:?}", credentials.ssid);
    link.associate(credentials).await;

    let mut retry = 0;
    while !link.is_associated() && retry < attempts {
        retry += 1;
        on_retry(retry);
        tokio::time::sleep(delay).await;
    }

    let connected = link.is_associated();
    if connected {
        info!("Network associated after {} retries", retry);
    } else {
        warn!("Network association failed after {} attempts", attempts);
    }
    connected
}


#[cfg(test)]
mod tests {
    use super::testing::FlakyLink;
    use super::*;

    fn credentials() -> Credentials {
        Credentials::from(&NetworkConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_connects_after_retries() {
        let mut link = FlakyLink::up_after(3);
        let mut retries = Vec::new();

        let ok = connect_with_retry(&mut link, &credentials(), 20, Duration::from_secs(1), |n| {
            retries.push(n)
        })
        .await;

        assert!(ok);
        assert_eq!(retries, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_bounded_attempts() {
        let mut link = FlakyLink::never();
        let started = tokio::time::Instant::now();
        let mut count = 0;

        let ok = connect_with_retry(&mut link, &credentials(), 5, Duration::from_secs(1), |_| {
            count += 1
        })
        .await;

        assert!(!ok);
        assert_eq!(count, 5);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_host_network_is_immediate() {
        let mut link = HostNetwork;
        let delay = Duration::from_secs(1);
        assert!(connect_with_retry(&mut link, &credentials(), 20, delay, |_| {}).await);
    }
}
