// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network status provider.
//!
//! [`NetworkWatch`] holds the current connectivity in a `tokio::sync::watch`
//! channel. The host sets it directly, or [`spawn_probe`] keeps it current by
//! polling a health endpoint. Dropping a receiver unsubscribes.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::transport::HttpClient;

/// Kind of link the device is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Wifi,
    Ethernet,
    Cellular,
    #[default]
    Unknown,
    None,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Wifi => "wifi",
            ConnectionType::Ethernet => "ethernet",
            ConnectionType::Cellular => "cellular",
            ConnectionType::Unknown => "unknown",
            ConnectionType::None => "none",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wifi" | "wi-fi" => Ok(ConnectionType::Wifi),
            "ethernet" => Ok(ConnectionType::Ethernet),
            "cellular" => Ok(ConnectionType::Cellular),
            "unknown" => Ok(ConnectionType::Unknown),
            "none" => Ok(ConnectionType::None),
            other => Err(format!(
                "invalid connection type '{other}': expected wifi, ethernet, cellular, unknown, or none"
            )),
        }
    }
}

/// Connectivity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    pub is_connected: bool,
    pub connection_type: ConnectionType,
}

impl NetworkState {
    pub fn online(connection_type: ConnectionType) -> Self {
        NetworkState {
            is_connected: true,
            connection_type,
        }
    }

    pub fn offline() -> Self {
        NetworkState {
            is_connected: false,
            connection_type: ConnectionType::None,
        }
    }

    /// Connected over a link that satisfies Wi-Fi-only mode.
    pub fn is_unmetered(&self) -> bool {
        self.is_connected
            && matches!(
                self.connection_type,
                ConnectionType::Wifi | ConnectionType::Ethernet
            )
    }
}

/// Source of connectivity state and change notifications.
pub trait NetworkMonitor: Send + Sync {
    fn current(&self) -> NetworkState;

    /// Returns a receiver notified on every state change.
    fn subscribe(&self) -> watch::Receiver<NetworkState>;
}

/// Settable network state shared between the host and the sync engine.
#[derive(Debug, Clone)]
pub struct NetworkWatch {
    tx: Arc<watch::Sender<NetworkState>>,
}

impl NetworkWatch {
    pub fn new(initial: NetworkState) -> Self {
        let (tx, _) = watch::channel(initial);
        NetworkWatch { tx: Arc::new(tx) }
    }

    /// Publishes `state`. Subscribers are only woken when it differs from the
    /// current value.
    pub fn set(&self, state: NetworkState) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        })
    }
}

impl NetworkMonitor for NetworkWatch {
    fn current(&self) -> NetworkState {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.tx.subscribe()
    }
}

/// Probes the server once. Any HTTP response counts as connected; only a
/// transport-level failure means offline.
pub async fn probe_once(
    client: &dyn HttpClient,
    health_path: &str,
    connection_type: ConnectionType,
) -> NetworkState {
    match client.get(health_path).await {
        Ok(_) => NetworkState::online(connection_type),
        Err(e) if e.is_network() => {
            tracing::debug!("connectivity probe failed: {}", e);
            NetworkState::offline()
        }
        Err(e) => {
            tracing::debug!("connectivity probe answered with {}", e.code);
            NetworkState::online(connection_type)
        }
    }
}

/// Spawns a task that probes `health_path` every `interval` and publishes
/// the result into `watch` until `cancel` fires.
pub fn spawn_probe(
    client: Arc<dyn HttpClient>,
    watch: NetworkWatch,
    health_path: String,
    connection_type: ConnectionType,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let state = tokio::select! {
                _ = cancel.cancelled() => break,
                state = probe_once(client.as_ref(), &health_path, connection_type) => state,
            };
            if watch.set(state) {
                tracing::info!(
                    "network {} ({})",
                    if state.is_connected { "online" } else { "offline" },
                    state.connection_type
                );
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        tracing::debug!("connectivity probe stopped");
    })
}
