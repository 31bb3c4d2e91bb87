//! Application state: the session's pilot registry and its stream fan-out.

use std::sync::Arc;

use livetrack_core::{Pilot, PilotRegistry, Subscription};
use tokio::sync::broadcast;

use crate::config::Config;
use crate::metrics::Metrics;

/// One registry snapshot, serialized once for every stream client.
#[derive(Debug, Clone)]
pub struct StreamMessage {
    pub pilot_count: usize,
    pub payload: Arc<str>,
}

impl StreamMessage {
    fn from_pilots(pilots: &[Pilot]) -> Option<Self> {
        match serde_json::to_string(pilots) {
            Ok(json) => Some(Self {
                pilot_count: pilots.len(),
                payload: Arc::from(json),
            }),
            Err(e) => {
                tracing::error!("Failed to serialize pilot snapshot: {}", e);
                None
            }
        }
    }
}

/// Application state - the registry plus a broadcast of its changes.
pub struct AppState {
    registry: PilotRegistry,
    pub tx: broadcast::Sender<StreamMessage>,
    config: Config,
    metrics: Metrics,
    bridge: Subscription,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let registry = PilotRegistry::new(config.pilot_schema);
        let metrics = Metrics::new()?;
        let (tx, _) = broadcast::channel(config.stream_capacity);

        // Every registry write becomes one broadcast; with no stream
        // clients connected the send fails and the snapshot is dropped.
        let sender = tx.clone();
        let bridge_metrics = metrics.clone();
        let bridge = registry.subscribe(move |pilots| {
            bridge_metrics.pilots.set(pilots.len() as i64);
            if let Some(message) = StreamMessage::from_pilots(pilots) {
                let receivers = sender.send(message).unwrap_or(0);
                bridge_metrics.snapshots_published_total.inc();
                tracing::trace!(receivers, pilots = pilots.len(), "Snapshot broadcast");
            }
        });

        tracing::info!(schema = %config.pilot_schema, "Pilot registry created");

        Ok(Self {
            registry,
            tx,
            config,
            metrics,
            bridge,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &PilotRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Current list as a stream message, for clients that just connected.
    pub fn snapshot_message(&self) -> Option<StreamMessage> {
        StreamMessage::from_pilots(&self.registry.get())
    }

    pub fn stream_client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.bridge.unsubscribe();
    }
}
