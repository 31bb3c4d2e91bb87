//! Server configuration from environment.

use std::env;
use std::str::FromStr;

use livetrack_core::SchemaVersion;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Pilot shape admitted by the registry boundary
    pub pilot_schema: SchemaVersion,
    /// When set, producer routes require `Authorization: Bearer <token>`
    pub producer_token: Option<String>,
    /// Snapshots buffered per stream client before it starts skipping
    pub stream_capacity: usize,
    pub heartbeat_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            pilot_schema: SchemaVersion::V1,
            producer_token: None,
            stream_capacity: 64,
            heartbeat_secs: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("LIVETRACK_PORT").unwrap_or(defaults.server_port),
            pilot_schema: match env::var("LIVETRACK_PILOT_SCHEMA") {
                Ok(raw) => raw.parse().unwrap_or_else(|err| {
                    tracing::warn!("Ignoring LIVETRACK_PILOT_SCHEMA: {}", err);
                    defaults.pilot_schema
                }),
                Err(_) => defaults.pilot_schema,
            },
            producer_token: env::var("LIVETRACK_PRODUCER_TOKEN")
                .ok()
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            stream_capacity: parsed::<usize>("LIVETRACK_STREAM_CAPACITY")
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.stream_capacity),
            heartbeat_secs: parsed::<u64>("LIVETRACK_HEARTBEAT_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.heartbeat_secs),
        }
    }
}

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
