//! Configuration management for EchoGrid.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;

/// Top-level EchoGrid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mesh channel settings
    pub channel: ChannelConfig,
    /// Passive aggregation settings
    pub passive: PassiveConfig,
    /// Submission queue policy
    pub queue: QueueConfig,
    /// Remote collector endpoint
    pub collector: CollectorConfig,
}

/// Mesh channel the mapper probes and listens on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel name, e.g. `"#coverage"`
    pub name: String,
    /// Channel index used when transmitting probes
    pub index: u8,
}

/// Passive observation aggregator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassiveConfig {
    /// Whether passive RX aggregation is active
    pub enabled: bool,
    /// Distance from a buffer's origin that triggers a flush (meters)
    pub flush_distance_m: f64,
    /// Maximum buffer age before a time-based flush (milliseconds)
    pub buffer_max_age_ms: u64,
}

/// Submission queue batching policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Entry count that forces an immediate flush
    pub capacity: usize,
    /// Debounce window re-armed on every TX enqueue (milliseconds)
    pub debounce_ms: u64,
    /// Guaranteed periodic flush interval (milliseconds)
    pub periodic_flush_ms: u64,
    /// Re-queue a batch after a transport failure instead of dropping it
    pub requeue_on_failure: bool,
}

/// Remote collector endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Base URL the JSON batches are POSTed to
    pub endpoint: String,
    /// Bounded retry attempts per submission
    pub retry_attempts: u32,
    /// Delay between retry attempts (milliseconds)
    pub retry_backoff_ms: u64,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|e| CoreError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Built-in defaults used when no config file is supplied.
    pub fn default_config() -> Self {
        Self {
            channel: ChannelConfig {
                name: "#coverage".to_string(),
                index: 0,
            },
            passive: PassiveConfig {
                enabled: true,
                flush_distance_m: 500.0,
                buffer_max_age_ms: 120_000,
            },
            queue: QueueConfig {
                capacity: 50,
                debounce_ms: 5_000,
                periodic_flush_ms: 60_000,
                requeue_on_failure: false,
            },
            collector: CollectorConfig {
                endpoint: "http://localhost:8080/api/observations".to_string(),
                retry_attempts: 3,
                retry_backoff_ms: 2_000,
            },
        }
    }
}
