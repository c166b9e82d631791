//! Passive Observation Aggregator - RX batching.
//!
//! Frames not claimed by an open echo window (or every frame, in
//! passive-only mode) are attributed to the relay that delivered them
//! directly to the listener. Each relay gets one open buffer holding the
//! best-signal observation since the last flush; buffers flush when the
//! operator has moved far enough from where they were opened, when they
//! age out, or unconditionally at shutdown.

use std::collections::HashMap;

use echogrid_core::config::PassiveConfig;
use echogrid_core::{format_heard_summary, EntryKind, GeoCoordinate, QueueEntry, SignalQuality};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::frame::FrameMetadata;

/// Sanity ceiling on hop-path length; anything longer is treated as a
/// corrupt frame and excluded from coverage scoring.
pub const MAX_SANE_PATH_LEN: usize = 16;

/// Best-signal observation of one relay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Signal-to-noise ratio in dB
    pub snr: f32,
    /// Received signal strength in dBm
    pub rssi: i16,
    /// Hop count of the observed frame
    pub hop_count: u8,
    /// When the observation was made (Unix milliseconds)
    pub timestamp_ms: u64,
}

/// Open per-relay batch of observations, created on first sighting since
/// the last flush and destroyed on flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationBuffer {
    /// Lowercase hex of the relay that delivered the frames
    pub repeater_id: String,
    /// Where the operator was when the buffer opened
    pub origin: GeoCoordinate,
    /// Best-signal observation so far
    pub best: Observation,
    /// When the buffer opened (Unix milliseconds)
    pub opened_at_ms: u64,
}

/// Batches overheard third-party traffic by delivering relay.
#[derive(Debug)]
pub struct PassiveAggregator {
    enabled: bool,
    flush_distance_m: f64,
    buffer_max_age_ms: u64,
    buffers: HashMap<String, ObservationBuffer>,
}

impl PassiveAggregator {
    /// Create an aggregator from the passive configuration section.
    pub fn new(config: &PassiveConfig) -> Self {
        Self {
            enabled: config.enabled,
            flush_distance_m: config.flush_distance_m,
            buffer_max_age_ms: config.buffer_max_age_ms,
            buffers: HashMap::new(),
        }
    }

    /// Whether passive aggregation is active.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle passive aggregation. Disabling keeps open buffers; they
    /// still flush through [`poll_flush`] or [`drain`].
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Number of currently open buffers.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Consume an unclaimed frame, creating or updating the buffer for
    /// its delivering relay.
    pub fn on_frame(
        &mut self,
        meta: &FrameMetadata,
        signal: &SignalQuality,
        location: GeoCoordinate,
        now_ms: u64,
    ) {
        if !self.enabled {
            return;
        }

        // Zero-hop frames were heard directly and say nothing about
        // relay coverage; absurd paths are corrupt frames.
        if meta.hop_path.is_empty() || meta.hop_path.len() > MAX_SANE_PATH_LEN {
            return;
        }

        let Some(last_hop) = meta.last_hop() else {
            return;
        };
        let key = format!("{:02x}", last_hop);

        let observation = Observation {
            snr: signal.snr,
            rssi: signal.rssi,
            hop_count: meta.hop_path.len() as u8,
            timestamp_ms: now_ms,
        };

        match self.buffers.get_mut(&key) {
            None => {
                trace!(repeater = %key, snr = signal.snr, "observation buffer opened");
                self.buffers.insert(
                    key.clone(),
                    ObservationBuffer {
                        repeater_id: key,
                        origin: location,
                        best: observation,
                        opened_at_ms: now_ms,
                    },
                );
            }
            Some(buffer) => {
                if observation.snr > buffer.best.snr {
                    buffer.best = observation;
                }
            }
        }
    }

    /// Check every open buffer against the distance and age triggers,
    /// flushing those that fire. Returns the finalized RX entries.
    pub fn poll_flush(&mut self, location: GeoCoordinate, now_ms: u64) -> Vec<QueueEntry> {
        let due: Vec<String> = self
            .buffers
            .values()
            .filter(|buffer| {
                location.distance_m(&buffer.origin) >= self.flush_distance_m
                    || now_ms.saturating_sub(buffer.opened_at_ms) >= self.buffer_max_age_ms
            })
            .map(|buffer| buffer.repeater_id.clone())
            .collect();

        due.into_iter()
            .filter_map(|key| self.buffers.remove(&key))
            .map(|buffer| Self::finalize(buffer, now_ms))
            .collect()
    }

    /// Unconditionally flush every open buffer (shutdown path).
    pub fn drain(&mut self, now_ms: u64) -> Vec<QueueEntry> {
        let mut flushed: Vec<ObservationBuffer> = self.buffers.drain().map(|(_, b)| b).collect();
        flushed.sort_by(|a, b| a.repeater_id.cmp(&b.repeater_id));

        debug!(count = flushed.len(), "passive aggregator drained");
        flushed
            .into_iter()
            .map(|buffer| Self::finalize(buffer, now_ms))
            .collect()
    }

    fn finalize(buffer: ObservationBuffer, now_ms: u64) -> QueueEntry {
        let heard = format_heard_summary(&[(buffer.repeater_id.clone(), buffer.best.snr)]);
        debug!(repeater = %buffer.repeater_id, heard = %heard, "observation buffer flushed");

        QueueEntry::new(EntryKind::Rx, buffer.origin, heard, now_ms).with_debug(format!(
            "hops={},rssi={}",
            buffer.best.hop_count, buffer.best.rssi
        ))
    }
}
