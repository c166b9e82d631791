//! Telemetry entries submitted to the remote collector.
//!
//! Both the echo tracker (TX correlation) and the passive aggregator
//! (RX batching) finalize their results into [`QueueEntry`] values. The
//! submission queue batches these and POSTs them as a JSON array, so the
//! serde field names here are the collector wire contract.

use crate::geo::GeoCoordinate;
use serde::{Deserialize, Serialize};

/// Discriminator for how a telemetry entry was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Echo correlation of a self-sent probe
    Tx,
    /// Passively overheard third-party traffic
    Rx,
}

/// One finalized telemetry entry awaiting submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    /// TX (echo probe) or RX (passive observation)
    pub kind: EntryKind,
    /// Latitude where the entry was finalized
    pub lat: f64,
    /// Longitude where the entry was finalized
    pub lon: f64,
    /// Compact heard-relay summary, e.g. `"4e(11.5),b7(9.75)"` or `"None"`
    pub heard: String,
    /// Unix timestamp in milliseconds
    pub timestamp_ms: u64,
    /// Optional debug metadata for field diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl QueueEntry {
    /// Create a new entry at the given location and time.
    pub fn new(
        kind: EntryKind,
        location: GeoCoordinate,
        heard: String,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            kind,
            lat: location.latitude,
            lon: location.longitude,
            heard,
            timestamp_ms,
            debug: None,
        }
    }

    /// Attach debug metadata to the entry.
    pub fn with_debug(mut self, debug: impl Into<String>) -> Self {
        self.debug = Some(debug.into());
        self
    }
}

/// Format a heard-relay list as the collector's compact summary string.
///
/// Entries are rendered as `id(snr)` joined with commas; an empty list
/// renders as the literal `"None"`.
pub fn format_heard_summary(heard: &[(String, f32)]) -> String {
    if heard.is_empty() {
        return "None".to_string();
    }

    heard
        .iter()
        .map(|(id, snr)| format!("{}({})", id, snr))
        .collect::<Vec<_>>()
        .join(",")
}
