//! Echo Tracker - TX correlation.
//!
//! After the client transmits a probe on the channel, mesh relays
//! rebroadcast it and the client overhears those copies ("echoes").
//! During a bounded window this tracker matches overheard frames back to
//! the outbound probe, attributes each echo to the relay that first
//! forwarded it, and keeps only the best SNR per relay.
//!
//! The tracker does not own a timer. The caller opens the window when it
//! transmits and schedules `close()` after [`ECHO_WINDOW_MS`].

use std::collections::HashMap;

use echogrid_core::SignalQuality;
use echogrid_crypto::{decrypt_channel_message, ChannelMaterial};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::frame::{FrameMetadata, GROUP_TEXT_FLOOD_HEADER};

/// Fixed echo window duration. Scheduling the close is the caller's
/// responsibility.
pub const ECHO_WINDOW_MS: u64 = 30_000;

/// One relay's correlated echo results for a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoCandidate {
    /// Lowercase hex of the first hop that forwarded the probe
    pub repeater_id: String,
    /// Best SNR observed across this relay's echoes
    pub best_snr: f32,
    /// How many echoes were attributed to this relay
    pub occurrences: u32,
}

/// Merge an echo observation into the candidate set for `repeater_id`.
///
/// The reducer behind "keep best SNR" deduplication: a new key creates a
/// candidate, an existing key keeps the maximum SNR and counts the
/// occurrence. Pure so it can be tested without windows or timers.
pub fn merge_candidate(existing: Option<EchoCandidate>, repeater_id: &str, snr: f32) -> EchoCandidate {
    match existing {
        None => EchoCandidate {
            repeater_id: repeater_id.to_string(),
            best_snr: snr,
            occurrences: 1,
        },
        Some(mut candidate) => {
            if snr > candidate.best_snr {
                candidate.best_snr = snr;
            }
            candidate.occurrences += 1;
            candidate
        }
    }
}

#[derive(Debug)]
struct EchoWindow {
    sent_text: String,
    channel_index: u8,
    candidates: HashMap<String, EchoCandidate>,
}

/// Correlates overheard frames with an outbound transmission.
#[derive(Debug)]
pub struct EchoTracker {
    material: ChannelMaterial,
    window: Option<EchoWindow>,
}

impl EchoTracker {
    /// Create a tracker for the given channel material.
    pub fn new(material: ChannelMaterial) -> Self {
        Self {
            material,
            window: None,
        }
    }

    /// Start a tracking window for a just-sent probe, resetting any
    /// previous window state.
    pub fn open(&mut self, sent_text: &str, channel_index: u8) {
        debug!(channel_index, sent_text, "echo window opened");
        self.window = Some(EchoWindow {
            sent_text: sent_text.to_string(),
            channel_index,
            candidates: HashMap::new(),
        });
    }

    /// Whether a tracking window is currently open.
    pub fn is_open(&self) -> bool {
        self.window.is_some()
    }

    /// Offer a frame to the open window.
    ///
    /// Returns `true` when the frame was consumed as an echo of the
    /// tracked probe, so callers can keep it out of the passive path.
    /// Every rejection is a silent ignore; non-matching traffic is the
    /// steady state while a window is open.
    pub fn on_frame(&mut self, meta: &FrameMetadata, signal: &SignalQuality) -> bool {
        let Some(window) = self.window.as_mut() else {
            return false;
        };

        if meta.header != GROUP_TEXT_FLOOD_HEADER {
            trace!(header = meta.header, "frame is not a flood-routed group text");
            return false;
        }

        // Zero-hop frames were heard directly, not relayed.
        let Some(first_hop) = meta.first_hop() else {
            trace!("zero-hop frame ignored");
            return false;
        };

        if meta.payload.first() != Some(&self.material.header_tag) {
            trace!("channel tag mismatch");
            return false;
        }

        let Some(message) = decrypt_channel_message(&meta.payload, &self.material.key) else {
            trace!("payload failed structural decrypt");
            return false;
        };

        // Some relays prepend a sender name, so substring containment is
        // accepted alongside exact equality.
        if !message.text.contains(window.sent_text.as_str()) {
            trace!(text = %message.text, "channel message did not match tracked probe");
            return false;
        }

        let key = format!("{:02x}", first_hop);
        let merged = merge_candidate(window.candidates.remove(&key), &key, signal.snr);
        trace!(
            repeater = %key,
            snr = signal.snr,
            occurrences = merged.occurrences,
            "echo attributed"
        );
        window.candidates.insert(key, merged);
        true
    }

    /// End the window and return deduplicated candidates ordered by
    /// repeater id. Window state is released.
    pub fn close(&mut self) -> Vec<EchoCandidate> {
        let Some(window) = self.window.take() else {
            return Vec::new();
        };

        let mut candidates: Vec<EchoCandidate> = window.candidates.into_values().collect();
        candidates.sort_by(|a, b| a.repeater_id.cmp(&b.repeater_id));

        debug!(
            channel_index = window.channel_index,
            candidates = candidates.len(),
            "echo window closed"
        );
        candidates
    }
}
