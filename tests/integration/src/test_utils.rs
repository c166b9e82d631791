//! Shared helpers for the integration tests.

use async_trait::async_trait;
use echogrid_core::{GeoCoordinate, QueueEntry, SignalQuality};
use echogrid_crypto::{encrypt_channel_message, ChannelMaterial};
use echogrid_mesh::{RawFrame, GROUP_TEXT_FLOOD_HEADER};
use echogrid_uplink::{Collector, CollectorError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory collector recording every submitted batch.
#[derive(Default)]
pub struct RecordingCollector {
    batches: Mutex<Vec<Vec<QueueEntry>>>,
    reject: AtomicBool,
}

impl RecordingCollector {
    /// Make every subsequent submission answer `accepted: false`.
    pub fn reject_next(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    /// All batches submitted so far, in order.
    pub fn batches(&self) -> Vec<Vec<QueueEntry>> {
        self.batches.lock().unwrap().clone()
    }

    /// Total number of submissions.
    pub fn submission_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl Collector for &RecordingCollector {
    async fn submit(
        &self,
        _credential: &str,
        entries: &[QueueEntry],
    ) -> Result<bool, CollectorError> {
        self.batches.lock().unwrap().push(entries.to_vec());
        Ok(!self.reject.load(Ordering::SeqCst))
    }
}

/// Build a flood-routed group text frame relayed along `path`.
pub fn group_text_frame(
    material: &ChannelMaterial,
    path: &[u8],
    text: &str,
    snr: f32,
) -> RawFrame {
    let payload = encrypt_channel_message(material, 1_700_000_000, 0, text);
    let mut bytes = vec![GROUP_TEXT_FLOOD_HEADER, path.len() as u8];
    bytes.extend_from_slice(path);
    bytes.extend_from_slice(&payload);
    RawFrame {
        bytes,
        signal: SignalQuality::new(snr, -92),
    }
}

/// Reference location used across the tests (downtown Ottawa).
pub fn test_location() -> GeoCoordinate {
    GeoCoordinate::new(45.42153, -75.69719).unwrap()
}

/// A location roughly one kilometer north of [`test_location`].
pub fn one_km_north() -> GeoCoordinate {
    GeoCoordinate::new(45.43053, -75.69719).unwrap()
}
