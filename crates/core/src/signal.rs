//! Radio signal quality measurements.

use serde::{Deserialize, Serialize};

/// Signal quality as reported by the radio for a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalQuality {
    /// Signal-to-noise ratio in dB
    pub snr: f32,
    /// Received signal strength indicator in dBm
    pub rssi: i16,
}

impl SignalQuality {
    /// Create a new signal quality reading
    pub fn new(snr: f32, rssi: i16) -> Self {
        Self { snr, rssi }
    }
}
