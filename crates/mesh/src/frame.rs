//! Best-effort frame metadata extraction.
//!
//! Wire layout of a mesh frame:
//!
//! ```text
//! flood:  [ header (1) | path_len (1) | path... | payload... ]
//! direct: [ header (1) | transport codes (4) | path_len (1) | path... | payload... ]
//! ```
//!
//! The low two bits of the header carry the route type and therefore
//! decide where the path-length byte lives. Parsing is total: truncated
//! or garbage input yields empty path and payload, and callers apply
//! their own acceptance rules.

use echogrid_core::SignalQuality;
use serde::{Deserialize, Serialize};

/// Mask for the route-type bits of the header.
pub const ROUTE_MASK: u8 = 0x03;

/// Route-type bits for flood routing.
pub const ROUTE_FLOOD: u8 = 0x01;

/// Route-type bits for direct routing.
pub const ROUTE_DIRECT: u8 = 0x02;

/// Payload type occupies the header bits above the route bits.
pub const PAYLOAD_TYPE_SHIFT: u8 = 2;

/// Payload type of an encrypted group text message.
pub const PAYLOAD_TYPE_GROUP_TEXT: u8 = 0x05;

/// Header of a flood-routed group text frame, the only kind an echo
/// window accepts.
pub const GROUP_TEXT_FLOOD_HEADER: u8 = (PAYLOAD_TYPE_GROUP_TEXT << PAYLOAD_TYPE_SHIFT) | ROUTE_FLOOD;

/// Path-length byte offset for flood-routed frames.
const FLOOD_PATH_LEN_OFFSET: usize = 1;

/// Path-length byte offset for direct-routed frames (after the four
/// transport code bytes).
const DIRECT_PATH_LEN_OFFSET: usize = 5;

/// How a frame was routed through the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    /// Flood routing: every node rebroadcasts, path records the relays
    Flood,
    /// Direct routing: source-routed along a known path
    Direct,
}

/// A raw frame as delivered by the transport layer.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame bytes as received
    pub bytes: Vec<u8>,
    /// Signal quality measured by the radio for this frame
    pub signal: SignalQuality,
}

/// Metadata extracted from a raw frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// Raw header byte (zero when the frame was empty)
    pub header: u8,
    /// Route type decoded from the header bits
    pub route: RouteKind,
    /// Relay path, in forwarding order
    pub hop_path: Vec<u8>,
    /// Encrypted payload bytes following the path
    pub payload: Vec<u8>,
}

impl FrameMetadata {
    /// The first relay that forwarded this frame, if any.
    ///
    /// Attribution target for TX echo scoring.
    pub fn first_hop(&self) -> Option<u8> {
        self.hop_path.first().copied()
    }

    /// The relay that delivered this frame directly to us, if any.
    ///
    /// Attribution target for passive RX scoring.
    pub fn last_hop(&self) -> Option<u8> {
        self.hop_path.last().copied()
    }
}

/// Parse a raw frame into metadata. Pure and total: never fails.
///
/// Malformed input degrades to an empty path (so both hop accessors
/// return `None`) and an empty payload.
pub fn parse_frame(bytes: &[u8]) -> FrameMetadata {
    let header = bytes.first().copied().unwrap_or(0);

    let route = if header & ROUTE_MASK == ROUTE_DIRECT {
        RouteKind::Direct
    } else {
        RouteKind::Flood
    };

    let len_offset = match route {
        RouteKind::Flood => FLOOD_PATH_LEN_OFFSET,
        RouteKind::Direct => DIRECT_PATH_LEN_OFFSET,
    };

    let (hop_path, payload) = match bytes.get(len_offset) {
        None => (Vec::new(), Vec::new()),
        Some(&path_len) => {
            let path_start = len_offset + 1;
            let path_end = (path_start + path_len as usize).min(bytes.len());
            let hop_path = bytes
                .get(path_start..path_end)
                .map(<[u8]>::to_vec)
                .unwrap_or_default();
            let payload = bytes.get(path_end..).map(<[u8]>::to_vec).unwrap_or_default();
            (hop_path, payload)
        }
    };

    FrameMetadata {
        header,
        route,
        hop_path,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flood_frame() {
        // header | path_len=2 | path 0x4E,0xB7 | payload
        let bytes = [GROUP_TEXT_FLOOD_HEADER, 2, 0x4E, 0xB7, 0xAA, 0xBB];
        let meta = parse_frame(&bytes);

        assert_eq!(meta.route, RouteKind::Flood);
        assert_eq!(meta.hop_path, vec![0x4E, 0xB7]);
        assert_eq!(meta.first_hop(), Some(0x4E));
        assert_eq!(meta.last_hop(), Some(0xB7));
        assert_eq!(meta.payload, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_parse_direct_frame_skips_transport_codes() {
        // header | 4 transport code bytes | path_len=1 | path 0x11 | payload
        let bytes = [ROUTE_DIRECT, 9, 9, 9, 9, 1, 0x11, 0xCC];
        let meta = parse_frame(&bytes);

        assert_eq!(meta.route, RouteKind::Direct);
        assert_eq!(meta.hop_path, vec![0x11]);
        assert_eq!(meta.payload, vec![0xCC]);
    }

    #[test]
    fn test_parse_empty_input() {
        let meta = parse_frame(&[]);
        assert_eq!(meta.header, 0);
        assert!(meta.hop_path.is_empty());
        assert!(meta.payload.is_empty());
        assert_eq!(meta.first_hop(), None);
        assert_eq!(meta.last_hop(), None);
    }

    #[test]
    fn test_parse_truncated_path_is_clamped() {
        // Claims a 10-byte path but only 1 byte follows.
        let bytes = [ROUTE_FLOOD, 10, 0x4E];
        let meta = parse_frame(&bytes);

        assert_eq!(meta.hop_path, vec![0x4E]);
        assert!(meta.payload.is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let meta = parse_frame(&[ROUTE_FLOOD]);
        assert!(meta.hop_path.is_empty());
        assert!(meta.payload.is_empty());
    }

    #[test]
    fn test_zero_hop_frame_has_no_hops() {
        // Direct-heard frame: zero-length path, payload only.
        let bytes = [GROUP_TEXT_FLOOD_HEADER, 0, 0xDE, 0xAD];
        let meta = parse_frame(&bytes);

        assert_eq!(meta.first_hop(), None);
        assert_eq!(meta.payload, vec![0xDE, 0xAD]);
    }

    #[test]
    fn test_group_text_header_value() {
        assert_eq!(GROUP_TEXT_FLOOD_HEADER & ROUTE_MASK, ROUTE_FLOOD);
        assert_eq!(
            GROUP_TEXT_FLOOD_HEADER >> PAYLOAD_TYPE_SHIFT,
            PAYLOAD_TYPE_GROUP_TEXT
        );
    }
}
