//! EchoGrid Mesh - Packet correlation for mesh coverage mapping
//!
//! Turns raw overheard mesh frames into attributable relay observations.
//!
//! # Core Components
//!
//! - **Frame Parser**: Best-effort metadata extraction from raw frames
//! - **Echo Tracker**: Correlates overheard relays of a self-sent probe
//!   with the relay that first forwarded it (TX scoring)
//! - **Passive Aggregator**: Batches third-party traffic by the relay
//!   that delivered it directly to the listener (RX scoring)
//!
//! # Design Principles
//!
//! 1. **Total parsing**: malformed frames degrade to empty metadata,
//!    acceptance rules do the rejecting
//! 2. **Silent non-matches**: wrong channel, failed decrypt, and content
//!    mismatch are the steady state, not errors
//! 3. **Caller-owned time**: every trigger takes `now_ms` and location as
//!    inputs, nothing here reads a clock

#![warn(missing_docs)]

pub mod echo;
pub mod frame;
pub mod passive;

pub use echo::{merge_candidate, EchoCandidate, EchoTracker, ECHO_WINDOW_MS};
pub use frame::{parse_frame, FrameMetadata, RawFrame, RouteKind, GROUP_TEXT_FLOOD_HEADER};
pub use passive::{Observation, ObservationBuffer, PassiveAggregator, MAX_SANE_PATH_LEN};
