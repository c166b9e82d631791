//! EchoGrid Uplink - Batched telemetry submission
//!
//! Accumulates finalized entries from the echo tracker and the passive
//! aggregator, batches them under capacity/debounce/periodic policies,
//! and POSTs them to the remote collector with bounded retry.
//!
//! # Core Components
//!
//! - **Submission Queue**: ordered, capacity-bounded batching with an
//!   explicit in-flight guard for reentrancy safety
//! - **Collector**: async submission seam; `HttpCollector` is the
//!   production implementation
//! - **Session Context**: per-session coordinator owning all mutable
//!   state (no ambient globals), driven by frame/timer callbacks

#![warn(missing_docs)]

pub mod collector;
pub mod error;
pub mod queue;
pub mod session;

pub use collector::{Collector, CollectorError, HttpCollector};
pub use error::{UplinkError, UplinkResult};
pub use queue::{
    Batch, EnqueueOutcome, FlushDisposition, FlushReason, SubmissionQueue, SubmitOutcome,
};
pub use session::{SessionContext, SessionStatus};
