//! Core functionality for the EchoGrid coverage-mapping system.
//!
//! This crate provides the fundamental types, configuration, and logging
//! utilities shared across the EchoGrid crates: geographic coordinates,
//! radio signal quality, and the telemetry entries that flow from the
//! correlation layers into the submission queue.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod geo;
pub mod logging;
pub mod report;
pub mod signal;

pub use config::{ChannelConfig, CollectorConfig, Config, PassiveConfig, QueueConfig};
pub use error::{CoreError, Result};
pub use geo::GeoCoordinate;
pub use report::{format_heard_summary, EntryKind, QueueEntry};
pub use signal::SignalQuality;
