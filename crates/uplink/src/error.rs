//! Error types for EchoGrid uplink operations.

use thiserror::Error;

/// Errors surfaced by the uplink layer.
#[derive(Debug, Error)]
pub enum UplinkError {
    /// The collector revoked the session; the caller must tear down
    #[error("Session revoked by collector")]
    SessionRevoked,

    /// Collector submission failed after bounded retry
    #[error("Collector error: {0}")]
    Collector(#[from] crate::collector::CollectorError),
}

/// Result type for uplink operations.
pub type UplinkResult<T> = Result<T, UplinkError>;
