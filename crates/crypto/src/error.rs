//! Error types for EchoGrid crypto operations.

use thiserror::Error;

/// Errors that can occur when deriving channel material.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Channel name violates the allowed prefix or character set
    #[error("Invalid channel name: {0}")]
    InvalidChannelName(String),
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
