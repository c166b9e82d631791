//! Collector client - submission seam and HTTP implementation.
//!
//! One POST per flush, carrying the batch as a JSON array. The server
//! answers with a boolean acceptance flag; `false` means the session
//! credential is no longer valid and the session must be torn down.

use async_trait::async_trait;
use echogrid_core::config::CollectorConfig;
use echogrid_core::QueueEntry;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from collector submissions.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// All bounded retry attempts failed
    #[error("Submission failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// How many attempts were made
        attempts: u32,
        /// The final attempt's error
        last_error: String,
    },
}

/// Asynchronous submission seam to the remote collector.
///
/// The production implementation is [`HttpCollector`]; tests substitute
/// in-memory implementations.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Submit one batch under the given session credential.
    ///
    /// Returns the server's acceptance flag: `false` signals the session
    /// has been revoked.
    async fn submit(&self, credential: &str, entries: &[QueueEntry])
        -> Result<bool, CollectorError>;
}

#[derive(Debug, Deserialize)]
struct CollectorResponse {
    accepted: bool,
}

/// HTTP collector client with bounded retry.
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: reqwest::Client,
    endpoint: String,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl HttpCollector {
    /// Session credential header name.
    pub const SESSION_HEADER: &'static str = "x-session-token";

    /// Create a collector client from configuration.
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            retry_attempts: config.retry_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    async fn try_submit(
        &self,
        credential: &str,
        entries: &[QueueEntry],
    ) -> Result<bool, CollectorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(Self::SESSION_HEADER, credential)
            .json(entries)
            .send()
            .await?
            .error_for_status()?
            .json::<CollectorResponse>()
            .await?;

        Ok(response.accepted)
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn submit(
        &self,
        credential: &str,
        entries: &[QueueEntry],
    ) -> Result<bool, CollectorError> {
        let mut last_error = String::new();

        for attempt in 1..=self.retry_attempts {
            match self.try_submit(credential, entries).await {
                Ok(accepted) => {
                    debug!(attempt, count = entries.len(), accepted, "batch submitted");
                    return Ok(accepted);
                }
                Err(error) => {
                    warn!(attempt, %error, "collector submission attempt failed");
                    last_error = error.to_string();
                    if attempt < self.retry_attempts {
                        tokio::time::sleep(self.retry_backoff).await;
                    }
                }
            }
        }

        Err(CollectorError::RetriesExhausted {
            attempts: self.retry_attempts,
            last_error,
        })
    }
}
