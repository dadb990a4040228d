//! Error types for the sync client.

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while flushing patches to the server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport failed to deliver the request.
    #[error("transport error: {message}")]
    Transport {
        /// Human-readable failure description.
        message: String,
        /// Whether a retry could plausibly succeed.
        retryable: bool,
    },

    /// The server's response could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server refused the batch.
    #[error("server rejected batch: {0}")]
    Rejected(String),

    /// A flush was requested while another is still running.
    #[error("a flush is already in flight")]
    FlushInFlight,
}

impl ClientError {
    /// A transient transport failure worth retrying.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// A permanent transport failure.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if a retry could plausibly succeed.
    ///
    /// Rejections and protocol mismatches are deterministic, so only
    /// transient transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { retryable: true, .. })
    }
}
