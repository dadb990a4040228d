//! Error types for the bus.

use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors that can occur while publishing or delivering messages.
#[derive(Debug, Error)]
pub enum BusError {
    /// A message could not be serialized to a frame.
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An inbound frame was not a valid message.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The underlying port rejected a frame.
    #[error("port error: {0}")]
    Port(String),
}
