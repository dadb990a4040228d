//! Error types for the server-side applier.

use sitesync_protocol::PatchError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that reject a whole patch batch.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A change targeted a namespace the schema does not know.
    #[error("unknown namespace: {namespace}")]
    UnknownNamespace {
        /// The offending namespace.
        namespace: String,
    },

    /// A patch did not apply against the stored document.
    #[error("patch failed in namespace {namespace}: {source}")]
    PatchFailed {
        /// The namespace being patched.
        namespace: String,
        /// The underlying patch failure.
        #[source]
        source: PatchError,
    },

    /// A folded document failed schema validation.
    #[error("validation failed for namespace {namespace}: {message}")]
    Validation {
        /// The namespace that failed.
        namespace: String,
        /// The validator's message.
        message: String,
    },

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}
