//! Error types for the store.

use thiserror::Error;
use uuid::Uuid;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Registration errors indicate a wiring bug and are never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A transaction referenced a container with no registered namespace.
    #[error("container {id} is not registered to a namespace")]
    UnregisteredContainer {
        /// Identity of the unregistered container.
        id: Uuid,
    },

    /// A namespace is already bound to a different container.
    #[error("namespace {namespace:?} is already bound to another container")]
    NamespaceCollision {
        /// The contested namespace.
        namespace: String,
    },

    /// A container is already bound to a different namespace.
    #[error("container is bound to {existing:?}, cannot rebind to {requested:?}")]
    ContainerRebound {
        /// The namespace the container is bound to.
        existing: String,
        /// The namespace the caller tried to bind.
        requested: String,
    },

    /// Patch application failed while applying a transaction.
    #[error("patch error: {0}")]
    Patch(#[from] sitesync_protocol::PatchError),
}
