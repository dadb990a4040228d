//! # sitesync server
//!
//! Server-side counterpart of the sync client: receives patch batches
//! for one build and folds them atomically into persisted namespace
//! documents.
//!
//! The applier is transport-agnostic. An HTTP framework route
//! deserializes the request body into a
//! [`sitesync_protocol::PatchRequest`] and hands it to
//! [`PatchApplier::handle_request`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod applier;
mod assets;
mod error;
mod schema;
mod store;

pub use applier::PatchApplier;
pub use assets::{AssetChanges, IgnoreAssets, RecordingAssets};
pub use error::{ServerError, ServerResult};
pub use schema::{
    is_known_namespace, PermissiveValidator, SchemaValidator, ASSETS_NAMESPACE, KNOWN_NAMESPACES,
};
pub use store::{DocumentStore, MemoryDocumentStore};
