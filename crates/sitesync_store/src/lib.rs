//! # sitesync store
//!
//! Client-side document state for sitesync.
//!
//! This crate provides:
//! - `Container`: an observable, namespace-bound document slice
//! - `StoreRegistry`: the namespace↔container binding
//! - `create_transaction`: draft-based optimistic mutation
//! - `EditHistory`: undo/redo stack plus the pending-transmission queue
//!
//! ## Key invariants
//!
//! - Containers are mutated only through transactions
//! - Applying a transaction's `patches` then `revise_patches` restores
//!   the exact prior value
//! - A commit after an undo discards the redo tail
//! - Every committed transaction is queued until acknowledged, exactly once

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod container;
mod error;
mod history;
mod registry;
mod transaction;

pub use container::{Container, ContainerSubscription};
pub use error::{StoreError, StoreResult};
pub use history::{EditHistory, SharedHistory};
pub use registry::StoreRegistry;
pub use transaction::{create_transaction, Transaction, TransactionChange};
