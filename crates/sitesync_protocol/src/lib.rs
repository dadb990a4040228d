//! # sitesync protocol
//!
//! Patch model and wire messages for sitesync.
//!
//! This crate provides:
//! - `Patch` as the minimal structural diff unit
//! - `diff` producing forward patches with exact inverses
//! - `Draft` for recipe-driven mutation tracking
//! - The PATCH request/response wire messages
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod diff;
mod error;
mod messages;
mod patch;

pub use diff::{diff, Draft, DraftOutcome, PatchSet};
pub use error::{PatchError, PatchResult};
pub use messages::{ChangePayload, PatchRequest, PatchResponse, TransactionPayload};
pub use patch::{apply_all, apply_patch, render_path, Patch, PatchOp, PathSegment};
