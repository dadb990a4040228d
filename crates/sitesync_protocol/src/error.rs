//! Error types for patch application.

use thiserror::Error;

/// Result type for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can occur while applying a patch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// A path segment did not resolve to an existing value.
    #[error("path not found: {path}")]
    PathNotFound {
        /// Rendered path up to the missing segment.
        path: String,
    },

    /// An array index was past the end of the array.
    #[error("index {index} out of bounds at {path} (len {len})")]
    IndexOutOfBounds {
        /// Rendered path of the array.
        path: String,
        /// The offending index.
        index: usize,
        /// Length of the array.
        len: usize,
    },

    /// A key segment was applied to a non-object value.
    #[error("expected an object at {path}")]
    NotAnObject {
        /// Rendered path of the non-object value.
        path: String,
    },

    /// An index segment was applied to a non-array value.
    #[error("expected an array at {path}")]
    NotAnArray {
        /// Rendered path of the non-array value.
        path: String,
    },

    /// An add or replace patch carried no value.
    #[error("patch at {path} is missing a value")]
    MissingValue {
        /// Rendered path of the patch.
        path: String,
    },

    /// A remove patch targeted the document root.
    #[error("cannot remove the document root")]
    RootRemove,
}
