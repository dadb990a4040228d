//! Wire messages for the persistence endpoint.

use crate::patch::Patch;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All forward patches of one transaction against one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePayload {
    /// The namespace the patches belong to.
    pub namespace: String,
    /// Forward patches, in application order.
    pub patches: Vec<Patch>,
}

impl ChangePayload {
    /// Creates a change payload.
    pub fn new(namespace: impl Into<String>, patches: Vec<Patch>) -> Self {
        Self {
            namespace: namespace.into(),
            patches,
        }
    }
}

/// The transmission unit: one transaction's changes plus a stable id.
///
/// The id is minted when the payload is enqueued and lets the server
/// apply a batch exactly once even when a flush is retried after a
/// dropped acknowledgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Stable payload identity.
    pub id: Uuid,
    /// Per-namespace changes, in application order.
    pub changes: Vec<ChangePayload>,
}

impl TransactionPayload {
    /// Creates a payload with a fresh id.
    pub fn new(changes: Vec<ChangePayload>) -> Self {
        Self {
            id: Uuid::new_v4(),
            changes,
        }
    }

    /// Creates a payload with a caller-provided id.
    pub fn with_id(id: Uuid, changes: Vec<ChangePayload>) -> Self {
        Self { id, changes }
    }

    /// Returns true if no change carries any patches.
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(|change| change.patches.is_empty())
    }
}

/// The PATCH request sent to the persistence endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchRequest {
    /// The build the patches target.
    pub build_id: String,
    /// The project owning the build.
    pub project_id: String,
    /// Queued transactions, in enqueue order.
    pub transactions: Vec<TransactionPayload>,
}

/// The persistence endpoint's response.
///
/// Either `{ "status": "ok" }` or `{ "errors": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchResponse {
    /// Present and `"ok"` on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Present on rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

impl PatchResponse {
    /// Creates a success response.
    pub fn ok() -> Self {
        Self {
            status: Some("ok".to_string()),
            errors: None,
        }
    }

    /// Creates a rejection response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: None,
            errors: Some(message.into()),
        }
    }

    /// Returns true if the batch was acknowledged.
    pub fn is_ok(&self) -> bool {
        self.errors.is_none() && self.status.as_deref() == Some("ok")
    }
}
