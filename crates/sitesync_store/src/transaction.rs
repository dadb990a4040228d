//! Transactions: atomic, possibly multi-container patch bundles.

use crate::container::Container;
use crate::error::{StoreError, StoreResult};
use crate::registry::StoreRegistry;
use sitesync_protocol::{ChangePayload, Draft, Patch, TransactionPayload};
use uuid::Uuid;

/// One container's share of a transaction.
#[derive(Debug, Clone)]
pub struct TransactionChange {
    /// The namespace the container is bound to.
    pub namespace: String,
    /// Forward patches relative to the pre-transaction value.
    pub patches: Vec<Patch>,
    /// Inverse patches restoring the pre-transaction value.
    pub revise_patches: Vec<Patch>,
    /// The container the patches apply to.
    pub container: Container,
}

/// An atomic bundle of patches produced by one user edit.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Stable history identity.
    pub id: Uuid,
    /// Per-container changes, in container order.
    pub changes: Vec<TransactionChange>,
}

impl Transaction {
    /// Returns true if no change carries any patches.
    pub fn is_empty(&self) -> bool {
        self.changes.iter().all(|change| change.patches.is_empty())
    }

    /// Re-applies the forward patches to every container, in order.
    pub(crate) fn apply_forward(&self) -> StoreResult<()> {
        for change in &self.changes {
            change.container.apply_patches(&change.patches)?;
        }
        Ok(())
    }

    /// Applies the revise patches per entry, in reverse entry order.
    pub(crate) fn apply_reverse(&self) -> StoreResult<()> {
        for change in self.changes.iter().rev() {
            change.container.apply_patches(&change.revise_patches)?;
        }
        Ok(())
    }

    /// Builds a transmission payload carrying the forward patches.
    ///
    /// Each call mints a fresh payload id: a redo is a new logical
    /// edit from the server's point of view.
    pub fn forward_payload(&self) -> TransactionPayload {
        TransactionPayload::new(
            self.changes
                .iter()
                .filter(|change| !change.patches.is_empty())
                .map(|change| ChangePayload::new(change.namespace.clone(), change.patches.clone()))
                .collect(),
        )
    }

    /// Builds a payload that reverts this transaction on the server.
    ///
    /// The revise patches travel as forward patches, entries reversed
    /// to match the local undo order.
    pub fn revert_payload(&self) -> TransactionPayload {
        TransactionPayload::new(
            self.changes
                .iter()
                .rev()
                .filter(|change| !change.revise_patches.is_empty())
                .map(|change| {
                    ChangePayload::new(change.namespace.clone(), change.revise_patches.clone())
                })
                .collect(),
        )
    }
}

/// Produces and optimistically applies a transaction.
///
/// Opens a draft per container (in container order), invokes the
/// recipe synchronously with the drafts, then republishes each
/// container's value, so dependents observe the change before this
/// returns. If any container lacks a registered namespace, nothing is
/// committed.
///
/// A no-op recipe yields a transaction whose patch lists are empty;
/// [`crate::EditHistory::commit`] skips those.
pub fn create_transaction<F>(
    registry: &StoreRegistry,
    containers: &[Container],
    recipe: F,
) -> StoreResult<Transaction>
where
    F: FnOnce(&mut [Draft]),
{
    // Resolve namespaces up front so a wiring bug aborts before any
    // draft is committed.
    let mut namespaces = Vec::with_capacity(containers.len());
    for container in containers {
        let namespace =
            registry
                .namespace_of(container)
                .ok_or(StoreError::UnregisteredContainer {
                    id: container.id(),
                })?;
        namespaces.push(namespace);
    }

    let mut drafts: Vec<Draft> = containers
        .iter()
        .map(|container| Draft::new(container.get()))
        .collect();
    recipe(&mut drafts);

    let mut changes = Vec::with_capacity(containers.len());
    for ((container, namespace), draft) in containers.iter().zip(namespaces).zip(drafts) {
        let outcome = draft.finish();
        container.replace(outcome.value);
        changes.push(TransactionChange {
            namespace,
            patches: outcome.patches,
            revise_patches: outcome.revise_patches,
            container: container.clone(),
        });
    }

    Ok(Transaction {
        id: Uuid::new_v4(),
        changes,
    })
}
