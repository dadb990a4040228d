//! Atomic folding of patch batches into stored documents.

use crate::assets::AssetChanges;
use crate::error::{ServerError, ServerResult};
use crate::schema::{is_known_namespace, SchemaValidator, ASSETS_NAMESPACE};
use crate::store::DocumentStore;
use parking_lot::RwLock;
use serde_json::Value;
use sitesync_protocol::{Patch, PatchRequest, PatchResponse, TransactionPayload};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Applies patch batches to one build's documents.
///
/// # Invariants
///
/// - A batch is all-or-nothing: every transaction folds and every
///   touched namespace validates before a single write happens
/// - Each namespace is read once per batch; later transactions fold
///   into the accumulated value, not a re-read
/// - A payload id is applied at most once; replays are skipped but
///   still acknowledged, which makes retried flushes idempotent
pub struct PatchApplier<D: DocumentStore, V: SchemaValidator, A: AssetChanges> {
    store: D,
    validator: V,
    assets: A,
    applied: RwLock<HashSet<Uuid>>,
}

impl<D: DocumentStore, V: SchemaValidator, A: AssetChanges> PatchApplier<D, V, A> {
    /// Creates an applier over the given collaborators.
    pub fn new(store: D, validator: V, assets: A) -> Self {
        Self {
            store,
            validator,
            assets,
            applied: RwLock::new(HashSet::new()),
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &D {
        &self.store
    }

    /// Folds a batch of transactions into the stored documents.
    ///
    /// On error nothing is persisted and no payload id is recorded,
    /// so the client may retry the identical batch after fixing the
    /// cause.
    pub fn apply_batch(&self, transactions: &[TransactionPayload]) -> ServerResult<()> {
        let mut fresh: Vec<Uuid> = Vec::new();
        let mut folded: BTreeMap<String, Value> = BTreeMap::new();
        let mut asset_patches: Vec<Patch> = Vec::new();

        {
            let applied = self.applied.read();
            for payload in transactions {
                if applied.contains(&payload.id) {
                    tracing::debug!(id = %payload.id, "skipping replayed payload");
                    continue;
                }
                fresh.push(payload.id);
                for change in &payload.changes {
                    if change.patches.is_empty() {
                        continue;
                    }
                    if !is_known_namespace(&change.namespace) {
                        return Err(ServerError::UnknownNamespace {
                            namespace: change.namespace.clone(),
                        });
                    }
                    if change.namespace == ASSETS_NAMESPACE {
                        asset_patches.extend_from_slice(&change.patches);
                        continue;
                    }
                    let document = match folded.entry(change.namespace.clone()) {
                        Entry::Occupied(entry) => entry.into_mut(),
                        Entry::Vacant(entry) => {
                            let stored = self.store.read(entry.key())?.unwrap_or(Value::Null);
                            entry.insert(stored)
                        }
                    };
                    sitesync_protocol::apply_all(document, &change.patches).map_err(|source| {
                        ServerError::PatchFailed {
                            namespace: change.namespace.clone(),
                            source,
                        }
                    })?;
                }
            }
        }

        // Validate everything before writing anything.
        for (namespace, document) in &folded {
            self.validator
                .validate(namespace, document)
                .map_err(|message| ServerError::Validation {
                    namespace: namespace.clone(),
                    message,
                })?;
        }

        if !asset_patches.is_empty() {
            self.assets.apply(&asset_patches)?;
        }

        for (namespace, document) in &folded {
            self.store.write(namespace, document)?;
        }

        self.applied.write().extend(fresh);
        Ok(())
    }

    /// Applies one wire request and renders the verdict.
    pub fn handle_request(&self, request: &PatchRequest) -> PatchResponse {
        match self.apply_batch(&request.transactions) {
            Ok(()) => PatchResponse::ok(),
            Err(e) => {
                tracing::warn!(
                    build_id = %request.build_id,
                    project_id = %request.project_id,
                    error = %e,
                    "rejecting patch batch"
                );
                PatchResponse::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{IgnoreAssets, RecordingAssets};
    use crate::schema::PermissiveValidator;
    use crate::store::MemoryDocumentStore;
    use serde_json::json;
    use sitesync_protocol::ChangePayload;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn applier() -> PatchApplier<MemoryDocumentStore, PermissiveValidator, IgnoreAssets> {
        PatchApplier::new(
            MemoryDocumentStore::new(),
            PermissiveValidator,
            IgnoreAssets,
        )
    }

    fn set(namespace: &str, key: &str, value: Value) -> TransactionPayload {
        TransactionPayload::new(vec![ChangePayload::new(
            namespace,
            vec![Patch::add(vec![key.into()], value)],
        )])
    }

    #[test]
    fn folds_onto_the_stored_document() {
        let applier = applier();
        applier.store().insert("props", json!({"a": 1}));

        applier
            .apply_batch(&[set("props", "b", json!(2))])
            .unwrap();
        assert_eq!(applier.store().get("props"), Some(json!({"a": 1, "b": 2})));
    }

    #[test]
    fn unstored_namespace_starts_from_null() {
        let applier = applier();
        // A root add materializes the first document.
        let payload = TransactionPayload::new(vec![ChangePayload::new(
            "styles",
            vec![Patch::add(vec![], json!({"s": 1}))],
        )]);
        applier.apply_batch(&[payload]).unwrap();
        assert_eq!(applier.store().get("styles"), Some(json!({"s": 1})));
    }

    #[test]
    fn transactions_fold_against_the_accumulator() {
        let applier = applier();
        applier.store().insert("props", json!({}));

        // The second transaction sees the first one's effect even
        // though nothing was written between them.
        let batch = [
            set("props", "a", json!(1)),
            TransactionPayload::new(vec![ChangePayload::new(
                "props",
                vec![Patch::replace(vec!["a".into()], json!(2))],
            )]),
        ];
        applier.apply_batch(&batch).unwrap();
        assert_eq!(applier.store().get("props"), Some(json!({"a": 2})));
    }

    #[test]
    fn each_namespace_is_read_once_per_batch() {
        struct CountingStore {
            inner: MemoryDocumentStore,
            reads: AtomicUsize,
        }

        impl DocumentStore for CountingStore {
            fn read(&self, namespace: &str) -> ServerResult<Option<Value>> {
                self.reads.fetch_add(1, Ordering::SeqCst);
                self.inner.read(namespace)
            }

            fn write(&self, namespace: &str, value: &Value) -> ServerResult<()> {
                self.inner.write(namespace, value)
            }
        }

        let store = CountingStore {
            inner: MemoryDocumentStore::new(),
            reads: AtomicUsize::new(0),
        };
        store.inner.insert("props", json!({}));
        let applier = PatchApplier::new(store, PermissiveValidator, IgnoreAssets);

        let batch = [
            set("props", "a", json!(1)),
            set("props", "b", json!(2)),
            set("props", "c", json!(3)),
        ];
        applier.apply_batch(&batch).unwrap();
        assert_eq!(applier.store().reads.load(Ordering::SeqCst), 1);
        assert_eq!(
            applier.store().inner.get("props"),
            Some(json!({"a": 1, "b": 2, "c": 3}))
        );
    }

    #[test]
    fn asset_patches_go_to_the_delegate() {
        let applier = PatchApplier::new(
            MemoryDocumentStore::new(),
            PermissiveValidator,
            RecordingAssets::new(),
        );

        let payload = TransactionPayload::new(vec![
            ChangePayload::new(
                "assets",
                vec![Patch::add(vec!["logo.png".into()], json!({"size": 1024}))],
            ),
            ChangePayload::new("props", vec![Patch::add(vec!["a".into()], json!(1))]),
        ]);
        applier.apply_batch(&[payload]).unwrap();

        // Asset metadata never lands in the document store.
        assert_eq!(applier.store().get("assets"), None);
        assert_eq!(applier.assets.patches().len(), 1);
        assert_eq!(applier.store().get("props"), Some(json!({"a": 1})));
    }

    #[test]
    fn unknown_namespace_rejects_the_whole_batch() {
        let applier = applier();
        applier.store().insert("props", json!({}));

        let batch = [
            set("props", "a", json!(1)),
            set("plugins", "x", json!(true)),
        ];
        let err = applier.apply_batch(&batch).unwrap_err();
        assert!(matches!(err, ServerError::UnknownNamespace { .. }));
        // The valid transaction was not persisted either.
        assert_eq!(applier.store().get("props"), Some(json!({})));
    }

    #[test]
    fn validation_failure_persists_nothing() {
        struct NoDisabledProps;

        impl SchemaValidator for NoDisabledProps {
            fn validate(&self, namespace: &str, document: &Value) -> Result<(), String> {
                if namespace == "props" && document.get("disabled").is_some() {
                    return Err("disabled is not allowed".to_string());
                }
                Ok(())
            }
        }

        let applier =
            PatchApplier::new(MemoryDocumentStore::new(), NoDisabledProps, IgnoreAssets);
        applier.store().insert("props", json!({}));
        applier.store().insert("styles", json!({}));

        let batch = [
            set("styles", "ok", json!(1)),
            set("props", "disabled", json!(true)),
        ];
        let err = applier.apply_batch(&batch).unwrap_err();
        assert!(matches!(err, ServerError::Validation { .. }));

        // The valid styles change was held back too.
        assert_eq!(applier.store().get("styles"), Some(json!({})));
        assert_eq!(applier.store().get("props"), Some(json!({})));
    }

    #[test]
    fn failing_patch_rejects_the_whole_batch() {
        let applier = applier();
        applier.store().insert("props", json!({}));

        let bad = TransactionPayload::new(vec![ChangePayload::new(
            "props",
            vec![Patch::replace(vec!["missing".into()], json!(1))],
        )]);
        let err = applier.apply_batch(&[set("props", "a", json!(1)), bad]).unwrap_err();
        assert!(matches!(err, ServerError::PatchFailed { .. }));
        assert_eq!(applier.store().get("props"), Some(json!({})));
    }

    #[test]
    fn replayed_payload_applies_once() {
        let applier = applier();
        applier.store().insert("props", json!({"list": []}));

        // An array insert is not idempotent, so a double application
        // would be visible.
        let payload = TransactionPayload::new(vec![ChangePayload::new(
            "props",
            vec![Patch::add(vec!["list".into(), 0.into()], json!("x"))],
        )]);

        applier.apply_batch(&[payload.clone()]).unwrap();
        let after_first = applier.store().get("props");

        // The retried flush carries the same payload id; the applier
        // skips it but still reports success.
        applier.apply_batch(&[payload]).unwrap();
        assert_eq!(applier.store().get("props"), after_first);
    }

    #[test]
    fn empty_changes_are_skipped() {
        let applier = applier();
        let payload =
            TransactionPayload::new(vec![ChangePayload::new("props", vec![])]);
        applier.apply_batch(&[payload]).unwrap();
        // Nothing was read or written for the empty change.
        assert_eq!(applier.store().get("props"), None);
    }

    #[test]
    fn handle_request_renders_the_verdict() {
        let applier = applier();
        let ok = applier.handle_request(&PatchRequest {
            build_id: "b".to_string(),
            project_id: "p".to_string(),
            transactions: vec![set("props", "a", json!(1))],
        });
        assert!(ok.is_ok());

        let rejected = applier.handle_request(&PatchRequest {
            build_id: "b".to_string(),
            project_id: "p".to_string(),
            transactions: vec![set("plugins", "x", json!(1))],
        });
        assert!(!rejected.is_ok());
        assert!(rejected.errors.unwrap().contains("unknown namespace"));
    }
}
