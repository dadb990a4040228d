//! Full round trips from the editor stores to a persisted build.

use serde_json::json;
use sitesync_client::{
    ClientConfig, HttpClient, HttpTransport, LoopbackClient, LoopbackServer, RetryConfig,
    SyncClient,
};
use sitesync_server::{IgnoreAssets, MemoryDocumentStore, PatchApplier, PermissiveValidator};
use sitesync_store::{create_transaction, Container, SharedHistory, StoreRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Applier = PatchApplier<MemoryDocumentStore, PermissiveValidator, IgnoreAssets>;

/// Adapts the applier to the in-process transport.
struct ApplierServer {
    applier: Arc<Applier>,
}

impl LoopbackServer for ApplierServer {
    fn handle_patch(&self, body: &str) -> Result<String, String> {
        let request = serde_json::from_str(body).map_err(|e| e.to_string())?;
        let response = self.applier.handle_request(&request);
        serde_json::to_string(&response).map_err(|e| e.to_string())
    }
}

/// Drops the first `failures` posts on the floor, then delegates.
struct FlakyClient<C: HttpClient> {
    inner: C,
    failures: AtomicUsize,
}

impl<C: HttpClient> HttpClient for FlakyClient<C> {
    fn post(&self, url: &str, body: String) -> Result<String, String> {
        if self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err("connection dropped".to_string());
        }
        self.inner.post(url, body)
    }
}

fn editor() -> (StoreRegistry, Container, Container, SharedHistory) {
    let registry = StoreRegistry::new();
    let instances = Container::new(json!({"id": "root", "children": []}));
    let props = Container::new(json!({}));
    registry.register("instances", &instances).unwrap();
    registry.register("props", &props).unwrap();
    (registry, instances, props, SharedHistory::new())
}

fn server() -> Arc<Applier> {
    let applier = Arc::new(PatchApplier::new(
        MemoryDocumentStore::new(),
        PermissiveValidator,
        IgnoreAssets,
    ));
    applier.store().insert("instances", json!({"id": "root", "children": []}));
    applier.store().insert("props", json!({}));
    applier
}

fn client_over(
    applier: &Arc<Applier>,
    history: &SharedHistory,
    failures: usize,
) -> SyncClient<HttpTransport<FlakyClient<LoopbackClient<ApplierServer>>>, SharedHistory> {
    let http = FlakyClient {
        inner: LoopbackClient::new(ApplierServer {
            applier: Arc::clone(applier),
        }),
        failures: AtomicUsize::new(failures),
    };
    let retry = RetryConfig::new(5)
        .with_initial_delay(Duration::from_millis(1))
        .without_jitter();
    let config = ClientConfig::new("build-1", "proj-1", "https://api.example.com")
        .with_retry(retry);
    SyncClient::new(config, HttpTransport::new(http, "https://api.example.com"), history.clone())
}

#[test]
fn edits_survive_a_dropped_connection() {
    let (registry, instances, props, history) = editor();
    let applier = server();
    let client = client_over(&applier, &history, 1);

    // Two edits queued before the flush.
    let t1 = create_transaction(&registry, &[instances.clone()], |drafts| {
        let children = drafts[0]
            .pointer_mut("/children")
            .unwrap()
            .as_array_mut()
            .unwrap();
        children.push(json!({"id": "hero"}));
    })
    .unwrap();
    history.commit(t1).unwrap();

    let t2 = create_transaction(&registry, &[props.clone()], |drafts| {
        drafts[0]["hero:title"] = json!("Welcome");
    })
    .unwrap();
    history.commit(t2).unwrap();
    assert_eq!(history.pending_len(), 2);

    // First attempt fails in transit; the queue is intact and ordered.
    let err = client.flush().unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(history.pending_len(), 2);

    // The retry delivers both and empties the queue.
    let report = client.flush_with_retry().unwrap();
    assert_eq!(report.sent, 2);
    assert_eq!(history.pending_len(), 0);

    // The persisted build matches the editor's containers.
    assert_eq!(applier.store().get("instances"), Some(instances.get()));
    assert_eq!(applier.store().get("props"), Some(props.get()));
}

#[test]
fn undo_and_redo_propagate_to_the_server() {
    let (registry, instances, _props, history) = editor();
    let applier = server();
    let client = client_over(&applier, &history, 0);

    let transaction = create_transaction(&registry, &[instances.clone()], |drafts| {
        let children = drafts[0]
            .pointer_mut("/children")
            .unwrap()
            .as_array_mut()
            .unwrap();
        children.push(json!({"id": "x"}));
    })
    .unwrap();
    history.commit(transaction).unwrap();
    client.flush().unwrap();
    assert_eq!(applier.store().get("instances"), Some(instances.get()));

    // Undo reverts the server copy too.
    assert!(history.undo().unwrap());
    client.flush().unwrap();
    assert_eq!(
        applier.store().get("instances"),
        Some(json!({"id": "root", "children": []}))
    );

    // Redo restores it, with a fresh payload id so dedup stays out of
    // the way.
    assert!(history.redo().unwrap());
    client.flush().unwrap();
    assert_eq!(
        applier.store().get("instances"),
        Some(json!({"id": "root", "children": [{"id": "x"}]}))
    );
}

#[test]
fn replayed_batch_after_lost_acknowledgment_is_idempotent() {
    let (registry, instances, _props, history) = editor();
    let applier = server();
    let client = client_over(&applier, &history, 0);

    let transaction = create_transaction(&registry, &[instances.clone()], |drafts| {
        let children = drafts[0]
            .pointer_mut("/children")
            .unwrap()
            .as_array_mut()
            .unwrap();
        children.push(json!({"id": "once"}));
    })
    .unwrap();
    history.commit(transaction).unwrap();

    // Simulate a lost acknowledgment: send the same batch twice.
    let batch = history.pending_batch(10);
    applier.apply_batch(&batch).unwrap();
    client.flush().unwrap();

    assert_eq!(
        applier.store().get("instances"),
        Some(json!({"id": "root", "children": [{"id": "once"}]}))
    );
}
