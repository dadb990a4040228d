//! Where the client gets its pending payloads from.

use parking_lot::Mutex;
use sitesync_protocol::TransactionPayload;
use sitesync_store::SharedHistory;
use std::collections::VecDeque;
use uuid::Uuid;

/// A queue of unsent payloads the client can drain.
///
/// Payloads stay queued until acknowledged so a failed flush loses
/// nothing.
pub trait PatchSource: Send + Sync {
    /// Clones the front of the queue, up to `limit`.
    fn pending_batch(&self, limit: usize) -> Vec<TransactionPayload>;

    /// Removes exactly the acknowledged payloads.
    fn acknowledge(&self, ids: &[Uuid]);

    /// Returns how many payloads are queued.
    fn pending_len(&self) -> usize;
}

impl PatchSource for SharedHistory {
    fn pending_batch(&self, limit: usize) -> Vec<TransactionPayload> {
        SharedHistory::pending_batch(self, limit)
    }

    fn acknowledge(&self, ids: &[Uuid]) {
        SharedHistory::acknowledge(self, ids)
    }

    fn pending_len(&self) -> usize {
        SharedHistory::pending_len(self)
    }
}

/// Standalone in-memory source for tests.
#[derive(Default)]
pub struct MemorySource {
    queue: Mutex<VecDeque<TransactionPayload>>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a payload.
    pub fn push(&self, payload: TransactionPayload) {
        self.queue.lock().push_back(payload);
    }
}

impl PatchSource for MemorySource {
    fn pending_batch(&self, limit: usize) -> Vec<TransactionPayload> {
        self.queue.lock().iter().take(limit).cloned().collect()
    }

    fn acknowledge(&self, ids: &[Uuid]) {
        self.queue.lock().retain(|payload| !ids.contains(&payload.id));
    }

    fn pending_len(&self) -> usize {
        self.queue.lock().len()
    }
}
