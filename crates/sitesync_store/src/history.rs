//! Undo/redo history and the pending-transmission queue.

use crate::error::StoreResult;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use sitesync_protocol::TransactionPayload;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Undo/redo stack plus the FIFO queue of unsent payloads.
///
/// Commit, undo and redo run synchronously within one UI event
/// handler; the queue is drained asynchronously by the sync client.
///
/// # Invariants
///
/// - The cursor always sits between 0 and `len()`
/// - Entries beyond the cursor are the redo tail; a commit discards it
/// - Every applied edit (commit, undo, redo) enqueues exactly one
///   payload, removed only on acknowledgment
#[derive(Default)]
pub struct EditHistory {
    entries: Vec<Transaction>,
    cursor: usize,
    pending: VecDeque<TransactionPayload>,
}

impl EditHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transaction that was already applied optimistically.
    ///
    /// Empty transactions are skipped entirely, which keeps the cursor
    /// aligned with what was actually applied. A commit after an undo
    /// truncates the redo tail.
    pub fn commit(&mut self, transaction: Transaction) -> StoreResult<()> {
        if transaction.is_empty() {
            return Ok(());
        }
        self.entries.truncate(self.cursor);
        self.pending.push_back(transaction.forward_payload());
        self.entries.push(transaction);
        self.cursor += 1;
        Ok(())
    }

    /// Steps the cursor back one transaction.
    ///
    /// Applies the revise patches per entry in reverse order and
    /// enqueues an equivalent reverting payload so the server's copy
    /// reverts too. Returns false (a no-op) at cursor 0.
    pub fn undo(&mut self) -> StoreResult<bool> {
        if self.cursor == 0 {
            return Ok(false);
        }
        self.cursor -= 1;
        let transaction = &self.entries[self.cursor];
        transaction.apply_reverse()?;
        self.pending.push_back(transaction.revert_payload());
        Ok(true)
    }

    /// Re-applies the transaction at the cursor.
    ///
    /// Returns false (a no-op) at the tip.
    pub fn redo(&mut self) -> StoreResult<bool> {
        if self.cursor == self.entries.len() {
            return Ok(false);
        }
        let transaction = &self.entries[self.cursor];
        transaction.apply_forward()?;
        self.pending.push_back(transaction.forward_payload());
        self.cursor += 1;
        Ok(true)
    }

    /// Returns true if an undo would apply.
    pub fn undo_available(&self) -> bool {
        self.cursor > 0
    }

    /// Returns true if a redo would apply.
    pub fn redo_available(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Returns the number of recorded transactions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no transactions are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the history cursor.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Clones the front of the pending queue, up to `limit`.
    ///
    /// Payloads stay queued until acknowledged.
    pub fn pending_batch(&self, limit: usize) -> Vec<TransactionPayload> {
        self.pending.iter().take(limit).cloned().collect()
    }

    /// Returns the number of unsent payloads.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Removes exactly the acknowledged payloads from the queue.
    ///
    /// Payloads enqueued mid-flight are untouched and go out with the
    /// next flush.
    pub fn acknowledge(&mut self, ids: &[Uuid]) {
        self.pending.retain(|payload| !ids.contains(&payload.id));
    }

    /// Drops the undo/redo stack. The unsent queue is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

/// A cloneable, lockable handle over an [`EditHistory`].
///
/// The UI thread commits through it while the sync client drains the
/// pending queue.
#[derive(Clone, Default)]
pub struct SharedHistory {
    inner: Arc<Mutex<EditHistory>>,
}

impl SharedHistory {
    /// Creates a handle over an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`EditHistory::commit`].
    pub fn commit(&self, transaction: Transaction) -> StoreResult<()> {
        self.inner.lock().commit(transaction)
    }

    /// See [`EditHistory::undo`].
    pub fn undo(&self) -> StoreResult<bool> {
        self.inner.lock().undo()
    }

    /// See [`EditHistory::redo`].
    pub fn redo(&self) -> StoreResult<bool> {
        self.inner.lock().redo()
    }

    /// See [`EditHistory::undo_available`].
    pub fn undo_available(&self) -> bool {
        self.inner.lock().undo_available()
    }

    /// See [`EditHistory::redo_available`].
    pub fn redo_available(&self) -> bool {
        self.inner.lock().redo_available()
    }

    /// See [`EditHistory::pending_batch`].
    pub fn pending_batch(&self, limit: usize) -> Vec<TransactionPayload> {
        self.inner.lock().pending_batch(limit)
    }

    /// See [`EditHistory::pending_len`].
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending_len()
    }

    /// See [`EditHistory::acknowledge`].
    pub fn acknowledge(&self, ids: &[Uuid]) {
        self.inner.lock().acknowledge(ids)
    }

    /// See [`EditHistory::clear`].
    pub fn clear(&self) {
        self.inner.lock().clear()
    }
}
