//! The sync client state machine.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::source::PatchSource;
use crate::transport::PatchTransport;
use parking_lot::RwLock;
use sitesync_protocol::PatchRequest;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The current state of the sync client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Nothing in flight.
    Idle,
    /// A flush is running.
    Syncing,
    /// Waiting out a backoff delay before retrying.
    RetryWait,
    /// The last flush failed.
    Error,
}

/// Statistics about flush activity.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Successful flushes.
    pub flushes_completed: u64,
    /// Transactions acknowledged by the server.
    pub transactions_sent: u64,
    /// Retries performed.
    pub retries: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Result of one flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Transactions sent and acknowledged in this flush.
    pub sent: usize,
    /// Transactions still queued afterwards.
    pub remaining: usize,
}

/// Drains a [`PatchSource`] to the server over a [`PatchTransport`].
///
/// # Invariants
///
/// - At most one flush runs at a time; concurrent callers get
///   [`ClientError::FlushInFlight`]
/// - Payloads leave the source only after the server acknowledges
///   them, so a failed flush loses nothing
/// - Batches preserve enqueue order
pub struct SyncClient<T: PatchTransport, S: PatchSource> {
    config: ClientConfig,
    transport: Arc<T>,
    source: Arc<S>,
    status: RwLock<SyncStatus>,
    stats: RwLock<SyncStats>,
    in_flight: AtomicBool,
}

impl<T: PatchTransport, S: PatchSource> SyncClient<T, S> {
    /// Creates a client over the given transport and source.
    pub fn new(config: ClientConfig, transport: T, source: S) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            source: Arc::new(source),
            status: RwLock::new(SyncStatus::Idle),
            stats: RwLock::new(SyncStats::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> SyncStatus {
        *self.status.read()
    }

    /// Returns a snapshot of the flush statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends one batch from the front of the queue.
    ///
    /// On success the sent payloads are acknowledged and removed from
    /// the source. On any failure the queue is left untouched.
    pub fn flush(&self) -> ClientResult<FlushReport> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClientError::FlushInFlight);
        }
        let result = self.flush_inner();
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    /// Flushes with exponential backoff on transient failures.
    ///
    /// Rejections and protocol errors fail immediately; only
    /// retryable transport failures are retried, up to the configured
    /// attempt budget. Blocks the calling thread between attempts.
    pub fn flush_with_retry(&self) -> ClientResult<FlushReport> {
        let mut attempt = 0;
        loop {
            match self.flush() {
                Ok(report) => return Ok(report),
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt >= self.config.retry.max_attempts {
                        return Err(e);
                    }
                    self.stats.write().retries += 1;
                    *self.status.write() = SyncStatus::RetryWait;
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    tracing::debug!(attempt, ?delay, "retrying flush after transport failure");
                    std::thread::sleep(delay);
                }
            }
        }
    }

    fn flush_inner(&self) -> ClientResult<FlushReport> {
        let batch = self.source.pending_batch(self.config.batch_limit);
        if batch.is_empty() {
            *self.status.write() = SyncStatus::Idle;
            return Ok(FlushReport {
                sent: 0,
                remaining: 0,
            });
        }
        *self.status.write() = SyncStatus::Syncing;

        let ids: Vec<_> = batch.iter().map(|payload| payload.id).collect();
        let request = PatchRequest {
            build_id: self.config.build_id.clone(),
            project_id: self.config.project_id.clone(),
            transactions: batch,
        };

        let response = match self.transport.send_patch(&request) {
            Ok(response) => response,
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        };

        if let Some(errors) = response.errors {
            let e = ClientError::Rejected(errors);
            self.fail(&e);
            return Err(e);
        }

        self.source.acknowledge(&ids);
        let remaining = self.source.pending_len();
        {
            let mut stats = self.stats.write();
            stats.flushes_completed += 1;
            stats.transactions_sent += ids.len() as u64;
            stats.last_error = None;
        }
        *self.status.write() = SyncStatus::Idle;
        tracing::debug!(sent = ids.len(), remaining, "flush acknowledged");
        Ok(FlushReport {
            sent: ids.len(),
            remaining,
        })
    }

    fn fail(&self, e: &ClientError) {
        self.stats.write().last_error = Some(e.to_string());
        *self.status.write() = SyncStatus::Error;
        tracing::warn!(error = %e, "flush failed");
    }
}
