//! Transport abstraction between the client and the server.

use crate::error::ClientResult;
use parking_lot::Mutex;
use sitesync_protocol::{PatchRequest, PatchResponse};
use std::collections::VecDeque;

/// Delivers one patch request and returns the server's verdict.
///
/// The client never interprets transport internals; failures surface
/// as [`crate::ClientError::Transport`] with a retryability flag.
pub trait PatchTransport: Send + Sync {
    /// Sends a batch of transactions to the server.
    fn send_patch(&self, request: &PatchRequest) -> ClientResult<PatchResponse>;
}

/// Scriptable in-memory transport for tests.
///
/// Responses are served from a FIFO script; once the script is
/// exhausted every request succeeds. All requests are recorded for
/// inspection.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<ClientResult<PatchResponse>>>,
    requests: Mutex<Vec<PatchRequest>>,
}

impl MockTransport {
    /// Creates a transport that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an arbitrary scripted result.
    pub fn enqueue(&self, result: ClientResult<PatchResponse>) {
        self.script.lock().push_back(result);
    }

    /// Queues one successful response.
    pub fn enqueue_ok(&self) {
        self.enqueue(Ok(PatchResponse::ok()));
    }

    /// Queues one transport failure.
    pub fn enqueue_failure(&self, message: &str, retryable: bool) {
        self.enqueue(Err(crate::ClientError::Transport {
            message: message.to_owned(),
            retryable,
        }));
    }

    /// Returns every request sent so far.
    pub fn requests(&self) -> Vec<PatchRequest> {
        self.requests.lock().clone()
    }

    /// Returns how many requests were sent.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl PatchTransport for MockTransport {
    fn send_patch(&self, request: &PatchRequest) -> ClientResult<PatchResponse> {
        self.requests.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or(Ok(PatchResponse::ok()))
    }
}
