//! HTTP transport over a pluggable client.

use crate::error::{ClientError, ClientResult};
use crate::transport::PatchTransport;
use sitesync_protocol::{PatchRequest, PatchResponse};

/// Minimal HTTP client abstraction.
///
/// Keeps the crate free of a concrete HTTP dependency; hosts plug in
/// whatever stack they run on.
pub trait HttpClient: Send + Sync {
    /// Issues a POST with a JSON body, returning the response body.
    fn post(&self, url: &str, body: String) -> Result<String, String>;
}

/// [`PatchTransport`] posting JSON to the `/rest/patch` route.
pub struct HttpTransport<C: HttpClient> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a transport against the given base URL.
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn patch_url(&self) -> String {
        format!("{}/rest/patch", self.base_url.trim_end_matches('/'))
    }
}

impl<C: HttpClient> PatchTransport for HttpTransport<C> {
    fn send_patch(&self, request: &PatchRequest) -> ClientResult<PatchResponse> {
        let body = serde_json::to_string(request)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;
        // Network failures are transient by default.
        let reply = self
            .client
            .post(&self.patch_url(), body)
            .map_err(ClientError::transport_retryable)?;
        serde_json::from_str(&reply).map_err(|e| ClientError::Protocol(e.to_string()))
    }
}

/// Server half of an in-process round trip.
pub trait LoopbackServer: Send + Sync {
    /// Handles one serialized patch request, returning a serialized
    /// response or a transport-level failure.
    fn handle_patch(&self, body: &str) -> Result<String, String>;
}

/// [`HttpClient`] that dispatches straight into a [`LoopbackServer`].
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a loopback client over the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    fn post(&self, _url: &str, body: String) -> Result<String, String> {
        self.server.handle_patch(&body)
    }
}
