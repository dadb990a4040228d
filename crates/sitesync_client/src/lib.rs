//! # sitesync client
//!
//! Drains the editor's pending-transaction queue to the persistence
//! endpoint.
//!
//! The client never mutates documents. It reads payloads from a
//! [`PatchSource`] (normally a [`sitesync_store::SharedHistory`]),
//! posts them as one [`sitesync_protocol::PatchRequest`] per flush and
//! acknowledges them only after the server confirms, so transient
//! failures are invisible beyond latency.
//!
//! ```
//! use sitesync_client::{ClientConfig, MemorySource, MockTransport, SyncClient};
//!
//! let client = SyncClient::new(
//!     ClientConfig::new("build-1", "proj-1", "https://api.example.com"),
//!     MockTransport::new(),
//!     MemorySource::new(),
//! );
//! let report = client.flush().unwrap();
//! assert_eq!(report.sent, 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod http;
mod source;
mod transport;

pub use client::{FlushReport, SyncClient, SyncStats, SyncStatus};
pub use config::{ClientConfig, RetryConfig};
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, HttpTransport, LoopbackClient, LoopbackServer};
pub use source::{MemorySource, PatchSource};
pub use transport::{MockTransport, PatchTransport};
