//! # sitesync bus
//!
//! Typed publish/subscribe bridging the editor chrome and the canvas
//! surface.
//!
//! The bus carries transient signals only (hover, selection, drag
//! lifecycle); authoritative document state flows through containers
//! and transactions, never the bus.
//!
//! ## Delivery model
//!
//! - FIFO per direction, no interleaving guarantee between directions
//! - At-most-once, unacknowledged: a message delivered while no
//!   handler is registered is dropped, so reliability-sensitive
//!   callers re-publish on mount
//! - Subscriptions are scoped resources released on drop, so handlers
//!   do not leak across remounts

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod loopback;

pub use error::{BusError, BusResult};
pub use loopback::{LoopbackChannel, LoopbackPort};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// A transient signal exchanged between the two script contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Message discriminator, `type` on the wire.
    #[serde(rename = "type")]
    pub kind: String,
    /// Arbitrary payload.
    pub payload: Value,
}

impl BusMessage {
    /// Creates a message.
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// The outbound transport collaborator.
///
/// Implemented over window messaging, a socket, or an in-process
/// queue ([`LoopbackChannel`]) for tests.
pub trait MessagePort: Send + Sync {
    /// Posts one serialized frame to the other context.
    fn post(&self, frame: &str) -> BusResult<()>;
}

type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
struct HandlerTable {
    entries: RwLock<HashMap<String, Vec<(u64, Handler)>>>,
    next_id: AtomicU64,
}

/// One context's end of the cross-context bus.
pub struct ContextBus {
    port: Box<dyn MessagePort>,
    handlers: Arc<HandlerTable>,
}

impl ContextBus {
    /// Creates a bus endpoint posting through the given port.
    pub fn new(port: impl MessagePort + 'static) -> Self {
        Self {
            port: Box::new(port),
            handlers: Arc::new(HandlerTable::default()),
        }
    }

    /// Serializes a message and posts it to the other context.
    ///
    /// Fire and forget: delivery is not acknowledged.
    pub fn publish(&self, message: &BusMessage) -> BusResult<()> {
        let frame = serde_json::to_string(message)?;
        self.port.post(&frame)
    }

    /// Registers a handler for one message kind.
    ///
    /// The returned subscription releases the handler when dropped.
    pub fn subscribe(
        &self,
        kind: impl Into<String>,
        handler: impl Fn(&Value) + Send + Sync + 'static,
    ) -> BusSubscription {
        let kind = kind.into();
        let id = self.handlers.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .entries
            .write()
            .entry(kind.clone())
            .or_default()
            .push((id, Arc::new(handler)));
        BusSubscription {
            table: Arc::downgrade(&self.handlers),
            kind,
            id,
        }
    }

    /// Dispatches one inbound frame to its kind's handlers.
    ///
    /// The host calls this with frames arriving from the transport, in
    /// arrival order. A frame with no registered handlers is dropped.
    ///
    /// Handlers run outside the table lock, so a handler may subscribe
    /// or drop subscriptions on this bus. Handlers registered during
    /// dispatch see the next message, not the current one.
    pub fn deliver(&self, frame: &str) -> BusResult<()> {
        let message: BusMessage =
            serde_json::from_str(frame).map_err(|e| BusError::MalformedFrame(e.to_string()))?;
        let handlers: Vec<Handler> = {
            let entries = self.handlers.entries.read();
            entries
                .get(&message.kind)
                .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            handler(&message.payload);
        }
        Ok(())
    }

    /// Returns the number of handlers registered for a kind.
    pub fn handler_count(&self, kind: &str) -> usize {
        self.handlers
            .entries
            .read()
            .get(kind)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }
}

/// Handle releasing a bus handler on drop.
pub struct BusSubscription {
    table: Weak<HandlerTable>,
    kind: String,
    id: u64,
}

impl BusSubscription {
    /// Explicitly releases the handler.
    pub fn unsubscribe(self) {
        // Removal happens in Drop.
    }
}

impl Drop for BusSubscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            let mut entries = table.entries.write();
            if let Some(handlers) = entries.get_mut(&self.kind) {
                handlers.retain(|(id, _)| *id != self.id);
                if handlers.is_empty() {
                    entries.remove(&self.kind);
                }
            }
        }
    }
}
