//! Observable document slice containers.

use crate::error::StoreResult;
use parking_lot::RwLock;
use serde_json::Value;
use sitesync_protocol::{apply_all, Patch};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

type Observer = Arc<dyn Fn(&Value) + Send + Sync>;

struct ContainerInner {
    id: Uuid,
    value: RwLock<Value>,
    observers: RwLock<Vec<(u64, Observer)>>,
    next_observer_id: AtomicU64,
}

/// A named, mutable, observable document slice.
///
/// Handles are cheap to clone and share one underlying value; identity
/// is the handle's [`Container::id`], stable for the session. Writes
/// go through the transaction machinery only; consumers such as the
/// canvas renderer read via [`Container::get`] or subscribe.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Creates a container holding the given initial value.
    pub fn new(initial: Value) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                id: Uuid::new_v4(),
                value: RwLock::new(initial),
                observers: RwLock::new(Vec::new()),
                next_observer_id: AtomicU64::new(1),
            }),
        }
    }

    /// Returns the container's stable identity.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Returns a snapshot of the current value.
    pub fn get(&self) -> Value {
        self.inner.value.read().clone()
    }

    /// Registers an observer called with each republished value.
    ///
    /// The returned subscription is a scoped resource: dropping it (or
    /// calling `unsubscribe`) releases the handler.
    pub fn subscribe(
        &self,
        handler: impl Fn(&Value) + Send + Sync + 'static,
    ) -> ContainerSubscription {
        let id = self.inner.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.write().push((id, Arc::new(handler)));
        ContainerSubscription {
            inner: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Returns the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.observers.read().len()
    }

    /// Republishes the value and notifies observers.
    pub(crate) fn replace(&self, value: Value) {
        *self.inner.value.write() = value.clone();
        self.notify(&value);
    }

    /// Applies patches against a working copy and republishes on success.
    ///
    /// A failing patch leaves the published value untouched.
    pub(crate) fn apply_patches(&self, patches: &[Patch]) -> StoreResult<()> {
        if patches.is_empty() {
            return Ok(());
        }
        let mut next = self.inner.value.read().clone();
        apply_all(&mut next, patches)?;
        self.replace(next);
        Ok(())
    }

    /// Observers run outside the registry lock, so an observer may
    /// subscribe or unsubscribe on this container. Observers added
    /// during a notification see the next republish, not this one.
    fn notify(&self, value: &Value) {
        let observers: Vec<Observer> = self
            .inner
            .observers
            .read()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in observers {
            handler(value);
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

/// Handle releasing a container observer on drop.
pub struct ContainerSubscription {
    inner: Weak<ContainerInner>,
    id: u64,
}

impl ContainerSubscription {
    /// Explicitly releases the observer.
    pub fn unsubscribe(self) {
        // Removal happens in Drop.
    }
}

impl Drop for ContainerSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.observers.write().retain(|(id, _)| *id != self.id);
        }
    }
}
