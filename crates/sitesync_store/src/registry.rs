//! Namespace↔container binding.

use crate::container::Container;
use crate::error::{StoreError, StoreResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Binds each container to a stable namespace string.
///
/// One registry per document: passing it explicitly to whatever
/// constructs transactions keeps multiple independent documents (and
/// tests) isolated within one process.
#[derive(Default)]
pub struct StoreRegistry {
    namespaces: RwLock<HashMap<String, Container>>,
    containers: RwLock<HashMap<Uuid, String>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a namespace to a container, 1:1.
    ///
    /// Re-registering the identical pair is a no-op. Binding the same
    /// container to a different namespace, or a taken namespace to a
    /// different container, is a fatal usage error.
    pub fn register(&self, namespace: impl Into<String>, container: &Container) -> StoreResult<()> {
        let namespace = namespace.into();
        let mut namespaces = self.namespaces.write();
        let mut containers = self.containers.write();

        if let Some(existing) = containers.get(&container.id()) {
            if *existing != namespace {
                return Err(StoreError::ContainerRebound {
                    existing: existing.clone(),
                    requested: namespace,
                });
            }
            return Ok(());
        }
        if namespaces.contains_key(&namespace) {
            return Err(StoreError::NamespaceCollision { namespace });
        }

        namespaces.insert(namespace.clone(), container.clone());
        containers.insert(container.id(), namespace);
        Ok(())
    }

    /// Looks up the namespace a container is bound to.
    pub fn namespace_of(&self, container: &Container) -> Option<String> {
        self.containers.read().get(&container.id()).cloned()
    }

    /// Looks up the container bound to a namespace.
    pub fn container_for(&self, namespace: &str) -> Option<Container> {
        self.namespaces.read().get(namespace).cloned()
    }

    /// Returns all registered namespaces.
    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.read().keys().cloned().collect()
    }
}
