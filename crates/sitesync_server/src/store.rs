//! Persistence behind the applier.

use crate::error::ServerResult;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Reads and writes one build's namespace documents.
///
/// A production deployment backs this with its database; writes for
/// one batch happen only after every namespace folded and validated.
pub trait DocumentStore: Send + Sync {
    /// Reads a namespace document, `None` if never written.
    fn read(&self, namespace: &str) -> ServerResult<Option<Value>>;

    /// Writes a namespace document.
    fn write(&self, namespace: &str, value: &Value) -> ServerResult<()>;
}

/// In-memory store used in tests and single-process deployments.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a namespace document.
    pub fn insert(&self, namespace: impl Into<String>, value: Value) {
        self.documents.write().insert(namespace.into(), value);
    }

    /// Returns a namespace document, `None` if never written.
    pub fn get(&self, namespace: &str) -> Option<Value> {
        self.documents.read().get(namespace).cloned()
    }

    /// Returns the namespaces written so far, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<_> = self.documents.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn read(&self, namespace: &str) -> ServerResult<Option<Value>> {
        Ok(self.documents.read().get(namespace).cloned())
    }

    fn write(&self, namespace: &str, value: &Value) -> ServerResult<()> {
        self.documents
            .write()
            .insert(namespace.to_owned(), value.clone());
        Ok(())
    }
}
