//! Namespace schema and validation hooks.

use serde_json::Value;

/// The asset namespace is metadata over separately uploaded binaries,
/// so its patches route to an [`crate::AssetChanges`] delegate instead
/// of the document store.
pub const ASSETS_NAMESPACE: &str = "assets";

/// Every namespace the applier accepts.
pub const KNOWN_NAMESPACES: [&str; 9] = [
    "pages",
    "instances",
    "props",
    "styleSourceSelections",
    "styleSources",
    "styles",
    "breakpoints",
    "assets",
    "designTokens",
];

/// Returns true if the applier accepts changes for this namespace.
pub fn is_known_namespace(namespace: &str) -> bool {
    KNOWN_NAMESPACES.contains(&namespace)
}

/// Validates a folded namespace document before it is persisted.
pub trait SchemaValidator: Send + Sync {
    /// Checks one namespace document, returning a message on failure.
    fn validate(&self, namespace: &str, document: &Value) -> Result<(), String>;
}

/// Accepts every document. The default when no schema is deployed.
#[derive(Default)]
pub struct PermissiveValidator;

impl SchemaValidator for PermissiveValidator {
    fn validate(&self, _namespace: &str, _document: &Value) -> Result<(), String> {
        Ok(())
    }
}
