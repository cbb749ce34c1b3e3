//! Node classes and the registry of drawable node types
//!
//! A [`NodeClass`] is what a catalog entry resolves to: the drawing primitive
//! (shape and fill) used for every node of that type. The registry maps each
//! `(provider, category, type)` triple to its class and is built once.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::catalog::ProviderCatalog;
use crate::core::NodeShape;

/// Shared handle to a resolved node class
///
/// Handles are compared by identity (`Arc::ptr_eq`) when checking caching.
pub type NodeHandle = Arc<NodeClass>;

/// Cache and registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub provider: String,
    pub category: String,
    pub node_type: String,
}

impl NodeKey {
    /// Build a key; the provider is matched case-insensitively
    pub fn new(provider: &str, category: &str, node_type: &str) -> Self {
        Self {
            provider: provider.trim().to_lowercase(),
            category: category.to_string(),
            node_type: node_type.to_string(),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.provider, self.category, self.node_type)
    }
}

/// A drawable node type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeClass {
    provider: String,
    category: String,
    name: String,
    shape: NodeShape,
    fill_color: &'static str,
}

impl NodeClass {
    /// Create a node class for a catalog entry
    pub fn new(provider: &str, category: &str, name: &str) -> Self {
        Self {
            provider: provider.to_lowercase(),
            category: category.to_string(),
            name: name.to_string(),
            shape: NodeShape::for_category(category),
            fill_color: provider_fill(provider),
        }
    }

    /// The placeholder class used when nothing else resolves
    pub fn generic() -> Self {
        Self {
            provider: "generic".to_string(),
            category: "blank".to_string(),
            name: "Generic".to_string(),
            shape: NodeShape::Box,
            fill_color: provider_fill("generic"),
        }
    }

    /// Process-wide handle to the generic class
    pub fn generic_handle() -> NodeHandle {
        static GENERIC: OnceLock<NodeHandle> = OnceLock::new();
        GENERIC.get_or_init(|| Arc::new(Self::generic())).clone()
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> NodeShape {
        self.shape
    }

    pub fn fill_color(&self) -> &'static str {
        self.fill_color
    }

    /// Returns true for the placeholder class
    pub fn is_generic(&self) -> bool {
        *self == Self::generic()
    }

    /// `provider.category.Name`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.provider, self.category, self.name)
    }

    /// Create a node of this class
    pub fn instantiate(
        self: &Arc<Self>,
        id: impl Into<String>,
        label: impl Into<String>,
        properties: BTreeMap<String, String>,
    ) -> DrawableNode {
        DrawableNode::new(Arc::clone(self), id, label, properties)
    }
}

impl fmt::Display for NodeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

fn provider_fill(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "aws" => "#FDEBD0",
        "azure" => "#D6EAF8",
        "gcp" => "#D5F5E3",
        "k8s" => "#D6DBF5",
        "onprem" => "#EAECEE",
        "programming" => "#F4ECF7",
        _ => "#F8F9F9",
    }
}

/// A node instance ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableNode {
    id: String,
    label: String,
    properties: BTreeMap<String, String>,
    class: NodeHandle,
}

impl DrawableNode {
    /// Instantiate a node class with a label and properties
    pub fn new(
        class: NodeHandle,
        id: impl Into<String>,
        label: impl Into<String>,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties,
            class,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn class(&self) -> &NodeHandle {
        &self.class
    }
}

/// Registry of every drawable `(provider, category, type)` triple
#[derive(Debug, Default)]
pub struct NodeRegistry {
    classes: HashMap<NodeKey, NodeClass>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one class per catalog entry
    pub fn from_catalog(catalog: &ProviderCatalog) -> Self {
        let mut registry = Self::new();
        for (provider, category, name) in catalog.entries() {
            registry.register(NodeClass::new(provider, category, name));
        }
        debug!(classes = registry.len(), "Built node registry");
        registry
    }

    /// Process-wide registry built from the embedded catalog
    pub fn shared() -> Arc<NodeRegistry> {
        static SHARED: OnceLock<Arc<NodeRegistry>> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(Self::from_catalog(&ProviderCatalog::builtin())))
            .clone()
    }

    /// Add or replace a class
    pub fn register(&mut self, class: NodeClass) {
        let key = NodeKey::new(&class.provider, &class.category, &class.name);
        self.classes.insert(key, class);
    }

    /// Find the class for a triple
    pub fn lookup(&self, key: &NodeKey) -> Option<&NodeClass> {
        self.classes.get(key)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_class_shape_and_fill() {
        let class = NodeClass::new("AWS", "database", "RDS");
        assert_eq!(class.provider(), "aws");
        assert_eq!(class.shape(), NodeShape::Cylinder);
        assert_eq!(class.fill_color(), "#FDEBD0");
        assert_eq!(class.qualified_name(), "aws.database.RDS");
        assert!(!class.is_generic());
    }

    #[test]
    fn test_generic_handle_is_shared() {
        let a = NodeClass::generic_handle();
        let b = NodeClass::generic_handle();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_generic());
    }

    #[test]
    fn test_registry_from_builtin_catalog() {
        let registry = NodeRegistry::shared();
        let ec2 = registry.lookup(&NodeKey::new("aws", "compute", "EC2")).unwrap();
        assert_eq!(ec2.name(), "EC2");
        assert_eq!(ec2.shape(), NodeShape::Box3d);
        assert!(registry.lookup(&NodeKey::new("aws", "compute", "Mainframe")).is_none());
        assert!(registry.lookup(&NodeKey::new("GCP", "compute", "ComputeEngine")).is_some());
    }

    #[test]
    fn test_drawable_node() {
        let mut properties = BTreeMap::new();
        properties.insert("tier".to_string(), "web".to_string());
        let node = NodeClass::generic_handle().instantiate("web1", "Web", properties);
        assert_eq!(node.id(), "web1");
        assert_eq!(node.label(), "Web");
        assert_eq!(node.properties().get("tier").map(String::as_str), Some("web"));
        assert!(node.class().is_generic());
    }
}
