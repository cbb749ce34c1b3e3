//! Node class loader
//!
//! Resolves `(provider, category, type)` to a [`NodeHandle`] from the node
//! registry and memoizes every answer, including "not found". Identical
//! triples return the identical handle until [`NodeClassLoader::clear_cache`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::trace;

use super::{NodeHandle, NodeKey, NodeRegistry};

/// Source of node class handles
pub trait NodeLoader: Send + Sync {
    /// Load the class for a triple; `None` if the provider is unsupported or
    /// the type does not exist in the category
    fn load_node_class(&self, provider: &str, category: &str, node_type: &str)
        -> Option<NodeHandle>;
}

/// Registry-backed loader with a memoization table
#[derive(Debug)]
pub struct NodeClassLoader {
    registry: Arc<NodeRegistry>,
    cache: RwLock<HashMap<NodeKey, Option<NodeHandle>>>,
    lookups: AtomicUsize,
}

impl NodeClassLoader {
    /// Create a loader over the shared built-in registry
    pub fn new() -> Self {
        Self::with_registry(NodeRegistry::shared())
    }

    /// Create a loader over a specific registry
    pub fn with_registry(registry: Arc<NodeRegistry>) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Drop every memoized answer
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of memoized triples
    pub fn cache_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of registry lookups performed (cache misses)
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn lookup(&self, key: &NodeKey) -> Option<NodeHandle> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.registry.lookup(key).cloned().map(Arc::new)
    }
}

impl Default for NodeClassLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeLoader for NodeClassLoader {
    fn load_node_class(
        &self,
        provider: &str,
        category: &str,
        node_type: &str,
    ) -> Option<NodeHandle> {
        let key = NodeKey::new(provider, category, node_type);

        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            trace!(key = %key, hit = cached.is_some(), "Node class cache hit");
            return cached.clone();
        }

        let resolved = self.lookup(&key);
        trace!(key = %key, found = resolved.is_some(), "Node class looked up");

        // A racing writer may have filled the slot first; keep its handle so
        // every caller sees the same one.
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(resolved)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_node_class() {
        let loader = NodeClassLoader::new();
        let class = loader.load_node_class("aws", "compute", "EC2").unwrap();
        assert_eq!(class.name(), "EC2");
        assert_eq!(class.category(), "compute");
    }

    #[test]
    fn test_provider_is_case_insensitive() {
        let loader = NodeClassLoader::new();
        assert!(loader.load_node_class("AWS", "compute", "EC2").is_some());
    }

    #[test]
    fn test_load_invalid_node_class() {
        let loader = NodeClassLoader::new();
        assert!(loader.load_node_class("invalid", "invalid", "Invalid").is_none());
        assert!(loader.load_node_class("aws", "compute", "Mainframe").is_none());
    }

    #[test]
    fn test_caching_returns_identical_handle() {
        let loader = NodeClassLoader::new();
        let first = loader.load_node_class("aws", "compute", "EC2").unwrap();
        let second = loader.load_node_class("aws", "compute", "EC2").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.lookup_count(), 1);
    }

    #[test]
    fn test_not_found_is_cached() {
        let loader = NodeClassLoader::new();
        assert!(loader.load_node_class("aws", "compute", "Nope").is_none());
        assert!(loader.load_node_class("aws", "compute", "Nope").is_none());
        assert_eq!(loader.lookup_count(), 1);
        assert_eq!(loader.cache_len(), 1);
    }

    #[test]
    fn test_clear_cache() {
        let loader = NodeClassLoader::new();
        let first = loader.load_node_class("aws", "compute", "EC2").unwrap();
        assert!(loader.cache_len() > 0);

        loader.clear_cache();
        assert_eq!(loader.cache_len(), 0);

        let reloaded = loader.load_node_class("aws", "compute", "EC2").unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(*first, *reloaded);
        assert_eq!(loader.lookup_count(), 2);
    }
}
