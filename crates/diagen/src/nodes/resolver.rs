//! Node resolver
//!
//! Maps a requested `(provider, category, type)` to a usable node class.
//! Generated specifications often name near-misses of real catalog entries
//! (typos, plurals, abbreviations), so resolution goes exact match → fuzzy
//! suggestion → generic placeholder and never fails.

use std::sync::Arc;

use tracing::{debug, trace};

use super::{NodeClass, NodeClassLoader, NodeHandle, NodeLoader};
use crate::catalog::{NodeCatalog, ProviderCatalog};

/// How a handle was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionKind {
    /// The requested type exists in the catalog
    Exact,
    /// The requested type was replaced by the named catalog entry
    Suggested(String),
    /// Nothing matched; the generic placeholder was used
    Generic,
}

/// Result of [`NodeResolver::resolve`]
#[derive(Debug, Clone)]
pub struct Resolution {
    pub handle: NodeHandle,
    pub kind: ResolutionKind,
}

impl Resolution {
    /// Returns true if the resolved class differs from the requested type
    pub fn is_substitution(&self) -> bool {
        !matches!(self.kind, ResolutionKind::Exact)
    }
}

/// Best-effort resolution of requested node types
pub struct NodeResolver {
    catalog: Arc<dyn NodeCatalog>,
    loader: Arc<dyn NodeLoader>,
    generic: NodeHandle,
}

impl NodeResolver {
    /// Create a resolver over a catalog and a loader
    pub fn new(catalog: Arc<dyn NodeCatalog>, loader: Arc<dyn NodeLoader>) -> Self {
        Self {
            catalog,
            loader,
            generic: NodeClass::generic_handle(),
        }
    }

    /// Create a resolver over the built-in catalog and a fresh loader
    pub fn with_builtin_catalog() -> Self {
        Self::new(ProviderCatalog::shared(), Arc::new(NodeClassLoader::new()))
    }

    /// The placeholder handle returned when nothing resolves
    pub fn generic_handle(&self) -> &NodeHandle {
        &self.generic
    }

    /// Resolve to a handle; always succeeds
    pub fn resolve_node(&self, provider: &str, category: &str, node_type: &str) -> NodeHandle {
        self.resolve(provider, category, node_type).handle
    }

    /// Resolve to a handle and report how it was obtained
    pub fn resolve(&self, provider: &str, category: &str, node_type: &str) -> Resolution {
        if self.catalog.node_exists(provider, category, node_type) {
            if let Some(handle) = self.loader.load_node_class(provider, category, node_type) {
                trace!(provider, category, node_type, "Resolved exact node type");
                return Resolution {
                    handle,
                    kind: ResolutionKind::Exact,
                };
            }
            debug!(provider, category, node_type, "Catalog entry has no drawable class");
        }

        let suggestions = self.find_suggestions(provider, category, node_type);
        if let Some(first) = suggestions.first() {
            if let Some(handle) = self.loader.load_node_class(provider, category, first) {
                debug!(
                    provider,
                    category,
                    requested = node_type,
                    suggested = first.as_str(),
                    "Resolved node type through suggestion"
                );
                return Resolution {
                    handle,
                    kind: ResolutionKind::Suggested(first.clone()),
                };
            }
        }

        debug!(provider, category, node_type, "Falling back to generic node");
        Resolution {
            handle: self.generic.clone(),
            kind: ResolutionKind::Generic,
        }
    }

    /// Catalog entries of the category that resemble `query`
    ///
    /// Case-insensitive exact matches come first, then substring matches in
    /// either direction, then prefix matches; within each tier entries keep
    /// catalog order, and no entry appears twice.
    pub fn find_suggestions(&self, provider: &str, category: &str, query: &str) -> Vec<String> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let nodes = self.catalog.category_nodes(provider, category);
        let lowered: Vec<String> = nodes.iter().map(|name| name.to_lowercase()).collect();

        let exact = lowered.iter().enumerate().filter(|(_, name)| **name == query);
        let substring = lowered
            .iter()
            .enumerate()
            .filter(|(_, name)| name.contains(&query) || query.contains(name.as_str()));
        let prefix = lowered
            .iter()
            .enumerate()
            .filter(|(_, name)| name.starts_with(&query));

        let mut suggestions: Vec<String> = Vec::new();
        for (index, _) in exact.chain(substring).chain(prefix) {
            let name = &nodes[index];
            if !suggestions.contains(name) {
                suggestions.push(name.clone());
            }
        }

        trace!(query = %query, count = suggestions.len(), "Computed suggestions");
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Catalog with one hand-written category table
    struct FakeCatalog {
        nodes: Vec<String>,
        exists: bool,
    }

    impl FakeCatalog {
        fn with_nodes(nodes: &[&str]) -> Self {
            Self {
                nodes: nodes.iter().map(|s| s.to_string()).collect(),
                exists: false,
            }
        }
    }

    impl NodeCatalog for FakeCatalog {
        fn node_exists(&self, _: &str, _: &str, _: &str) -> bool {
            self.exists
        }

        fn category_nodes(&self, _: &str, _: &str) -> &[String] {
            &self.nodes
        }

        fn has_provider(&self, _: &str) -> bool {
            true
        }
    }

    /// Loader that hands out one handle per name and records every call
    #[derive(Default)]
    struct RecordingLoader {
        handles: Mutex<HashMap<String, NodeHandle>>,
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl NodeLoader for RecordingLoader {
        fn load_node_class(&self, provider: &str, category: &str, node_type: &str) -> Option<NodeHandle> {
            self.calls.lock().unwrap().push(node_type.to_string());
            if self.fail {
                return None;
            }
            let mut handles = self.handles.lock().unwrap();
            Some(
                handles
                    .entry(node_type.to_string())
                    .or_insert_with(|| Arc::new(NodeClass::new(provider, category, node_type)))
                    .clone(),
            )
        }
    }

    fn resolver(catalog: FakeCatalog, loader: RecordingLoader) -> (NodeResolver, Arc<RecordingLoader>) {
        let loader = Arc::new(loader);
        let resolver = NodeResolver::new(Arc::new(catalog), loader.clone());
        (resolver, loader)
    }

    #[test]
    fn test_resolve_exact_match() {
        let mut catalog = FakeCatalog::with_nodes(&["EC2"]);
        catalog.exists = true;
        let (resolver, loader) = resolver(catalog, RecordingLoader::default());

        let resolution = resolver.resolve("aws", "compute", "EC2");
        assert_eq!(resolution.handle.name(), "EC2");
        assert_eq!(resolution.kind, ResolutionKind::Exact);
        assert!(!resolution.is_substitution());
        assert_eq!(*loader.calls.lock().unwrap(), vec!["EC2"]);
    }

    #[test]
    fn test_resolve_with_suggestion() {
        let catalog = FakeCatalog::with_nodes(&["Lambda", "EC2"]);
        let (resolver, _) = resolver(catalog, RecordingLoader::default());

        let resolution = resolver.resolve("aws", "compute", "lamb");
        assert_eq!(resolution.handle.name(), "Lambda");
        assert_eq!(resolution.kind, ResolutionKind::Suggested("Lambda".to_string()));
        assert!(resolution.is_substitution());
    }

    #[test]
    fn test_resolve_prefix_query() {
        let catalog = FakeCatalog::with_nodes(&["Lambda", "LambdaFunction"]);
        let (resolver, _) = resolver(catalog, RecordingLoader::default());

        let handle = resolver.resolve_node("aws", "compute", "lam");
        assert!(handle.name().starts_with("Lam"));
        assert!(!handle.is_generic());
    }

    #[test]
    fn test_resolve_fallback_to_generic() {
        let catalog = FakeCatalog::with_nodes(&[]);
        let (resolver, _) = resolver(catalog, RecordingLoader::default());

        let resolution = resolver.resolve("invalid", "invalid", "invalid");
        assert!(Arc::ptr_eq(&resolution.handle, resolver.generic_handle()));
        assert_eq!(resolution.kind, ResolutionKind::Generic);
    }

    #[test]
    fn test_resolve_generic_when_loader_fails() {
        let catalog = FakeCatalog::with_nodes(&["Lambda"]);
        let loader = RecordingLoader {
            fail: true,
            ..Default::default()
        };
        let (resolver, _) = resolver(catalog, loader);

        let handle = resolver.resolve_node("aws", "compute", "lambda");
        assert!(handle.is_generic());
    }

    #[test]
    fn test_find_suggestions_exact_match_first() {
        let catalog = FakeCatalog::with_nodes(&["ECS", "EC2Instance", "EC2", "Lambda"]);
        let (resolver, _) = resolver(catalog, RecordingLoader::default());

        let suggestions = resolver.find_suggestions("aws", "compute", "ec2");
        assert_eq!(suggestions, vec!["EC2", "EC2Instance"]);
    }

    #[test]
    fn test_find_suggestions_partial_match() {
        let catalog = FakeCatalog::with_nodes(&["RDSInstance", "RDSCluster", "Aurora"]);
        let (resolver, _) = resolver(catalog, RecordingLoader::default());

        let suggestions = resolver.find_suggestions("aws", "database", "rds");
        assert_eq!(suggestions, vec!["RDSInstance", "RDSCluster"]);
    }

    #[test]
    fn test_find_suggestions_query_contains_name() {
        let catalog = FakeCatalog::with_nodes(&["Aurora", "RDS"]);
        let (resolver, _) = resolver(catalog, RecordingLoader::default());

        let suggestions = resolver.find_suggestions("aws", "database", "RDSPostgres");
        assert_eq!(suggestions, vec!["RDS"]);
    }

    #[test]
    fn test_find_suggestions_empty_query() {
        let catalog = FakeCatalog::with_nodes(&["EC2"]);
        let (resolver, _) = resolver(catalog, RecordingLoader::default());
        assert!(resolver.find_suggestions("aws", "compute", "  ").is_empty());
    }

    #[test]
    fn test_resolve_node_is_idempotent_through_loader_cache() {
        let loader = Arc::new(NodeClassLoader::new());
        let resolver = NodeResolver::new(ProviderCatalog::shared(), loader.clone());

        let first = resolver.resolve_node("aws", "compute", "EC2");
        let second = resolver.resolve_node("aws", "compute", "EC2");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.lookup_count(), 1);
    }

    #[test]
    fn test_builtin_near_misses() {
        let resolver = NodeResolver::with_builtin_catalog();
        assert_eq!(resolver.resolve_node("aws", "compute", "lambda").name(), "Lambda");
        assert_eq!(resolver.resolve_node("aws", "database", "RDSPostgres").name(), "RDS");
        assert!(resolver.resolve_node("aws", "invalid_category", "NonExistentNode").is_generic());
    }
}
