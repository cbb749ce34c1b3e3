//! Provider catalog
//!
//! Static registry of `provider → category → node type names`. The catalog is
//! loaded once and only read afterwards. Loading is fail-soft: an unreadable
//! or malformed source produces an empty catalog and a warning, and every
//! lookup against it simply reports "not found".

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::DiagramError;

/// Catalog document embedded in the library
pub const BUILTIN_CATALOG: &str = include_str!("builtin.json");

type CategoryMap = BTreeMap<String, Vec<String>>;

/// Read access to catalog entries
///
/// This is the seam the node resolver and the validator depend on, so tests
/// can substitute a hand-built table.
pub trait NodeCatalog: Send + Sync {
    /// Check whether the exact node type exists in the category
    fn node_exists(&self, provider: &str, category: &str, node_type: &str) -> bool;

    /// Node type names of a category, in catalog order; empty if unknown
    fn category_nodes(&self, provider: &str, category: &str) -> &[String];

    /// Check whether the provider is present at all
    fn has_provider(&self, provider: &str) -> bool;
}

/// A node type found by [`ProviderCatalog::search_nodes`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub name: String,
    pub provider: String,
    pub category: String,
}

/// Per-provider statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub display_name: String,
    pub total_nodes: usize,
    pub categories: Vec<String>,
}

/// Statistics over the whole catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub total_providers: usize,
    pub total_nodes: usize,
    pub providers: Vec<ProviderInfo>,
}

/// Static provider → category → node type table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCatalog {
    providers: BTreeMap<String, CategoryMap>,
}

impl ProviderCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog document
    ///
    /// Provider names are stored lowercase; category and node names are kept
    /// as written.
    pub fn from_json_str(source: &str) -> Result<Self, DiagramError> {
        let raw: BTreeMap<String, CategoryMap> = serde_json::from_str(source)?;
        let mut providers: BTreeMap<String, CategoryMap> = BTreeMap::new();
        for (provider, categories) in raw {
            let key = provider.trim().to_lowercase();
            if key.is_empty() {
                return Err(DiagramError::catalog_error("provider name must not be empty"));
            }
            let entry = providers.entry(key).or_default();
            for (category, nodes) in categories {
                entry.entry(category).or_default().extend(nodes);
            }
        }
        Ok(Self { providers })
    }

    /// Load a catalog file, falling back to an empty catalog on any failure
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(DiagramError::from)
            .and_then(|source| Self::from_json_str(&source));

        match loaded {
            Ok(catalog) => {
                info!(
                    path = %path.display(),
                    providers = catalog.providers.len(),
                    "Loaded provider catalog"
                );
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Catalog unavailable, using empty catalog");
                Self::new()
            }
        }
    }

    /// Parse the embedded catalog, falling back to an empty catalog
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_CATALOG).unwrap_or_else(|e| {
            warn!(error = %e, "Built-in catalog is malformed, using empty catalog");
            Self::new()
        })
    }

    /// Process-wide copy of the embedded catalog, parsed on first use
    pub fn shared() -> Arc<ProviderCatalog> {
        static SHARED: OnceLock<Arc<ProviderCatalog>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::builtin())).clone()
    }

    /// Returns true if the catalog has no providers
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn categories(&self, provider: &str) -> Option<&CategoryMap> {
        self.providers.get(&provider.trim().to_lowercase())
    }

    /// All provider names
    pub fn get_all_providers(&self) -> BTreeSet<String> {
        self.providers.keys().cloned().collect()
    }

    /// Category names of a provider; empty if the provider is unknown
    pub fn get_provider_categories(&self, provider: &str) -> Vec<String> {
        self.categories(provider)
            .map(|categories| categories.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Node type names of a category; empty if unknown
    pub fn get_category_nodes(&self, provider: &str, category: &str) -> &[String] {
        self.categories(provider)
            .and_then(|categories| categories.get(category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check whether the exact node type exists
    pub fn node_exists(&self, provider: &str, category: &str, node_type: &str) -> bool {
        self.get_category_nodes(provider, category)
            .iter()
            .any(|name| name == node_type)
    }

    /// Case-insensitive provider lookup
    pub fn is_known_provider(&self, provider: &str) -> bool {
        self.categories(provider).is_some()
    }

    /// Number of node types a provider offers
    pub fn total_nodes(&self, provider: &str) -> usize {
        self.categories(provider)
            .map(|categories| categories.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    /// Case-insensitive substring search over node names
    ///
    /// Results are ordered by provider, category, then catalog order.
    pub fn search_nodes(&self, query: &str, provider_filter: Option<&str>) -> Vec<NodeInfo> {
        let query = query.to_lowercase();
        let filter = provider_filter.map(|p| p.trim().to_lowercase());

        let results: Vec<NodeInfo> = self
            .providers
            .iter()
            .filter(|(provider, _)| filter.as_deref().map_or(true, |f| f == provider.as_str()))
            .flat_map(|(provider, categories)| {
                categories.iter().flat_map(move |(category, nodes)| {
                    nodes.iter().map(move |name| (provider, category, name))
                })
            })
            .filter(|(_, _, name)| name.to_lowercase().contains(&query))
            .map(|(provider, category, name)| NodeInfo {
                name: name.clone(),
                provider: provider.clone(),
                category: category.clone(),
            })
            .collect();

        debug!(query = %query, matches = results.len(), "Searched catalog");
        results
    }

    /// Per-provider statistics plus overall totals
    pub fn provider_summary(&self) -> CatalogSummary {
        let providers: Vec<ProviderInfo> = self
            .providers
            .iter()
            .map(|(name, categories)| ProviderInfo {
                name: name.clone(),
                display_name: name.to_uppercase(),
                total_nodes: categories.values().map(Vec::len).sum(),
                categories: categories.keys().cloned().collect(),
            })
            .collect();

        CatalogSummary {
            total_providers: providers.len(),
            total_nodes: providers.iter().map(|p| p.total_nodes).sum(),
            providers,
        }
    }

    /// Iterate over every `(provider, category, node type)` entry
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.providers.iter().flat_map(|(provider, categories)| {
            categories.iter().flat_map(move |(category, nodes)| {
                nodes
                    .iter()
                    .map(move |name| (provider.as_str(), category.as_str(), name.as_str()))
            })
        })
    }
}

impl NodeCatalog for ProviderCatalog {
    fn node_exists(&self, provider: &str, category: &str, node_type: &str) -> bool {
        ProviderCatalog::node_exists(self, provider, category, node_type)
    }

    fn category_nodes(&self, provider: &str, category: &str) -> &[String] {
        self.get_category_nodes(provider, category)
    }

    fn has_provider(&self, provider: &str) -> bool {
        self.is_known_provider(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_CATALOG: &str = r#"{
        "aws": {
            "compute": ["EC2", "Lambda", "ECS"],
            "database": ["RDS", "DynamoDB", "Aurora"]
        },
        "Azure": {
            "compute": ["VM", "Functions"],
            "database": ["SQLDatabases", "CosmosDB"]
        }
    }"#;

    fn small() -> ProviderCatalog {
        ProviderCatalog::from_json_str(SMALL_CATALOG).unwrap()
    }

    #[test]
    fn test_get_all_providers() {
        let providers = small().get_all_providers();
        assert_eq!(providers.len(), 2);
        assert!(providers.contains("aws"));
        assert!(providers.contains("azure"));
    }

    #[test]
    fn test_get_provider_categories() {
        let catalog = small();
        assert_eq!(catalog.get_provider_categories("aws"), vec!["compute", "database"]);
        assert_eq!(catalog.get_provider_categories("AWS").len(), 2);
        assert!(catalog.get_provider_categories("oracle").is_empty());
    }

    #[test]
    fn test_get_category_nodes_keeps_order() {
        let catalog = small();
        assert_eq!(catalog.get_category_nodes("aws", "compute"), ["EC2", "Lambda", "ECS"]);
        assert!(catalog.get_category_nodes("aws", "storage").is_empty());
        assert!(catalog.get_category_nodes("nope", "compute").is_empty());
    }

    #[test]
    fn test_node_exists() {
        let catalog = small();
        assert!(catalog.node_exists("aws", "compute", "EC2"));
        assert!(!catalog.node_exists("aws", "compute", "ec2"));
        assert!(!catalog.node_exists("aws", "compute", "NonExistent"));
        assert!(!catalog.node_exists("invalid", "invalid", "invalid"));
    }

    #[test]
    fn test_search_nodes() {
        let results = small().search_nodes("ec2", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "EC2");
        assert_eq!(results[0].provider, "aws");
        assert_eq!(results[0].category, "compute");
    }

    #[test]
    fn test_search_nodes_with_provider_filter() {
        let results = small().search_nodes("db", Some("Azure"));
        assert_eq!(results.len(), 1);
        assert!(results.iter().all(|r| r.provider == "azure"));
        assert_eq!(results[0].name, "CosmosDB");
    }

    #[test]
    fn test_provider_summary() {
        let summary = small().provider_summary();
        assert_eq!(summary.total_providers, 2);
        assert_eq!(summary.total_nodes, 10);
        assert_eq!(summary.providers[0].display_name, "AWS");
        assert_eq!(summary.providers[0].total_nodes, 6);
    }

    #[test]
    fn test_total_nodes_per_provider() {
        let catalog = small();
        assert_eq!(catalog.total_nodes("aws"), 6);
        assert_eq!(catalog.total_nodes("AZURE"), 4);
        assert_eq!(catalog.total_nodes("oracle"), 0);
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"aws": {"compute": "EC2"}"#).unwrap();

        let catalog = ProviderCatalog::load(&path);
        assert!(catalog.is_empty());
        assert!(catalog.get_all_providers().is_empty());
        assert!(!catalog.node_exists("aws", "compute", "EC2"));
    }

    #[test]
    fn test_load_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, SMALL_CATALOG).unwrap();

        let catalog = ProviderCatalog::load(&path);
        assert!(catalog.node_exists("azure", "compute", "VM"));
    }

    #[test]
    fn test_malformed_source_is_error() {
        assert!(ProviderCatalog::from_json_str("[1, 2, 3]").is_err());
        assert!(ProviderCatalog::from_json_str("{\"aws\": {\"compute\": \"EC2\"}}").is_err());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let catalog = ProviderCatalog::load("/no/such/catalog.json");
        assert!(catalog.is_empty());
        assert!(!catalog.node_exists("aws", "compute", "EC2"));
        assert!(catalog.search_nodes("ec2", None).is_empty());
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = ProviderCatalog::builtin();
        for provider in ["aws", "azure", "gcp", "k8s", "onprem", "generic", "programming"] {
            assert!(catalog.is_known_provider(provider), "missing {provider}");
        }
        assert!(catalog.node_exists("aws", "compute", "EC2"));
        assert!(catalog.node_exists("aws", "database", "RDS"));
        assert!(catalog.node_exists("azure", "database", "SQLDatabases"));
        assert!(catalog.node_exists("gcp", "storage", "GCS"));
    }

    #[test]
    fn test_shared_is_init_once() {
        let a = ProviderCatalog::shared();
        let b = ProviderCatalog::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
