//! Diagram service
//!
//! The facade CLI and API callers talk to: parse → validate → render into
//! managed storage, plus read-only catalog queries.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use super::FilesystemStorage;
use crate::catalog::{CatalogSummary, NodeInfo, ProviderCatalog};
use crate::core::{DiagramError, DrawingBackend, GeneratorConfig, OutputFormat};
use crate::render::{DiagramResult, GraphvizBackend, RenderPipeline};
use crate::spec::{DiagramSpecification, ValidationReport};

/// Entry point for rendering specifications and browsing the catalog
pub struct DiagramService {
    config: GeneratorConfig,
    catalog: Arc<ProviderCatalog>,
    pipeline: RenderPipeline,
    storage: FilesystemStorage,
}

impl DiagramService {
    /// Create a service that draws with Graphviz
    pub fn new(config: GeneratorConfig) -> Self {
        let backend = Box::new(GraphvizBackend::with_binary(config.dot_binary.clone()));
        Self::with_backend(config, backend)
    }

    /// Create a service over a specific drawing backend
    pub fn with_backend(config: GeneratorConfig, backend: Box<dyn DrawingBackend>) -> Self {
        let catalog = match &config.catalog_path {
            Some(path) => Arc::new(ProviderCatalog::load(path)),
            None => ProviderCatalog::shared(),
        };
        let pipeline = RenderPipeline::for_catalog(catalog.clone(), backend)
            .with_max_payload_mb(config.max_payload_mb);
        let storage = FilesystemStorage::new(config.output_dir.clone());

        Self {
            config,
            catalog,
            pipeline,
            storage,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn storage(&self) -> &FilesystemStorage {
        &self.storage
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Render a raw specification into the output directory
    ///
    /// Uses the configured default format when `format` is `None`.
    pub fn create_diagram_from_spec(&self, raw: &Value, format: Option<OutputFormat>) -> DiagramResult {
        let spec = match DiagramSpecification::from_value(raw) {
            Ok(spec) => spec,
            Err(e) => return rejected(e),
        };
        if let Err(e) = self.storage.ensure_dir() {
            return DiagramResult::failure(e.to_string());
        }
        let format = format.unwrap_or(self.config.default_format);
        let path = self.storage.next_path(spec.title(), format);
        self.render_spec(&spec, &path, Some(format))
    }

    /// Render a JSON document into the output directory
    pub fn create_diagram_from_json(&self, source: &str, format: Option<OutputFormat>) -> DiagramResult {
        match serde_json::from_str::<Value>(source) {
            Ok(raw) => self.create_diagram_from_spec(&raw, format),
            Err(e) => rejected(DiagramError::from(e)),
        }
    }

    /// Render a raw specification to an explicit path
    pub fn render_to(&self, raw: &Value, output_path: &Path, format: Option<OutputFormat>) -> DiagramResult {
        match DiagramSpecification::from_value(raw) {
            Ok(spec) => self.render_spec(&spec, output_path, format),
            Err(e) => rejected(e),
        }
    }

    /// Render an already parsed specification
    pub fn render_spec(
        &self,
        spec: &DiagramSpecification,
        output_path: &Path,
        format: Option<OutputFormat>,
    ) -> DiagramResult {
        let format = format.unwrap_or(self.config.default_format);
        let result = self.pipeline.render(spec, output_path, format);
        if let Some(path) = result.file_path() {
            info!(path = %path.display(), "Diagram saved");
        }
        result
    }

    /// Parse and validate without rendering
    pub fn validate(&self, raw: &Value) -> Result<ValidationReport, DiagramError> {
        let spec = DiagramSpecification::from_value(raw)?;
        Ok(self.pipeline.validator().validate(&spec))
    }

    pub fn available_providers(&self) -> Vec<String> {
        self.catalog.get_all_providers().into_iter().collect()
    }

    pub fn provider_categories(&self, provider: &str) -> Vec<String> {
        self.catalog.get_provider_categories(provider)
    }

    pub fn category_nodes(&self, provider: &str, category: &str) -> Vec<String> {
        self.catalog.get_category_nodes(provider, category).to_vec()
    }

    /// Catalog search, truncated to `limit` results when given
    pub fn search_nodes(&self, query: &str, provider: Option<&str>, limit: Option<usize>) -> Vec<NodeInfo> {
        let mut results = self.catalog.search_nodes(query, provider);
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        results
    }

    pub fn provider_summary(&self) -> CatalogSummary {
        self.catalog.provider_summary()
    }
}

impl Default for DiagramService {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

fn rejected(error: DiagramError) -> DiagramResult {
    warn!(error = %error, "Specification could not be parsed");
    DiagramResult::failure(format!("Invalid specification: {}", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(dir: &Path) -> DiagramService {
        DiagramService::new(
            GeneratorConfig::new()
                .with_output_dir(dir)
                .with_default_format(OutputFormat::Dot),
        )
    }

    #[test]
    fn test_catalog_queries() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        assert!(service.available_providers().contains(&"aws".to_string()));
        assert!(service.provider_categories("aws").contains(&"compute".to_string()));
        assert!(service.category_nodes("aws", "compute").contains(&"EC2".to_string()));
        assert_eq!(service.search_nodes("ec2", Some("aws"), Some(1)).len(), 1);
        assert!(service.provider_summary().total_nodes > 0);
    }

    #[test]
    fn test_create_diagram_from_spec_names_file_by_title() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let raw = json!({
            "title": "Simple AWS",
            "provider": "aws",
            "components": [{"id": "web", "type": "EC2", "category": "compute"}]
        });

        let result = service.create_diagram_from_spec(&raw, None);
        assert!(result.is_success(), "{:?}", result.error());
        let path = result.file_path().unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Simple_AWS_"));
        assert!(name.ends_with(".dot"));
        assert!(path.starts_with(dir.path()));
    }

    #[test]
    fn test_same_title_renders_do_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let raw = json!({
            "title": "Same",
            "components": [{"id": "a", "type": "Rack", "category": "compute"}]
        });

        let first = service.create_diagram_from_spec(&raw, None);
        let second = service.create_diagram_from_spec(&raw, None);
        assert!(first.is_success(), "{:?}", first.error());
        assert!(second.is_success(), "{:?}", second.error());
        assert_ne!(first.file_path(), second.file_path());
        assert!(first.file_path().unwrap().is_file());
        assert!(second.file_path().unwrap().is_file());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_unparseable_input_is_a_failure_result() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let result = service.create_diagram_from_json("{not json", None);
        assert!(!result.is_success());
        assert!(result.error().unwrap().starts_with("Invalid specification"));
    }

    #[test]
    fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let report = service(dir.path())
            .validate(&json!({"components": []}))
            .unwrap();
        assert!(!report.is_valid());
    }
}
