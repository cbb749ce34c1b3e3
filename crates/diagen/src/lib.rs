//! Diagen - Render architecture diagrams from JSON specifications
//!
//! A library for turning loosely-typed diagram specifications (as produced by
//! language models) into Graphviz-rendered architecture diagrams, resolving
//! near-miss node names against a provider catalog along the way.
//!
//! # Quick Start
//!
//! ```rust
//! use diagen::{render, OutputFormat};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let spec = json!({
//!     "title": "Simple AWS Architecture",
//!     "provider": "aws",
//!     "components": [
//!         {"id": "web1", "type": "EC2", "category": "compute", "label": "Web Server"},
//!         {"id": "db1", "type": "RDS", "category": "database", "label": "Database"}
//!     ],
//!     "connections": [{"from": "web1", "to": "db1"}]
//! });
//!
//! let result = render(&spec, &dir.path().join("simple"), OutputFormat::Dot);
//! assert!(result.is_success());
//! ```
//!
//! # Advanced Usage
//!
//! For more control, use the individual components:
//!
//! ```rust
//! use diagen::prelude::*;
//! use serde_json::json;
//!
//! let spec = DiagramSpecification::from_value(&json!({
//!     "provider": "aws",
//!     "components": [{"id": "fn", "type": "lambda", "category": "compute"}]
//! }))
//! .unwrap();
//!
//! // Validate without rendering
//! let report = SpecValidator::new().validate(&spec);
//! assert!(report.is_valid());
//!
//! // Resolve a near-miss node name
//! let resolver = NodeResolver::with_builtin_catalog();
//! let class = resolver.resolve_node("aws", "compute", "lambda");
//! assert_eq!(class.name(), "Lambda");
//! ```

use std::path::Path;

use serde_json::Value;

pub mod catalog;
pub mod core;
pub mod nodes;
pub mod render;
pub mod service;
pub mod spec;

pub use crate::core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::{NodeCatalog, ProviderCatalog};
    pub use crate::core::{
        DiagramError, DrawingBackend, DrawingSession, GeneratorConfig, Layout, OutputFormat,
    };
    pub use crate::nodes::{NodeClass, NodeClassLoader, NodeHandle, NodeLoader, NodeResolver};
    pub use crate::render::{DiagramResult, GraphvizBackend, RenderPipeline};
    pub use crate::service::{DiagramService, GenerateDiagramUseCase, SpecGenerator};
    pub use crate::spec::{
        Component, ComponentCluster, Connection, DiagramSpecification, SpecValidator,
        ValidationReport,
    };
}

/// Parse a raw JSON specification
///
/// # Example
/// ```rust
/// use diagen::parse;
/// use serde_json::json;
///
/// let spec = parse(&json!({"title": "T", "components": []})).unwrap();
/// assert_eq!(spec.get_direction(), "TB");
/// ```
pub fn parse(raw: &Value) -> Result<spec::DiagramSpecification, DiagramError> {
    spec::DiagramSpecification::from_value(raw)
}

/// Parse and validate a raw specification
///
/// Returns `(is_valid, errors)`; unparseable input is reported as a single
/// error rather than an `Err`.
///
/// # Example
/// ```rust
/// use diagen::validate;
/// use serde_json::json;
///
/// let (valid, errors) = validate(&json!({"components": []}));
/// assert!(!valid);
/// assert!(errors[0].contains("no components"));
/// ```
pub fn validate(raw: &Value) -> (bool, Vec<String>) {
    match parse(raw) {
        Ok(spec) => spec::SpecValidator::with_catalog(catalog::ProviderCatalog::shared())
            .validate(&spec)
            .into_parts(),
        Err(e) => (false, vec![e.to_string()]),
    }
}

/// Parse, validate and render a raw specification with Graphviz
///
/// This is the simplest way to produce a diagram. Failures of any stage are
/// reported in the returned [`render::DiagramResult`].
pub fn render(raw: &Value, output_path: &Path, format: OutputFormat) -> render::DiagramResult {
    match parse(raw) {
        Ok(spec) => render::RenderPipeline::with_defaults().render(&spec, output_path, format),
        Err(e) => render::DiagramResult::failure(format!("Invalid specification: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_unparseable() {
        let (valid, errors) = validate(&json!("not an object"));
        assert!(!valid);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_render_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = render(&json!([]), &dir.path().join("x"), OutputFormat::Dot);
        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("JSON object"));
    }

    #[test]
    fn test_render_dot() {
        let dir = tempfile::tempdir().unwrap();
        let spec = json!({
            "title": "Dot",
            "components": [{"id": "a", "type": "Server", "category": "compute"}]
        });
        let result = render(&spec, &dir.path().join("dot"), OutputFormat::Dot);
        assert!(result.is_success(), "{:?}", result.error());
        assert!(dir.path().join("dot.dot").is_file());
    }
}
