//! Diagram render pipeline
//!
//! Drives one render call end to end:
//! Validate → Resolve nodes → Clusters → Top-level nodes → Edges → Backend → Verify artifact
//!
//! Every exit is a [`DiagramResult`]; errors from any stage are turned into a
//! failure result at this boundary and never reach the caller as `Err`.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, info, span, trace, warn, Level};

use super::{DiagramResult, GraphvizBackend, RenderedDiagram, Substitution};
use crate::catalog::ProviderCatalog;
use crate::core::{
    DiagramError, DiagramSettings, DrawingBackend, DrawingSession, EdgeAttributes,
    OutputFormat, DEFAULT_MAX_PAYLOAD_MB,
};
use crate::nodes::{DrawableNode, NodeClassLoader, NodeRegistry, NodeResolver, ResolutionKind};
use crate::spec::{DiagramSpecification, SpecValidator, ValidationReport};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Render pipeline over a resolver, a validator and a drawing backend
pub struct RenderPipeline {
    resolver: NodeResolver,
    validator: SpecValidator,
    backend: Box<dyn DrawingBackend>,
    max_payload_mb: f64,
}

impl RenderPipeline {
    /// Create a pipeline from its parts
    pub fn new(
        resolver: NodeResolver,
        validator: SpecValidator,
        backend: Box<dyn DrawingBackend>,
    ) -> Self {
        Self {
            resolver,
            validator,
            backend,
            max_payload_mb: DEFAULT_MAX_PAYLOAD_MB,
        }
    }

    /// Built-in catalog, Graphviz on the `PATH`
    pub fn with_defaults() -> Self {
        Self::new(
            NodeResolver::with_builtin_catalog(),
            SpecValidator::with_catalog(ProviderCatalog::shared()),
            Box::new(GraphvizBackend::new()),
        )
    }

    /// Resolve and validate against one catalog, drawing with `backend`
    pub fn for_catalog(catalog: Arc<ProviderCatalog>, backend: Box<dyn DrawingBackend>) -> Self {
        let registry = if Arc::ptr_eq(&catalog, &ProviderCatalog::shared()) {
            NodeRegistry::shared()
        } else {
            Arc::new(NodeRegistry::from_catalog(&catalog))
        };
        let loader = Arc::new(NodeClassLoader::with_registry(registry));

        Self::new(
            NodeResolver::new(catalog.clone(), loader),
            SpecValidator::with_catalog(catalog),
            backend,
        )
    }

    /// Set the payload size bound
    pub fn with_max_payload_mb(mut self, max_payload_mb: f64) -> Self {
        self.max_payload_mb = max_payload_mb;
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn validator(&self) -> &SpecValidator {
        &self.validator
    }

    /// Render a specification next to `output_path`
    ///
    /// The artifact is written to `output_path` with the format's extension
    /// appended, unless the path already carries it.
    pub fn render(
        &self,
        spec: &DiagramSpecification,
        output_path: &Path,
        format: OutputFormat,
    ) -> DiagramResult {
        let render_span = span!(
            Level::INFO,
            "render_diagram",
            title = %spec.title(),
            format = %format,
            backend = self.backend.name()
        );
        let _enter = render_span.enter();

        info!(
            components = spec.component_count(),
            connections = spec.connection_count(),
            "Starting diagram render"
        );

        let report = self.validator.validate(spec);
        for warning in report.warnings() {
            warn!(warning = %warning, "Specification warning");
        }
        if !report.is_valid() {
            let errors = report.error_messages();
            warn!(errors = errors.len(), "Specification rejected");
            return DiagramResult::failure(format!(
                "Invalid specification: {}",
                errors.join("; ")
            ));
        }

        match self.draw(spec, output_path, format, &report) {
            Ok(diagram) => {
                info!(path = %diagram.file_path.display(), "Diagram rendered");
                DiagramResult::success(diagram)
            }
            Err(e) => {
                warn!(error = %e, "Diagram render failed");
                DiagramResult::failure(format!("{:#}", e))
            }
        }
    }

    fn draw(
        &self,
        spec: &DiagramSpecification,
        output_path: &Path,
        format: OutputFormat,
        report: &ValidationReport,
    ) -> Result<RenderedDiagram> {
        if !self.backend.supports(format) {
            return Err(DiagramError::render_error(format!(
                "backend '{}' cannot produce {}",
                self.backend.name(),
                format
            ))
            .into());
        }

        let target = artifact_path(output_path, format);
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Step 1: Resolve one drawable node per component
        let resolve_span = span!(Level::DEBUG, "pipeline_resolve");
        let resolve_enter = resolve_span.enter();
        let (nodes, substitutions) = self.resolve_nodes(spec);
        debug!(
            nodes = nodes.len(),
            substitutions = substitutions.len(),
            "Nodes resolved"
        );
        drop(resolve_enter);

        // Step 2: Draw clusters, top-level nodes and edges
        let draw_span = span!(Level::DEBUG, "pipeline_draw");
        let draw_enter = draw_span.enter();
        let settings = DiagramSettings {
            title: spec.title().to_string(),
            direction: spec.get_direction(),
            format,
        };
        let mut session = self.backend.open(&settings)?;
        draw_graph(session.as_mut(), spec, &nodes)?;
        drop(draw_enter);

        // Step 3: Hand the graph to the backend
        let finish_span = span!(Level::DEBUG, "pipeline_finish", path = %target.display());
        let finish_enter = finish_span.enter();
        let written = session.finish(&target)?;
        drop(finish_enter);

        // Step 4: Confirm the artifact exists
        if !written.is_file() {
            return Err(DiagramError::missing_artifact(written).into());
        }

        let size = std::fs::metadata(&written)?.len();
        let image_size_mb = size as f64 / BYTES_PER_MB;
        let image_base64 = if image_size_mb <= self.max_payload_mb {
            Some(STANDARD.encode(std::fs::read(&written)?))
        } else {
            debug!(
                image_size_mb,
                max_payload_mb = self.max_payload_mb,
                "Artifact exceeds payload bound, omitting payload"
            );
            None
        };

        Ok(RenderedDiagram {
            title: spec.title().to_string(),
            file_path: written,
            image_base64,
            image_size_mb,
            components_count: spec.component_count(),
            connections_count: spec.connection_count(),
            provider: spec.provider().to_string(),
            format,
            substitutions,
            warnings: report.warning_messages(),
        })
    }

    fn resolve_nodes(
        &self,
        spec: &DiagramSpecification,
    ) -> (HashMap<String, DrawableNode>, Vec<Substitution>) {
        let mut nodes = HashMap::new();
        let mut substitutions = Vec::new();

        for component in spec.components() {
            if nodes.contains_key(component.id()) {
                continue;
            }

            let provider = spec.component_provider(component);
            let resolution =
                self.resolver
                    .resolve(provider, component.category(), component.node_type());

            if resolution.is_substitution() {
                let resolved = match &resolution.kind {
                    ResolutionKind::Suggested(name) => name.clone(),
                    _ => resolution.handle.qualified_name(),
                };
                info!(
                    component = component.id(),
                    requested = component.node_type(),
                    resolved = %resolved,
                    "Substituted node type"
                );
                substitutions.push(Substitution {
                    component_id: component.id().to_string(),
                    requested: component.node_type().to_string(),
                    resolved,
                });
            }

            let node = resolution.handle.instantiate(
                component.id(),
                component.label(),
                component.properties().clone(),
            );
            nodes.insert(component.id().to_string(), node);
        }

        (nodes, substitutions)
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Draw nodes and edges into a session
///
/// A component named by several clusters is drawn in the first one. Members
/// that name no component are skipped, as are edges with a missing endpoint.
fn draw_graph(
    session: &mut dyn DrawingSession,
    spec: &DiagramSpecification,
    nodes: &HashMap<String, DrawableNode>,
) -> Result<()> {
    let mut placed: HashSet<&str> = HashSet::new();

    for cluster in spec.clusters() {
        let mut members: Vec<&DrawableNode> = Vec::new();
        for id in cluster.component_ids() {
            if let Some(node) = nodes.get(id) {
                if placed.insert(node.id()) {
                    members.push(node);
                }
            }
        }
        if members.is_empty() {
            trace!(cluster = cluster.name(), "Skipping empty cluster");
            continue;
        }

        session.begin_cluster(cluster.name())?;
        for node in members {
            session.add_node(node)?;
        }
        session.end_cluster()?;
    }

    for component in spec.components() {
        if placed.contains(component.id()) {
            continue;
        }
        if let Some(node) = nodes.get(component.id()) {
            session.add_node(node)?;
            placed.insert(node.id());
        }
    }

    for connection in spec.connections() {
        if !nodes.contains_key(connection.from_id()) || !nodes.contains_key(connection.to_id()) {
            trace!(
                from = connection.from_id(),
                to = connection.to_id(),
                "Skipping connection with missing endpoint"
            );
            continue;
        }
        session.add_edge(
            connection.from_id(),
            connection.to_id(),
            &EdgeAttributes::from_connection(connection),
        )?;
    }

    Ok(())
}

/// Path the backend writes for a requested output path and format
pub fn artifact_path(output_path: &Path, format: OutputFormat) -> PathBuf {
    let has_extension = output_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(format.extension()));
    if has_extension {
        return output_path.to_path_buf();
    }

    let mut path: OsString = output_path.as_os_str().to_owned();
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}
