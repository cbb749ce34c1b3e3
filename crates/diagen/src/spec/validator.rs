//! Specification validation
//!
//! Structural checks over a parsed specification. Validation never fails and
//! never mutates: every problem is collected into a [`ValidationReport`] so
//! callers see all of them at once. Errors block rendering; warnings are
//! reported but do not.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::DiagramSpecification;
use crate::catalog::NodeCatalog;

/// A problem that makes a specification unrenderable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    NoComponents,
    DuplicateComponentId { id: String, occurrences: usize },
    MissingSource { index: usize, id: String },
    MissingTarget { index: usize, id: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NoComponents => {
                write!(f, "Specification has no components")
            }
            ValidationIssue::DuplicateComponentId { id, occurrences } => {
                write!(f, "Duplicate component id '{}' ({} occurrences)", id, occurrences)
            }
            ValidationIssue::MissingSource { index, id } => {
                write!(f, "Connection {} references unknown source component '{}'", index, id)
            }
            ValidationIssue::MissingTarget { index, id } => {
                write!(f, "Connection {} references unknown target component '{}'", index, id)
            }
        }
    }
}

/// A suspicious but renderable construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The provider is not in the catalog; its components will draw as generic nodes
    UnknownProvider { component_id: String, provider: String },
    /// A cluster names an id no component has; the member is skipped
    UnknownClusterMember { cluster: String, id: String },
    /// A component is claimed by several clusters; it is drawn in the first
    MultipleClusters { id: String, clusters: Vec<String> },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::UnknownProvider { component_id, provider } => write!(
                f,
                "Component '{}' uses unknown provider '{}' and will be drawn as a generic node",
                component_id, provider
            ),
            ValidationWarning::UnknownClusterMember { cluster, id } => write!(
                f,
                "Cluster '{}' references unknown component '{}'",
                cluster, id
            ),
            ValidationWarning::MultipleClusters { id, clusters } => write!(
                f,
                "Component '{}' appears in several clusters ({}); drawing it in '{}'",
                id,
                clusters.join(", "),
                clusters.first().map(String::as_str).unwrap_or_default()
            ),
        }
    }
}

/// Outcome of validating one specification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// True when there are no errors; warnings do not count
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Error messages, in discovery order
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// `(is_valid, error messages)`
    pub fn into_parts(self) -> (bool, Vec<String>) {
        let messages = self.error_messages();
        (self.errors.is_empty(), messages)
    }
}

/// Checks specifications for structural problems
#[derive(Clone, Default)]
pub struct SpecValidator {
    catalog: Option<Arc<dyn NodeCatalog>>,
}

impl fmt::Debug for SpecValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecValidator")
            .field("checks_providers", &self.catalog.is_some())
            .finish()
    }
}

impl SpecValidator {
    /// Structural checks only
    pub fn new() -> Self {
        Self::default()
    }

    /// Also warn about providers the catalog does not know
    pub fn with_catalog(catalog: Arc<dyn NodeCatalog>) -> Self {
        Self {
            catalog: Some(catalog),
        }
    }

    /// Validate a specification, collecting every problem found
    pub fn validate(&self, spec: &DiagramSpecification) -> ValidationReport {
        let mut report = ValidationReport::default();

        if spec.components().is_empty() {
            report.errors.push(ValidationIssue::NoComponents);
        }

        let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();
        for component in spec.components() {
            let count = occurrences.entry(component.id()).or_insert(0);
            if *count == 0 {
                order.push(component.id());
            }
            *count += 1;
        }
        for id in &order {
            let count = occurrences[id];
            if count > 1 {
                report.errors.push(ValidationIssue::DuplicateComponentId {
                    id: id.to_string(),
                    occurrences: count,
                });
            }
        }

        let ids: HashSet<&str> = order.iter().copied().collect();
        for (index, connection) in spec.connections().iter().enumerate() {
            if !ids.contains(connection.from_id()) {
                report.errors.push(ValidationIssue::MissingSource {
                    index,
                    id: connection.from_id().to_string(),
                });
            }
            if !ids.contains(connection.to_id()) {
                report.errors.push(ValidationIssue::MissingTarget {
                    index,
                    id: connection.to_id().to_string(),
                });
            }
        }

        self.check_clusters(spec, &ids, &mut report);
        self.check_providers(spec, &mut report);

        debug!(
            title = %spec.title(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            "Validated specification"
        );
        report
    }

    fn check_clusters(
        &self,
        spec: &DiagramSpecification,
        ids: &HashSet<&str>,
        report: &mut ValidationReport,
    ) {
        let mut memberships: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();

        for cluster in spec.clusters() {
            for id in cluster.component_ids() {
                if !ids.contains(id.as_str()) {
                    report.warnings.push(ValidationWarning::UnknownClusterMember {
                        cluster: cluster.name().to_string(),
                        id: id.clone(),
                    });
                    continue;
                }
                let clusters = memberships.entry(id.as_str()).or_default();
                if clusters.is_empty() {
                    order.push(id.as_str());
                }
                if !clusters.iter().any(|name| name == cluster.name()) {
                    clusters.push(cluster.name().to_string());
                }
            }
        }

        for id in order {
            if let Some(clusters) = memberships.remove(id) {
                if clusters.len() > 1 {
                    report.warnings.push(ValidationWarning::MultipleClusters {
                        id: id.to_string(),
                        clusters,
                    });
                }
            }
        }
    }

    fn check_providers(&self, spec: &DiagramSpecification, report: &mut ValidationReport) {
        let Some(catalog) = &self.catalog else {
            return;
        };
        for component in spec.components() {
            let provider = spec.component_provider(component);
            if !catalog.has_provider(provider) {
                report.warnings.push(ValidationWarning::UnknownProvider {
                    component_id: component.id().to_string(),
                    provider: provider.to_string(),
                });
            }
        }
    }
}
