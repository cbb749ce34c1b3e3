//! Render results
//!
//! [`DiagramResult`] is the single shape every render reports back, whether
//! it succeeded or failed at any stage. It can only be built through
//! [`DiagramResult::success`] and [`DiagramResult::failure`].

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use crate::core::OutputFormat;

/// A component drawn with a different node type than it asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub component_id: String,
    pub requested: String,
    pub resolved: String,
}

/// Everything known about a successfully rendered diagram
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDiagram {
    pub title: String,
    pub file_path: PathBuf,
    /// Base64 of the artifact; `None` when it exceeds the payload bound
    pub image_base64: Option<String>,
    pub image_size_mb: f64,
    pub components_count: usize,
    pub connections_count: usize,
    pub provider: String,
    pub format: OutputFormat,
    pub substitutions: Vec<Substitution>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Outcome {
    Success(RenderedDiagram),
    Failure(String),
}

/// Outcome of one render call
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramResult {
    outcome: Outcome,
}

impl DiagramResult {
    /// A successful render; the provider is stored in uppercase display form
    pub fn success(mut diagram: RenderedDiagram) -> Self {
        diagram.provider = diagram.provider.to_uppercase();
        Self {
            outcome: Outcome::Success(diagram),
        }
    }

    /// A failed render
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// The error message of a failed render
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failure(error) => Some(error),
            Outcome::Success(_) => None,
        }
    }

    /// The details of a successful render
    pub fn rendered(&self) -> Option<&RenderedDiagram> {
        match &self.outcome {
            Outcome::Success(diagram) => Some(diagram),
            Outcome::Failure(_) => None,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.rendered().map(|d| d.title.as_str())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.rendered().map(|d| d.file_path.as_path())
    }

    pub fn provider(&self) -> Option<&str> {
        self.rendered().map(|d| d.provider.as_str())
    }

    /// Uniform JSON shape for callers
    pub fn to_json(&self) -> Value {
        match &self.outcome {
            Outcome::Success(d) => json!({
                "success": true,
                "title": d.title,
                "file_path": d.file_path.display().to_string(),
                "image_base64": d.image_base64,
                "image_size_mb": d.image_size_mb,
                "components_count": d.components_count,
                "connections_count": d.connections_count,
                "provider": d.provider,
                "format": d.format,
                "mime_type": d.format.mime_type(),
                "substitutions": d.substitutions,
                "warnings": d.warnings,
            }),
            Outcome::Failure(error) => json!({
                "success": false,
                "error": error,
            }),
        }
    }
}
