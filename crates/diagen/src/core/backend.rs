//! Drawing backend traits
//!
//! A backend is the graph-drawing library the render pipeline hands its
//! resolved nodes and edges to. Each render call opens its own
//! [`DrawingSession`]; the session owns every piece of in-flight drawing state
//! and is consumed by [`DrawingSession::finish`], so two renders never share
//! a drawing context.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{EdgeStyle, OutputFormat};
use crate::nodes::DrawableNode;
use crate::spec::Connection;

/// Diagram-level settings for one drawing session
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramSettings {
    /// Title drawn above the diagram
    pub title: String,
    /// Direction code (`TB` or `LR`)
    pub direction: &'static str,
    /// Requested output format
    pub format: OutputFormat,
}

/// Optional presentation attributes for an edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeAttributes {
    pub label: Option<String>,
    pub color: Option<String>,
    pub style: Option<EdgeStyle>,
}

impl EdgeAttributes {
    /// Copy the presentation attributes of a connection
    ///
    /// Unknown style names are dropped rather than passed through.
    pub fn from_connection(connection: &Connection) -> Self {
        Self {
            label: connection.label().map(str::to_string),
            color: connection.color().map(str::to_string),
            style: connection.style().and_then(EdgeStyle::from_name),
        }
    }

    /// Returns true if no attribute is set
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.color.is_none() && self.style.is_none()
    }
}

/// Core trait for drawing backends
///
/// # Example
/// ```
/// use diagen::core::{DiagramSettings, DrawingBackend, OutputFormat};
/// use diagen::render::GraphvizBackend;
///
/// let backend = GraphvizBackend::new();
/// let settings = DiagramSettings {
///     title: "Example".to_string(),
///     direction: "TB",
///     format: OutputFormat::Dot,
/// };
/// let session = backend.open(&settings).unwrap();
/// ```
pub trait DrawingBackend: Send + Sync {
    /// Start a new, isolated drawing session
    fn open(&self, settings: &DiagramSettings) -> Result<Box<dyn DrawingSession>>;

    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Check whether this backend can produce the given format
    fn supports(&self, format: OutputFormat) -> bool;
}

/// One in-flight drawing
pub trait DrawingSession {
    /// Draw a node
    fn add_node(&mut self, node: &DrawableNode) -> Result<()>;

    /// Draw an edge between two previously added nodes
    fn add_edge(&mut self, from: &str, to: &str, attributes: &EdgeAttributes) -> Result<()>;

    /// Open a visual group; nodes added until [`end_cluster`](Self::end_cluster) belong to it
    fn begin_cluster(&mut self, name: &str) -> Result<()>;

    /// Close the innermost visual group
    fn end_cluster(&mut self) -> Result<()>;

    /// Rasterize the drawing to `target` and return the path written
    fn finish(self: Box<Self>, target: &Path) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_attributes_from_connection() {
        let connection = Connection::new("web", "db")
            .with_label("queries")
            .with_color("blue")
            .with_style("dashed");
        let attributes = EdgeAttributes::from_connection(&connection);
        assert_eq!(attributes.label.as_deref(), Some("queries"));
        assert_eq!(attributes.color.as_deref(), Some("blue"));
        assert_eq!(attributes.style, Some(EdgeStyle::Dashed));
        assert!(!attributes.is_empty());
    }

    #[test]
    fn test_edge_attributes_drop_unknown_style() {
        let connection = Connection::new("a", "b").with_style("zigzag");
        let attributes = EdgeAttributes::from_connection(&connection);
        assert!(attributes.style.is_none());
        assert!(attributes.is_empty());
    }
}
