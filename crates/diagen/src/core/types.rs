//! Core type definitions for diagram generation
//!
//! Layout direction, output formats, and the small vocabulary of drawing
//! primitives (node shapes, edge styles) shared by the node registry and the
//! drawing backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Layout of a diagram specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Left to right
    Horizontal,
    /// Top to bottom
    #[default]
    Vertical,
}

impl Layout {
    /// Parse a layout name, falling back to vertical for anything unrecognised
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "horizontal" | "lr" | "left-right" => Layout::Horizontal,
            _ => Layout::Vertical,
        }
    }

    /// Direction code understood by the drawing backend
    pub fn direction(&self) -> &'static str {
        match self {
            Layout::Horizontal => "LR",
            Layout::Vertical => "TB",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Horizontal => write!(f, "horizontal"),
            Layout::Vertical => write!(f, "vertical"),
        }
    }
}

/// Output format for rendered diagrams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raster image
    #[default]
    Png,
    /// Vector image
    Svg,
    /// Portable document
    Pdf,
    /// Graph description language (Graphviz DOT source)
    Dot,
}

impl OutputFormat {
    /// File extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Dot => "dot",
        }
    }

    /// MIME type of the rendered artifact
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Dot => "text/vnd.graphviz",
        }
    }

    /// Get all valid format names
    pub fn variants() -> &'static [&'static str] {
        &["png", "svg", "pdf", "dot"]
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            "dot" | "gv" => Ok(OutputFormat::Dot),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Node shapes available from the drawing backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum NodeShape {
    /// Plain rounded box
    #[default]
    Box,
    /// Three-dimensional box, used for compute
    Box3d,
    /// Cylinder, used for databases
    Cylinder,
    /// Diamond, used for network gateways and routers
    Diamond,
    /// Folder, used for storage
    Folder,
    /// Component, used for managed platform services
    Component,
    /// Hexagon, used for security and identity
    Hexagon,
    /// Parallelogram, used for queues and messaging
    Parallelogram,
    /// Ellipse, used for people and clients
    Ellipse,
    /// Note, used for configuration objects
    Note,
}

impl NodeShape {
    /// Graphviz shape name
    pub fn dot_name(&self) -> &'static str {
        match self {
            NodeShape::Box => "box",
            NodeShape::Box3d => "box3d",
            NodeShape::Cylinder => "cylinder",
            NodeShape::Diamond => "diamond",
            NodeShape::Folder => "folder",
            NodeShape::Component => "component",
            NodeShape::Hexagon => "hexagon",
            NodeShape::Parallelogram => "parallelogram",
            NodeShape::Ellipse => "ellipse",
            NodeShape::Note => "note",
        }
    }

    /// Pick the shape used for every node in a catalog category
    pub fn for_category(category: &str) -> Self {
        let category = category.to_lowercase();
        match category.as_str() {
            "compute" | "container" => NodeShape::Box3d,
            "database" | "inmemory" => NodeShape::Cylinder,
            "network" => NodeShape::Diamond,
            "storage" => NodeShape::Folder,
            "security" | "identity" | "rbac" => NodeShape::Hexagon,
            "integration" | "queue" => NodeShape::Parallelogram,
            "client" | "device" => NodeShape::Ellipse,
            "podconfig" | "clusterconfig" => NodeShape::Note,
            "analytics" | "ml" | "management" | "monitoring" | "ci" => NodeShape::Component,
            _ => NodeShape::Box,
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dot_name())
    }
}

/// Line style for edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum EdgeStyle {
    /// Solid line
    #[default]
    Solid,
    /// Dashed line
    Dashed,
    /// Dotted line
    Dotted,
    /// Thick line
    Bold,
}

impl EdgeStyle {
    /// Parse a style name; unknown names return `None`
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "solid" => Some(EdgeStyle::Solid),
            "dashed" => Some(EdgeStyle::Dashed),
            "dotted" => Some(EdgeStyle::Dotted),
            "bold" | "thick" => Some(EdgeStyle::Bold),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeStyle::Solid => write!(f, "solid"),
            EdgeStyle::Dashed => write!(f, "dashed"),
            EdgeStyle::Dotted => write!(f, "dotted"),
            EdgeStyle::Bold => write!(f, "bold"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_direction() {
        assert_eq!(Layout::Vertical.direction(), "TB");
        assert_eq!(Layout::Horizontal.direction(), "LR");
        assert_eq!(Layout::default(), Layout::Vertical);
    }

    #[test]
    fn test_layout_parse_lenient() {
        assert_eq!(Layout::parse_lenient("horizontal"), Layout::Horizontal);
        assert_eq!(Layout::parse_lenient(" Horizontal "), Layout::Horizontal);
        assert_eq!(Layout::parse_lenient("vertical"), Layout::Vertical);
        assert_eq!(Layout::parse_lenient("diagonal"), Layout::Vertical);
        assert_eq!(Layout::parse_lenient(""), Layout::Vertical);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("SVG".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        assert_eq!(".pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert_eq!("gv".parse::<OutputFormat>().unwrap(), OutputFormat::Dot);
        assert!("jpeg".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_extension_and_mime() {
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Dot.to_string(), "dot");
        assert_eq!(OutputFormat::Svg.mime_type(), "image/svg+xml");
        assert_eq!(OutputFormat::variants().len(), 4);
    }

    #[test]
    fn test_shape_for_category() {
        assert_eq!(NodeShape::for_category("database"), NodeShape::Cylinder);
        assert_eq!(NodeShape::for_category("Compute"), NodeShape::Box3d);
        assert_eq!(NodeShape::for_category("storage"), NodeShape::Folder);
        assert_eq!(NodeShape::for_category("something-else"), NodeShape::Box);
        assert_eq!(NodeShape::Cylinder.to_string(), "cylinder");
    }

    #[test]
    fn test_edge_style_from_name() {
        assert_eq!(EdgeStyle::from_name("dashed"), Some(EdgeStyle::Dashed));
        assert_eq!(EdgeStyle::from_name("THICK"), Some(EdgeStyle::Bold));
        assert_eq!(EdgeStyle::from_name("wavy"), None);
        assert_eq!(EdgeStyle::Dotted.to_string(), "dotted");
    }
}
