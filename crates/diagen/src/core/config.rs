//! Generator configuration
//!
//! Settings shared by the render pipeline and the service layer. Every field
//! has a default, so a partial JSON file is enough to override one setting.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DiagramError, OutputFormat};

/// Default directory for generated diagrams
pub const DEFAULT_OUTPUT_DIR: &str = "generated_diagrams";

/// Default upper bound for the encoded image payload, in megabytes
pub const DEFAULT_MAX_PAYLOAD_MB: f64 = 5.0;

/// Configuration for diagram generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory where generated diagrams are written
    pub output_dir: PathBuf,
    /// Format used when the caller does not ask for one
    pub default_format: OutputFormat,
    /// Artifacts larger than this are reported without an encoded payload
    pub max_payload_mb: f64,
    /// Optional catalog file replacing the built-in catalog
    pub catalog_path: Option<PathBuf>,
    /// Graphviz executable used for raster, vector and PDF output
    pub dot_binary: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            default_format: OutputFormat::default(),
            max_payload_mb: DEFAULT_MAX_PAYLOAD_MB,
            catalog_path: None,
            dot_binary: "dot".to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DiagramError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded generator config");
        Ok(config)
    }

    /// Apply `DIAGEN_OUTPUT_DIR` and `DIAGEN_DOT_BINARY` when they are set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("DIAGEN_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(binary) = std::env::var("DIAGEN_DOT_BINARY") {
            if !binary.is_empty() {
                self.dot_binary = binary;
            }
        }
        self
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the default output format
    pub fn with_default_format(mut self, format: OutputFormat) -> Self {
        self.default_format = format;
        self
    }

    /// Set the payload size bound
    pub fn with_max_payload_mb(mut self, max_payload_mb: f64) -> Self {
        self.max_payload_mb = max_payload_mb;
        self
    }

    /// Use a catalog file instead of the built-in catalog
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("generated_diagrams"));
        assert_eq!(config.default_format, OutputFormat::Png);
        assert_eq!(config.max_payload_mb, 5.0);
        assert!(config.catalog_path.is_none());
        assert_eq!(config.dot_binary, "dot");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"default_format": "svg", "max_payload_mb": 1.5}"#).unwrap();
        assert_eq!(config.default_format, OutputFormat::Svg);
        assert_eq!(config.max_payload_mb, 1.5);
        assert_eq!(config.dot_binary, "dot");
    }

    #[test]
    fn test_builder_methods() {
        let config = GeneratorConfig::new()
            .with_output_dir("/tmp/diagrams")
            .with_default_format(OutputFormat::Dot)
            .with_catalog_path("catalog.json");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/diagrams"));
        assert_eq!(config.default_format, OutputFormat::Dot);
        assert_eq!(config.catalog_path, Some(PathBuf::from("catalog.json")));
    }

    #[test]
    fn test_from_missing_file_is_error() {
        let result = GeneratorConfig::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(DiagramError::IoError { .. })));
    }
}
