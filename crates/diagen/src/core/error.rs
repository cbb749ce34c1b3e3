//! Core error types for diagram generation
//!
//! Errors raised inside the library. The public boundaries (render pipeline,
//! validator) turn these into data so callers always see a uniform shape.

use std::path::PathBuf;

use thiserror::Error;

/// Core error types for specification parsing and rendering
#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Specification error: {message}")]
    SpecError { message: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },

    #[error("Render error: {message}")]
    RenderError { message: String },

    #[error("Expected output file {} was not generated", path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Drawing backend unavailable: {message}")]
    BackendUnavailable { message: String },

    #[error("AI provider error: {message}")]
    AiProviderError { message: String },

    #[error("IO error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },
}

impl DiagramError {
    /// Create a new specification error
    pub fn spec_error(message: impl Into<String>) -> Self {
        Self::SpecError {
            message: message.into(),
        }
    }

    /// Create a new catalog error
    pub fn catalog_error(message: impl Into<String>) -> Self {
        Self::CatalogError {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render_error(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }

    /// Create a new missing-artifact error
    pub fn missing_artifact(path: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact { path: path.into() }
    }

    /// Create a new backend-unavailable error
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            message: message.into(),
        }
    }

    /// Create a new AI provider error
    pub fn ai_provider_error(message: impl Into<String>) -> Self {
        Self::AiProviderError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error() {
        let error = DiagramError::spec_error("components must be an array");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Specification error"));
        assert!(error_msg.contains("components must be an array"));
    }

    #[test]
    fn test_render_error() {
        let error = DiagramError::render_error("dot exited with status 1");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Render error"));
        assert!(error_msg.contains("status 1"));
    }

    #[test]
    fn test_missing_artifact() {
        let error = DiagramError::missing_artifact("/tmp/out/diagram.png");
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("/tmp/out/diagram.png"));
        assert!(error_msg.contains("was not generated"));
    }

    #[test]
    fn test_ai_provider_error() {
        let error = DiagramError::ai_provider_error("rate limited");
        assert_eq!(error.to_string(), "AI provider error: rate limited");
    }

    #[test]
    fn test_io_error_conversion() {
        use std::io;
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: DiagramError = io_err.into();
        let error_msg = format!("{}", error);
        assert!(error_msg.contains("IO error"));
        assert!(error_msg.contains("File not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: DiagramError = json_err.into();
        assert!(error.to_string().starts_with("JSON error"));
    }
}
