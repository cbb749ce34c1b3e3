//! Prompt-driven generation
//!
//! A [`SpecGenerator`] turns a natural-language request into a raw
//! specification; [`GenerateDiagramUseCase`] feeds that into the diagram
//! service. How a generator talks to its model is up to the implementation.

use std::path::PathBuf;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, span, warn, Level};

use super::DiagramService;
use crate::core::{DiagramError, OutputFormat};
use crate::render::DiagramResult;

/// A request to generate a diagram from a prompt
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramRequest {
    pub prompt: String,
    /// Provider the generated specification should use
    pub provider: Option<String>,
    pub format: Option<OutputFormat>,
    /// Explicit output path; the service names the file otherwise
    pub output_path: Option<PathBuf>,
    /// Title overriding whatever the generator picks
    pub title: Option<String>,
}

impl DiagramRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            provider: None,
            format: None,
            output_path: None,
            title: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Produces raw specifications from prompts
pub trait SpecGenerator: Send + Sync {
    /// Generate a raw specification for the request
    ///
    /// Failures should use [`DiagramError::AiProviderError`].
    fn generate_spec(&self, request: &DiagramRequest) -> Result<Value, DiagramError>;

    /// Get the name of this generator
    fn name(&self) -> &str;
}

/// Prompt → specification → rendered diagram
pub struct GenerateDiagramUseCase {
    generator: Box<dyn SpecGenerator>,
    service: DiagramService,
}

impl GenerateDiagramUseCase {
    pub fn new(generator: Box<dyn SpecGenerator>, service: DiagramService) -> Self {
        Self { generator, service }
    }

    pub fn service(&self) -> &DiagramService {
        &self.service
    }

    /// Run one generation; every failure comes back as a failure result
    pub fn execute(&self, request: &DiagramRequest) -> DiagramResult {
        let generate_span = span!(
            Level::INFO,
            "generate_diagram",
            generator = self.generator.name(),
            prompt_len = request.prompt.len()
        );
        let _enter = generate_span.enter();
        let started = Instant::now();

        let mut raw = match self.generator.generate_spec(request) {
            Ok(raw) => raw,
            Err(e) => {
                let e = match e {
                    e @ DiagramError::AiProviderError { .. } => e,
                    other => DiagramError::ai_provider_error(other.to_string()),
                };
                warn!(error = %e, "Specification generation failed");
                return DiagramResult::failure(format!("Generation failed: {}", e));
            }
        };
        apply_request_overrides(&mut raw, request);

        let result = match &request.output_path {
            Some(path) => self.service.render_to(&raw, path, request.format),
            None => self.service.create_diagram_from_spec(&raw, request.format),
        };

        info!(
            success = result.is_success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation finished"
        );
        result
    }
}

/// The request's title always wins; its provider only fills a gap
fn apply_request_overrides(raw: &mut Value, request: &DiagramRequest) {
    let Some(object) = raw.as_object_mut() else {
        return;
    };
    if let Some(title) = &request.title {
        object.insert("title".to_string(), Value::String(title.clone()));
    }
    if let Some(provider) = &request.provider {
        let missing = object
            .get("provider")
            .and_then(Value::as_str)
            .map_or(true, |p| p.trim().is_empty());
        if missing {
            object.insert("provider".to_string(), Value::String(provider.clone()));
        }
    }
}
