//! Command-line interface for the diagen utility
//!
//! Provides a CLI to validate and render diagram specifications and to browse
//! the provider catalog.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use crate::colorizer::{status_line, Status};
use diagen::core::logging::init_logging;
use diagen::render::DiagramResult;
use diagen::service::DiagramService;
use diagen::{GeneratorConfig, OutputFormat};

/// Diagen - Render architecture diagrams from JSON specifications
#[derive(Parser)]
#[command(name = "diagen")]
#[command(about = "Validate and render architecture diagram specifications")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Generator configuration file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// When to use colors in output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto, global = true)]
    pub color: ColorChoice,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a specification to a diagram file
    Render {
        /// Input file containing the JSON specification (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output path; the format's extension is appended when missing
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (defaults to the configured format)
        #[arg(short, long, value_enum)]
        format: Option<FormatChoice>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a specification without rendering it
    Validate {
        /// Input file to validate (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// List catalog providers
    Providers {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the categories of a provider
    Categories {
        provider: String,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the node types of a category
    Nodes {
        provider: String,
        category: String,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Search node types by name
    Search {
        query: String,

        /// Only search one provider
        #[arg(short, long)]
        provider: Option<String>,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// Output formats accepted on the command line
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum FormatChoice {
    Png,
    Svg,
    Pdf,
    Dot,
}

impl From<FormatChoice> for OutputFormat {
    fn from(value: FormatChoice) -> Self {
        match value {
            FormatChoice::Png => OutputFormat::Png,
            FormatChoice::Svg => OutputFormat::Svg,
            FormatChoice::Pdf => OutputFormat::Pdf,
            FormatChoice::Dot => OutputFormat::Dot,
        }
    }
}

/// When to colorize output
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Use colors if output is a terminal and NO_COLOR is not set
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Decide whether status lines written to stdout get colors
    pub fn should_colorize(&self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                if std::env::var_os("NO_COLOR").is_some() {
                    return false;
                }
                crossterm::tty::IsTty::is_tty(&std::io::stdout())
            }
        }
    }
}

/// Initialize logging from CLI flags (environment variables take precedence)
pub fn init_cli_logging(cli: &Cli) {
    let log_level = std::env::var("DIAGEN_LOG_LEVEL")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| {
            if cli.verbose {
                LogLevel::Info.as_str().to_string()
            } else {
                cli.log_level.as_str().to_string()
            }
        });

    let log_format = std::env::var("DIAGEN_LOG_FORMAT")
        .ok()
        .unwrap_or_else(|| cli.log_format.as_str().to_string());

    if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
}

/// Load the generator configuration named on the command line
pub fn load_config(path: Option<&PathBuf>) -> Result<GeneratorConfig> {
    let config = match path {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => GeneratorConfig::default(),
    };
    Ok(config.with_env_overrides())
}

/// Main CLI application
pub struct DiagenApp {
    service: DiagramService,
    colorize: bool,
    verbose: bool,
}

impl DiagenApp {
    /// Create an application over a configuration
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            service: DiagramService::new(config),
            colorize: false,
            verbose: false,
        }
    }

    /// Create the application the parsed arguments describe
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let config = load_config(cli.config.as_ref())?;
        let mut app = Self::new(config);
        app.colorize = cli.color.should_colorize();
        app.verbose = cli.verbose;
        Ok(app)
    }

    /// Run one command, writing to stdout
    pub fn run(&self, command: Commands) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.execute(command, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Run one command, writing to `out`
    pub fn execute(&self, command: Commands, out: &mut dyn Write) -> Result<()> {
        if self.verbose {
            eprintln!("Diagen v{}", env!("CARGO_PKG_VERSION"));
        }

        match command {
            Commands::Render {
                input,
                output,
                format,
                json,
            } => self.render_command(input, output, format.map(Into::into), json, out),
            Commands::Validate { input } => self.validate_command(input, out),
            Commands::Providers { json } => self.providers_command(json, out),
            Commands::Categories { provider, json } => {
                self.categories_command(&provider, json, out)
            }
            Commands::Nodes {
                provider,
                category,
                json,
            } => self.nodes_command(&provider, &category, json, out),
            Commands::Search {
                query,
                provider,
                limit,
                json,
            } => self.search_command(&query, provider.as_deref(), limit, json, out),
        }
    }

    /// Handle the render command
    fn render_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        format: Option<OutputFormat>,
        json: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        if self.verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let result = match output {
            Some(path) => match serde_json::from_str(&content) {
                Ok(raw) => self.service.render_to(&raw, &path, format),
                Err(e) => DiagramResult::failure(format!("Invalid specification: {}", e)),
            },
            None => self.service.create_diagram_from_json(&content, format),
        };

        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&result.to_json())?)?;
        } else if let Some(diagram) = result.rendered() {
            let message = format!(
                "Rendered '{}' to {} ({} components, {} connections, {:.3} MB)",
                diagram.title,
                diagram.file_path.display(),
                diagram.components_count,
                diagram.connections_count,
                diagram.image_size_mb,
            );
            writeln!(out, "{}", status_line(Status::Ok, &message, self.colorize))?;
            for substitution in &diagram.substitutions {
                writeln!(
                    out,
                    "  {}: '{}' drawn as '{}'",
                    substitution.component_id, substitution.requested, substitution.resolved
                )?;
            }
            for warning in &diagram.warnings {
                writeln!(out, "  warning: {}", warning)?;
            }
        }

        match result.error() {
            Some(error) => {
                if !json {
                    writeln!(out, "{}", status_line(Status::Failed, error, self.colorize))?;
                }
                Err(anyhow!("Render failed"))
            }
            None => Ok(()),
        }
    }

    /// Handle the validate command
    fn validate_command(&self, input: Option<PathBuf>, out: &mut dyn Write) -> Result<()> {
        let content = self.read_input(input)?;
        let raw: serde_json::Value = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                let message = format!("Invalid JSON: {}", e);
                writeln!(out, "{}", status_line(Status::Failed, &message, self.colorize))?;
                return Err(anyhow!("Invalid specification"));
            }
        };

        let report = match self.service.validate(&raw) {
            Ok(report) => report,
            Err(e) => {
                writeln!(out, "{}", status_line(Status::Failed, &e.to_string(), self.colorize))?;
                return Err(anyhow!("Invalid specification"));
            }
        };

        if report.is_valid() {
            writeln!(out, "{}", status_line(Status::Ok, "Valid specification", self.colorize))?;
        } else {
            writeln!(out, "{}", status_line(Status::Failed, "Invalid specification", self.colorize))?;
            for error in report.error_messages() {
                writeln!(out, "  - {}", error)?;
            }
        }
        for warning in report.warning_messages() {
            writeln!(out, "  warning: {}", warning)?;
        }

        if report.is_valid() {
            Ok(())
        } else {
            Err(anyhow!("Invalid specification"))
        }
    }

    /// Handle the providers command
    fn providers_command(&self, json: bool, out: &mut dyn Write) -> Result<()> {
        let summary = self.service.provider_summary();

        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
            return Ok(());
        }

        writeln!(out, "Available providers:")?;
        for provider in &summary.providers {
            writeln!(
                out,
                "  {:<12} {:>4} nodes in {} categories",
                provider.name,
                provider.total_nodes,
                provider.categories.len()
            )?;
        }
        writeln!(out)?;
        writeln!(
            out,
            "Total: {} providers, {} node types",
            summary.total_providers, summary.total_nodes
        )?;
        Ok(())
    }

    /// Handle the categories command
    fn categories_command(&self, provider: &str, json: bool, out: &mut dyn Write) -> Result<()> {
        let categories = self.service.provider_categories(provider);
        if categories.is_empty() {
            return Err(anyhow!("Unknown provider '{}'", provider));
        }
        write_list(out, &categories, json)
    }

    /// Handle the nodes command
    fn nodes_command(
        &self,
        provider: &str,
        category: &str,
        json: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let nodes = self.service.category_nodes(provider, category);
        if nodes.is_empty() {
            return Err(anyhow!("Unknown category '{}' for provider '{}'", category, provider));
        }
        write_list(out, &nodes, json)
    }

    /// Handle the search command
    fn search_command(
        &self,
        query: &str,
        provider: Option<&str>,
        limit: usize,
        json: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let results = self.service.search_nodes(query, provider, Some(limit));

        if json {
            writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?;
            return Ok(());
        }

        if results.is_empty() {
            writeln!(out, "No node types match '{}'", query)?;
            return Ok(());
        }
        for node in &results {
            writeln!(out, "{}.{}.{}", node.provider, node.category, node.name)?;
        }
        Ok(())
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }
}

fn write_list(out: &mut dyn Write, items: &[String], json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(items)?)?;
    } else {
        for item in items {
            writeln!(out, "{}", item)?;
        }
    }
    Ok(())
}
