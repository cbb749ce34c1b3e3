//! Graphviz drawing backend
//!
//! Builds DOT source in memory. The `dot` format is written as-is; every
//! other format is produced by piping the source through the Graphviz `dot`
//! executable. Output always goes to a temporary file beside the target that
//! is persisted over it only once complete.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::core::{
    DiagramError, DiagramSettings, DrawingBackend, DrawingSession, EdgeAttributes, OutputFormat,
};
use crate::nodes::DrawableNode;

/// Default Graphviz executable
pub const DEFAULT_DOT_BINARY: &str = "dot";

/// Production backend driving Graphviz
#[derive(Debug, Clone)]
pub struct GraphvizBackend {
    dot_binary: String,
}

impl GraphvizBackend {
    pub fn new() -> Self {
        Self::with_binary(DEFAULT_DOT_BINARY)
    }

    /// Use a specific `dot` executable
    pub fn with_binary(dot_binary: impl Into<String>) -> Self {
        Self {
            dot_binary: dot_binary.into(),
        }
    }

    pub fn dot_binary(&self) -> &str {
        &self.dot_binary
    }
}

impl Default for GraphvizBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingBackend for GraphvizBackend {
    fn open(&self, settings: &DiagramSettings) -> Result<Box<dyn DrawingSession>> {
        trace!(title = %settings.title, format = %settings.format, "Opening Graphviz session");
        Ok(Box::new(GraphvizSession::new(
            self.dot_binary.clone(),
            settings,
        )))
    }

    fn name(&self) -> &'static str {
        "graphviz"
    }

    fn supports(&self, _format: OutputFormat) -> bool {
        true
    }
}

/// One in-memory DOT document
#[derive(Debug)]
pub struct GraphvizSession {
    dot_binary: String,
    format: OutputFormat,
    body: String,
    nodes: HashSet<String>,
    depth: usize,
    clusters_opened: usize,
}

impl GraphvizSession {
    fn new(dot_binary: String, settings: &DiagramSettings) -> Self {
        let mut body = String::new();
        let _ = writeln!(body, "digraph {{");
        let _ = writeln!(body, "  graph [rankdir={}, label={}, labelloc=t, fontsize=20, fontname=\"Helvetica\", pad=0.5, nodesep=0.6, ranksep=0.8];", settings.direction, quote(&settings.title));
        let _ = writeln!(body, "  node [fontname=\"Helvetica\", fontsize=12, style=\"filled,rounded\"];");
        let _ = writeln!(body, "  edge [fontname=\"Helvetica\", fontsize=10];");

        Self {
            dot_binary,
            format: settings.format,
            body,
            nodes: HashSet::new(),
            depth: 1,
            clusters_opened: 0,
        }
    }

    /// DOT source written so far, with every open cluster closed
    pub fn source(&self) -> String {
        let mut source = self.body.clone();
        for depth in (1..self.depth).rev() {
            let _ = writeln!(source, "{}}}", indent(depth));
        }
        source.push_str("}\n");
        source
    }

    fn render_bytes(&self, source: &str) -> Result<Vec<u8>> {
        if self.format == OutputFormat::Dot {
            return Ok(source.as_bytes().to_vec());
        }

        let mut child = Command::new(&self.dot_binary)
            .arg(format!("-T{}", self.format.extension()))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DiagramError::backend_unavailable(format!(
                    "Graphviz executable '{}' not found",
                    self.dot_binary
                )),
                _ => DiagramError::from(e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .context("failed to send graph to Graphviz")?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiagramError::render_error(format!(
                "Graphviz exited with {}: {}",
                output.status,
                stderr.trim()
            ))
            .into());
        }
        Ok(output.stdout)
    }
}

impl DrawingSession for GraphvizSession {
    fn add_node(&mut self, node: &DrawableNode) -> Result<()> {
        if !self.nodes.insert(node.id().to_string()) {
            return Err(DiagramError::render_error(format!(
                "node '{}' drawn twice",
                node.id()
            ))
            .into());
        }

        let class = node.class();
        let mut tooltip = class.qualified_name();
        for (key, value) in node.properties() {
            let _ = write!(tooltip, "\n{}: {}", key, value);
        }

        let _ = writeln!(
            self.body,
            "{}{} [label={}, shape={}, fillcolor={}, tooltip={}];",
            indent(self.depth),
            quote(node.id()),
            quote(node.label()),
            class.shape().dot_name(),
            quote(class.fill_color()),
            quote(&tooltip),
        );
        Ok(())
    }

    fn add_edge(&mut self, from: &str, to: &str, attributes: &EdgeAttributes) -> Result<()> {
        for endpoint in [from, to] {
            if !self.nodes.contains(endpoint) {
                return Err(DiagramError::render_error(format!(
                    "edge references undrawn node '{}'",
                    endpoint
                ))
                .into());
            }
        }

        let mut attrs = Vec::new();
        if let Some(label) = &attributes.label {
            attrs.push(format!("label={}", quote(label)));
        }
        if let Some(color) = &attributes.color {
            attrs.push(format!("color={}", quote(color)));
        }
        if let Some(style) = attributes.style {
            attrs.push(format!("style={}", style));
        }

        let _ = write!(self.body, "{}{} -> {}", indent(self.depth), quote(from), quote(to));
        if !attrs.is_empty() {
            let _ = write!(self.body, " [{}]", attrs.join(", "));
        }
        self.body.push_str(";\n");
        Ok(())
    }

    fn begin_cluster(&mut self, name: &str) -> Result<()> {
        let _ = writeln!(
            self.body,
            "{}subgraph cluster_{} {{",
            indent(self.depth),
            self.clusters_opened
        );
        self.depth += 1;
        self.clusters_opened += 1;
        let _ = writeln!(
            self.body,
            "{}graph [label={}, style=\"rounded,dashed\", color=\"#7F8C8D\"];",
            indent(self.depth),
            quote(name)
        );
        Ok(())
    }

    fn end_cluster(&mut self) -> Result<()> {
        if self.depth <= 1 {
            return Err(DiagramError::render_error("no open cluster to close").into());
        }
        self.depth -= 1;
        let _ = writeln!(self.body, "{}}}", indent(self.depth));
        Ok(())
    }

    fn finish(self: Box<Self>, target: &Path) -> Result<PathBuf> {
        let source = self.source();
        let bytes = self.render_bytes(&source)?;

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to stage output in {}", dir.display()))?;
        staged.write_all(&bytes)?;
        staged.flush()?;
        staged
            .persist(target)
            .with_context(|| format!("failed to write {}", target.display()))?;

        debug!(
            path = %target.display(),
            bytes = bytes.len(),
            format = %self.format,
            "Graphviz output written"
        );
        Ok(target.to_path_buf())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Quote a string as a DOT identifier
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
