//! Diagram specification model
//!
//! An immutable graph of components, connections and clusters, built once
//! from a loosely-typed JSON object. All leniency towards generated input
//! lives in the deserialization step here: missing optional fields take their
//! documented defaults, scalar values of the wrong JSON type are coerced to
//! strings, and unknown layouts fall back to vertical. Referential integrity
//! is left to the validator.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::{DiagramError, Layout};

/// Title used when the source does not provide one
pub const DEFAULT_TITLE: &str = "Untitled Diagram";

/// Provider used when the source does not provide one
pub const DEFAULT_PROVIDER: &str = "generic";

/// One node of a specification, before resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    id: String,
    node_type: String,
    category: String,
    provider: Option<String>,
    label: Option<String>,
    properties: BTreeMap<String, String>,
}

impl Component {
    /// Create a component with no category, provider, label or properties
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            category: String::new(),
            provider: None,
            label: None,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(normalize_provider(&provider.into()));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Requested node type name
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Component-level provider; specifications fill this in on construction
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Display label, defaulting to the id
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

/// A directed edge between two component ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    from_id: String,
    to_id: String,
    label: Option<String>,
    color: Option<String>,
    style: Option<String>,
}

impl Connection {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            label: None,
            color: None,
            style: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn from_id(&self) -> &str {
        &self.from_id
    }

    pub fn to_id(&self) -> &str {
        &self.to_id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }
}

/// A named visual grouping of components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentCluster {
    name: String,
    component_ids: Vec<String>,
}

impl ComponentCluster {
    pub fn new<I, S>(name: impl Into<String>, component_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            component_ids: component_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_ids(&self) -> &[String] {
        &self.component_ids
    }

    /// Check whether the cluster names a component
    pub fn contains(&self, id: &str) -> bool {
        self.component_ids.iter().any(|member| member == id)
    }
}

/// A complete diagram specification
///
/// # Example
/// ```
/// use diagen::spec::DiagramSpecification;
/// use serde_json::json;
///
/// let spec = DiagramSpecification::from_value(&json!({
///     "title": "Web",
///     "layout": "horizontal",
///     "components": [{"id": "web", "type": "EC2", "category": "compute"}],
///     "connections": []
/// }))
/// .unwrap();
/// assert_eq!(spec.get_direction(), "LR");
/// assert_eq!(spec.get_component_by_id("web").unwrap().label(), "web");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSpecification {
    title: String,
    provider: String,
    layout: Layout,
    components: Vec<Component>,
    connections: Vec<Connection>,
    clusters: Vec<ComponentCluster>,
}

impl DiagramSpecification {
    /// Start building a specification in code
    pub fn builder(title: impl Into<String>) -> DiagramSpecificationBuilder {
        DiagramSpecificationBuilder::new(title)
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str) -> Result<Self, DiagramError> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(&value)
    }

    /// Build a specification from a loosely-typed JSON object
    ///
    /// Fails only when the source is not structurally plausible: not an
    /// object, a list field that is not a list, or a component or connection
    /// without its identifying fields.
    pub fn from_value(raw: &Value) -> Result<Self, DiagramError> {
        if !raw.is_object() {
            return Err(DiagramError::spec_error(format!(
                "specification must be a JSON object, got {}",
                json_kind(raw)
            )));
        }

        let source = RawSpecification::deserialize(raw)
            .map_err(|e| DiagramError::spec_error(e.to_string()))?;
        let spec = source.into_specification()?;

        debug!(
            title = %spec.title,
            provider = %spec.provider,
            components = spec.components.len(),
            connections = spec.connections.len(),
            clusters = spec.clusters.len(),
            "Parsed diagram specification"
        );
        Ok(spec)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Default provider for components that do not name their own
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn clusters(&self) -> &[ComponentCluster] {
        &self.clusters
    }

    /// Direction code for the drawing backend: `TB` or `LR`
    pub fn get_direction(&self) -> &'static str {
        self.layout.direction()
    }

    /// First component with exactly this id
    pub fn get_component_by_id(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.id == id)
    }

    /// Components no cluster refers to, in specification order
    pub fn get_unclustered_components(&self) -> Vec<&Component> {
        let clustered: HashSet<&str> = self
            .clusters
            .iter()
            .flat_map(|cluster| cluster.component_ids.iter().map(String::as_str))
            .collect();

        self.components
            .iter()
            .filter(|component| !clustered.contains(component.id.as_str()))
            .collect()
    }

    /// Provider a component resolves against
    pub fn component_provider<'a>(&'a self, component: &'a Component) -> &'a str {
        component.provider().unwrap_or(&self.provider)
    }

    pub fn has_clusters(&self) -> bool {
        !self.clusters.is_empty()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

/// Builder for specifications written in code
#[derive(Debug, Clone)]
pub struct DiagramSpecificationBuilder {
    title: String,
    provider: String,
    layout: Layout,
    components: Vec<Component>,
    connections: Vec<Connection>,
    clusters: Vec<ComponentCluster>,
}

impl DiagramSpecificationBuilder {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            provider: DEFAULT_PROVIDER.to_string(),
            layout: Layout::default(),
            components: Vec::new(),
            connections: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = normalize_provider(&provider.into());
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn cluster(mut self, cluster: ComponentCluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Finish the specification, filling component providers
    pub fn build(self) -> DiagramSpecification {
        let provider = self.provider;
        let components = self
            .components
            .into_iter()
            .map(|mut component| {
                component.provider.get_or_insert_with(|| provider.clone());
                component
            })
            .collect();

        DiagramSpecification {
            title: self.title,
            provider,
            layout: self.layout,
            components,
            connections: self.connections,
            clusters: self.clusters,
        }
    }
}

fn normalize_provider(provider: &str) -> String {
    provider.trim().to_lowercase()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Coerce a scalar to a string; `null`, arrays and objects become `None`
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let properties = match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::Array(_) | Value::Object(_) => value.to_string(),
                    other => scalar_to_string(other).unwrap_or_default(),
                };
                (key, value)
            })
            .collect(),
        _ => BTreeMap::new(),
    };
    Ok(properties)
}

fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        _ => Vec::new(),
    };
    Ok(ids)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSpecification {
    #[serde(deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "diagram_type")]
    provider: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    layout: Option<String>,
    #[serde(deserialize_with = "null_as_default", alias = "nodes")]
    components: Vec<RawComponent>,
    #[serde(deserialize_with = "null_as_default", alias = "edges")]
    connections: Vec<RawConnection>,
    #[serde(deserialize_with = "null_as_default", alias = "groups")]
    clusters: Vec<RawCluster>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawComponent {
    #[serde(deserialize_with = "lenient_string", alias = "name")]
    id: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_string", alias = "node_type")]
    node_type: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    category: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "component_provider")]
    provider: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    label: Option<String>,
    #[serde(deserialize_with = "lenient_properties")]
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConnection {
    #[serde(deserialize_with = "lenient_string", alias = "source", alias = "from_id")]
    from: Option<String>,
    #[serde(deserialize_with = "lenient_string", alias = "target", alias = "to_id")]
    to: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    label: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    color: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    style: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCluster {
    #[serde(deserialize_with = "lenient_string", alias = "label")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient_ids", alias = "component_ids")]
    components: Vec<String>,
}

impl RawSpecification {
    fn into_specification(self) -> Result<DiagramSpecification, DiagramError> {
        let title = self
            .title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let provider = self
            .provider
            .map(|p| normalize_provider(&p))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let layout = self
            .layout
            .as_deref()
            .map(Layout::parse_lenient)
            .unwrap_or_default();

        let components = self
            .components
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.into_component(index, &provider))
            .collect::<Result<Vec<_>, _>>()?;

        let connections = self
            .connections
            .into_iter()
            .enumerate()
            .map(|(index, raw)| raw.into_connection(index))
            .collect::<Result<Vec<_>, _>>()?;

        let clusters = self
            .clusters
            .into_iter()
            .enumerate()
            .map(|(index, raw)| ComponentCluster {
                name: raw
                    .name
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| format!("Cluster {}", index + 1)),
                component_ids: raw.components,
            })
            .collect();

        Ok(DiagramSpecification {
            title,
            provider,
            layout,
            components,
            connections,
            clusters,
        })
    }
}

impl RawComponent {
    fn into_component(self, index: usize, default_provider: &str) -> Result<Component, DiagramError> {
        let id = required(self.id, || format!("component {} is missing 'id'", index))?;
        let node_type = required(self.node_type, || {
            format!("component '{}' is missing 'type'", id)
        })?;
        trace!(id = %id, node_type = %node_type, "Parsed component");

        let provider = self
            .provider
            .map(|p| normalize_provider(&p))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| default_provider.to_string());

        Ok(Component {
            id,
            node_type,
            category: self.category.map(|c| c.trim().to_string()).unwrap_or_default(),
            provider: Some(provider),
            label: self.label.filter(|label| !label.is_empty()),
            properties: self.properties,
        })
    }
}

impl RawConnection {
    fn into_connection(self, index: usize) -> Result<Connection, DiagramError> {
        let from_id = required(self.from, || format!("connection {} is missing 'from'", index))?;
        let to_id = required(self.to, || format!("connection {} is missing 'to'", index))?;
        Ok(Connection {
            from_id,
            to_id,
            label: self.label.filter(|label| !label.is_empty()),
            color: self.color.filter(|color| !color.is_empty()),
            style: self.style.filter(|style| !style.is_empty()),
        })
    }
}

fn required(value: Option<String>, message: impl FnOnce() -> String) -> Result<String, DiagramError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DiagramError::spec_error(message()))
}
