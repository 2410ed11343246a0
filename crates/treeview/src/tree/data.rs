//! Node descriptions and the data sources they are loaded from

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::error::LoadError;
use crate::tree::node::Node;

/// Nested description of a node, as supplied by the data source
///
/// Only `text` is mandatory. Any field the engine does not know about is kept
/// in `extra` and handed back untouched to renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Display text
    pub text: String,
    /// Child descriptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeData>>,
    /// Initial state overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeStateData>,
    /// Whether the node can be selected (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
    /// Whether the node can be checked (default true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkable: Option<bool>,
    /// Fetch children through the lazy loader on first expansion
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub lazy_load: bool,
    /// Pass-through presentation fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Initial state overrides of a node description
///
/// Absent fields fall back to engine defaults. `checked: null` requests the
/// partial state, which only survives in hierarchical check mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStateData {
    /// `Some(None)` is the partial state
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub checked: Option<Option<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

// Distinguishes an explicit `null` from an absent field.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(Some)
}

impl NodeData {
    /// Create a description with the given text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Append a child description
    pub fn child(mut self, node: NodeData) -> Self {
        self.nodes.get_or_insert_with(Vec::new).push(node);
        self
    }

    /// Set the child descriptions
    pub fn with_children(mut self, nodes: Vec<NodeData>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Set an arbitrary pass-through field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Set the initial checked state
    pub fn checked(mut self, checked: bool) -> Self {
        self.state_mut().checked = Some(Some(checked));
        self
    }

    /// Request the partial checked state
    pub fn partially_checked(mut self) -> Self {
        self.state_mut().checked = Some(None);
        self
    }

    /// Set the initial expanded state
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.state_mut().expanded = Some(expanded);
        self
    }

    /// Set the initial selected state
    pub fn selected(mut self, selected: bool) -> Self {
        self.state_mut().selected = Some(selected);
        self
    }

    /// Set the initial disabled state
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.state_mut().disabled = Some(disabled);
        self
    }

    /// Set whether the node can be selected
    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = Some(selectable);
        self
    }

    /// Set whether the node can be checked
    pub fn checkable(mut self, checkable: bool) -> Self {
        self.checkable = Some(checkable);
        self
    }

    /// Mark the node's children as lazily loaded
    pub fn lazy(mut self) -> Self {
        self.lazy_load = true;
        self
    }

    fn state_mut(&mut self) -> &mut NodeStateData {
        self.state.get_or_insert_with(NodeStateData::default)
    }
}

/// Remote location of a node description, resolved by a [`DataFetcher`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    /// URL to fetch
    pub url: String,
    /// HTTP method
    #[serde(default = "default_method")]
    pub method: String,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl RemoteSource {
    /// A `GET` request for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
        }
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Where the initial node descriptions come from
#[derive(Debug, Clone)]
pub enum DataSource {
    /// Already-built descriptions
    Nodes(Vec<NodeData>),
    /// A JSON array of descriptions
    Json(String),
    /// A file containing a JSON array of descriptions
    File(PathBuf),
    /// A remote document fetched through the tree's [`DataFetcher`]
    Remote(RemoteSource),
}

impl DataSource {
    /// Produce the descriptions, fetching and parsing as needed
    pub fn resolve(self, fetcher: Option<&dyn DataFetcher>) -> Result<Vec<NodeData>, LoadError> {
        match self {
            DataSource::Nodes(nodes) => Ok(nodes),
            DataSource::Json(json) => Ok(serde_json::from_str(&json)?),
            DataSource::File(path) => {
                let json = fs::read_to_string(&path)
                    .map_err(|source| LoadError::Io { path, source })?;
                Ok(serde_json::from_str(&json)?)
            }
            DataSource::Remote(remote) => {
                let fetcher = fetcher.ok_or(LoadError::NoFetcher)?;
                let json = fetcher.fetch(&remote).map_err(|source| LoadError::Fetch {
                    url: remote.url.clone(),
                    source,
                })?;
                Ok(serde_json::from_str(&json)?)
            }
        }
    }
}

/// The `data` / `dataUrl` configuration pair
///
/// Exactly one of the two must be set. `data` may be an array of
/// descriptions or a string holding such an array as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub data_url: Option<RemoteSource>,
}

impl SourceConfig {
    /// Validate the configuration into a data source
    pub fn into_source(self) -> Result<DataSource, LoadError> {
        match (self.data, self.data_url) {
            (Some(_), Some(_)) => Err(LoadError::ConflictingSources),
            (None, None) => Err(LoadError::NoDataSource),
            (None, Some(remote)) => Ok(DataSource::Remote(remote)),
            (Some(Value::String(json)), None) => Ok(DataSource::Json(json)),
            (Some(value @ Value::Array(_)), None) => {
                Ok(DataSource::Nodes(serde_json::from_value(value)?))
            }
            (Some(_), None) => Err(LoadError::UnsupportedData),
        }
    }
}

/// Collaborator that performs the actual network request for remote sources
pub trait DataFetcher {
    /// Fetch the raw JSON document behind `source`
    fn fetch(&self, source: &RemoteSource) -> anyhow::Result<String>;
}

impl<F> DataFetcher for F
where
    F: Fn(&RemoteSource) -> anyhow::Result<String>,
{
    fn fetch(&self, source: &RemoteSource) -> anyhow::Result<String> {
        self(source)
    }
}

/// Collaborator that supplies the children of a lazy node on first expansion
pub trait LazyLoader {
    /// Produce the children of `node`
    fn load_children(&mut self, node: &Node) -> anyhow::Result<Vec<NodeData>>;
}

impl<F> LazyLoader for F
where
    F: FnMut(&Node) -> anyhow::Result<Vec<NodeData>>,
{
    fn load_children(&mut self, node: &Node) -> anyhow::Result<Vec<NodeData>> {
        self(node)
    }
}
