//! In-memory JSON-LD graph store backed by a single metadata document.
//!
//! The whole graph is loaded at the start of a run, mutated in place by
//! exactly one writer, and rewritten wholesale at the end. Node order is
//! preserved across load/write so unchanged runs produce identical output.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{CrateError, Result};
use crate::vocab;

/// One record in the graph: a unique identifier plus its property mapping.
///
/// The `@id` key is held separately from the property map and re-inserted on
/// serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: String,
    props: Map<String, Value>,
}

impl Node {
    /// Create a node from an id and a property mapping. An `@id` entry in the
    /// mapping is ignored in favour of the explicit id.
    pub fn new(id: impl Into<String>, mut props: Map<String, Value>) -> Self {
        props.remove("@id");
        Self {
            id: id.into(),
            props,
        }
    }

    /// Create a node from an id and a `json!` object literal. Non-object
    /// values yield an empty property mapping.
    pub fn with_props(id: impl Into<String>, props: Value) -> Self {
        match props {
            Value::Object(map) => Self::new(id, map),
            _ => Self::new(id, Map::new()),
        }
    }

    /// Build a node from a JSON-LD entity object carrying its own `@id`.
    fn from_value(value: Value) -> std::result::Result<Self, String> {
        let Value::Object(mut props) = value else {
            return Err("graph entity is not a JSON object".into());
        };
        let id = match props.remove("@id") {
            Some(Value::String(id)) => id,
            _ => return Err("graph entity has no string @id".into()),
        };
        Ok(Self { id, props })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The node's current property mapping, without `@id`.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.props
    }

    pub fn properties_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.props
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.props.insert(key.into(), value);
    }

    /// Whether the node's `@type` (scalar or list) contains `type_name`.
    pub fn has_type(&self, type_name: &str) -> bool {
        match self.props.get("@type") {
            Some(Value::String(t)) => t == type_name,
            Some(Value::Array(ts)) => ts.iter().any(|t| t.as_str() == Some(type_name)),
            _ => false,
        }
    }

    /// Append a value to a list-valued property, coercing an existing scalar
    /// to a list first. Appending an array extends the list element-wise.
    pub fn append_to(&mut self, key: &str, value: Value) {
        let mut items = match self.props.remove(key) {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(scalar) => vec![scalar],
        };
        match value {
            Value::Array(new_items) => items.extend(new_items),
            scalar => items.push(scalar),
        }
        self.props.insert(key.to_string(), Value::Array(items));
    }

    /// Serialize back to a JSON-LD entity object with `@id` included.
    fn to_value(&self) -> Value {
        let mut props = self.props.clone();
        props.insert("@id".into(), Value::String(self.id.clone()));
        Value::Object(props)
    }
}

/// The crate's metadata graph: a small, fully-loaded, ordered set of nodes.
///
/// Lookup is linear; graphs here hold tens of nodes, not thousands, and
/// preserving insertion order matters more than lookup speed.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    /// The identifier of the crate root entity.
    pub const ROOT_ID: &'static str = "./";

    /// Load the graph from `dir/ro-crate-metadata.json`.
    ///
    /// If no metadata document exists yet, a fresh graph with a metadata
    /// descriptor and an empty root dataset is bootstrapped. A document that
    /// exists but cannot be parsed is fatal.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(vocab::METADATA_FILE_NAME);
        if !path.exists() {
            tracing::info!("no metadata document at {}, starting fresh", path.display());
            return Ok(Self::bootstrap());
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| CrateError::GraphIo {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|e| CrateError::GraphIo {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let entities = document
            .get("@graph")
            .and_then(Value::as_array)
            .ok_or_else(|| CrateError::GraphIo {
                path: path.clone(),
                message: "document has no @graph array".into(),
            })?;

        let mut nodes = Vec::with_capacity(entities.len());
        for entity in entities {
            nodes.push(Node::from_value(entity.clone()).map_err(|message| {
                CrateError::GraphIo {
                    path: path.clone(),
                    message,
                }
            })?);
        }
        Ok(Self { nodes })
    }

    /// A fresh graph holding only the metadata descriptor and the crate root.
    fn bootstrap() -> Self {
        let descriptor = Node::with_props(
            vocab::METADATA_FILE_NAME,
            serde_json::json!({
                "@type": "CreativeWork",
                "conformsTo": vocab::id_ref(vocab::CRATE_CONFORMS_TO),
                "about": vocab::id_ref(Self::ROOT_ID),
            }),
        );
        let root = Node::with_props(
            Self::ROOT_ID,
            serde_json::json!({
                "@type": "Dataset",
                "datePublished": chrono::Local::now().format("%Y-%m-%d").to_string(),
            }),
        );
        Self {
            nodes: vec![descriptor, root],
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// All nodes whose `@type` contains `type_name`.
    ///
    /// Containment, not equality: a notebook typed
    /// `["File", "SoftwareSourceCode"]` is returned for `"File"`.
    pub fn get_by_type(&self, type_name: &str) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.has_type(type_name)).collect()
    }

    /// Ids of all nodes whose `@type` contains `type_name`.
    pub fn ids_of_type(&self, type_name: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.has_type(type_name))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Insert a node, replacing any existing node with the same id in place
    /// (same position, new properties).
    pub fn add(&mut self, node: Node) {
        match self.nodes.iter_mut().find(|n| n.id == node.id) {
            Some(existing) => *existing = node,
            None => self.nodes.push(node),
        }
    }

    /// Remove the node with the given id, if present.
    pub fn delete(&mut self, id: &str) {
        self.nodes.retain(|n| n.id != id);
    }

    /// The crate root entity. Present in every loaded or bootstrapped graph.
    pub fn root(&self) -> Option<&Node> {
        self.get(Self::ROOT_ID)
    }

    pub fn root_mut(&mut self) -> Option<&mut Node> {
        self.get_mut(Self::ROOT_ID)
    }

    /// Merge the given properties into an existing node, creating it with
    /// exactly those properties if absent.
    pub fn update(&mut self, id: &str, props: Map<String, Value>) {
        match self.get_mut(id) {
            Some(node) => {
                for (key, value) in props {
                    node.set(key, value);
                }
            }
            None => self.add(Node::new(id, props)),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rewrite `dir/ro-crate-metadata.json` wholesale.
    ///
    /// Writes to a `.tmp` sibling first, then renames, so a crash mid-write
    /// leaves the previous document intact.
    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(vocab::METADATA_FILE_NAME);
        let document = serde_json::json!({
            "@context": vocab::CRATE_CONTEXT,
            "@graph": self.nodes.iter().map(Node::to_value).collect::<Vec<_>>(),
        });
        let rendered =
            serde_json::to_string_pretty(&document).map_err(|e| CrateError::GraphIo {
                path: path.clone(),
                message: e.to_string(),
            })?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, rendered.as_bytes()).map_err(|e| CrateError::GraphIo {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::rename(&tmp, &path).map_err(|e| CrateError::GraphIo {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }
}
