//! Upsert layer: get-or-create-then-merge for the four entity kinds.
//!
//! Freshly observed facts are carried in a tagged variant per kind, each with
//! a strongly typed record. Creating builds the kind's full default
//! properties; merging overwrites only what the kind's policy allows, so
//! manually curated properties survive reconciliation runs.

use serde_json::{Map, Value, json};

use crate::graph::{Graph, Node};
use crate::stats::{FileStats, today};
use crate::vocab;

/// Facts observed about a data file declared by a notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFacts {
    /// The literal declared path or URL; doubles as the entity id.
    pub id: String,
    pub stats: FileStats,
    /// Whether the reference is a remote resource (gets `sdDatePublished`).
    pub remote: bool,
}

/// Facts observed about a person appearing as an author.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonFacts {
    pub id: String,
    pub name: String,
}

/// Facts observed about a notebook on this scan.
#[derive(Debug, Clone, PartialEq)]
pub struct NotebookFacts {
    /// The notebook's file name.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Set from the crate root's URL on first creation only.
    pub code_repository: Option<String>,
}

/// Facts for the provenance action linking a notebook run to its files.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionFacts {
    pub id: String,
    pub notebook_id: String,
    /// Latest modification date among the run's outputs, or the notebook's
    /// own date when there are none.
    pub end_date: Option<String>,
}

/// A freshly observed entity, tagged by kind. Each variant carries the typed
/// record its default/merge policy needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    File(FileFacts),
    Person(PersonFacts),
    Notebook(NotebookFacts),
    Action(ActionFacts),
}

impl Observed {
    pub fn id(&self) -> &str {
        match self {
            Observed::File(f) => &f.id,
            Observed::Person(p) => &p.id,
            Observed::Notebook(n) => &n.id,
            Observed::Action(a) => &a.id,
        }
    }

    /// Full default properties for a node created from this observation.
    /// Structural properties are fixed here and never revisited by `merge`.
    fn default_props(&self) -> Map<String, Value> {
        let value = match self {
            Observed::File(facts) => {
                let name = facts.id.rsplit('/').next().unwrap_or(&facts.id);
                let mut props = json!({
                    "@type": ["File", "Dataset"],
                    "name": name,
                });
                if let Some(encoding) = guess_encoding_format(&facts.id) {
                    props["encodingFormat"] = json!(encoding);
                }
                props
            }
            Observed::Person(_) => json!({ "@type": "Person" }),
            Observed::Notebook(facts) => {
                let mut props = json!({
                    "@type": ["File", "SoftwareSourceCode"],
                    "programmingLanguage": vocab::id_ref(vocab::PYTHON_ID),
                    "encodingFormat": vocab::NOTEBOOK_ENCODING_FORMAT,
                    "conformsTo": vocab::id_ref(vocab::NOTEBOOK_PROFILE),
                });
                if let Some(repository) = &facts.code_repository {
                    props["codeRepository"] = json!(repository);
                }
                props
            }
            Observed::Action(facts) => json!({
                "@type": "CreateAction",
                "instrument": vocab::id_ref(&facts.notebook_id),
                "actionStatus": vocab::id_ref(vocab::COMPLETED_ACTION_STATUS),
                "name": format!("Run of notebook: {}", facts.notebook_id),
            }),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Apply this kind's merge policy to a property mapping. Only the
    /// properties named here are touched; everything else survives.
    fn merge(&self, props: &mut Map<String, Value>) {
        match self {
            Observed::File(facts) => {
                if let Some(date) = &facts.stats.date {
                    props.insert("dateModified".into(), json!(date));
                }
                if let Some(size) = facts.stats.size {
                    props.insert("contentSize".into(), json!(size));
                }
                // Remote resources record when they were last accessed.
                if facts.remote {
                    props.insert("sdDatePublished".into(), json!(today()));
                }
            }
            Observed::Person(facts) => {
                props.insert("name".into(), json!(facts.name));
            }
            Observed::Notebook(facts) => {
                props.insert("name".into(), json!(facts.name));
                props.insert("description".into(), json!(facts.description));
                // Authors are re-attached by the processor after the merge.
                props.insert("author".into(), json!([]));
            }
            Observed::Action(facts) => {
                // Cleared so the caller rebuilds the edge lists from the
                // current scan; stale references must not accumulate.
                props.insert("object".into(), json!([]));
                props.insert("result".into(), json!([]));
                match &facts.end_date {
                    Some(date) => {
                        props.insert("endDate".into(), json!(date));
                    }
                    None => {
                        props.remove("endDate");
                    }
                }
            }
        }
    }
}

/// Get-or-create-then-merge. Returns the id of the affected node.
///
/// Idempotent: upserting the same observation twice yields an identical node.
pub fn upsert(graph: &mut Graph, observed: &Observed) -> String {
    let id = observed.id().to_string();
    let mut props = match graph.get(&id) {
        Some(existing) => existing.properties().clone(),
        None => observed.default_props(),
    };
    observed.merge(&mut props);
    graph.add(Node::new(id.as_str(), props));
    id
}

/// Guess a MIME encoding format from a reference's extension. Unknown
/// extensions record no format at all.
pub(crate) fn guess_encoding_format(reference: &str) -> Option<&'static str> {
    let extension = reference.rsplit('.').next()?;
    match extension.to_ascii_lowercase().as_str() {
        "csv" => Some("text/csv"),
        "tsv" => Some("text/tab-separated-values"),
        "json" | "geojson" => Some("application/json"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "xml" => Some("text/xml"),
        "html" | "htm" => Some("text/html"),
        "pdf" => Some("application/pdf"),
        "zip" => Some("application/zip"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}
