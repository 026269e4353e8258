//! Top-level run driver: load the graph, stamp a version if requested, ensure
//! the fixed context entities, process every notebook, garbage-collect, and
//! persist.
//!
//! The graph is written exactly once, at the end; a crash mid-run leaves the
//! on-disk document in its pre-run state.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::entity::{Observed, PersonFacts, upsert};
use crate::error::Result;
use crate::gc;
use crate::graph::{Graph, Node};
use crate::identity;
use crate::metadata;
use crate::processor::NotebookProcessor;
use crate::stats::{StatProvider, today};
use crate::vocab;

/// Configuration for one reconciliation run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The crate directory: metadata document, notebooks, and local data.
    pub dir: PathBuf,
    /// When set, stamp the root with this version and record an UpdateAction.
    pub version: Option<String>,
    /// Abort the whole run on the first notebook failure instead of logging
    /// it and continuing with the rest of the batch.
    pub fail_fast: bool,
}

impl SessionConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            version: None,
            fail_fast: false,
        }
    }
}

/// Counts reported after a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub notebooks_processed: usize,
    pub notebooks_failed: usize,
    pub graph_nodes: usize,
}

/// Owns the graph for the duration of one run; there is exactly one writer.
pub struct CrateSession {
    config: SessionConfig,
    stats: StatProvider,
}

impl CrateSession {
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self {
            config,
            stats: StatProvider::new()?,
        })
    }

    /// Run the full reconciliation sequence.
    pub fn run(&self) -> Result<RunSummary> {
        let dir = &self.config.dir;
        let mut graph = Graph::load(dir)?;

        if let Some(version) = &self.config.version {
            stamp_version(&mut graph, version);
        }
        ensure_context_entities(&mut graph);
        ensure_root_authors(&mut graph, dir)?;

        let notebooks = discover_notebooks(dir)?;
        tracing::info!("found {} notebook(s) in {}", notebooks.len(), dir.display());

        let processor = NotebookProcessor::new(&self.stats, dir);
        let mut summary = RunSummary::default();
        for notebook in &notebooks {
            match processor.process(&mut graph, notebook) {
                Ok(()) => summary.notebooks_processed += 1,
                Err(e) if !self.config.fail_fast => {
                    tracing::warn!("skipping {}: {}", notebook.display(), e);
                    summary.notebooks_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        gc::collect_garbage(&mut graph, dir);
        graph.write(dir)?;

        summary.graph_nodes = graph.len();
        Ok(summary)
    }
}

/// Stamp the root with a new version and publication date, and record an
/// immutable UpdateAction for the bump. The action id embeds the version, so
/// re-running with the same version changes nothing.
fn stamp_version(graph: &mut Graph, version: &str) {
    if let Some(root) = graph.root_mut() {
        root.set("version", json!(version));
        root.set("datePublished", json!(today()));
    }
    let action_id = identity::update_action_id(version);
    if graph.get(&action_id).is_none() {
        graph.add(Node::with_props(
            action_id.as_str(),
            json!({
                "@type": "UpdateAction",
                "name": format!("Create version {version}"),
                "endDate": today(),
                "actionStatus": vocab::id_ref(vocab::COMPLETED_ACTION_STATUS),
            }),
        ));
        tracing::info!("recorded version bump {}", version);
    }
}

/// Ensure the fixed licence and language entities exist, and wire the licence
/// references onto the root and the metadata descriptor. Idempotent.
fn ensure_context_entities(graph: &mut Graph) {
    for entity in [
        vocab::default_licence(),
        vocab::metadata_licence(),
        vocab::python_language(),
    ] {
        let Some(id) = entity
            .get("@id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
        else {
            continue;
        };
        if graph.get(&id).is_none() {
            graph.add(Node::with_props(id, entity));
        }
    }
    if let Some(root) = graph.root_mut() {
        root.set("license", vocab::id_ref(vocab::DEFAULT_LICENCE_ID));
    }
    if let Some(descriptor) = graph.get_mut(vocab::METADATA_FILE_NAME) {
        descriptor.set("license", vocab::id_ref(vocab::METADATA_LICENCE_ID));
    }
}

/// Seed the root author list from the repository's `metadata.json` creators
/// when the root has none yet. Keeps author inheritance and person garbage
/// collection meaningful on freshly bootstrapped crates.
fn ensure_root_authors(graph: &mut Graph, dir: &Path) -> Result<()> {
    if graph.root().is_some_and(|root| root.get("author").is_some()) {
        return Ok(());
    }
    let authors = metadata::extract_default_authors(&dir.join("metadata.json"))?;
    for author in &authors {
        let person_id = upsert(
            graph,
            &Observed::Person(PersonFacts {
                id: identity::person_id(author),
                name: author.name.clone(),
            }),
        );
        if let Some(root) = graph.root_mut() {
            root.append_to("author", vocab::id_ref(&person_id));
        }
    }
    Ok(())
}

/// Notebooks in the crate directory: `.ipynb` suffix, not hidden, not an
/// unnamed `Untitled` notebook. Sorted by name so runs are deterministic
/// regardless of directory-listing order.
fn discover_notebooks(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut notebooks = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(vocab::NOTEBOOK_EXTENSION)
            || name.starts_with('.')
            || name.starts_with(vocab::UNTITLED_PREFIX)
        {
            continue;
        }
        if entry.file_type()?.is_file() {
            notebooks.push(entry.path());
        }
    }
    notebooks.sort();
    Ok(notebooks)
}
