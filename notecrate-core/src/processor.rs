//! Per-notebook reconciliation: metadata extraction, file and notebook
//! upserts, provenance action synthesis, and author attachment.

use std::path::Path;

use serde_json::Value;

use crate::entity::{
    ActionFacts, FileFacts, NotebookFacts, Observed, PersonFacts, upsert,
};
use crate::error::Result;
use crate::graph::Graph;
use crate::identity;
use crate::metadata::{self, AuthorInfo};
use crate::stats::StatProvider;
use crate::vocab;

/// Orchestrates the reconciliation of a single notebook into the graph.
pub struct NotebookProcessor<'a> {
    stats: &'a StatProvider,
    /// Crate directory; local references resolve against it while keeping
    /// their literal spelling as entity ids.
    dir: &'a Path,
}

impl<'a> NotebookProcessor<'a> {
    pub fn new(stats: &'a StatProvider, dir: &'a Path) -> Self {
        Self { stats, dir }
    }

    /// Process one notebook, in order: extract metadata, upsert its declared
    /// input/output files, upsert the notebook itself, rebuild the linking
    /// action, attach authors.
    pub fn process(&self, graph: &mut Graph, notebook: &Path) -> Result<()> {
        let notebook_id = notebook
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!("processing notebook {}", notebook_id);

        let meta = metadata::extract_notebook_metadata(notebook)?;

        let input_ids = self.add_files(graph, &meta.object)?;
        let output_ids = self.add_files(graph, &meta.result)?;

        // codeRepository comes from the crate root, on first creation only.
        let code_repository = if graph.get(&notebook_id).is_some() {
            None
        } else {
            graph
                .root()
                .and_then(|root| root.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        upsert(
            graph,
            &Observed::Notebook(NotebookFacts {
                id: notebook_id.clone(),
                name: meta.name,
                description: meta.description,
                code_repository,
            }),
        );

        let end_date = self.action_end_date(graph, &output_ids, notebook)?;
        let action_id = upsert(
            graph,
            &Observed::Action(ActionFacts {
                id: identity::action_id(&notebook_id),
                notebook_id: notebook_id.clone(),
                end_date,
            }),
        );

        // The merge above cleared both edge lists; rebuild them from this
        // scan. Every referenced file already exists as a node.
        if let Some(action) = graph.get_mut(&action_id) {
            for input in &input_ids {
                action.append_to("object", vocab::id_ref(input));
            }
            for output in &output_ids {
                action.append_to("result", vocab::id_ref(output));
            }
        }

        self.attach_authors(graph, &notebook_id, &meta.author);
        Ok(())
    }

    /// Upsert a file node for each declared reference that exists locally or
    /// looks like a URL. References that fail both checks are skipped, not
    /// errors.
    fn add_files(&self, graph: &mut Graph, references: &[String]) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for reference in references {
            let remote = reference.starts_with("http");
            if !remote && !self.dir.join(reference).exists() {
                tracing::debug!("skipping missing file reference {}", reference);
                continue;
            }
            let stats = self.stats.get_file_stats(self.dir, reference)?;
            ids.push(upsert(
                graph,
                &Observed::File(FileFacts {
                    id: reference.clone(),
                    stats,
                    remote,
                }),
            ));
        }
        Ok(ids)
    }

    /// The action's end date: the latest `dateModified` among the run's
    /// output files, or the notebook's own modification date when the
    /// sequence is empty.
    fn action_end_date(
        &self,
        graph: &Graph,
        output_ids: &[String],
        notebook: &Path,
    ) -> Result<Option<String>> {
        let latest = output_ids
            .iter()
            .filter_map(|id| graph.get(id))
            .filter_map(|node| node.get("dateModified"))
            .filter_map(Value::as_str)
            .max()
            .map(str::to_string);
        if latest.is_some() {
            return Ok(latest);
        }
        let stats = self.stats.get_file_stats(
            self.dir,
            &notebook
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )?;
        Ok(stats.date)
    }

    /// Attach authors to the notebook: declared authors become person nodes
    /// and are appended set-like to the notebook's author list; with none
    /// declared, the crate root's author list is inherited unchanged.
    fn attach_authors(&self, graph: &mut Graph, notebook_id: &str, authors: &[AuthorInfo]) {
        if authors.is_empty() {
            let inherited = graph
                .root()
                .and_then(|root| root.get("author"))
                .cloned();
            if let (Some(value), Some(node)) = (inherited, graph.get_mut(notebook_id)) {
                node.append_to("author", value);
            }
            return;
        }

        for author in authors {
            let person_id = upsert(
                graph,
                &Observed::Person(PersonFacts {
                    id: identity::person_id(author),
                    name: author.name.clone(),
                }),
            );
            if let Some(node) = graph.get_mut(notebook_id) {
                let already_listed = node
                    .get("author")
                    .and_then(Value::as_array)
                    .is_some_and(|list| {
                        list.iter()
                            .any(|entry| entry.get("@id").and_then(Value::as_str)
                                == Some(person_id.as_str()))
                    });
                if !already_listed {
                    node.append_to("author", vocab::id_ref(&person_id));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_notebook(dir: &Path, name: &str, rocrate: Value) -> std::path::PathBuf {
        let path = dir.join(name);
        let notebook = json!({
            "cells": [],
            "metadata": { "rocrate": rocrate },
            "nbformat": 4,
            "nbformat_minor": 5,
        });
        std::fs::write(&path, serde_json::to_string(&notebook).unwrap()).unwrap();
        path
    }

    fn setup() -> (TempDir, Graph, StatProvider) {
        let dir = TempDir::new().unwrap();
        let graph = Graph::load(dir.path()).unwrap();
        let stats = StatProvider::new().unwrap();
        (dir, graph, stats)
    }

    #[test]
    fn test_process_links_inputs_and_outputs() {
        let (dir, mut graph, stats) = setup();
        std::fs::write(dir.path().join("raw.csv"), "a,b\n").unwrap();
        std::fs::write(dir.path().join("summary.csv"), "c,d\n").unwrap();
        let nb = write_notebook(
            dir.path(),
            "analysis.ipynb",
            json!({"object": ["raw.csv"], "result": ["summary.csv"]}),
        );

        let processor = NotebookProcessor::new(&stats, dir.path());
        processor.process(&mut graph, &nb).unwrap();

        assert!(graph.get("raw.csv").is_some());
        assert!(graph.get("summary.csv").is_some());
        assert!(graph.get("analysis.ipynb").is_some());

        let action = graph.get("analysis_run").unwrap();
        assert_eq!(action.get("object"), Some(&json!([{"@id": "raw.csv"}])));
        assert_eq!(action.get("result"), Some(&json!([{"@id": "summary.csv"}])));
        assert_eq!(
            action.get("endDate"),
            graph.get("summary.csv").unwrap().get("dateModified")
        );
    }

    #[test]
    fn test_missing_references_skipped() {
        let (dir, mut graph, stats) = setup();
        let nb = write_notebook(
            dir.path(),
            "analysis.ipynb",
            json!({"object": ["nowhere.csv"]}),
        );

        let processor = NotebookProcessor::new(&stats, dir.path());
        processor.process(&mut graph, &nb).unwrap();

        assert!(graph.get("nowhere.csv").is_none());
        let action = graph.get("analysis_run").unwrap();
        assert_eq!(action.get("object"), Some(&json!([])));
        // Fallback: the notebook's own modification date.
        assert!(action.get("endDate").is_some());
    }

    #[test]
    fn test_edge_lists_rebuilt_on_rerun() {
        let (dir, mut graph, stats) = setup();
        std::fs::write(dir.path().join("one.csv"), "1").unwrap();
        std::fs::write(dir.path().join("two.csv"), "2").unwrap();
        let nb = write_notebook(
            dir.path(),
            "analysis.ipynb",
            json!({"result": ["one.csv", "two.csv"]}),
        );
        let processor = NotebookProcessor::new(&stats, dir.path());
        processor.process(&mut graph, &nb).unwrap();

        // The output list shrinks to one file on the next run.
        let nb = write_notebook(dir.path(), "analysis.ipynb", json!({"result": ["one.csv"]}));
        processor.process(&mut graph, &nb).unwrap();

        let action = graph.get("analysis_run").unwrap();
        assert_eq!(action.get("result"), Some(&json!([{"@id": "one.csv"}])));
    }

    #[test]
    fn test_declared_authors_attached_without_duplicates() {
        let (dir, mut graph, stats) = setup();
        let nb = write_notebook(
            dir.path(),
            "analysis.ipynb",
            json!({"author": [
                {"name": "Smith, Jane", "orcid": "0000-0001-2345-6789"},
                {"name": "Smith, Jane", "orcid": "0000-0001-2345-6789"},
            ]}),
        );
        let processor = NotebookProcessor::new(&stats, dir.path());
        processor.process(&mut graph, &nb).unwrap();

        let node = graph.get("analysis.ipynb").unwrap();
        assert_eq!(
            node.get("author"),
            Some(&json!([{"@id": "https://orcid.org/0000-0001-2345-6789"}]))
        );
        assert!(graph.get("https://orcid.org/0000-0001-2345-6789").is_some());
    }

    #[test]
    fn test_root_authors_inherited_when_none_declared() {
        let (dir, mut graph, stats) = setup();
        graph
            .root_mut()
            .unwrap()
            .set("author", json!([{"@id": "#Root_Author"}]));
        let nb = write_notebook(dir.path(), "analysis.ipynb", json!({}));

        let processor = NotebookProcessor::new(&stats, dir.path());
        processor.process(&mut graph, &nb).unwrap();

        let node = graph.get("analysis.ipynb").unwrap();
        assert_eq!(node.get("author"), Some(&json!([{"@id": "#Root_Author"}])));
    }

    #[test]
    fn test_code_repository_set_on_creation_only() {
        let (dir, mut graph, stats) = setup();
        graph
            .root_mut()
            .unwrap()
            .set("url", json!("https://example.com/repo"));
        let nb = write_notebook(dir.path(), "analysis.ipynb", json!({}));

        let processor = NotebookProcessor::new(&stats, dir.path());
        processor.process(&mut graph, &nb).unwrap();
        assert_eq!(
            graph.get("analysis.ipynb").unwrap().get("codeRepository"),
            Some(&json!("https://example.com/repo"))
        );

        // The root URL changes; an existing notebook keeps its original.
        graph
            .root_mut()
            .unwrap()
            .set("url", json!("https://example.com/moved"));
        processor.process(&mut graph, &nb).unwrap();
        assert_eq!(
            graph.get("analysis.ipynb").unwrap().get("codeRepository"),
            Some(&json!("https://example.com/repo"))
        );
    }

    #[test]
    fn test_unreadable_notebook_propagates_error() {
        let (dir, mut graph, stats) = setup();
        let path = dir.path().join("broken.ipynb");
        std::fs::write(&path, "{ nope").unwrap();

        let processor = NotebookProcessor::new(&stats, dir.path());
        assert!(processor.process(&mut graph, &path).is_err());
    }

    #[test]
    fn test_literal_reference_spelling_is_identity() {
        let (dir, mut graph, stats) = setup();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/x.csv"), "x").unwrap();
        let nb = write_notebook(
            dir.path(),
            "analysis.ipynb",
            json!({"object": ["data/x.csv", "./data/x.csv"]}),
        );

        let processor = NotebookProcessor::new(&stats, dir.path());
        processor.process(&mut graph, &nb).unwrap();

        // No normalization: both spellings are distinct nodes.
        assert!(graph.get("data/x.csv").is_some());
        assert!(graph.get("./data/x.csv").is_some());
    }
}
