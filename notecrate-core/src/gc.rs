//! Garbage collection: removal of file and person nodes no longer referenced
//! by the reconciled graph.
//!
//! Runs once, after every notebook has been processed, over the fully updated
//! graph. Two independent passes: orphan files, then orphan persons.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::graph::Graph;
use crate::vocab;

/// Run both passes.
pub fn collect_garbage(graph: &mut Graph, dir: &Path) {
    remove_deleted_files(graph, dir);
    remove_unreferenced_persons(graph);
}

/// Collect the `@id` strings referenced by a property value (scalar ref or
/// list of refs).
fn referenced_ids(value: Option<&Value>, into: &mut HashSet<String>) {
    match value {
        Some(Value::Array(entries)) => {
            for entry in entries {
                if let Some(id) = entry.get("@id").and_then(Value::as_str) {
                    into.insert(id.to_string());
                }
            }
        }
        Some(entry) => {
            if let Some(id) = entry.get("@id").and_then(Value::as_str) {
                into.insert(id.to_string());
            }
        }
        None => {}
    }
}

/// Delete file nodes that are gone from disk (non-URLs) or that no action
/// references any more. Notebook files are exempt from the reference check:
/// notebooks drive the scan and are not candidates for removal here.
fn remove_deleted_files(graph: &mut Graph, dir: &Path) {
    let mut referenced = HashSet::new();
    for action_id in graph.ids_of_type("CreateAction") {
        if let Some(action) = graph.get(&action_id) {
            referenced_ids(action.get("object"), &mut referenced);
            referenced_ids(action.get("result"), &mut referenced);
        }
    }

    for file_id in graph.ids_of_type("File") {
        let is_url = file_id.starts_with("http");
        if !is_url && !dir.join(&file_id).exists() {
            tracing::debug!("removing file node {}: gone from disk", file_id);
            graph.delete(&file_id);
        }
        if !referenced.contains(&file_id) && !file_id.ends_with(vocab::NOTEBOOK_EXTENSION) {
            tracing::debug!("removing file node {}: unreferenced", file_id);
            graph.delete(&file_id);
        }
    }
}

/// Delete person nodes not referenced by the crate root's author list or the
/// author list of any File-typed node.
///
/// Notebooks carry the File type, so their author lists are covered by the
/// same query; there is no separate notebook pass. Observed behavior, kept
/// as is.
fn remove_unreferenced_persons(graph: &mut Graph) {
    let mut authors = HashSet::new();
    referenced_ids(graph.root().and_then(|root| root.get("author")), &mut authors);
    for file_id in graph.ids_of_type("File") {
        if let Some(file) = graph.get(&file_id) {
            referenced_ids(file.get("author"), &mut authors);
        }
    }

    for person_id in graph.ids_of_type("Person") {
        if !authors.contains(&person_id) {
            tracing::debug!("removing person node {}: not an author", person_id);
            graph.delete(&person_id);
        }
    }
}
