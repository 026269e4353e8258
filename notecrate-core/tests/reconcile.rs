//! End-to-end reconciliation tests: a crate directory with real notebooks and
//! data files, driven through `CrateSession::run`, checking the persisted
//! graph rather than in-memory state.

use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;

use notecrate_core::{CrateSession, Graph, SessionConfig};

fn write_notebook(dir: &Path, name: &str, rocrate: Value) {
    let notebook = json!({
        "cells": [],
        "metadata": { "rocrate": rocrate },
        "nbformat": 4,
        "nbformat_minor": 5,
    });
    std::fs::write(dir.join(name), serde_json::to_string_pretty(&notebook).unwrap()).unwrap();
}

fn run(dir: &Path) -> notecrate_core::RunSummary {
    let session = CrateSession::new(SessionConfig::new(dir)).unwrap();
    session.run().unwrap()
}

#[test]
fn fresh_run_builds_expected_graph() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/raw.csv"), "a,b\n1,2\n").unwrap();
    std::fs::write(dir.path().join("data/summary.csv"), "total\n3\n").unwrap();
    write_notebook(
        dir.path(),
        "analysis.ipynb",
        json!({
            "name": "Analysis",
            "description": "Sums the raw data.",
            "object": ["data/raw.csv"],
            "result": ["data/summary.csv"],
        }),
    );

    let summary = run(dir.path());
    assert_eq!(summary.notebooks_processed, 1);
    assert_eq!(summary.notebooks_failed, 0);

    let graph = Graph::load(dir.path()).unwrap();

    let raw = graph.get("data/raw.csv").unwrap();
    assert_eq!(raw.get("@type"), Some(&json!(["File", "Dataset"])));
    assert_eq!(raw.get("contentSize"), Some(&json!(8)));
    assert!(raw.get("dateModified").is_some());

    let nb = graph.get("analysis.ipynb").unwrap();
    assert_eq!(nb.get("name"), Some(&json!("Analysis")));
    assert_eq!(nb.get("description"), Some(&json!("Sums the raw data.")));
    assert_eq!(nb.get("@type"), Some(&json!(["File", "SoftwareSourceCode"])));

    let action = graph.get("analysis_run").unwrap();
    assert_eq!(action.get("@type"), Some(&json!("CreateAction")));
    assert_eq!(action.get("instrument"), Some(&json!({"@id": "analysis.ipynb"})));
    assert_eq!(action.get("object"), Some(&json!([{"@id": "data/raw.csv"}])));
    assert_eq!(action.get("result"), Some(&json!([{"@id": "data/summary.csv"}])));
    assert_eq!(
        action.get("endDate"),
        graph.get("data/summary.csv").unwrap().get("dateModified")
    );
}

#[test]
fn second_run_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("raw.csv"), "a,b\n").unwrap();
    write_notebook(
        dir.path(),
        "analysis.ipynb",
        json!({"object": ["raw.csv"]}),
    );

    run(dir.path());
    let first = std::fs::read_to_string(dir.path().join("ro-crate-metadata.json")).unwrap();

    run(dir.path());
    let second = std::fs::read_to_string(dir.path().join("ro-crate-metadata.json")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn curated_properties_survive_reruns() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("raw.csv"), "a,b\n").unwrap();
    write_notebook(dir.path(), "analysis.ipynb", json!({"object": ["raw.csv"]}));
    run(dir.path());

    // Hand-curate a property directly in the persisted document.
    let mut graph = Graph::load(dir.path()).unwrap();
    graph
        .get_mut("raw.csv")
        .unwrap()
        .set("description", json!("Survey responses, 2025 wave"));
    graph.write(dir.path()).unwrap();

    run(dir.path());

    let graph = Graph::load(dir.path()).unwrap();
    assert_eq!(
        graph.get("raw.csv").unwrap().get("description"),
        Some(&json!("Survey responses, 2025 wave"))
    );
}

#[test]
fn undeclared_and_deleted_file_is_collected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("old.csv"), "x\n").unwrap();
    write_notebook(dir.path(), "analysis.ipynb", json!({"object": ["old.csv"]}));
    run(dir.path());
    assert!(Graph::load(dir.path()).unwrap().get("old.csv").is_some());

    // The notebook stops declaring the file and it disappears from disk.
    write_notebook(dir.path(), "analysis.ipynb", json!({}));
    std::fs::remove_file(dir.path().join("old.csv")).unwrap();
    run(dir.path());

    let graph = Graph::load(dir.path()).unwrap();
    assert!(graph.get("old.csv").is_none());
    // The action persists as the historical record of the run.
    assert!(graph.get("analysis_run").is_some());
    assert!(graph.get("analysis.ipynb").is_some());
}

#[test]
fn shrinking_output_list_rebuilds_result_edges() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("one.csv"), "1\n").unwrap();
    std::fs::write(dir.path().join("two.csv"), "2\n").unwrap();
    write_notebook(
        dir.path(),
        "analysis.ipynb",
        json!({"result": ["one.csv", "two.csv"]}),
    );
    run(dir.path());

    write_notebook(dir.path(), "analysis.ipynb", json!({"result": ["one.csv"]}));
    run(dir.path());

    let graph = Graph::load(dir.path()).unwrap();
    let action = graph.get("analysis_run").unwrap();
    assert_eq!(action.get("result"), Some(&json!([{"@id": "one.csv"}])));
}

#[test]
fn version_bump_stamps_root_and_records_action() {
    let dir = TempDir::new().unwrap();
    write_notebook(dir.path(), "analysis.ipynb", json!({}));

    let mut config = SessionConfig::new(dir.path());
    config.version = Some("1.2.0".to_string());
    let session = CrateSession::new(config).unwrap();
    session.run().unwrap();

    let graph = Graph::load(dir.path()).unwrap();
    assert_eq!(graph.root().unwrap().get("version"), Some(&json!("1.2.0")));
    let action = graph.get("create_version_1_2_0").unwrap();
    assert_eq!(action.get("@type"), Some(&json!("UpdateAction")));
    assert_eq!(action.get("name"), Some(&json!("Create version 1.2.0")));

    // A plain reconciliation pass afterwards keeps the record.
    run(dir.path());
    let graph = Graph::load(dir.path()).unwrap();
    assert!(graph.get("create_version_1_2_0").is_some());
    assert_eq!(graph.root().unwrap().get("version"), Some(&json!("1.2.0")));
}

#[test]
fn authors_flow_from_creators_to_notebooks() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("metadata.json"),
        json!({"creators": [{"name": "Doe, John", "orcid": "0000-0002-1111-2222"}]}).to_string(),
    )
    .unwrap();
    write_notebook(dir.path(), "plain.ipynb", json!({}));
    write_notebook(
        dir.path(),
        "authored.ipynb",
        json!({"author": [{"name": "Smith, Jane"}]}),
    );

    run(dir.path());

    let graph = Graph::load(dir.path()).unwrap();
    // The undeclared notebook inherits the root author list.
    assert_eq!(
        graph.get("plain.ipynb").unwrap().get("author"),
        Some(&json!([{"@id": "https://orcid.org/0000-0002-1111-2222"}]))
    );
    // The declared author gets a person node and a direct edge.
    assert_eq!(
        graph.get("authored.ipynb").unwrap().get("author"),
        Some(&json!([{"@id": "#Smith_Jane"}]))
    );
    assert!(graph.get("#Smith_Jane").is_some());
    assert!(graph.get("https://orcid.org/0000-0002-1111-2222").is_some());
}
