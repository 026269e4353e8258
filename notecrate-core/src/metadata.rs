//! Extraction of embedded metadata from notebooks and the repository's
//! top-level metadata file.
//!
//! Notebooks are JSON documents; only the `metadata.rocrate` block is read.
//! A notebook without that block is a per-notebook extraction failure, not a
//! silently empty result.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CrateError, Result};
use crate::vocab;

/// Author information as declared in notebook metadata or the repository's
/// `creators` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    /// Expected as `"Surname, Givenname"`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

/// Metadata embedded in a notebook's `metadata.rocrate` block, with defaults
/// applied for absent keys.
#[derive(Debug, Clone, PartialEq)]
pub struct NotebookMetadata {
    /// Defaults to the notebook's file name.
    pub name: String,
    pub description: String,
    pub author: Vec<AuthorInfo>,
    /// Declared input file references (paths or URLs).
    pub object: Vec<String>,
    /// Declared output file references (paths or URLs).
    pub result: Vec<String>,
}

fn extraction_error(path: &Path, message: impl Into<String>) -> CrateError {
    CrateError::NotebookExtraction {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Coerce a scalar-or-list value to a list. List-valued metadata keys accept
/// a bare scalar as shorthand for a single-element list.
fn listify(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        scalar => vec![scalar.clone()],
    }
}

fn string_list(path: &Path, key: &str, value: Option<&Value>) -> Result<Vec<String>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    listify(value)
        .into_iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| extraction_error(path, format!("'{key}' entries must be strings")))
        })
        .collect()
}

/// Extract the `metadata.rocrate` block from a notebook.
///
/// Absent keys fall back to defaults: `name` = file name, `description`
/// empty, `author`/`object`/`result` empty lists. Scalars supplied for the
/// list-valued keys are coerced to single-element lists. A missing or
/// malformed block aborts processing of this notebook.
pub fn extract_notebook_metadata(path: &Path) -> Result<NotebookMetadata> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| extraction_error(path, e.to_string()))?;
    let notebook: Value =
        serde_json::from_str(&raw).map_err(|e| extraction_error(path, e.to_string()))?;
    let block = notebook
        .get("metadata")
        .and_then(|m| m.get("rocrate"))
        .ok_or_else(|| extraction_error(path, "no rocrate block in notebook metadata"))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = block
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(file_name);
    let description = block
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();

    let author = match block.get("author") {
        None => Vec::new(),
        Some(value) => listify(value)
            .into_iter()
            .map(|item| {
                serde_json::from_value::<AuthorInfo>(item)
                    .map_err(|e| extraction_error(path, format!("bad author entry: {e}")))
            })
            .collect::<Result<Vec<_>>>()?,
    };
    let object = string_list(path, "object", block.get("object"))?;
    let result = string_list(path, "result", block.get("result"))?;

    Ok(NotebookMetadata {
        name,
        description,
        author,
        object,
        result,
    })
}

/// Read the repository's default author list from its top-level metadata
/// file (`creators` key). A missing file or absent key yields one placeholder
/// author with the sentinel ORCID.
pub fn extract_default_authors(metadata_file: &Path) -> Result<Vec<AuthorInfo>> {
    let sentinel = vec![AuthorInfo {
        name: "Unknown".to_string(),
        orcid: Some(vocab::SENTINEL_ORCID.to_string()),
    }];
    if !metadata_file.exists() {
        return Ok(sentinel);
    }
    let raw = std::fs::read_to_string(metadata_file)?;
    let document: Value = serde_json::from_str(&raw)?;
    match document.get("creators") {
        Some(creators) => Ok(serde_json::from_value(creators.clone())?),
        None => Ok(sentinel),
    }
}
