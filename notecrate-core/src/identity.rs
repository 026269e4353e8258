//! Entity identity resolution.
//!
//! Pure functions computing stable identifiers for persons and actions.
//! File identity is the literal path or URL string as declared in notebook
//! metadata; no normalization is performed, so differently-spelled references
//! to the same physical file are distinct entities. That limitation is
//! deliberate: normalizing would silently change the shape of existing crates.

use crate::metadata::AuthorInfo;
use crate::vocab;

/// Stable identifier for a person.
///
/// An ORCID becomes the id (prefixed with the canonical base URL when given
/// bare); without one the id is derived from the name, `"Surname, Given"`
/// becoming `"#Surname_Given"`.
pub fn person_id(author: &AuthorInfo) -> String {
    match author.orcid.as_deref() {
        None | Some("") => format!("#{}", author.name.replace(", ", "_")),
        Some(orcid) if !orcid.starts_with("http") => {
            format!("{}{}", vocab::ORCID_BASE_URL, orcid)
        }
        Some(orcid) => orcid.to_string(),
    }
}

/// Identifier of the provenance action recording a notebook's run: the
/// notebook id without its extension, suffixed with `_run`.
pub fn action_id(notebook_id: &str) -> String {
    let stem = notebook_id
        .strip_suffix(vocab::NOTEBOOK_EXTENSION)
        .unwrap_or(notebook_id);
    format!("{stem}_run")
}

/// Identifier of the one-off provenance record for a version bump. Dots in
/// the version are flattened to underscores.
pub fn update_action_id(version: &str) -> String {
    format!("create_version_{}", version.replace('.', "_"))
}
