//! Fixed JSON-LD vocabulary used throughout the crate graph.
//!
//! Licence and language descriptors mirror what the published crates carry;
//! they are added idempotently on every run.

use serde_json::{Value, json};

/// File extension that marks a notebook. Notebooks drive the scan and are
/// exempt from garbage collection.
pub const NOTEBOOK_EXTENSION: &str = ".ipynb";

/// Notebook files created by Jupyter's "new notebook" button before being
/// named; never scanned.
pub const UNTITLED_PREFIX: &str = "Untitled";

/// Canonical base URL for ORCID identifiers.
pub const ORCID_BASE_URL: &str = "https://orcid.org/";

/// Sentinel ORCID used when a repository declares no creators at all.
pub const SENTINEL_ORCID: &str = "https://orcid.org/0000-0000-0000-0000";

/// Name of the on-disk metadata document, rewritten wholesale each run.
pub const METADATA_FILE_NAME: &str = "ro-crate-metadata.json";

/// JSON-LD context for the crate document.
pub const CRATE_CONTEXT: &str = "https://w3id.org/ro/crate/1.1/context";

/// Specification the metadata descriptor conforms to.
pub const CRATE_CONFORMS_TO: &str = "https://w3id.org/ro/crate/1.1";

/// Profile identifying notebook entities.
pub const NOTEBOOK_PROFILE: &str = "https://purl.archive.org/textcommons/profile#Notebook";

/// MIME type recorded for notebook files.
pub const NOTEBOOK_ENCODING_FORMAT: &str = "application/x-ipynb+json";

/// Status recorded on every provenance action.
pub const COMPLETED_ACTION_STATUS: &str = "http://schema.org/CompletedActionStatus";

/// Identifier of the programming-language descriptor attached to notebooks.
pub const PYTHON_ID: &str = "https://www.python.org/downloads/release/python-31012/";

/// Identifier of the default licence attached to the crate root.
pub const DEFAULT_LICENCE_ID: &str = "https://spdx.org/licenses/MIT";

/// Identifier of the licence attached to the metadata document itself.
pub const METADATA_LICENCE_ID: &str = "https://creativecommons.org/publicdomain/zero/1.0/";

/// Licence entity attached to the crate root.
pub fn default_licence() -> Value {
    json!({
        "@id": DEFAULT_LICENCE_ID,
        "@type": "CreativeWork",
        "name": "MIT License",
        "url": "https://spdx.org/licenses/MIT.html",
    })
}

/// Licence entity attached to the metadata descriptor.
pub fn metadata_licence() -> Value {
    json!({
        "@id": METADATA_LICENCE_ID,
        "@type": "CreativeWork",
        "name": "CC0 Public Domain Dedication",
        "url": "https://creativecommons.org/publicdomain/zero/1.0/",
    })
}

/// Programming-language descriptor referenced by notebook entities.
pub fn python_language() -> Value {
    json!({
        "@id": PYTHON_ID,
        "@type": ["ComputerLanguage", "SoftwareApplication"],
        "name": "Python 3.10.12",
        "version": "3.10.12",
        "url": PYTHON_ID,
    })
}

/// Wrap a reference string as a JSON-LD id object: `{"@id": "..."}`.
///
/// Single references must stay single objects, not one-element lists; see the
/// RO-Crate JSON-LD appendix.
pub fn id_ref(id: &str) -> Value {
    json!({ "@id": id })
}

/// Wrap a list of reference strings as a list of JSON-LD id objects.
pub fn id_refs<I, S>(ids: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Value::Array(ids.into_iter().map(|id| id_ref(id.as_ref())).collect())
}
