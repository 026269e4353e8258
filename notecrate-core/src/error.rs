//! Error types for the notecrate core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering graph I/O, notebook metadata extraction, and remote lookups.

use std::path::PathBuf;

/// Top-level error type for the notecrate core library.
#[derive(Debug, thiserror::Error)]
pub enum CrateError {
    /// The graph document could not be loaded or written. Fatal: the run
    /// aborts with no partial write.
    #[error("graph store error at {path}: {message}")]
    GraphIo { path: PathBuf, message: String },

    /// The embedded metadata block of a notebook is missing or malformed.
    /// Aborts processing of that notebook only.
    #[error("failed to extract metadata from {path}: {message}")]
    NotebookExtraction { path: PathBuf, message: String },

    /// A local file stat was requested for a path that does not exist.
    /// Callers are expected to check existence before asking for stats.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Transport-level HTTP failure during a remote stat lookup. Malformed
    /// or empty API responses are not errors; they degrade to `None` fields.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A type alias for results using the top-level `CrateError`.
pub type Result<T> = std::result::Result<T, CrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_graph_io() {
        let err = CrateError::GraphIo {
            path: PathBuf::from("/data/crate"),
            message: "expected a JSON object".into(),
        };
        assert_eq!(
            err.to_string(),
            "graph store error at /data/crate: expected a JSON object"
        );
    }

    #[test]
    fn test_error_display_extraction() {
        let err = CrateError::NotebookExtraction {
            path: PathBuf::from("analysis.ipynb"),
            message: "no rocrate metadata block".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to extract metadata from analysis.ipynb: no rocrate metadata block"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CrateError = io_err.into();
        assert!(matches!(err, CrateError::Io(_)));
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: CrateError = serde_err.into();
        assert!(matches!(err, CrateError::Serialization(_)));
    }
}
