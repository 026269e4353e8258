//! # notecrate core
//!
//! Reconciliation engine for an RO-Crate metadata graph describing a notebook
//! collection: identity resolution, get-or-create-then-merge upserts,
//! provenance actions linking notebooks to the files they read and produce,
//! and garbage collection of unreferenced file and person nodes.

pub mod entity;
pub mod error;
pub mod gc;
pub mod graph;
pub mod identity;
pub mod metadata;
pub mod processor;
pub mod session;
pub mod stats;
pub mod vocab;

// Re-export commonly used types at the crate root.
pub use entity::{ActionFacts, FileFacts, NotebookFacts, Observed, PersonFacts, upsert};
pub use error::{CrateError, Result};
pub use graph::{Graph, Node};
pub use metadata::{AuthorInfo, NotebookMetadata};
pub use processor::NotebookProcessor;
pub use session::{CrateSession, RunSummary, SessionConfig};
pub use stats::{FileStats, StatProvider};
