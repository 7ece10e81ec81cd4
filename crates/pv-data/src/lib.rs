//! Query and introspection layer for loaded columnar files
//!
//! A loaded file gets its own [`QueryEngine`] and [`Session`]. Schemas and
//! metadata are probed once per load; user statements go through the
//! [`QueryRunner`], which binds the placeholder relation, bounds the preview
//! and turns engine batches into display rows.

pub mod engine;
pub mod metadata;
pub mod query;
pub mod schema;
pub mod session;
pub mod sources;

use pv_core::{CoreError, SessionId};
use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use engine::QueryEngine;
pub use metadata::MetadataProbe;
pub use query::{QueryRunner, StatementKind};
pub use schema::SchemaProbe;
pub use session::{LoadOutcome, QueryOutcome, Session, SessionController, SessionStore};
pub use sources::{IpcSource, ParquetSource, RelationSource, Source};

/// Errors that can occur while loading or querying a file
#[derive(Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to read file: {0}")]
    FileRead(String),

    #[error("{0}")]
    QuerySyntax(String),

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    #[error("No file is loaded")]
    NoSession,

    #[error("A query is already running for session {0}")]
    QueryInFlight(SessionId),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Invalid placeholder pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl DataError {
    /// Whether this error came from the user's statement rather than the file
    pub fn is_query_error(&self) -> bool {
        matches!(self, DataError::QuerySyntax(_) | DataError::QueryExecution(_))
    }
}
