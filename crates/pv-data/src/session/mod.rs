//! Per-file session state
//!
//! A [`Session`] is an immutable snapshot of everything known about one
//! loaded file. Query results produce a new snapshot instead of mutating the
//! current one, so readers never see a schema from one execution paired with
//! rows from another.

pub mod controller;
pub mod store;

pub use controller::{LoadOutcome, QueryOutcome, SessionController};
pub use store::{QueryTicket, SessionStore};

use std::sync::Arc;

use pv_core::{FileHandle, MetadataRow, ResultSet, Schema, SessionId};
use tracing::{info, warn};

use crate::engine::QueryEngine;
use crate::metadata::MetadataProbe;
use crate::query::QueryRunner;
use crate::schema::SchemaProbe;
use crate::sources::Source;
use crate::DataError;

/// Everything the viewer shows for one loaded file
#[derive(Clone)]
pub struct Session {
    id: SessionId,
    handle: FileHandle,
    file_schema: Schema,
    metadata: Vec<MetadataRow>,
    result: ResultSet,
    last_statement: String,
    last_error: Option<String>,
    engine: Arc<QueryEngine>,
}

impl Session {
    /// Load a file into a fresh engine and run the default query
    ///
    /// Registration and probe failures abort the load. A failing default
    /// query does not: the session is returned with an empty result and the
    /// error attached.
    pub async fn open(id: SessionId, handle: FileHandle, runner: &QueryRunner) -> Result<Self, DataError> {
        let source = Source::open(handle.clone());
        let engine = QueryEngine::new();
        source.as_relation().register(&engine).await?;

        let (file_schema, metadata) = tokio::try_join!(
            SchemaProbe::describe_relation(&source, &engine),
            MetadataProbe::describe(&source),
        )?;

        let statement = runner.default_query().to_string();
        let (result, last_error) = match runner.run(&statement, &engine).await {
            Ok(result) => (result, None),
            Err(e) => {
                warn!("Default query failed for {}: {}", handle.file_name(), e);
                (ResultSet::empty(), Some(e.to_string()))
            }
        };

        info!(
            "Opened session {} for {} ({} columns, {} metadata rows)",
            id,
            handle.file_name(),
            file_schema.len(),
            metadata.len()
        );

        Ok(Self {
            id,
            handle,
            file_schema,
            metadata,
            result,
            last_statement: statement,
            last_error,
            engine: Arc::new(engine),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn handle(&self) -> &FileHandle {
        &self.handle
    }

    /// Static schema of the whole file
    pub fn file_schema(&self) -> &Schema {
        &self.file_schema
    }

    pub fn metadata(&self) -> &[MetadataRow] {
        &self.metadata
    }

    /// Result of the last successful statement
    pub fn result(&self) -> &ResultSet {
        &self.result
    }

    pub fn last_statement(&self) -> &str {
        &self.last_statement
    }

    /// Error of the last statement, if it failed
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn engine(&self) -> &Arc<QueryEngine> {
        &self.engine
    }

    /// Snapshot with `result` replacing the current result
    pub fn with_result(&self, statement: &str, result: ResultSet) -> Self {
        Self {
            result,
            last_statement: statement.to_string(),
            last_error: None,
            ..self.clone()
        }
    }

    /// Snapshot recording a failed statement; the previous result is kept
    pub fn with_error(&self, statement: &str, error: &DataError) -> Self {
        Self {
            last_statement: statement.to_string(),
            last_error: Some(error.to_string()),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("file", &self.handle.file_name())
            .field("columns", &self.file_schema.len())
            .field("rows", &self.result.row_count())
            .field("last_error", &self.last_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pv_core::{SessionId, ViewerConfig};
    use pv_core::state::SessionIdAllocator;

    fn first_id() -> SessionId {
        SessionIdAllocator::new().next()
    }

    #[tokio::test]
    async fn test_open_runs_default_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_parquet(dir.path(), "sample.parquet", 80);
        let runner = QueryRunner::new(&ViewerConfig::default()).unwrap();

        let session = Session::open(first_id(), FileHandle::load(&path).unwrap(), &runner)
            .await
            .unwrap();

        assert_eq!(session.file_schema().len(), 4);
        assert_eq!(session.result().row_count(), 50);
        assert_eq!(session.last_statement(), "SELECT * FROM tbl LIMIT 50");
        assert!(session.last_error().is_none());
        assert!(!session.metadata().is_empty());
    }

    #[tokio::test]
    async fn test_open_ipc_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_ipc(dir.path(), "sample.ipc", 12, 5);
        let runner = QueryRunner::new(&ViewerConfig::default()).unwrap();

        let session = Session::open(first_id(), FileHandle::load(&path).unwrap(), &runner)
            .await
            .unwrap();

        assert_eq!(session.result().row_count(), 12);
        assert_eq!(session.file_schema().names().collect::<Vec<_>>(), vec!["id", "name", "score", "active"]);
    }

    #[tokio::test]
    async fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.parquet");
        std::fs::write(&path, b"definitely not parquet").unwrap();
        let runner = QueryRunner::new(&ViewerConfig::default()).unwrap();

        let err = Session::open(first_id(), FileHandle::load(&path).unwrap(), &runner)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::FileRead(_)));
    }

    #[tokio::test]
    async fn test_with_error_keeps_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_parquet(dir.path(), "sample.parquet", 5);
        let runner = QueryRunner::new(&ViewerConfig::default()).unwrap();
        let session = Session::open(first_id(), FileHandle::load(&path).unwrap(), &runner)
            .await
            .unwrap();

        let failed = session.with_error("SELEC nonsense", &DataError::QuerySyntax("bad".to_string()));
        assert_eq!(failed.result(), session.result());
        assert_eq!(failed.last_error(), Some("bad"));
        assert_eq!(failed.last_statement(), "SELEC nonsense");

        let cleared = failed.with_result("CREATE VIEW v AS SELECT 1", ResultSet::empty());
        assert!(cleared.result().is_empty());
        assert!(cleared.last_error().is_none());
    }
}
