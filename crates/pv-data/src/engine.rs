//! Embedded query engine, one instance per session

use std::fmt;

use arrow::record_batch::RecordBatch;
use datafusion::datasource::file_format::options::{ArrowReadOptions, ParquetReadOptions};
use datafusion::prelude::{DataFrame, SessionContext};
use pv_core::FileHandle;
use tracing::debug;
use url::Url;

use crate::DataError;

/// Name the loaded file is registered under inside the engine
pub const RELATION_TABLE: &str = "loaded_file";

/// Wraps a DataFusion context bound to exactly one file
///
/// A new engine is created for every file load, so views or tables a user
/// creates never leak into the next file's session.
pub struct QueryEngine {
    ctx: SessionContext,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
        }
    }

    /// Parenthesized expression that reads the bound relation
    pub fn relation_expression() -> String {
        format!("(SELECT * FROM {})", quote_identifier(RELATION_TABLE))
    }

    /// Register a Parquet file as the bound relation
    pub async fn register_parquet(&self, handle: &FileHandle) -> Result<(), DataError> {
        let url = table_url(handle).await?;
        let extension = format!(".{}", handle.extension());
        let options = ParquetReadOptions {
            file_extension: &extension,
            ..Default::default()
        };

        self.ctx
            .register_parquet(RELATION_TABLE, url.as_str(), options)
            .await
            .map_err(|e| DataError::FileRead(format!("{}: {}", handle.file_name(), e)))?;
        self.ensure_columns(handle).await?;

        debug!("Registered parquet relation {:?}", handle.path());
        Ok(())
    }

    /// Register an Arrow IPC file as the bound relation
    pub async fn register_ipc(&self, handle: &FileHandle) -> Result<(), DataError> {
        let url = table_url(handle).await?;
        let extension = format!(".{}", handle.extension());
        let options = ArrowReadOptions {
            file_extension: &extension,
            ..Default::default()
        };

        self.ctx
            .register_arrow(RELATION_TABLE, url.as_str(), options)
            .await
            .map_err(|e| DataError::FileRead(format!("{}: {}", handle.file_name(), e)))?;
        self.ensure_columns(handle).await?;

        debug!("Registered arrow relation {:?}", handle.path());
        Ok(())
    }

    /// A registration that resolved to no columns read nothing from the file
    async fn ensure_columns(&self, handle: &FileHandle) -> Result<(), DataError> {
        let frame = self
            .ctx
            .table(RELATION_TABLE)
            .await
            .map_err(|e| DataError::FileRead(format!("{}: {}", handle.file_name(), e)))?;
        if frame.schema().fields().is_empty() {
            return Err(DataError::FileRead(format!("{}: no columns found", handle.file_name())));
        }
        Ok(())
    }

    /// Plan a statement without running it
    ///
    /// DDL statements are applied by the engine at this point.
    pub async fn plan(&self, statement: &str) -> Result<DataFrame, DataError> {
        self.ctx
            .sql(statement)
            .await
            .map_err(|e| DataError::QuerySyntax(e.to_string()))
    }

    /// Run a planned statement to completion
    pub async fn collect(&self, frame: DataFrame) -> Result<Vec<RecordBatch>, DataError> {
        frame
            .collect()
            .await
            .map_err(|e| DataError::QueryExecution(e.to_string()))
    }

    /// Plan and run a statement for its side effects
    pub async fn execute(&self, statement: &str) -> Result<(), DataError> {
        let frame = self.plan(statement).await?;
        self.collect(frame).await?;
        Ok(())
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("session_id", &self.ctx.session_id())
            .finish()
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// File URL for the handle; the file must exist
///
/// A bare path would be split on glob characters such as `[` or `*`, so the
/// engine is always given a `file://` URL.
async fn table_url(handle: &FileHandle) -> Result<Url, DataError> {
    let read_error = |e: std::io::Error| DataError::FileRead(format!("{}: {}", handle.path().display(), e));

    let metadata = tokio::fs::metadata(handle.path()).await.map_err(read_error)?;
    if !metadata.is_file() {
        return Err(DataError::FileRead(format!(
            "{} is not a regular file",
            handle.path().display()
        )));
    }

    let absolute = tokio::fs::canonicalize(handle.path()).await.map_err(read_error)?;
    Url::from_file_path(&absolute)
        .map_err(|_| DataError::FileRead(format!("{} is not a valid file path", absolute.display())))
}
