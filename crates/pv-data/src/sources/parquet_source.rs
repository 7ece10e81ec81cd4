//! Parquet data source implementation

use async_trait::async_trait;
use pv_core::{FileHandle, MetadataRow, Schema};

use crate::engine::QueryEngine;
use crate::metadata;
use crate::schema::SchemaProbe;
use crate::sources::RelationSource;
use crate::DataError;

/// Parquet file queried through the engine
pub struct ParquetSource {
    handle: FileHandle,
}

impl ParquetSource {
    pub fn new(handle: FileHandle) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl RelationSource for ParquetSource {
    fn handle(&self) -> &FileHandle {
        &self.handle
    }

    async fn register(&self, engine: &QueryEngine) -> Result<(), DataError> {
        engine.register_parquet(&self.handle).await
    }

    async fn schema(&self, engine: &QueryEngine) -> Result<Schema, DataError> {
        let statement = format!("SELECT * FROM {}", QueryEngine::relation_expression());
        SchemaProbe::describe_query(&statement, engine)
            .await
            .map_err(|e| DataError::FileRead(format!("{}: {}", self.handle.file_name(), e)))
    }

    async fn metadata(&self) -> Result<Vec<MetadataRow>, DataError> {
        let handle = self.handle.clone();
        tokio::task::spawn_blocking(move || metadata::read_parquet_metadata(&handle)).await?
    }
}
