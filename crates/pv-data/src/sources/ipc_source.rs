//! Arrow IPC data source implementation

use std::fs::File;
use std::io::BufReader;

use arrow::ipc::reader::FileReader;
use async_trait::async_trait;
use pv_core::{FileHandle, MetadataRow, Schema};

use crate::engine::QueryEngine;
use crate::metadata;
use crate::sources::RelationSource;
use crate::DataError;

/// Arrow IPC file (`.arrow`, `.feather`, `.ipc`)
///
/// The schema comes straight from the file footer; only queries go through
/// the engine.
pub struct IpcSource {
    handle: FileHandle,
}

impl IpcSource {
    pub fn new(handle: FileHandle) -> Self {
        Self { handle }
    }

    /// Open an IPC file reader over the handle's path
    pub(crate) fn open_reader(handle: &FileHandle) -> Result<FileReader<BufReader<File>>, DataError> {
        let file = File::open(handle.path())
            .map_err(|e| DataError::FileRead(format!("{}: {}", handle.path().display(), e)))?;

        FileReader::try_new(BufReader::new(file), None)
            .map_err(|e| DataError::FileRead(format!("{}: {}", handle.file_name(), e)))
    }

    fn read_schema(handle: &FileHandle) -> Result<Schema, DataError> {
        let reader = Self::open_reader(handle)?;
        Ok(Schema::from_arrow(reader.schema().as_ref()))
    }
}

#[async_trait]
impl RelationSource for IpcSource {
    fn handle(&self) -> &FileHandle {
        &self.handle
    }

    async fn register(&self, engine: &QueryEngine) -> Result<(), DataError> {
        engine.register_ipc(&self.handle).await
    }

    async fn schema(&self, _engine: &QueryEngine) -> Result<Schema, DataError> {
        let handle = self.handle.clone();
        tokio::task::spawn_blocking(move || Self::read_schema(&handle)).await?
    }

    async fn metadata(&self) -> Result<Vec<MetadataRow>, DataError> {
        let handle = self.handle.clone();
        tokio::task::spawn_blocking(move || metadata::read_ipc_metadata(&handle)).await?
    }
}
