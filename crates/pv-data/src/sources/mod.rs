pub mod ipc_source;
pub mod parquet_source;

pub use ipc_source::IpcSource;
pub use parquet_source::ParquetSource;

use async_trait::async_trait;
use pv_core::{FileHandle, FileKind, MetadataRow, Schema};

use crate::engine::QueryEngine;
use crate::DataError;

/// A loaded file exposed to the engine as the bound relation
#[async_trait]
pub trait RelationSource: Send + Sync {
    /// The file this source reads
    fn handle(&self) -> &FileHandle;

    /// Make the file queryable inside `engine`
    async fn register(&self, engine: &QueryEngine) -> Result<(), DataError>;

    /// Static schema of the whole file
    async fn schema(&self, engine: &QueryEngine) -> Result<Schema, DataError>;

    /// File-level and key/value metadata, flattened
    async fn metadata(&self) -> Result<Vec<MetadataRow>, DataError>;

    /// Get the source name
    fn source_name(&self) -> String {
        self.handle().file_name()
    }
}

/// The two supported file kinds, chosen once at load time
pub enum Source {
    Parquet(ParquetSource),
    Ipc(IpcSource),
}

impl Source {
    pub fn open(handle: FileHandle) -> Self {
        match handle.kind() {
            FileKind::Parquet => Source::Parquet(ParquetSource::new(handle)),
            FileKind::ArrowIpc => Source::Ipc(IpcSource::new(handle)),
        }
    }

    pub fn as_relation(&self) -> &dyn RelationSource {
        match self {
            Source::Parquet(source) => source,
            Source::Ipc(source) => source,
        }
    }
}
