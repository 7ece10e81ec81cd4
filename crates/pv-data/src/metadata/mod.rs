//! File-level and key/value metadata probing
//!
//! Parquet metadata is read from the file footer. Arrow IPC files carry no
//! footer key/value pairs we expose, so their fields are synthesized from
//! the batches the reader reports.

use std::fs::File;

use parquet::file::reader::{FileReader as _, SerializedFileReader};
use pv_core::metadata::{format_file_size, keys};
use pv_core::{FileHandle, MetadataRow};
use tracing::debug;

use crate::sources::{IpcSource, Source};
use crate::DataError;

/// Produces the flat, ordered metadata list for a loaded file
pub struct MetadataProbe;

impl MetadataProbe {
    /// File-level rows first (absent fields skipped), then key/value pairs
    pub async fn describe(source: &Source) -> Result<Vec<MetadataRow>, DataError> {
        let rows = source.as_relation().metadata().await?;
        debug!(
            "Read {} metadata rows for {}",
            rows.len(),
            source.as_relation().source_name()
        );
        Ok(rows)
    }
}

/// File-level fields in display order; `None` means the file did not report it
#[derive(Debug, Default)]
struct FileFields {
    file_name: Option<String>,
    created_by: Option<String>,
    rows: Option<String>,
    row_groups: Option<String>,
    format_version: Option<String>,
    encryption: Option<String>,
    file_size: Option<String>,
}

impl FileFields {
    fn into_rows(self) -> Vec<MetadataRow> {
        [
            (keys::FILE_NAME, self.file_name),
            (keys::CREATED_BY, self.created_by),
            (keys::ROWS, self.rows),
            (keys::ROW_GROUPS, self.row_groups),
            (keys::FORMAT_VERSION, self.format_version),
            (keys::ENCRYPTION, self.encryption),
            (keys::FILE_SIZE, self.file_size),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| MetadataRow::new(key, value)))
        .collect()
    }
}

/// Read footer metadata of a Parquet file
pub(crate) fn read_parquet_metadata(handle: &FileHandle) -> Result<Vec<MetadataRow>, DataError> {
    let file = File::open(handle.path())
        .map_err(|e| DataError::FileRead(format!("{}: {}", handle.path().display(), e)))?;
    let reader = SerializedFileReader::new(file)
        .map_err(|e| DataError::FileRead(format!("{}: {}", handle.file_name(), e)))?;

    let metadata = reader.metadata();
    let file_metadata = metadata.file_metadata();

    // Footer encryption is not supported by the reader, so a file that opens is plaintext
    let fields = FileFields {
        file_name: Some(handle.file_name()),
        created_by: file_metadata.created_by().map(str::to_string),
        rows: Some(file_metadata.num_rows().to_string()),
        row_groups: Some(metadata.num_row_groups().to_string()),
        format_version: Some(file_metadata.version().to_string()),
        encryption: None,
        file_size: handle.file_size().map(format_file_size),
    };

    let mut rows = fields.into_rows();
    if let Some(pairs) = file_metadata.key_value_metadata() {
        rows.extend(pairs.iter().map(|kv| {
            MetadataRow::new(kv.key.clone(), kv.value.clone().unwrap_or_else(|| "NULL".to_string()))
        }));
    }

    Ok(rows)
}

/// Synthesize metadata for an Arrow IPC file
pub(crate) fn read_ipc_metadata(handle: &FileHandle) -> Result<Vec<MetadataRow>, DataError> {
    let reader = IpcSource::open_reader(handle)?;
    let batch_count = reader.num_batches();

    let mut total_rows = 0usize;
    for batch in reader {
        total_rows += batch?.num_rows();
    }

    let mut rows = vec![MetadataRow::new(keys::FILE_NAME, handle.file_name())];
    if let Some(size) = handle.file_size() {
        rows.push(MetadataRow::new(keys::FILE_SIZE, format_file_size(size)));
    }
    rows.push(MetadataRow::new(keys::FORMAT, handle.kind().label()));
    rows.push(MetadataRow::new(keys::RECORD_BATCHES, batch_count.to_string()));
    rows.push(MetadataRow::new(keys::ROWS, total_rows.to_string()));
    rows.push(MetadataRow::new(
        keys::KEY_VALUE_METADATA,
        "Not available for Arrow IPC files",
    ));

    Ok(rows)
}
