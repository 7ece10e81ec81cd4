//! File metadata rows

use serde::{Deserialize, Serialize};

/// Keys for the file-level fields, in display order
pub mod keys {
    pub const FILE_NAME: &str = "File Name";
    pub const CREATED_BY: &str = "Created By";
    pub const ROWS: &str = "Rows";
    pub const ROW_GROUPS: &str = "Row Groups";
    pub const FORMAT_VERSION: &str = "Format Version";
    pub const ENCRYPTION: &str = "Encryption";
    pub const FILE_SIZE: &str = "File Size";
    pub const FORMAT: &str = "Format";
    pub const RECORD_BATCHES: &str = "Record Batches";
    pub const KEY_VALUE_METADATA: &str = "Key-Value Metadata";
}

/// One displayed metadata entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub key: String,
    pub value: String,
}

impl MetadataRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Flatten metadata rows into `key: value` lines for the clipboard
pub fn metadata_text(rows: &[MetadataRow]) -> String {
    rows.iter()
        .map(|row| format!("{}: {}", row.key, row.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human readable byte count, e.g. `1.5 MB (1572864 bytes)`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {} ({} bytes)", size, UNITS[unit], bytes)
}
