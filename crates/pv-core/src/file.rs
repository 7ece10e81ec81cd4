//! The currently opened columnar file

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::CoreError;

const PARQUET_EXTENSIONS: &[&str] = &["parquet"];
const IPC_EXTENSIONS: &[&str] = &["arrow", "feather", "ipc"];

/// Detected kind of a loaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    /// Row-group oriented Parquet file, queried through the engine
    Parquet,
    /// Arrow IPC file (`.arrow`, `.feather`, `.ipc`)
    ArrowIpc,
}

impl FileKind {
    /// Detect the kind from the path extension, case-insensitively
    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if PARQUET_EXTENSIONS.contains(&extension.as_str()) {
            Ok(FileKind::Parquet)
        } else if IPC_EXTENSIONS.contains(&extension.as_str()) {
            Ok(FileKind::ArrowIpc)
        } else {
            Err(CoreError::UnsupportedExtension {
                path: path.to_path_buf(),
            })
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileKind::Parquet => "Parquet",
            FileKind::ArrowIpc => "Arrow IPC",
        }
    }
}

/// Identifies the loaded file and its kind
///
/// Loading never parses file contents; only the size is read for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
    kind: FileKind,
    file_size: Option<u64>,
}

impl FileHandle {
    /// Validate the extension and capture the file size
    ///
    /// Unsupported extensions are rejected before the file is touched.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path = path.as_ref().to_path_buf();
        let kind = FileKind::from_path(&path)?;
        let file_size = std::fs::metadata(&path).ok().map(|m| m.len());

        Ok(Self {
            path,
            kind,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Get the file name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// File name without its extension, used for export names
    pub fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("export")
            .to_string()
    }

    /// The extension exactly as written in the path
    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
    }
}
