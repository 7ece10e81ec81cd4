//! Core data model for the columnar file viewer
//!
//! This crate holds the engine-free pieces: schemas, bounded result sets,
//! metadata rows, the loaded-file handle, configuration and the session
//! event bus. Nothing in here talks to the query engine.

pub mod config;
pub mod events;
pub mod file;
pub mod metadata;
pub mod result;
pub mod schema;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

// Re-export commonly used types
pub use config::ViewerConfig;
pub use events::EventBus;
pub use file::{FileHandle, FileKind};
pub use metadata::MetadataRow;
pub use result::{ResultSet, Row};
pub use schema::{Column, Schema};
pub use state::SessionId;

/// Errors raised by the data model itself
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unsupported file type: {}. Expected .parquet, .arrow, .feather or .ipc", path.display())]
    UnsupportedExtension { path: PathBuf },

    #[error("Row {row} has {found} cells but the schema has {expected} columns")]
    ArityMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
