//! Rendering and export surface for query results and schemas
//!
//! Everything in here is a pure function of a [`ResultSet`](pv_core::ResultSet),
//! [`Schema`](pv_core::Schema) or metadata list, except the final write step
//! in [`export::save_to_file`].

pub mod export;
pub mod tables;

pub use export::{export_file_name, save_to_file, write_export, ExportFormat, Exportable};
pub use tables::{render_metadata, render_result, render_schema, TableConfig};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while serializing or writing an export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
