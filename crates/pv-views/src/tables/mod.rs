//! Text table rendering of results, schemas and metadata

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use pv_core::{MetadataRow, ResultSet, Schema};

use crate::ExportError;

/// Configuration for table rendering
#[derive(Debug, Clone)]
pub struct TableConfig {
    pub show_row_numbers: bool,
    /// Cells longer than this many characters are cut short; 0 disables
    pub max_cell_width: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            show_row_numbers: false,
            max_cell_width: 40,
        }
    }
}

impl TableConfig {
    fn clip(&self, cell: &str) -> String {
        if self.max_cell_width == 0 || cell.chars().count() <= self.max_cell_width {
            return cell.to_string();
        }
        let keep = self.max_cell_width.saturating_sub(3);
        let mut clipped: String = cell.chars().take(keep).collect();
        clipped.push_str("...");
        clipped
    }
}

/// Render the rows of a result set as a boxed text table
pub fn render_result(result: &ResultSet, config: &TableConfig) -> Result<String, ExportError> {
    if result.schema().is_empty() {
        return Ok("(no columns)".to_string());
    }

    let mut headers: Vec<String> = Vec::with_capacity(result.column_count() + 1);
    let mut columns: Vec<Vec<String>> = Vec::with_capacity(result.column_count() + 1);

    if config.show_row_numbers {
        headers.push("#".to_string());
        columns.push((1..=result.row_count()).map(|n| n.to_string()).collect());
    }

    for (index, name) in result.schema().names().enumerate() {
        headers.push(name.to_string());
        columns.push(result.rows().iter().map(|row| config.clip(&row[index])).collect());
    }

    let table = render_columns(&headers, columns)?;
    Ok(format!("{}\n{} rows", table, result.row_count()))
}

/// Render a schema as a `name | type | nullable` table
pub fn render_schema(schema: &Schema) -> Result<String, ExportError> {
    let columns = schema.columns();
    render_columns(
        &["name", "type", "nullable"],
        vec![
            columns.iter().map(|c| c.name.clone()).collect(),
            columns.iter().map(|c| c.data_type.clone()).collect(),
            columns.iter().map(|c| c.nullable.to_string()).collect(),
        ],
    )
}

/// Render metadata rows as a `key | value` table
pub fn render_metadata(rows: &[MetadataRow]) -> Result<String, ExportError> {
    render_columns(
        &["key", "value"],
        vec![
            rows.iter().map(|r| r.key.clone()).collect(),
            rows.iter().map(|r| r.value.clone()).collect(),
        ],
    )
}

/// Build a string-only batch and let arrow's pretty printer lay it out
fn render_columns<H: AsRef<str>>(headers: &[H], columns: Vec<Vec<String>>) -> Result<String, ExportError> {
    let fields: Vec<Field> = headers
        .iter()
        .map(|h| Field::new(h.as_ref(), DataType::Utf8, false))
        .collect();
    let arrays: Vec<ArrayRef> = columns
        .into_iter()
        .map(|values| Arc::new(StringArray::from(values)) as ArrayRef)
        .collect();

    let batch = RecordBatch::try_new(Arc::new(ArrowSchema::new(fields)), arrays)?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}
