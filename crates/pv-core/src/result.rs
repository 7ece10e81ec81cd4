//! Bounded query results

use serde::{Deserialize, Serialize};

use crate::{CoreError, Schema};

/// One result row: display strings in schema order
pub type Row = Vec<String>;

/// Immutable snapshot of one query execution
///
/// Every row has exactly one cell per schema column. The row count is the
/// number of rows actually materialized, which is already bounded by the
/// preview cap of the statement that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    schema: Schema,
    rows: Vec<Row>,
    row_count: usize,
}

impl ResultSet {
    /// Create a result set, rejecting rows whose length differs from the schema
    pub fn try_new(schema: Schema, rows: Vec<Row>) -> Result<Self, CoreError> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != schema.len())
        {
            return Err(CoreError::ArityMismatch {
                row,
                expected: schema.len(),
                found: cells.len(),
            });
        }

        let row_count = rows.len();
        Ok(Self {
            schema,
            rows,
            row_count,
        })
    }

    /// Result of a statement executed for effect only
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty() && self.rows.is_empty()
    }
}
