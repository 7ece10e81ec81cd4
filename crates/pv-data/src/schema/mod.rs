//! Schema introspection for relations and statements

use datafusion::prelude::DataFrame;
use pv_core::Schema;

use crate::engine::QueryEngine;
use crate::sources::Source;
use crate::DataError;

/// Turns a relation or a statement into a [`Schema`]
pub struct SchemaProbe;

impl SchemaProbe {
    /// Static schema of the loaded file
    ///
    /// Parquet files are described by the engine; Arrow IPC files use the
    /// schema embedded in the file. Both produce the same shape.
    pub async fn describe_relation(source: &Source, engine: &QueryEngine) -> Result<Schema, DataError> {
        source.as_relation().schema(engine).await
    }

    /// Output schema of an already rewritten statement
    ///
    /// The statement is planned but not executed. Invalid SQL or unknown
    /// columns surface as [`DataError::QuerySyntax`] with the engine's message.
    pub async fn describe_query(statement: &str, engine: &QueryEngine) -> Result<Schema, DataError> {
        let frame = engine.plan(statement).await?;
        Ok(Self::describe_frame(&frame))
    }

    /// Output schema of a planned statement
    pub fn describe_frame(frame: &DataFrame) -> Schema {
        Schema::from_arrow(frame.schema().as_arrow())
    }
}
