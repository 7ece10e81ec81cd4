//! Column schemas shared by file introspection and query results

use serde::{Deserialize, Serialize};

/// A single column as reported by the engine or the file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Engine-native type name, passed through verbatim
    pub data_type: String,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// Ordered sequence of columns
///
/// Used both for the static file schema computed at load time and for the
/// per-execution result schema of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a schema from an Arrow schema, keeping the Arrow type text as-is
    pub fn from_arrow(schema: &arrow::datatypes::Schema) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| Column::new(field.name(), field.data_type().to_string(), field.is_nullable()))
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in schema order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, TimeUnit};

    #[test]
    fn test_from_arrow_keeps_order_and_type_text() {
        let arrow_schema = arrow::datatypes::Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("ts", DataType::Timestamp(TimeUnit::Millisecond, None), true),
        ]);

        let schema = Schema::from_arrow(&arrow_schema);

        assert_eq!(schema.len(), 3);
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["id", "name", "ts"]);
        assert_eq!(schema.columns()[0], Column::new("id", "Int64", false));
        assert_eq!(schema.columns()[1].data_type, "Utf8");
        assert_eq!(schema.columns()[2].data_type, "Timestamp(Millisecond, None)");
        assert!(schema.columns()[2].nullable);
    }

    #[test]
    fn test_empty_schema() {
        let schema = Schema::empty();
        assert!(schema.is_empty());
        assert_eq!(schema.names().count(), 0);
    }
}
