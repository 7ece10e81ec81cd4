//! Result and schema export

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use pv_core::{FileHandle, ResultSet, Schema};
use serde_json::Value;
use tracing::info;

use crate::ExportError;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma separated, every field quoted
    Csv,
    /// Pretty printed JSON array of objects
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Parse a user supplied format name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

/// Something that can be serialized to both export formats
pub trait Exportable {
    /// Delimited text: a header line, then one quoted line per record
    fn to_delimited_text(&self) -> Result<String, ExportError>;

    /// Structured text: an array with one object per record, keys sorted
    fn to_structured_text(&self) -> Result<String, ExportError>;

    /// Serialize in `format`
    fn export_as(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => self.to_delimited_text(),
            ExportFormat::Json => self.to_structured_text(),
        }
    }
}

impl Exportable for ResultSet {
    fn to_delimited_text(&self) -> Result<String, ExportError> {
        let header: Vec<&str> = self.schema().names().collect();
        delimited(&header, self.rows())
    }

    fn to_structured_text(&self) -> Result<String, ExportError> {
        let records: Vec<Value> = self
            .rows()
            .iter()
            .map(|row| {
                let object: BTreeMap<&str, &str> = self
                    .schema()
                    .names()
                    .zip(row.iter().map(String::as_str))
                    .collect();
                serde_json::to_value(object)
            })
            .collect::<Result<_, _>>()?;

        Ok(serde_json::to_string_pretty(&records)?)
    }
}

impl Exportable for Schema {
    fn to_delimited_text(&self) -> Result<String, ExportError> {
        let rows: Vec<Vec<String>> = self
            .columns()
            .iter()
            .map(|c| vec![c.name.clone(), c.data_type.clone(), c.nullable.to_string()])
            .collect();
        delimited(&["name", "type", "nullable"], &rows)
    }

    fn to_structured_text(&self) -> Result<String, ExportError> {
        let records: Vec<BTreeMap<&str, Value>> = self
            .columns()
            .iter()
            .map(|c| {
                BTreeMap::from([
                    ("name", Value::from(c.name.as_str())),
                    ("nullable", Value::from(c.nullable)),
                    ("type", Value::from(c.data_type.as_str())),
                ])
            })
            .collect();

        Ok(serde_json::to_string_pretty(&records)?)
    }
}

fn delimited<S: AsRef<str>>(header: &[&str], rows: &[Vec<S>]) -> Result<String, ExportError> {
    // A zero-column result has nothing to write, not even a header
    if header.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(AsRef::<str>::as_ref))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Default export file name derived from the loaded file
///
/// `data.parquet` becomes `data.csv`, or `data_schema.json` for a schema
/// export.
pub fn export_file_name(handle: &FileHandle, format: ExportFormat, schema_only: bool) -> String {
    let suffix = if schema_only { "_schema" } else { "" };
    format!("{}{}.{}", handle.file_stem(), suffix, format.extension())
}

/// Write serialized export text to `path`
pub fn save_to_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    std::fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Exported {} bytes to: {:?}", contents.len(), path);
    Ok(())
}

/// Serialize `item` and write it into `dir` under the derived file name
pub fn write_export(
    dir: &Path,
    handle: &FileHandle,
    item: &dyn Exportable,
    format: ExportFormat,
    schema_only: bool,
) -> Result<PathBuf, ExportError> {
    let contents = item.export_as(format)?;
    let path = dir.join(export_file_name(handle, format, schema_only));
    save_to_file(&path, &contents)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pv_core::Column;
    use serde_json::json;

    fn two_by_two() -> ResultSet {
        let schema = Schema::new(vec![
            Column::new("a", "Utf8", true),
            Column::new("b", "Utf8", true),
        ]);
        ResultSet::try_new(
            schema,
            vec![
                vec!["1".to_string(), "x".to_string()],
                vec!["2".to_string(), "y".to_string()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_result_delimited_text() {
        let text = two_by_two().to_delimited_text().unwrap();
        assert_eq!(text, "\"a\",\"b\"\n\"1\",\"x\"\n\"2\",\"y\"\n");
    }

    #[test]
    fn test_result_structured_text() {
        let text = two_by_two().to_structured_text().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{"a": "1", "b": "x"}, {"a": "2", "b": "y"}]));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_delimited_text_escapes_quotes_and_newlines() {
        let schema = Schema::new(vec![Column::new("quote", "Utf8", true)]);
        let result = ResultSet::try_new(
            schema,
            vec![vec!["say \"hi\"".to_string()], vec!["two\nlines".to_string()]],
        )
        .unwrap();

        let text = result.to_delimited_text().unwrap();
        assert_eq!(text, "\"quote\"\n\"say \"\"hi\"\"\"\n\"two\nlines\"\n");

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let cells: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        assert_eq!(cells, vec!["say \"hi\"", "two\nlines"]);
    }

    #[test]
    fn test_empty_result_exports() {
        let empty = ResultSet::empty();
        assert_eq!(empty.to_delimited_text().unwrap(), "");
        assert_eq!(empty.to_structured_text().unwrap(), "[]");
    }

    #[test]
    fn test_schema_exports() {
        let schema = Schema::new(vec![
            Column::new("id", "Int64", false),
            Column::new("name", "Utf8", true),
        ]);

        assert_eq!(
            schema.to_delimited_text().unwrap(),
            "\"name\",\"type\",\"nullable\"\n\"id\",\"Int64\",\"false\"\n\"name\",\"Utf8\",\"true\"\n"
        );

        let text = schema.to_structured_text().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            parsed,
            json!([
                {"name": "id", "nullable": false, "type": "Int64"},
                {"name": "name", "nullable": true, "type": "Utf8"}
            ])
        );
        // Keys are written in sorted order
        let name_pos = text.find("\"name\"").unwrap();
        let nullable_pos = text.find("\"nullable\"").unwrap();
        let type_pos = text.find("\"type\"").unwrap();
        assert!(name_pos < nullable_pos && nullable_pos < type_pos);
    }

    #[test]
    fn test_export_file_name() {
        let handle = FileHandle::load("/tmp/data.parquet").unwrap();
        assert_eq!(export_file_name(&handle, ExportFormat::Csv, false), "data.csv");
        assert_eq!(export_file_name(&handle, ExportFormat::Json, true), "data_schema.json");
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(ExportFormat::from_name("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_name("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::from_name("xml"), None);
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let handle = FileHandle::load(dir.path().join("sales.feather")).unwrap();

        let path = write_export(dir.path(), &handle, &two_by_two(), ExportFormat::Csv, false).unwrap();
        assert_eq!(path.file_name().unwrap(), "sales.csv");
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("\"a\",\"b\"\n"));
    }

    #[test]
    fn test_unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = save_to_file(&path, "x").unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }
}
