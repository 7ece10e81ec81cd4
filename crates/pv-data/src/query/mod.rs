//! Statement execution against the bound relation

pub mod cells;
pub mod rewrite;

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use pv_core::{ResultSet, Row, Schema, ViewerConfig};
use tracing::{debug, info};

use crate::engine::QueryEngine;
use crate::schema::SchemaProbe;
use crate::DataError;

pub use cells::{extract_cell, CellValue};
pub use rewrite::{RelationBinder, StatementKind};

/// Runs user statements and materializes bounded result sets
#[derive(Debug, Clone)]
pub struct QueryRunner {
    binder: RelationBinder,
    preview_cap: usize,
    default_query: String,
}

impl QueryRunner {
    pub fn new(config: &ViewerConfig) -> Result<Self, DataError> {
        config.validate()?;

        Ok(Self {
            binder: RelationBinder::new(&config.placeholder)?,
            preview_cap: config.preview_cap,
            default_query: config.default_query(),
        })
    }

    /// Statement run right after a file loads
    pub fn default_query(&self) -> &str {
        &self.default_query
    }

    /// Replace the placeholder with the bound relation expression
    pub fn rewrite(&self, statement: &str) -> String {
        self.binder.bind(statement, &QueryEngine::relation_expression())
    }

    /// Execute one statement
    ///
    /// Projecting statements are described, capped at the preview limit inside
    /// the engine and converted to display rows. Anything else runs for effect
    /// and yields an empty result.
    pub async fn run(&self, statement: &str, engine: &QueryEngine) -> Result<ResultSet, DataError> {
        let rewritten = self.rewrite(statement);
        debug!("Rewrote statement to: {}", rewritten);
        let started = Instant::now();

        match StatementKind::classify(statement) {
            StatementKind::Effect => {
                engine.execute(&rewritten).await?;
                info!("Executed statement in {:?}", started.elapsed());
                Ok(ResultSet::empty())
            }
            StatementKind::Projecting => {
                let frame = engine.plan(&rewritten).await?;
                let schema = SchemaProbe::describe_frame(&frame);
                let frame = frame
                    .limit(0, Some(self.preview_cap))
                    .map_err(|e| DataError::QuerySyntax(e.to_string()))?;
                let batches = engine.collect(frame).await?;

                let result = materialize(schema, &batches)?;
                info!(
                    "Query returned {} rows x {} columns in {:?}",
                    result.row_count(),
                    result.column_count(),
                    started.elapsed()
                );
                Ok(result)
            }
        }
    }
}

/// Walk batches positionally, turning every cell into its display string
fn materialize(schema: Schema, batches: &[RecordBatch]) -> Result<ResultSet, DataError> {
    let total: usize = batches.iter().map(|b| b.num_rows()).sum();
    let mut rows: Vec<Row> = Vec::with_capacity(total);

    for batch in batches {
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|column| extract_cell(column.as_ref(), row).to_string())
                    .collect(),
            );
        }
    }

    Ok(ResultSet::try_new(schema, rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pv_core::FileHandle;

    async fn engine_with_rows(dir: &std::path::Path, rows: usize) -> QueryEngine {
        let path = fixtures::write_parquet(dir, "sample.parquet", rows);
        let engine = QueryEngine::new();
        engine
            .register_parquet(&FileHandle::load(&path).unwrap())
            .await
            .unwrap();
        engine
    }

    fn runner() -> QueryRunner {
        QueryRunner::new(&ViewerConfig::default()).unwrap()
    }

    #[test]
    fn test_runner_rejects_invalid_config() {
        let config = ViewerConfig::default().with_preview_cap(0);
        assert!(QueryRunner::new(&config).is_err());
    }

    #[test]
    fn test_rewrite_uses_relation_expression() {
        assert_eq!(
            runner().rewrite("SELECT * FROM tbl LIMIT 5"),
            "SELECT * FROM (SELECT * FROM \"loaded_file\") LIMIT 5"
        );
    }

    #[tokio::test]
    async fn test_default_query_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_rows(dir.path(), 120).await;
        let runner = runner();

        let result = runner.run(runner.default_query(), &engine).await.unwrap();
        assert_eq!(result.row_count(), 50);
        assert_eq!(result.rows().len(), 50);
        assert_eq!(result.schema().names().collect::<Vec<_>>(), vec!["id", "name", "score", "active"]);
    }

    #[tokio::test]
    async fn test_small_relation_returns_every_row() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_rows(dir.path(), 7).await;
        let runner = runner();

        let result = runner.run(runner.default_query(), &engine).await.unwrap();
        assert_eq!(result.row_count(), 7);
    }

    #[tokio::test]
    async fn test_cap_applies_without_limit_clause() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_rows(dir.path(), 120).await;
        let runner = QueryRunner::new(&ViewerConfig::default().with_preview_cap(10)).unwrap();

        let result = runner.run("select id from TBL", &engine).await.unwrap();
        assert_eq!(result.row_count(), 10);
    }

    #[tokio::test]
    async fn test_rows_match_schema_and_render_cells() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_rows(dir.path(), 10).await;

        let result = runner()
            .run("SELECT id, name, score, active FROM tbl ORDER BY id", &engine)
            .await
            .unwrap();

        assert!(result.rows().iter().all(|row| row.len() == result.schema().len()));
        assert_eq!(result.rows()[0], vec!["0", "name_0", "0", "true"]);
        assert_eq!(result.rows()[1], vec!["1", "name_1", "1.5", "false"]);
        assert_eq!(result.rows()[4][1], "NULL");
    }

    #[tokio::test]
    async fn test_with_statement_projects() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_rows(dir.path(), 10).await;

        let result = runner()
            .run("WITH evens AS (SELECT id FROM tbl WHERE active) SELECT count(*) AS n FROM evens", &engine)
            .await
            .unwrap();

        assert_eq!(result.schema().names().collect::<Vec<_>>(), vec!["n"]);
        assert_eq!(result.rows(), &[vec!["5".to_string()]]);
    }

    #[tokio::test]
    async fn test_non_projecting_statement_clears_result() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_rows(dir.path(), 10).await;
        let runner = runner();

        let result = runner
            .run("CREATE VIEW recent AS SELECT * FROM tbl WHERE id > 5", &engine)
            .await
            .unwrap();
        assert!(result.is_empty());

        let result = runner.run("SELECT count(*) FROM recent", &engine).await.unwrap();
        assert_eq!(result.rows()[0][0], "4");
    }

    #[tokio::test]
    async fn test_unknown_column_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine_with_rows(dir.path(), 10).await;

        let err = runner()
            .run("SELECT no_such_column FROM tbl", &engine)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::QuerySyntax(_)));
        assert!(err.is_query_error());
    }
}
