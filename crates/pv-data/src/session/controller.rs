//! Background loading and querying of sessions

use std::path::Path;
use std::sync::Arc;

use pv_core::events::events::{
    QueryCompleted, QueryFailed, SessionLoadFailed, SessionLoaded, StaleResultDropped,
};
use pv_core::{EventBus, FileHandle, SessionId};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{Session, SessionStore};
use crate::query::QueryRunner;
use crate::DataError;

/// How a background load ended
#[derive(Debug)]
pub enum LoadOutcome {
    /// The new session is current
    Loaded(Arc<Session>),
    /// A newer load started before this one finished
    Superseded(SessionId),
    /// The file could not be read; the previous session is still current
    Failed(DataError),
}

/// How a background query ended
#[derive(Debug)]
pub enum QueryOutcome {
    /// The result replaced the session's current result
    Completed(Arc<Session>),
    /// The statement failed; `session` keeps its previous result
    Failed {
        session: Arc<Session>,
        error: DataError,
    },
    /// The session was replaced while the query ran
    Discarded(SessionId),
}

/// Runs file loads and statements off the caller's thread
///
/// Both operations return immediately with a [`JoinHandle`]; the outcome is
/// also published on the [`EventBus`].
pub struct SessionController {
    store: Arc<SessionStore>,
    runner: Arc<QueryRunner>,
    events: Arc<EventBus>,
    runtime: Handle,
}

impl SessionController {
    pub fn new(runner: QueryRunner, events: Arc<EventBus>, runtime: Handle) -> Self {
        Self {
            store: Arc::new(SessionStore::new()),
            runner: Arc::new(runner),
            events,
            runtime,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn runner(&self) -> &QueryRunner {
        &self.runner
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.store.current()
    }

    /// Start loading `path` as the new session
    ///
    /// Unsupported extensions are rejected here, before anything is spawned.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<JoinHandle<LoadOutcome>, DataError> {
        let handle = FileHandle::load(path)?;
        let id = self.store.allocate_id();
        info!("Loading {} as session {}", handle.path().display(), id);

        let store = Arc::clone(&self.store);
        let runner = Arc::clone(&self.runner);
        let events = Arc::clone(&self.events);

        Ok(self.runtime.spawn(async move {
            let source_name = handle.file_name();

            match Session::open(id, handle, &runner).await {
                Ok(session) => match store.install(session) {
                    Some(session) => {
                        events.publish(SessionLoaded {
                            session_id: id,
                            source_name,
                            column_count: session.file_schema().len(),
                            preview_rows: session.result().row_count(),
                        });
                        LoadOutcome::Loaded(session)
                    }
                    None => LoadOutcome::Superseded(id),
                },
                Err(e) => {
                    error!("Failed to load {}: {}", source_name, e);
                    if !store.record_load_error(id, e.to_string()) {
                        return LoadOutcome::Superseded(id);
                    }
                    events.publish(SessionLoadFailed {
                        source_name,
                        error: e.to_string(),
                    });
                    LoadOutcome::Failed(e)
                }
            }
        }))
    }

    /// Start running `statement` against the current session
    ///
    /// Fails immediately when no file is loaded or the current session
    /// already has a query outstanding.
    pub fn run(&self, statement: impl Into<String>) -> Result<JoinHandle<QueryOutcome>, DataError> {
        let statement = statement.into();
        let ticket = self.store.begin_query()?;

        let store = Arc::clone(&self.store);
        let runner = Arc::clone(&self.runner);
        let events = Arc::clone(&self.events);

        Ok(self.runtime.spawn(async move {
            let tag = ticket.session_id();
            let engine = Arc::clone(ticket.session().engine());
            let result = runner.run(&statement, &engine).await;

            let outcome = match result {
                Ok(result) => {
                    let (rows, columns) = (result.row_count(), result.column_count());
                    match store.apply(tag, |s| s.with_result(&statement, result)) {
                        Some(session) => {
                            events.publish(QueryCompleted {
                                session_id: tag,
                                statement: statement.clone(),
                                row_count: rows,
                                column_count: columns,
                            });
                            QueryOutcome::Completed(session)
                        }
                        None => QueryOutcome::Discarded(tag),
                    }
                }
                Err(e) => match store.apply(tag, |s| s.with_error(&statement, &e)) {
                    Some(session) => {
                        events.publish(QueryFailed {
                            session_id: tag,
                            statement: statement.clone(),
                            error: e.to_string(),
                        });
                        QueryOutcome::Failed { session, error: e }
                    }
                    None => QueryOutcome::Discarded(tag),
                },
            };

            if let QueryOutcome::Discarded(id) = &outcome {
                warn!("Dropping result of {:?} for replaced session {}", statement, id);
                events.publish(StaleResultDropped {
                    session_id: *id,
                    statement,
                });
            }

            drop(ticket);
            outcome
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use parking_lot::Mutex;
    use pv_core::events::typed_handler;
    use pv_core::{CoreError, ViewerConfig};

    fn controller(events: Arc<EventBus>) -> SessionController {
        let runner = QueryRunner::new(&ViewerConfig::default()).unwrap();
        SessionController::new(runner, events, Handle::current())
    }

    #[tokio::test]
    async fn test_load_then_query() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_parquet(dir.path(), "sample.parquet", 120);
        let events = Arc::new(EventBus::new());
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&loaded);
        events.subscribe::<SessionLoaded>(typed_handler::<SessionLoaded, _>(move |e| {
            sink.lock().push(e.preview_rows);
        }));
        let controller = controller(events);

        let outcome = controller.load(&path).unwrap().await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
        assert_eq!(*loaded.lock(), vec![50]);

        let outcome = controller
            .run("SELECT id FROM tbl WHERE id < 3 ORDER BY id")
            .unwrap()
            .await
            .unwrap();
        let QueryOutcome::Completed(session) = outcome else {
            panic!("query did not complete");
        };
        assert_eq!(session.result().rows(), &[vec!["0".to_string()], vec!["1".to_string()], vec!["2".to_string()]]);
        assert_eq!(controller.current().unwrap().result().row_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_query_keeps_previous_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_parquet(dir.path(), "sample.parquet", 20);
        let controller = controller(Arc::new(EventBus::new()));
        controller.load(&path).unwrap().await.unwrap();

        let outcome = controller.run("SELECT missing FROM tbl").unwrap().await.unwrap();
        let QueryOutcome::Failed { session, error } = outcome else {
            panic!("query should fail");
        };
        assert!(error.is_query_error());
        assert_eq!(session.result().row_count(), 20);
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected_synchronously() {
        let controller = controller(Arc::new(EventBus::new()));
        let err = controller.load("/nonexistent/data.csv").unwrap_err();
        assert!(matches!(
            err,
            DataError::Core(CoreError::UnsupportedExtension { .. })
        ));
        assert!(controller.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let good = fixtures::write_parquet(dir.path(), "good.parquet", 5);
        let bad = dir.path().join("bad.parquet");
        std::fs::write(&bad, b"nope").unwrap();
        let controller = controller(Arc::new(EventBus::new()));

        controller.load(&good).unwrap().await.unwrap();
        let outcome = controller.load(&bad).unwrap().await.unwrap();

        assert!(matches!(outcome, LoadOutcome::Failed(DataError::FileRead(_))));
        assert_eq!(controller.current().unwrap().handle().file_name(), "good.parquet");
        assert!(controller.store().load_error().is_some());
    }

    #[tokio::test]
    async fn test_reload_replaces_session() {
        let dir = tempfile::tempdir().unwrap();
        let first = fixtures::write_parquet(dir.path(), "first.parquet", 5);
        let second = fixtures::write_ipc(dir.path(), "second.feather", 8, 3);
        let controller = controller(Arc::new(EventBus::new()));

        controller.load(&first).unwrap().await.unwrap();
        controller
            .run("CREATE VIEW only_first AS SELECT * FROM tbl")
            .unwrap()
            .await
            .unwrap();
        let first_id = controller.current().unwrap().id();

        controller.load(&second).unwrap().await.unwrap();
        let current = controller.current().unwrap();
        assert!(current.id() > first_id);
        assert_eq!(current.result().row_count(), 8);

        // Views from the previous file do not survive the reload
        let outcome = controller.run("SELECT * FROM only_first").unwrap().await.unwrap();
        assert!(matches!(outcome, QueryOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_second_run_rejected_while_first_outstanding() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_parquet(dir.path(), "sample.parquet", 5);
        let controller = controller(Arc::new(EventBus::new()));
        controller.load(&path).unwrap().await.unwrap();

        // The ticket is claimed before the task is spawned
        let first = controller.run("SELECT * FROM tbl").unwrap();
        assert!(matches!(
            controller.run("SELECT 1"),
            Err(DataError::QueryInFlight(_))
        ));

        first.await.unwrap();
        assert!(controller.run("SELECT 1").is_ok());
    }

    #[tokio::test]
    async fn test_load_path_with_glob_characters() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_parquet(dir.path(), "sales[2024].parquet", 5);
        let controller = controller(Arc::new(EventBus::new()));

        let LoadOutcome::Loaded(session) = controller.load(&path).unwrap().await.unwrap() else {
            panic!("load did not finish");
        };
        assert_eq!(session.file_schema().len(), 4);
        assert_eq!(session.result().row_count(), 5);
        assert!(session
            .metadata()
            .iter()
            .any(|row| row.key == "Rows" && row.value == "5"));
    }

    #[test]
    fn test_result_for_replaced_session_is_dropped() {
        // Tasks on a current-thread runtime only advance inside block_on, so
        // the query below cannot start until the reload has been installed
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let side = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let first = fixtures::write_parquet(dir.path(), "first.parquet", 5);
        let second = fixtures::write_ipc(dir.path(), "second.arrow", 8, 3);

        let events = Arc::new(EventBus::new());
        let dropped = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&dropped);
        events.subscribe::<StaleResultDropped>(typed_handler::<StaleResultDropped, _>(move |e| {
            sink.lock().push((e.session_id, e.statement.clone()));
        }));

        let runner = QueryRunner::new(&ViewerConfig::default()).unwrap();
        let controller = SessionController::new(runner, events, rt.handle().clone());

        let outcome = rt.block_on(controller.load(&first).unwrap()).unwrap();
        let LoadOutcome::Loaded(first_session) = outcome else {
            panic!("first load did not finish");
        };

        let pending = controller.run("SELECT id FROM tbl LIMIT 1").unwrap();

        let store = controller.store();
        let replacement = side
            .block_on(Session::open(
                store.allocate_id(),
                FileHandle::load(&second).unwrap(),
                controller.runner(),
            ))
            .unwrap();
        let second_id = replacement.id();
        assert!(store.install(replacement).is_some());

        let outcome = rt.block_on(pending).unwrap();
        assert!(matches!(outcome, QueryOutcome::Discarded(id) if id == first_session.id()));
        assert_eq!(
            *dropped.lock(),
            vec![(first_session.id(), "SELECT id FROM tbl LIMIT 1".to_string())]
        );

        let current = controller.current().unwrap();
        assert_eq!(current.id(), second_id);
        assert_eq!(current.result().row_count(), 8);
        assert_eq!(current.last_statement(), controller.runner().default_query());

        // The ticket was released, so the new session accepts queries
        let outcome = rt.block_on(controller.run("SELECT count(*) FROM tbl").unwrap()).unwrap();
        assert!(matches!(outcome, QueryOutcome::Completed(_)));
    }
}
