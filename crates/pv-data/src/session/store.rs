//! Holder of the current session

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use pv_core::state::SessionIdAllocator;
use pv_core::SessionId;
use tracing::debug;

use super::Session;
use crate::DataError;

/// Owns the single current [`Session`]
///
/// Sessions are swapped as whole `Arc`s. The store also tracks which
/// sessions have a query outstanding so a second `run` against the same
/// session is rejected instead of racing the first.
#[derive(Default)]
pub struct SessionStore {
    current: RwLock<Option<Arc<Session>>>,
    load_error: RwLock<Option<String>>,
    ids: SessionIdAllocator,
    in_flight: Mutex<HashSet<SessionId>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the id for a load that is about to start
    ///
    /// Any load holding an older id is superseded from this point on.
    pub fn allocate_id(&self) -> SessionId {
        self.ids.next()
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.current.read().as_ref().map(|s| s.id())
    }

    /// Error of the last failed load, cleared by the next successful one
    pub fn load_error(&self) -> Option<String> {
        self.load_error.read().clone()
    }

    /// Make `session` current unless a newer load has started
    pub fn install(&self, session: Session) -> Option<Arc<Session>> {
        let mut current = self.current.write();
        if self.ids.latest() != Some(session.id()) {
            debug!("Dropping superseded session {}", session.id());
            return None;
        }

        let session = Arc::new(session);
        *current = Some(session.clone());
        *self.load_error.write() = None;
        Some(session)
    }

    /// Record a failed load; ignored if a newer load has started
    pub fn record_load_error(&self, id: SessionId, error: String) -> bool {
        let _current = self.current.read();
        if self.ids.latest() != Some(id) {
            return false;
        }
        *self.load_error.write() = Some(error);
        true
    }

    /// Claim the query slot of the current session
    pub fn begin_query(self: &Arc<Self>) -> Result<QueryTicket, DataError> {
        let session = self.current().ok_or(DataError::NoSession)?;

        if !self.in_flight.lock().insert(session.id()) {
            return Err(DataError::QueryInFlight(session.id()));
        }

        Ok(QueryTicket {
            session,
            store: Arc::clone(self),
        })
    }

    /// Replace the current session with `update(current)` if it is still `tag`
    ///
    /// Returns `None` when the session was replaced in the meantime; the
    /// caller's result is stale and must be dropped.
    pub fn apply<F>(&self, tag: SessionId, update: F) -> Option<Arc<Session>>
    where
        F: FnOnce(&Session) -> Session,
    {
        let mut current = self.current.write();
        match current.as_ref() {
            Some(session) if session.id() == tag => {
                let next = Arc::new(update(session));
                *current = Some(next.clone());
                Some(next)
            }
            _ => None,
        }
    }

    fn release(&self, id: SessionId) {
        self.in_flight.lock().remove(&id);
    }
}

/// Exclusive right to run one query against a session
///
/// The slot is released when the ticket is dropped, whether the query
/// succeeded, failed or its task was aborted.
pub struct QueryTicket {
    session: Arc<Session>,
    store: Arc<SessionStore>,
}

impl QueryTicket {
    /// The session snapshot the query was issued against
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }
}

impl Drop for QueryTicket {
    fn drop(&mut self) {
        self.store.release(self.session.id());
    }
}
