//! Session identity

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonically increasing identity of one loaded file
///
/// Every file load gets a fresh id. Query results carry the id they were
/// issued against so late arrivals from a replaced session can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out session ids
#[derive(Debug, Default)]
pub struct SessionIdAllocator {
    last: AtomicU64,
}

impl SessionIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id; ids start at 1
    pub fn next(&self) -> SessionId {
        SessionId(self.last.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// The most recently allocated id, if any
    pub fn latest(&self) -> Option<SessionId> {
        match self.last.load(Ordering::SeqCst) {
            0 => None,
            n => Some(SessionId(n)),
        }
    }
}
