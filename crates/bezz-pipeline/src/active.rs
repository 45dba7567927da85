//! In-process registry of briefs with a run in flight.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct ActiveRuns {
    ids: Arc<Mutex<HashSet<String>>>,
}

impl ActiveRuns {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `id`, or `None` when a run already holds it.
    #[must_use]
    pub fn try_acquire(&self, id: &str) -> Option<RunGuard> {
        let inserted = self
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
        inserted.then(|| RunGuard {
            ids: Arc::clone(&self.ids),
            id: id.to_string(),
        })
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

/// Releases its brief id when dropped, including on panic.
#[derive(Debug)]
pub struct RunGuard {
    ids: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}
