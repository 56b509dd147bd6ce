//! Mutual exclusion scoped per logical entity.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A table of mutexes keyed by record identity.
///
/// Gives callers a critical section per user or per break type without
/// serialising unrelated requests behind one global lock. Cells are created
/// on first use and never removed; the key space is bounded by the number
/// of users and break types in the process.
#[derive(Debug, Default)]
pub(crate) struct LockTable<K> {
    cells: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K: Eq + Hash + Copy> LockTable<K> {
    pub(crate) fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lock cell for `key`, creating it on first use.
    ///
    /// The registry lock is held only for the map access, never across the
    /// caller's critical section.
    pub(crate) fn cell(&self, key: K) -> Arc<Mutex<()>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(key).or_default())
    }
}

// The guarded data is `()`; a poisoned cell carries no broken state.
pub(crate) fn hold(cell: &Arc<Mutex<()>>) -> MutexGuard<'_, ()> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}
