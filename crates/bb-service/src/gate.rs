//! Capacity gate: may another break of a given type start right now?

use bb_core::Limit;
use bb_store::Store;

/// Read-only admission check against a type's concurrency limit.
///
/// The gate itself has no side effects and is not atomic with any
/// subsequent record creation. [`BreakService`](crate::BreakService)
/// consults it while holding the type's lock, which is what actually closes
/// the check-then-create window.
#[derive(Debug, Clone, Copy)]
pub struct CapacityGate<'a> {
    store: &'a Store,
}

impl<'a> CapacityGate<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Whether a new break of the type may start.
    ///
    /// Fails closed: an unknown code is never admitted. Callers distinguish
    /// "unknown type" from "at capacity" with their own lookup.
    #[must_use]
    pub fn can_admit(&self, code: &str) -> bool {
        let Some(break_type) = self.store.break_type_by_code(code) else {
            return false;
        };
        break_type
            .max_concurrent
            .admits(self.store.active_break_count(break_type.id))
    }

    /// Currently active breaks of the type, 0 for an unknown code.
    #[must_use]
    pub fn active_count(&self, code: &str) -> usize {
        self.store
            .break_type_by_code(code)
            .map_or(0, |break_type| self.store.active_break_count(break_type.id))
    }

    /// The type's configured limit, unlimited for an unknown code.
    #[must_use]
    pub fn limit(&self, code: &str) -> Limit {
        self.store
            .break_type_by_code(code)
            .map_or(Limit::Unlimited, |break_type| break_type.max_concurrent)
    }
}
