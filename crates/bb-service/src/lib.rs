//! Break admission and accounting service.
//!
//! Sits between the transport layer and the record store. Owns the two
//! invariants with concurrency-sensitive state:
//! - at most one active break per user, and
//! - no more simultaneously active breaks of a type than its limit allows.
//!
//! Both are enforced by taking a per-identity critical section around the
//! check-and-create sequence, never by a single global lock.

mod error;
mod gate;
mod locks;
mod service;

pub use error::{DepartmentNotFound, EndBreakError, StartBreakError};
pub use gate::CapacityGate;
pub use service::{
    BreakHistoryEntry, BreakService, BreakTypeAvailability, EndedBreak, StartedBreak,
};
