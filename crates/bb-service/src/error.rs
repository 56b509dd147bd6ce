//! Caller-visible failure kinds.
//!
//! Every condition here is expected and recoverable by the caller, so each
//! gets its own variant rather than collapsing into a generic failure. A
//! transport layer can map each to a distinct status and message.

use thiserror::Error;

use bb_core::{Break, BreakId, DepartmentId, Limit, UserId};

/// Why a break could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartBreakError {
    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("break type '{0}' not found")]
    BreakTypeNotFound(String),

    /// The user already holds an active break. Carries the conflicting
    /// record so the caller can show it instead of silently dropping the
    /// request.
    #[error("user {} already has an active break ({})", .current.user_id, .current.id)]
    AlreadyActive { current: Break },

    /// The type is at its concurrency limit. Carries the observed count and
    /// the limit so the caller can report capacity details.
    #[error("break type '{code}' limit reached: {current} of {limit} in use")]
    CapacityExceeded {
        code: String,
        current: usize,
        limit: Limit,
    },
}

/// Why a break could not be ended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndBreakError {
    /// The user has no active break to end.
    #[error("user {0} has no active break")]
    BreakNotFound(UserId),

    /// The named break is not the caller's current active break. Rejected,
    /// never silently redirected to the actual active one.
    #[error("break {requested} is not the user's active break ({active})")]
    InvalidTarget { requested: BreakId, active: BreakId },

    /// Guards concurrent double-end attempts; unreachable through the normal
    /// lookup path.
    #[error("break {0} is already ended")]
    AlreadyEnded(BreakId),
}

/// The department referenced by a statistics query does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("department {0} not found")]
pub struct DepartmentNotFound(pub DepartmentId);
