//! Record definitions for departments, users, break types, and breaks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BreakId, BreakTypeId, DepartmentId, Limit, UserId};

/// A department that users may belong to.
///
/// Immutable after creation. Users hold a weak reference to a department;
/// the reference is never validated against this table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    /// Unique short code (e.g., "ENG").
    pub code: String,
}

/// An employee who takes breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Opaque credential. Stored, never interpreted.
    pub password: String,
    pub name: Option<String>,
    /// May reference a nonexistent department without consequence.
    pub department_id: Option<DepartmentId>,
}

/// A configured category of break.
///
/// Reference data: created at startup and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakType {
    pub id: BreakTypeId,
    /// Unique code (e.g., "tea1", "dinner", "bio").
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// How many breaks of this type may run at once.
    pub max_concurrent: Limit,
    /// Expected length in minutes, used only for reporting, never enforced.
    pub duration_limit_minutes: Option<i64>,
}

/// A single break taken by a user.
///
/// Created in the active state and ended exactly once via [`Break::finish`].
/// An ended break is immutable. The `active` flag and the `end_time` /
/// `duration_minutes` options always agree: active means both are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Break {
    pub id: BreakId,
    pub user_id: UserId,
    pub break_type_id: BreakTypeId,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub active: bool,
    /// The logical day this break counts against. Normally the start date,
    /// but callers may supply a distinct business date.
    pub date: NaiveDate,
}

impl Break {
    /// Transitions the break to the ended state at `now`.
    ///
    /// Sets the end time, the rounded duration, and clears the active flag.
    pub fn finish(&mut self, now: DateTime<Utc>) {
        self.duration_minutes = Some(rounded_minutes(self.start_time, now));
        self.end_time = Some(now);
        self.active = false;
    }
}

/// Rounds the elapsed time between `start` and `end` up to whole minutes.
///
/// A completed break never reports zero cost: any non-negative elapsed time
/// with a known start rounds up to at least 1 minute. A missing start time is
/// treated as "now", yielding 0, as is a start time after `end`.
#[must_use]
pub fn rounded_minutes(start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> i64 {
    let Some(start) = start else {
        return 0;
    };
    let elapsed_ms = (end - start).num_milliseconds();
    if elapsed_ms < 0 {
        return 0;
    }
    ((elapsed_ms + 59_999) / 60_000).max(1)
}
