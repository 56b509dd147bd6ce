//! Break lifecycle manager and service facade.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use bb_core::{
    Break, BreakId, BreakType, BreakTypeId, DailySummary, DepartmentId, DepartmentStats, User,
    UserId, daily_summary, department_stats,
};
use bb_store::{NewBreak, Store};

use crate::error::{DepartmentNotFound, EndBreakError, StartBreakError};
use crate::gate::CapacityGate;
use crate::locks::{LockTable, hold};

/// A freshly started break with its resolved type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedBreak {
    pub entry: Break,
    pub break_type: BreakType,
}

/// An ended break, its type, and the user's updated summary for the break's
/// day, so callers can present "you took N minutes" without a second round
/// trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedBreak {
    pub entry: Break,
    pub break_type: BreakType,
    pub summary: DailySummary,
}

/// Capacity snapshot for one break type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakTypeAvailability {
    pub break_type_id: BreakTypeId,
    pub code: String,
    pub name: String,
    pub is_available: bool,
    pub current_count: usize,
    pub limit: bb_core::Limit,
}

/// One entry of a user's break history, paired with its type.
///
/// The type registry is append-only, so the type is only absent for a break
/// referencing a type the store never knew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakHistoryEntry {
    pub entry: Break,
    pub break_type: Option<BreakType>,
}

/// The break admission and accounting engine.
///
/// All state mutation funnels through [`start_break`](Self::start_break) and
/// [`end_break`](Self::end_break), each of which runs its check-and-create
/// (or check-and-finish) sequence inside a critical section keyed by the
/// entity whose invariant it protects.
#[derive(Debug)]
pub struct BreakService {
    store: Arc<Store>,
    daily_budget_minutes: i64,
    user_locks: LockTable<UserId>,
    type_locks: LockTable<BreakTypeId>,
}

impl BreakService {
    #[must_use]
    pub fn new(store: Arc<Store>, daily_budget_minutes: i64) -> Self {
        Self {
            store,
            daily_budget_minutes,
            user_locks: LockTable::new(),
            type_locks: LockTable::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn daily_budget_minutes(&self) -> i64 {
        self.daily_budget_minutes
    }

    /// Starts a break for the user, dated to today.
    pub fn start_break(
        &self,
        user_id: UserId,
        break_type_code: &str,
    ) -> Result<StartedBreak, StartBreakError> {
        let now = Utc::now();
        self.start_break_on(user_id, break_type_code, now, now.date_naive())
    }

    /// Starts a break at an explicit instant, counted against an explicit
    /// business date.
    ///
    /// Holds the user's lock for the no-active-break check and the type's
    /// lock for the capacity check, releasing both only after the record is
    /// created. Two racing starts for the same user, or for the last slot of
    /// the same type, therefore serialise instead of both succeeding.
    pub fn start_break_on(
        &self,
        user_id: UserId,
        break_type_code: &str,
        now: DateTime<Utc>,
        date: NaiveDate,
    ) -> Result<StartedBreak, StartBreakError> {
        let user = self
            .store
            .user(user_id)
            .ok_or(StartBreakError::UserNotFound(user_id))?;
        let break_type = self
            .store
            .break_type_by_code(break_type_code)
            .ok_or_else(|| StartBreakError::BreakTypeNotFound(break_type_code.to_string()))?;

        // Lock order is always user then type; end_break takes only the
        // user lock, so the two paths cannot deadlock.
        let user_cell = self.user_locks.cell(user.id);
        let _user_guard = hold(&user_cell);

        if let Some(current) = self.store.active_break(user.id) {
            return Err(StartBreakError::AlreadyActive { current });
        }

        let type_cell = self.type_locks.cell(break_type.id);
        let _type_guard = hold(&type_cell);

        let gate = CapacityGate::new(&self.store);
        if !gate.can_admit(&break_type.code) {
            let current = gate.active_count(&break_type.code);
            let limit = gate.limit(&break_type.code);
            tracing::debug!(
                user_id = %user.id,
                code = %break_type.code,
                current,
                %limit,
                "break admission denied",
            );
            return Err(StartBreakError::CapacityExceeded {
                code: break_type.code,
                current,
                limit,
            });
        }

        let entry = self.store.create_break(NewBreak {
            user_id: user.id,
            break_type_id: break_type.id,
            start_time: Some(now),
            date,
        });
        tracing::info!(
            break_id = %entry.id,
            user_id = %user.id,
            code = %break_type.code,
            "break started",
        );
        Ok(StartedBreak { entry, break_type })
    }

    /// Ends the user's current active break.
    pub fn end_break(
        &self,
        break_id: BreakId,
        user_id: UserId,
    ) -> Result<EndedBreak, EndBreakError> {
        self.end_break_at(break_id, user_id, Utc::now())
    }

    /// Ends the user's current active break at an explicit instant.
    ///
    /// The request must name the caller's own active break; naming any other
    /// break id is rejected.
    pub fn end_break_at(
        &self,
        break_id: BreakId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<EndedBreak, EndBreakError> {
        let user_cell = self.user_locks.cell(user_id);
        let _user_guard = hold(&user_cell);

        let active = self
            .store
            .active_break(user_id)
            .ok_or(EndBreakError::BreakNotFound(user_id))?;
        if active.id != break_id {
            return Err(EndBreakError::InvalidTarget {
                requested: break_id,
                active: active.id,
            });
        }
        if !active.active {
            return Err(EndBreakError::AlreadyEnded(break_id));
        }

        // Breaks are only created against a resolved type and the type
        // registry is append-only, so this lookup cannot miss for records
        // the service created itself.
        let Some(break_type) = self.store.break_type(active.break_type_id) else {
            tracing::warn!(break_id = %active.id, "active break references unknown type");
            return Err(EndBreakError::BreakNotFound(user_id));
        };

        let entry = self
            .store
            .update_break(active.id, |record| record.finish(now))
            .ok_or(EndBreakError::BreakNotFound(user_id))?;

        tracing::info!(
            break_id = %entry.id,
            user_id = %user_id,
            minutes = entry.duration_minutes.unwrap_or(0),
            "break ended",
        );
        let summary = self.daily_summary(user_id, entry.date);
        Ok(EndedBreak {
            entry,
            break_type,
            summary,
        })
    }

    /// Returns the user's active break with its type, if any.
    #[must_use]
    pub fn active_break(&self, user_id: UserId) -> Option<(Break, BreakType)> {
        let entry = self.store.active_break(user_id)?;
        let break_type = self.store.break_type(entry.break_type_id)?;
        Some((entry, break_type))
    }

    /// Computes the user's summary for a date.
    ///
    /// Derived on every call from the break records; an unknown user simply
    /// has no breaks and gets an all-zero summary.
    #[must_use]
    pub fn daily_summary(&self, user_id: UserId, date: NaiveDate) -> DailySummary {
        let break_types = self.store.break_types();
        let breaks = self.store.breaks_by_user_and_date(user_id, date);
        daily_summary(&break_types, &breaks, self.daily_budget_minutes)
    }

    /// Computes statistics for a department on a date.
    pub fn department_stats(
        &self,
        department_id: DepartmentId,
        date: NaiveDate,
    ) -> Result<DepartmentStats, DepartmentNotFound> {
        let department = self
            .store
            .department(department_id)
            .ok_or(DepartmentNotFound(department_id))?;
        let break_types = self.store.break_types();
        let employees: Vec<User> = self.store.users_in_department(department_id);
        let breaks = self.store.breaks_by_department_and_date(department_id, date);
        Ok(department_stats(
            &department,
            &break_types,
            &employees,
            &breaks,
            self.daily_budget_minutes,
        ))
    }

    /// Capacity snapshot for every break type, in creation order.
    ///
    /// A pure read: counts may be stale by the time the caller acts on
    /// them, which is why `start_break` re-checks under the type lock.
    #[must_use]
    pub fn availability(&self) -> Vec<BreakTypeAvailability> {
        let gate = CapacityGate::new(&self.store);
        self.store
            .break_types()
            .into_iter()
            .map(|break_type| BreakTypeAvailability {
                is_available: gate.can_admit(&break_type.code),
                current_count: gate.active_count(&break_type.code),
                limit: break_type.max_concurrent,
                break_type_id: break_type.id,
                code: break_type.code,
                name: break_type.name,
            })
            .collect()
    }

    /// The user's breaks for a date, latest first, each with its type.
    #[must_use]
    pub fn break_history(&self, user_id: UserId, date: NaiveDate) -> Vec<BreakHistoryEntry> {
        self.store
            .breaks_by_user_and_date(user_id, date)
            .into_iter()
            .map(|entry| {
                let break_type = self.store.break_type(entry.break_type_id);
                BreakHistoryEntry { entry, break_type }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use bb_core::{DEFAULT_DAILY_BUDGET_MINUTES, Limit};
    use bb_store::{NewBreakType, NewUser};

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, s).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn service() -> BreakService {
        let store = Arc::new(Store::new());
        store.create_break_type(NewBreakType {
            code: "tea1".to_string(),
            name: "Tea Break 1".to_string(),
            description: Some("Morning tea break".to_string()),
            icon: Some("coffee".to_string()),
            max_concurrent: Limit::Finite(3),
            duration_limit_minutes: Some(15),
        });
        store.create_break_type(NewBreakType {
            code: "bio".to_string(),
            name: "Bio Break".to_string(),
            description: None,
            icon: Some("user".to_string()),
            max_concurrent: Limit::Unlimited,
            duration_limit_minutes: Some(10),
        });
        BreakService::new(store, DEFAULT_DAILY_BUDGET_MINUTES)
    }

    fn add_user(service: &BreakService, username: &str) -> UserId {
        service
            .store()
            .create_user(NewUser {
                username: username.to_string(),
                password: "secret".to_string(),
                name: None,
                department_id: None,
            })
            .id
    }

    #[test]
    fn start_creates_active_break_dated_to_today() {
        let service = service();
        let user = add_user(&service, "jsmith");

        let started = service
            .start_break_on(user, "tea1", at(10, 0, 0), date())
            .unwrap();
        assert!(started.entry.active);
        assert_eq!(started.entry.start_time, Some(at(10, 0, 0)));
        assert_eq!(started.entry.date, date());
        assert_eq!(started.break_type.code, "tea1");
        assert!(service.active_break(user).is_some());
    }

    #[test]
    fn start_unknown_user_fails() {
        let service = service();
        let err = service.start_break(UserId::new(99), "tea1").unwrap_err();
        assert_eq!(err, StartBreakError::UserNotFound(UserId::new(99)));
    }

    #[test]
    fn start_unknown_type_fails() {
        let service = service();
        let user = add_user(&service, "jsmith");
        let err = service.start_break(user, "nap").unwrap_err();
        assert_eq!(err, StartBreakError::BreakTypeNotFound("nap".to_string()));
    }

    #[test]
    fn second_start_reports_the_conflicting_break() {
        let service = service();
        let user = add_user(&service, "jsmith");

        let first = service
            .start_break_on(user, "tea1", at(10, 0, 0), date())
            .unwrap();
        let err = service
            .start_break_on(user, "bio", at(10, 1, 0), date())
            .unwrap_err();
        match err {
            StartBreakError::AlreadyActive { current } => assert_eq!(current.id, first.entry.id),
            other => panic!("expected AlreadyActive, got {other:?}"),
        }
    }

    #[test]
    fn start_at_capacity_reports_count_and_limit() {
        let service = service();
        for name in ["a", "b", "c"] {
            let user = add_user(&service, name);
            service
                .start_break_on(user, "tea1", at(10, 0, 0), date())
                .unwrap();
        }

        let late = add_user(&service, "late");
        let err = service
            .start_break_on(late, "tea1", at(10, 5, 0), date())
            .unwrap_err();
        assert_eq!(
            err,
            StartBreakError::CapacityExceeded {
                code: "tea1".to_string(),
                current: 3,
                limit: Limit::Finite(3),
            }
        );
    }

    #[test]
    fn unlimited_type_admits_regardless_of_count() {
        let service = service();
        for i in 0..8 {
            let user = add_user(&service, &format!("user{i}"));
            service
                .start_break_on(user, "bio", at(10, 0, 0), date())
                .unwrap();
        }
        let one_more = add_user(&service, "extra");
        assert!(
            service
                .start_break_on(one_more, "bio", at(10, 0, 0), date())
                .is_ok()
        );
    }

    #[test]
    fn ending_a_slot_frees_capacity() {
        let service = service();
        let mut holders = Vec::new();
        for name in ["a", "b", "c"] {
            let user = add_user(&service, name);
            let started = service
                .start_break_on(user, "tea1", at(10, 0, 0), date())
                .unwrap();
            holders.push((user, started.entry.id));
        }
        let late = add_user(&service, "late");
        assert!(
            service
                .start_break_on(late, "tea1", at(10, 5, 0), date())
                .is_err()
        );

        let (user, break_id) = holders[0];
        service.end_break_at(break_id, user, at(10, 10, 0)).unwrap();
        assert!(
            service
                .start_break_on(late, "tea1", at(10, 11, 0), date())
                .is_ok()
        );
    }

    #[test]
    fn end_rounds_duration_up_and_returns_summary() {
        let service = service();
        let user = add_user(&service, "jsmith");
        let started = service
            .start_break_on(user, "tea1", at(10, 0, 0), date())
            .unwrap();

        // 14 minutes 30 seconds elapsed
        let ended = service
            .end_break_at(started.entry.id, user, at(10, 14, 30))
            .unwrap();
        assert_eq!(ended.entry.duration_minutes, Some(15));
        assert_eq!(ended.entry.end_time, Some(at(10, 14, 30)));
        assert!(!ended.entry.active);
        assert_eq!(ended.break_type.code, "tea1");
        assert_eq!(ended.summary.total_used, 15);
        assert_eq!(ended.summary.total_remaining, 55);
    }

    #[test]
    fn end_without_active_break_fails() {
        let service = service();
        let user = add_user(&service, "jsmith");
        let err = service.end_break(BreakId::new(1), user).unwrap_err();
        assert_eq!(err, EndBreakError::BreakNotFound(user));
    }

    #[test]
    fn end_targeting_a_different_break_is_rejected() {
        let service = service();
        let user = add_user(&service, "jsmith");
        let started = service
            .start_break_on(user, "tea1", at(10, 0, 0), date())
            .unwrap();

        let err = service
            .end_break_at(BreakId::new(999), user, at(10, 5, 0))
            .unwrap_err();
        assert_eq!(
            err,
            EndBreakError::InvalidTarget {
                requested: BreakId::new(999),
                active: started.entry.id,
            }
        );
        // The active break is untouched.
        assert!(service.active_break(user).is_some());
    }

    #[test]
    fn end_twice_fails_with_break_not_found() {
        let service = service();
        let user = add_user(&service, "jsmith");
        let started = service
            .start_break_on(user, "tea1", at(10, 0, 0), date())
            .unwrap();
        service
            .end_break_at(started.entry.id, user, at(10, 10, 0))
            .unwrap();

        // Once ended there is no active break left to target.
        let err = service
            .end_break_at(started.entry.id, user, at(10, 11, 0))
            .unwrap_err();
        assert_eq!(err, EndBreakError::BreakNotFound(user));
    }

    #[test]
    fn availability_lists_every_type_in_creation_order() {
        let service = service();
        let user = add_user(&service, "jsmith");
        service
            .start_break_on(user, "tea1", at(10, 0, 0), date())
            .unwrap();

        let availability = service.availability();
        assert_eq!(availability.len(), 2);
        assert_eq!(availability[0].code, "tea1");
        assert_eq!(availability[0].current_count, 1);
        assert_eq!(availability[0].limit, Limit::Finite(3));
        assert!(availability[0].is_available);
        assert_eq!(availability[1].code, "bio");
        assert!(availability[1].limit.is_unlimited());
    }

    #[test]
    fn history_pairs_breaks_with_types_latest_first() {
        let service = service();
        let user = add_user(&service, "jsmith");
        let first = service
            .start_break_on(user, "tea1", at(9, 0, 0), date())
            .unwrap();
        service
            .end_break_at(first.entry.id, user, at(9, 10, 0))
            .unwrap();
        let second = service
            .start_break_on(user, "bio", at(11, 0, 0), date())
            .unwrap();
        service
            .end_break_at(second.entry.id, user, at(11, 5, 0))
            .unwrap();

        let history = service.break_history(user, date());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].entry.id, second.entry.id);
        assert_eq!(
            history[0].break_type.as_ref().map(|t| t.code.as_str()),
            Some("bio")
        );
        assert_eq!(history[1].entry.id, first.entry.id);
    }

    #[test]
    fn summary_for_unknown_user_is_all_zero() {
        let service = service();
        let summary = service.daily_summary(UserId::new(42), date());
        assert_eq!(summary.total_used, 0);
        assert_eq!(summary.total_remaining, DEFAULT_DAILY_BUDGET_MINUTES);
        assert_eq!(summary.break_type_usage.len(), 2);
    }

    #[test]
    fn department_stats_unknown_department_fails() {
        let service = service();
        let err = service
            .department_stats(DepartmentId::new(7), date())
            .unwrap_err();
        assert_eq!(err, DepartmentNotFound(DepartmentId::new(7)));
    }
}
