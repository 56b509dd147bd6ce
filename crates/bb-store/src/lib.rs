//! In-memory record store for the break tracker.
//!
//! Keyed collections of [`Department`], [`User`], [`BreakType`], and
//! [`Break`] records with monotonically increasing identifiers. Pure
//! storage: lookups, scoped scans, and single-record updates, with no
//! business rules. Lifecycle and capacity invariants live in `bb-service`.
//!
//! # Thread Safety
//!
//! Each table sits behind its own `RwLock`, so readers of one table never
//! block writers of another. These locks only keep individual reads and
//! writes consistent; they are too fine-grained to make a check-then-act
//! sequence atomic. Callers that need "check and create" as one step must
//! bring their own critical section (see the lock tables in `bb-service`).
//!
//! State lives only as long as the process runs; there is no persistence.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, Utc};

use bb_core::{Break, BreakId, BreakType, BreakTypeId, Department, DepartmentId, Limit, User, UserId};

/// Fields for a department to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    pub name: String,
    pub code: String,
}

/// Fields for a user to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
    pub department_id: Option<DepartmentId>,
}

/// Fields for a break type to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBreakType {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub max_concurrent: Limit,
    pub duration_limit_minutes: Option<i64>,
}

/// Fields for a break to be created. The record always starts active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBreak {
    pub user_id: UserId,
    pub break_type_id: BreakTypeId,
    pub start_time: Option<DateTime<Utc>>,
    pub date: NaiveDate,
}

/// The in-memory record store.
///
/// Explicitly constructed and passed by reference; its lifetime is tied to
/// the owning process, never an ambient global.
#[derive(Debug, Default)]
pub struct Store {
    departments: RwLock<BTreeMap<DepartmentId, Department>>,
    users: RwLock<BTreeMap<UserId, User>>,
    break_types: RwLock<BTreeMap<BreakTypeId, BreakType>>,
    breaks: RwLock<BTreeMap<BreakId, Break>>,
    next_department_id: AtomicI64,
    next_user_id: AtomicI64,
    next_break_type_id: AtomicI64,
    next_break_id: AtomicI64,
}

// A poisoned table lock means a writer panicked mid-assignment; every write
// here is a single map insert, so the data is still consistent and the lock
// is safe to reclaim.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Store {
    /// Creates an empty store. Identifiers start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(counter: &AtomicI64) -> i64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    // ===== Departments =====

    /// Creates a department with a generated id.
    pub fn create_department(&self, new: NewDepartment) -> Department {
        let id = DepartmentId::new(Self::next_id(&self.next_department_id));
        let department = Department {
            id,
            name: new.name,
            code: new.code,
        };
        write(&self.departments).insert(id, department.clone());
        tracing::debug!(%id, code = %department.code, "department created");
        department
    }

    /// Returns all departments in creation order.
    #[must_use]
    pub fn departments(&self) -> Vec<Department> {
        read(&self.departments).values().cloned().collect()
    }

    #[must_use]
    pub fn department(&self, id: DepartmentId) -> Option<Department> {
        read(&self.departments).get(&id).cloned()
    }

    #[must_use]
    pub fn department_by_code(&self, code: &str) -> Option<Department> {
        read(&self.departments)
            .values()
            .find(|department| department.code == code)
            .cloned()
    }

    // ===== Users =====

    /// Creates a user with a generated id.
    ///
    /// The department reference is stored as given; it is never validated.
    pub fn create_user(&self, new: NewUser) -> User {
        let id = UserId::new(Self::next_id(&self.next_user_id));
        let user = User {
            id,
            username: new.username,
            password: new.password,
            name: new.name,
            department_id: new.department_id,
        };
        write(&self.users).insert(id, user.clone());
        tracing::debug!(%id, username = %user.username, "user created");
        user
    }

    /// Returns all users in creation order.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        read(&self.users).values().cloned().collect()
    }

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<User> {
        read(&self.users).get(&id).cloned()
    }

    #[must_use]
    pub fn user_by_username(&self, username: &str) -> Option<User> {
        read(&self.users)
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    /// Returns the users referencing the given department, in creation order.
    #[must_use]
    pub fn users_in_department(&self, department_id: DepartmentId) -> Vec<User> {
        read(&self.users)
            .values()
            .filter(|user| user.department_id == Some(department_id))
            .cloned()
            .collect()
    }

    // ===== Break types =====

    /// Creates a break type with a generated id.
    pub fn create_break_type(&self, new: NewBreakType) -> BreakType {
        let id = BreakTypeId::new(Self::next_id(&self.next_break_type_id));
        let break_type = BreakType {
            id,
            code: new.code,
            name: new.name,
            description: new.description,
            icon: new.icon,
            max_concurrent: new.max_concurrent,
            duration_limit_minutes: new.duration_limit_minutes,
        };
        write(&self.break_types).insert(id, break_type.clone());
        tracing::debug!(%id, code = %break_type.code, "break type created");
        break_type
    }

    /// Returns all break types in creation order.
    #[must_use]
    pub fn break_types(&self) -> Vec<BreakType> {
        read(&self.break_types).values().cloned().collect()
    }

    #[must_use]
    pub fn break_type(&self, id: BreakTypeId) -> Option<BreakType> {
        read(&self.break_types).get(&id).cloned()
    }

    #[must_use]
    pub fn break_type_by_code(&self, code: &str) -> Option<BreakType> {
        read(&self.break_types)
            .values()
            .find(|break_type| break_type.code == code)
            .cloned()
    }

    // ===== Breaks =====

    /// Creates a break record in the active state with a generated id.
    pub fn create_break(&self, new: NewBreak) -> Break {
        let id = BreakId::new(Self::next_id(&self.next_break_id));
        let entry = Break {
            id,
            user_id: new.user_id,
            break_type_id: new.break_type_id,
            start_time: new.start_time,
            end_time: None,
            duration_minutes: None,
            active: true,
            date: new.date,
        };
        write(&self.breaks).insert(id, entry.clone());
        tracing::debug!(%id, user_id = %entry.user_id, "break created");
        entry
    }

    /// Applies `update` to the break with the given id, in place.
    ///
    /// Returns the updated record, or `None` if the id is unknown.
    pub fn update_break(
        &self,
        id: BreakId,
        update: impl FnOnce(&mut Break),
    ) -> Option<Break> {
        let mut breaks = write(&self.breaks);
        let entry = breaks.get_mut(&id)?;
        update(entry);
        Some(entry.clone())
    }

    #[must_use]
    pub fn break_entry(&self, id: BreakId) -> Option<Break> {
        read(&self.breaks).get(&id).cloned()
    }

    /// Returns the user's active break, if any.
    #[must_use]
    pub fn active_break(&self, user_id: UserId) -> Option<Break> {
        read(&self.breaks)
            .values()
            .find(|entry| entry.user_id == user_id && entry.active)
            .cloned()
    }

    /// Counts currently active breaks of the given type.
    #[must_use]
    pub fn active_break_count(&self, break_type_id: BreakTypeId) -> usize {
        read(&self.breaks)
            .values()
            .filter(|entry| entry.break_type_id == break_type_id && entry.active)
            .count()
    }

    /// Returns the user's breaks for a date, latest start first.
    #[must_use]
    pub fn breaks_by_user_and_date(&self, user_id: UserId, date: NaiveDate) -> Vec<Break> {
        let mut entries: Vec<Break> = read(&self.breaks)
            .values()
            .filter(|entry| entry.user_id == user_id && entry.date == date)
            .cloned()
            .collect();
        sort_latest_first(&mut entries);
        entries
    }

    /// Returns breaks taken by any user of the department on a date,
    /// latest start first.
    #[must_use]
    pub fn breaks_by_department_and_date(
        &self,
        department_id: DepartmentId,
        date: NaiveDate,
    ) -> Vec<Break> {
        let user_ids: Vec<UserId> = self
            .users_in_department(department_id)
            .into_iter()
            .map(|user| user.id)
            .collect();
        let mut entries: Vec<Break> = read(&self.breaks)
            .values()
            .filter(|entry| user_ids.contains(&entry.user_id) && entry.date == date)
            .cloned()
            .collect();
        sort_latest_first(&mut entries);
        entries
    }
}

// Missing start times sort last. `None < Some(_)` under `Option`'s ordering,
// so a descending comparison on the option does both at once.
fn sort_latest_first(entries: &mut [Break]) {
    entries.sort_by(|a, b| b.start_time.cmp(&a.start_time));
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, h, m, 0).unwrap()
    }

    fn new_user(store: &Store, username: &str, department_id: Option<DepartmentId>) -> User {
        store.create_user(NewUser {
            username: username.to_string(),
            password: "secret".to_string(),
            name: None,
            department_id,
        })
    }

    fn new_break_type(store: &Store, code: &str, limit: Limit) -> BreakType {
        store.create_break_type(NewBreakType {
            code: code.to_string(),
            name: code.to_string(),
            description: None,
            icon: None,
            max_concurrent: limit,
            duration_limit_minutes: Some(15),
        })
    }

    fn new_break(store: &Store, user: &User, break_type: &BreakType, start: DateTime<Utc>) -> Break {
        store.create_break(NewBreak {
            user_id: user.id,
            break_type_id: break_type.id,
            start_time: Some(start),
            date: date(),
        })
    }

    #[test]
    fn ids_are_generated_monotonically() {
        let store = Store::new();
        let first = store.create_department(NewDepartment {
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
        });
        let second = store.create_department(NewDepartment {
            name: "Sales".to_string(),
            code: "SLS".to_string(),
        });
        assert_eq!(first.id.get(), 1);
        assert_eq!(second.id.get(), 2);
    }

    #[test]
    fn lookup_by_code_and_username() {
        let store = Store::new();
        let department = store.create_department(NewDepartment {
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
        });
        let user = new_user(&store, "jsmith", Some(department.id));

        assert_eq!(store.department_by_code("ENG"), Some(department));
        assert_eq!(store.department_by_code("HR"), None);
        assert_eq!(store.user_by_username("jsmith"), Some(user));
        assert_eq!(store.user_by_username("nobody"), None);
    }

    #[test]
    fn users_in_department_excludes_others() {
        let store = Store::new();
        let eng = store.create_department(NewDepartment {
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
        });
        let inside = new_user(&store, "in", Some(eng.id));
        new_user(&store, "out", None);
        new_user(&store, "elsewhere", Some(DepartmentId::new(99)));

        assert_eq!(store.users_in_department(eng.id), vec![inside]);
    }

    #[test]
    fn created_break_starts_active() {
        let store = Store::new();
        let user = new_user(&store, "jsmith", None);
        let tea = new_break_type(&store, "tea1", Limit::Finite(3));

        let entry = new_break(&store, &user, &tea, at(10, 0));
        assert!(entry.active);
        assert_eq!(entry.end_time, None);
        assert_eq!(entry.duration_minutes, None);
        assert_eq!(store.active_break(user.id), Some(entry));
    }

    #[test]
    fn update_break_mutates_in_place() {
        let store = Store::new();
        let user = new_user(&store, "jsmith", None);
        let tea = new_break_type(&store, "tea1", Limit::Finite(3));
        let entry = new_break(&store, &user, &tea, at(10, 0));

        let updated = store
            .update_break(entry.id, |record| record.finish(at(10, 10)))
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.duration_minutes, Some(10));
        assert_eq!(store.break_entry(entry.id), Some(updated));
        assert_eq!(store.active_break(user.id), None);
    }

    #[test]
    fn update_break_unknown_id_is_none() {
        let store = Store::new();
        assert!(store.update_break(BreakId::new(42), |_| {}).is_none());
    }

    #[test]
    fn active_count_tracks_only_active_entries_of_type() {
        let store = Store::new();
        let tea = new_break_type(&store, "tea1", Limit::Finite(3));
        let bio = new_break_type(&store, "bio", Limit::Unlimited);
        let alice = new_user(&store, "alice", None);
        let bob = new_user(&store, "bob", None);

        let finished = new_break(&store, &alice, &tea, at(9, 0));
        store
            .update_break(finished.id, |record| record.finish(at(9, 10)))
            .unwrap();
        new_break(&store, &alice, &tea, at(10, 0));
        new_break(&store, &bob, &bio, at(10, 0));

        assert_eq!(store.active_break_count(tea.id), 1);
        assert_eq!(store.active_break_count(bio.id), 1);
    }

    #[test]
    fn user_scan_is_scoped_to_date_and_sorted_latest_first() {
        let store = Store::new();
        let user = new_user(&store, "jsmith", None);
        let tea = new_break_type(&store, "tea1", Limit::Finite(3));

        let early = new_break(&store, &user, &tea, at(9, 0));
        store
            .update_break(early.id, |record| record.finish(at(9, 10)))
            .unwrap();
        let late = new_break(&store, &user, &tea, at(14, 0));
        store
            .update_break(late.id, |record| record.finish(at(14, 5)))
            .unwrap();
        store.create_break(NewBreak {
            user_id: user.id,
            break_type_id: tea.id,
            start_time: Some(at(11, 0)),
            date: NaiveDate::from_ymd_opt(2025, 3, 13).unwrap(),
        });

        let entries = store.breaks_by_user_and_date(user.id, date());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, late.id);
        assert_eq!(entries[1].id, early.id);
    }

    #[test]
    fn missing_start_time_sorts_last() {
        let store = Store::new();
        let user = new_user(&store, "jsmith", None);
        let tea = new_break_type(&store, "tea1", Limit::Finite(3));

        let unknown_start = store.create_break(NewBreak {
            user_id: user.id,
            break_type_id: tea.id,
            start_time: None,
            date: date(),
        });
        store
            .update_break(unknown_start.id, |record| record.finish(at(9, 0)))
            .unwrap();
        let timed = new_break(&store, &user, &tea, at(8, 0));

        let entries = store.breaks_by_user_and_date(user.id, date());
        assert_eq!(entries[0].id, timed.id);
        assert_eq!(entries[1].id, unknown_start.id);
    }

    #[test]
    fn department_scan_covers_only_member_breaks() {
        let store = Store::new();
        let eng = store.create_department(NewDepartment {
            name: "Engineering".to_string(),
            code: "ENG".to_string(),
        });
        let sales = store.create_department(NewDepartment {
            name: "Sales".to_string(),
            code: "SLS".to_string(),
        });
        let tea = new_break_type(&store, "tea1", Limit::Finite(3));
        let engineer = new_user(&store, "alice", Some(eng.id));
        let seller = new_user(&store, "bob", Some(sales.id));

        let kept = new_break(&store, &engineer, &tea, at(10, 0));
        new_break(&store, &seller, &tea, at(10, 0));

        let entries = store.breaks_by_department_and_date(eng.id, date());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, kept.id);
    }
}
