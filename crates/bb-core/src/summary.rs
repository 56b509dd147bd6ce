//! Aggregation engine for daily summaries and department statistics.
//!
//! Aggregates are derived, never stored: every function here is a pure scan
//! over break records the caller has already scoped to a user or department
//! and a calendar date. Active breaks carry no duration yet and therefore
//! contribute zero minutes until ended.

use serde::{Deserialize, Serialize};

use crate::model::{Break, BreakType, Department, User};
use crate::types::{BreakTypeId, DepartmentId, UserId};

/// Fixed daily break budget in minutes for the reference deployment.
pub const DEFAULT_DAILY_BUDGET_MINUTES: i64 = 70;

/// Per-type usage within a [`DailySummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakTypeUsage {
    pub break_type_id: BreakTypeId,
    pub code: String,
    pub name: String,
    /// Minutes spent on this type for the day.
    pub duration_used: i64,
    /// The type's configured expected length, 0 when unset.
    pub duration_limit: i64,
    pub icon: String,
}

/// A user's break usage for a single day.
///
/// Exactly one of `total_remaining` and `total_exceeded` is positive, or both
/// are zero when usage lands exactly on the budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub total_used: i64,
    pub total_remaining: i64,
    pub total_exceeded: i64,
    /// One entry per known break type, in break-type creation order,
    /// including types the user never used.
    pub break_type_usage: Vec<BreakTypeUsage>,
}

/// Per-type usage within a [`DepartmentStats`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakTypeStat {
    pub break_type_id: BreakTypeId,
    pub break_type_name: String,
    pub total_usage: i64,
    pub average_usage: f64,
}

/// Break statistics for a department on a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentStats {
    pub department_id: DepartmentId,
    pub department_name: String,
    pub department_code: String,
    pub employee_count: usize,
    pub total_break_minutes: i64,
    /// Minutes per employee, 0 when the department is empty.
    pub average_break_minutes: f64,
    /// Distinct users whose total for the day exceeds the budget.
    pub exceeded_count: usize,
    pub break_type_stats: Vec<BreakTypeStat>,
}

fn minutes_of(entry: &Break) -> i64 {
    entry.duration_minutes.unwrap_or(0)
}

/// Computes a user's daily summary from their breaks for one date.
///
/// `break_types` must be every known type in creation order; `user_breaks`
/// must already be scoped to the user and date, active or ended.
#[must_use]
pub fn daily_summary(
    break_types: &[BreakType],
    user_breaks: &[Break],
    budget_minutes: i64,
) -> DailySummary {
    let mut total_used = 0;
    let break_type_usage = break_types
        .iter()
        .map(|break_type| {
            let duration_used: i64 = user_breaks
                .iter()
                .filter(|entry| entry.break_type_id == break_type.id)
                .map(minutes_of)
                .sum();
            total_used += duration_used;
            BreakTypeUsage {
                break_type_id: break_type.id,
                code: break_type.code.clone(),
                name: break_type.name.clone(),
                duration_used,
                duration_limit: break_type.duration_limit_minutes.unwrap_or(0),
                icon: break_type.icon.clone().unwrap_or_default(),
            }
        })
        .collect();

    DailySummary {
        total_used,
        total_remaining: (budget_minutes - total_used).max(0),
        total_exceeded: (total_used - budget_minutes).max(0),
        break_type_usage,
    }
}

/// Computes department statistics from the department's breaks for one date.
///
/// `employees` is every user in the department and `department_breaks` every
/// break belonging to one of them on the date. The exceeded count groups the
/// gathered breaks per user directly rather than re-running
/// [`daily_summary`] per employee over the same records.
#[must_use]
pub fn department_stats(
    department: &Department,
    break_types: &[BreakType],
    employees: &[User],
    department_breaks: &[Break],
    budget_minutes: i64,
) -> DepartmentStats {
    let employee_count = employees.len();
    let total_break_minutes: i64 = department_breaks.iter().map(minutes_of).sum();
    let average_break_minutes = if employee_count > 0 {
        total_break_minutes as f64 / employee_count as f64
    } else {
        0.0
    };

    let mut per_user: Vec<(UserId, i64)> = Vec::new();
    for entry in department_breaks {
        match per_user.iter_mut().find(|(id, _)| *id == entry.user_id) {
            Some((_, total)) => *total += minutes_of(entry),
            None => per_user.push((entry.user_id, minutes_of(entry))),
        }
    }
    let exceeded_count = per_user
        .iter()
        .filter(|(_, total)| *total > budget_minutes)
        .count();

    let break_type_stats = break_types
        .iter()
        .map(|break_type| {
            let total_usage: i64 = department_breaks
                .iter()
                .filter(|entry| entry.break_type_id == break_type.id)
                .map(minutes_of)
                .sum();
            let average_usage = if employee_count > 0 {
                total_usage as f64 / employee_count as f64
            } else {
                0.0
            };
            BreakTypeStat {
                break_type_id: break_type.id,
                break_type_name: break_type.name.clone(),
                total_usage,
                average_usage,
            }
        })
        .collect();

    DepartmentStats {
        department_id: department.id,
        department_name: department.name.clone(),
        department_code: department.code.clone(),
        employee_count,
        total_break_minutes,
        average_break_minutes,
        exceeded_count,
        break_type_stats,
    }
}
