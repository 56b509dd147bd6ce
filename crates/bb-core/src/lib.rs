//! Core domain logic for the break tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Records: departments, users, break types, and break entries
//! - Lifecycle: the active → ended transition and duration rounding
//! - Aggregation: daily per-user summaries and per-department statistics

pub mod model;
pub mod summary;
pub mod types;

pub use model::{Break, BreakType, Department, User, rounded_minutes};
pub use summary::{
    BreakTypeStat, BreakTypeUsage, DEFAULT_DAILY_BUDGET_MINUTES, DailySummary, DepartmentStats,
    daily_summary, department_stats,
};
pub use types::{BreakId, BreakTypeId, DepartmentId, Limit, UserId};
