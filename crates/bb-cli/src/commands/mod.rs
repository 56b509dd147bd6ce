//! CLI command implementations.

pub mod departments;
pub mod shell;
pub mod types;
