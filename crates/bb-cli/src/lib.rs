//! Break tracker CLI library.
//!
//! This crate provides the `bb` command-line front end for the break
//! admission and accounting service.

mod cli;
pub mod commands;
mod config;
mod seed;

pub use cli::{Cli, Commands};
pub use config::{BreakTypeSeed, Config, DepartmentSeed, UserSeed};
pub use seed::build_service;
