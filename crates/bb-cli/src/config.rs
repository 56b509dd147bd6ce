//! Configuration loading and management.
//!
//! Configuration carries the daily break budget and the reference data
//! seeded into the store at startup: departments, break types, and users.
//! The defaults match the reference deployment.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use bb_core::{DEFAULT_DAILY_BUDGET_MINUTES, Limit};

/// A department to create at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentSeed {
    pub name: String,
    pub code: String,
}

/// A break type to create at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakTypeSeed {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Omitted in the config file means unlimited.
    #[serde(default = "unlimited")]
    pub max_concurrent: Limit,
    #[serde(default)]
    pub duration_limit_minutes: Option<i64>,
}

const fn unlimited() -> Limit {
    Limit::Unlimited
}

/// A user to create at startup.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSeed {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Department code; unknown codes leave the user without a department.
    #[serde(default)]
    pub department: Option<String>,
}

impl fmt::Debug for UserSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSeed")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("department", &self.department)
            .finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Fixed daily break budget in minutes.
    pub daily_budget_minutes: i64,
    pub departments: Vec<DepartmentSeed>,
    pub break_types: Vec<BreakTypeSeed>,
    pub users: Vec<UserSeed>,
}

impl Default for Config {
    fn default() -> Self {
        let departments = [
            ("Engineering", "ENG"),
            ("Human Resources", "HR"),
            ("Marketing", "MKT"),
            ("Sales", "SLS"),
            ("Customer Support", "CS"),
        ]
        .map(|(name, code)| DepartmentSeed {
            name: name.to_string(),
            code: code.to_string(),
        })
        .to_vec();

        let break_type = |code: &str,
                          name: &str,
                          description: &str,
                          icon: &str,
                          max_concurrent: Limit,
                          duration_limit: i64| BreakTypeSeed {
            code: code.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            icon: Some(icon.to_string()),
            max_concurrent,
            duration_limit_minutes: Some(duration_limit),
        };
        let break_types = vec![
            break_type(
                "tea1",
                "Tea Break 1",
                "Morning tea break",
                "coffee",
                Limit::Finite(3),
                15,
            ),
            break_type(
                "tea2",
                "Tea Break 2",
                "Afternoon tea break",
                "coffee",
                Limit::Finite(3),
                15,
            ),
            break_type(
                "dinner",
                "Dinner Break",
                "Lunch/Dinner break",
                "utensils",
                Limit::Finite(5),
                30,
            ),
            break_type(
                "bio",
                "Bio Break",
                "Brief personal break",
                "user",
                Limit::Unlimited,
                10,
            ),
        ];

        let users = vec![UserSeed {
            username: "jsmith".to_string(),
            password: "password123".to_string(),
            name: Some("John Smith".to_string()),
            department: Some("ENG".to_string()),
        }];

        Self {
            daily_budget_minutes: DEFAULT_DAILY_BUDGET_MINUTES,
            departments,
            break_types,
            users,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BB_*)
        figment = figment.merge(Env::prefixed("BB_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for bb.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bb"))
}
