//! Builds the in-memory store and service from configuration.

use std::sync::Arc;

use bb_service::BreakService;
use bb_store::{NewBreakType, NewDepartment, NewUser, Store};

use crate::config::Config;

/// Creates a fresh store, seeds the configured reference data, and wraps it
/// in a service.
///
/// Departments are created first so user seeds can reference them by code.
/// A user naming an unknown department keeps no department reference; that
/// is a weak link by design, so it only warrants a warning.
#[must_use]
pub fn build_service(config: &Config) -> BreakService {
    let store = Arc::new(Store::new());

    for department in &config.departments {
        store.create_department(NewDepartment {
            name: department.name.clone(),
            code: department.code.clone(),
        });
    }

    for break_type in &config.break_types {
        store.create_break_type(NewBreakType {
            code: break_type.code.clone(),
            name: break_type.name.clone(),
            description: break_type.description.clone(),
            icon: break_type.icon.clone(),
            max_concurrent: break_type.max_concurrent,
            duration_limit_minutes: break_type.duration_limit_minutes,
        });
    }

    for user in &config.users {
        let department_id = user.department.as_deref().and_then(|code| {
            let found = store.department_by_code(code);
            if found.is_none() {
                tracing::warn!(
                    username = %user.username,
                    code,
                    "user references unknown department",
                );
            }
            found.map(|department| department.id)
        });
        store.create_user(NewUser {
            username: user.username.clone(),
            password: user.password.clone(),
            name: user.name.clone(),
            department_id,
        });
    }

    tracing::info!(
        departments = config.departments.len(),
        break_types = config.break_types.len(),
        users = config.users.len(),
        budget = config.daily_budget_minutes,
        "store seeded",
    );
    BreakService::new(store, config.daily_budget_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserSeed;

    #[test]
    fn default_config_seeds_reference_data() {
        let service = build_service(&Config::default());
        let store = service.store();

        assert_eq!(store.departments().len(), 5);
        assert_eq!(store.break_types().len(), 4);
        let jsmith = store.user_by_username("jsmith").unwrap();
        let engineering = store.department_by_code("ENG").unwrap();
        assert_eq!(jsmith.department_id, Some(engineering.id));
        assert_eq!(service.daily_budget_minutes(), 70);
    }

    #[test]
    fn unknown_department_code_leaves_user_unassigned() {
        let mut config = Config::default();
        config.users.push(UserSeed {
            username: "lost".to_string(),
            password: "secret".to_string(),
            name: None,
            department: Some("NOPE".to_string()),
        });

        let service = build_service(&config);
        let lost = service.store().user_by_username("lost").unwrap();
        assert_eq!(lost.department_id, None);
    }

    #[test]
    fn break_type_creation_order_follows_config_order() {
        let service = build_service(&Config::default());
        let codes: Vec<String> = service
            .store()
            .break_types()
            .into_iter()
            .map(|break_type| break_type.code)
            .collect();
        assert_eq!(codes, ["tea1", "tea2", "dinner", "bio"]);
    }
}
