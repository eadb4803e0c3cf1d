//! One-shot initialization run at process start: the administrator and
//! manager accounts, their role memberships, and a small demo contact set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::contacts::{ContactStatus, ContactStore, NewContact};
use crate::identity::{Role, RoleNames};
use crate::security::UserStore;

pub const DEFAULT_ADMIN_USER: &str = "admin@contoso.com";
pub const DEFAULT_MANAGER_USER: &str = "manager@contoso.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub admin_username: String,
    pub manager_username: String,
    /// Shared password for both seeded accounts; `None` skips account seeding.
    #[serde(default, skip_serializing)]
    pub user_password: Option<String>,
    #[serde(default)]
    pub role_names: RoleNames,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            admin_username: DEFAULT_ADMIN_USER.to_string(),
            manager_username: DEFAULT_MANAGER_USER.to_string(),
            user_password: None,
            role_names: RoleNames::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_id: Option<String>,
    pub manager_id: Option<String>,
    pub contacts_created: usize,
}

fn demo_contacts() -> Vec<(NewContact, ContactStatus)> {
    vec![
        (
            NewContact {
                name: "Debra Garcia".into(),
                address: "1234 Main St".into(),
                city: "Redmond".into(),
                state: "WA".into(),
                zip: "10999".into(),
                email: "debra@example.com".into(),
            },
            ContactStatus::Approved,
        ),
        (
            NewContact {
                name: "John Doe".into(),
                address: "5678 Elm St".into(),
                city: "Seattle".into(),
                state: "WA".into(),
                zip: "98101".into(),
                email: "john.doe@example.com".into(),
            },
            ContactStatus::Rejected,
        ),
        (
            NewContact {
                name: "Jane Smith".into(),
                address: "9101 Maple Ave".into(),
                city: "Bellevue".into(),
                state: "WA".into(),
                zip: "98004".into(),
                email: "jane.smith@example.com".into(),
            },
            ContactStatus::Submitted,
        ),
    ]
}

fn ensure_user_with_role(users: &UserStore, username: &str, password: &str, role_name: &str) -> Result<String> {
    let id = users
        .ensure_user(username, password)
        .with_context(|| format!("while ensuring user '{}'", username))?;
    users
        .ensure_role(&id, role_name)
        .with_context(|| format!("while granting '{}' to '{}'", role_name, username))?;
    Ok(id)
}

/// Seed accounts and contacts. Safe to call on every start: existing users
/// are reused and contacts are only created in an empty store.
pub fn initialize(users: &UserStore, contacts: &dyn ContactStore, cfg: &SeedConfig) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let Some(pw) = cfg.user_password.as_deref() else {
        warn!(target: "startup", "no seed password configured (CONTACTS_SEED_USER_PW); skipping account and contact seeding");
        return Ok(report);
    };

    let admin_id = ensure_user_with_role(users, &cfg.admin_username, pw, cfg.role_names.name_of(Role::Administrator))?;
    let manager_id = ensure_user_with_role(users, &cfg.manager_username, pw, cfg.role_names.name_of(Role::Manager))?;

    if contacts.is_empty() {
        for (new, status) in demo_contacts() {
            contacts
                .insert_with_status(new, &admin_id, status)
                .context("while seeding demo contacts")?;
            report.contacts_created += 1;
        }
    }
    info!(target: "startup", "seed complete: admin={} manager={} contacts_created={}", admin_id, manager_id, report.contacts_created);

    report.admin_id = Some(admin_id);
    report.manager_id = Some(manager_id);
    Ok(report)
}
