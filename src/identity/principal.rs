use serde::{Deserialize, Serialize};

/// Roles the authorization rules key on. Stored role names are resolved into
/// these once at login, so decisions never compare name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Manager,
}

pub const DEFAULT_ADMINISTRATORS_ROLE: &str = "ContactAdministrators";
pub const DEFAULT_MANAGERS_ROLE: &str = "ContactManagers";

/// Configured names of the two well-known roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleNames {
    pub administrators: String,
    pub managers: String,
}

impl Default for RoleNames {
    fn default() -> Self {
        Self {
            administrators: DEFAULT_ADMINISTRATORS_ROLE.to_string(),
            managers: DEFAULT_MANAGERS_ROLE.to_string(),
        }
    }
}

impl RoleNames {
    pub fn name_of(&self, role: Role) -> &str {
        match role {
            Role::Administrator => &self.administrators,
            Role::Manager => &self.managers,
        }
    }

    pub fn role_for(&self, name: &str) -> Option<Role> {
        if name == self.administrators {
            Some(Role::Administrator)
        } else if name == self.managers {
            Some(Role::Manager)
        } else {
            None
        }
    }

    /// Resolve stored role names; names that are not one of the configured
    /// roles are dropped.
    pub fn resolve<'a, I>(&self, names: I) -> Vec<Role>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut roles: Vec<Role> = names.into_iter().filter_map(|n| self.role_for(n)).collect();
        roles.sort();
        roles.dedup();
        roles
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attrs {
    #[serde(default)]
    pub ip: Option<String>,
}

/// An authenticated actor. Anonymous callers are represented by the absence
/// of a principal (`Option<Principal>`), never by an empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub attrs: Attrs,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, roles: Vec<Role>) -> Self {
        let user_id = user_id.into();
        Self { username: user_id.clone(), user_id, roles, attrs: Attrs::default() }
    }

    pub fn is_in_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
