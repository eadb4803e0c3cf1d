//! Server configuration from environment variables.
//! The server binary layers command-line flags on top of [`ServerConfig::from_env`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::identity::RoleNames;
use crate::seed::SeedConfig;

pub const DEFAULT_HTTP_PORT: u16 = 7878;
pub const DEFAULT_DATA_ROOT: &str = "data";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub data_root: PathBuf,
    pub session_ttl: Duration,
    pub role_names: RoleNames,
    pub seed: SeedConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: DEFAULT_HTTP_PORT,
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            role_names: RoleNames::default(),
            seed: SeedConfig::default(),
        }
    }
}

fn string_env(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl ServerConfig {
    /// Read `CONTACTS_*` variables, falling back to defaults for anything
    /// unset or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = ServerConfig::default();
        if let Some(port) = get("CONTACTS_HTTP_PORT").and_then(|v| v.parse::<u16>().ok()) {
            cfg.http_port = port;
        }
        if let Some(root) = get("CONTACTS_DATA_ROOT") {
            cfg.data_root = PathBuf::from(root);
        }
        if let Some(secs) = get("CONTACTS_SESSION_TTL_SECS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.session_ttl = Duration::from_secs(secs);
        }
        if let Some(name) = get("CONTACTS_ADMIN_ROLE") {
            cfg.role_names.administrators = name;
        }
        if let Some(name) = get("CONTACTS_MANAGER_ROLE") {
            cfg.role_names.managers = name;
        }
        if let Some(user) = get("CONTACTS_ADMIN_USER") {
            cfg.seed.admin_username = user;
        }
        if let Some(user) = get("CONTACTS_MANAGER_USER") {
            cfg.seed.manager_username = user;
        }
        // Passwords are taken verbatim
        cfg.seed.user_password = lookup("CONTACTS_SEED_USER_PW").filter(|v| !v.is_empty());
        cfg
    }

    /// Seed settings with the role names this server resolves.
    pub fn seed_config(&self) -> SeedConfig {
        SeedConfig { role_names: self.role_names.clone(), ..self.seed.clone() }
    }

    pub fn rust_log() -> String {
        string_env("RUST_LOG").unwrap_or_else(|| "<unset>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(cfg.data_root, PathBuf::from("data"));
        assert_eq!(cfg.role_names, RoleNames::default());
        assert!(cfg.seed.user_password.is_none());
    }

    #[test]
    fn env_overrides_and_bad_values() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("CONTACTS_HTTP_PORT", "not-a-port"),
            ("CONTACTS_DATA_ROOT", "/var/lib/contacts"),
            ("CONTACTS_SESSION_TTL_SECS", "120"),
            ("CONTACTS_MANAGER_ROLE", "Approvers"),
            ("CONTACTS_SEED_USER_PW", "Secr3t!pw"),
        ]));
        assert_eq!(cfg.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(cfg.data_root, PathBuf::from("/var/lib/contacts"));
        assert_eq!(cfg.session_ttl, Duration::from_secs(120));
        assert_eq!(cfg.role_names.managers, "Approvers");
        assert_eq!(cfg.seed_config().role_names.managers, "Approvers");
        assert_eq!(cfg.seed.user_password.as_deref(), Some("Secr3t!pw"));
    }
}
