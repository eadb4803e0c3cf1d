//! User accounts, password hashing and role membership.
//!
//! Passwords are stored as Argon2 PHC strings. Role membership is stored as
//! plain role names; they are resolved into [`crate::identity::Role`] values
//! at login using the configured role names.

use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{SaltString, PasswordHash};
use tracing::info;

use crate::error::StoreError;
use crate::storage::{read_snapshot, write_snapshot};
use crate::system_paths::users_path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub roles: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum complexity for new accounts: length, a digit, both letter cases and
/// one non-alphanumeric character.
pub fn check_password_strength(password: &str) -> Result<()> {
    let strong = password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| !c.is_alphanumeric());
    if strong { Ok(()) } else { Err(anyhow!("the password is probably not strong enough")) }
}

/// Shared handle to the user table. Clones refer to the same users.
#[derive(Clone)]
pub struct UserStore {
    path: Option<PathBuf>,
    users: Arc<RwLock<Vec<UserRecord>>>,
}

impl UserStore {
    /// Open (or start) the user table under `data_root`.
    pub fn open(data_root: &Path) -> Result<Self> {
        let path = users_path(data_root);
        let users: Vec<UserRecord> = read_snapshot(&path)?.unwrap_or_default();
        info!(target: "contactmgr::security", "user store opened: path='{}' users={}", path.display(), users.len());
        Ok(Self { path: Some(path), users: Arc::new(RwLock::new(users)) })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self { path: None, users: Arc::new(RwLock::new(Vec::new())) }
    }

    pub fn len(&self) -> usize { self.users.read().len() }

    pub fn is_empty(&self) -> bool { self.users.read().is_empty() }

    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users.read().iter().find(|u| u.username.eq_ignore_ascii_case(username)).cloned()
    }

    pub fn find_by_id(&self, user_id: &str) -> Option<UserRecord> {
        self.users.read().iter().find(|u| u.user_id == user_id).cloned()
    }

    fn persist(&self, users: &[UserRecord]) -> Result<(), StoreError> {
        match &self.path {
            Some(p) => write_snapshot(p, users),
            None => Ok(()),
        }
    }

    /// Return the id of `username`, creating the account if it does not exist.
    pub fn ensure_user(&self, username: &str, password: &str) -> Result<String> {
        if let Some(existing) = self.find_by_username(username) {
            return Ok(existing.user_id);
        }
        check_password_strength(password)?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        let rec = UserRecord {
            user_id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            roles: Vec::new(),
            created_at: now_ms,
            updated_at: now_ms,
        };
        let mut users = self.users.write();
        // Another caller may have created it while we were hashing
        if let Some(existing) = users.iter().find(|u| u.username.eq_ignore_ascii_case(username)) {
            return Ok(existing.user_id.clone());
        }
        let id = rec.user_id.clone();
        users.push(rec);
        if let Err(e) = self.persist(&users) {
            users.pop();
            return Err(e.into());
        }
        info!(target: "contactmgr::security", "user created: username='{}' user_id={}", username, id);
        Ok(id)
    }

    /// Add `role` to the user's memberships. Adding a role the user already
    /// holds is a no-op.
    pub fn ensure_role(&self, user_id: &str, role: &str) -> Result<()> {
        let mut users = self.users.write();
        let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) else {
            return Err(StoreError::NotFound(format!("user {}", user_id)).into());
        };
        if user.roles.iter().any(|r| r == role) {
            return Ok(());
        }
        let prev_updated = user.updated_at;
        user.roles.push(role.to_string());
        user.updated_at = chrono::Utc::now().timestamp_millis();
        if let Err(e) = self.persist(&users) {
            if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
                user.roles.pop();
                user.updated_at = prev_updated;
            }
            return Err(e.into());
        }
        info!(target: "contactmgr::security", "role granted: user_id={} role='{}'", user_id, role);
        Ok(())
    }

    /// Verify credentials. Unknown users and wrong passwords both yield `None`.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<UserRecord> {
        let user = self.find_by_username(username)?;
        if verify_password(&user.password_hash, password) { Some(user) } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PW: &str = "Passw0rd!";

    #[test]
    fn password_strength_rules() {
        assert!(check_password_strength(PW).is_ok());
        assert!(check_password_strength("Pa0!").is_err());
        assert!(check_password_strength("password1!").is_err());
        assert!(check_password_strength("PASSWORD1!").is_err());
        assert!(check_password_strength("Password!!").is_err());
        assert!(check_password_strength("Password12").is_err());
    }

    #[test]
    fn hash_and_verify() {
        let phc = hash_password(PW).unwrap();
        assert!(phc.starts_with("$argon2"));
        assert!(verify_password(&phc, PW));
        assert!(!verify_password(&phc, "wrong"));
        assert!(!verify_password("not-a-phc", PW));
    }

    #[test]
    fn ensure_user_is_idempotent() {
        let store = UserStore::in_memory();
        let a = store.ensure_user("admin@contoso.com", PW).unwrap();
        let b = store.ensure_user("ADMIN@contoso.com", "ignored").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn weak_password_rejects_new_user() {
        let store = UserStore::in_memory();
        let err = store.ensure_user("weak@contoso.com", "abc").unwrap_err();
        assert!(err.to_string().contains("not strong enough"));
        assert!(store.is_empty());
    }

    #[test]
    fn ensure_role_adds_once_and_rejects_unknown_user() {
        let store = UserStore::in_memory();
        let id = store.ensure_user("manager@contoso.com", PW).unwrap();
        store.ensure_role(&id, "ContactManagers").unwrap();
        store.ensure_role(&id, "ContactManagers").unwrap();
        assert_eq!(store.find_by_id(&id).unwrap().roles, vec!["ContactManagers".to_string()]);
        assert!(store.ensure_role("nobody", "ContactManagers").is_err());
    }

    #[test]
    fn authenticate_checks_password() {
        let store = UserStore::in_memory();
        store.ensure_user("u@contoso.com", PW).unwrap();
        assert!(store.authenticate("u@contoso.com", PW).is_some());
        assert!(store.authenticate("u@contoso.com", "nope").is_none());
        assert!(store.authenticate("ghost@contoso.com", PW).is_none());
    }

    #[test]
    fn users_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let id = {
            let store = UserStore::open(tmp.path()).unwrap();
            let id = store.ensure_user("admin@contoso.com", PW).unwrap();
            store.ensure_role(&id, "ContactAdministrators").unwrap();
            id
        };
        let reopened = UserStore::open(tmp.path()).unwrap();
        let user = reopened.find_by_id(&id).unwrap();
        assert_eq!(user.roles, vec!["ContactAdministrators".to_string()]);
        assert!(reopened.authenticate("admin@contoso.com", PW).is_some());
    }

    #[test]
    fn failed_persist_rolls_back_users_and_roles() {
        let tmp = tempfile::tempdir().unwrap();
        let store = UserStore::open(tmp.path()).unwrap();
        let id = store.ensure_user("manager@contoso.com", PW).unwrap();
        let before = store.find_by_id(&id).unwrap();
        // A directory squatting on the tmp file name makes the write fail
        std::fs::create_dir_all(crate::system_paths::tmp_path_for(&users_path(tmp.path()))).unwrap();

        assert!(store.ensure_role(&id, "ContactManagers").is_err());
        assert_eq!(store.find_by_id(&id).unwrap(), before);

        assert!(store.ensure_user("admin@contoso.com", PW).is_err());
        assert!(store.find_by_username("admin@contoso.com").is_none());
        assert_eq!(store.len(), 1);
        // Still absent, so a retry tries to create it again
        assert!(store.ensure_user("admin@contoso.com", PW).is_err());
        assert_eq!(store.len(), 1);
    }
}
