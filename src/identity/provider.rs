use anyhow::{Result, anyhow};
use crate::tprintln;

use super::principal::{Attrs, Principal, RoleNames};
use super::session::{Session, SessionManager};
use crate::security::UserStore;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub ip: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub session: Session,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> Result<LoginResponse>;
}

/// Password login against the local user store. Stored role names are
/// resolved into roles here, once per session.
#[derive(Clone)]
pub struct LocalAuthProvider {
    pub users: UserStore,
    pub role_names: RoleNames,
    pub sm: SessionManager,
}

impl LocalAuthProvider {
    pub fn new(users: UserStore, role_names: RoleNames, sm: SessionManager) -> Self {
        Self { users, role_names, sm }
    }

    pub fn principal_for(&self, user_id: &str) -> Option<Principal> {
        let user = self.users.find_by_id(user_id)?;
        Some(Principal {
            user_id: user.user_id,
            username: user.username,
            roles: self.role_names.resolve(&user.roles),
            attrs: Attrs::default(),
        })
    }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> Result<LoginResponse> {
        let Some(user) = self.users.authenticate(&req.username, &req.password) else {
            return Err(anyhow!("invalid_credentials"));
        };
        let principal = Principal {
            roles: self.role_names.resolve(&user.roles),
            user_id: user.user_id,
            username: user.username,
            attrs: Attrs { ip: req.ip.clone() },
        };
        let session = self.sm.issue(principal)?;
        tprintln!("auth.login user={} sid={}", req.username, session.session_id);
        Ok(LoginResponse { session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    const PW: &str = "Passw0rd!";

    fn provider() -> LocalAuthProvider {
        LocalAuthProvider::new(UserStore::in_memory(), RoleNames::default(), SessionManager::default())
    }

    #[test]
    fn login_resolves_roles_and_issues_session() {
        let p = provider();
        let id = p.users.ensure_user("manager@contoso.com", PW).unwrap();
        p.users.ensure_role(&id, "ContactManagers").unwrap();
        p.users.ensure_role(&id, "Unrelated").unwrap();

        let req = LoginRequest { username: "manager@contoso.com".into(), password: PW.into(), ip: Some("10.0.0.1".into()) };
        let resp = p.login(&req).unwrap();
        assert_eq!(resp.session.principal.roles, vec![Role::Manager]);
        assert_eq!(resp.session.principal.attrs.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(p.sm.validate(&resp.session.token).map(|pr| pr.user_id), Some(id.clone()));
        assert_eq!(p.principal_for(&id).unwrap().roles, vec![Role::Manager]);
    }

    #[test]
    fn login_rejects_bad_password() {
        let p = provider();
        p.users.ensure_user("u@contoso.com", PW).unwrap();
        let req = LoginRequest { username: "u@contoso.com".into(), password: "bad".into(), ip: None };
        let err = p.login(&req).unwrap_err();
        assert_eq!(err.to_string(), "invalid_credentials");
    }
}
