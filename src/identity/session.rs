use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::{Result, anyhow};
use parking_lot::RwLock;
use base64::Engine;
use crate::tprintln;

use super::principal::Principal;

pub type SessionToken = String;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: String,
    pub token: SessionToken,
    /// Per-session CSRF token echoed back in the `x-csrf-token` header.
    pub csrf: String,
    pub principal: Principal,
    pub issued_at: Instant,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
struct SessionTables {
    sessions: HashMap<String, Session>,
    user_index: HashMap<String, HashSet<String>>,
}

impl SessionTables {
    fn prune_expired(&mut self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        let sessions = &self.sessions;
        self.user_index.retain(|_, tokens| {
            tokens.retain(|tok| sessions.contains_key(tok));
            !tokens.is_empty()
        });
        before - self.sessions.len()
    }
}

pub(crate) fn gen_id() -> Result<String> {
    // 256-bit random token base64url without padding
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf).map_err(|e| anyhow!(e.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}

/// Issues and tracks session tokens. Cloning shares the same session table.
#[derive(Clone)]
pub struct SessionManager {
    pub ttl: Duration,
    tables: Arc<RwLock<SessionTables>>,
}

impl Default for SessionManager {
    fn default() -> Self { Self::with_ttl(Duration::from_secs(60 * 60)) }
}

impl SessionManager {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, tables: Arc::new(RwLock::new(SessionTables::default())) }
    }

    /// Issue a fresh session for `principal`. Expired sessions are swept first.
    pub fn issue(&self, principal: Principal) -> Result<Session> {
        let now = Instant::now();
        let sess = Session {
            session_id: gen_id()?,
            token: gen_id()?,
            csrf: gen_id()?,
            principal,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let swept = {
            let mut t = self.tables.write();
            let swept = t.prune_expired(now);
            t.sessions.insert(sess.token.clone(), sess.clone());
            t.user_index.entry(sess.principal.user_id.clone()).or_default().insert(sess.token.clone());
            swept
        };
        tprintln!("session.issue user={} sid={} ttl_secs={} swept={}", sess.principal.user_id, sess.session_id, self.ttl.as_secs(), swept);
        Ok(sess)
    }

    /// Number of sessions currently held, live or not yet swept.
    pub fn len(&self) -> usize { self.tables.read().sessions.len() }

    pub fn is_empty(&self) -> bool { self.tables.read().sessions.is_empty() }

    /// Look up a live session; expired entries are dropped on access.
    pub fn session(&self, token: &str) -> Option<Session> {
        let now = Instant::now();
        {
            let t = self.tables.read();
            match t.sessions.get(token) {
                Some(s) if s.expires_at > now => return Some(s.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.logout(token);
        None
    }

    pub fn validate(&self, token: &str) -> Option<Principal> {
        self.session(token).map(|s| s.principal)
    }

    pub fn check_csrf(&self, token: &str, provided: &str) -> bool {
        self.session(token).map(|s| s.csrf == provided).unwrap_or(false)
    }

    pub fn logout(&self, token: &str) -> bool {
        let mut t = self.tables.write();
        let Some(sess) = t.sessions.remove(token) else { return false; };
        let now_empty = match t.user_index.get_mut(&sess.principal.user_id) {
            Some(set) => { set.remove(token); set.is_empty() }
            None => false,
        };
        if now_empty { t.user_index.remove(&sess.principal.user_id); }
        true
    }

    pub fn revoke_user(&self, user_id: &str) -> usize {
        let mut t = self.tables.write();
        let tokens = t.user_index.remove(user_id).unwrap_or_default();
        let count = tokens.iter().filter(|tok| t.sessions.remove(*tok).is_some()).count();
        tprintln!("session.revoke user={} count={}", user_id, count);
        count
    }
}
