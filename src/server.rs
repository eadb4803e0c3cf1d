//!
//! contactmgr HTTP server
//! ----------------------
//! Axum-based JSON API over the contact store.
//!
//! Responsibilities:
//! - Session management with a cookie + CSRF token model.
//! - Login/logout endpoints backed by the local user store.
//! - Contact listing, details, creation and the approve/reject status change,
//!   each gated by the contact authorizer and the visibility check.
//! - Startup: opening the stores and running the seed routine.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::contacts::{Contact, ContactId, ContactStatus, FileContactStore, NewContact, SharedContactStore};
use crate::error::{AppError, AppResult};
use crate::identity::{
    can_view, AuthProvider, ContactAuthorizer, LocalAuthProvider, LoginRequest, Operation, Principal, RequestContext,
    SessionManager,
};
use crate::security::UserStore;
use crate::seed;

pub const SESSION_COOKIE: &str = "contactmgr_session";
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub contacts: SharedContactStore,
    pub authz: ContactAuthorizer,
    pub auth: LocalAuthProvider,
}

impl AppState {
    pub fn new(users: UserStore, contacts: SharedContactStore, cfg: &ServerConfig) -> Self {
        let sm = SessionManager::with_ttl(cfg.session_ttl);
        Self {
            contacts,
            authz: ContactAuthorizer::default(),
            auth: LocalAuthProvider::new(users, cfg.role_names.clone(), sm),
        }
    }

    fn sessions(&self) -> &SessionManager { &self.auth.sm }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "contactmgr ok" }))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/csrf", get(get_csrf))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/{id}", get(contact_details))
        .route("/contacts/{id}/status", post(set_contact_status))
        .with_state(state)
}

/// Open the stores under the configured data root, seed them, and serve.
pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let root = cfg.data_root.clone();
    info!(target: "startup", "contactmgr starting: data_root='{}' http_port={} admin_role='{}' manager_role='{}'",
        root.display(), cfg.http_port, cfg.role_names.administrators, cfg.role_names.managers);

    std::fs::create_dir_all(&root)
        .with_context(|| format!("Failed to create or access data root: {}", root.display()))?;
    let users = UserStore::open(&root)
        .with_context(|| format!("While opening user store under: {}", root.display()))?;
    let contacts = FileContactStore::open(&root)
        .with_context(|| format!("While opening contact store under: {}", root.display()))?;
    let contacts: SharedContactStore = Arc::new(contacts);

    seed::initialize(&users, contacts.as_ref(), &cfg.seed_config()).context("While seeding accounts and contacts")?;

    let app = router(AppState::new(users, contacts, &cfg));
    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload { pub username: String, pub password: String }

#[derive(Debug, Deserialize)]
pub struct StatusPayload { pub status: String }

fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie")?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k == name { return Some(v.to_string()); }
        }
    }
    None
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    let fwd = headers.get("x-forwarded-for")?.to_str().ok()?;
    fwd.split(',').next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn set_session_cookie(token: &str) -> AppResult<HeaderValue> {
    // Secure, HttpOnly cookie scoped to path / with SameSite=Strict
    HeaderValue::from_str(&format!("{}={}; HttpOnly; Secure; SameSite=Strict; Path=/", SESSION_COOKIE, token))
        .map_err(|e| AppError::internal("internal_error".to_string(), e.to_string()))
}

fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("contactmgr_session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Strict; Path=/")
}

/// Resolve the caller. A missing or stale session yields an anonymous context.
pub fn request_context(state: &AppState, headers: &HeaderMap) -> RequestContext {
    let token = parse_cookie(headers, SESSION_COOKIE);
    let principal = token.as_deref().and_then(|t| state.sessions().validate(t));
    let request_id = headers.get("x-request-id").and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    RequestContext { principal, session_token: token, request_id }
}

fn require_principal(ctx: &RequestContext) -> AppResult<&Principal> {
    ctx.principal.as_ref().ok_or_else(|| AppError::auth("unauthorized", "login required"))
}

/// Unwrap a JSON body, turning axum's plain-text rejection into a JSON 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::user("invalid_input".to_string(), e.body_text()))
}

fn require_csrf(state: &AppState, ctx: &RequestContext, headers: &HeaderMap) -> AppResult<()> {
    let provided = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
    match (ctx.session_token.as_deref(), provided) {
        (Some(token), Some(csrf)) if state.sessions().check_csrf(token, csrf) => Ok(()),
        _ => Err(AppError::csrf("csrf", "invalid csrf")),
    }
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let payload = json_body(payload)?;
    let req = LoginRequest { username: payload.username, password: payload.password, ip: client_ip(&headers) };
    let resp = match state.auth.login(&req) {
        Ok(r) => r,
        Err(e) => {
            warn!(target: "contactmgr::auth", "login failed: user='{}' error={}", req.username, e);
            return Err(AppError::auth("unauthorized", "invalid credentials"));
        }
    };
    let session = resp.session;
    let mut out = HeaderMap::new();
    out.insert(SET_COOKIE, set_session_cookie(&session.token)?);
    info!(target: "contactmgr::auth", "login: user='{}' user_id={}", session.principal.username, session.principal.user_id);
    Ok((StatusCode::OK, out, Json(json!({
        "status": "ok",
        "user_id": session.principal.user_id,
        "roles": session.principal.roles,
    }))))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let ctx = request_context(&state, &headers);
    require_csrf(&state, &ctx, &headers)?;
    if let Some(token) = ctx.session_token.as_deref() {
        state.sessions().logout(token);
    }
    let mut h = HeaderMap::new();
    h.insert(SET_COOKIE, clear_session_cookie());
    Ok((StatusCode::OK, h, Json(json!({"status":"ok"}))))
}

async fn get_csrf(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let ctx = request_context(&state, &headers);
    require_principal(&ctx)?;
    let session = ctx.session_token.as_deref().and_then(|t| state.sessions().session(t));
    match session {
        Some(s) => Ok(Json(json!({"status":"ok","csrf": s.csrf}))),
        None => Err(AppError::auth("unauthorized", "session expired")),
    }
}

async fn list_contacts(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Json<serde_json::Value>> {
    let ctx = request_context(&state, &headers);
    let visible: Vec<Contact> = state
        .contacts
        .list()
        .into_iter()
        .filter(|c| can_view(ctx.principal.as_ref(), c))
        .collect();
    Ok(Json(json!({"status":"ok","contacts": visible})))
}

fn load_contact(state: &AppState, id: ContactId) -> AppResult<Contact> {
    state
        .contacts
        .get(id)
        .ok_or_else(|| AppError::not_found("not_found".to_string(), format!("contact {} not found", id)))
}

async fn contact_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
) -> AppResult<Json<serde_json::Value>> {
    let ctx = request_context(&state, &headers);
    let contact = load_contact(&state, id)?;
    let principal = ctx.principal.as_ref();
    if !can_view(principal, &contact) {
        return Err(AppError::forbidden("forbidden", "not permitted to view this contact"));
    }
    let allowed = |op: Operation| state.authz.decide(principal, &op, Some(&contact)).succeeded();
    let (can_approve, can_reject, can_edit) = (allowed(Operation::Approve), allowed(Operation::Reject), allowed(Operation::Update));
    Ok(Json(json!({
        "status": "ok",
        "contact": contact,
        "can_approve": can_approve,
        "can_reject": can_reject,
        "can_edit": can_edit,
    })))
}

async fn create_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewContact>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let ctx = request_context(&state, &headers);
    let principal = require_principal(&ctx)?;
    require_csrf(&state, &ctx, &headers)?;
    let payload = json_body(payload)?;
    payload.validate()?;
    let contact = state.contacts.insert(payload, &principal.user_id)?;
    info!(target: "contactmgr::contacts", "contact submitted: id={} owner={}", contact.contact_id, principal.user_id);
    Ok((StatusCode::CREATED, Json(json!({"status":"ok","contact": contact}))))
}

async fn set_contact_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<ContactId>,
    payload: Result<Json<StatusPayload>, JsonRejection>,
) -> AppResult<Json<serde_json::Value>> {
    let ctx = request_context(&state, &headers);
    let principal = require_principal(&ctx)?;
    require_csrf(&state, &ctx, &headers)?;
    let payload = json_body(payload)?;
    let status: ContactStatus = payload.status.parse()?;
    let contact = load_contact(&state, id)?;
    let op = Operation::for_status(status);
    if !state.authz.decide(Some(principal), &op, Some(&contact)).succeeded() {
        warn!(target: "contactmgr::authz", "forbidden: user={} op={} contact={} request_id={:?}", principal.user_id, op, id, ctx.request_id);
        return Err(AppError::forbidden("forbidden", "not permitted to change this contact's status"));
    }
    let updated = state.contacts.update_status(id, status)?;
    info!(target: "contactmgr::contacts", "status changed: id={} {} -> {} by={}", id, contact.status, updated.status, principal.user_id);
    Ok(Json(json!({"status":"ok","contact": updated})))
}
