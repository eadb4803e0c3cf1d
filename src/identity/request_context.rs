use super::Principal;

/// Per-request identity as seen by handlers. `principal` is `None` for
/// anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub session_token: Option<String>,
    pub request_id: Option<String>,
}
