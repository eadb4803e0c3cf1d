//! Identity, sessions and contact authorization.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod request_context;
mod authorizer;

pub use principal::{Principal, Attrs, Role, RoleNames, DEFAULT_ADMINISTRATORS_ROLE, DEFAULT_MANAGERS_ROLE};
pub use session::{Session, SessionToken, SessionManager};
pub use provider::{AuthProvider, LocalAuthProvider, LoginRequest, LoginResponse};
pub use request_context::RequestContext;
pub use authorizer::{
    can_view, decide, managers_approve_or_reject, AuthContext, ContactAuthorizer, Decision, Operation, Rule,
    RuleOutcome, APPROVE_OPERATION_NAME, CREATE_OPERATION_NAME, DELETE_OPERATION_NAME, READ_OPERATION_NAME,
    REJECT_OPERATION_NAME, UPDATE_OPERATION_NAME,
};
