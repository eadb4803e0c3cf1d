//! Resource-based authorization for contacts.
//!
//! A decision is the outcome of an ordered list of rules evaluated against a
//! shared [`AuthContext`]. Each rule either abstains or succeeds; nothing
//! actively denies. The pipeline succeeds iff some rule succeeds, so anything
//! no rule speaks for is refused by default.
//!
//! Only one rule ships today: managers may approve or reject any contact.
//! Ownership and visibility checks that page handlers combine with the
//! decision live in [`can_view`].

use std::fmt::{Display, Formatter};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::principal::{Principal, Role};
use crate::contacts::{Contact, ContactStatus};

pub const CREATE_OPERATION_NAME: &str = "Create";
pub const READ_OPERATION_NAME: &str = "Read";
pub const UPDATE_OPERATION_NAME: &str = "Update";
pub const DELETE_OPERATION_NAME: &str = "Delete";
pub const APPROVE_OPERATION_NAME: &str = "Approve";
pub const REJECT_OPERATION_NAME: &str = "Reject";

/// An action requested against a contact. Names outside the known set are
/// kept as `Unknown` so they can be refused rather than rejected as input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Approve,
    Reject,
    Unknown(String),
}

impl Operation {
    pub fn name(&self) -> &str {
        match self {
            Operation::Create => CREATE_OPERATION_NAME,
            Operation::Read => READ_OPERATION_NAME,
            Operation::Update => UPDATE_OPERATION_NAME,
            Operation::Delete => DELETE_OPERATION_NAME,
            Operation::Approve => APPROVE_OPERATION_NAME,
            Operation::Reject => REJECT_OPERATION_NAME,
            Operation::Unknown(name) => name.as_str(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            CREATE_OPERATION_NAME => Operation::Create,
            READ_OPERATION_NAME => Operation::Read,
            UPDATE_OPERATION_NAME => Operation::Update,
            DELETE_OPERATION_NAME => Operation::Delete,
            APPROVE_OPERATION_NAME => Operation::Approve,
            REJECT_OPERATION_NAME => Operation::Reject,
            other => Operation::Unknown(other.to_string()),
        }
    }

    /// The operation that moves a contact into `status`.
    pub fn for_status(status: ContactStatus) -> Self {
        if status == ContactStatus::Approved { Operation::Approve } else { Operation::Reject }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

impl From<String> for Operation {
    fn from(s: String) -> Self { Operation::from_name(&s) }
}

impl From<Operation> for String {
    fn from(op: Operation) -> Self { op.name().to_string() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Succeeded,
    NotSucceeded,
}

impl Decision {
    pub fn succeeded(&self) -> bool { matches!(self, Decision::Succeeded) }
}

/// What a single rule contributes to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Abstain,
    Succeed,
}

/// Everything a rule may inspect.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext<'a> {
    pub principal: &'a Principal,
    pub operation: &'a Operation,
    pub contact: &'a Contact,
}

pub type Rule = fn(&AuthContext<'_>) -> RuleOutcome;

/// Managers may approve or reject; the rule abstains for every other operation.
pub fn managers_approve_or_reject(ctx: &AuthContext<'_>) -> RuleOutcome {
    if !matches!(ctx.operation, Operation::Approve | Operation::Reject) {
        return RuleOutcome::Abstain;
    }
    if ctx.principal.is_in_role(Role::Manager) {
        RuleOutcome::Succeed
    } else {
        RuleOutcome::Abstain
    }
}

/// Ordered rule pipeline. Cheap to clone and safe to share between requests.
#[derive(Clone)]
pub struct ContactAuthorizer {
    rules: Vec<(&'static str, Rule)>,
}

impl Default for ContactAuthorizer {
    fn default() -> Self {
        Self::empty().with_rule("managers_approve_or_reject", managers_approve_or_reject)
    }
}

impl ContactAuthorizer {
    /// A pipeline with no rules refuses everything.
    pub fn empty() -> Self { Self { rules: Vec::new() } }

    pub fn with_rule(mut self, name: &'static str, rule: Rule) -> Self {
        self.rules.push((name, rule));
        self
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|(n, _)| *n)
    }

    pub fn decide(&self, principal: Option<&Principal>, operation: &Operation, contact: Option<&Contact>) -> Decision {
        let (Some(principal), Some(contact)) = (principal, contact) else {
            return Decision::NotSucceeded;
        };
        let ctx = AuthContext { principal, operation, contact };
        for (name, rule) in &self.rules {
            if rule(&ctx) == RuleOutcome::Succeed {
                debug!(target: "contactmgr::authz", "succeeded: rule={} user={} op={} contact={}", name, principal.user_id, operation, contact.contact_id);
                return Decision::Succeeded;
            }
        }
        debug!(target: "contactmgr::authz", "not succeeded: user={} op={} contact={}", principal.user_id, operation, contact.contact_id);
        Decision::NotSucceeded
    }
}

static DEFAULT_AUTHORIZER: Lazy<ContactAuthorizer> = Lazy::new(ContactAuthorizer::default);

/// Decide with the default rule set.
pub fn decide(principal: Option<&Principal>, operation: &Operation, contact: Option<&Contact>) -> Decision {
    DEFAULT_AUTHORIZER.decide(principal, operation, contact)
}

/// Visibility check handlers apply before showing a contact: managers and
/// administrators see everything, owners see their own, and approved
/// contacts are public.
pub fn can_view(principal: Option<&Principal>, contact: &Contact) -> bool {
    if contact.status == ContactStatus::Approved {
        return true;
    }
    let Some(p) = principal else { return false; };
    p.is_in_role(Role::Manager) || p.is_in_role(Role::Administrator) || p.user_id == contact.owner_id
}
