use std::fmt::{Display, Formatter};
use std::str::FromStr;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub type ContactId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactStatus {
    Submitted,
    Approved,
    Rejected,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Submitted => "Submitted",
            ContactStatus::Approved => "Approved",
            ContactStatus::Rejected => "Rejected",
        }
    }
}

impl Display for ContactStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ContactStatus {
    type Err = AppError;

    /// Exact variant names (case-sensitive) or their numeric discriminants.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Submitted" | "0" => Ok(ContactStatus::Submitted),
            "Approved" | "1" => Ok(ContactStatus::Approved),
            "Rejected" | "2" => Ok(ContactStatus::Rejected),
            other => Err(AppError::user("invalid_status".to_string(), format!("invalid status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub contact_id: ContactId,
    /// User id of the account that submitted the contact.
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub email: String,
    pub status: ContactStatus,
}

/// Descriptive fields supplied when creating a contact. Ownership and status
/// are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub email: String,
}

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex")
});

impl NewContact {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::user("invalid_contact", "name is required"));
        }
        if self.email.trim().is_empty() {
            return Err(AppError::user("invalid_contact", "email is required"));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(AppError::user("invalid_contact".to_string(), format!("invalid email '{}'", self.email)));
        }
        Ok(())
    }

    pub fn into_contact(self, contact_id: ContactId, owner_id: &str, status: ContactStatus) -> Contact {
        Contact {
            contact_id,
            owner_id: owner_id.to_string(),
            name: self.name.trim().to_string(),
            address: self.address,
            city: self.city,
            state: self.state,
            zip: self.zip,
            email: self.email,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_names_and_discriminants() {
        assert_eq!("Approved".parse::<ContactStatus>().unwrap(), ContactStatus::Approved);
        assert_eq!("2".parse::<ContactStatus>().unwrap(), ContactStatus::Rejected);
        assert_eq!(" Submitted ".parse::<ContactStatus>().unwrap(), ContactStatus::Submitted);
        let err = "approved".parse::<ContactStatus>().unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!("Pending".parse::<ContactStatus>().is_err());
    }

    #[test]
    fn status_display_matches_wire_name() {
        assert_eq!(ContactStatus::Rejected.to_string(), "Rejected");
        assert_eq!(serde_json::to_string(&ContactStatus::Approved).unwrap(), "\"Approved\"");
    }

    #[test]
    fn new_contact_validation() {
        let ok = NewContact { name: "Jane".into(), email: "jane@example.com".into(), ..Default::default() };
        assert!(ok.validate().is_ok());
        let no_email = NewContact { name: "Jane".into(), ..Default::default() };
        let err = no_email.validate().unwrap_err();
        assert_eq!(err.message(), "email is required");
        let blank = NewContact { name: "  ".into(), ..Default::default() };
        assert!(blank.validate().is_err());
        let bad = NewContact { name: "Jane".into(), email: "jane.example.com".into(), ..Default::default() };
        assert!(bad.validate().is_err());
    }
}
