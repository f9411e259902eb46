//! Identity directory entry.
//!
//! The verifier authenticates; this entity only anchors assignment referential
//! integrity and the administrative users surface. No credentials live here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::{DomainError, IdentityId};

/// Account status. Deactivated identities keep their assignments but are
/// rejected at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStatus {
    #[default]
    Active,
    Inactive,
}

impl core::fmt::Display for IdentityStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            IdentityStatus::Active => f.write_str("active"),
            IdentityStatus::Inactive => f.write_str("inactive"),
        }
    }
}

/// A known principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
    pub display_name: String,
    pub status: IdentityStatus,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }
}

/// Validated input for registering an identity.
#[derive(Debug, Clone)]
pub struct IdentityDraft {
    pub email: String,
    pub display_name: String,
}

impl IdentityDraft {
    pub fn new(email: impl AsRef<str>, display_name: impl AsRef<str>) -> Result<Self, DomainError> {
        let email = normalize_email(email.as_ref())?;
        let display_name = display_name.as_ref().trim();
        if display_name.is_empty() {
            return Err(DomainError::validation("display name must be non-empty"));
        }
        Ok(Self {
            email,
            display_name: display_name.to_string(),
        })
    }

    pub fn into_identity(self, now: DateTime<Utc>) -> Identity {
        Identity {
            id: IdentityId::new(),
            email: self.email,
            display_name: self.display_name,
            status: IdentityStatus::Active,
            created_at: now,
        }
    }
}

/// Lowercase + trim; the store enforces uniqueness on the normalized form.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(DomainError::validation(format!("invalid email: '{raw}'")));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_to_lowercase() {
        let draft = IdentityDraft::new("  Pastor@Parish.ORG ", "Fr. Byrne").unwrap();
        assert_eq!(draft.email, "pastor@parish.org");
    }

    #[test]
    fn rejects_blank_fields_and_bad_emails() {
        assert!(IdentityDraft::new("not-an-email", "Someone").is_err());
        assert!(IdentityDraft::new("a@b.org", "   ").is_err());
    }
}
