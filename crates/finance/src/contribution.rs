//! Pledged contributions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::{ContributionId, DomainError, ParishId};

/// Fund name used when a contribution does not name one.
pub const DEFAULT_FUND: &str = "general";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: ContributionId,
    pub parish_id: ParishId,
    pub contributor: String,
    pub fund: String,
    pub amount_cents: i64,
    pub contributed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ContributionDraft {
    pub parish_id: ParishId,
    pub contributor: String,
    pub fund: String,
    pub amount_cents: i64,
    pub contributed_at: DateTime<Utc>,
}

impl ContributionDraft {
    pub fn new(
        parish_id: ParishId,
        contributor: impl AsRef<str>,
        fund: Option<String>,
        amount_cents: i64,
        contributed_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let contributor = contributor.as_ref().trim();
        if contributor.is_empty() {
            return Err(DomainError::validation("contributor must be non-empty"));
        }
        if amount_cents <= 0 {
            return Err(DomainError::validation("contribution amount must be positive"));
        }
        let fund = match fund {
            Some(f) if !f.trim().is_empty() => f.trim().to_string(),
            _ => DEFAULT_FUND.to_string(),
        };
        Ok(Self {
            parish_id,
            contributor: contributor.to_string(),
            fund,
            amount_cents,
            contributed_at,
        })
    }

    pub fn into_contribution(self, now: DateTime<Utc>) -> Contribution {
        Contribution {
            id: ContributionId::new(),
            parish_id: self.parish_id,
            contributor: self.contributor,
            fund: self.fund,
            amount_cents: self.amount_cents,
            contributed_at: self.contributed_at,
            created_at: now,
        }
    }
}
