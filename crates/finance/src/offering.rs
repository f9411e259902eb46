//! Collection offerings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::{DomainError, MassId, OfferingId, ParishId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionMethod {
    Cash,
    Check,
    Electronic,
}

/// One collected offering. Deletable — a mistaken entry is removed outright,
/// there is no reversal ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    pub id: OfferingId,
    pub parish_id: ParishId,
    pub mass_id: Option<MassId>,
    pub amount_cents: i64,
    pub method: CollectionMethod,
    pub collected_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OfferingDraft {
    pub parish_id: ParishId,
    pub mass_id: Option<MassId>,
    pub amount_cents: i64,
    pub method: CollectionMethod,
    pub collected_at: DateTime<Utc>,
}

impl OfferingDraft {
    pub fn new(
        parish_id: ParishId,
        mass_id: Option<MassId>,
        amount_cents: i64,
        method: CollectionMethod,
        collected_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if amount_cents <= 0 {
            return Err(DomainError::validation("offering amount must be positive"));
        }
        Ok(Self {
            parish_id,
            mass_id,
            amount_cents,
            method,
            collected_at,
        })
    }

    pub fn into_offering(self, now: DateTime<Utc>) -> Offering {
        Offering {
            id: OfferingId::new(),
            parish_id: self.parish_id,
            mass_id: self.mass_id,
            amount_cents: self.amount_cents,
            method: self.method,
            collected_at: self.collected_at,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [0, -100] {
            let err = OfferingDraft::new(
                ParishId::new(),
                None,
                amount,
                CollectionMethod::Cash,
                Utc::now(),
            )
            .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }
}
