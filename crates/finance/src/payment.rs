//! Outbound payments with a small lifecycle: Pending → Completed | Voided.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::{DomainError, ParishId, PaymentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Voided,
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PaymentStatus::Pending => f.write_str("pending"),
            PaymentStatus::Completed => f.write_str("completed"),
            PaymentStatus::Voided => f.write_str("voided"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub parish_id: ParishId,
    pub payee: String,
    pub purpose: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Mark the payment completed. Only a pending payment can complete.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Pending {
            return Err(DomainError::validation(format!(
                "cannot complete a {} payment",
                self.status
            )));
        }
        self.status = PaymentStatus::Completed;
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Void the payment. A completed payment cannot be voided — money already
    /// left; corrections are a bookkeeping matter, not a status flip.
    pub fn void(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Voided;
                self.updated_at = now;
                Ok(())
            }
            PaymentStatus::Completed => {
                Err(DomainError::validation("cannot void a completed payment"))
            }
            PaymentStatus::Voided => Err(DomainError::validation("payment is already voided")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub parish_id: ParishId,
    pub payee: String,
    pub purpose: String,
    pub amount_cents: i64,
}

impl PaymentDraft {
    pub fn new(
        parish_id: ParishId,
        payee: impl AsRef<str>,
        purpose: impl AsRef<str>,
        amount_cents: i64,
    ) -> Result<Self, DomainError> {
        let payee = payee.as_ref().trim();
        if payee.is_empty() {
            return Err(DomainError::validation("payee must be non-empty"));
        }
        let purpose = purpose.as_ref().trim();
        if purpose.is_empty() {
            return Err(DomainError::validation("purpose must be non-empty"));
        }
        if amount_cents <= 0 {
            return Err(DomainError::validation("payment amount must be positive"));
        }
        Ok(Self {
            parish_id,
            payee: payee.to_string(),
            purpose: purpose.to_string(),
            amount_cents,
        })
    }

    pub fn into_payment(self, now: DateTime<Utc>) -> Payment {
        Payment {
            id: PaymentId::new(),
            parish_id: self.parish_id,
            payee: self.payee,
            purpose: self.purpose,
            amount_cents: self.amount_cents,
            status: PaymentStatus::Pending,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Payment {
        PaymentDraft::new(ParishId::new(), "Diocese", "assessment", 125_000)
            .unwrap()
            .into_payment(Utc::now())
    }

    #[test]
    fn complete_sets_paid_at() {
        let mut payment = pending();
        let now = Utc::now();
        payment.complete(now).unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.paid_at, Some(now));
    }

    #[test]
    fn a_completed_payment_cannot_be_voided() {
        let mut payment = pending();
        payment.complete(Utc::now()).unwrap();
        assert!(payment.void(Utc::now()).is_err());
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[test]
    fn voiding_twice_is_rejected() {
        let mut payment = pending();
        payment.void(Utc::now()).unwrap();
        assert!(payment.void(Utc::now()).is_err());
    }

    #[test]
    fn only_pending_payments_complete() {
        let mut payment = pending();
        payment.void(Utc::now()).unwrap();
        assert!(payment.complete(Utc::now()).is_err());
    }
}
