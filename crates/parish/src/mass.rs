//! Scheduled mass entity.
//!
//! Conflict detection for the calendar is out of scope here; a mass is plain
//! scheduled data tied to a parish.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::{DomainError, MassId, ParishId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mass {
    pub id: MassId,
    pub parish_id: ParishId,
    pub scheduled_at: DateTime<Utc>,
    pub celebrant: String,
    pub intention: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MassDraft {
    pub parish_id: ParishId,
    pub scheduled_at: DateTime<Utc>,
    pub celebrant: String,
    pub intention: Option<String>,
}

impl MassDraft {
    pub fn new(
        parish_id: ParishId,
        scheduled_at: DateTime<Utc>,
        celebrant: impl AsRef<str>,
        intention: Option<String>,
    ) -> Result<Self, DomainError> {
        let celebrant = celebrant.as_ref().trim();
        if celebrant.is_empty() {
            return Err(DomainError::validation("celebrant must be non-empty"));
        }
        Ok(Self {
            parish_id,
            scheduled_at,
            celebrant: celebrant.to_string(),
            intention,
        })
    }

    pub fn into_mass(self, now: DateTime<Utc>) -> Mass {
        Mass {
            id: MassId::new(),
            parish_id: self.parish_id,
            scheduled_at: self.scheduled_at,
            celebrant: self.celebrant,
            intention: self.intention,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MassChanges {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub celebrant: Option<String>,
    pub intention: Option<Option<String>>,
}

impl MassChanges {
    pub fn new(
        scheduled_at: Option<DateTime<Utc>>,
        celebrant: Option<&str>,
        intention: Option<Option<String>>,
    ) -> Result<Self, DomainError> {
        let celebrant = match celebrant {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation("celebrant must be non-empty"));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        Ok(Self {
            scheduled_at,
            celebrant,
            intention,
        })
    }

    pub fn apply(self, mass: &mut Mass, now: DateTime<Utc>) {
        if let Some(scheduled_at) = self.scheduled_at {
            mass.scheduled_at = scheduled_at;
        }
        if let Some(celebrant) = self.celebrant {
            mass.celebrant = celebrant;
        }
        if let Some(intention) = self.intention {
            mass.intention = intention;
        }
        mass.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_a_celebrant() {
        let err = MassDraft::new(ParishId::new(), Utc::now(), "  ", None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn changes_reschedule_without_touching_other_fields() {
        let now = Utc::now();
        let mut mass = MassDraft::new(ParishId::new(), now, "Fr. Byrne", Some("pro populo".into()))
            .unwrap()
            .into_mass(now);

        let later = now + chrono::Duration::days(1);
        MassChanges::new(Some(later), None, None).unwrap().apply(&mut mass, now);

        assert_eq!(mass.scheduled_at, later);
        assert_eq!(mass.celebrant, "Fr. Byrne");
        assert_eq!(mass.intention.as_deref(), Some("pro populo"));
    }
}
