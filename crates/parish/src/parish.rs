//! Parish entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::{DomainError, ParishId};

/// A parish. Name is unique across the directory (store invariant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parish {
    pub id: ParishId,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ParishDraft {
    pub name: String,
    pub address: Option<String>,
}

impl ParishDraft {
    pub fn new(name: impl AsRef<str>, address: Option<String>) -> Result<Self, DomainError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(DomainError::validation("parish name must be non-empty"));
        }
        Ok(Self {
            name: name.to_string(),
            address,
        })
    }

    pub fn into_parish(self, now: DateTime<Utc>) -> Parish {
        Parish {
            id: ParishId::new(),
            name: self.name,
            address: self.address,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `address: Some(None)` clears the address.
#[derive(Debug, Clone, Default)]
pub struct ParishChanges {
    pub name: Option<String>,
    pub address: Option<Option<String>>,
}

impl ParishChanges {
    pub fn new(name: Option<&str>, address: Option<Option<String>>) -> Result<Self, DomainError> {
        let name = match name {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation("parish name must be non-empty"));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        Ok(Self { name, address })
    }

    pub fn apply(self, parish: &mut Parish, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            parish.name = name;
        }
        if let Some(address) = self.address {
            parish.address = address;
        }
        parish.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_trims_and_rejects_blank_names() {
        assert_eq!(ParishDraft::new(" St. Brigid ", None).unwrap().name, "St. Brigid");
        assert!(ParishDraft::new("  ", None).is_err());
    }

    #[test]
    fn changes_can_clear_the_address() {
        let now = Utc::now();
        let mut parish = ParishDraft::new("St. Brigid", Some("1 Main St".into()))
            .unwrap()
            .into_parish(now);

        ParishChanges::new(None, Some(None)).unwrap().apply(&mut parish, now);
        assert_eq!(parish.address, None);
        assert_eq!(parish.name, "St. Brigid");
    }
}
