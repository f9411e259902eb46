//! Role catalog entities.
//!
//! A role is a named bundle of permissions assignable to identities. Drafts
//! and changes carry the write-boundary validation; the stored entity is
//! assumed well-shaped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_core::{DomainError, RoleId};

use crate::permissions::PermissionMap;

/// A validated role name: trimmed, non-empty, unique across the catalog
/// (uniqueness is the store's invariant, shape is ours).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("role name must be non-empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A role in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub description: Option<String>,
    pub permissions: PermissionMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a role.
#[derive(Debug, Clone)]
pub struct RoleDraft {
    pub name: RoleName,
    pub description: Option<String>,
    pub permissions: PermissionMap,
}

impl RoleDraft {
    pub fn new(
        name: impl AsRef<str>,
        description: Option<String>,
        permissions: PermissionMap,
    ) -> Result<Self, DomainError> {
        permissions.validate()?;
        Ok(Self {
            name: RoleName::new(name)?,
            description,
            permissions,
        })
    }

    /// Materialize the draft into a stored role with a fresh id.
    pub fn into_role(self, now: DateTime<Utc>) -> Role {
        Role {
            id: RoleId::new(),
            name: self.name,
            description: self.description,
            permissions: self.permissions,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated partial update for a role. `None` leaves a field untouched;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct RoleChanges {
    pub name: Option<RoleName>,
    pub description: Option<Option<String>>,
    pub permissions: Option<PermissionMap>,
}

impl RoleChanges {
    pub fn new(
        name: Option<&str>,
        description: Option<Option<String>>,
        permissions: Option<PermissionMap>,
    ) -> Result<Self, DomainError> {
        if let Some(map) = &permissions {
            map.validate()?;
        }
        Ok(Self {
            name: name.map(RoleName::new).transpose()?,
            description,
            permissions,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.permissions.is_none()
    }

    /// Apply onto an existing role, bumping `updated_at`.
    pub fn apply(self, role: &mut Role, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            role.name = name;
        }
        if let Some(description) = self.description {
            role.description = description;
        }
        if let Some(permissions) = self.permissions {
            role.permissions = permissions;
        }
        role.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_name_is_trimmed_and_nonempty() {
        assert_eq!(RoleName::new("  treasurer ").unwrap().as_str(), "treasurer");
        assert!(RoleName::new("   ").is_err());
    }

    #[test]
    fn draft_rejects_malformed_permission_maps() {
        let bad = PermissionMap::new().grant("", ["read"]);
        assert!(RoleDraft::new("treasurer", None, bad).is_err());
    }

    #[test]
    fn changes_apply_only_set_fields() {
        let now = Utc::now();
        let mut role = RoleDraft::new("secretary", Some("front office".into()), PermissionMap::new())
            .unwrap()
            .into_role(now);

        let changes = RoleChanges::new(
            None,
            Some(None),
            Some(PermissionMap::new().grant("masses", ["read"])),
        )
        .unwrap();
        let later = now + chrono::Duration::seconds(5);
        changes.apply(&mut role, later);

        assert_eq!(role.name.as_str(), "secretary");
        assert_eq!(role.description, None);
        assert!(role.permissions.actions_for("masses").is_some());
        assert_eq!(role.updated_at, later);
    }
}
