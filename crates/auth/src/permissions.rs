//! Permission maps: `resource -> set(action)`.
//!
//! Resources and actions are an open vocabulary — any non-empty string pair is
//! representable, so new resources can be protected without touching the
//! catalog schema. Shape validation happens at the write boundary (role
//! create/update); resolution assumes validated maps.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use vestry_core::DomainError;

/// The special token `*` meaning "all" when used as a resource or action.
pub const WILDCARD: &str = "*";

/// A role's granted permissions, keyed by resource name.
///
/// Serializes transparently as `{"resource": ["action", ...]}`, which is also
/// the persisted JSON shape. May be empty (the role grants nothing by itself).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<String, BTreeSet<String>>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a set of actions on a resource, unioning with anything already
    /// granted for that resource.
    pub fn grant<R, A>(mut self, resource: R, actions: impl IntoIterator<Item = A>) -> Self
    where
        R: Into<String>,
        A: Into<String>,
    {
        self.0
            .entry(resource.into())
            .or_default()
            .extend(actions.into_iter().map(Into::into));
        self
    }

    /// The `{"*": ["*"]}` map granting unconditional access.
    pub fn unrestricted() -> Self {
        Self::new().grant(WILDCARD, [WILDCARD])
    }

    /// Whether this map carries the global wildcard `{"*": ["*"]}`.
    ///
    /// A `*` resource key whose action set lacks `*` has no special meaning
    /// and is merged literally.
    pub fn grants_everything(&self) -> bool {
        self.0
            .get(WILDCARD)
            .is_some_and(|actions| actions.contains(WILDCARD))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn actions_for(&self, resource: &str) -> Option<&BTreeSet<String>> {
        self.0.get(resource)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.0.iter()
    }

    /// Union another map into this one (per-resource set union, deduplicated).
    pub fn merge(&mut self, other: &PermissionMap) {
        for (resource, actions) in other.iter() {
            self.0
                .entry(resource.clone())
                .or_default()
                .extend(actions.iter().cloned());
        }
    }

    /// Write-boundary shape validation: non-empty resource keys, non-empty
    /// action sets, non-empty action names.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (resource, actions) in &self.0 {
            if resource.trim().is_empty() {
                return Err(DomainError::validation("permission resource must be non-empty"));
            }
            if actions.is_empty() {
                return Err(DomainError::validation(format!(
                    "permission resource '{resource}' has an empty action set"
                )));
            }
            if actions.iter().any(|a| a.trim().is_empty()) {
                return Err(DomainError::validation(format!(
                    "permission resource '{resource}' has an empty action name"
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, BTreeSet<String>)> for PermissionMap {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
