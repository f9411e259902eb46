//! Declared requirements: what an operation needs before it may run.
//!
//! Requirements are fixed at registration time (builder-populated registry in
//! the API layer) and never mutated at runtime.

use std::collections::BTreeSet;

use serde::Serialize;

/// How multiple required actions are evaluated against the effective set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMatch {
    /// Every declared action must be granted (the strict default).
    #[default]
    All,
    /// At least one declared action must be granted. Opt-in; a requirement
    /// never falls into this mode silently.
    Any,
}

/// A resource/action requirement attached to a protected operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessRequirement {
    pub resource: String,
    pub actions: BTreeSet<String>,
    pub mode: ActionMatch,
}

impl AccessRequirement {
    pub fn new<R, A>(resource: R, actions: impl IntoIterator<Item = A>) -> Self
    where
        R: Into<String>,
        A: Into<String>,
    {
        Self {
            resource: resource.into(),
            actions: actions.into_iter().map(Into::into).collect(),
            mode: ActionMatch::All,
        }
    }

    pub fn any_of<R, A>(resource: R, actions: impl IntoIterator<Item = A>) -> Self
    where
        R: Into<String>,
        A: Into<String>,
    {
        Self {
            mode: ActionMatch::Any,
            ..Self::new(resource, actions)
        }
    }

    pub fn read(resource: impl Into<String>) -> Self {
        Self::new(resource, ["read"])
    }

    pub fn write(resource: impl Into<String>) -> Self {
        Self::new(resource, ["write"])
    }

    pub fn delete(resource: impl Into<String>) -> Self {
        Self::new(resource, ["delete"])
    }

    /// Shorthand for the full read/write/delete triple. Sugar over the
    /// conjunctive rule, not a new semantic.
    pub fn manage(resource: impl Into<String>) -> Self {
        Self::new(resource, ["read", "write", "delete"])
    }
}

/// A coarse role-name requirement: the identity must currently hold at least
/// one of the named roles. Evaluated against the ledger, not the token hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRequirement {
    pub role_names: BTreeSet<String>,
}

impl RoleRequirement {
    pub fn any_of<N: Into<String>>(role_names: impl IntoIterator<Item = N>) -> Self {
        Self {
            role_names: role_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_satisfied_by<'a>(&self, held: impl IntoIterator<Item = &'a str>) -> bool {
        held.into_iter().any(|name| self.role_names.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manage_expands_to_the_full_action_triple() {
        let req = AccessRequirement::manage("roles");
        assert_eq!(req.resource, "roles");
        assert_eq!(req.mode, ActionMatch::All);
        let actions: Vec<_> = req.actions.iter().map(String::as_str).collect();
        assert_eq!(actions, vec!["delete", "read", "write"]);
    }

    #[test]
    fn verb_shorthands_declare_a_single_action() {
        for (req, action) in [
            (AccessRequirement::read("masses"), "read"),
            (AccessRequirement::write("masses"), "write"),
            (AccessRequirement::delete("masses"), "delete"),
        ] {
            assert_eq!(req.actions.len(), 1);
            assert!(req.actions.contains(action));
        }
    }

    #[test]
    fn role_requirement_matches_on_any_held_name() {
        let req = RoleRequirement::any_of(["administrator", "pastor"]);
        assert!(req.is_satisfied_by(["viewer", "pastor"]));
        assert!(!req.is_satisfied_by(["viewer"]));
        assert!(!req.is_satisfied_by([]));
    }
}
