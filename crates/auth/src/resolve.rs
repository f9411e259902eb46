//! Effective-permission resolution and the admission decision rule.
//!
//! Resolution merges the permission maps of every role an identity currently
//! holds. It is pure: the caller fetches the maps (one joined read against the
//! ledger), this module computes. Nothing here is cached — every authorization
//! decision re-resolves so a revoked role can never keep granting.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::permissions::{PermissionMap, WILDCARD};
use crate::requirement::{AccessRequirement, ActionMatch};

/// The merged result of all permissions granted by an identity's roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectivePermissions {
    /// Global-wildcard sentinel: some role carried `{"*": ["*"]}`. Every
    /// check short-circuits to grant.
    Unrestricted,
    /// Per-resource union of every assigned role's grants. An identity with
    /// zero roles resolves to an empty scoped map.
    Scoped(PermissionMap),
}

/// Why a requirement was not satisfied. Carries enough for audit logging
/// without leaking anything secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionDenial {
    pub resource: String,
    pub missing_actions: BTreeSet<String>,
}

impl EffectivePermissions {
    /// Merge role permission maps into one effective set.
    ///
    /// Any map carrying the global wildcard terminates the merge immediately —
    /// an explicit, testable rule, not an optimization detail.
    pub fn resolve<'a>(maps: impl IntoIterator<Item = &'a PermissionMap>) -> Self {
        let mut merged = PermissionMap::new();
        for map in maps {
            if map.grants_everything() {
                return Self::Unrestricted;
            }
            merged.merge(map);
        }
        Self::Scoped(merged)
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Apply the decision rule for one requirement.
    ///
    /// - `Unrestricted` grants everything.
    /// - An undefined resource denies (all requested actions reported missing).
    /// - A resource-level `*` action grants every action on that resource.
    /// - Otherwise actions are matched per the requirement's [`ActionMatch`];
    ///   the default is conjunctive (every declared action must be present).
    pub fn check(&self, req: &AccessRequirement) -> Result<(), PermissionDenial> {
        let map = match self {
            Self::Unrestricted => return Ok(()),
            Self::Scoped(map) => map,
        };

        let Some(granted) = map.actions_for(&req.resource) else {
            return Err(PermissionDenial {
                resource: req.resource.clone(),
                missing_actions: req.actions.clone(),
            });
        };

        if granted.contains(WILDCARD) {
            return Ok(());
        }

        let missing: BTreeSet<String> = req
            .actions
            .iter()
            .filter(|a| !granted.contains(*a))
            .cloned()
            .collect();

        let satisfied = match req.mode {
            ActionMatch::All => missing.is_empty(),
            ActionMatch::Any => missing.len() < req.actions.len(),
        };

        if satisfied {
            Ok(())
        } else {
            Err(PermissionDenial {
                resource: req.resource.clone(),
                missing_actions: missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn treasurer() -> PermissionMap {
        PermissionMap::new()
            .grant("offerings", ["read", "write"])
            .grant("reports", ["read"])
    }

    #[test]
    fn zero_roles_deny_every_nonempty_requirement() {
        let effective = EffectivePermissions::resolve([]);
        assert_eq!(effective, EffectivePermissions::Scoped(PermissionMap::new()));

        let denial = effective.check(&AccessRequirement::read("offerings")).unwrap_err();
        assert_eq!(denial.resource, "offerings");
        assert!(denial.missing_actions.contains("read"));
    }

    #[test]
    fn global_wildcard_short_circuits_regardless_of_other_roles() {
        let maps = [treasurer(), PermissionMap::unrestricted()];
        let effective = EffectivePermissions::resolve(&maps);
        assert!(effective.is_unrestricted());

        // Any resource, any action.
        assert!(effective.check(&AccessRequirement::new("anything", ["obliterate"])).is_ok());
    }

    #[test]
    fn merge_is_a_per_resource_union() {
        let a = PermissionMap::new().grant("finances", ["read"]);
        let b = PermissionMap::new().grant("finances", ["write"]);
        let effective = EffectivePermissions::resolve([&a, &b]);

        // Neither role alone grants both.
        assert!(effective.check(&AccessRequirement::new("finances", ["read", "write"])).is_ok());
    }

    #[test]
    fn conjunctive_requirement_needs_every_declared_action() {
        let only_read = PermissionMap::new().grant("reports", ["read"]);
        let effective = EffectivePermissions::resolve([&only_read]);

        let req = AccessRequirement::new("reports", ["read", "write"]);
        let denial = effective.check(&req).unwrap_err();
        assert_eq!(denial.missing_actions.iter().collect::<Vec<_>>(), vec!["write"]);

        let both = PermissionMap::new().grant("reports", ["read", "write"]);
        assert!(EffectivePermissions::resolve([&both]).check(&req).is_ok());
    }

    #[test]
    fn any_of_mode_grants_on_a_single_satisfied_action() {
        let only_read = PermissionMap::new().grant("reports", ["read"]);
        let effective = EffectivePermissions::resolve([&only_read]);

        assert!(effective.check(&AccessRequirement::any_of("reports", ["read", "write"])).is_ok());
        assert!(effective.check(&AccessRequirement::any_of("reports", ["write", "delete"])).is_err());
    }

    #[test]
    fn resource_level_wildcard_grants_every_action_on_that_resource() {
        let map = PermissionMap::new().grant("masses", [WILDCARD]);
        let effective = EffectivePermissions::resolve([&map]);

        assert!(effective.check(&AccessRequirement::new("masses", ["read", "write", "delete"])).is_ok());
        // But only on that resource.
        assert!(effective.check(&AccessRequirement::read("parishes")).is_err());
    }

    #[test]
    fn partial_wildcard_resource_grants_nothing() {
        // `{"*": ["read"]}` is not the global wildcard and `*` is not a real
        // resource a requirement would name.
        let map = PermissionMap::new().grant(WILDCARD, ["read"]);
        let effective = EffectivePermissions::resolve([&map]);

        assert!(!effective.is_unrestricted());
        assert!(effective.check(&AccessRequirement::read("offerings")).is_err());
    }

    #[test]
    fn treasurer_scenario() {
        let effective = EffectivePermissions::resolve([&treasurer()]);

        assert!(effective.check(&AccessRequirement::write("offerings")).is_ok());

        let denial = effective.check(&AccessRequirement::delete("offerings")).unwrap_err();
        assert_eq!(denial.resource, "offerings");
        assert!(denial.missing_actions.contains("delete"));

        let denial = effective.check(&AccessRequirement::read("parishes")).unwrap_err();
        assert_eq!(denial.resource, "parishes");
        assert!(denial.missing_actions.contains("read"));
    }
}

#[cfg(test)]
mod properties {
    use std::collections::{BTreeMap, BTreeSet};

    use proptest::prelude::*;

    use super::*;

    fn arb_permission_map() -> impl Strategy<Value = PermissionMap> {
        let action = prop_oneof![
            Just("read".to_string()),
            Just("write".to_string()),
            Just("delete".to_string()),
            Just("approve".to_string()),
        ];
        let resource = prop_oneof![
            Just("offerings".to_string()),
            Just("reports".to_string()),
            Just("masses".to_string()),
            Just("parishes".to_string()),
        ];
        prop::collection::btree_map(
            resource,
            prop::collection::btree_set(action, 1..4),
            0..4,
        )
        .prop_map(|m: BTreeMap<String, BTreeSet<String>>| m.into_iter().collect())
    }

    proptest! {
        /// The merged set grants exactly the union of the per-role grants.
        #[test]
        fn merged_grants_are_exactly_the_union(maps in prop::collection::vec(arb_permission_map(), 0..5)) {
            let effective = EffectivePermissions::resolve(maps.iter());
            let EffectivePermissions::Scoped(merged) = &effective else {
                unreachable!("no generated map carries the global wildcard");
            };

            for map in &maps {
                for (resource, actions) in map.iter() {
                    for action in actions {
                        prop_assert!(merged.actions_for(resource).is_some_and(|a| a.contains(action)));
                    }
                }
            }
            for (resource, actions) in merged.iter() {
                for action in actions {
                    let granted_somewhere = maps.iter().any(|m| {
                        m.actions_for(resource).is_some_and(|a| a.contains(action))
                    });
                    prop_assert!(granted_somewhere);
                }
            }
        }

        /// Resolution is order-insensitive.
        #[test]
        fn merge_order_does_not_matter(maps in prop::collection::vec(arb_permission_map(), 0..5)) {
            let forward = EffectivePermissions::resolve(maps.iter());
            let reversed = EffectivePermissions::resolve(maps.iter().rev());
            prop_assert_eq!(forward, reversed);
        }

        /// One wildcard role dominates any combination of other roles.
        #[test]
        fn wildcard_dominates(mut maps in prop::collection::vec(arb_permission_map(), 0..5), at in 0usize..5) {
            let at = at.min(maps.len());
            maps.insert(at, PermissionMap::unrestricted());
            prop_assert!(EffectivePermissions::resolve(maps.iter()).is_unrestricted());
        }
    }
}
