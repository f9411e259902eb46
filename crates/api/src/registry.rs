//! Declarative requirement registry.
//!
//! One immutable table, built at startup, mapping `(method, route template)`
//! to what the operation requires. The gate consults it via `MatchedPath`;
//! absence of an entry means the operation is public. No runtime mutation,
//! no reflection.

use std::collections::HashMap;

use axum::http::Method;
use serde::Serialize;

use vestry_auth::{AccessRequirement, RoleRequirement};

/// What one registered operation requires. An entry with no permissions and
/// no role requirement still demands a verified identity.
#[derive(Debug, Clone, Default)]
pub struct OperationRequirements {
    pub permissions: Vec<AccessRequirement>,
    pub roles: Option<RoleRequirement>,
}

/// Serializable view of one registry entry (for the audit listing).
#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    pub method: String,
    pub path: String,
    pub permissions: Vec<AccessRequirement>,
    pub roles: Option<RoleRequirement>,
}

#[derive(Debug, Default)]
pub struct RequirementRegistry {
    entries: HashMap<Method, HashMap<String, OperationRequirements>>,
}

impl RequirementRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// `None` means the operation is public. Borrowed-key lookup; the gate
    /// calls this per request, so nothing is cloned or allocated here.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&OperationRequirements> {
        self.entries.get(method)?.get(path)
    }

    /// All registered operations, ordered by path then method.
    pub fn operations(&self) -> Vec<OperationSummary> {
        let mut ops: Vec<OperationSummary> = self
            .entries
            .iter()
            .flat_map(|(method, by_path)| {
                by_path.iter().map(move |(path, entry)| OperationSummary {
                    method: method.to_string(),
                    path: path.clone(),
                    permissions: entry.permissions.clone(),
                    roles: entry.roles.clone(),
                })
            })
            .collect();
        ops.sort_by(|a, b| a.path.cmp(&b.path).then_with(|| a.method.cmp(&b.method)));
        ops
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: HashMap<Method, HashMap<String, OperationRequirements>>,
}

impl RegistryBuilder {
    fn entry(&mut self, method: Method, path: &'static str) -> &mut OperationRequirements {
        self.entries
            .entry(method)
            .or_default()
            .entry(path.to_string())
            .or_default()
    }

    /// Require a verified identity but nothing further.
    pub fn authenticated(mut self, method: Method, path: &'static str) -> Self {
        self.entry(method, path);
        self
    }

    /// Attach a permission requirement. Composable: requirements on the same
    /// operation accumulate and must all pass.
    pub fn require(mut self, method: Method, path: &'static str, req: AccessRequirement) -> Self {
        self.entry(method, path).permissions.push(req);
        self
    }

    /// Attach a role-name requirement. A second call on the same operation
    /// unions the accepted names.
    pub fn require_role(mut self, method: Method, path: &'static str, req: RoleRequirement) -> Self {
        let entry = self.entry(method, path);
        match &mut entry.roles {
            Some(existing) => existing.role_names.extend(req.role_names),
            None => entry.roles = Some(req),
        }
        self
    }

    pub fn build(self) -> RequirementRegistry {
        RequirementRegistry {
            entries: self.entries,
        }
    }
}

/// The full operation table. `/health` is deliberately absent (public).
pub fn operation_requirements() -> RequirementRegistry {
    use AccessRequirement as P;

    RequirementRegistry::builder()
        .authenticated(Method::GET, "/whoami")
        .require_role(
            Method::GET,
            "/system/operations",
            RoleRequirement::any_of(["administrator"]),
        )
        // Role catalog
        .require(Method::POST, "/roles", P::write("roles"))
        .require(Method::GET, "/roles", P::read("roles"))
        .require(Method::GET, "/roles/:id", P::read("roles"))
        .require(Method::PATCH, "/roles/:id", P::write("roles"))
        // Deleting a role is destructive enough to demand both the manage
        // triple and the administrator role.
        .require(Method::DELETE, "/roles/:id", P::manage("roles"))
        .require_role(
            Method::DELETE,
            "/roles/:id",
            RoleRequirement::any_of(["administrator"]),
        )
        // Identity directory + assignment ledger
        .require(Method::POST, "/identities", P::write("identities"))
        .require(Method::GET, "/identities", P::read("identities"))
        .require(Method::GET, "/identities/:id", P::read("identities"))
        .require(Method::POST, "/identities/:id/deactivate", P::write("identities"))
        .require(Method::POST, "/identities/:id/activate", P::write("identities"))
        .require(Method::POST, "/identities/:id/roles", P::write("roles"))
        .require(Method::DELETE, "/identities/:id/roles/:role_id", P::write("roles"))
        .require(Method::GET, "/identities/:id/roles", P::read("roles"))
        .require(Method::GET, "/identities/:id/permissions", P::read("roles"))
        // Parishes
        .require(Method::POST, "/parishes", P::write("parishes"))
        .require(Method::GET, "/parishes", P::read("parishes"))
        .require(Method::GET, "/parishes/:id", P::read("parishes"))
        .require(Method::PATCH, "/parishes/:id", P::write("parishes"))
        // Masses
        .require(Method::POST, "/masses", P::write("masses"))
        .require(Method::GET, "/masses", P::read("masses"))
        .require(Method::GET, "/masses/:id", P::read("masses"))
        .require(Method::PATCH, "/masses/:id", P::write("masses"))
        .require(Method::DELETE, "/masses/:id", P::delete("masses"))
        // Offerings
        .require(Method::POST, "/offerings", P::write("offerings"))
        .require(Method::GET, "/offerings", P::read("offerings"))
        .require(Method::GET, "/offerings/:id", P::read("offerings"))
        .require(Method::DELETE, "/offerings/:id", P::delete("offerings"))
        // Contributions
        .require(Method::POST, "/contributions", P::write("contributions"))
        .require(Method::GET, "/contributions", P::read("contributions"))
        .require(Method::GET, "/contributions/:id", P::read("contributions"))
        // Payments
        .require(Method::POST, "/payments", P::write("payments"))
        .require(Method::GET, "/payments", P::read("payments"))
        .require(Method::GET, "/payments/:id", P::read("payments"))
        .require(Method::POST, "/payments/:id/complete", P::write("payments"))
        // Voiding needs both write and delete, conjunctively.
        .require(Method::POST, "/payments/:id/void", P::new("payments", ["write", "delete"]))
        // Reports
        .require(Method::GET, "/reports/finance", P::read("reports"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_operations_are_public() {
        let registry = operation_requirements();
        assert!(registry.lookup(&Method::GET, "/health").is_none());
        assert!(registry.lookup(&Method::GET, "/nope").is_none());
    }

    #[test]
    fn lookup_is_method_sensitive() {
        let registry = operation_requirements();
        assert!(registry.lookup(&Method::POST, "/roles").is_some());
        assert!(registry.lookup(&Method::PUT, "/roles").is_none());
    }

    #[test]
    fn lookup_accepts_runtime_path_strings() {
        // The gate hands us an owned matched-path string, not a literal.
        let registry = operation_requirements();
        let path = format!("/{}", "roles");
        assert!(registry.lookup(&Method::GET, &path).is_some());
    }

    #[test]
    fn authenticated_entries_carry_no_requirements() {
        let registry = operation_requirements();
        let entry = registry.lookup(&Method::GET, "/whoami").unwrap();
        assert!(entry.permissions.is_empty());
        assert!(entry.roles.is_none());
    }

    #[test]
    fn role_delete_composes_permissions_and_role_requirement() {
        let registry = operation_requirements();
        let entry = registry.lookup(&Method::DELETE, "/roles/:id").unwrap();

        // manage expands to the full triple ...
        assert_eq!(entry.permissions.len(), 1);
        let actions: Vec<_> = entry.permissions[0].actions.iter().map(String::as_str).collect();
        assert_eq!(actions, vec!["delete", "read", "write"]);

        // ... and the role requirement rides alongside.
        let roles = entry.roles.as_ref().unwrap();
        assert!(roles.role_names.contains("administrator"));
    }

    #[test]
    fn payment_void_requires_write_and_delete_conjunctively() {
        let registry = operation_requirements();
        let entry = registry.lookup(&Method::POST, "/payments/:id/void").unwrap();
        let req = &entry.permissions[0];
        assert_eq!(req.resource, "payments");
        assert!(req.actions.contains("write") && req.actions.contains("delete"));
        assert_eq!(req.mode, vestry_auth::ActionMatch::All);
    }

    #[test]
    fn require_role_twice_unions_the_accepted_names() {
        let registry = RequirementRegistry::builder()
            .require_role(Method::GET, "/x", RoleRequirement::any_of(["a"]))
            .require_role(Method::GET, "/x", RoleRequirement::any_of(["b"]))
            .build();
        let roles = registry.lookup(&Method::GET, "/x").unwrap().roles.as_ref().unwrap();
        assert!(roles.role_names.contains("a") && roles.role_names.contains("b"));
    }

    #[test]
    fn operations_listing_is_sorted_and_complete() {
        let registry = operation_requirements();
        let ops = registry.operations();
        assert_eq!(ops.len(), registry.len());
        assert!(ops.windows(2).all(|w| (&w[0].path, &w[0].method) <= (&w[1].path, &w[1].method)));
    }
}
