//! Permission resolution service.
//!
//! Thin bridge between the pure merge in `vestry-auth` and the ledger: one
//! joined read per call, no caching. A request authorized after an assignment
//! change always sees the committed ledger (read-after-write through the
//! store's own transactional guarantees).

use std::sync::Arc;

use vestry_auth::{EffectivePermissions, Role};
use vestry_core::IdentityId;

use crate::error::RepoResult;
use crate::store::RoleAssignmentStore;

#[derive(Clone)]
pub struct PermissionResolver {
    assignments: Arc<dyn RoleAssignmentStore>,
}

impl PermissionResolver {
    pub fn new(assignments: Arc<dyn RoleAssignmentStore>) -> Self {
        Self { assignments }
    }

    /// The roles the identity currently holds.
    pub async fn assigned_roles(&self, identity_id: IdentityId) -> RepoResult<Vec<Role>> {
        self.assignments.roles_of(identity_id).await
    }

    /// Resolve the identity's effective permission set from the current
    /// ledger. Recomputed per call.
    pub async fn effective_permissions(
        &self,
        identity_id: IdentityId,
    ) -> RepoResult<EffectivePermissions> {
        let roles = self.assignments.roles_of(identity_id).await?;
        let effective = EffectivePermissions::resolve(roles.iter().map(|r| &r.permissions));
        tracing::trace!(
            identity = %identity_id,
            roles = roles.len(),
            unrestricted = effective.is_unrestricted(),
            "resolved effective permissions"
        );
        Ok(effective)
    }
}
