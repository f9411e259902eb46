//! Catalog seeding and deployment bootstrap.
//!
//! A fresh store gets the stock roles; setting `VESTRY_BOOTSTRAP_ADMIN` to an
//! email ensures that identity exists and holds `administrator`, so a new
//! deployment has at least one principal who can manage the catalog.

use vestry_auth::{IdentityDraft, PermissionMap, RoleDraft};

use crate::error::{RepoResult, RepositoryError};
use crate::store::{IdentityStore, RoleAssignmentStore, RoleStore};

/// Name of the stock super role carrying `{"*": ["*"]}`.
pub const ADMINISTRATOR: &str = "administrator";

fn stock_roles() -> Vec<RoleDraft> {
    let drafts = [
        RoleDraft::new(
            ADMINISTRATOR,
            Some("unconditional access to every resource and action".into()),
            PermissionMap::unrestricted(),
        ),
        RoleDraft::new(
            "pastor",
            Some("full parish-life management, read access to finances".into()),
            PermissionMap::new()
                .grant("parishes", ["read", "write"])
                .grant("masses", ["read", "write", "delete"])
                .grant("identities", ["read"])
                .grant("offerings", ["read"])
                .grant("contributions", ["read"])
                .grant("payments", ["read"])
                .grant("reports", ["read"]),
        ),
        RoleDraft::new(
            "treasurer",
            Some("manages offerings, contributions and payments".into()),
            PermissionMap::new()
                .grant("offerings", ["read", "write", "delete"])
                .grant("contributions", ["read", "write"])
                .grant("payments", ["read", "write", "delete"])
                .grant("reports", ["read"])
                .grant("parishes", ["read"]),
        ),
        RoleDraft::new(
            "secretary",
            Some("front-office scheduling and directory reads".into()),
            PermissionMap::new()
                .grant("parishes", ["read"])
                .grant("masses", ["read", "write"])
                .grant("identities", ["read"]),
        ),
        RoleDraft::new(
            "viewer",
            Some("read-only access everywhere".into()),
            PermissionMap::new()
                .grant("parishes", ["read"])
                .grant("masses", ["read"])
                .grant("offerings", ["read"])
                .grant("contributions", ["read"])
                .grant("payments", ["read"])
                .grant("reports", ["read"]),
        ),
    ];
    drafts
        .into_iter()
        .map(|d| d.expect("stock role drafts are well-formed"))
        .collect()
}

/// Create the stock roles when the catalog is empty. Idempotent: a non-empty
/// catalog is left alone.
pub async fn seed_catalog(roles: &dyn RoleStore) -> RepoResult<()> {
    if !roles.list().await?.is_empty() {
        return Ok(());
    }
    for draft in stock_roles() {
        let name = draft.name.to_string();
        match roles.create(draft).await {
            Ok(_) => tracing::info!(role = %name, "seeded stock role"),
            // Lost a race with another instance seeding the same catalog.
            Err(RepositoryError::DuplicateName(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Ensure `email` exists as an identity and holds the administrator role.
pub async fn bootstrap_admin(
    identities: &dyn IdentityStore,
    assignments: &dyn RoleAssignmentStore,
    roles: &dyn RoleStore,
    email: &str,
) -> RepoResult<()> {
    let admin_role = roles
        .find_by_name(ADMINISTRATOR)
        .await?
        .ok_or(RepositoryError::NotFound("role"))?;

    let identity = match identities.find_by_email(email).await? {
        Some(identity) => identity,
        None => {
            let draft = IdentityDraft::new(email, "Bootstrap administrator")
                .map_err(|e| RepositoryError::Unavailable(format!("bad bootstrap email: {e}")))?;
            let identity = identities.create(draft).await?;
            tracing::info!(email, "created bootstrap administrator identity");
            identity
        }
    };

    match assignments.assign(identity.id, admin_role.id).await {
        Ok(_) => {
            tracing::info!(email, "granted administrator to bootstrap identity");
            Ok(())
        }
        Err(RepositoryError::AlreadyAssigned) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use vestry_auth::IdentityStatus;

    use crate::memory::InMemoryStore;

    use super::*;

    #[tokio::test]
    async fn seeding_twice_does_not_duplicate_roles() {
        let store = InMemoryStore::new();
        seed_catalog(&store).await.unwrap();
        let first = RoleStore::list(&store).await.unwrap().len();

        seed_catalog(&store).await.unwrap();
        assert_eq!(RoleStore::list(&store).await.unwrap().len(), first);
    }

    #[tokio::test]
    async fn administrator_carries_the_global_wildcard() {
        let store = InMemoryStore::new();
        seed_catalog(&store).await.unwrap();

        let admin = store.find_by_name(ADMINISTRATOR).await.unwrap().unwrap();
        assert!(admin.permissions.grants_everything());
    }

    #[tokio::test]
    async fn bootstrap_admin_is_idempotent() {
        let store = InMemoryStore::new();
        seed_catalog(&store).await.unwrap();

        bootstrap_admin(&store, &store, &store, "admin@parish.org").await.unwrap();
        bootstrap_admin(&store, &store, &store, "admin@parish.org").await.unwrap();

        let identity = store
            .find_by_email("admin@parish.org")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.status, IdentityStatus::Active);
        let held = store.roles_of(identity.id).await.unwrap();
        assert_eq!(held.len(), 1);
        assert_eq!(held[0].name.as_str(), ADMINISTRATOR);
    }
}
