//! Store traits shared by the in-memory and Postgres backends.
//!
//! Mutations are individually atomic at the store level (single row or one
//! cascading transaction). Reads always re-fetch current state; nothing here
//! caches, so a committed assignment change is visible to the next read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vestry_auth::{Identity, IdentityDraft, IdentityStatus, Role, RoleChanges, RoleDraft};
use vestry_core::{ContributionId, IdentityId, MassId, OfferingId, ParishId, PaymentId, RoleId};
use vestry_finance::{
    Contribution, ContributionDraft, FinanceReport, Offering, OfferingDraft, Payment, PaymentDraft,
};
use vestry_parish::{Mass, MassChanges, MassDraft, Parish, ParishChanges, ParishDraft};

use crate::error::RepoResult;

/// One row of the role assignment ledger. Unique on the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub identity_id: IdentityId,
    pub role_id: RoleId,
    pub assigned_at: DateTime<Utc>,
}

/// Role catalog persistence.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Fails with `DuplicateName` if the name exists.
    async fn create(&self, draft: RoleDraft) -> RepoResult<Role>;

    /// Ordered by name.
    async fn list(&self) -> RepoResult<Vec<Role>>;

    async fn get(&self, id: RoleId) -> RepoResult<Role>;

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>>;

    /// Renaming onto another role's name fails with `DuplicateName`.
    async fn update(&self, id: RoleId, changes: RoleChanges) -> RepoResult<Role>;

    /// Removes the role and every assignment referencing it, atomically.
    /// No soft delete.
    async fn delete(&self, id: RoleId) -> RepoResult<()>;
}

/// Role assignment ledger persistence.
#[async_trait]
pub trait RoleAssignmentStore: Send + Sync {
    /// Fails with `NotFound` if either side is missing, `AlreadyAssigned`
    /// if the pair exists.
    async fn assign(&self, identity_id: IdentityId, role_id: RoleId) -> RepoResult<RoleAssignment>;

    /// Fails with `NotFound` if the pair is absent.
    async fn unassign(&self, identity_id: IdentityId, role_id: RoleId) -> RepoResult<()>;

    /// The roles an identity currently holds (possibly empty), via a single
    /// joined read. Ordered by role name.
    async fn roles_of(&self, identity_id: IdentityId) -> RepoResult<Vec<Role>>;
}

/// Identity directory persistence.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fails with `DuplicateName` if the (normalized) email exists.
    async fn create(&self, draft: IdentityDraft) -> RepoResult<Identity>;

    async fn list(&self) -> RepoResult<Vec<Identity>>;

    async fn get(&self, id: IdentityId) -> RepoResult<Identity>;

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Identity>>;

    async fn set_status(&self, id: IdentityId, status: IdentityStatus) -> RepoResult<Identity>;
}

#[async_trait]
pub trait ParishStore: Send + Sync {
    /// Fails with `DuplicateName` if the parish name exists.
    async fn create(&self, draft: ParishDraft) -> RepoResult<Parish>;

    async fn list(&self) -> RepoResult<Vec<Parish>>;

    async fn get(&self, id: ParishId) -> RepoResult<Parish>;

    async fn update(&self, id: ParishId, changes: ParishChanges) -> RepoResult<Parish>;
}

/// Filter for listing masses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MassFilter {
    pub parish_id: Option<ParishId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait MassStore: Send + Sync {
    /// Fails with `NotFound("parish")` if the referenced parish is missing.
    async fn create(&self, draft: MassDraft) -> RepoResult<Mass>;

    /// Ordered by scheduled time.
    async fn list(&self, filter: MassFilter) -> RepoResult<Vec<Mass>>;

    async fn get(&self, id: MassId) -> RepoResult<Mass>;

    async fn update(&self, id: MassId, changes: MassChanges) -> RepoResult<Mass>;

    /// Hard delete.
    async fn delete(&self, id: MassId) -> RepoResult<()>;
}

#[async_trait]
pub trait OfferingStore: Send + Sync {
    /// Fails with `NotFound` if the referenced parish (or mass) is missing.
    async fn create(&self, draft: OfferingDraft) -> RepoResult<Offering>;

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Offering>>;

    async fn get(&self, id: OfferingId) -> RepoResult<Offering>;

    /// Mistaken entries are removed outright.
    async fn delete(&self, id: OfferingId) -> RepoResult<()>;
}

#[async_trait]
pub trait ContributionStore: Send + Sync {
    async fn create(&self, draft: ContributionDraft) -> RepoResult<Contribution>;

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Contribution>>;

    async fn get(&self, id: ContributionId) -> RepoResult<Contribution>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn create(&self, draft: PaymentDraft) -> RepoResult<Payment>;

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Payment>>;

    async fn get(&self, id: PaymentId) -> RepoResult<Payment>;

    /// Persist a lifecycle transition made on the domain entity.
    async fn update(&self, payment: Payment) -> RepoResult<Payment>;
}

/// Parameters for the finance report aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportQuery {
    pub parish_id: Option<ParishId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait FinanceReportStore: Send + Sync {
    /// Read-only aggregation: offering/contribution totals, completed-payment
    /// total, net, per-fund contribution totals.
    async fn finance_report(&self, query: ReportQuery) -> RepoResult<FinanceReport>;
}
