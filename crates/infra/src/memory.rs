//! In-memory backend for dev and tests.
//!
//! One shared state behind an `RwLock`; every trait is implemented on the same
//! handle so cross-entity invariants (cascade on role deletion, referential
//! checks) see one consistent view. Lock poisoning maps to `Unavailable`,
//! never a silent no-op.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vestry_auth::{Identity, IdentityDraft, IdentityStatus, Role, RoleChanges, RoleDraft};
use vestry_core::{ContributionId, IdentityId, MassId, OfferingId, ParishId, PaymentId, RoleId};
use vestry_finance::{
    Contribution, ContributionDraft, FinanceReport, FundTotal, Offering, OfferingDraft, Payment,
    PaymentDraft, PaymentStatus,
};
use vestry_parish::{Mass, MassChanges, MassDraft, Parish, ParishChanges, ParishDraft};

use crate::error::{RepoResult, RepositoryError};
use crate::store::{
    ContributionStore, FinanceReportStore, IdentityStore, MassFilter, MassStore, OfferingStore,
    ParishStore, PaymentStore, ReportQuery, RoleAssignment, RoleAssignmentStore, RoleStore,
};

#[derive(Debug, Default)]
struct State {
    roles: HashMap<RoleId, Role>,
    assignments: HashMap<(IdentityId, RoleId), DateTime<Utc>>,
    identities: HashMap<IdentityId, Identity>,
    parishes: HashMap<ParishId, Parish>,
    masses: HashMap<MassId, Mass>,
    offerings: HashMap<OfferingId, Offering>,
    contributions: HashMap<ContributionId, Contribution>,
    payments: HashMap<PaymentId, Payment>,
}

/// Shared in-memory store. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| RepositoryError::unavailable("state lock poisoned"))
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| RepositoryError::unavailable("state lock poisoned"))
    }
}

fn within(
    at: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    from.is_none_or(|f| at >= f) && to.is_none_or(|t| at <= t)
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn create(&self, draft: RoleDraft) -> RepoResult<Role> {
        let mut state = self.write()?;
        if state.roles.values().any(|r| r.name == draft.name) {
            return Err(RepositoryError::DuplicateName(draft.name.to_string()));
        }
        let role = draft.into_role(Utc::now());
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn list(&self) -> RepoResult<Vec<Role>> {
        let state = self.read()?;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn get(&self, id: RoleId) -> RepoResult<Role> {
        self.read()?
            .roles
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("role"))
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        Ok(self
            .read()?
            .roles
            .values()
            .find(|r| r.name.as_str() == name)
            .cloned())
    }

    async fn update(&self, id: RoleId, changes: RoleChanges) -> RepoResult<Role> {
        let mut state = self.write()?;
        if let Some(new_name) = &changes.name {
            let collision = state
                .roles
                .values()
                .any(|r| r.id != id && r.name == *new_name);
            if collision {
                return Err(RepositoryError::DuplicateName(new_name.to_string()));
            }
        }
        let role = state
            .roles
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("role"))?;
        changes.apply(role, Utc::now());
        Ok(role.clone())
    }

    async fn delete(&self, id: RoleId) -> RepoResult<()> {
        let mut state = self.write()?;
        if state.roles.remove(&id).is_none() {
            return Err(RepositoryError::NotFound("role"));
        }
        // Assignments do not outlive their role.
        state.assignments.retain(|(_, role_id), _| *role_id != id);
        Ok(())
    }
}

#[async_trait]
impl RoleAssignmentStore for InMemoryStore {
    async fn assign(&self, identity_id: IdentityId, role_id: RoleId) -> RepoResult<RoleAssignment> {
        let mut state = self.write()?;
        if !state.identities.contains_key(&identity_id) {
            return Err(RepositoryError::NotFound("identity"));
        }
        if !state.roles.contains_key(&role_id) {
            return Err(RepositoryError::NotFound("role"));
        }
        if state.assignments.contains_key(&(identity_id, role_id)) {
            return Err(RepositoryError::AlreadyAssigned);
        }
        let assigned_at = Utc::now();
        state.assignments.insert((identity_id, role_id), assigned_at);
        Ok(RoleAssignment {
            identity_id,
            role_id,
            assigned_at,
        })
    }

    async fn unassign(&self, identity_id: IdentityId, role_id: RoleId) -> RepoResult<()> {
        let mut state = self.write()?;
        state
            .assignments
            .remove(&(identity_id, role_id))
            .map(|_| ())
            .ok_or(RepositoryError::NotFound("assignment"))
    }

    async fn roles_of(&self, identity_id: IdentityId) -> RepoResult<Vec<Role>> {
        let state = self.read()?;
        let mut roles: Vec<Role> = state
            .assignments
            .keys()
            .filter(|(i, _)| *i == identity_id)
            .filter_map(|(_, role_id)| state.roles.get(role_id))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn create(&self, draft: IdentityDraft) -> RepoResult<Identity> {
        let mut state = self.write()?;
        if state.identities.values().any(|i| i.email == draft.email) {
            return Err(RepositoryError::DuplicateName(draft.email));
        }
        let identity = draft.into_identity(Utc::now());
        state.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn list(&self) -> RepoResult<Vec<Identity>> {
        let state = self.read()?;
        let mut identities: Vec<Identity> = state.identities.values().cloned().collect();
        identities.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(identities)
    }

    async fn get(&self, id: IdentityId) -> RepoResult<Identity> {
        self.read()?
            .identities
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("identity"))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Identity>> {
        Ok(self
            .read()?
            .identities
            .values()
            .find(|i| i.email == email)
            .cloned())
    }

    async fn set_status(&self, id: IdentityId, status: IdentityStatus) -> RepoResult<Identity> {
        let mut state = self.write()?;
        let identity = state
            .identities
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("identity"))?;
        identity.status = status;
        Ok(identity.clone())
    }
}

#[async_trait]
impl ParishStore for InMemoryStore {
    async fn create(&self, draft: ParishDraft) -> RepoResult<Parish> {
        let mut state = self.write()?;
        if state.parishes.values().any(|p| p.name == draft.name) {
            return Err(RepositoryError::DuplicateName(draft.name));
        }
        let parish = draft.into_parish(Utc::now());
        state.parishes.insert(parish.id, parish.clone());
        Ok(parish)
    }

    async fn list(&self) -> RepoResult<Vec<Parish>> {
        let state = self.read()?;
        let mut parishes: Vec<Parish> = state.parishes.values().cloned().collect();
        parishes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parishes)
    }

    async fn get(&self, id: ParishId) -> RepoResult<Parish> {
        self.read()?
            .parishes
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("parish"))
    }

    async fn update(&self, id: ParishId, changes: ParishChanges) -> RepoResult<Parish> {
        let mut state = self.write()?;
        if let Some(new_name) = &changes.name {
            let collision = state
                .parishes
                .values()
                .any(|p| p.id != id && p.name == *new_name);
            if collision {
                return Err(RepositoryError::DuplicateName(new_name.clone()));
            }
        }
        let parish = state
            .parishes
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("parish"))?;
        changes.apply(parish, Utc::now());
        Ok(parish.clone())
    }
}

#[async_trait]
impl MassStore for InMemoryStore {
    async fn create(&self, draft: MassDraft) -> RepoResult<Mass> {
        let mut state = self.write()?;
        if !state.parishes.contains_key(&draft.parish_id) {
            return Err(RepositoryError::NotFound("parish"));
        }
        let mass = draft.into_mass(Utc::now());
        state.masses.insert(mass.id, mass.clone());
        Ok(mass)
    }

    async fn list(&self, filter: MassFilter) -> RepoResult<Vec<Mass>> {
        let state = self.read()?;
        let mut masses: Vec<Mass> = state
            .masses
            .values()
            .filter(|m| filter.parish_id.is_none_or(|p| m.parish_id == p))
            .filter(|m| within(m.scheduled_at, filter.from, filter.to))
            .cloned()
            .collect();
        masses.sort_by_key(|m| m.scheduled_at);
        Ok(masses)
    }

    async fn get(&self, id: MassId) -> RepoResult<Mass> {
        self.read()?
            .masses
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("mass"))
    }

    async fn update(&self, id: MassId, changes: MassChanges) -> RepoResult<Mass> {
        let mut state = self.write()?;
        let mass = state
            .masses
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound("mass"))?;
        changes.apply(mass, Utc::now());
        Ok(mass.clone())
    }

    async fn delete(&self, id: MassId) -> RepoResult<()> {
        let mut state = self.write()?;
        state
            .masses
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound("mass"))
    }
}

#[async_trait]
impl OfferingStore for InMemoryStore {
    async fn create(&self, draft: OfferingDraft) -> RepoResult<Offering> {
        let mut state = self.write()?;
        if !state.parishes.contains_key(&draft.parish_id) {
            return Err(RepositoryError::NotFound("parish"));
        }
        if let Some(mass_id) = draft.mass_id {
            if !state.masses.contains_key(&mass_id) {
                return Err(RepositoryError::NotFound("mass"));
            }
        }
        let offering = draft.into_offering(Utc::now());
        state.offerings.insert(offering.id, offering.clone());
        Ok(offering)
    }

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Offering>> {
        let state = self.read()?;
        let mut offerings: Vec<Offering> = state
            .offerings
            .values()
            .filter(|o| parish_id.is_none_or(|p| o.parish_id == p))
            .cloned()
            .collect();
        offerings.sort_by_key(|o| o.collected_at);
        Ok(offerings)
    }

    async fn get(&self, id: OfferingId) -> RepoResult<Offering> {
        self.read()?
            .offerings
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("offering"))
    }

    async fn delete(&self, id: OfferingId) -> RepoResult<()> {
        let mut state = self.write()?;
        state
            .offerings
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound("offering"))
    }
}

#[async_trait]
impl ContributionStore for InMemoryStore {
    async fn create(&self, draft: ContributionDraft) -> RepoResult<Contribution> {
        let mut state = self.write()?;
        if !state.parishes.contains_key(&draft.parish_id) {
            return Err(RepositoryError::NotFound("parish"));
        }
        let contribution = draft.into_contribution(Utc::now());
        state.contributions.insert(contribution.id, contribution.clone());
        Ok(contribution)
    }

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Contribution>> {
        let state = self.read()?;
        let mut contributions: Vec<Contribution> = state
            .contributions
            .values()
            .filter(|c| parish_id.is_none_or(|p| c.parish_id == p))
            .cloned()
            .collect();
        contributions.sort_by_key(|c| c.contributed_at);
        Ok(contributions)
    }

    async fn get(&self, id: ContributionId) -> RepoResult<Contribution> {
        self.read()?
            .contributions
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("contribution"))
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn create(&self, draft: PaymentDraft) -> RepoResult<Payment> {
        let mut state = self.write()?;
        if !state.parishes.contains_key(&draft.parish_id) {
            return Err(RepositoryError::NotFound("parish"));
        }
        let payment = draft.into_payment(Utc::now());
        state.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Payment>> {
        let state = self.read()?;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| parish_id.is_none_or(|pid| p.parish_id == pid))
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    async fn get(&self, id: PaymentId) -> RepoResult<Payment> {
        self.read()?
            .payments
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound("payment"))
    }

    async fn update(&self, payment: Payment) -> RepoResult<Payment> {
        let mut state = self.write()?;
        if !state.payments.contains_key(&payment.id) {
            return Err(RepositoryError::NotFound("payment"));
        }
        state.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }
}

#[async_trait]
impl FinanceReportStore for InMemoryStore {
    async fn finance_report(&self, query: ReportQuery) -> RepoResult<FinanceReport> {
        let state = self.read()?;

        let offering_total_cents: i64 = state
            .offerings
            .values()
            .filter(|o| query.parish_id.is_none_or(|p| o.parish_id == p))
            .filter(|o| within(o.collected_at, query.from, query.to))
            .map(|o| o.amount_cents)
            .sum();

        let mut contributions_by_fund: HashMap<String, i64> = HashMap::new();
        let mut contribution_total_cents = 0i64;
        for c in state
            .contributions
            .values()
            .filter(|c| query.parish_id.is_none_or(|p| c.parish_id == p))
            .filter(|c| within(c.contributed_at, query.from, query.to))
        {
            contribution_total_cents += c.amount_cents;
            *contributions_by_fund.entry(c.fund.clone()).or_default() += c.amount_cents;
        }

        let completed_payment_total_cents: i64 = state
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Completed)
            .filter(|p| query.parish_id.is_none_or(|pid| p.parish_id == pid))
            .filter(|p| p.paid_at.is_some_and(|at| within(at, query.from, query.to)))
            .map(|p| p.amount_cents)
            .sum();

        let mut contributions_by_fund: Vec<FundTotal> = contributions_by_fund
            .into_iter()
            .map(|(fund, total_cents)| FundTotal { fund, total_cents })
            .collect();
        contributions_by_fund.sort_by(|a, b| a.fund.cmp(&b.fund));

        Ok(FinanceReport {
            parish_id: query.parish_id,
            from: query.from,
            to: query.to,
            offering_total_cents,
            contribution_total_cents,
            completed_payment_total_cents,
            net_cents: offering_total_cents + contribution_total_cents
                - completed_payment_total_cents,
            contributions_by_fund,
        })
    }
}
