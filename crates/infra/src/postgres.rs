//! Postgres backend.
//!
//! Uniqueness and referential invariants are enforced by the database:
//! unique violations (23505) map to `DuplicateName`/`AlreadyAssigned` by
//! constraint name, foreign-key violations (23503) to `NotFound` for the
//! referenced entity, and everything else (pool timeouts included) to
//! `Unavailable`. Mutations are single statements or explicit transactions;
//! updates read-modify-write under `FOR UPDATE`.

use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use async_trait::async_trait;

use vestry_auth::{
    Identity, IdentityDraft, IdentityStatus, PermissionMap, Role, RoleChanges, RoleDraft, RoleName,
};
use vestry_core::{ContributionId, IdentityId, MassId, OfferingId, ParishId, PaymentId, RoleId};
use vestry_finance::{
    CollectionMethod, Contribution, ContributionDraft, FinanceReport, FundTotal, Offering,
    OfferingDraft, Payment, PaymentDraft, PaymentStatus,
};
use vestry_parish::{Mass, MassChanges, MassDraft, Parish, ParishChanges, ParishDraft};

use crate::error::{RepoResult, RepositoryError};
use crate::store::{
    ContributionStore, FinanceReportStore, IdentityStore, MassFilter, MassStore, OfferingStore,
    ParishStore, PaymentStore, ReportQuery, RoleAssignment, RoleAssignmentStore, RoleStore,
};

/// Postgres-backed store. Cheap to clone (pool handle).
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_db_err(err: sqlx::Error) -> RepositoryError {
    if let Some(db) = err.as_database_error() {
        match db.code().as_deref() {
            Some("23505") => {
                return match db.constraint() {
                    Some("role_assignments_pkey") => RepositoryError::AlreadyAssigned,
                    _ => RepositoryError::DuplicateName(db.message().to_string()),
                };
            }
            Some("23503") => {
                let entity = match db.constraint() {
                    Some(c) if c.contains("identity") => "identity",
                    Some(c) if c.contains("role") => "role",
                    Some(c) if c.contains("parish") => "parish",
                    Some(c) if c.contains("mass") => "mass",
                    _ => "referenced entity",
                };
                return RepositoryError::NotFound(entity);
            }
            _ => {}
        }
    }
    RepositoryError::Unavailable(err.to_string())
}

fn corrupt(what: &str, detail: impl core::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(format!("corrupt {what} row: {detail}"))
}

fn role_from_row(row: &PgRow) -> RepoResult<Role> {
    let name: String = row.try_get("name").map_err(map_db_err)?;
    let permissions: serde_json::Value = row.try_get("permissions").map_err(map_db_err)?;
    Ok(Role {
        id: RoleId::from_uuid(row.try_get::<Uuid, _>("id").map_err(map_db_err)?),
        name: RoleName::new(&name).map_err(|e| corrupt("role", e))?,
        description: row.try_get("description").map_err(map_db_err)?,
        permissions: serde_json::from_value::<PermissionMap>(permissions)
            .map_err(|e| corrupt("role", e))?,
        created_at: row.try_get("created_at").map_err(map_db_err)?,
        updated_at: row.try_get("updated_at").map_err(map_db_err)?,
    })
}

fn identity_from_row(row: &PgRow) -> RepoResult<Identity> {
    let status: String = row.try_get("status").map_err(map_db_err)?;
    let status = match status.as_str() {
        "active" => IdentityStatus::Active,
        "inactive" => IdentityStatus::Inactive,
        other => return Err(corrupt("identity", format!("unknown status '{other}'"))),
    };
    Ok(Identity {
        id: IdentityId::from_uuid(row.try_get::<Uuid, _>("id").map_err(map_db_err)?),
        email: row.try_get("email").map_err(map_db_err)?,
        display_name: row.try_get("display_name").map_err(map_db_err)?,
        status,
        created_at: row.try_get("created_at").map_err(map_db_err)?,
    })
}

fn parish_from_row(row: &PgRow) -> RepoResult<Parish> {
    Ok(Parish {
        id: ParishId::from_uuid(row.try_get::<Uuid, _>("id").map_err(map_db_err)?),
        name: row.try_get("name").map_err(map_db_err)?,
        address: row.try_get("address").map_err(map_db_err)?,
        created_at: row.try_get("created_at").map_err(map_db_err)?,
        updated_at: row.try_get("updated_at").map_err(map_db_err)?,
    })
}

fn mass_from_row(row: &PgRow) -> RepoResult<Mass> {
    Ok(Mass {
        id: MassId::from_uuid(row.try_get::<Uuid, _>("id").map_err(map_db_err)?),
        parish_id: ParishId::from_uuid(row.try_get::<Uuid, _>("parish_id").map_err(map_db_err)?),
        scheduled_at: row.try_get("scheduled_at").map_err(map_db_err)?,
        celebrant: row.try_get("celebrant").map_err(map_db_err)?,
        intention: row.try_get("intention").map_err(map_db_err)?,
        created_at: row.try_get("created_at").map_err(map_db_err)?,
        updated_at: row.try_get("updated_at").map_err(map_db_err)?,
    })
}

fn offering_from_row(row: &PgRow) -> RepoResult<Offering> {
    let method: String = row.try_get("method").map_err(map_db_err)?;
    let method = match method.as_str() {
        "cash" => CollectionMethod::Cash,
        "check" => CollectionMethod::Check,
        "electronic" => CollectionMethod::Electronic,
        other => return Err(corrupt("offering", format!("unknown method '{other}'"))),
    };
    Ok(Offering {
        id: OfferingId::from_uuid(row.try_get::<Uuid, _>("id").map_err(map_db_err)?),
        parish_id: ParishId::from_uuid(row.try_get::<Uuid, _>("parish_id").map_err(map_db_err)?),
        mass_id: row
            .try_get::<Option<Uuid>, _>("mass_id")
            .map_err(map_db_err)?
            .map(MassId::from_uuid),
        amount_cents: row.try_get("amount_cents").map_err(map_db_err)?,
        method,
        collected_at: row.try_get("collected_at").map_err(map_db_err)?,
        created_at: row.try_get("created_at").map_err(map_db_err)?,
    })
}

fn contribution_from_row(row: &PgRow) -> RepoResult<Contribution> {
    Ok(Contribution {
        id: ContributionId::from_uuid(row.try_get::<Uuid, _>("id").map_err(map_db_err)?),
        parish_id: ParishId::from_uuid(row.try_get::<Uuid, _>("parish_id").map_err(map_db_err)?),
        contributor: row.try_get("contributor").map_err(map_db_err)?,
        fund: row.try_get("fund").map_err(map_db_err)?,
        amount_cents: row.try_get("amount_cents").map_err(map_db_err)?,
        contributed_at: row.try_get("contributed_at").map_err(map_db_err)?,
        created_at: row.try_get("created_at").map_err(map_db_err)?,
    })
}

fn payment_from_row(row: &PgRow) -> RepoResult<Payment> {
    let status: String = row.try_get("status").map_err(map_db_err)?;
    let status = match status.as_str() {
        "pending" => PaymentStatus::Pending,
        "completed" => PaymentStatus::Completed,
        "voided" => PaymentStatus::Voided,
        other => return Err(corrupt("payment", format!("unknown status '{other}'"))),
    };
    Ok(Payment {
        id: PaymentId::from_uuid(row.try_get::<Uuid, _>("id").map_err(map_db_err)?),
        parish_id: ParishId::from_uuid(row.try_get::<Uuid, _>("parish_id").map_err(map_db_err)?),
        payee: row.try_get("payee").map_err(map_db_err)?,
        purpose: row.try_get("purpose").map_err(map_db_err)?,
        amount_cents: row.try_get("amount_cents").map_err(map_db_err)?,
        status,
        paid_at: row.try_get("paid_at").map_err(map_db_err)?,
        created_at: row.try_get("created_at").map_err(map_db_err)?,
        updated_at: row.try_get("updated_at").map_err(map_db_err)?,
    })
}

fn status_str(status: IdentityStatus) -> &'static str {
    match status {
        IdentityStatus::Active => "active",
        IdentityStatus::Inactive => "inactive",
    }
}

fn method_str(method: CollectionMethod) -> &'static str {
    match method {
        CollectionMethod::Cash => "cash",
        CollectionMethod::Check => "check",
        CollectionMethod::Electronic => "electronic",
    }
}

fn payment_status_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "pending",
        PaymentStatus::Completed => "completed",
        PaymentStatus::Voided => "voided",
    }
}

const ROLE_COLUMNS: &str = "id, name, description, permissions, created_at, updated_at";

#[async_trait]
impl RoleStore for PostgresStore {
    async fn create(&self, draft: RoleDraft) -> RepoResult<Role> {
        let role = draft.into_role(Utc::now());
        let permissions =
            serde_json::to_value(&role.permissions).map_err(|e| corrupt("role", e))?;
        sqlx::query(
            "INSERT INTO roles (id, name, description, permissions, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(role.id.as_uuid())
        .bind(role.name.as_str())
        .bind(&role.description)
        .bind(&permissions)
        .bind(role.created_at)
        .bind(role.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(role)
    }

    async fn list(&self) -> RepoResult<Vec<Role>> {
        let rows = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY name"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_err)?;
        rows.iter().map(role_from_row).collect()
    }

    async fn get(&self, id: RoleId) -> RepoResult<Role> {
        let row = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or(RepositoryError::NotFound("role"))?;
        role_from_row(&row)
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let row = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?;
        row.as_ref().map(role_from_row).transpose()
    }

    async fn update(&self, id: RoleId, changes: RoleChanges) -> RepoResult<Role> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let row = sqlx::query(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("role"))?;
        let mut role = role_from_row(&row)?;

        changes.apply(&mut role, Utc::now());
        let permissions =
            serde_json::to_value(&role.permissions).map_err(|e| corrupt("role", e))?;

        sqlx::query(
            "UPDATE roles SET name = $2, description = $3, permissions = $4, updated_at = $5
             WHERE id = $1",
        )
        .bind(role.id.as_uuid())
        .bind(role.name.as_str())
        .bind(&role.description)
        .bind(&permissions)
        .bind(role.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(role)
    }

    async fn delete(&self, id: RoleId) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        sqlx::query("DELETE FROM role_assignments WHERE role_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("role"));
        }

        tx.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}

#[async_trait]
impl RoleAssignmentStore for PostgresStore {
    async fn assign(&self, identity_id: IdentityId, role_id: RoleId) -> RepoResult<RoleAssignment> {
        let assigned_at = Utc::now();
        sqlx::query(
            "INSERT INTO role_assignments (identity_id, role_id, assigned_at)
             VALUES ($1, $2, $3)",
        )
        .bind(identity_id.as_uuid())
        .bind(role_id.as_uuid())
        .bind(assigned_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(RoleAssignment {
            identity_id,
            role_id,
            assigned_at,
        })
    }

    async fn unassign(&self, identity_id: IdentityId, role_id: RoleId) -> RepoResult<()> {
        let result = sqlx::query(
            "DELETE FROM role_assignments WHERE identity_id = $1 AND role_id = $2",
        )
        .bind(identity_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("assignment"));
        }
        Ok(())
    }

    async fn roles_of(&self, identity_id: IdentityId) -> RepoResult<Vec<Role>> {
        let rows = sqlx::query(
            "SELECT r.id, r.name, r.description, r.permissions, r.created_at, r.updated_at
             FROM role_assignments a
             JOIN roles r ON r.id = a.role_id
             WHERE a.identity_id = $1
             ORDER BY r.name",
        )
        .bind(identity_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter().map(role_from_row).collect()
    }
}

const IDENTITY_COLUMNS: &str = "id, email, display_name, status, created_at";

#[async_trait]
impl IdentityStore for PostgresStore {
    async fn create(&self, draft: IdentityDraft) -> RepoResult<Identity> {
        let identity = draft.into_identity(Utc::now());
        sqlx::query(
            "INSERT INTO identities (id, email, display_name, status, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(identity.id.as_uuid())
        .bind(&identity.email)
        .bind(&identity.display_name)
        .bind(status_str(identity.status))
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(identity)
    }

    async fn list(&self) -> RepoResult<Vec<Identity>> {
        let rows = sqlx::query(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY email"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter().map(identity_from_row).collect()
    }

    async fn get(&self, id: IdentityId) -> RepoResult<Identity> {
        let row = sqlx::query(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("identity"))?;
        identity_from_row(&row)
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Identity>> {
        let row = sqlx::query(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?;
        row.as_ref().map(identity_from_row).transpose()
    }

    async fn set_status(&self, id: IdentityId, status: IdentityStatus) -> RepoResult<Identity> {
        let row = sqlx::query(&format!(
            "UPDATE identities SET status = $2 WHERE id = $1 RETURNING {IDENTITY_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status_str(status))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("identity"))?;
        identity_from_row(&row)
    }
}

const PARISH_COLUMNS: &str = "id, name, address, created_at, updated_at";

#[async_trait]
impl ParishStore for PostgresStore {
    async fn create(&self, draft: ParishDraft) -> RepoResult<Parish> {
        let parish = draft.into_parish(Utc::now());
        sqlx::query(
            "INSERT INTO parishes (id, name, address, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(parish.id.as_uuid())
        .bind(&parish.name)
        .bind(&parish.address)
        .bind(parish.created_at)
        .bind(parish.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(parish)
    }

    async fn list(&self) -> RepoResult<Vec<Parish>> {
        let rows = sqlx::query(&format!(
            "SELECT {PARISH_COLUMNS} FROM parishes ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter().map(parish_from_row).collect()
    }

    async fn get(&self, id: ParishId) -> RepoResult<Parish> {
        let row = sqlx::query(&format!(
            "SELECT {PARISH_COLUMNS} FROM parishes WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("parish"))?;
        parish_from_row(&row)
    }

    async fn update(&self, id: ParishId, changes: ParishChanges) -> RepoResult<Parish> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let row = sqlx::query(&format!(
            "SELECT {PARISH_COLUMNS} FROM parishes WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("parish"))?;
        let mut parish = parish_from_row(&row)?;

        changes.apply(&mut parish, Utc::now());

        sqlx::query(
            "UPDATE parishes SET name = $2, address = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(parish.id.as_uuid())
        .bind(&parish.name)
        .bind(&parish.address)
        .bind(parish.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(parish)
    }
}

const MASS_COLUMNS: &str = "id, parish_id, scheduled_at, celebrant, intention, created_at, updated_at";

#[async_trait]
impl MassStore for PostgresStore {
    async fn create(&self, draft: MassDraft) -> RepoResult<Mass> {
        let mass = draft.into_mass(Utc::now());
        sqlx::query(
            "INSERT INTO masses (id, parish_id, scheduled_at, celebrant, intention, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(mass.id.as_uuid())
        .bind(mass.parish_id.as_uuid())
        .bind(mass.scheduled_at)
        .bind(&mass.celebrant)
        .bind(&mass.intention)
        .bind(mass.created_at)
        .bind(mass.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(mass)
    }

    async fn list(&self, filter: MassFilter) -> RepoResult<Vec<Mass>> {
        let rows = sqlx::query(&format!(
            "SELECT {MASS_COLUMNS} FROM masses
             WHERE ($1::uuid IS NULL OR parish_id = $1)
               AND ($2::timestamptz IS NULL OR scheduled_at >= $2)
               AND ($3::timestamptz IS NULL OR scheduled_at <= $3)
             ORDER BY scheduled_at"
        ))
        .bind(filter.parish_id.map(|p| *p.as_uuid()))
        .bind(filter.from)
        .bind(filter.to)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter().map(mass_from_row).collect()
    }

    async fn get(&self, id: MassId) -> RepoResult<Mass> {
        let row = sqlx::query(&format!("SELECT {MASS_COLUMNS} FROM masses WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err)?
            .ok_or(RepositoryError::NotFound("mass"))?;
        mass_from_row(&row)
    }

    async fn update(&self, id: MassId, changes: MassChanges) -> RepoResult<Mass> {
        let mut tx = self.pool.begin().await.map_err(map_db_err)?;

        let row = sqlx::query(&format!(
            "SELECT {MASS_COLUMNS} FROM masses WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("mass"))?;
        let mut mass = mass_from_row(&row)?;

        changes.apply(&mut mass, Utc::now());

        sqlx::query(
            "UPDATE masses SET scheduled_at = $2, celebrant = $3, intention = $4, updated_at = $5
             WHERE id = $1",
        )
        .bind(mass.id.as_uuid())
        .bind(mass.scheduled_at)
        .bind(&mass.celebrant)
        .bind(&mass.intention)
        .bind(mass.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

        tx.commit().await.map_err(map_db_err)?;
        Ok(mass)
    }

    async fn delete(&self, id: MassId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM masses WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("mass"));
        }
        Ok(())
    }
}

const OFFERING_COLUMNS: &str =
    "id, parish_id, mass_id, amount_cents, method, collected_at, created_at";

#[async_trait]
impl OfferingStore for PostgresStore {
    async fn create(&self, draft: OfferingDraft) -> RepoResult<Offering> {
        let offering = draft.into_offering(Utc::now());
        sqlx::query(
            "INSERT INTO offerings (id, parish_id, mass_id, amount_cents, method, collected_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(offering.id.as_uuid())
        .bind(offering.parish_id.as_uuid())
        .bind(offering.mass_id.map(|m| *m.as_uuid()))
        .bind(offering.amount_cents)
        .bind(method_str(offering.method))
        .bind(offering.collected_at)
        .bind(offering.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(offering)
    }

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Offering>> {
        let rows = sqlx::query(&format!(
            "SELECT {OFFERING_COLUMNS} FROM offerings
             WHERE ($1::uuid IS NULL OR parish_id = $1)
             ORDER BY collected_at"
        ))
        .bind(parish_id.map(|p| *p.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter().map(offering_from_row).collect()
    }

    async fn get(&self, id: OfferingId) -> RepoResult<Offering> {
        let row = sqlx::query(&format!(
            "SELECT {OFFERING_COLUMNS} FROM offerings WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("offering"))?;
        offering_from_row(&row)
    }

    async fn delete(&self, id: OfferingId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM offerings WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("offering"));
        }
        Ok(())
    }
}

const CONTRIBUTION_COLUMNS: &str =
    "id, parish_id, contributor, fund, amount_cents, contributed_at, created_at";

#[async_trait]
impl ContributionStore for PostgresStore {
    async fn create(&self, draft: ContributionDraft) -> RepoResult<Contribution> {
        let contribution = draft.into_contribution(Utc::now());
        sqlx::query(
            "INSERT INTO contributions (id, parish_id, contributor, fund, amount_cents, contributed_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(contribution.id.as_uuid())
        .bind(contribution.parish_id.as_uuid())
        .bind(&contribution.contributor)
        .bind(&contribution.fund)
        .bind(contribution.amount_cents)
        .bind(contribution.contributed_at)
        .bind(contribution.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(contribution)
    }

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Contribution>> {
        let rows = sqlx::query(&format!(
            "SELECT {CONTRIBUTION_COLUMNS} FROM contributions
             WHERE ($1::uuid IS NULL OR parish_id = $1)
             ORDER BY contributed_at"
        ))
        .bind(parish_id.map(|p| *p.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter().map(contribution_from_row).collect()
    }

    async fn get(&self, id: ContributionId) -> RepoResult<Contribution> {
        let row = sqlx::query(&format!(
            "SELECT {CONTRIBUTION_COLUMNS} FROM contributions WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("contribution"))?;
        contribution_from_row(&row)
    }
}

const PAYMENT_COLUMNS: &str =
    "id, parish_id, payee, purpose, amount_cents, status, paid_at, created_at, updated_at";

#[async_trait]
impl PaymentStore for PostgresStore {
    async fn create(&self, draft: PaymentDraft) -> RepoResult<Payment> {
        let payment = draft.into_payment(Utc::now());
        sqlx::query(
            "INSERT INTO payments (id, parish_id, payee, purpose, amount_cents, status, paid_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(payment.id.as_uuid())
        .bind(payment.parish_id.as_uuid())
        .bind(&payment.payee)
        .bind(&payment.purpose)
        .bind(payment.amount_cents)
        .bind(payment_status_str(payment.status))
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(payment)
    }

    async fn list(&self, parish_id: Option<ParishId>) -> RepoResult<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE ($1::uuid IS NULL OR parish_id = $1)
             ORDER BY created_at"
        ))
        .bind(parish_id.map(|p| *p.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        rows.iter().map(payment_from_row).collect()
    }

    async fn get(&self, id: PaymentId) -> RepoResult<Payment> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err)?
        .ok_or(RepositoryError::NotFound("payment"))?;
        payment_from_row(&row)
    }

    async fn update(&self, payment: Payment) -> RepoResult<Payment> {
        let result = sqlx::query(
            "UPDATE payments SET status = $2, paid_at = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(payment.id.as_uuid())
        .bind(payment_status_str(payment.status))
        .bind(payment.paid_at)
        .bind(payment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound("payment"));
        }
        Ok(payment)
    }
}

#[async_trait]
impl FinanceReportStore for PostgresStore {
    async fn finance_report(&self, query: ReportQuery) -> RepoResult<FinanceReport> {
        let parish = query.parish_id.map(|p| *p.as_uuid());

        let offering_total_cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0)::bigint FROM offerings
             WHERE ($1::uuid IS NULL OR parish_id = $1)
               AND ($2::timestamptz IS NULL OR collected_at >= $2)
               AND ($3::timestamptz IS NULL OR collected_at <= $3)",
        )
        .bind(parish)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        let contribution_total_cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0)::bigint FROM contributions
             WHERE ($1::uuid IS NULL OR parish_id = $1)
               AND ($2::timestamptz IS NULL OR contributed_at >= $2)
               AND ($3::timestamptz IS NULL OR contributed_at <= $3)",
        )
        .bind(parish)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        let completed_payment_total_cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0)::bigint FROM payments
             WHERE status = 'completed'
               AND ($1::uuid IS NULL OR parish_id = $1)
               AND ($2::timestamptz IS NULL OR paid_at >= $2)
               AND ($3::timestamptz IS NULL OR paid_at <= $3)",
        )
        .bind(parish)
        .bind(query.from)
        .bind(query.to)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_err)?;

        let fund_rows = sqlx::query(
            "SELECT fund, COALESCE(SUM(amount_cents), 0)::bigint AS total_cents
             FROM contributions
             WHERE ($1::uuid IS NULL OR parish_id = $1)
               AND ($2::timestamptz IS NULL OR contributed_at >= $2)
               AND ($3::timestamptz IS NULL OR contributed_at <= $3)
             GROUP BY fund
             ORDER BY fund",
        )
        .bind(parish)
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;

        let contributions_by_fund = fund_rows
            .iter()
            .map(|row| {
                Ok(FundTotal {
                    fund: row.try_get("fund").map_err(map_db_err)?,
                    total_cents: row.try_get("total_cents").map_err(map_db_err)?,
                })
            })
            .collect::<RepoResult<Vec<_>>>()?;

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
