//! Service wiring: stores + resolver behind trait objects.

use std::sync::Arc;

use sqlx::PgPool;

use vestry_infra::{
    ContributionStore, FinanceReportStore, IdentityStore, InMemoryStore, MassStore, OfferingStore,
    ParishStore, PaymentStore, PermissionResolver, PostgresStore, RoleAssignmentStore, RoleStore,
    schema, seed,
};

use crate::config::ApiConfig;

/// Everything handlers and the gate need. Clone-friendly (all arcs).
#[derive(Clone)]
pub struct AppServices {
    pub roles: Arc<dyn RoleStore>,
    pub assignments: Arc<dyn RoleAssignmentStore>,
    pub identities: Arc<dyn IdentityStore>,
    pub parishes: Arc<dyn ParishStore>,
    pub masses: Arc<dyn MassStore>,
    pub offerings: Arc<dyn OfferingStore>,
    pub contributions: Arc<dyn ContributionStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub reports: Arc<dyn FinanceReportStore>,
    pub resolver: PermissionResolver,
}

impl AppServices {
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self::from_backend(store)
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::from_backend(PostgresStore::new(pool))
    }

    fn from_backend<S>(store: S) -> Self
    where
        S: RoleStore
            + RoleAssignmentStore
            + IdentityStore
            + ParishStore
            + MassStore
            + OfferingStore
            + ContributionStore
            + PaymentStore
            + FinanceReportStore
            + Clone
            + 'static,
    {
        let assignments: Arc<dyn RoleAssignmentStore> = Arc::new(store.clone());
        Self {
            roles: Arc::new(store.clone()),
            assignments: assignments.clone(),
            identities: Arc::new(store.clone()),
            parishes: Arc::new(store.clone()),
            masses: Arc::new(store.clone()),
            offerings: Arc::new(store.clone()),
            contributions: Arc::new(store.clone()),
            payments: Arc::new(store.clone()),
            reports: Arc::new(store),
            resolver: PermissionResolver::new(assignments),
        }
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise. Seeds the role catalog and, if configured, the
/// bootstrap administrator.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let services = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url).await?;
            schema::ensure_schema(&pool).await?;
            tracing::info!("using postgres backend");
            AppServices::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores (nothing persists)");
            AppServices::in_memory()
        }
    };

    seed::seed_catalog(services.roles.as_ref()).await?;
    if let Some(email) = &config.bootstrap_admin {
        seed::bootstrap_admin(
            services.identities.as_ref(),
            services.assignments.as_ref(),
            services.roles.as_ref(),
            email,
        )
        .await?;
    }

    Ok(services)
}
