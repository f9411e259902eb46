//! Idempotent schema bootstrap for the Postgres backend.

use sqlx::PgPool;

use crate::error::{RepoResult, RepositoryError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS identities (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS roles (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    permissions JSONB NOT NULL DEFAULT '{}'::jsonb,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS role_assignments (
    identity_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
    assigned_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT role_assignments_pkey PRIMARY KEY (identity_id, role_id)
);

CREATE INDEX IF NOT EXISTS role_assignments_identity_idx
    ON role_assignments (identity_id);

CREATE TABLE IF NOT EXISTS parishes (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    address TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS masses (
    id UUID PRIMARY KEY,
    parish_id UUID NOT NULL REFERENCES parishes(id),
    scheduled_at TIMESTAMPTZ NOT NULL,
    celebrant TEXT NOT NULL,
    intention TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS masses_parish_scheduled_idx
    ON masses (parish_id, scheduled_at);

CREATE TABLE IF NOT EXISTS offerings (
    id UUID PRIMARY KEY,
    parish_id UUID NOT NULL REFERENCES parishes(id),
    mass_id UUID REFERENCES masses(id),
    amount_cents BIGINT NOT NULL CHECK (amount_cents > 0),
    method TEXT NOT NULL,
    collected_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS offerings_parish_collected_idx
    ON offerings (parish_id, collected_at);

CREATE TABLE IF NOT EXISTS contributions (
    id UUID PRIMARY KEY,
    parish_id UUID NOT NULL REFERENCES parishes(id),
    contributor TEXT NOT NULL,
    fund TEXT NOT NULL,
    amount_cents BIGINT NOT NULL CHECK (amount_cents > 0),
    contributed_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS contributions_parish_fund_idx
    ON contributions (parish_id, fund);

CREATE TABLE IF NOT EXISTS payments (
    id UUID PRIMARY KEY,
    parish_id UUID NOT NULL REFERENCES parishes(id),
    payee TEXT NOT NULL,
    purpose TEXT NOT NULL,
    amount_cents BIGINT NOT NULL CHECK (amount_cents > 0),
    status TEXT NOT NULL DEFAULT 'pending',
    paid_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);
"#;

/// Create every table and index if it does not exist yet. Safe to run on
/// every startup.
pub async fn ensure_schema(pool: &PgPool) -> RepoResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| RepositoryError::Unavailable(e.to_string()))?;
    tracing::debug!("database schema ensured");
    Ok(())
}
