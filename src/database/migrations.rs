//! Embedded schema migrations.
//!
//! The landlord schema holds the tenant registry; the tenant schema is
//! the per-tenant POS database created by the bootstrapper. Statements
//! are idempotent so re-running a migration is harmless.

use sqlx::PgPool;

use super::manager::DatabaseError;

/// Landlord (central) database schema: tenant registry + domain mappings.
const LANDLORD_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS tenants (
        id UUID PRIMARY KEY,
        data JSONB NOT NULL DEFAULT '{}'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS domains (
        domain TEXT PRIMARY KEY,
        tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS domains_tenant_id_idx ON domains(tenant_id)",
];

/// Per-tenant POS schema.
const TENANT_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        email_verified_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS permissions (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS role_permissions (
        role_id INT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        permission_id INT NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
        PRIMARY KEY (role_id, permission_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role_id INT NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        PRIMARY KEY (user_id, role_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS taxes (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        rate DOUBLE PRECISION NOT NULL,
        is_default BOOLEAN NOT NULL DEFAULT false
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS warehouses (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE,
        is_default BOOLEAN NOT NULL DEFAULT false
    )
    "#,
];

pub async fn migrate_landlord(pool: &PgPool) -> Result<(), DatabaseError> {
    run_statements(pool, LANDLORD_SCHEMA).await
}

pub async fn migrate_tenant(pool: &PgPool) -> Result<(), DatabaseError> {
    run_statements(pool, TENANT_SCHEMA).await
}

async fn run_statements(pool: &PgPool, statements: &[&str]) -> Result<(), DatabaseError> {
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
