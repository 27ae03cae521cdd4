//! Tenant registry: tenants and their domain mappings, stored in the
//! landlord database. The `data` column is an opaque JSON blob (name,
//! admin email, branding, feature flags) that is presence-checked only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Name of this tenant's dedicated database. Hyphens are stripped
    /// so the name passes the manager's identifier validation.
    pub fn database_name(&self) -> String {
        format!("tenant_{}", self.id.simple())
    }

    /// Display name from the data blob, falling back to the id.
    pub fn name(&self) -> String {
        self.data
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn admin_email(&self) -> Option<&str> {
        self.data.get("admin_email").and_then(Value::as_str)
    }

    pub fn branding(&self) -> Value {
        self.data.get("branding").cloned().unwrap_or(Value::Null)
    }

    pub fn features(&self) -> Value {
        self.data.get("features").cloned().unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Domain {
    pub domain: String,
    pub tenant_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Queries against the landlord registry tables.
pub struct TenantRegistry {
    pool: PgPool,
}

impl TenantRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RegistryError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.id, t.data, t.created_at, t.updated_at
            FROM tenants t
            JOIN domains d ON d.tenant_id = t.id
            WHERE d.domain = $1
            "#,
        )
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, RegistryError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "SELECT id, data, created_at, updated_at FROM tenants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    pub async fn require_by_id(&self, id: Uuid) -> Result<Tenant, RegistryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RegistryError::TenantNotFound(id.to_string()))
    }

    pub async fn domain_exists(&self, domain: &str) -> Result<bool, RegistryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM domains WHERE domain = $1")
            .bind(domain)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    pub async fn insert_tenant(&self, id: Uuid, data: &Value) -> Result<Tenant, RegistryError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (id, data)
            VALUES ($1, $2)
            RETURNING id, data, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data)
        .fetch_one(&self.pool)
        .await?;

        Ok(tenant)
    }

    pub async fn insert_domain(&self, domain: &str, tenant_id: Uuid) -> Result<(), RegistryError> {
        sqlx::query("INSERT INTO domains (domain, tenant_id) VALUES ($1, $2)")
            .bind(domain)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All registered tenants, oldest first (backup iteration order).
    pub async fn all(&self) -> Result<Vec<Tenant>, RegistryError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            "SELECT id, data, created_at, updated_at FROM tenants ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    pub async fn domains_for(&self, tenant_id: Uuid) -> Result<Vec<Domain>, RegistryError> {
        let domains = sqlx::query_as::<_, Domain>(
            "SELECT domain, tenant_id, created_at FROM domains WHERE tenant_id = $1 ORDER BY domain",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant_with(data: Value) -> Tenant {
        Tenant {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn database_name_strips_hyphens() {
        let tenant = tenant_with(json!({}));
        assert_eq!(
            tenant.database_name(),
            "tenant_550e8400e29b41d4a716446655440000"
        );
        assert!(crate::database::DatabaseManager::is_valid_db_name(
            &tenant.database_name()
        ));
    }

    #[test]
    fn data_blob_accessors_tolerate_missing_keys() {
        let tenant = tenant_with(json!({"name": "Tienda Azul"}));
        assert_eq!(tenant.name(), "Tienda Azul");
        assert_eq!(tenant.admin_email(), None);
        assert!(tenant.branding().is_null());

        let bare = tenant_with(json!({}));
        assert_eq!(bare.name(), bare.id.to_string());
    }
}
