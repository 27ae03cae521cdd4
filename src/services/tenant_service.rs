//! Tenant bootstrapping: registry rows, dedicated database, schema,
//! and seed data. The flow mirrors a provisioning runbook — register
//! first, then provision, and always unwind the tenant pool even when
//! seeding blows up partway through.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::{migrations, DatabaseError, DatabaseManager};
use crate::tenancy::registry::{RegistryError, Tenant, TenantRegistry};
use crate::tenancy::seeder::{self, SeedError};

#[derive(Debug, Error)]
pub enum TenantError {
    #[error("Invalid tenant name: {0}")]
    InvalidName(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Seeding error: {0}")]
    Seed(#[from] SeedError),
}

#[derive(Debug)]
pub struct CreatedTenant {
    pub tenant: Tenant,
    pub domain: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Result of a create request; an existing domain is a no-op, not an
/// error, so re-running the command is safe.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Box<CreatedTenant>),
    DomainExists,
}

pub struct TenantService {
    registry: TenantRegistry,
}

impl TenantService {
    pub async fn new() -> Result<Self, TenantError> {
        let pool = DatabaseManager::landlord_pool().await?;
        // Registry tables must exist before anything else touches them
        migrations::migrate_landlord(&pool).await?;
        Ok(Self {
            registry: TenantRegistry::new(pool),
        })
    }

    pub fn registry(&self) -> &TenantRegistry {
        &self.registry
    }

    /// Create a tenant: registry rows, database, migrations, seeds.
    pub async fn create_tenant(
        &self,
        name: &str,
        domain: &str,
        admin_email: Option<String>,
        admin_password: Option<String>,
    ) -> Result<CreateOutcome, TenantError> {
        validate_tenant_name(name)?;
        validate_domain(domain)?;

        // Idempotency: an already-mapped domain means the tenant was
        // created on an earlier run.
        if self.registry.domain_exists(domain).await? {
            return Ok(CreateOutcome::DomainExists);
        }

        let admin_email = admin_email.unwrap_or_else(|| format!("admin@{}", domain));
        let admin_password = admin_password.unwrap_or_else(generate_password);

        let id = Uuid::new_v4();
        let data = json!({
            "name": name,
            "admin_email": admin_email,
            "admin_password": admin_password,
            "created_at": chrono::Utc::now(),
            "branding": {
                "primary_color": "#3B82F6",
                "secondary_color": "#1E40AF",
                "logo_url": null,
            },
            "features": {
                "pos": true,
                "inventory": true,
                "customers": true,
                "cash": true,
                "reports": false, // Premium feature
            },
        });

        let tenant = self.registry.insert_tenant(id, &data).await?;
        self.registry.insert_domain(domain, tenant.id).await?;

        let db_name = tenant.database_name();
        DatabaseManager::create_database(&db_name).await?;

        // Initialize the tenant database; the pool is released no
        // matter how initialization ends.
        let pool = DatabaseManager::tenant_pool(&db_name).await?;
        let init_result = initialize_tenant_db(&pool, &admin_email, &admin_password).await;
        DatabaseManager::release_pool(&db_name).await;
        init_result?;

        Ok(CreateOutcome::Created(Box::new(CreatedTenant {
            tenant,
            domain: domain.to_string(),
            admin_email,
            admin_password,
        })))
    }
}

async fn initialize_tenant_db(
    pool: &PgPool,
    admin_email: &str,
    admin_password: &str,
) -> Result<(), TenantError> {
    migrations::migrate_tenant(pool).await?;
    seeder::seed_tenant(pool, admin_email, admin_password).await?;
    Ok(())
}

/// Display names: 2-100 chars, letters/digits/spaces/hyphens/underscores.
fn validate_tenant_name(name: &str) -> Result<(), TenantError> {
    if name.len() < 2 {
        return Err(TenantError::InvalidName(
            "Tenant name must be at least 2 characters".to_string(),
        ));
    }
    if name.len() > 100 {
        return Err(TenantError::InvalidName(
            "Tenant name must be less than 100 characters".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_')
    {
        return Err(TenantError::InvalidName(
            "Tenant name can only contain letters, numbers, spaces, hyphens, and underscores"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_domain(domain: &str) -> Result<(), TenantError> {
    if domain.is_empty() || domain.len() > 253 {
        return Err(TenantError::InvalidDomain(
            "Domain must be between 1 and 253 characters".to_string(),
        ));
    }
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(TenantError::InvalidDomain(
            "Domain can only contain letters, numbers, dots, and hyphens".to_string(),
        ));
    }
    Ok(())
}

/// 12 random alphanumeric characters, reported once at creation time.
pub fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_tenant_names() {
        assert!(validate_tenant_name("Tienda Azul").is_ok());
        assert!(validate_tenant_name("shop-42_b").is_ok());
        assert!(validate_tenant_name("x").is_err());
        assert!(validate_tenant_name(&"x".repeat(101)).is_err());
        assert!(validate_tenant_name("bad;name").is_err());
    }

    #[test]
    fn validates_domains() {
        assert!(validate_domain("shop.acme.com").is_ok());
        assert!(validate_domain("tienda-azul.caja.example.com").is_ok());
        assert!(validate_domain("").is_err());
        assert!(validate_domain("bad domain.com").is_err());
    }

    #[test]
    fn generated_passwords_are_12_alphanumeric_chars() {
        let a = generate_password();
        let b = generate_password();
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
