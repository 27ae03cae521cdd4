//! Initial data for a freshly provisioned tenant database: roles,
//! permissions, the admin user, and the default POS records every
//! store starts with.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use sqlx::PgPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const PERMISSIONS: &[&str] = &[
    "pos.sell",
    "pos.void",
    "inventory.view",
    "inventory.edit",
    "customers.view",
    "customers.edit",
    "cash.open",
    "cash.close",
    "reports.view",
    "settings.edit",
];

const MANAGER_PERMISSIONS: &[&str] = &[
    "pos.sell",
    "pos.void",
    "inventory.view",
    "inventory.edit",
    "customers.view",
    "customers.edit",
    "cash.open",
    "cash.close",
    "reports.view",
];

const CASHIER_PERMISSIONS: &[&str] = &["pos.sell", "customers.view", "cash.open", "cash.close"];

/// Seed a tenant database with roles/permissions, the admin user, and
/// default categories, tax, and warehouse.
pub async fn seed_tenant(
    pool: &PgPool,
    admin_email: &str,
    admin_password: &str,
) -> Result<(), SeedError> {
    let admin_role = create_role(pool, "admin").await?;
    let manager_role = create_role(pool, "manager").await?;
    let cashier_role = create_role(pool, "cashier").await?;

    for permission in PERMISSIONS {
        create_permission(pool, permission).await?;
    }

    grant_permissions(pool, admin_role, PERMISSIONS).await?;
    grant_permissions(pool, manager_role, MANAGER_PERMISSIONS).await?;
    grant_permissions(pool, cashier_role, CASHIER_PERMISSIONS).await?;

    let password_hash = hash_password(admin_password)?;
    let admin_id: (uuid::Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (name, email, password_hash, email_verified_at)
        VALUES ('Administrator', $1, $2, now())
        RETURNING id
        "#,
    )
    .bind(admin_email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await?;

    sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
        .bind(admin_id.0)
        .bind(admin_role)
        .execute(pool)
        .await?;

    // Default categories
    for (name, description) in [
        ("General", "Productos generales"),
        ("Bebidas", "Bebidas y refrescos"),
        ("Snacks", "Snacks y golosinas"),
    ] {
        sqlx::query("INSERT INTO categories (name, description) VALUES ($1, $2)")
            .bind(name)
            .bind(description)
            .execute(pool)
            .await?;
    }

    // Default tax
    sqlx::query("INSERT INTO taxes (name, rate, is_default) VALUES ('IVA', 19.0, true)")
        .execute(pool)
        .await?;

    // Default warehouse
    sqlx::query(
        "INSERT INTO warehouses (name, code, is_default) VALUES ('Almacén Principal', 'MAIN', true)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_role(pool: &PgPool, name: &str) -> Result<i32, SeedError> {
    let row: (i32,) = sqlx::query_as("INSERT INTO roles (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

async fn create_permission(pool: &PgPool, name: &str) -> Result<(), SeedError> {
    sqlx::query("INSERT INTO permissions (name) VALUES ($1)")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}

async fn grant_permissions(
    pool: &PgPool,
    role_id: i32,
    permissions: &[&str],
) -> Result<(), SeedError> {
    for permission in permissions {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, id FROM permissions WHERE name = $2
            "#,
        )
        .bind(role_id)
        .bind(permission)
        .execute(pool)
        .await?;
    }
    Ok(())
}

/// Hash a password with Argon2id in PHC string format.
pub fn hash_password(password: &str) -> Result<String, SeedError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| SeedError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::PasswordVerifier;

    #[test]
    fn cashier_permissions_are_a_subset_of_manager() {
        for p in CASHIER_PERMISSIONS {
            assert!(MANAGER_PERMISSIONS.contains(p));
        }
        for p in MANAGER_PERMISSIONS {
            assert!(PERMISSIONS.contains(p));
        }
        // settings.edit stays admin-only
        assert!(!MANAGER_PERMISSIONS.contains(&"settings.edit"));
    }

    #[test]
    fn hashed_passwords_verify() {
        let hash = hash_password("hunter2-hunter2").unwrap();
        let parsed = argon2::PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2-hunter2", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong-password", &parsed)
            .is_err());
    }
}
