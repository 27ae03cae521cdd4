use axum::{extract::Path, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::tenancy::TenantRegistry;

/// GET / - landlord welcome with an endpoint map
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Caja API",
            "version": version,
            "description": "Multi-tenant point-of-sale backend",
            "endpoints": {
                "health": "/healthz (public, throttled)",
                "admin": "/admin/tenants[/:id] (central domain only)",
                "storefront": "/shop, /login (tenant domains)",
            }
        }
    }))
}

/// GET /admin/tenants - list registered tenants
pub async fn tenants_index() -> Result<Json<Value>, ApiError> {
    let registry = registry().await?;
    let tenants = registry.all().await?;

    let mut items = Vec::with_capacity(tenants.len());
    for tenant in &tenants {
        let domains = registry.domains_for(tenant.id).await?;
        items.push(json!({
            "id": tenant.id,
            "name": tenant.name(),
            "domains": domains.iter().map(|d| d.domain.clone()).collect::<Vec<_>>(),
            "created_at": tenant.created_at,
        }));
    }

    Ok(Json(json!({
        "success": true,
        "data": { "tenants": items }
    })))
}

/// GET /admin/tenants/:id - tenant detail
pub async fn tenants_show(Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let registry = registry().await?;
    let tenant = registry.require_by_id(id).await?;
    let domains = registry.domains_for(tenant.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "id": tenant.id,
            "name": tenant.name(),
            "data": tenant.data,
            "domains": domains.iter().map(|d| d.domain.clone()).collect::<Vec<_>>(),
            "created_at": tenant.created_at,
            "updated_at": tenant.updated_at,
        }
    })))
}

async fn registry() -> Result<TenantRegistry, ApiError> {
    let pool = DatabaseManager::landlord_pool().await?;
    Ok(TenantRegistry::new(pool))
}
