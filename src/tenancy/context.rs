//! Request-scoped tenant context.
//!
//! The resolved tenant travels through the request as an explicit axum
//! extension instead of mutated process-wide configuration, so nothing
//! can leak between concurrently handled requests. Everything that
//! must be tenant-scoped (cache keys, session cookie names, rate-limit
//! buckets) derives its name from this value.

use uuid::Uuid;

use super::registry::Tenant;

#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub name: String,
    pub database: String,
}

impl TenantContext {
    pub fn for_tenant(tenant: &Tenant) -> Self {
        Self {
            tenant_id: tenant.id,
            name: tenant.name(),
            database: tenant.database_name(),
        }
    }

    /// Cache key prefix for this tenant.
    pub fn cache_prefix(&self) -> String {
        format!("tenant_{}_cache", self.tenant_id)
    }

    /// Session cookie name for this tenant.
    pub fn session_cookie(&self) -> String {
        format!("tenant_{}_session", self.tenant_id)
    }

    /// Rate-limit key scope for this tenant.
    pub fn rate_limit_scope(&self) -> String {
        self.tenant_id.to_string()
    }
}

/// Rate-limit scope for a request that may or may not carry a tenant.
pub fn rate_scope(ctx: Option<&TenantContext>) -> String {
    match ctx {
        Some(ctx) => ctx.rate_limit_scope(),
        None => "landlord".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn context(id: &str) -> TenantContext {
        let tenant = Tenant {
            id: Uuid::parse_str(id).unwrap(),
            data: json!({"name": "t"}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        TenantContext::for_tenant(&tenant)
    }

    #[test]
    fn distinct_tenants_get_distinct_cache_prefixes() {
        let a = context("550e8400-e29b-41d4-a716-446655440000");
        let b = context("6fa459ea-ee8a-4ca4-894e-db77e160355e");
        assert_ne!(a.cache_prefix(), b.cache_prefix());
        assert!(a.cache_prefix().starts_with("tenant_"));
        assert!(a.cache_prefix().ends_with("_cache"));
    }

    #[test]
    fn distinct_tenants_get_distinct_session_cookies() {
        let a = context("550e8400-e29b-41d4-a716-446655440000");
        let b = context("6fa459ea-ee8a-4ca4-894e-db77e160355e");
        assert_ne!(a.session_cookie(), b.session_cookie());
        assert!(a.session_cookie().ends_with("_session"));
    }

    #[test]
    fn landlord_requests_use_landlord_rate_scope() {
        let ctx = context("550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(rate_scope(None), "landlord");
        assert_eq!(rate_scope(Some(&ctx)), ctx.tenant_id.to_string());
    }
}
