use axum::{extract::Request, http::header::HOST, middleware::Next, response::Response};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::tenancy::{TenantContext, TenantRegistry};

use super::landlord_only::strip_port;

/// Resolve the tenant for storefront routes by the request Host.
/// Unknown domains get a 404; a resolved tenant is injected as a
/// request extension for handlers and downstream middleware.
pub async fn resolve_tenant_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(strip_port)
        .map(str::to_string)
        .ok_or_else(|| ApiError::bad_request("Missing Host header"))?;

    let pool = DatabaseManager::landlord_pool().await?;
    let registry = TenantRegistry::new(pool);

    let tenant = registry
        .find_by_domain(&host)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No storefront configured for '{}'", host)))?;

    let context = TenantContext::for_tenant(&tenant);
    tracing::debug!("Resolved tenant {} for host {}", context.tenant_id, host);

    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
