use argon2::{Argon2, PasswordVerifier};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::config;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::rate_limit::RateLimiter;
use crate::tenancy::{TenantContext, TenantRegistry};

/// GET /shop - storefront branding and feature payload
///
/// Sets the tenant-scoped session cookie so concurrent storefronts on
/// the same browser never share a session.
pub async fn shop(
    Extension(tenant): Extension<TenantContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let pool = DatabaseManager::landlord_pool().await?;
    let registry = TenantRegistry::new(pool);
    let record = registry.require_by_id(tenant.tenant_id).await?;

    let body = json!({
        "success": true,
        "data": {
            "tenant": {
                "id": tenant.tenant_id,
                "name": record.name(),
            },
            "branding": record.branding(),
            "features": record.features(),
        }
    });

    let mut response = (StatusCode::OK, Json(body)).into_response();
    append_session_cookie(&mut response, &tenant, &headers);
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /login - authenticate against the tenant's user table
///
/// Rate limited per tenant + email + client address; a successful
/// login clears the window so a user who finally remembers their
/// password is not locked out.
pub async fn login(
    Extension(tenant): Extension<TenantContext>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let cfg = config::config();
    let ip = client_ip_from_headers(&headers);
    let key = format!(
        "login:{}:{}:{}",
        tenant.rate_limit_scope(),
        payload.email,
        ip
    );

    RateLimiter::instance()
        .hit(
            &key,
            cfg.api.login_max_attempts,
            Duration::from_secs(cfg.api.login_decay_secs),
        )
        .await
        .map_err(|retry_after| {
            ApiError::too_many_requests(
                format!(
                    "Too many login attempts. Please try again in {} seconds.",
                    retry_after
                ),
                retry_after,
            )
        })?;

    let user = verify_credentials(&tenant, &payload).await?;

    // Successful login releases the rate-limit window
    RateLimiter::instance().clear(&key).await;

    let body = json!({
        "success": true,
        "data": {
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
            }
        }
    });

    let mut response = (StatusCode::OK, Json(body)).into_response();
    append_session_cookie(&mut response, &tenant, &headers);
    Ok(response)
}

struct AuthenticatedUser {
    id: Uuid,
    name: String,
    email: String,
}

async fn verify_credentials(
    tenant: &TenantContext,
    payload: &LoginRequest,
) -> Result<AuthenticatedUser, ApiError> {
    let pool = DatabaseManager::tenant_pool(&tenant.database).await?;

    let row: Option<(Uuid, String, String, String)> = sqlx::query_as(
        "SELECT id, name, email, password_hash FROM users WHERE email = $1",
    )
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login query failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    let Some((id, name, email, password_hash)) = row else {
        return Err(invalid_credentials());
    };

    let parsed = argon2::PasswordHash::new(&password_hash).map_err(|e| {
        tracing::error!("Stored password hash is malformed for {}: {}", email, e);
        invalid_credentials()
    })?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed)
        .map_err(|_| invalid_credentials())?;

    Ok(AuthenticatedUser { id, name, email })
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

/// Session cookie scoped to the tenant: Path=/, HttpOnly, SameSite=Lax,
/// Secure when the request came in over TLS.
fn append_session_cookie(response: &mut Response, tenant: &TenantContext, headers: &HeaderMap) {
    let secure = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false);

    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        tenant.session_cookie(),
        Uuid::new_v4()
    );
    if secure {
        cookie.push_str("; Secure");
    }

    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
}

fn client_ip_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_carries_tenant_scope_and_attributes() {
        let tenant = TenantContext {
            tenant_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            name: "t".to_string(),
            database: "tenant_x".to_string(),
        };

        let mut response = (StatusCode::OK, "ok").into_response();
        let headers = HeaderMap::new();
        append_session_cookie(&mut response, &tenant, &headers);

        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("tenant_550e8400-e29b-41d4-a716-446655440000_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));

        let mut https_headers = HeaderMap::new();
        https_headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        let mut response = (StatusCode::OK, "ok").into_response();
        append_session_cookie(&mut response, &tenant, &https_headers);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("; Secure"));
    }
}
