use axum::{extract::Request, http::header::HOST, middleware::Next, response::Response};

use crate::config;
use crate::error::ApiError;
use crate::tenancy::TenantContext;

/// Restrict admin (landlord) routes to the central domain. Requests
/// arriving with an active tenant context or from a tenant domain get
/// a 403, mirroring how the admin panel is hidden from storefronts.
pub async fn landlord_only_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<TenantContext>().is_some() {
        return Err(forbidden());
    }

    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(strip_port)
        .unwrap_or("");

    if !config::config().is_central_domain(host) {
        tracing::warn!("Admin route blocked for host: {}", host);
        return Err(forbidden());
    }

    Ok(next.run(request).await)
}

fn forbidden() -> ApiError {
    ApiError::forbidden("Access denied. The admin panel is only available on the main domain.")
}

/// Host headers may carry a port ("shop.acme.com:8080"). Bare IPv6
/// hosts ("::1") are left intact; bracketed ones lose the brackets.
pub fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(host);
    }
    if host.matches(':').count() == 1 {
        if let Some((h, port)) = host.rsplit_once(':') {
            if port.chars().all(|c| c.is_ascii_digit()) {
                return h;
            }
        }
    }
    host
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_port_suffix() {
        assert_eq!(strip_port("shop.acme.com:8080"), "shop.acme.com");
        assert_eq!(strip_port("localhost:3000"), "localhost");
        assert_eq!(strip_port("shop.acme.com"), "shop.acme.com");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("[::1]:3000"), "::1");
    }
}
