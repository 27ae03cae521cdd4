use axum::{
    extract::Request,
    http::{header::CONTENT_SECURITY_POLICY, HeaderValue},
    middleware::Next,
    response::Response,
};
use rand::RngCore;
use std::fmt::Write as _;

/// Per-request CSP nonce, available to handlers that emit inline
/// scripts or styles.
#[derive(Clone, Debug)]
pub struct CspNonce(pub String);

/// Generate a unique nonce for this request and attach a strict
/// Content-Security-Policy header to the response.
pub async fn csp_middleware(mut request: Request, next: Next) -> Response {
    let nonce = generate_nonce();
    request.extensions_mut().insert(CspNonce(nonce.clone()));

    let mut response = next.run(request).await;

    let csp = build_csp(&nonce);
    if let Ok(value) = HeaderValue::from_str(&csp) {
        response.headers_mut().insert(CONTENT_SECURITY_POLICY, value);
    }

    response
}

/// 16 random bytes, hex encoded (32 chars).
fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().fold(String::with_capacity(32), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

/// Build the Content-Security-Policy header. No unsafe-inline or
/// unsafe-eval; inline assets must carry the request nonce.
fn build_csp(nonce: &str) -> String {
    let directives = [
        "default-src 'self'".to_string(),
        format!("script-src 'self' 'nonce-{}'", nonce),
        format!(
            "style-src 'self' 'nonce-{}' https://fonts.googleapis.com",
            nonce
        ),
        "font-src 'self' data: https://fonts.gstatic.com".to_string(),
        "img-src 'self' https: data: blob:".to_string(),
        // WebSocket support for live storefront updates
        "connect-src 'self' ws: wss:".to_string(),
        "frame-ancestors 'none'".to_string(),
        "base-uri 'self'".to_string(),
        "form-action 'self'".to_string(),
        "object-src 'none'".to_string(),
        "media-src 'self'".to_string(),
        "worker-src 'self' blob:".to_string(),
    ];

    directives.join("; ")
}
