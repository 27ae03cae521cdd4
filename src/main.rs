use axum::{middleware::from_fn, routing::get, routing::post, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use caja_api::handlers::{health, landlord, storefront};
use caja_api::middleware::{
    csp::csp_middleware, landlord_only::landlord_only_middleware,
    rate_limit::throttle_health_middleware, request_id::request_id_middleware,
    resolve_tenant::resolve_tenant_middleware, security_headers::security_headers_middleware,
};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = caja_api::config::config();
    tracing::info!("Starting Caja API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("CAJA_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Caja API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(landlord::root))
        .merge(health_routes())
        .merge(admin_routes())
        .merge(storefront_routes())
        // Global middleware; the last layer added runs first, so every
        // response passes through request-id -> csp -> security headers
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(csp_middleware))
        .layer(from_fn(request_id_middleware))
}

fn health_routes() -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route_layer(from_fn(throttle_health_middleware))
}

fn admin_routes() -> Router {
    Router::new()
        .route("/admin/tenants", get(landlord::tenants_index))
        .route("/admin/tenants/:id", get(landlord::tenants_show))
        .route_layer(from_fn(landlord_only_middleware))
}

fn storefront_routes() -> Router {
    Router::new()
        .route("/shop", get(storefront::shop))
        .route("/login", post(storefront::login))
        .route_layer(from_fn(resolve_tenant_middleware))
}
