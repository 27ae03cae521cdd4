use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::services::health_service;
use crate::tenancy::TenantContext;

/// GET /healthz - aggregate health report
///
/// 200 when every non-skipped check is healthy, 503 otherwise. The
/// tenant database check only runs when the request resolved a tenant.
pub async fn healthz(tenant: Option<Extension<TenantContext>>) -> impl IntoResponse {
    let report = health_service::perform_checks(tenant.as_deref()).await;

    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report))
}
