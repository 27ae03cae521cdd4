//! Health reporting.
//!
//! Each check is independent, catches its own failure, and degrades to
//! "unhealthy" instead of propagating. Checks that do not apply to the
//! current request (no tenant context, no queue supervisor configured)
//! report "skipped" and do not affect the aggregate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::cache::CacheStore;
use crate::config;
use crate::database::DatabaseManager;
use crate::tenancy::TenantContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Healthy,
    Unhealthy,
    Skipped,
}

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub app: String,
    pub git_sha: String,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub checks: BTreeMap<&'static str, CheckStatus>,
    pub version: VersionInfo,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn from_checks(checks: BTreeMap<&'static str, CheckStatus>) -> Self {
        let healthy = checks.values().all(|s| *s != CheckStatus::Unhealthy);
        let cfg = config::config();
        Self {
            status: if healthy { "healthy" } else { "unhealthy" },
            checks,
            version: VersionInfo {
                app: cfg.health.app_version.clone(),
                git_sha: cfg.health.git_sha.clone(),
            },
            timestamp: Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Run all checks for the current request.
pub async fn perform_checks(tenant: Option<&TenantContext>) -> HealthReport {
    let cfg = config::config();

    let mut checks = BTreeMap::new();
    checks.insert("db_landlord", check_db_landlord().await);
    checks.insert("db_tenant", check_db_tenant(tenant).await);
    checks.insert("cache", check_cache(tenant).await);
    checks.insert("queue", check_queue(cfg.health.queue_status_file.as_deref()).await);
    checks.insert("storage", check_storage(Path::new(&cfg.backup.storage_root)).await);

    HealthReport::from_checks(checks)
}

async fn check_db_landlord() -> CheckStatus {
    match DatabaseManager::health_check().await {
        Ok(()) => CheckStatus::Healthy,
        Err(e) => {
            tracing::warn!("Health check: landlord database connection failed: {}", e);
            CheckStatus::Unhealthy
        }
    }
}

async fn check_db_tenant(tenant: Option<&TenantContext>) -> CheckStatus {
    let Some(tenant) = tenant else {
        return CheckStatus::Skipped;
    };

    let ping = async {
        let pool = DatabaseManager::tenant_pool(&tenant.database).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok::<_, crate::database::DatabaseError>(())
    };

    match ping.await {
        Ok(()) => CheckStatus::Healthy,
        Err(e) => {
            tracing::warn!(
                "Health check: tenant database connection failed (tenant {}): {}",
                tenant.tenant_id,
                e
            );
            CheckStatus::Unhealthy
        }
    }
}

async fn check_cache(tenant: Option<&TenantContext>) -> CheckStatus {
    let prefix = tenant
        .map(|t| t.cache_prefix())
        .unwrap_or_else(|| "landlord_cache".to_string());
    let key = CacheStore::scoped_key(&prefix, &format!("healthz_test_{}", uuid::Uuid::new_v4()));

    let cache = CacheStore::instance();
    cache.put(&key, "test", Duration::from_secs(10)).await;
    let value = cache.get(&key).await;
    cache.forget(&key).await;

    if value.as_deref() == Some("test") {
        CheckStatus::Healthy
    } else {
        tracing::warn!("Health check: cache round-trip failed");
        CheckStatus::Unhealthy
    }
}

/// The queue supervisor writes its state ("active" or "paused") to a
/// status file. No file configured means no supervisor is installed.
async fn check_queue(status_file: Option<&str>) -> CheckStatus {
    let Some(path) = status_file else {
        return CheckStatus::Skipped;
    };

    match tokio::fs::read_to_string(path).await {
        Ok(contents) => match contents.trim() {
            "active" | "paused" => CheckStatus::Healthy,
            other => {
                tracing::warn!("Health check: queue supervisor reports '{}'", other);
                CheckStatus::Unhealthy
            }
        },
        Err(e) => {
            tracing::warn!("Health check: queue status file unreadable: {}", e);
            CheckStatus::Unhealthy
        }
    }
}

async fn check_storage(root: &Path) -> CheckStatus {
    let probe = async {
        tokio::fs::create_dir_all(root).await?;
        let path = root.join(format!("healthz_test_{}.tmp", uuid::Uuid::new_v4()));
        let content = Utc::now().to_rfc3339();

        tokio::fs::write(&path, &content).await?;
        let read_back = tokio::fs::read_to_string(&path).await?;
        tokio::fs::remove_file(&path).await?;

        Ok::<_, std::io::Error>(read_back == content)
    };

    match probe.await {
        Ok(true) => CheckStatus::Healthy,
        Ok(false) => {
            tracing::warn!("Health check: storage round-trip content mismatch");
            CheckStatus::Unhealthy
        }
        Err(e) => {
            tracing::warn!("Health check: storage check failed: {}", e);
            CheckStatus::Unhealthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_with(statuses: &[(&'static str, CheckStatus)]) -> HealthReport {
        HealthReport::from_checks(statuses.iter().cloned().collect())
    }

    #[test]
    fn healthy_when_all_checks_pass() {
        let report = report_with(&[
            ("db_landlord", CheckStatus::Healthy),
            ("cache", CheckStatus::Healthy),
            ("storage", CheckStatus::Healthy),
        ]);
        assert!(report.is_healthy());
    }

    #[test]
    fn skipped_checks_do_not_count_against_health() {
        let report = report_with(&[
            ("db_landlord", CheckStatus::Healthy),
            ("db_tenant", CheckStatus::Skipped),
            ("queue", CheckStatus::Skipped),
        ]);
        assert!(report.is_healthy());
    }

    #[test]
    fn any_unhealthy_check_fails_the_aggregate() {
        let report = report_with(&[
            ("db_landlord", CheckStatus::Healthy),
            ("storage", CheckStatus::Unhealthy),
        ]);
        assert!(!report.is_healthy());
        assert_eq!(report.status, "unhealthy");
    }

    #[tokio::test]
    async fn queue_check_skipped_without_supervisor() {
        assert_eq!(check_queue(None).await, CheckStatus::Skipped);
    }

    #[tokio::test]
    async fn queue_check_reads_status_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("horizon.status");

        tokio::fs::write(&path, "active\n").await.unwrap();
        assert_eq!(
            check_queue(Some(path.to_str().unwrap())).await,
            CheckStatus::Healthy
        );

        tokio::fs::write(&path, "stopped").await.unwrap();
        assert_eq!(
            check_queue(Some(path.to_str().unwrap())).await,
            CheckStatus::Unhealthy
        );

        assert_eq!(
            check_queue(Some("/nonexistent/horizon.status")).await,
            CheckStatus::Unhealthy
        );
    }

    #[tokio::test]
    async fn storage_check_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(check_storage(dir.path()).await, CheckStatus::Healthy);
        // Probe files are cleaned up
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cache_check_round_trips() {
        assert_eq!(check_cache(None).await, CheckStatus::Healthy);
    }
}
