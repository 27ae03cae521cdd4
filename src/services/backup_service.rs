//! Per-tenant database backups.
//!
//! Shells out to pg_dump, optionally piping through gzip and openssl.
//! The raw bytes coming out of the pipeline are what gets persisted,
//! so a compressed artifact really contains gzip output. Failures are
//! isolated per tenant; the batch always runs to completion and prunes
//! old artifacts afterwards.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

use crate::database::{ConnectionInfo, DatabaseError};
use crate::tenancy::Tenant;

/// Env var the encryption stage reads the key from, so the key never
/// appears in the command line.
const BACKUP_KEY_ENV: &str = "CAJA_BACKUP_KEY";

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("pg_dump failed with status {status}: {stderr}")]
    DumpFailed { status: i32, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy)]
pub struct BackupOptions {
    pub compress: bool,
    pub retention_days: i64,
    pub cold_retention_days: i64,
}

#[derive(Debug, Default)]
pub struct BackupRunReport {
    pub created: Vec<PathBuf>,
    pub errors: Vec<String>,
    pub pruned: Vec<PathBuf>,
}

/// What retention does with an artifact of a given age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionAction {
    Keep,
    ColdEligible,
    Delete,
}

pub struct BackupService {
    storage_root: PathBuf,
    encryption_key: Option<String>,
    conn: ConnectionInfo,
}

impl BackupService {
    pub fn new(
        storage_root: impl Into<PathBuf>,
        encryption_key: Option<String>,
        conn: ConnectionInfo,
    ) -> Self {
        Self {
            storage_root: storage_root.into(),
            encryption_key,
            conn,
        }
    }

    pub fn from_config() -> Result<Self, DatabaseError> {
        let cfg = crate::config::config();
        Ok(Self::new(
            cfg.backup.storage_root.clone(),
            cfg.backup.encryption_key.clone(),
            crate::database::DatabaseManager::connection_info()?,
        ))
    }

    /// Back up every tenant, then prune. Per-tenant errors are
    /// collected, never fatal to the batch.
    pub async fn run(&self, tenants: &[Tenant], opts: BackupOptions) -> BackupRunReport {
        let mut report = BackupRunReport::default();

        for tenant in tenants {
            tracing::info!("Backing up tenant: {}", tenant.id);
            match self.backup_tenant(tenant, opts.compress).await {
                Ok(path) => {
                    tracing::info!("Backup created: {}", path.display());
                    report.created.push(path);
                }
                Err(e) => {
                    tracing::error!("Failed to backup tenant {}: {}", tenant.id, e);
                    report.errors.push(format!("Tenant {}: {}", tenant.id, e));
                }
            }
        }

        match self
            .cleanup_old_backups(opts.retention_days, opts.cold_retention_days)
            .await
        {
            Ok(pruned) => report.pruned = pruned,
            Err(e) => report.errors.push(format!("Retention cleanup: {}", e)),
        }

        report
    }

    pub async fn backup_tenant(&self, tenant: &Tenant, compress: bool) -> Result<PathBuf, BackupError> {
        let db_name = tenant.database_name();
        let encrypted = self.encryption_key.is_some();

        let backup_dir = self
            .storage_root
            .join("backups/tenants")
            .join(tenant.id.to_string());
        tokio::fs::create_dir_all(&backup_dir).await?;

        let filename = artifact_name(&db_name, Utc::now(), compress, encrypted);
        let backup_path = backup_dir.join(filename);

        let pipeline = build_dump_pipeline(&self.conn, &db_name, compress, encrypted);

        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&pipeline)
            .env("PGPASSWORD", &self.conn.password)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(key) = &self.encryption_key {
            command.env(BACKUP_KEY_ENV, key);
        }

        let output = command.output().await?;

        if !output.status.success() {
            return Err(BackupError::DumpFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // Persist the pipeline's stdout bytes as-is; when compressing,
        // that is the gzip stream itself.
        tokio::fs::write(&backup_path, &output.stdout).await?;

        Ok(backup_path)
    }

    /// Delete artifacts past the cold cutoff; log artifacts past the
    /// hot cutoff as cold-storage eligible.
    pub async fn cleanup_old_backups(
        &self,
        retention_days: i64,
        cold_retention_days: i64,
    ) -> Result<Vec<PathBuf>, BackupError> {
        let tenants_dir = self.storage_root.join("backups/tenants");
        if !tenants_dir.exists() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut pruned = Vec::new();

        let mut tenant_dirs = tokio::fs::read_dir(&tenants_dir).await?;
        while let Some(tenant_dir) = tenant_dirs.next_entry().await? {
            if !tenant_dir.file_type().await?.is_dir() {
                continue;
            }

            let mut files = tokio::fs::read_dir(tenant_dir.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let metadata = file.metadata().await?;
                if !metadata.is_file() {
                    continue;
                }

                let modified: DateTime<Utc> = metadata.modified()?.into();
                match retention_action(modified, now, retention_days, cold_retention_days) {
                    RetentionAction::Delete => {
                        tokio::fs::remove_file(file.path()).await?;
                        tracing::info!("Deleted old backup: {}", file.path().display());
                        pruned.push(file.path());
                    }
                    RetentionAction::ColdEligible => {
                        tracing::info!(
                            "Backup eligible for cold storage: {}",
                            file.path().display()
                        );
                    }
                    RetentionAction::Keep => {}
                }
            }
        }

        Ok(pruned)
    }
}

/// Artifact naming: <db>_<YYYY-MM-DD_HH-MM-SS>.sql[.gz][.enc]
pub fn artifact_name(db_name: &str, at: DateTime<Utc>, compress: bool, encrypted: bool) -> String {
    let timestamp = at.format("%Y-%m-%d_%H-%M-%S");
    let mut name = format!("{}_{}.sql", db_name, timestamp);
    if compress {
        name.push_str(".gz");
    }
    if encrypted {
        name.push_str(".enc");
    }
    name
}

/// The shell pipeline run under `sh -c`. The password and encryption
/// key travel via the environment, not the command line.
pub fn build_dump_pipeline(
    conn: &ConnectionInfo,
    db_name: &str,
    compress: bool,
    encrypt: bool,
) -> String {
    let mut pipeline = format!(
        "pg_dump -h {} -p {} -U {} -d {} --no-password --clean --if-exists",
        shell_quote(&conn.host),
        conn.port,
        shell_quote(&conn.username),
        shell_quote(db_name),
    );

    if compress {
        pipeline.push_str(" | gzip");
    }
    if encrypt {
        pipeline.push_str(&format!(
            " | openssl enc -aes-256-cbc -pbkdf2 -pass env:{}",
            BACKUP_KEY_ENV
        ));
    }

    pipeline
}

/// Single-quote a shell argument.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

pub fn retention_action(
    modified: DateTime<Utc>,
    now: DateTime<Utc>,
    retention_days: i64,
    cold_retention_days: i64,
) -> RetentionAction {
    let hot_cutoff = now - ChronoDuration::days(retention_days);
    let cold_cutoff = now - ChronoDuration::days(cold_retention_days);

    if modified < cold_cutoff {
        RetentionAction::Delete
    } else if modified < hot_cutoff {
        RetentionAction::ColdEligible
    } else {
        RetentionAction::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> ConnectionInfo {
        ConnectionInfo {
            host: "localhost".to_string(),
            port: 5432,
            username: "caja".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn pipeline_includes_gzip_only_when_compressing() {
        let plain = build_dump_pipeline(&conn(), "tenant_abc", false, false);
        assert!(plain.contains("pg_dump"));
        assert!(plain.contains("--clean --if-exists"));
        assert!(!plain.contains("gzip"));

        let compressed = build_dump_pipeline(&conn(), "tenant_abc", true, false);
        assert!(compressed.ends_with("| gzip"));
    }

    #[test]
    fn pipeline_keeps_secrets_out_of_the_command_line() {
        let p = build_dump_pipeline(&conn(), "tenant_abc", true, true);
        assert!(!p.contains("secret"));
        assert!(p.contains("-pass env:CAJA_BACKUP_KEY"));
    }

    #[test]
    fn shell_quoting_neutralizes_single_quotes() {
        assert_eq!(shell_quote("plain"), "'plain'");
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
    }

    #[test]
    fn artifact_names_follow_the_convention() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T12:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            artifact_name("tenant_abc", at, false, false),
            "tenant_abc_2026-03-01_12-30-45.sql"
        );
        assert_eq!(
            artifact_name("tenant_abc", at, true, false),
            "tenant_abc_2026-03-01_12-30-45.sql.gz"
        );
        assert_eq!(
            artifact_name("tenant_abc", at, true, true),
            "tenant_abc_2026-03-01_12-30-45.sql.gz.enc"
        );
    }

    #[test]
    fn retention_boundaries() {
        let now = Utc::now();
        let keep = now - ChronoDuration::days(3);
        let cold = now - ChronoDuration::days(10);
        let delete = now - ChronoDuration::days(45);

        assert_eq!(retention_action(keep, now, 7, 30), RetentionAction::Keep);
        assert_eq!(
            retention_action(cold, now, 7, 30),
            RetentionAction::ColdEligible
        );
        assert_eq!(
            retention_action(delete, now, 7, 30),
            RetentionAction::Delete
        );
    }

    #[tokio::test]
    async fn cleanup_keeps_fresh_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let service = BackupService::new(dir.path(), None, conn());

        let tenant_dir = dir.path().join("backups/tenants/some-tenant");
        tokio::fs::create_dir_all(&tenant_dir).await.unwrap();
        let artifact = tenant_dir.join("tenant_abc_2026-03-01_12-30-45.sql");
        tokio::fs::write(&artifact, "-- dump").await.unwrap();

        let pruned = service.cleanup_old_backups(7, 30).await.unwrap();
        assert!(pruned.is_empty());
        assert!(artifact.exists());
    }
}
