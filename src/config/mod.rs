use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub tenancy: TenancyConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub backup: BackupConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Hosts that serve the landlord (central) application.
    pub central_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub health_rate_limit_per_minute: u32,
    pub login_max_attempts: u32,
    pub login_decay_secs: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    /// Emit Strict-Transport-Security. Only meaningful behind TLS.
    pub enable_hsts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Root directory for local file storage; backup artifacts live
    /// under <storage_root>/backups/tenants/.
    pub storage_root: String,
    /// When set, backup artifacts are piped through openssl enc.
    pub encryption_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Status file maintained by the queue-worker supervisor. The
    /// queue check reports "skipped" when unset.
    pub queue_status_file: Option<String>,
    pub app_version: String,
    pub git_sha: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Tenancy overrides
        if let Ok(v) = env::var("TENANCY_CENTRAL_DOMAINS") {
            self.tenancy.central_domains = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // API overrides
        if let Ok(v) = env::var("RATE_LIMIT_HEALTH_PER_MINUTE") {
            self.api.health_rate_limit_per_minute =
                v.parse().unwrap_or(self.api.health_rate_limit_per_minute);
        }
        if let Ok(v) = env::var("RATE_LIMIT_LOGIN_ATTEMPTS") {
            self.api.login_max_attempts = v.parse().unwrap_or(self.api.login_max_attempts);
        }
        if let Ok(v) = env::var("RATE_LIMIT_LOGIN_DECAY_SECS") {
            self.api.login_decay_secs = v.parse().unwrap_or(self.api.login_decay_secs);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_HSTS") {
            self.security.enable_hsts = v.parse().unwrap_or(self.security.enable_hsts);
        }

        // Backup overrides
        if let Ok(v) = env::var("STORAGE_ROOT") {
            self.backup.storage_root = v;
        }
        if let Ok(v) = env::var("BACKUP_ENCRYPTION_KEY") {
            if !v.is_empty() {
                self.backup.encryption_key = Some(v);
            }
        }

        // Health overrides
        if let Ok(v) = env::var("QUEUE_STATUS_FILE") {
            if !v.is_empty() {
                self.health.queue_status_file = Some(v);
            }
        }
        if let Ok(v) = env::var("APP_VERSION") {
            self.health.app_version = v;
        }
        if let Ok(v) = env::var("GIT_SHA") {
            self.health.git_sha = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            tenancy: TenancyConfig {
                central_domains: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            },
            api: ApiConfig {
                health_rate_limit_per_minute: 30,
                login_max_attempts: 5,
                login_decay_secs: 60,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                enable_hsts: false,
            },
            backup: BackupConfig {
                storage_root: "storage".to_string(),
                encryption_key: None,
            },
            health: HealthConfig {
                queue_status_file: None,
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                git_sha: "unknown".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            tenancy: TenancyConfig {
                central_domains: vec!["staging.caja.example.com".to_string()],
            },
            api: ApiConfig {
                health_rate_limit_per_minute: 30,
                login_max_attempts: 5,
                login_decay_secs: 60,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                enable_hsts: true,
            },
            backup: BackupConfig {
                storage_root: "/var/lib/caja/storage".to_string(),
                encryption_key: None,
            },
            health: HealthConfig {
                queue_status_file: None,
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                git_sha: "unknown".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            tenancy: TenancyConfig {
                central_domains: vec!["caja.example.com".to_string()],
            },
            api: ApiConfig {
                health_rate_limit_per_minute: 30,
                login_max_attempts: 5,
                login_decay_secs: 60,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: false,
                enable_hsts: true,
            },
            backup: BackupConfig {
                storage_root: "/var/lib/caja/storage".to_string(),
                encryption_key: None,
            },
            health: HealthConfig {
                queue_status_file: None,
                app_version: env!("CARGO_PKG_VERSION").to_string(),
                git_sha: "unknown".to_string(),
            },
        }
    }

    /// True when the host serves the landlord side: a configured
    /// central domain, or local development hosts.
    pub fn is_central_domain(&self, host: &str) -> bool {
        if self.tenancy.central_domains.iter().any(|d| d == host) {
            return true;
        }
        matches!(host, "localhost" | "127.0.0.1" | "::1")
            || host.ends_with(".localhost")
            || host.ends_with(".local")
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
