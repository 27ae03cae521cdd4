//! Fixed-window rate limiting over a shared in-process counter store.
//!
//! Keys carry their scope ("health:<ip>", "login:<scope>:<email>:<ip>")
//! so tenants and the landlord never share a bucket. Windows expire
//! lazily when a key is hit after its reset time.

use axum::{extract::Request, middleware::Next, response::Response};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config;
use crate::error::ApiError;

struct Window {
    count: u32,
    resets_at: Instant,
}

pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn instance() -> &'static RateLimiter {
        static INSTANCE: OnceLock<RateLimiter> = OnceLock::new();
        INSTANCE.get_or_init(RateLimiter::new)
    }

    fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit against `key`. Returns `Err(retry_after_secs)` when
    /// the key has exhausted `max` hits in the current window.
    pub async fn hit(&self, key: &str, max: u32, window: Duration) -> Result<(), u64> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let entry = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + window,
        });

        if entry.resets_at <= now {
            entry.count = 0;
            entry.resets_at = now + window;
        }

        if entry.count >= max {
            let retry_after = entry.resets_at.saturating_duration_since(now).as_secs().max(1);
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(())
    }

    /// Drop the window for `key` (e.g. after a successful login).
    pub async fn clear(&self, key: &str) {
        let mut windows = self.windows.lock().await;
        windows.remove(key);
    }
}

/// Best-effort client address: proxy header first, then peer info.
pub fn client_ip(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "local".to_string())
}

/// Throttle for the health endpoint: 30/min/IP by default.
pub async fn throttle_health_middleware(
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = format!("health:{}", client_ip(&request));
    let max = config::config().api.health_rate_limit_per_minute;

    RateLimiter::instance()
        .hit(&key, max, Duration::from_secs(60))
        .await
        .map_err(|retry_after| {
            ApiError::too_many_requests(
                format!(
                    "Too many requests. Please try again in {} seconds.",
                    retry_after
                ),
                retry_after,
            )
        })?;

    Ok(next.run(request).await)
}
