use actix_web::middleware::DefaultHeaders;
use actix_web::HttpRequest;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::config::RateLimitConfig;

/// Sliding-window request limiter keyed by caller.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<SystemTime>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Records a request for `key`. Returns false once the key has used
    /// up its allowance for the current window.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, SystemTime::now())
    }

    pub fn check_at(&self, key: &str, now: SystemTime) -> bool {
        let mut requests = self
            .requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let window = self.window;
        let live = |time: &SystemTime| {
            now.duration_since(*time).unwrap_or(Duration::from_secs(0))
                < window
        };

        // Expire every key, not just this one, so one-off callers drop out.
        requests.retain(|_, times| {
            times.retain(|time| live(time));
            !times.is_empty()
        });

        let entry = requests.entry(key.to_string()).or_default();
        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }

    /// Number of callers with requests inside the current window.
    pub fn tracked_keys(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Rate limit key for lead writes from this request's client.
pub fn client_key(req: &HttpRequest, scope: &str) -> String {
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string();
    format!("{}:{}", scope, ip)
}

/// Response headers added to every page and API response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Frame-Options", "DENY"))
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains",
        ))
        .add((
            "Content-Security-Policy",
            "default-src 'self'; script-src 'self' https://unpkg.com; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; connect-src 'self'; frame-ancestors 'none'",
        ))
}

/// Message shown to visitors for failures they cannot fix.
pub fn generic_error_message(context: &str) -> String {
    format!(
        "An error occurred while processing your {}. Please try again.",
        context
    )
}
