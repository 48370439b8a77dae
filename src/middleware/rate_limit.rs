use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::auth::authenticate;
use crate::api::client_ip;
use crate::app::AppState;
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Keys tracked before stale windows are swept
const MAX_TRACKED_KEYS: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after_secs: u64,
    pub allowed: bool,
}

/// Fixed-window request counter held in process memory
#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    counters: Mutex<HashMap<String, (u32, Instant)>>,
}

impl RateLimiter {
    pub fn new(enabled: bool, max_requests: u32, window: Duration) -> Self {
        Self {
            enabled,
            max_requests,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            config.enable_rate_limiting,
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Count one request for `key` and report whether it fits in the window
    pub fn check(&self, key: &str) -> RateLimitInfo {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateLimitInfo {
        let mut counters = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let window = self.window;
        let entry = counters.entry(key.to_string()).or_insert((0, now));
        if now.duration_since(entry.1) >= window {
            *entry = (0, now);
        }
        entry.0 = entry.0.saturating_add(1);
        let (count, started) = *entry;

        if counters.len() > MAX_TRACKED_KEYS {
            counters.retain(|_, (_, start)| now.duration_since(*start) < window);
        }

        let reset_after = window.saturating_sub(now.duration_since(started));
        RateLimitInfo {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_after_secs: reset_after.as_secs().max(1),
            allowed: count <= self.max_requests,
        }
    }
}

fn set_limit_headers(response: &mut Response, info: &RateLimitInfo) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(info.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(info.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(info.reset_after_secs));
}

/// Limiter key: the token subject when the bearer token verifies, else client IP
fn limit_key(state: &AppState, headers: &HeaderMap) -> String {
    match authenticate(headers, &state.config.security) {
        Ok(user) => format!("user:{}", user.id),
        Err(_) => format!("ip:{}", client_ip(headers).unwrap_or_else(|| "unknown".to_string())),
    }
}

/// Per-caller rate limiting. Runs ahead of authentication and profile
/// loading, so refused requests never reach the store.
pub async fn rate_limit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limiter = &state.limiter;
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let key = limit_key(&state, request.headers());

    let info = limiter.check(&key);
    if !info.allowed {
        tracing::warn!("Rate limit exceeded for {} (limit {})", key, info.limit);
        let mut response = ApiError::too_many_requests(
            format!("Rate limit exceeded. Try again in {} seconds.", info.reset_after_secs),
            info.reset_after_secs,
        )
        .into_response();
        set_limit_headers(&mut response, &info);
        return response;
    }

    let mut response = next.run(request).await;
    set_limit_headers(&mut response, &info);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new(true, 2, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at("ip:1.2.3.4", now).allowed);
        let second = limiter.check_at("ip:1.2.3.4", now);
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);
        let third = limiter.check_at("ip:1.2.3.4", now);
        assert!(!third.allowed);
        assert_eq!(third.reset_after_secs, 60);

        // Other callers have their own window
        assert!(limiter.check_at("ip:5.6.7.8", now).allowed);
    }

    #[test]
    fn window_resets() {
        let limiter = RateLimiter::new(true, 1, Duration::from_secs(10));
        let now = Instant::now();
        assert!(limiter.check_at("user:a", now).allowed);
        assert!(!limiter.check_at("user:a", now + Duration::from_secs(5)).allowed);
        assert!(limiter.check_at("user:a", now + Duration::from_secs(10)).allowed);
    }

    #[test]
    fn sweeps_stale_keys_when_map_grows() {
        let limiter = RateLimiter::new(true, 5, Duration::from_secs(1));
        let start = Instant::now();
        for i in 0..=MAX_TRACKED_KEYS {
            limiter.check_at(&format!("ip:{}", i), start);
        }
        limiter.check_at("ip:fresh", start + Duration::from_secs(2));
        assert_eq!(limiter.counters.lock().unwrap().len(), 1);
    }
}
